//! CryptoTaxCalculator advanced-import CSVs built from the node worksheets.

use crate::config::{Config, LayoutConfig, NodeConfig};
use crate::error::{Error, Result};
use crate::sheets::Sheet;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use csv::WriterBuilder;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CTC_HEADER: [&str; 15] = [
    "Timestamp (UTC)",
    "Type",
    "Base Currency",
    "Base Amount",
    "Quote Currency (Optional)",
    "Quote Amount (Optional)",
    "Fee Currency (Optional)",
    "Fee Amount (Optional)",
    "From (Optional)",
    "To (Optional)",
    "Blockchain (Optional)",
    "ID (Optional)",
    "Description (Optional)",
    "Reference Price Per Unit (Optional)",
    "Reference Price Currency (Optional)",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const FEE_RECIPIENT: &str = "Chainlink Operations";

/// One CSV line, in `CTC_HEADER` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CtcRow {
    pub timestamp: String,
    pub kind: String,
    pub base_currency: String,
    pub base_amount: String,
    pub quote_currency: Option<String>,
    pub quote_amount: Option<String>,
    pub fee_currency: Option<String>,
    pub fee_amount: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub blockchain: Option<String>,
    pub id: Option<String>,
    pub description: Option<String>,
    pub reference_price: Option<String>,
    pub reference_currency: Option<String>,
}

/// CTC blockchain name (if CTC knows the chain) and base currency for a
/// configured chain name.
pub fn ctc_chain(chain: &str) -> Option<(Option<&'static str>, &'static str)> {
    let mapped = match chain {
        "binance" => (Some("Binance Smart Chain"), "BNB"),
        "ethereum" | "ethereum_rpl" | "ethereum_lido" | "ethereum_ssv" => (Some("Ethereum"), "ETH"),
        "polygon" => (Some("Polygon"), "MATIC"),
        "optimism" => (Some("Optimism"), "ETH"),
        "fantom" => (Some("Fantom"), "FTM"),
        "huobi" => (None, "HT"),
        "klaytn" => (None, "KLAY"),
        "metis" => (None, "Metis"),
        "moonriver" => (None, "MOVR"),
        "solana" => (Some("Solana"), "SOL"),
        _ => return None,
    };
    Some(mapped)
}

pub fn parse_sheet_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn parse_sheet_time(value: &str) -> NaiveTime {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .unwrap_or_default()
}

fn cell(row: &[String], column: u32) -> &str {
    column
        .checked_sub(1)
        .and_then(|i| row.get(i as usize))
        .map(|s| s.trim())
        .unwrap_or("")
}

fn timestamp(date: NaiveDate, time: NaiveTime) -> String {
    NaiveDateTime::new(date, time).format(TIMESTAMP_FORMAT).to_string()
}

/// Fee and funding rows for one worksheet, header row already removed.
#[derive(Debug, Default, PartialEq)]
pub struct NodeExport {
    pub fees: Vec<CtcRow>,
    pub funding: Vec<CtcRow>,
}

pub fn build_rows(
    rows: &[Vec<String>],
    node: &NodeConfig,
    layout: &LayoutConfig,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<NodeExport> {
    let (blockchain, coin) = ctc_chain(&node.chain)
        .ok_or_else(|| Error::ValidationError(format!("Unknown chain, don't know how to export {}", node.chain)))?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 0)
        .ok_or_else(|| Error::InternalError("invalid end-of-day time".to_string()))?;
    let mut export = NodeExport::default();

    for row in rows {
        let date_cell = cell(row, 1);
        if date_cell.is_empty() {
            continue;
        }
        let date = match parse_sheet_date(date_cell) {
            Some(date) => date,
            None => {
                warn!("{}: skipping row with unreadable date {:?}", node.worksheet_title, date_cell);
                continue;
            }
        };
        if date < start || date > end {
            continue;
        }

        let fee = cell(row, layout.fee_column);
        if !fee.is_empty() && fee != "0" {
            export.fees.push(CtcRow {
                timestamp: timestamp(date, end_of_day),
                kind: "fee".to_string(),
                base_currency: coin.to_string(),
                base_amount: fee.to_string(),
                to: Some(FEE_RECIPIENT.to_string()),
                blockchain: blockchain.map(str::to_string),
                description: Some("Gas fees".to_string()),
                ..CtcRow::default()
            });
        }

        let funding = cell(row, layout.funding_column);
        if !funding.is_empty() {
            let time = parse_sheet_time(cell(row, layout.time_column));
            export.funding.push(CtcRow {
                timestamp: timestamp(date, time),
                kind: "receive".to_string(),
                base_currency: coin.to_string(),
                base_amount: funding.to_string(),
                from: node.funded_by.clone(),
                blockchain: blockchain.map(str::to_string),
                description: Some("Node funding".to_string()),
                ..CtcRow::default()
            });
        }
    }
    Ok(export)
}

pub fn write_csv(path: &Path, rows: &[CtcRow]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(CTC_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_file_name(worksheet: &str, kind: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}-CTC {} Export-{}-to-{}.csv",
        worksheet,
        kind,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

pub fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if start.year() != end.year() {
        return Err(Error::ValidationError(
            "Start and end date have to be in the same year".to_string(),
        ));
    }
    if start > end {
        return Err(Error::ValidationError(format!("Start date {} is after end date {}", start, end)));
    }
    Ok(())
}

/// Writes fee (and, when there are any, funding) CSVs for every node, or
/// only the node whose worksheet is `only`. Returns the files written.
pub async fn export_ctc(
    sheet: &dyn Sheet,
    config: &Config,
    start: NaiveDate,
    end: NaiveDate,
    only: Option<&str>,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    check_range(start, end)?;
    let mut written = Vec::new();

    for node in config.nodes.values() {
        if only.map_or(false, |title| title != node.worksheet_title) {
            continue;
        }
        if ctc_chain(&node.chain).is_none() {
            warn!("Unknown chain, don't know how to export {}", node.chain);
            continue;
        }

        info!("Working on {}", node.worksheet_title);
        let rows = sheet.get_all_values(&node.worksheet_title).await?;
        let body = rows.get(1..).unwrap_or_default();
        let export = build_rows(body, node, &config.layout, start, end)?;

        let fee_path = out_dir.join(export_file_name(&node.worksheet_title, "Fee", start, end));
        write_csv(&fee_path, &export.fees)?;
        info!("Fees in {} exported to {}", node.worksheet_title, fee_path.display());
        written.push(fee_path);

        if export.funding.is_empty() {
            info!("No funding events in {}, skipping export for it", node.worksheet_title);
            continue;
        }
        let funding_path = out_dir.join(export_file_name(&node.worksheet_title, "Funding", start, end));
        write_csv(&funding_path, &export.funding)?;
        info!("Funding in {} exported to {}", node.worksheet_title, funding_path.display());
        written.push(funding_path);
    }

    if let Some(title) = only {
        if written.is_empty() {
            warn!("No exportable node uses worksheet {:?}", title);
        }
    }
    Ok(written)
}
