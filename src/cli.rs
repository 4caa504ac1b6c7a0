use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Records node balances, payments, funding and prices in yearly spreadsheets", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)] // Default handled in main.rs
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Append log lines to this file instead of the terminal
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print results and do not update the spreadsheet
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Write each node's current balance into today's row
    Balances,
    /// Incoming token payments per wallet for a day (default: yesterday, UTC)
    Payments {
        /// YYYY-mm-dd
        date: Option<String>,
    },
    /// Incoming native funding per node for a day (default: yesterday, UTC)
    Funding {
        /// YYYY-mm-dd
        date: Option<String>,
    },
    /// Balances, then wait for midnight UTC, then payments and funding
    Activity,
    /// Daily closing prices for the configured coins (default: yesterday, UTC)
    Prices {
        /// YYYY-mm-dd
        date: Option<String>,
    },
    /// Export fees and funding to CryptoTaxCalculator CSVs
    Export {
        /// Start date, YYYY-mm-dd
        start: String,
        /// End date, YYYY-mm-dd, same year as the start
        end: String,
        /// Only export this worksheet
        sheet: Option<String>,
        /// Directory for the CSV files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["node-accounting", "payments", "2023-03-09", "--dry-run", "-d"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.debug);
        assert_eq!(
            cli.command,
            Command::Payments {
                date: Some("2023-03-09".to_string())
            }
        );
    }

    #[test]
    fn test_export_arguments() {
        let cli = Cli::try_parse_from([
            "node-accounting",
            "--config",
            "books.toml",
            "export",
            "2023-01-01",
            "2023-06-30",
            "Polygon OCR",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("books.toml")));
        match cli.command {
            Command::Export { start, end, sheet, out_dir } => {
                assert_eq!(start, "2023-01-01");
                assert_eq!(end, "2023-06-30");
                assert_eq!(sheet.as_deref(), Some("Polygon OCR"));
                assert_eq!(out_dir, PathBuf::from("."));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_export_needs_both_dates() {
        assert!(Cli::try_parse_from(["node-accounting", "export", "2023-01-01"]).is_err());
    }
}
