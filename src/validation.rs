use crate::config::ChainType;
use crate::error::{Result, Error};
use chrono::NaiveDate;

const SOLANA_PUBKEY_LEN: usize = 32;

pub fn validate_evm_address(address: &str) -> Result<()> {
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| Error::ValidationError(format!("EVM address must start with 0x: {:?}", address)))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::ValidationError(format!("EVM address must be 20 hex bytes: {:?}", address)));
    }
    Ok(())
}

pub fn validate_solana_address(address: &str) -> Result<()> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| Error::ValidationError(format!("Solana address is not base58: {:?}: {}", address, e)))?;
    if bytes.len() != SOLANA_PUBKEY_LEN {
        return Err(Error::ValidationError(format!(
            "Solana address must decode to {} bytes, got {}: {:?}",
            SOLANA_PUBKEY_LEN,
            bytes.len(),
            address
        )));
    }
    Ok(())
}

pub fn validate_bech32_address(address: &str) -> Result<()> {
    let (hrp, data) = address
        .rsplit_once('1')
        .ok_or_else(|| Error::ValidationError(format!("bech32 address has no separator: {:?}", address)))?;
    if hrp.is_empty() || data.len() < 6 {
        return Err(Error::ValidationError(format!("bech32 address too short: {:?}", address)));
    }
    if !address.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(Error::ValidationError(format!("bech32 address must be lowercase alphanumeric: {:?}", address)));
    }
    Ok(())
}

pub fn validate_address(chain_type: ChainType, address: &str) -> Result<()> {
    match chain_type {
        ChainType::Solana => validate_solana_address(address),
        ChainType::Terra => validate_bech32_address(address),
        _ => validate_evm_address(address),
    }
}

pub fn validate_column(column: u32) -> Result<()> {
    if column == 0 {
        return Err(Error::ValidationError("Columns are 1-based, got 0".to_string()));
    }
    Ok(())
}

/// Dates given on the command line, `YYYY-mm-dd`.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| {
        Error::ValidationError(format!("Date must be in YYYY-mm-dd format, got {:?}: {}", input, e))
    })
}
