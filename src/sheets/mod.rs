//! Where job results end up: one spreadsheet per year, one worksheet per
//! node plus the shared payment and price worksheets.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt;

pub mod google;

pub use google::GoogleSheets;

/// 1-based row and column, as spreadsheets count them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub row: u32,
    pub column: u32,
}

impl Cell {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    pub fn column_letters(column: u32) -> String {
        let mut letters = Vec::new();
        let mut n = column;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        letters.iter().rev().collect()
    }

    pub fn to_a1(&self) -> Result<String> {
        if self.row == 0 || self.column == 0 {
            return Err(Error::SheetError(format!(
                "Cells are 1-based, got ({}, {})",
                self.row, self.column
            )));
        }
        Ok(format!("{}{}", Self::column_letters(self.column), self.row))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Number(n) => serde_json::json!(n),
            CellValue::Text(s) => serde_json::json!(s),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// An opened spreadsheet.
#[async_trait]
pub trait Sheet: Send + Sync {
    async fn update_value(&self, worksheet: &str, cell: Cell, value: CellValue) -> Result<()>;

    /// Every row of `worksheet` as displayed text. Rows may be ragged.
    async fn get_all_values(&self, worksheet: &str) -> Result<Vec<Vec<String>>>;
}

/// Opens spreadsheets by title.
#[async_trait]
pub trait SheetClient: Send + Sync {
    async fn open(&self, title: &str) -> Result<Box<dyn Sheet>>;
}

/// Prints every write instead of performing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRun;

#[derive(Debug, Clone)]
pub struct DryRunSheet {
    title: String,
}

#[async_trait]
impl SheetClient for DryRun {
    async fn open(&self, title: &str) -> Result<Box<dyn Sheet>> {
        Ok(Box::new(DryRunSheet {
            title: title.to_string(),
        }))
    }
}

#[async_trait]
impl Sheet for DryRunSheet {
    async fn update_value(&self, worksheet: &str, cell: Cell, value: CellValue) -> Result<()> {
        println!("{} / {} {}: {}", self.title, worksheet, cell.to_a1()?, value);
        Ok(())
    }

    async fn get_all_values(&self, worksheet: &str) -> Result<Vec<Vec<String>>> {
        Err(Error::SheetError(format!(
            "Dry run cannot read {} / {}",
            self.title, worksheet
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_notation() {
        assert_eq!(Cell::new(3, 1).to_a1().unwrap(), "A3");
        assert_eq!(Cell::new(367, 14).to_a1().unwrap(), "N367");
        assert_eq!(Cell::new(1, 26).to_a1().unwrap(), "Z1");
        assert_eq!(Cell::new(1, 27).to_a1().unwrap(), "AA1");
        assert_eq!(Cell::new(2, 703).to_a1().unwrap(), "AAA2");
        assert!(Cell::new(0, 1).to_a1().is_err());
    }

    #[test]
    fn test_cell_value_json() {
        assert_eq!(CellValue::Number(1.5).to_json(), serde_json::json!(1.5));
        assert_eq!(CellValue::Text("23:59".into()).to_json(), serde_json::json!("23:59"));
    }

    #[tokio::test]
    async fn test_dry_run_writes_succeed_and_reads_fail() {
        let sheet = DryRun.open("Node Accounting 2023").await.unwrap();
        assert!(sheet
            .update_value("Mainnet OCR", Cell::new(70, 3), CellValue::Number(0.25))
            .await
            .is_ok());
        assert!(sheet.get_all_values("Mainnet OCR").await.is_err());
    }
}
