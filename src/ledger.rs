//! Per-hotel merit ledger.
//!
//! Loaded from a CSV with a `Hotel` column and an integer `Merit` column.
//! Other columns are carried through untouched when the ledger is saved.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use crate::tabular::{RawTable, StagedTable, TableError, stage_table};

pub const HOTEL_COLUMN: &str = "Hotel";
pub const MERIT_COLUMN: &str = "Merit";

#[derive(Debug, Clone)]
struct LedgerRow {
    hotel: String,
    merit: i64,
    fields: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MeritLedger {
    headers: Vec<String>,
    merit_idx: usize,
    rows: Vec<LedgerRow>,
}

impl MeritLedger {
    pub fn load(path: &Path) -> Result<Self, TableError> {
        Self::from_raw(RawTable::read(path)?)
    }

    /// Builds a ledger from a parsed table. A missing `Merit` column is added
    /// with every hotel at 0; empty merit cells also count as 0.
    pub fn from_raw(table: RawTable) -> Result<Self, TableError> {
        let hotel_idx = table.column(HOTEL_COLUMN)?;
        let mut headers: Vec<String> = table.headers.iter().map(str::to_string).collect();

        let merit_idx = match table.column(MERIT_COLUMN) {
            Ok(idx) => Some(idx),
            Err(TableError::MissingColumn { .. }) => None,
            Err(e) => return Err(e),
        };
        if merit_idx.is_none() {
            info!("Ledger has no Merit column, starting every hotel at 0");
            headers.push(MERIT_COLUMN.to_string());
        }

        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(table.rows.len());
        for (row, record) in table.rows.iter().enumerate() {
            let hotel = record.get(hotel_idx).unwrap_or_default().to_string();
            if !seen.insert(hotel.clone()) {
                return Err(TableError::DuplicateKey {
                    path: table.path.clone(),
                    key: hotel,
                });
            }

            let merit = match merit_idx {
                Some(idx) => {
                    let cell = record.get(idx).unwrap_or_default();
                    parse_merit(cell).ok_or_else(|| TableError::InvalidValue {
                        path: table.path.clone(),
                        row,
                        column: MERIT_COLUMN.to_string(),
                        value: cell.to_string(),
                    })?
                }
                None => 0,
            };

            let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
            if merit_idx.is_none() {
                fields.push(String::new());
            }
            rows.push(LedgerRow { hotel, merit, fields });
        }

        Ok(Self {
            merit_idx: merit_idx.unwrap_or(headers.len() - 1),
            headers,
            rows,
        })
    }

    pub fn merit(&self, hotel: &str) -> Option<i64> {
        self.rows.iter().find(|r| r.hotel == hotel).map(|r| r.merit)
    }

    /// Adds `delta` to `hotel`'s merit and returns the new score, or `None`
    /// if the hotel is not in the ledger.
    pub fn adjust(&mut self, hotel: &str, delta: i64) -> Option<i64> {
        let row = self.rows.iter_mut().find(|r| r.hotel == hotel)?;
        row.merit += delta;
        debug!(hotel, delta, merit = row.merit, "Merit adjusted");
        Some(row.merit)
    }

    /// `(hotel, merit)` pairs in file order.
    pub fn standings(&self) -> impl Iterator<Item = (&str, i64)> {
        self.rows.iter().map(|r| (r.hotel.as_str(), r.merit))
    }

    /// Writes the whole ledger next to `path`; `path` is only replaced once
    /// the returned [`StagedTable`] is committed.
    pub fn stage(&self, path: &Path) -> Result<StagedTable> {
        let rows = self.rows.iter().map(|r| {
            let mut fields = r.fields.clone();
            fields[self.merit_idx] = r.merit.to_string();
            fields
        });
        stage_table(path, &self.headers, rows)
    }
}

/// Integers, or integral floats as written by spreadsheet tools (`3.0`).
fn parse_merit(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(0);
    }
    cell.parse::<i64>().ok().or_else(|| {
        cell.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ledger(csv: &str) -> Result<MeritLedger, TableError> {
        let raw = RawTable::from_reader(csv.as_bytes(), Path::new("Merit.csv"))?;
        MeritLedger::from_raw(raw)
    }

    #[test]
    fn test_adjust_known_hotel() {
        let mut l = ledger("Hotel,Merit\nA,3\nB,-1\n").unwrap();
        assert_eq!(l.adjust("A", 1), Some(4));
        assert_eq!(l.adjust("B", -1), Some(-2));
        assert_eq!(l.merit("A"), Some(4));
    }

    #[test]
    fn test_adjust_unknown_hotel_is_none() {
        let mut l = ledger("Hotel,Merit\nA,3\n").unwrap();
        assert_eq!(l.adjust("Z", 1), None);
        assert_eq!(l.merit("A"), Some(3));
    }

    #[test]
    fn test_missing_merit_column_starts_at_zero() {
        let l = ledger("Hotel,City\nA,Paris\nB,Rome\n").unwrap();
        let standings: Vec<_> = l.standings().collect();
        assert_eq!(standings, vec![("A", 0), ("B", 0)]);
    }

    #[test]
    fn test_blank_and_float_merit_cells() {
        let l = ledger("Hotel,Merit\nA,\nB,7.0\n").unwrap();
        assert_eq!(l.merit("A"), Some(0));
        assert_eq!(l.merit("B"), Some(7));
    }

    #[test]
    fn test_invalid_merit_is_rejected() {
        let err = ledger("Hotel,Merit\nA,lots\n").unwrap_err();
        assert!(matches!(err, TableError::InvalidValue { row: 0, .. }));
    }

    #[test]
    fn test_duplicate_hotel_is_rejected() {
        let err = ledger("Hotel,Merit\nA,1\nA,2\n").unwrap_err();
        assert!(matches!(err, TableError::DuplicateKey { key, .. } if key == "A"));
    }

    #[test]
    fn test_requires_hotel_column() {
        let err = ledger("Name,Merit\nA,1\n").unwrap_err();
        assert!(matches!(err, TableError::MissingColumn { column, .. } if column == "Hotel"));
    }

    #[test]
    fn test_save_preserves_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Merit.csv");

        let mut l = ledger("City,Hotel\nParis,A\nRome,B\n").unwrap();
        l.adjust("B", -1);
        l.stage(&path).unwrap().commit().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "City,Hotel,Merit\nParis,A,0\nRome,B,-1\n");
    }
}
