//! Input review table and sampling.

use std::path::Path;

use csv::StringRecord;
use rand::Rng;
use tracing::info;

use crate::tabular::{RawTable, TableError};

pub const REVIEW_TEXT_COLUMN: &str = "reviews_text";
pub const DEFAULT_SAMPLE_SIZE: usize = 20;

/// One input row. `row` is its zero-based position in the source file.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub row: usize,
    pub text: String,
    pub fields: StringRecord,
}

#[derive(Debug, Clone)]
pub struct ReviewTable {
    headers: StringRecord,
    records: Vec<ReviewRecord>,
}

impl ReviewTable {
    /// Loads every row of the reviews file. The file must have a
    /// `reviews_text` column and at least one row.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        Self::from_raw(RawTable::read(path)?)
    }

    pub fn from_raw(table: RawTable) -> Result<Self, TableError> {
        let text_idx = table.column(REVIEW_TEXT_COLUMN)?;
        if table.rows.is_empty() {
            return Err(TableError::Empty(table.path));
        }

        let records = table
            .rows
            .into_iter()
            .enumerate()
            .map(|(row, fields)| ReviewRecord {
                row,
                text: fields.get(text_idx).unwrap_or_default().to_string(),
                fields,
            })
            .collect();

        Ok(Self {
            headers: table.headers,
            records,
        })
    }

    /// Draws `n` rows without replacement, in random order. Tables with `n`
    /// or fewer rows are kept whole but still shuffled.
    pub fn sample<R: Rng + ?Sized>(self, n: usize, rng: &mut R) -> Self {
        let total = self.records.len();
        let amount = n.min(total);
        let picked = rand::seq::index::sample(rng, total, amount);

        let mut slots: Vec<Option<ReviewRecord>> = self.records.into_iter().map(Some).collect();
        let records: Vec<_> = picked.into_iter().filter_map(|i| slots[i].take()).collect();

        info!(total, sampled = records.len(), "Reviews sampled");
        Self {
            headers: self.headers,
            records,
        }
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn records(&self) -> &[ReviewRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn table(rows: usize) -> ReviewTable {
        let mut csv = String::from("id,reviews_text\n");
        for i in 0..rows {
            csv.push_str(&format!("{i},review {i}\n"));
        }
        let raw = RawTable::from_reader(csv.as_bytes(), Path::new("reviews.csv")).unwrap();
        ReviewTable::from_raw(raw).unwrap()
    }

    #[test]
    fn test_records_carry_text_and_position() {
        let t = table(3);
        assert_eq!(t.len(), 3);
        assert_eq!(t.records()[2].row, 2);
        assert_eq!(t.records()[2].text, "review 2");
        assert_eq!(&t.records()[2].fields[0], "2");
    }

    #[test]
    fn test_requires_text_column() {
        let raw = RawTable::from_reader("id,body\n1,x\n".as_bytes(), Path::new("r.csv")).unwrap();
        let err = ReviewTable::from_raw(raw).unwrap_err();
        assert!(matches!(err, TableError::MissingColumn { .. }));
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let raw = RawTable::from_reader("id,reviews_text\n".as_bytes(), Path::new("r.csv")).unwrap();
        let err = ReviewTable::from_raw(raw).unwrap_err();
        assert!(matches!(err, TableError::Empty(_)));
    }

    #[test]
    fn test_sample_without_replacement() {
        let mut rng = StdRng::seed_from_u64(7);
        let sampled = table(100).sample(20, &mut rng);

        assert_eq!(sampled.len(), 20);
        let rows: HashSet<_> = sampled.records().iter().map(|r| r.row).collect();
        assert_eq!(rows.len(), 20);
    }

    #[test]
    fn test_sample_larger_than_table_keeps_everything() {
        let mut rng = StdRng::seed_from_u64(7);
        let sampled = table(5).sample(20, &mut rng);
        assert_eq!(sampled.len(), 5);
    }

    #[test]
    fn test_same_seed_same_sample() {
        let a = table(50).sample(10, &mut StdRng::seed_from_u64(42));
        let b = table(50).sample(10, &mut StdRng::seed_from_u64(42));
        let rows = |t: &ReviewTable| t.records().iter().map(|r| r.row).collect::<Vec<_>>();
        assert_eq!(rows(&a), rows(&b));
    }
}
