//! The annotated output table: sampled reviews plus classification columns.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use csv::StringRecord;
use crate::category::Category;
use crate::classification::{Classification, Schema};
use crate::reviews::ReviewRecord;
use crate::sentiment::Sentiment;
use crate::tabular::{StagedTable, stage_table};

pub const SENTIMENT_COLUMN: &str = "overall_sentiment";
pub const RATING_COLUMN: &str = "rating";
pub const CONFIDENCE_COLUMN: &str = "confidence";
pub const STATUS_COLUMN: &str = "decode_status";

#[derive(Debug, Clone, PartialEq)]
pub struct OutputRow {
    pub fields: StringRecord,
    pub overall_sentiment: Sentiment,
    pub rating: i64,
    pub confidence: Option<f64>,
    pub decode_status: &'static str,
    pub categories: BTreeMap<Category, Sentiment>,
}

/// A column filled from the classification rather than the source file.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Sentiment,
    Rating,
    Confidence,
    Status,
    Category(Category),
}

impl Column {
    fn name(&self) -> &'static str {
        match self {
            Column::Sentiment => SENTIMENT_COLUMN,
            Column::Rating => RATING_COLUMN,
            Column::Confidence => CONFIDENCE_COLUMN,
            Column::Status => STATUS_COLUMN,
            Column::Category(c) => c.label(),
        }
    }

    fn cell(&self, row: &OutputRow) -> String {
        match self {
            Column::Sentiment => row.overall_sentiment.to_string(),
            Column::Rating => row.rating.to_string(),
            Column::Confidence => row.confidence.map(|c| c.to_string()).unwrap_or_default(),
            Column::Status => row.decode_status.to_string(),
            Column::Category(c) => row.categories.get(c).map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    source_headers: StringRecord,
    schema: Schema,
    rows: Vec<OutputRow>,
}

impl OutputTable {
    pub fn new(source_headers: StringRecord, schema: Schema) -> Self {
        Self {
            source_headers,
            schema,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, record: &ReviewRecord, classification: &Classification) {
        let result = classification.result();
        self.rows.push(OutputRow {
            fields: record.fields.clone(),
            overall_sentiment: result.overall_sentiment,
            rating: result.rating,
            confidence: result.confidence,
            decode_status: classification.status(),
            categories: result.category_sentiments.clone(),
        });
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    /// Categories that get an output column, in fixed category order: those
    /// mentioned by at least one row, plus any the source file already has a
    /// column for under the categories schema.
    pub fn category_columns(&self) -> Vec<Category> {
        let mut present: BTreeSet<Category> = self
            .rows
            .iter()
            .flat_map(|r| r.categories.keys().copied())
            .collect();
        if self.schema == Schema::Categories {
            present.extend(self.source_headers.iter().filter_map(Category::from_label));
        }
        Category::ALL
            .into_iter()
            .filter(|c| present.contains(c))
            .collect()
    }

    fn columns(&self) -> Vec<Column> {
        let mut columns = vec![Column::Sentiment, Column::Rating];
        if self.schema == Schema::Confidence {
            columns.push(Column::Confidence);
        }
        columns.push(Column::Status);
        columns.extend(self.category_columns().into_iter().map(Column::Category));
        columns
    }

    /// Output headers and the index each classification column lands at. A
    /// source column with the same name is reused in place, not duplicated.
    fn layout(&self) -> (Vec<String>, Vec<(usize, Column)>) {
        let mut headers: Vec<String> = self.source_headers.iter().map(str::to_string).collect();
        let placed = self
            .columns()
            .into_iter()
            .map(|column| {
                let idx = match headers.iter().position(|h| h == column.name()) {
                    Some(idx) => idx,
                    None => {
                        headers.push(column.name().to_string());
                        headers.len() - 1
                    }
                };
                (idx, column)
            })
            .collect();
        (headers, placed)
    }

    pub fn headers(&self) -> Vec<String> {
        self.layout().0
    }

    /// Cell values for every row, aligned with [`OutputTable::headers`].
    /// Categories a row did not mention are left empty.
    pub fn records(&self) -> Vec<Vec<String>> {
        let (headers, placed) = self.layout();

        self.rows
            .iter()
            .map(|row| {
                let mut cells: Vec<String> = row.fields.iter().map(str::to_string).collect();
                cells.resize(headers.len(), String::new());
                for (idx, column) in &placed {
                    cells[*idx] = column.cell(row);
                }
                cells
            })
            .collect()
    }

    /// Writes the table next to `path`; nothing replaces `path` until the
    /// returned [`StagedTable`] is committed.
    pub fn stage(&self, path: &Path) -> Result<StagedTable> {
        stage_table(path, self.headers(), self.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::ClassificationResult;
    use std::fs;

    fn record(row: usize, text: &str) -> ReviewRecord {
        ReviewRecord {
            row,
            text: text.to_string(),
            fields: StringRecord::from(vec![row.to_string(), text.to_string()]),
        }
    }

    fn decoded(sentiment: Sentiment, rating: i64, categories: &[(Category, Sentiment)]) -> Classification {
        Classification::Decoded(ClassificationResult {
            overall_sentiment: sentiment,
            rating,
            confidence: None,
            category_sentiments: categories.iter().copied().collect(),
        })
    }

    fn headers() -> StringRecord {
        StringRecord::from(vec!["id", "reviews_text"])
    }

    #[test]
    fn test_columns_only_for_mentioned_categories() {
        let mut t = OutputTable::new(headers(), Schema::Categories);
        t.push(
            &record(0, "Loud but clean"),
            &decoded(
                Sentiment::Neutral,
                3,
                &[(Category::NoiseLevels, Sentiment::Negative), (Category::Cleanliness, Sentiment::Positive)],
            ),
        );
        t.push(&record(1, "Fine"), &decoded(Sentiment::Positive, 4, &[]));

        assert_eq!(
            t.headers(),
            vec!["id", "reviews_text", "overall_sentiment", "rating", "decode_status", "Cleanliness", "Noise Levels"]
        );
        let records = t.records();
        assert_eq!(records[0][5..], ["Positive", "Negative"]);
        assert_eq!(records[1][5..], ["", ""]);
    }

    #[test]
    fn test_fallback_row() {
        let mut t = OutputTable::new(headers(), Schema::Categories);
        let fallback = Classification::FallbackAfterRetries {
            result: ClassificationResult::fallback(Schema::Categories),
            failures: vec![],
        };
        t.push(&record(0, "Terrible noise all night"), &fallback);

        assert_eq!(t.records()[0][2..], ["Neutral", "0", "fallback"]);
    }

    #[test]
    fn test_confidence_column() {
        let mut t = OutputTable::new(headers(), Schema::Confidence);
        t.push(
            &record(0, "ok"),
            &Classification::Decoded(ClassificationResult {
                overall_sentiment: Sentiment::Negative,
                rating: 2,
                confidence: Some(0.75),
                category_sentiments: BTreeMap::new(),
            }),
        );

        assert_eq!(t.headers()[2..], ["overall_sentiment", "rating", "confidence", "decode_status"]);
        assert_eq!(t.records()[0][2..], ["Negative", "2", "0.75", "decoded"]);
    }

    #[test]
    fn test_write_creates_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");

        let mut t = OutputTable::new(headers(), Schema::Categories);
        t.push(&record(0, "Great, clean"), &decoded(Sentiment::Positive, 5, &[(Category::Cleanliness, Sentiment::Positive)]));
        t.stage(&path).unwrap().commit().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "id,reviews_text,overall_sentiment,rating,decode_status,Cleanliness");
        assert_eq!(lines[1], "0,\"Great, clean\",Positive,5,decoded,Positive");
    }

    #[test]
    fn test_existing_columns_are_overwritten_not_duplicated() {
        let source = StringRecord::from(vec!["reviews_text", "rating", "Cleanliness"]);
        let mut t = OutputTable::new(source, Schema::Categories);
        let review = ReviewRecord {
            row: 0,
            text: "x".to_string(),
            fields: StringRecord::from(vec!["x", "2", ""]),
        };
        t.push(&review, &decoded(Sentiment::Positive, 5, &[(Category::Cleanliness, Sentiment::Positive)]));

        assert_eq!(
            t.headers(),
            vec!["reviews_text", "rating", "Cleanliness", "overall_sentiment", "decode_status"]
        );
        assert_eq!(t.records()[0], ["x", "5", "Positive", "Positive", "decoded"]);
    }

    #[test]
    fn test_existing_category_column_is_cleared_when_not_mentioned() {
        let source = StringRecord::from(vec!["reviews_text", "Location"]);
        let mut t = OutputTable::new(source, Schema::Categories);
        let review = ReviewRecord {
            row: 0,
            text: "ok".to_string(),
            fields: StringRecord::from(vec!["ok", "Positive"]),
        };
        t.push(&review, &decoded(Sentiment::Neutral, 3, &[]));

        assert_eq!(t.headers(), vec!["reviews_text", "Location", "overall_sentiment", "rating", "decode_status"]);
        assert_eq!(t.records()[0], ["ok", "", "Neutral", "3", "decoded"]);
    }
}
