use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classification::Classification;
use crate::sentiment::Sentiment;

/// Counters for one pipeline run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub hotel: String,

    pub reviewed: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,

    // reviews where no attempt decoded
    pub fallbacks: usize,
    // reviews whose merit adjustment was skipped because the hotel is not in the ledger
    pub merit_skipped: usize,

    pub merit_delta: i64,
    pub final_merit: Option<i64>,
}

impl RunStats {
    pub fn new(hotel: &str) -> Self {
        Self {
            started_at: Utc::now(),
            hotel: hotel.to_string(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, classification: &Classification) {
        self.reviewed += 1;
        match classification.result().overall_sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
        if classification.is_fallback() {
            self.fallbacks += 1;
        }
    }

    pub fn finish(mut self, final_merit: Option<i64>) -> Self {
        self.finished_at = Some(Utc::now());
        self.final_merit = final_merit;
        self
    }

    pub fn fallback_pct(&self) -> f64 {
        if self.reviewed == 0 {
            0.0
        } else {
            (self.fallbacks as f64 / self.reviewed as f64) * 100.0
        }
    }
}
