//! Classification result types.
//!
//! A [`ClassificationResult`] is what the model said about one review. A
//! [`Classification`] wraps it with how it was obtained: decoded from a model
//! response, or substituted after every attempt failed to decode.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::category::Category;
use crate::parser::DecodeError;
use crate::sentiment::Sentiment;

/// Output schema requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Schema {
    /// Overall sentiment, rating and optional per-category sentiments.
    #[default]
    Categories,
    /// Overall sentiment, rating and a confidence score.
    Confidence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub overall_sentiment: Sentiment,
    pub rating: i64,
    /// Only populated under [`Schema::Confidence`].
    pub confidence: Option<f64>,
    /// Only populated under [`Schema::Categories`], and only for mentioned categories.
    pub category_sentiments: BTreeMap<Category, Sentiment>,
}

impl ClassificationResult {
    /// The neutral default returned when no response could be decoded.
    pub fn fallback(schema: Schema) -> Self {
        Self {
            overall_sentiment: Sentiment::Neutral,
            rating: 0,
            confidence: match schema {
                Schema::Categories => None,
                Schema::Confidence => Some(0.0),
            },
            category_sentiments: BTreeMap::new(),
        }
    }

    /// Renders the result in the same JSON shape the model is asked to produce.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("classify".into(), json!(self.overall_sentiment.as_str()));
        obj.insert("rating".into(), json!(self.rating));
        if let Some(confidence) = self.confidence {
            obj.insert("confidence".into(), json!(confidence));
        }
        for (category, sentiment) in &self.category_sentiments {
            obj.insert(category.label().into(), json!(sentiment.as_str()));
        }
        Value::Object(obj)
    }
}

/// One attempt whose response could not be decoded.
#[derive(Debug)]
pub struct AttemptFailure {
    pub attempt: u32,
    pub raw_response: String,
    pub error: DecodeError,
}

/// Outcome of [`crate::classify::Classifier::classify`].
#[derive(Debug)]
pub enum Classification {
    Decoded(ClassificationResult),
    FallbackAfterRetries {
        result: ClassificationResult,
        failures: Vec<AttemptFailure>,
    },
}

impl Classification {
    pub fn result(&self) -> &ClassificationResult {
        match self {
            Classification::Decoded(result) => result,
            Classification::FallbackAfterRetries { result, .. } => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classification::FallbackAfterRetries { .. })
    }

    /// Value written to the `decode_status` output column.
    pub fn status(&self) -> &'static str {
        if self.is_fallback() { "fallback" } else { "decoded" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_categories_schema() {
        let r = ClassificationResult::fallback(Schema::Categories);
        assert_eq!(r.overall_sentiment, Sentiment::Neutral);
        assert_eq!(r.rating, 0);
        assert_eq!(r.confidence, None);
        assert!(r.category_sentiments.is_empty());
    }

    #[test]
    fn test_fallback_confidence_schema() {
        let r = ClassificationResult::fallback(Schema::Confidence);
        assert_eq!(r.confidence, Some(0.0));
        assert!(r.category_sentiments.is_empty());
    }

    #[test]
    fn test_to_json_uses_wire_keys() {
        let mut categories = BTreeMap::new();
        categories.insert(Category::NoiseLevels, Sentiment::Negative);
        let r = ClassificationResult {
            overall_sentiment: Sentiment::Negative,
            rating: 1,
            confidence: None,
            category_sentiments: categories,
        };

        let v = r.to_json();
        assert_eq!(v["classify"], "Negative");
        assert_eq!(v["rating"], 1);
        assert_eq!(v["Noise Levels"], "Negative");
        assert!(v.get("confidence").is_none());
    }

    #[test]
    fn test_status_labels() {
        let decoded = Classification::Decoded(ClassificationResult::fallback(Schema::Categories));
        assert_eq!(decoded.status(), "decoded");
        assert!(!decoded.is_fallback());

        let fallback = Classification::FallbackAfterRetries {
            result: ClassificationResult::fallback(Schema::Categories),
            failures: vec![],
        };
        assert_eq!(fallback.status(), "fallback");
        assert!(fallback.is_fallback());
    }
}
