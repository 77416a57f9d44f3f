//! Decoder for raw model output.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::category::Category;
use crate::classification::{ClassificationResult, Schema};
use crate::sentiment::Sentiment;

const SENTIMENT_KEY: &str = "classify";
const RATING_KEY: &str = "rating";
const CONFIDENCE_KEY: &str = "confidence";

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' has invalid value {value}")]
    InvalidValue { field: String, value: String },
    #[error("unexpected field '{0}'")]
    UnexpectedField(String),
}

fn invalid(field: &str, value: &Value) -> DecodeError {
    DecodeError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Decodes a raw model response into a [`ClassificationResult`] for `schema`.
///
/// The response must be a single JSON object. Sentiment labels are matched
/// case-insensitively. Category keys must be exact labels from the closed
/// category set; any other key fails the decode. A `null` category value is
/// treated as "not mentioned".
///
/// Rating and confidence are type-checked but not range-checked; out-of-range
/// values are logged and passed through.
///
/// # Errors
///
/// Returns a [`DecodeError`] describing the first problem found.
pub fn decode(raw: &str, schema: Schema) -> Result<ClassificationResult, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(fields) = value else {
        return Err(DecodeError::NotAnObject);
    };

    let mut overall_sentiment = None;
    let mut rating = None;
    let mut confidence = None;
    let mut category_sentiments = BTreeMap::new();

    for (key, value) in &fields {
        match key.as_str() {
            SENTIMENT_KEY => overall_sentiment = Some(sentiment(key, value)?),
            RATING_KEY => rating = Some(coerce_rating(value)?),
            CONFIDENCE_KEY if schema == Schema::Confidence => {
                confidence = Some(coerce_confidence(value)?)
            }
            other => {
                let category = match schema {
                    Schema::Categories => Category::from_label(other),
                    Schema::Confidence => None,
                }
                .ok_or_else(|| DecodeError::UnexpectedField(other.to_string()))?;

                if !value.is_null() {
                    category_sentiments.insert(category, sentiment(key, value)?);
                }
            }
        }
    }

    let overall_sentiment = overall_sentiment.ok_or(DecodeError::MissingField(SENTIMENT_KEY))?;
    let rating = rating.ok_or(DecodeError::MissingField(RATING_KEY))?;
    if schema == Schema::Confidence && confidence.is_none() {
        return Err(DecodeError::MissingField(CONFIDENCE_KEY));
    }

    if !(0..=5).contains(&rating) {
        warn!(rating, "Rating outside the expected 0-5 range");
    }
    if let Some(c) = confidence {
        if !(0.0..=1.0).contains(&c) {
            warn!(confidence = c, "Confidence outside the expected 0-1 range");
        }
    }

    Ok(ClassificationResult {
        overall_sentiment,
        rating,
        confidence,
        category_sentiments,
    })
}

fn sentiment(field: &str, value: &Value) -> Result<Sentiment, DecodeError> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(field, value))
}

/// Accepts integers, integral floats (`4.0`) and numeric strings (`"4"`).
fn coerce_rating(value: &Value) -> Result<i64, DecodeError> {
    // `as` saturates, so anything outside i64 is rejected rather than clamped.
    let integral = |f: f64| {
        (f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64)
            .then_some(f as i64)
    };

    let rating = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };

    rating.ok_or_else(|| invalid(RATING_KEY, value))
}

fn coerce_confidence(value: &Value) -> Result<f64, DecodeError> {
    let confidence = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    confidence
        .filter(|c| c.is_finite())
        .ok_or_else(|| invalid(CONFIDENCE_KEY, value))
}
