//! Bounded-retry classification of a single review.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::TextBackend;
use crate::classification::{AttemptFailure, Classification, ClassificationResult, Schema};
use crate::error::ClassifyError;
use crate::parser::decode;
use crate::prompt::build_prompt;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Classifies reviews through a [`TextBackend`], retrying responses that fail
/// to decode.
pub struct Classifier<B> {
    backend: B,
    schema: Schema,
    retry_delay: Duration,
    timeout: Duration,
}

impl<B: TextBackend> Classifier<B> {
    pub fn new(backend: B, schema: Schema) -> Self {
        Self {
            backend,
            schema,
            retry_delay: DEFAULT_RETRY_DELAY,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Classifies `review_text`, making at most `max_attempts` backend calls.
    ///
    /// The first response that decodes wins. If none do, the neutral fallback
    /// is returned as [`Classification::FallbackAfterRetries`] together with
    /// every failed attempt. A `max_attempts` of 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Backend failures (timeout, transport, error status) are not retried and
    /// are returned immediately.
    #[tracing::instrument(skip(self, review_text), fields(schema = ?self.schema))]
    pub async fn classify(&self, review_text: &str, max_attempts: u32) -> Result<Classification, ClassifyError> {
        let max_attempts = max_attempts.max(1);
        let prompt = build_prompt(review_text, self.schema);
        let mut failures = Vec::new();

        for attempt in 1..=max_attempts {
            debug!(attempt, review = review_text, "Sending classification request");

            let raw = tokio::time::timeout(self.timeout, self.backend.complete(&prompt))
                .await
                .map_err(|_| {
                    warn!(timeout_secs = self.timeout.as_secs_f64(), "Backend call timed out");
                    ClassifyError::Timeout
                })??;

            debug!(attempt, response = %raw, "Backend response");

            match decode(&raw, self.schema) {
                Ok(result) => return Ok(Classification::Decoded(result)),
                Err(error) => {
                    warn!(attempt, max_attempts, error = %error, "Decoding failed");
                    failures.push(AttemptFailure {
                        attempt,
                        raw_response: raw,
                        error,
                    });
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        info!(attempts = max_attempts, "No decodable response, using neutral fallback");
        Ok(Classification::FallbackAfterRetries {
            result: ClassificationResult::fallback(self.schema),
            failures,
        })
    }
}
