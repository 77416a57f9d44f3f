//! OpenAI-compatible completions backend.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::client::{HttpClient, TextBackend};
use crate::error::ClassifyError;

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    text: String,
}

/// Sends prompts to `{base_url}/completions` and returns the first choice's text.
pub struct OpenAiBackend<C> {
    client: C,
    endpoint: Url,
    model: String,
    max_tokens: u32,
}

impl<C: HttpClient> OpenAiBackend<C> {
    pub fn new(client: C, base_url: &str, model: &str, max_tokens: u32) -> Result<Self, ClassifyError> {
        let endpoint = format!("{}/completions", base_url.trim_end_matches('/'))
            .parse::<Url>()
            .map_err(|e| ClassifyError::Request(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            max_tokens,
        })
    }
}

#[async_trait]
impl<C: HttpClient> TextBackend for OpenAiBackend<C> {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: self.max_tokens,
            temperature: 0.0,
        };
        let body = serde_json::to_vec(&body).map_err(|e| ClassifyError::Request(e.to_string()))?;

        let mut req = Request::new(Method::POST, self.endpoint.clone());
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(body.into());

        let response = self.client.execute(req).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifyError::Status { status, body });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ClassifyError::MalformedResponse("no choices returned".to_string()))?;

        debug!(chars = text.len(), "Completion received");
        Ok(text)
    }
}
