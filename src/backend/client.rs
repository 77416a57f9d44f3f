use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::error::ClassifyError;

/// Executes a prepared HTTP request. Implemented by the plain client and by
/// wrappers that decorate requests (auth headers) before delegating.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// A text-generation backend: prompt in, raw completion text out.
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError>;
}

#[async_trait]
impl<T: TextBackend + ?Sized> TextBackend for &T {
    async fn complete(&self, prompt: &str) -> Result<String, ClassifyError> {
        (**self).complete(prompt).await
    }
}
