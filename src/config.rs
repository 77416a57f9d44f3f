use anyhow::{Context, Result};
use std::time::Duration;

use crate::backend::{ApiKey, BasicClient, OpenAiBackend};
use crate::classify::DEFAULT_TIMEOUT;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 256;

/// Backend settings, read from the environment (and `.env`, once
/// `dotenvy::dotenv` has run).
///
/// | Variable                | Default                       |
/// |-------------------------|-------------------------------|
/// | `OPENAI_API_KEY`        | required                      |
/// | `OPENAI_BASE_URL`       | `https://api.openai.com/v1`   |
/// | `OPENAI_MODEL`          | `gpt-3.5-turbo-instruct`      |
/// | `OPENAI_MAX_TOKENS`     | `256`                         |
/// | `CLASSIFY_TIMEOUT_SECS` | `60`                          |
#[derive(Clone)]
pub struct BackendConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BackendConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;
        let base_url = get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_tokens = match get("OPENAI_MAX_TOKENS") {
            Some(v) => v.trim().parse().with_context(|| format!("OPENAI_MAX_TOKENS '{v}' is not a number"))?,
            None => DEFAULT_MAX_TOKENS,
        };
        let timeout = match get("CLASSIFY_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.trim()
                    .parse()
                    .with_context(|| format!("CLASSIFY_TIMEOUT_SECS '{v}' is not a number"))?,
            ),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            api_key,
            base_url,
            model,
            max_tokens,
            timeout,
        })
    }

    /// Builds the authenticated HTTP backend described by this config.
    pub fn backend(&self) -> Result<OpenAiBackend<ApiKey<BasicClient>>> {
        let client = BasicClient::new(self.timeout).context("could not build HTTP client")?;
        let client = ApiKey::bearer(client, &self.api_key)?;
        Ok(OpenAiBackend::new(client, &self.base_url, &self.model, self.max_tokens)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let c = BackendConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-1")])).unwrap();
        assert_eq!(c.api_key, "sk-1");
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(c.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_overrides() {
        let c = BackendConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("OPENAI_MODEL", "local"),
            ("OPENAI_MAX_TOKENS", "512"),
            ("CLASSIFY_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(c.base_url, "http://localhost:8080/v1");
        assert_eq!(c.model, "local");
        assert_eq!(c.max_tokens, 512);
        assert_eq!(c.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_or_blank_key_is_error() {
        assert!(BackendConfig::from_lookup(lookup(&[])).is_err());
        assert!(BackendConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).is_err());
    }

    #[test]
    fn test_bad_timeout_is_error() {
        let err = BackendConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "k"), ("CLASSIFY_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("CLASSIFY_TIMEOUT_SECS"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let c = BackendConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret")])).unwrap();
        assert!(!format!("{c:?}").contains("sk-secret"));
    }

    #[test]
    fn test_backend_builds() {
        let c = BackendConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-1")])).unwrap();
        assert!(c.backend().is_ok());
    }
}
