//! Credentials for model backends
//!
//! Credentials are either fixed at construction (usually read from the
//! environment) or produced by a callback before every request, which suits
//! short-lived tokens such as Bedrock API keys.
//!
//! ```ignore
//! let llm = BedrockProvider::with_auth_provider(settings, region, || async {
//!     let token = mint_bedrock_token().await?;
//!     Ok(AuthConfig::new(token))
//! });
//! ```

use anyhow::{Context, Result};
use std::env;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Authentication configuration for API requests
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// API key or bearer token
    pub api_key: String,
    /// Optional custom base URL (overrides the backend default)
    pub base_url: Option<String>,
}

impl AuthConfig {
    /// Create a new auth config with just an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Create a new auth config with API key and custom base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Some(base_url.into()),
        }
    }

    /// Read the key from `key_var` and an optional base URL from `base_url_var`.
    ///
    /// Empty values count as unset.
    pub fn from_env(key_var: &str, base_url_var: &str) -> Result<Self> {
        let api_key = env::var(key_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .with_context(|| format!("{} environment variable not set", key_var))?;

        let base_url = env::var(base_url_var).ok().filter(|v| !v.trim().is_empty());

        Ok(Self { api_key, base_url })
    }
}

/// Boxed future returned by auth providers
pub type AuthFuture<'a> = Pin<Box<dyn Future<Output = Result<AuthConfig>> + Send + 'a>>;

/// Source of fresh credentials, consulted before each API request
pub trait AuthProvider: Send + Sync {
    fn get_auth(&self) -> AuthFuture<'_>;
}

/// Wrapper to implement AuthProvider for async closures
pub struct FnAuthProvider<F> {
    func: F,
}

impl<F, Fut> AuthProvider for FnAuthProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<AuthConfig>> + Send + 'static,
{
    fn get_auth(&self) -> AuthFuture<'_> {
        Box::pin((self.func)())
    }
}

/// Create an auth provider from an async closure
pub fn auth_provider<F, Fut>(func: F) -> FnAuthProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<AuthConfig>> + Send + 'static,
{
    FnAuthProvider { func }
}

/// Either static credentials or a dynamic provider
#[derive(Clone)]
pub(crate) enum AuthSource {
    Static(AuthConfig),
    Dynamic(Arc<dyn AuthProvider>),
}

impl AuthSource {
    pub(crate) async fn get_auth(&self) -> Result<AuthConfig> {
        match self {
            AuthSource::Static(config) => Ok(config.clone()),
            AuthSource::Dynamic(provider) => provider
                .get_auth()
                .await
                .context("Failed to get authentication credentials"),
        }
    }

    /// Base URL to use for a request, falling back to `default`
    pub(crate) fn resolve_base(config: &AuthConfig, default: &str) -> String {
        config
            .base_url
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source() {
        let source = AuthSource::Static(AuthConfig::new("sk-test"));
        let auth = source.get_auth().await.unwrap();
        assert_eq!(auth.api_key, "sk-test");
        assert!(auth.base_url.is_none());
    }

    #[tokio::test]
    async fn test_dynamic_source_is_called_each_time() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let provider = auth_provider(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(AuthConfig::new(format!("token-{}", n))) }
        });
        let source = AuthSource::Dynamic(Arc::new(provider));

        assert_eq!(source.get_auth().await.unwrap().api_key, "token-0");
        assert_eq!(source.get_auth().await.unwrap().api_key, "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolve_base_trims_slash() {
        let config = AuthConfig::with_base_url("k", "http://localhost:8080/");
        assert_eq!(
            AuthSource::resolve_base(&config, "https://api.anthropic.com"),
            "http://localhost:8080"
        );
        let config = AuthConfig::new("k");
        assert_eq!(
            AuthSource::resolve_base(&config, "https://api.anthropic.com"),
            "https://api.anthropic.com"
        );
    }

    #[test]
    fn test_from_env_missing_key() {
        let err = AuthConfig::from_env(
            "STANDALONE_AGENT_TEST_MISSING_KEY",
            "STANDALONE_AGENT_TEST_MISSING_BASE",
        )
        .unwrap_err();
        assert!(err.to_string().contains("STANDALONE_AGENT_TEST_MISSING_KEY"));
    }
}
