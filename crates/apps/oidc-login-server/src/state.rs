use crate::config::AppConfig;
use crate::error::AppError;
use crate::resources::{AdminApiClient, ResourceClient};
use anyhow::{Context, Result};
use axum::extract::FromRef;
use ras_identity_core::{CorrelationState, ProviderRegistry};
use ras_identity_oidc::OidcProvider;
use ras_identity_session::{CookieSlot, Key, SessionConfig, SessionStore, derive_key};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Cookie holding the pending authorization between redirect and callback
pub const CORRELATION_COOKIE_NAME: &str = "_oidc_correlation";

/// Shared, read-only application state.
#[derive(Clone)]
pub struct AppState {
    pub providers: ProviderRegistry,
    pub sessions: SessionStore,
    pub correlation: CookieSlot<CorrelationState>,
    pub key: Key,
    pub resources: Option<Arc<dyn ResourceClient>>,
    pub request_timeout: Duration,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

impl AppState {
    pub fn new(
        providers: ProviderRegistry,
        session_config: SessionConfig,
        key: Key,
        correlation_ttl_seconds: u64,
    ) -> Self {
        let correlation = CookieSlot::named(
            CORRELATION_COOKIE_NAME,
            chrono::Duration::seconds(correlation_ttl_seconds as i64),
            &session_config,
        );

        Self {
            providers,
            sessions: SessionStore::new(session_config),
            correlation,
            key,
            resources: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_resources(mut self, client: Arc<dyn ResourceClient>) -> Self {
        self.resources = Some(client);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Run an upstream call under the per-request deadline.
    pub async fn with_timeout<F>(&self, call: F) -> Result<F::Output, AppError>
    where
        F: Future,
    {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| AppError::Timeout(self.request_timeout))
    }

    /// Discover the configured provider and assemble the state.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let provider = OidcProvider::discover(config.provider_config(), &config.oidc_config())
            .await
            .with_context(|| format!("Failed to discover OIDC provider at {}", config.issuer_url))?;
        info!(
            "OIDC provider '{}' registered (issuer {})",
            config.provider_name,
            provider.metadata().issuer
        );

        let providers = ProviderRegistry::new().add_provider(Arc::new(provider));
        let key = derive_key(&config.session_secret).context("Invalid SESSION_SECRET")?;

        let mut state = Self::new(
            providers,
            config.session_config(),
            key,
            config.correlation_ttl_seconds,
        )
        .with_request_timeout(Duration::from_secs(config.request_timeout_seconds));

        if let Some(url) = &config.admin_api_url {
            let client = AdminApiClient::new(url, config.http_timeout_seconds)
                .context("Failed to build admin API client")?;
            info!("Admin API client enabled: {}", client.endpoint());
            state = state.with_resources(Arc::new(client));
        }

        Ok(state)
    }
}
