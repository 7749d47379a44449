//! OIDC configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Client registration for a single OpenID Connect provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcProviderConfig {
    /// Identifier used in `/auth/{provider}` routes
    pub provider_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Issuer base URL or full `.well-known/openid-configuration` URL
    pub issuer_url: String,
    pub scopes: Vec<String>,
    /// Additional parameters to include in authorization request
    pub auth_params: HashMap<String, String>,
    /// Whether to use PKCE
    pub use_pkce: bool,
}

impl OidcProviderConfig {
    pub fn new(
        provider_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        issuer_url: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            issuer_url: issuer_url.into(),
            scopes: vec!["openid".to_string()],
            auth_params: HashMap::new(),
            use_pkce: true,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Requested scopes, always including `openid`.
    pub fn effective_scopes(&self) -> Vec<String> {
        let mut scopes = Vec::with_capacity(self.scopes.len() + 1);
        if !self.scopes.iter().any(|s| s == "openid") {
            scopes.push("openid".to_string());
        }
        for scope in &self.scopes {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
        scopes
    }
}

/// Client-wide settings shared by all configured providers.
#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub correlation_ttl_seconds: u64,
    pub http_timeout_seconds: u64,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            correlation_ttl_seconds: 600, // 10 minutes
            http_timeout_seconds: 30,
        }
    }
}

impl OidcConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_correlation_ttl(mut self, seconds: u64) -> Self {
        self.correlation_ttl_seconds = seconds;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }
}
