//! Environment configuration.

use anyhow::{Context, Result, bail};
use chrono::Duration;
use ras_identity_oidc::{OidcConfig, OidcProviderConfig};
use ras_identity_session::SessionConfig;
use url::Url;

/// Name goth-style clients give a generic OpenID Connect provider
pub const DEFAULT_PROVIDER_NAME: &str = "openid-connect";

/// Upper bound for lifetimes and timeouts, roughly 100 years
pub const MAX_DURATION_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub session_secret: String,
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub issuer_url: String,
    pub provider_name: String,
    pub bind_address: String,
    pub scopes: Vec<String>,
    pub session_max_age_seconds: u64,
    pub request_timeout_seconds: u64,
    pub http_timeout_seconds: u64,
    pub correlation_ttl_seconds: u64,
    pub admin_api_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let callback_url = required(&lookup, "CLIENT_CALLBACK_URL")?;
        Url::parse(&callback_url).context("CLIENT_CALLBACK_URL must be an absolute URL")?;

        let issuer_url = required(&lookup, "CLIENT_ISSUER_URL")?;
        Url::parse(&issuer_url).context("CLIENT_ISSUER_URL must be an absolute URL")?;

        let provider_name =
            optional(&lookup, "PROVIDER_NAME").unwrap_or_else(|| DEFAULT_PROVIDER_NAME.to_string());
        if !provider_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            bail!("PROVIDER_NAME may only contain ASCII letters, digits, '-' and '_'");
        }

        let admin_api_url = optional(&lookup, "ADMIN_API_URL");
        if let Some(url) = &admin_api_url {
            Url::parse(url).context("ADMIN_API_URL must be an absolute URL")?;
        }

        Ok(Self {
            session_secret: required(&lookup, "SESSION_SECRET")?,
            client_id: required(&lookup, "CLIENT_ID")?,
            client_secret: required(&lookup, "CLIENT_SECRET")?,
            callback_url,
            issuer_url,
            provider_name,
            bind_address: optional(&lookup, "BIND_ADDRESS")
                .unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            scopes: optional(&lookup, "OIDC_SCOPES")
                .unwrap_or_else(|| "openid profile email".to_string())
                .split_whitespace()
                .map(String::from)
                .collect(),
            session_max_age_seconds: seconds(&lookup, "SESSION_MAX_AGE_SECONDS", 86_400)?,
            request_timeout_seconds: seconds(&lookup, "REQUEST_TIMEOUT_SECONDS", 30)?,
            http_timeout_seconds: seconds(&lookup, "HTTP_TIMEOUT_SECONDS", 30)?,
            correlation_ttl_seconds: seconds(&lookup, "CORRELATION_TTL_SECONDS", 600)?,
            admin_api_url,
        })
    }

    /// Cookies are only marked `Secure` when the app is served over https.
    pub fn secure_cookies(&self) -> bool {
        self.callback_url.starts_with("https://")
    }

    pub fn oidc_config(&self) -> OidcConfig {
        OidcConfig::new()
            .with_correlation_ttl(self.correlation_ttl_seconds)
            .with_http_timeout(self.http_timeout_seconds)
    }

    pub fn provider_config(&self) -> OidcProviderConfig {
        OidcProviderConfig::new(
            self.provider_name.clone(),
            self.client_id.clone(),
            self.client_secret.clone(),
            self.callback_url.clone(),
            self.issuer_url.clone(),
        )
        .with_scopes(self.scopes.clone())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_max_age(Duration::seconds(self.session_max_age_seconds as i64))
            .with_secure(self.secure_cookies())
    }
}

/// Load `.env` if present; a file that exists but cannot be parsed is fatal.
pub fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("Error loading .env file"),
    }
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).with_context(|| format!("{} environment variable is required", name))
}

fn number<F>(lookup: &F, name: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match optional(lookup, name) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} must be a non-negative integer", name)),
        None => Ok(default),
    }
}

/// A number of seconds small enough to be added to the current time.
fn seconds<F>(lookup: &F, name: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let value = number(lookup, name, default)?;
    if value > MAX_DURATION_SECONDS {
        bail!("{} must be at most {} seconds", name, MAX_DURATION_SECONDS);
    }
    Ok(value)
}
