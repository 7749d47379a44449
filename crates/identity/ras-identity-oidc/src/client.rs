//! OpenID Connect client implementation with PKCE support.

use crate::config::OidcProviderConfig;
use crate::error::{OidcError, OidcResult};
use crate::types::{ProviderMetadata, TokenResponse, UserInfoResponse};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, thread_rng};
use ras_identity_core::{AuthorizationRedirect, CorrelationState};
use reqwest::Client;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

const WELL_KNOWN_PATH: &str = ".well-known/openid-configuration";

/// PKCE (RFC 7636) verifier and its S256 challenge
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
}

impl Default for PkceChallenge {
    fn default() -> Self {
        Self::new()
    }
}

impl PkceChallenge {
    pub fn new() -> Self {
        let code_verifier = random_token(64);

        Self {
            code_challenge: Self::s256(&code_verifier),
            code_verifier,
            code_challenge_method: "S256".to_string(),
        }
    }

    fn s256(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }
}

/// `len` random bytes, base64url encoded.
fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    thread_rng().fill(&mut bytes[..]);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Form body of an authorization-code grant
#[derive(Serialize)]
struct CodeGrant<'a> {
    grant_type: &'static str,
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_verifier: Option<&'a str>,
}

/// Resolve the discovery document URL for an issuer.
///
/// Accepts either the issuer itself or the full well-known URL.
pub fn discovery_url(issuer_url: &str) -> OidcResult<Url> {
    let trimmed = issuer_url.trim_end_matches('/');
    if trimmed.ends_with(WELL_KNOWN_PATH) {
        return Ok(Url::parse(trimmed)?);
    }
    Ok(Url::parse(&format!("{}/{}", trimmed, WELL_KNOWN_PATH))?)
}

/// HTTP client for the discovery, token and userinfo endpoints
#[derive(Clone)]
pub struct OidcClient {
    http_client: Client,
}

impl OidcClient {
    pub fn new(http_timeout_seconds: u64) -> OidcResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(http_timeout_seconds))
            .build()?;

        Ok(Self { http_client })
    }

    /// Fetch the provider metadata document
    pub async fn discover(&self, issuer_url: &str) -> OidcResult<ProviderMetadata> {
        let url = discovery_url(issuer_url)?;
        debug!("Fetching OIDC discovery document from {}", url);

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| OidcError::DiscoveryFailed(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(OidcError::DiscoveryFailed(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let metadata: ProviderMetadata = response
            .json()
            .await
            .map_err(|e| OidcError::DiscoveryFailed(format!("invalid metadata: {}", e)))?;

        info!("Discovered OIDC provider {}", metadata.issuer);
        Ok(metadata)
    }

    /// Build the authorization URL and the correlation state for one attempt
    pub fn authorization_url(
        &self,
        provider_config: &OidcProviderConfig,
        metadata: &ProviderMetadata,
        correlation_ttl_seconds: u64,
    ) -> OidcResult<AuthorizationRedirect> {
        let mut url = Url::parse(&metadata.authorization_endpoint)?;

        let pkce = if provider_config.use_pkce {
            Some(PkceChallenge::new())
        } else {
            None
        };
        let nonce = random_token(32);

        let correlation = CorrelationState::new(
            provider_config.provider_id.clone(),
            provider_config.redirect_uri.clone(),
            pkce.as_ref().map(|p| p.code_verifier.clone()),
            Some(nonce.clone()),
            correlation_ttl_seconds,
        );

        let mut params = url.query_pairs_mut();
        params.append_pair("response_type", "code");
        params.append_pair("client_id", &provider_config.client_id);
        params.append_pair("redirect_uri", &provider_config.redirect_uri);
        params.append_pair("scope", &provider_config.effective_scopes().join(" "));
        params.append_pair("state", &correlation.state);
        params.append_pair("nonce", &nonce);

        if let Some(pkce) = &pkce {
            params.append_pair("code_challenge", &pkce.code_challenge);
            params.append_pair("code_challenge_method", &pkce.code_challenge_method);
        }

        for (key, value) in &provider_config.auth_params {
            params.append_pair(key, value);
        }

        drop(params);

        debug!(
            "Generated authorization URL for provider {}",
            provider_config.provider_id
        );

        Ok(AuthorizationRedirect {
            url: url.to_string(),
            correlation,
        })
    }

    /// Redeem an authorization code at the token endpoint.
    pub async fn exchange_code(
        &self,
        provider_config: &OidcProviderConfig,
        metadata: &ProviderMetadata,
        code: &str,
        code_verifier: Option<&str>,
    ) -> OidcResult<TokenResponse> {
        let grant = CodeGrant {
            grant_type: "authorization_code",
            code,
            client_id: &provider_config.client_id,
            client_secret: &provider_config.client_secret,
            redirect_uri: &provider_config.redirect_uri,
            code_verifier,
        };

        let response = self
            .http_client
            .post(&metadata.token_endpoint)
            .form(&grant)
            .send()
            .await?;

        let response = match ensure_success(response).await {
            Ok(response) => response,
            Err(body) => {
                error!("Token endpoint rejected the code: {}", body);
                return Err(OidcError::TokenExchangeFailed(body));
            }
        };

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| OidcError::InvalidTokenResponse(e.to_string()))?;

        if tokens.access_token.is_empty() {
            return Err(OidcError::InvalidTokenResponse(
                "empty access_token".to_string(),
            ));
        }

        info!(
            "Token endpoint issued a {} token for provider {}",
            tokens.token_type, provider_config.provider_id
        );
        Ok(tokens)
    }

    /// Fetch the userinfo claims for an access token.
    pub async fn get_user_info(
        &self,
        userinfo_endpoint: &str,
        access_token: &str,
    ) -> OidcResult<UserInfoResponse> {
        let response = self
            .http_client
            .get(userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = match ensure_success(response).await {
            Ok(response) => response,
            Err(body) => {
                error!("Userinfo endpoint refused the token: {}", body);
                return Err(OidcError::UserInfoFailed(body));
            }
        };

        let claims: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| OidcError::InvalidUserInfoResponse(e.to_string()))?;

        debug!("Userinfo returned subject {}", claims.sub);
        Ok(claims)
    }
}

/// Pass a 2xx response through, otherwise return its status and body text.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(format!("{} {}", status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_metadata() -> ProviderMetadata {
        ProviderMetadata {
            issuer: "https://idp.example.com".to_string(),
            authorization_endpoint: "https://idp.example.com/authorize".to_string(),
            token_endpoint: "https://idp.example.com/token".to_string(),
            userinfo_endpoint: Some("https://idp.example.com/userinfo".to_string()),
            jwks_uri: None,
            scopes_supported: None,
            response_types_supported: None,
            grant_types_supported: None,
            code_challenge_methods_supported: None,
        }
    }

    #[test]
    fn test_pkce_pairs_are_fresh_and_consistent() {
        let first = PkceChallenge::new();
        let second = PkceChallenge::new();

        assert_ne!(first.code_verifier, second.code_verifier);
        assert_eq!(first.code_challenge, PkceChallenge::s256(&first.code_verifier));
        assert_eq!(first.code_challenge_method, "S256");

        // RFC 7636 bounds
        assert!((43..=128).contains(&first.code_verifier.len()));
    }

    #[test]
    fn test_discovery_url() {
        assert_eq!(
            discovery_url("https://idp.example.com/application/o/demo/")
                .unwrap()
                .as_str(),
            "https://idp.example.com/application/o/demo/.well-known/openid-configuration"
        );
        assert_eq!(
            discovery_url("https://idp.example.com/.well-known/openid-configuration")
                .unwrap()
                .as_str(),
            "https://idp.example.com/.well-known/openid-configuration"
        );
        assert!(discovery_url("not a url").is_err());
    }

    #[test]
    fn test_authorization_url_generation() {
        let client = OidcClient::new(30).unwrap();
        let provider_config = OidcProviderConfig::new(
            "test_provider",
            "test_client_id",
            "test_secret",
            "http://localhost:3000/auth/test_provider/callback",
            "https://idp.example.com",
        )
        .with_scopes(["email"]);

        let redirect = client
            .authorization_url(&provider_config, &test_metadata(), 600)
            .unwrap();

        let url = Url::parse(&redirect.url).unwrap();
        assert_eq!(url.host_str(), Some("idp.example.com"));
        assert_eq!(url.path(), "/authorize");

        let params: HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params.get("response_type"), Some(&"code".into()));
        assert_eq!(params.get("client_id"), Some(&"test_client_id".into()));
        assert_eq!(
            params.get("redirect_uri"),
            Some(&"http://localhost:3000/auth/test_provider/callback".into())
        );
        assert_eq!(params.get("scope"), Some(&"openid email".into()));
        assert_eq!(
            params.get("state").map(|s| s.to_string()),
            Some(redirect.correlation.state.clone())
        );
        assert_eq!(
            params.get("nonce").map(|s| s.to_string()),
            redirect.correlation.nonce.clone()
        );
        assert_eq!(params.get("code_challenge_method"), Some(&"S256".into()));

        let verifier = redirect.correlation.code_verifier.as_deref().unwrap();
        assert_eq!(
            params.get("code_challenge").map(|s| s.to_string()),
            Some(PkceChallenge::s256(verifier))
        );
        assert_eq!(redirect.correlation.provider_id, "test_provider");
    }

    #[test]
    fn test_authorization_url_without_pkce() {
        let client = OidcClient::new(30).unwrap();
        let mut provider_config = OidcProviderConfig::new(
            "plain",
            "client",
            "secret",
            "http://localhost:3000/auth/plain/callback",
            "https://idp.example.com",
        );
        provider_config.use_pkce = false;
        provider_config
            .auth_params
            .insert("prompt".to_string(), "login".to_string());

        let redirect = client
            .authorization_url(&provider_config, &test_metadata(), 600)
            .unwrap();
        let url = Url::parse(&redirect.url).unwrap();
        let params: HashMap<_, _> = url.query_pairs().collect();

        assert!(!params.contains_key("code_challenge"));
        assert_eq!(params.get("prompt"), Some(&"login".into()));
        assert!(redirect.correlation.code_verifier.is_none());
    }
}
