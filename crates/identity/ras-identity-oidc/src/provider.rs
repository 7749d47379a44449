//! OpenID Connect provider that implements AuthorizationProvider.

use crate::client::OidcClient;
use crate::config::{OidcConfig, OidcProviderConfig};
use crate::error::{OidcError, OidcResult};
use crate::id_token;
use crate::types::{IdTokenClaims, ProviderMetadata, UserInfoResponse};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use ras_identity_core::{
    AuthResult, AuthorizationProvider, AuthorizationRedirect, CallbackParams, CorrelationState,
    IdentityResult, VerifiedIdentity,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct OidcProvider {
    config: OidcProviderConfig,
    metadata: ProviderMetadata,
    client: OidcClient,
    correlation_ttl_seconds: u64,
}

impl OidcProvider {
    /// Create a provider by fetching the issuer's discovery document.
    pub async fn discover(provider_config: OidcProviderConfig, config: &OidcConfig) -> OidcResult<Self> {
        if provider_config.client_id.is_empty() {
            return Err(OidcError::ConfigError("client_id is empty".to_string()));
        }

        let client = OidcClient::new(config.http_timeout_seconds)?;
        let metadata = client.discover(&provider_config.issuer_url).await?;

        Ok(Self::with_metadata(provider_config, metadata, client, config))
    }

    /// Create a provider from already known metadata.
    pub fn with_metadata(
        provider_config: OidcProviderConfig,
        metadata: ProviderMetadata,
        client: OidcClient,
        config: &OidcConfig,
    ) -> Self {
        Self {
            config: provider_config,
            metadata,
            client,
            correlation_ttl_seconds: config.correlation_ttl_seconds,
        }
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn check_callback<'a>(
        &self,
        correlation: &CorrelationState,
        callback: &'a CallbackParams,
    ) -> OidcResult<&'a str> {
        if correlation.provider_id != self.config.provider_id {
            return Err(OidcError::ProviderMismatch {
                expected: self.config.provider_id.clone(),
                actual: correlation.provider_id.clone(),
            });
        }

        if let Some(error) = &callback.error {
            let error_desc = callback
                .error_description
                .as_deref()
                .unwrap_or("No description");
            return Err(OidcError::CallbackError(format!("{}: {}", error, error_desc)));
        }

        if callback.state.as_deref() != Some(correlation.state.as_str()) {
            return Err(OidcError::InvalidState);
        }

        if correlation.is_expired() {
            return Err(OidcError::StateExpired);
        }

        callback
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or(OidcError::MissingAuthorizationCode)
    }

    async fn complete(
        &self,
        correlation: &CorrelationState,
        callback: CallbackParams,
    ) -> OidcResult<AuthResult> {
        let code = self.check_callback(correlation, &callback)?;

        let token_response = self
            .client
            .exchange_code(
                &self.config,
                &self.metadata,
                code,
                correlation.code_verifier.as_deref(),
            )
            .await?;

        let claims = match &token_response.id_token {
            Some(raw) => {
                let claims = id_token::decode_claims(raw)?;
                id_token::verify_claims(
                    &claims,
                    &self.metadata.issuer,
                    &self.config.client_id,
                    correlation.nonce.as_deref(),
                )?;
                Some(claims)
            }
            None => {
                warn!(
                    "Provider {} returned no ID token",
                    self.config.provider_id
                );
                None
            }
        };

        let user_info = match &self.metadata.userinfo_endpoint {
            Some(endpoint) => Some(
                self.client
                    .get_user_info(endpoint, &token_response.access_token)
                    .await?,
            ),
            None => None,
        };

        let identity = self.map_identity(claims, user_info)?;

        info!(
            "Successfully verified identity for provider: {}",
            self.config.provider_id
        );

        Ok(AuthResult {
            access_token: token_response.access_token,
            token_type: token_response.token_type,
            refresh_token: token_response.refresh_token,
            id_token: token_response.id_token,
            // Out-of-range lifetimes are dropped rather than trusted
            expires_at: token_response
                .expires_in
                .and_then(|secs| i64::try_from(secs).ok())
                .and_then(Duration::try_seconds)
                .and_then(|lifetime| Utc::now().checked_add_signed(lifetime)),
            identity,
        })
    }

    /// Merge ID token claims and user info, user info taking precedence.
    fn map_identity(
        &self,
        claims: Option<IdTokenClaims>,
        user_info: Option<UserInfoResponse>,
    ) -> OidcResult<VerifiedIdentity> {
        let mut metadata = serde_json::Map::new();
        let mut subject = None;
        let mut email = None;
        let mut display_name = None;

        if let Some(claims) = claims {
            subject = Some(claims.sub);
            email = claims.email;
            display_name = claims.name.or(claims.preferred_username);
            for (key, value) in claims.additional_claims {
                metadata.insert(key, value);
            }
        }

        if let Some(info) = user_info {
            if let Some(expected) = &subject {
                if expected != &info.sub {
                    return Err(OidcError::InvalidUserInfoResponse(
                        "subject does not match ID token".to_string(),
                    ));
                }
            }
            subject = Some(info.sub);
            email = info.email.or(email);
            display_name = info.name.or(info.preferred_username).or(display_name);
            if let Some(picture) = info.picture {
                metadata.insert("picture".to_string(), serde_json::Value::String(picture));
            }
            if let Some(verified) = info.email_verified {
                metadata.insert(
                    "email_verified".to_string(),
                    serde_json::Value::Bool(verified),
                );
            }
            for (key, value) in info.additional_claims {
                metadata.insert(key, value);
            }
        }

        Ok(VerifiedIdentity {
            provider_id: self.config.provider_id.clone(),
            subject: subject.unwrap_or_default(),
            email,
            display_name,
            metadata: if metadata.is_empty() {
                None
            } else {
                Some(serde_json::Value::Object(metadata))
            },
        })
    }
}

#[async_trait]
impl AuthorizationProvider for OidcProvider {
    fn provider_id(&self) -> &str {
        &self.config.provider_id
    }

    async fn begin_auth(&self) -> IdentityResult<AuthorizationRedirect> {
        let redirect = self.client.authorization_url(
            &self.config,
            &self.metadata,
            self.correlation_ttl_seconds,
        )?;

        info!("Started OIDC flow for provider: {}", self.config.provider_id);
        Ok(redirect)
    }

    async fn complete_auth(
        &self,
        correlation: &CorrelationState,
        callback: CallbackParams,
    ) -> IdentityResult<AuthResult> {
        self.complete(correlation, callback).await.map_err(|e| {
            warn!(
                provider = %self.config.provider_id,
                error = %e,
                "OIDC callback rejected"
            );
            e.into()
        })
    }
}
