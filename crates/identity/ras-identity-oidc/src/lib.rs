//! OpenID Connect identity provider with PKCE support.
//!
//! This crate implements the Authorization Code flow against any OpenID
//! Connect provider that publishes a discovery document. It plugs into the
//! ras-identity-core [`AuthorizationProvider`] trait: `begin_auth` yields the
//! redirect plus a correlation state (state, nonce and PKCE verifier), and
//! `complete_auth` checks the callback against that state, exchanges the
//! code, checks the ID token claims and fetches user info.

mod client;
mod config;
mod error;
mod id_token;
mod provider;
mod types;


pub use client::{OidcClient, PkceChallenge, discovery_url};
pub use config::{OidcConfig, OidcProviderConfig};
pub use error::{OidcError, OidcResult};
pub use provider::OidcProvider;
pub use types::{Audience, IdTokenClaims, ProviderMetadata, TokenResponse, UserInfoResponse};

// Re-export common types for convenience
pub use ras_identity_core::{AuthorizationProvider, CallbackParams, CorrelationState};
