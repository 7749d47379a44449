//! Web server that signs users in through an OpenID Connect provider.
//!
//! The browser is sent to the provider, the returned authorization code is
//! exchanged for tokens, and the access token is kept in an encrypted
//! session cookie. Nothing about the user is stored server-side.

pub mod auth;
pub mod config;
pub mod error;
pub mod pages;
pub mod resources;
pub mod router;
pub mod state;

pub use config::AppConfig;
pub use error::AppError;
pub use resources::{AdminApiClient, Resource, ResourceClient, ResourceError};
pub use router::build_router;
pub use state::AppState;
