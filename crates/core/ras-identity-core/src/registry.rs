//! Startup-time registry of authorization providers.

use crate::{AuthorizationProvider, IdentityError, IdentityResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable set of providers, keyed by their path identifier.
///
/// Built once before the server starts and only read afterwards, so clones
/// share the same map.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<HashMap<String, Arc<dyn AuthorizationProvider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(mut self, provider: Arc<dyn AuthorizationProvider>) -> Self {
        Arc::make_mut(&mut self.providers).insert(provider.provider_id().to_string(), provider);
        self
    }

    pub fn get(&self, provider_id: &str) -> IdentityResult<Arc<dyn AuthorizationProvider>> {
        self.providers
            .get(provider_id)
            .cloned()
            .ok_or_else(|| IdentityError::ProviderNotFound(provider_id.to_string()))
    }

    pub fn provider_ids(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
