//! Client for the identity provider's admin API, called with the user's
//! access token once they are signed in.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Path of the applications listing, relative to `ADMIN_API_URL`
pub const APPLICATIONS_PATH: &str = "/api/v3/admin/apps/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub pk: Option<String>,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Admin API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid admin API response: {0}")]
    InvalidResponse(String),
}

pub type ResourceResult<T> = Result<T, ResourceError>;

#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn list_resources(&self, access_token: &str) -> ResourceResult<Vec<Resource>>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Paginated { results: Vec<Resource> },
    Bare(Vec<Resource>),
}

#[derive(Debug, Clone)]
pub struct AdminApiClient {
    http_client: Client,
    endpoint: String,
}

impl AdminApiClient {
    pub fn new(base_url: &str, http_timeout_seconds: u64) -> ResourceResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(http_timeout_seconds))
            .build()?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), APPLICATIONS_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ResourceClient for AdminApiClient {
    async fn list_resources(&self, access_token: &str) -> ResourceResult<Vec<Resource>> {
        debug!("Listing applications from {}", self.endpoint);

        let response = self
            .http_client
            .get(&self.endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let listing: Listing = serde_json::from_str(&body)
            .map_err(|e| ResourceError::InvalidResponse(e.to_string()))?;

        Ok(match listing {
            Listing::Paginated { results } => results,
            Listing::Bare(resources) => resources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_paginated_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(APPLICATIONS_PATH))
            .and(header("authorization", "Bearer user-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pagination": { "count": 2 },
                "results": [
                    { "pk": "5b1c", "name": "Grafana", "slug": "grafana" },
                    { "pk": "77aa", "name": "Wiki", "slug": "wiki" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AdminApiClient::new(&format!("{}/", server.uri()), 5).unwrap();
        let resources = client.list_resources("user-token").await.unwrap();

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].name, "Grafana");
        assert_eq!(resources[1].slug.as_deref(), Some("wiki"));
    }

    #[tokio::test]
    async fn test_bare_array_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(APPLICATIONS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "name": "Only name" }])),
            )
            .mount(&server)
            .await;

        let client = AdminApiClient::new(&server.uri(), 5).unwrap();
        let resources = client.list_resources("t").await.unwrap();

        assert_eq!(
            resources,
            vec![Resource {
                pk: None,
                name: "Only name".to_string(),
                slug: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_forbidden_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(APPLICATIONS_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = AdminApiClient::new(&server.uri(), 5).unwrap();
        match client.list_resources("t").await {
            Err(ResourceError::Status { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected a status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(APPLICATIONS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = AdminApiClient::new(&server.uri(), 5).unwrap();
        assert!(matches!(
            client.list_resources("t").await,
            Err(ResourceError::InvalidResponse(_))
        ));
    }
}
