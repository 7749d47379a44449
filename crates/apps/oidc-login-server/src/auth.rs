//! Login flow handlers.
//!
//! `GET /auth/{provider}` redirects to the identity provider and remembers
//! the pending authorization in a short-lived private cookie. The callback
//! consumes that cookie, exchanges the code, and stores the access token in
//! the session. `/success` reads the session back.

use crate::error::AppError;
use crate::pages;
use crate::resources::ResourceClient;
use crate::router::SUCCESS_PATH;
use crate::state::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use ras_identity_core::{AuthorizationProvider, CallbackParams, CorrelationState};
use ras_identity_session::PrivateCookieJar;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub async fn home(State(state): State<AppState>) -> Html<String> {
    Html(pages::index_page(state.providers.provider_ids()))
}

pub async fn begin_auth(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), AppError> {
    let provider = lookup(&state, &provider_id)?;

    let redirect = state
        .with_timeout(provider.begin_auth())
        .await?
        .map_err(AppError::Authorization)?;

    let jar = state.correlation.write(jar, &redirect.correlation)?;
    info!(provider = %provider_id, "Redirecting to identity provider");

    Ok((jar, Redirect::temporary(&redirect.url)))
}

pub async fn complete_auth(
    State(state): State<AppState>,
    Path(provider_id): Path<String>,
    jar: PrivateCookieJar,
    query: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
    let correlation = match state.correlation.read(&jar) {
        Ok(correlation) => correlation,
        Err(e) => {
            warn!(error = %e, "Discarding unreadable authorization state");
            None
        }
    };
    // Single use, whatever the outcome
    let jar = state.correlation.clear(jar);

    let callback = match query {
        Ok(Query(callback)) => callback,
        Err(rejection) => {
            return login_failure(jar, AppError::InvalidCallback(rejection.body_text()));
        }
    };

    let access_token = match exchange(&state, &provider_id, correlation, callback).await {
        Ok(token) => token,
        Err(e) => return login_failure(jar, e),
    };

    let (mut session, jar) = state.sessions.load(jar);
    session.set_access_token(access_token);
    let jar = match state.sessions.save(jar.clone(), &session) {
        Ok(jar) => jar,
        Err(e) => return login_failure(jar, e.into()),
    };

    info!(provider = %provider_id, "Login completed");
    (jar, Redirect::temporary(SUCCESS_PATH)).into_response()
}

/// Error response that still carries the queued cookie changes.
fn login_failure(jar: PrivateCookieJar, error: AppError) -> Response {
    (jar, error).into_response()
}

async fn exchange(
    state: &AppState,
    provider_id: &str,
    correlation: Option<CorrelationState>,
    callback: CallbackParams,
) -> Result<String, AppError> {
    let provider = lookup(state, provider_id)?;
    let correlation = correlation.ok_or(AppError::MissingCorrelation)?;

    let result = state
        .with_timeout(provider.complete_auth(&correlation, callback))
        .await?
        .map_err(AppError::Exchange)?;

    debug!(
        provider = %provider_id,
        subject = %result.identity.subject,
        "Exchanged authorization code"
    );
    Ok(result.access_token)
}

pub async fn show_success(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Html<String>) {
    let (session, jar) = state.sessions.load(jar);

    let notice = match (session.access_token(), &state.resources) {
        (Some(token), Some(client)) => fetch_resources(&state, client, token).await,
        (None, Some(_)) => {
            debug!("No access token in session, skipping admin API call");
            None
        }
        (_, None) => None,
    };

    (jar, Html(pages::success_page(notice)))
}

async fn fetch_resources(
    state: &AppState,
    client: &Arc<dyn ResourceClient>,
    token: &str,
) -> Option<&'static str> {
    match state.with_timeout(client.list_resources(token)).await {
        Ok(Ok(resources)) => {
            info!(count = resources.len(), "Fetched applications from admin API");
            debug!(?resources, "Admin API applications");
            None
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Admin API call failed");
            Some(pages::DEGRADED_NOTICE)
        }
        Err(e) => {
            warn!(error = %e, "Admin API call failed");
            Some(pages::DEGRADED_NOTICE)
        }
    }
}

fn lookup(state: &AppState, provider_id: &str) -> Result<Arc<dyn AuthorizationProvider>, AppError> {
    state
        .providers
        .get(provider_id)
        .map_err(|_| AppError::UnknownProvider(provider_id.to_string()))
}
