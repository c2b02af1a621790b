//! HTTP dispatcher.
//!
//! Routing
//! - "/" returns the HTML page
//! - "/api/state" reports whether a credential is stored
//! - "/api/oauth/start" and "/api/oauth/callback" run the authorization code flow
//! - "/api/logout" revokes and forgets the credential
//! - the remaining "/api/*" POST routes forward one call to Google with the stored access token
//!
//! Only exact path + method pairs match; everything else gets the "Not found" envelope.
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use http::{StatusCode, header::LOCATION};
use serde_json::json;
use tracing::{info, warn};

use crate::{
    code::CallbackQuery,
    envelope::ApiResponse,
    error::ApiError,
    executer::{ApiOutcome, ExecuteError, SearchConsoleApi},
    session::Authenticator,
    site::{
        InspectRequest, PropertyRequest, ReindexRequest, SitemapRequest, VerifyRequest,
        parse_body,
    },
    ui,
};

pub static STATE_COOKIE_KEY: &str = "oauth_state_key";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    auth: Authenticator,
    api: Arc<dyn SearchConsoleApi>,
}

impl AppState {
    pub fn new(auth: Authenticator, api: Arc<dyn SearchConsoleApi>) -> Self {
        Self { auth, api }
    }
}

/// Builds the route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ui::index))
        .route("/api/state", get(auth_state))
        .route("/api/oauth/start", get(oauth_start))
        .route("/api/oauth/callback", get(oauth_callback))
        .route("/api/logout", post(logout))
        .route("/api/verify", post(verify))
        .route("/api/confirm", post(confirm))
        .route("/api/property", post(property))
        .route("/api/sitemap", post(sitemap))
        .route("/api/url", post(inspect))
        .route("/api/reindex", post(reindex))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(Arc::new(state))
}

impl IntoResponse for ApiOutcome {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn auth_state(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let authed = state.auth.is_authenticated().await;
    Json(ApiResponse::success("current state", json!({ "authed": authed })))
}

async fn oauth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let authorization = state.auth.start().await?;
    let cookie = Cookie::build((STATE_COOKIE_KEY, authorization.session_key))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok((jar.add(cookie), found(&authorization.url)))
}

async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let session_key = jar.get(STATE_COOKIE_KEY).map(|c| c.value().to_string());
    let result = state.auth.callback(&query, session_key.as_deref()).await;

    // The pending state is gone either way.
    let jar = jar.remove(Cookie::build(STATE_COOKIE_KEY).path("/"));
    match result {
        Ok(()) => (jar, found("/")).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

async fn logout(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse>, ApiError> {
    state.auth.logout().await?;
    Ok(Json(ApiResponse::success("Logged out", json!({}))))
}

/// Logs the upstream result of a forwarded call and passes it through unchanged.
fn forwarded(route: &str, outcome: Result<ApiOutcome, ExecuteError>) -> Result<ApiOutcome, ApiError> {
    match outcome {
        Ok(outcome) if outcome.response.success => {
            info!("{} -> {}", route, outcome.status);
            Ok(outcome)
        }
        Ok(outcome) => {
            warn!("{} -> {} ({})", route, outcome.status, outcome.response.summary);
            Ok(outcome)
        }
        Err(e) => {
            warn!("{} failed: {}", route, e);
            Err(e.into())
        }
    }
}

async fn verify(State(state): State<Arc<AppState>>, body: Bytes) -> Result<ApiOutcome, ApiError> {
    let token = state.auth.access_token().await?;
    let req: VerifyRequest = parse_body(&body)?;
    forwarded(
        "verify",
        state
            .api
            .verification_token(&token, &req.site, req.site_type)
            .await,
    )
}

async fn confirm(State(state): State<Arc<AppState>>, body: Bytes) -> Result<ApiOutcome, ApiError> {
    let token = state.auth.access_token().await?;
    let req: VerifyRequest = parse_body(&body)?;
    forwarded(
        "confirm",
        state.api.verify_site(&token, &req.site, req.site_type).await,
    )
}

async fn property(State(state): State<Arc<AppState>>, body: Bytes) -> Result<ApiOutcome, ApiError> {
    let token = state.auth.access_token().await?;
    let req: PropertyRequest = parse_body(&body)?;
    forwarded("property", state.api.add_property(&token, &req.site).await)
}

async fn sitemap(State(state): State<Arc<AppState>>, body: Bytes) -> Result<ApiOutcome, ApiError> {
    let token = state.auth.access_token().await?;
    let req: SitemapRequest = parse_body(&body)?;
    forwarded(
        "sitemap",
        state
            .api
            .submit_sitemap(&token, &req.site, &req.sitemap)
            .await,
    )
}

async fn inspect(State(state): State<Arc<AppState>>, body: Bytes) -> Result<ApiOutcome, ApiError> {
    let token = state.auth.access_token().await?;
    let req: InspectRequest = parse_body(&body)?;
    forwarded("url", state.api.inspect_url(&token, &req.site, &req.url).await)
}

/// Instant indexing is only offered for content the caller asserts is eligible;
/// anything else is turned away here without contacting Google.
async fn reindex(State(state): State<Arc<AppState>>, body: Bytes) -> Result<ApiOutcome, ApiError> {
    let token = state.auth.access_token().await?;
    let req: ReindexRequest = parse_body(&body)?;
    if !req.is_eligible() {
        return Err(ApiError::not_eligible());
    }
    let url = req
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(ApiError::missing_fields)?;
    forwarded("reindex", state.api.request_indexing(&token, url).await)
}
