//! Sends HTTP requests to Google.
//!
//! This module:
//! - Defines the `Executer` trait, a unified interface for token endpoint requests.
//! - Defines the `SearchConsoleApi` trait, the set of outbound calls the routes make.
//! - Implements both with `GoogleClient` on top of one shared `reqwest::Client`.
//!
//! Every call is a single attempt bounded by the configured timeout.
use std::{pin::Pin, sync::Arc};

use http::StatusCode;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    code::Code,
    config::Config,
    envelope::ApiResponse,
    error::ApiError,
    site::SiteType,
    token::{AccessToken, RefreshToken, RevokeTokenRequest, TokenRequest, TokenResponse},
};

/// Generic asynchronous execution interface for sending HTTP requests.
/// Key Components:
/// - Req: The request type that the executer will handle.
/// - Response: The expected response type.
/// - Error: The error type that will be returned on failure.
/// - Future: The asynchronous execution result, returning either Response or Error
pub trait Executer<'a, Req>
where
    Req: Send,
{
    type Response;
    type Error: std::error::Error;
    type Future: Future<Output = Result<Self::Response, Self::Error>> + Send + 'a;

    fn execute(&'a self, req: &'a Req) -> Self::Future;
}

/// Defines possible errors that can occur during request execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecuteError {
    #[error("Failed to build http client")]
    Client,
    #[error("Failed to parse data")]
    Parse,
    #[error("Failed to send request")]
    Send,
    #[error("Request timed out")]
    Timeout,
    #[error("Rejected by token endpoint: {0}")]
    Rejected(StatusCode),
    #[error("Failed to parse url")]
    URL,
}

impl From<ExecuteError> for ApiError {
    fn from(value: ExecuteError) -> Self {
        match value {
            ExecuteError::Timeout => ApiError::Timeout,
            _ => ApiError::Transport,
        }
    }
}

pub type ExecuteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ExecuteError>> + Send + 'a>>;

/// Upstream status plus the normalized envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiOutcome {
    pub status: StatusCode,
    pub response: ApiResponse,
}

/// Outbound calls made on behalf of the user.
pub trait SearchConsoleApi: Send + Sync {
    /// Site Verification `token`: asks Google for the DNS record or meta tag to publish.
    fn verification_token<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        site_type: SiteType,
    ) -> ExecuteFuture<'a, ApiOutcome>;

    /// Site Verification `webResource.insert`: asks Google to check the published token.
    fn verify_site<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        site_type: SiteType,
    ) -> ExecuteFuture<'a, ApiOutcome>;

    fn add_property<'a>(&'a self, token: &'a AccessToken, site: &'a str)
    -> ExecuteFuture<'a, ApiOutcome>;

    fn submit_sitemap<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        sitemap: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome>;

    fn inspect_url<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        url: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome>;

    fn request_indexing<'a>(
        &'a self,
        token: &'a AccessToken,
        url: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome>;

    fn exchange_code<'a>(
        &'a self,
        code: &'a Code,
        redirect_uri: &'a str,
    ) -> ExecuteFuture<'a, TokenResponse>;

    fn refresh<'a>(&'a self, refresh_token: &'a RefreshToken) -> ExecuteFuture<'a, TokenResponse>;

    fn revoke<'a>(&'a self, refresh_token: &'a RefreshToken) -> ExecuteFuture<'a, StatusCode>;
}

/// Talks to Google's OAuth and Search Console endpoints.
#[derive(Debug, Clone)]
pub struct GoogleClient {
    config: Arc<Config>,
    client: Client,
}

impl GoogleClient {
    pub fn new(config: Arc<Config>) -> Result<Self, ExecuteError> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| {
                error!("Failed to build http client: {:?}", e);
                ExecuteError::Client
            })?;
        Ok(Self { config, client })
    }

    fn url(base: &str, segments: &[&str]) -> Result<Url, ExecuteError> {
        let mut url = Url::parse(base).map_err(|e| {
            error!("Failed to parse url: {:?}", e);
            ExecuteError::URL
        })?;
        url.path_segments_mut()
            .map_err(|_| ExecuteError::URL)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends an authorized API request and wraps the reply in an envelope.
    async fn send_api(
        &self,
        req: RequestBuilder,
        token: &AccessToken,
        ok_summary: &str,
        fail_summary: &str,
    ) -> Result<ApiOutcome, ExecuteError> {
        let res = req
            .bearer_auth(token.value_as_str())
            .send()
            .await
            .map_err(send_error)?;
        let status = res.status();
        let text = res.text().await.map_err(send_error)?;
        let details = parse_details(&text);

        let response = if status.is_success() {
            ApiResponse::success(ok_summary, details)
        } else {
            error!("Google API returned {}: {}", status, fail_summary);
            ApiResponse::failure_with(fail_summary, details)
        };
        Ok(ApiOutcome { status, response })
    }

    async fn site_verification(
        &self,
        resource: &str,
        token: &AccessToken,
        site: &str,
        site_type: SiteType,
        summaries: (&str, &str),
    ) -> Result<ApiOutcome, ExecuteError> {
        let mut url = Self::url(&self.config.endpoints().site_verification, &[resource])?;
        url.query_pairs_mut().append_pair(
            "verificationMethod",
            site_type.verification_method().as_str(),
        );
        let body = json!({ "site": { "identifier": site, "type": site_type.resource_type() } });
        self.send_api(
            self.client.post(url).json(&body),
            token,
            summaries.0,
            summaries.1,
        )
        .await
    }
}

fn send_error(e: reqwest::Error) -> ExecuteError {
    if e.is_timeout() {
        error!("Request timed out: {:?}", e);
        ExecuteError::Timeout
    } else {
        error!("Failed to send request: {:?}", e);
        ExecuteError::Send
    }
}

/// Empty bodies become `{}` and non-JSON bodies are kept as text under `raw`.
fn parse_details(text: &str) -> Value {
    if text.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

/// Request Workflow
/// 1. Prepare the form for the requested grant.
/// 2. Send an HTTP POST request to the token endpoint.
/// 3. Reject non-2xx replies, then parse the body as TokenResponse.
impl<'a> Executer<'a, TokenRequest> for GoogleClient {
    type Response = TokenResponse;
    type Error = ExecuteError;
    type Future = ExecuteFuture<'a, TokenResponse>;

    fn execute(&'a self, req: &'a TokenRequest) -> Self::Future {
        Box::pin(async move {
            let url = Url::parse(req.token_endpoint()).map_err(|e| {
                error!("Failed to parse url: {:?}", e);
                ExecuteError::URL
            })?;

            let res = self
                .client
                .post(url)
                .form(&req.form())
                .send()
                .await
                .map_err(send_error)?;
            let status = res.status();
            if !status.is_success() {
                error!("Token endpoint rejected request: {}", status);
                return Err(ExecuteError::Rejected(status));
            }
            res.json::<TokenResponse>().await.map_err(|e| {
                error!("Failed to parse JSON: {:?}", e);
                ExecuteError::Parse
            })
        })
    }
}

/// Request Workflow
/// 1. Send the token to the revocation endpoint.
/// 2. Return the HTTP status code indicating success or failure.
impl<'a> Executer<'a, RevokeTokenRequest> for GoogleClient {
    type Response = StatusCode;
    type Error = ExecuteError;
    type Future = ExecuteFuture<'a, StatusCode>;

    fn execute(&'a self, req: &'a RevokeTokenRequest) -> Self::Future {
        Box::pin(async move {
            let status = self
                .client
                .post(req.end_point())
                .form(&[("token", req.inner_value())])
                .send()
                .await
                .map_err(send_error)?
                .status();
            Ok(status)
        })
    }
}

impl SearchConsoleApi for GoogleClient {
    fn verification_token<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        site_type: SiteType,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        Box::pin(self.site_verification(
            "token",
            token,
            site,
            site_type,
            ("Token issued", "Failed to obtain token"),
        ))
    }

    fn verify_site<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        site_type: SiteType,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        Box::pin(self.site_verification(
            "webResource",
            token,
            site,
            site_type,
            ("Site verified", "Verification failed"),
        ))
    }

    fn add_property<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        Box::pin(async move {
            let url = Self::url(&self.config.endpoints().search_console, &["sites", site])?;
            self.send_api(
                self.client.put(url),
                token,
                "Property added",
                "Property add failed",
            )
            .await
        })
    }

    fn submit_sitemap<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        sitemap: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        Box::pin(async move {
            let url = Self::url(
                &self.config.endpoints().search_console,
                &["sites", site, "sitemaps", sitemap],
            )?;
            self.send_api(
                self.client.put(url),
                token,
                "Sitemap submitted",
                "Sitemap submission failed",
            )
            .await
        })
    }

    fn inspect_url<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        url: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        Box::pin(async move {
            let endpoint = Self::url(&self.config.endpoints().url_inspection, &[])?;
            let body = json!({ "inspectionUrl": url, "siteUrl": site });
            self.send_api(
                self.client.post(endpoint).json(&body),
                token,
                "Inspection complete",
                "Inspection failed",
            )
            .await
        })
    }

    fn request_indexing<'a>(
        &'a self,
        token: &'a AccessToken,
        url: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        Box::pin(async move {
            let endpoint = Self::url(
                &self.config.endpoints().indexing,
                &["urlNotifications:publish"],
            )?;
            let body = json!({ "url": url, "type": "URL_UPDATED" });
            self.send_api(
                self.client.post(endpoint).json(&body),
                token,
                "Indexing notified",
                "Indexing request failed",
            )
            .await
        })
    }

    fn exchange_code<'a>(
        &'a self,
        code: &'a Code,
        redirect_uri: &'a str,
    ) -> ExecuteFuture<'a, TokenResponse> {
        Box::pin(async move {
            let req = TokenRequest::authorization_code(&self.config, code.clone(), redirect_uri);
            let res = self.execute(&req).await?;
            info!("Authorization code exchanged");
            Ok(res)
        })
    }

    fn refresh<'a>(&'a self, refresh_token: &'a RefreshToken) -> ExecuteFuture<'a, TokenResponse> {
        Box::pin(async move {
            let req = TokenRequest::refresh_token(&self.config, refresh_token);
            let res = self.execute(&req).await?;
            info!("Access token refreshed");
            Ok(res)
        })
    }

    fn revoke<'a>(&'a self, refresh_token: &'a RefreshToken) -> ExecuteFuture<'a, StatusCode> {
        Box::pin(async move {
            let req = RevokeTokenRequest::new(&self.config, refresh_token);
            self.execute(&req).await
        })
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{GoogleClient, parse_details};

    #[test]
    fn test_parse_details() {
        assert_eq!(parse_details(""), json!({}));
        assert_eq!(parse_details(r#"{"token":"abc"}"#), json!({"token": "abc"}));
        assert_eq!(parse_details("Bad Gateway"), json!({"raw": "Bad Gateway"}));
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let url = GoogleClient::url(
            "https://searchconsole.googleapis.com/v1",
            &["sites", "https://example.com/", "sitemaps", "https://example.com/sitemap.xml"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://searchconsole.googleapis.com/v1/sites/https:%2F%2Fexample.com%2F\
             /sitemaps/https:%2F%2Fexample.com%2Fsitemap.xml"
        );

        let url = GoogleClient::url("https://indexing.googleapis.com/v3/", &["urlNotifications:publish"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://indexing.googleapis.com/v3/urlNotifications:publish"
        );
    }
}
