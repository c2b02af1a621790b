//! This module handles the authorization request and the callback that
//! carries the authorization code back from Google.
//!
//! # Key Structures
//!
//! ## `CodeRequest`
//! Builds the authorization request URL.
//! - Includes the Search Console scopes, redirect URI and `state`.
//! - Always asks for offline access so Google issues a refresh token.
//!
//! ## `CallbackQuery`
//! The query string Google redirects back with. It holds an unverified `code`
//! and `state`, or an `error` when the user declined consent.
//!
//! # Flow
//! 1. Generate a `CSRFToken` and persist it server-side.
//! 2. Redirect the user to `CodeRequest::into_url()`.
//! 3. Google redirects back with `code` and `state` (`CallbackQuery`).
//! 4. `CallbackQuery::exchange_with_code()` checks `state` against the stored token
//!    and yields a `Code` that can be exchanged for tokens.
use itertools::Itertools;
use serde::Deserialize;
use tracing::error;

use crate::{
    config::Config,
    csrf_token::{CSRFToken, UnCheckedCSRFToken},
    error::Error,
};

/// Scopes requested from Google.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Search Console properties, sitemaps and URL inspection.
    Webmasters,
    /// Indexing API notifications.
    Indexing,
    /// Site Verification API.
    SiteVerification,
}

impl Scope {
    /// Every scope the gateway needs.
    pub const ALL: [Scope; 3] = [Scope::Webmasters, Scope::Indexing, Scope::SiteVerification];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Webmasters => "https://www.googleapis.com/auth/webmasters",
            Scope::Indexing => "https://www.googleapis.com/auth/indexing",
            Scope::SiteVerification => "https://www.googleapis.com/auth/siteverification",
        }
    }
}

/// The authorization code, only obtainable after the `state` check passed.
#[derive(Debug, Clone, PartialEq)]
pub struct Code(pub(crate) String);

impl Code {
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<String> for Code {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Generates a URL to initiate the authorization request.
/// # Example
/// ```rust,no_run
/// use tiny_search_console::{code::{CodeRequest, Scope}, config::Config, csrf_token::CSRFToken};
///
/// let config = Config::builder()
///     .client_id("your_client_id")
///     .redirect_uri("your_redirect_uri")
///     .build();
/// let csrf_token = CSRFToken::new().unwrap();
///
/// let url = CodeRequest::new(&config, Scope::ALL, &csrf_token).into_url().unwrap();
/// println!("Auth URL: {}", url);
/// ```
#[derive(Debug, Clone)]
pub struct CodeRequest {
    auth_endpoint: String,
    client_id: String,
    redirect_uri: String,
    scope: Vec<Scope>,
    state: CSRFToken,
}

impl CodeRequest {
    pub fn new(
        config: &Config,
        scope: impl IntoIterator<Item = Scope>,
        state: &CSRFToken,
    ) -> Self {
        Self {
            auth_endpoint: config.endpoints.auth.to_owned(),
            client_id: config.client_id.0.to_owned(),
            redirect_uri: config.redirect_uri.0.to_owned(),
            scope: scope.into_iter().collect(),
            state: state.to_owned(),
        }
    }

    /// Constructs a URL with the required query parameters.
    pub fn into_url(&self) -> Result<String, Error> {
        let scope = self
            .scope
            .iter()
            .unique()
            .map(Scope::as_str)
            .sorted()
            .join(" ");

        let url = url::Url::parse_with_params(
            &self.auth_endpoint,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", self.state.value()),
            ],
        )
        .map_err(|e| {
            error!("Failed to parse auth endpoint: {}", e);
            Error::URL
        })?;
        Ok(url.into())
    }
}

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackQuery {
    /// Returns the `code` once the echoed `state` matches the stored token.
    pub fn exchange_with_code(&self, stored: &CSRFToken) -> Result<Code, Error> {
        let state = UnCheckedCSRFToken::from(self.state.clone().ok_or(Error::CSRFNotMatch)?);
        state.verify(stored)?;
        let code = self.code.clone().ok_or(Error::URL)?;
        Ok(code.into())
    }
}
