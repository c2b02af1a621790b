//! Defines structures and builders related to gateway configuration.
//!
//! Provides a structured way to handle the OAuth client credentials, the
//! Google endpoints the gateway talks to, and the timers that govern stored state.
//!
//! ## Structures
//! - `Config`: Stores all the necessary information.
//! - `ConfigBuilder`: A builder for constructing a `Config` instance.
//!
//! # Example
//! ```rust,no_run
//! use tiny_search_console::config::Config;
//!
//! let config = Config::builder()
//!     .client_id("your-client-id")
//!     .client_secret("your-client-secret")
//!     .redirect_uri("https://your-app.com/api/oauth/callback")
//!     .build();
//! ```
//!
//! Every endpoint defaults to Google's production URL and can be overridden,
//! which is how the tests point the gateway at a mock server.
use std::time::Duration;

use tracing::error;

use crate::error::Error;

pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";
pub const SITE_VERIFICATION_BASE: &str = "https://www.googleapis.com/siteVerification/v1";
pub const SEARCH_CONSOLE_BASE: &str = "https://searchconsole.googleapis.com/v1";
pub const URL_INSPECTION_ENDPOINT: &str =
    "https://searchconsole.googleapis.com/v1/urlInspection/index:inspect";
pub const INDEXING_BASE: &str = "https://indexing.googleapis.com/v3";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
// 30 days
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30);
const DEFAULT_STATE_TTL: Duration = Duration::from_secs(60 * 10);
const DEFAULT_USER_ID: &str = "user";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientID(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClientSecret(pub String);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RedirectURI(pub String);

/// Google endpoints used by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub auth: String,
    pub token: String,
    pub revoke: String,
    pub site_verification: String,
    pub search_console: String,
    pub url_inspection: String,
    pub indexing: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth: GOOGLE_AUTH_ENDPOINT.to_string(),
            token: GOOGLE_TOKEN_ENDPOINT.to_string(),
            revoke: GOOGLE_REVOKE_ENDPOINT.to_string(),
            site_verification: SITE_VERIFICATION_BASE.to_string(),
            search_console: SEARCH_CONSOLE_BASE.to_string(),
            url_inspection: URL_INSPECTION_ENDPOINT.to_string(),
            indexing: INDEXING_BASE.to_string(),
        }
    }
}

/// Holds all information the gateway needs to run.
///
/// It is designed to be immutable once constructed.
///
/// # Fields
/// - `client_id`: The client ID obtained from Google Cloud Console.
/// - `client_secret`: The client secret linked to the client ID.
/// - `redirect_uri`: The callback URL registered in Google Cloud Console.
/// - `endpoints`: Authorization, token and API endpoints.
/// - `http_timeout`: Upper bound for every outbound call.
/// - `token_ttl`: How long a stored credential survives in the store.
///   Independent of the access token's own expiry.
/// - `state_ttl`: How long a pending OAuth `state` stays valid.
/// - `user_id`: The single user identifier credentials are stored under.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) client_id: ClientID,
    pub(crate) client_secret: ClientSecret,
    pub(crate) redirect_uri: RedirectURI,
    pub(crate) endpoints: Endpoints,
    pub(crate) http_timeout: Duration,
    pub(crate) token_ttl: Duration,
    pub(crate) state_ttl: Duration,
    pub(crate) user_id: String,
}
// ==========impl Config==========
impl Config {
    /// Returns a new `ConfigBuilder` instance to create a `Config` object.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reads the configuration from the process environment.
    /// A `.env` file in the working directory is loaded first when present.
    ///
    /// Required: `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `REDIRECT_URI`.
    /// Optional: `HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, Error> {
        let _ = dotenvy::dotenv();

        let mut builder = ConfigBuilder::new()
            .client_id(&read_env("GOOGLE_CLIENT_ID")?)
            .client_secret(&read_env("GOOGLE_CLIENT_SECRET")?)
            .redirect_uri(&read_env("REDIRECT_URI")?);

        if let Ok(secs) = dotenvy::var("HTTP_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|e| {
                error!("Failed to parse HTTP_TIMEOUT_SECS: {:?}", e);
                Error::Config("HTTP_TIMEOUT_SECS".to_string())
            })?;
            builder = builder.http_timeout(Duration::from_secs(secs));
        }
        Ok(builder.build())
    }

    pub fn client_id(&self) -> &str {
        &self.client_id.0
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri.0
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    pub fn state_ttl(&self) -> Duration {
        self.state_ttl
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

fn read_env(key: &str) -> Result<String, Error> {
    dotenvy::var(key).map_err(|e| {
        error!("Failed to read env {}: {:?}", key, e);
        Error::Config(key.to_string())
    })
}

/// Provides a convenient way to create a `Config` instance step by step.
///
/// # Example
/// ```rust,no_run
/// use tiny_search_console::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .client_id("your-client-id")
///     .client_secret("your-client-secret")
///     .redirect_uri("https://your-app.com/api/oauth/callback")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    client_id: ClientID,
    client_secret: ClientSecret,
    redirect_uri: RedirectURI,
    endpoints: Endpoints,
    http_timeout: Duration,
    token_ttl: Duration,
    state_ttl: Duration,
    user_id: String,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            client_id: ClientID(String::new()),
            client_secret: ClientSecret(String::new()),
            redirect_uri: RedirectURI(String::new()),
            endpoints: Endpoints::default(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            token_ttl: DEFAULT_TOKEN_TTL,
            state_ttl: DEFAULT_STATE_TTL,
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

// ==========impl ConfigBuilder==========
impl ConfigBuilder {
    /// Creates a new `ConfigBuilder` instance with default values.
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    /// Constructs a `Config` instance with the provided values.
    pub fn build(self) -> Config {
        Config {
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_uri: self.redirect_uri,
            endpoints: self.endpoints,
            http_timeout: self.http_timeout,
            token_ttl: self.token_ttl,
            state_ttl: self.state_ttl,
            user_id: self.user_id,
        }
    }

    /// Sets the client ID obtained from Google Cloud Console.
    pub fn client_id(mut self, client_id: &str) -> Self {
        self.client_id = ClientID(client_id.to_string());
        self
    }

    /// Sets the client secret associated with the client ID.
    pub fn client_secret(mut self, client_secret: &str) -> Self {
        self.client_secret = ClientSecret(client_secret.to_string());
        self
    }

    /// Sets the redirect URI registered in Google Cloud Console.
    pub fn redirect_uri(mut self, redirect_uri: &str) -> Self {
        self.redirect_uri = RedirectURI(redirect_uri.to_string());
        self
    }

    /// Replaces every endpoint at once.
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the authorization endpoint URL.
    pub fn auth_endpoint(mut self, auth_endpoint: &str) -> Self {
        self.endpoints.auth = auth_endpoint.to_string();
        self
    }

    /// Sets the token exchange endpoint URL.
    pub fn token_endpoint(mut self, token_endpoint: &str) -> Self {
        self.endpoints.token = token_endpoint.to_string();
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    pub fn user_id(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }
}
