//! Token endpoint requests and responses.
//!
//! This module:
//! - AccessToken / RefreshToken: bearer credentials issued by Google.
//! - TokenRequest: the form posted to the token endpoint, for either grant.
//! - TokenResponse: the parsed token endpoint reply.
//! - RevokeTokenRequest: the form posted to the revocation endpoint.
use serde::{Deserialize, Serialize};

use crate::{
    code::Code,
    config::{ClientID, ClientSecret, Config},
};

/// Represents an OAuth 2.0 access token used to call Google APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken(pub(crate) String);

impl AccessToken {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn value_as_str(&self) -> &str {
        &self.0
    }
}

/// Represents an OAuth 2.0 refresh token, used to mint new access tokens without user interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshToken(pub(crate) String);

impl RefreshToken {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn value_as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Grant {
    AuthorizationCode { code: Code, redirect_uri: String },
    RefreshToken(RefreshToken),
}

/// Represents a form request to Google's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    pub(crate) token_endpoint: String,
    pub(crate) client_id: ClientID,
    pub(crate) client_secret: ClientSecret,
    pub(crate) grant: Grant,
}

impl TokenRequest {
    /// Exchanges an authorization code. `redirect_uri` must match the one used
    /// in the authorization request.
    pub fn authorization_code(config: &Config, code: Code, redirect_uri: &str) -> Self {
        Self {
            token_endpoint: config.endpoints.token.to_owned(),
            client_id: config.client_id.to_owned(),
            client_secret: config.client_secret.to_owned(),
            grant: Grant::AuthorizationCode {
                code,
                redirect_uri: redirect_uri.to_string(),
            },
        }
    }

    pub fn refresh_token(config: &Config, refresh_token: &RefreshToken) -> Self {
        Self {
            token_endpoint: config.endpoints.token.to_owned(),
            client_id: config.client_id.to_owned(),
            client_secret: config.client_secret.to_owned(),
            grant: Grant::RefreshToken(refresh_token.to_owned()),
        }
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    pub fn grant(&self) -> &Grant {
        &self.grant
    }

    /// Form fields in the order Google documents them.
    pub fn form(&self) -> Vec<(&str, &str)> {
        let mut form = Vec::with_capacity(5);
        match &self.grant {
            Grant::AuthorizationCode { code, redirect_uri } => {
                form.push(("code", code.value()));
                form.push(("client_id", self.client_id.0.as_str()));
                form.push(("client_secret", self.client_secret.0.as_str()));
                form.push(("redirect_uri", redirect_uri.as_str()));
                form.push(("grant_type", "authorization_code"));
            }
            Grant::RefreshToken(refresh_token) => {
                form.push(("refresh_token", refresh_token.value_as_str()));
                form.push(("client_id", self.client_id.0.as_str()));
                form.push(("client_secret", self.client_secret.0.as_str()));
                form.push(("grant_type", "refresh_token"));
            }
        }
        form
    }
}

/// Token endpoint response.
/// A refresh reply usually omits `refresh_token`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    pub expires_in: u64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Represents a request to revoke a token at Google's revocation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RevokeTokenRequest {
    pub(crate) end_point: String,
    pub(crate) token: String,
}

impl RevokeTokenRequest {
    /// Revoking the refresh token invalidates every access token minted from it.
    pub fn new(config: &Config, token: &RefreshToken) -> Self {
        Self {
            end_point: config.endpoints.revoke.to_owned(),
            token: token.0.to_owned(),
        }
    }

    pub fn end_point(&self) -> &str {
        &self.end_point
    }

    pub fn inner_value(&self) -> &str {
        &self.token
    }
}
