//! OAuth token lifecycle for the gateway's single user.
//!
//! ```text
//! Unauthenticated --start--> Pending --callback ok--> Authenticated
//!        ^                      |                         |
//!        +------ exchange fail -+                         |
//!        +------------------- logout / refresh rejected --+
//! ```
//!
//! While authenticated, `access_token()` refreshes the credential before it
//! hands out an access token that is about to expire.
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    code::{CallbackQuery, CodeRequest, Scope},
    config::Config,
    csrf_token::CSRFToken,
    error::ApiError,
    executer::{ExecuteError, SearchConsoleApi},
    store::{Credential, StateStore, TokenStore, now_millis},
    token::AccessToken,
};

/// Refresh this long before the recorded expiry.
const EXPIRY_SKEW_MS: i64 = 60_000;

/// Where the user is sent to grant consent.
#[derive(Debug, Clone, PartialEq)]
pub struct Authorization {
    /// Identifies the pending `state`; the browser keeps it in a cookie.
    pub session_key: String,
    pub url: String,
}

#[derive(Clone)]
pub struct Authenticator {
    config: Arc<Config>,
    api: Arc<dyn SearchConsoleApi>,
    tokens: TokenStore,
    states: StateStore,
}

impl Authenticator {
    pub fn new(
        config: Arc<Config>,
        api: Arc<dyn SearchConsoleApi>,
        tokens: TokenStore,
        states: StateStore,
    ) -> Self {
        Self {
            config,
            api,
            tokens,
            states,
        }
    }

    fn user_id(&self) -> &str {
        self.config.user_id()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.get(self.user_id()).await.is_some()
    }

    /// Generates and persists a fresh `state`, then builds the consent URL.
    pub async fn start(&self) -> Result<Authorization, ApiError> {
        let state = CSRFToken::new().map_err(|_| ApiError::Transport)?;
        let session_key = Uuid::new_v4().to_string();
        self.states
            .issue(&session_key, &state)
            .await
            .map_err(|e| {
                error!("Failed to persist OAuth state: {}", e);
                ApiError::Transport
            })?;
        let url = CodeRequest::new(&self.config, Scope::ALL, &state)
            .into_url()
            .map_err(|_| ApiError::Transport)?;
        Ok(Authorization { session_key, url })
    }

    /// Validates the callback and stores the exchanged credential.
    ///
    /// The stored `state` is consumed before comparison, so a replayed
    /// callback fails even when it carries the right value.
    pub async fn callback(
        &self,
        query: &CallbackQuery,
        session_key: Option<&str>,
    ) -> Result<(), ApiError> {
        if let Some(reason) = &query.error {
            warn!("Authorization denied by provider: {}", reason);
            return Err(ApiError::Validation(format!(
                "Authorization denied: {}",
                reason
            )));
        }
        if query.code.as_deref().is_none_or(|code| code.is_empty()) {
            return Err(ApiError::Validation("Missing code".to_string()));
        }
        let session_key = session_key.ok_or(ApiError::InvalidState)?;
        let stored = self
            .states
            .take(session_key)
            .await
            .map_err(|e| {
                error!("Failed to read OAuth state: {}", e);
                ApiError::Transport
            })?
            .ok_or(ApiError::InvalidState)?;
        let code = query.exchange_with_code(&stored).map_err(|e| {
            warn!("Rejected OAuth callback: {}", e);
            ApiError::InvalidState
        })?;

        let res = self
            .api
            .exchange_code(&code, self.config.redirect_uri())
            .await
            .map_err(|e| {
                error!("OAuth exchange failed: {}", e);
                ApiError::OAuthExchange
            })?;
        let credential = Credential::from_response(res, None, now_millis());
        if credential.refresh_token.is_none() {
            warn!("Token endpoint issued no refresh token");
        }
        self.tokens
            .put(self.user_id(), &credential)
            .await
            .map_err(|e| {
                error!("Failed to store credential: {}", e);
                ApiError::OAuthExchange
            })?;
        info!("User {} authenticated", self.user_id());
        Ok(())
    }

    /// Returns a usable access token, refreshing the stored credential first when it has expired.
    pub async fn access_token(&self) -> Result<AccessToken, ApiError> {
        let user_id = self.user_id();
        let credential = self
            .tokens
            .get(user_id)
            .await
            .ok_or(ApiError::AuthenticationRequired)?;
        if !credential.is_expired(now_millis(), EXPIRY_SKEW_MS) {
            return Ok(credential.access_token);
        }

        let Some(refresh_token) = credential.refresh_token else {
            warn!("Access token expired and no refresh token is stored");
            self.forget().await;
            return Err(ApiError::AuthenticationRequired);
        };
        match self.api.refresh(&refresh_token).await {
            Ok(res) => {
                let refreshed = Credential::from_response(res, Some(refresh_token), now_millis());
                if let Err(e) = self.tokens.put(user_id, &refreshed).await {
                    warn!("Failed to store refreshed credential: {}", e);
                }
                Ok(refreshed.access_token)
            }
            Err(ExecuteError::Rejected(status)) => {
                warn!("Refresh token rejected ({}), signing out", status);
                self.forget().await;
                Err(ApiError::AuthenticationRequired)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revokes the refresh token at the provider and deletes the credential.
    /// Revocation is best effort; the local credential is always removed.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let user_id = self.user_id();
        if let Some(refresh_token) = self
            .tokens
            .get(user_id)
            .await
            .and_then(|credential| credential.refresh_token)
        {
            match self.api.revoke(&refresh_token).await {
                Ok(status) if status.is_success() => info!("Refresh token revoked"),
                Ok(status) => warn!("Revocation returned {}", status),
                Err(e) => warn!("Revocation failed: {}", e),
            }
        }
        self.tokens.delete(user_id).await.map_err(|e| {
            error!("Failed to delete credential: {}", e);
            ApiError::Transport
        })?;
        info!("User {} signed out", user_id);
        Ok(())
    }

    async fn forget(&self) {
        if let Err(e) = self.tokens.delete(self.user_id()).await {
            warn!("Failed to delete credential: {}", e);
        }
    }
}
