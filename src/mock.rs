//! Test doubles: a recording `SearchConsoleApi` and a `KvStore` that counts writes.
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use http::StatusCode;
use serde_json::json;

use crate::{
    code::Code,
    config::{Config, ConfigBuilder},
    envelope::ApiResponse,
    executer::{ApiOutcome, ExecuteError, ExecuteFuture, SearchConsoleApi},
    session::Authenticator,
    site::SiteType,
    store::{KvStore, MemoryStore, StateStore, StoreFuture, TokenStore},
    token::{AccessToken, RefreshToken, TokenResponse},
};

pub(crate) const REDIRECT_URI: &str = "https://gateway.example.com/api/oauth/callback";

pub(crate) fn token_response(access: &str, refresh: Option<&str>, expires_in: u64) -> TokenResponse {
    TokenResponse {
        access_token: AccessToken::new(access),
        refresh_token: refresh.map(RefreshToken::new),
        expires_in,
        scope: None,
        token_type: Some("Bearer".to_string()),
    }
}

pub(crate) struct MockApi {
    pub outcome: Result<ApiOutcome, ExecuteError>,
    pub exchange: Result<TokenResponse, ExecuteError>,
    pub refresh: Result<TokenResponse, ExecuteError>,
    pub calls: Mutex<Vec<(&'static str, Vec<String>)>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            outcome: Ok(ApiOutcome {
                status: StatusCode::OK,
                response: ApiResponse::success("ok", json!({})),
            }),
            exchange: Ok(token_response("fresh-access", Some("fresh-refresh"), 3600)),
            refresh: Ok(token_response("refreshed-access", None, 3600)),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockApi {
    pub fn with_outcome(status: StatusCode, response: ApiResponse) -> Self {
        Self {
            outcome: Ok(ApiOutcome { status, response }),
            ..Default::default()
        }
    }

    fn record(&self, name: &'static str, args: &[&str]) {
        self.calls
            .lock()
            .unwrap()
            .push((name, args.iter().map(|a| a.to_string()).collect()));
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| *n == name)
            .count()
    }

    pub fn total(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn args(&self, name: &str) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, args)| args.clone())
            .collect()
    }

    fn api_call<'a>(&'a self, name: &'static str, args: &[&str]) -> ExecuteFuture<'a, ApiOutcome> {
        self.record(name, args);
        let outcome = self.outcome.clone();
        Box::pin(async move { outcome })
    }
}

impl SearchConsoleApi for MockApi {
    fn verification_token<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        site_type: SiteType,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        self.api_call(
            "verification_token",
            &[token.value_as_str(), site, site_type.resource_type()],
        )
    }

    fn verify_site<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        site_type: SiteType,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        self.api_call(
            "verify_site",
            &[token.value_as_str(), site, site_type.resource_type()],
        )
    }

    fn add_property<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        self.api_call("add_property", &[token.value_as_str(), site])
    }

    fn submit_sitemap<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        sitemap: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        self.api_call("submit_sitemap", &[token.value_as_str(), site, sitemap])
    }

    fn inspect_url<'a>(
        &'a self,
        token: &'a AccessToken,
        site: &'a str,
        url: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        self.api_call("inspect_url", &[token.value_as_str(), site, url])
    }

    fn request_indexing<'a>(
        &'a self,
        token: &'a AccessToken,
        url: &'a str,
    ) -> ExecuteFuture<'a, ApiOutcome> {
        self.api_call("request_indexing", &[token.value_as_str(), url])
    }

    fn exchange_code<'a>(
        &'a self,
        code: &'a Code,
        redirect_uri: &'a str,
    ) -> ExecuteFuture<'a, TokenResponse> {
        self.record("exchange_code", &[code.value(), redirect_uri]);
        let res = self.exchange.clone();
        Box::pin(async move { res })
    }

    fn refresh<'a>(&'a self, refresh_token: &'a RefreshToken) -> ExecuteFuture<'a, TokenResponse> {
        self.record("refresh", &[refresh_token.value_as_str()]);
        let res = self.refresh.clone();
        Box::pin(async move { res })
    }

    fn revoke<'a>(&'a self, refresh_token: &'a RefreshToken) -> ExecuteFuture<'a, StatusCode> {
        self.record("revoke", &[refresh_token.value_as_str()]);
        Box::pin(async move { Ok(StatusCode::OK) })
    }
}

/// `MemoryStore` that remembers the key of every `put`.
#[derive(Default)]
pub(crate) struct CountingStore {
    inner: MemoryStore,
    puts: Mutex<Vec<String>>,
}

impl CountingStore {
    pub fn puts_with_prefix(&self, prefix: &str) -> usize {
        self.puts
            .lock()
            .unwrap()
            .iter()
            .filter(|key| key.starts_with(prefix))
            .count()
    }
}

impl KvStore for CountingStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        self.inner.get(key)
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Option<Duration>,
    ) -> StoreFuture<'a, ()> {
        self.puts.lock().unwrap().push(key.to_string());
        self.inner.put(key, value, ttl)
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        self.inner.delete(key)
    }

    fn take<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        self.inner.take(key)
    }
}

pub(crate) fn test_config() -> Arc<Config> {
    Arc::new(
        ConfigBuilder::new()
            .auth_endpoint("https://accounts.example.com/o/oauth2/v2/auth")
            .client_id("client-id")
            .client_secret("client-secret")
            .redirect_uri(REDIRECT_URI)
            .build(),
    )
}

pub(crate) struct Fixture {
    pub config: Arc<Config>,
    pub api: Arc<MockApi>,
    pub kv: Arc<CountingStore>,
    pub tokens: TokenStore,
    pub auth: Authenticator,
}

pub(crate) fn fixture(api: MockApi) -> Fixture {
    let config = test_config();
    let api = Arc::new(api);
    let kv = Arc::new(CountingStore::default());
    let tokens = TokenStore::new(kv.clone(), config.token_ttl());
    let states = StateStore::new(kv.clone(), config.state_ttl());
    let auth = Authenticator::new(config.clone(), api.clone(), tokens.clone(), states);
    Fixture {
        config,
        api,
        kv,
        tokens,
        auth,
    }
}
