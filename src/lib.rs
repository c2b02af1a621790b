//! Tiny gateway that connects a website to Google Search Console.
//!
//! The gateway runs the OAuth authorization code flow against Google, keeps the
//! resulting credential in a key-value store, and forwards a handful of user
//! actions to Google's REST APIs, answering every one of them with the same
//! `{ success, summary, details }` envelope.
//! # Feature
//! - Generate the authorization URL with a server-side checked `state`
//! - Exchange the authorization code and store the credential
//! - Refresh the access token before it is used once it has expired
//! - Site verification (DNS TXT or meta tag) and confirmation
//! - Property registration and sitemap submission
//! - URL inspection
//! - Instant indexing requests, guarded by an eligibility check
//! - Revoke the refresh token on sign out
//! # Caution
//! - The gateway serves a single user identifier. It has no user sessions of its own.
pub mod code;
pub mod config;
pub mod csrf_token;
pub mod envelope;
pub mod error;
pub mod executer;
pub mod routes;
pub mod session;
pub mod site;
pub mod store;
pub mod token;
pub mod ui;

#[cfg(test)]
mod mock;
