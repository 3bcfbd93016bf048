//! Access tokens for the HMS push service
//!
//! Push requests must carry an access token obtained from the HMS
//! authentication endpoint through the OAuth2 _client credentials_ grant.
//! This crate performs that exchange and keeps track of when the resulting
//! token expires, so that callers can decide when to ask for a new one.
//!
//! The library never retries, never backs off and never persists a token.
//! Every failure is handed back to the caller, who is free to layer their
//! own policy on top.
//!
//! # Getting a token
//!
//! ```
//! use hms_push_auth::{AuthClient, Config, RequestContext};
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new(
//!     "10086",
//!     "app-secret",
//!     "https://oauth-login.cloud.huawei.com/oauth2/v3/token",
//! );
//!
//! let client = AuthClient::new(&config)?;
//!
//! let ctx = RequestContext::new().with_timeout(Duration::from_secs(10));
//! let token = client.get_auth_token_with_context(&ctx).await?;
//!
//! tracing::info!(
//!     token = format_args!("{:#?}", token.access_token()),
//!     expired_at = token.expired_at().0,
//!     "obtained access token"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Keeping the current token
//!
//! [`CachedAuthClient`] stores the last token it obtained. Its
//! [`refresh()`][CachedAuthClient::refresh] always performs a new exchange,
//! while [`valid_token()`][CachedAuthClient::valid_token] only does so when
//! the stored token is about to expire.
//!
//! ```
//! use hms_push_auth::{AuthClient, CachedAuthClient, Config, RequestContext};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AuthClient::new(&Config::from_env()?)?;
//! let ctx = RequestContext::default();
//!
//! let cached = CachedAuthClient::connect(client, &ctx).await?;
//! let token = cached.valid_token(&ctx).await?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! * `default-tls` (default): use the platform TLS stack in [`ReqwestTransport`].
//! * `rustls-tls`: use rustls in [`ReqwestTransport`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod braids;
mod cached;
mod client;
pub mod config;
mod error;
mod token;
pub mod transport;

#[cfg(test)]
mod test_util;

pub use braids::*;
pub use cached::CachedAuthClient;
pub use client::{AuthClient, RequestContext};
pub use config::Config;
pub use error::{ConfigError, NewClientError, ProviderError, TokenRequestError, TransportError};
pub use token::Token;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

pub use hms_push_clock as clock;
