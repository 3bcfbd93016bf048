//! The client-credentials exchange against the authentication endpoint

use std::{future::Future, time::Duration};

use hms_push_clock::{Clock, System};
use reqwest::{
    header::{HeaderValue, CONTENT_TYPE},
    StatusCode, Url,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    AppId, AppSecret, Config, ConfigError, HttpRequest, HttpTransport, NewClientError,
    ReqwestTransport, Token, TokenRequestError,
};

mod dto;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// The caller's deadline and cancellation signal for a token request
///
/// The default context never times out and cannot be cancelled.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancellation: Option<CancellationToken>,
}

impl RequestContext {
    /// Constructs a context without deadline or cancellation
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the request with [`TokenRequestError::Timeout`] once `deadline` passes
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fails the request with [`TokenRequestError::Timeout`] after `timeout`
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Fails the request with [`TokenRequestError::Cancelled`] when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map_or(false, CancellationToken::is_cancelled)
    }

    /// Drives `fut` until it completes or the context fires
    async fn run<F, T>(&self, fut: F) -> Result<T, TokenRequestError>
    where
        F: Future<Output = Result<T, TokenRequestError>>,
    {
        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(TokenRequestError::Cancelled),
            _ = expired => Err(TokenRequestError::Timeout),
            result = fut => result,
        }
    }
}

/// Obtains access tokens from the authentication endpoint using the
/// client-credentials grant
///
/// Every call to [`get_auth_token_with_context()`][Self::get_auth_token_with_context]
/// performs a full round trip; nothing is cached here. Use
/// [`CachedAuthClient`][crate::CachedAuthClient] to hold on to the current token.
#[derive(Clone, Debug)]
pub struct AuthClient<T = ReqwestTransport, C = System> {
    endpoint: Url,
    app_id: AppId,
    app_secret: AppSecret,
    transport: T,
    clock: C,
}

impl AuthClient {
    /// Constructs a client that talks to the endpoint over a new [`ReqwestTransport`]
    ///
    /// No request is sent until a token is requested.
    pub fn new(config: &Config) -> Result<Self, NewClientError> {
        check_credentials(&config.app_id, &config.app_secret)?;
        let transport = ReqwestTransport::new().map_err(NewClientError::TransportInit)?;
        Self::from_parts(config, transport)
    }
}

impl<T: HttpTransport> AuthClient<T> {
    /// Constructs a client that sends its requests through `transport`
    pub fn with_transport(config: &Config, transport: T) -> Result<Self, NewClientError> {
        check_credentials(&config.app_id, &config.app_secret)?;
        Self::from_parts(config, transport)
    }
}

impl<T> AuthClient<T> {
    fn from_parts(config: &Config, transport: T) -> Result<Self, NewClientError> {
        if config.auth_url.is_empty() {
            return Err(ConfigError::MissingAuthUrl.into());
        }

        let endpoint = Url::parse(&config.auth_url)
            .map_err(|_| ConfigError::InvalidAuthUrl(config.auth_url.clone()))?;

        Ok(Self {
            endpoint,
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            transport,
            clock: System,
        })
    }
}

impl<T, C> AuthClient<T, C> {
    /// Sets a custom clock used to compute token expiry
    ///
    /// Useful for testing purposes
    pub fn with_clock<D>(self, clock: D) -> AuthClient<T, D> {
        AuthClient {
            endpoint: self.endpoint,
            app_id: self.app_id,
            app_secret: self.app_secret,
            transport: self.transport,
            clock,
        }
    }

    /// The token endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The application ID sent with each request
    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    pub(crate) fn clock(&self) -> &C {
        &self.clock
    }
}

impl<T: HttpTransport, C: Clock> AuthClient<T, C> {
    /// Requests a new token without a deadline
    ///
    /// Dropping the returned future abandons the request.
    pub async fn get_auth_token(&self) -> Result<Token, TokenRequestError> {
        self.get_auth_token_with_context(&RequestContext::default())
            .await
    }

    /// Requests a new token, bounded by the caller's context
    ///
    /// Only a `200 OK` response is accepted. Any other status is returned as
    /// [`TokenRequestError::AuthRequest`] carrying the raw response body.
    #[tracing::instrument(
        err,
        skip(self, ctx),
        fields(
            auth_url = %self.endpoint,
            app_id = %self.app_id,
        ),
    )]
    pub async fn get_auth_token_with_context(
        &self,
        ctx: &RequestContext,
    ) -> Result<Token, TokenRequestError> {
        check_credentials(&self.app_id, &self.app_secret)?;

        if ctx.is_cancelled() {
            return Err(TokenRequestError::Cancelled);
        }

        let body = dto::client_credentials_body(self.app_id.as_str(), self.app_secret.as_str());
        let request = HttpRequest::post(self.endpoint.clone())
            .with_header(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED))
            .with_body(body);

        tracing::trace!("requesting token from authority");

        let resp = ctx
            .run(async {
                self.transport
                    .send(request)
                    .await
                    .map_err(TokenRequestError::from)
            })
            .await?;

        tracing::debug!(
            response.status = resp.status.as_u16(),
            "received token response from authority"
        );

        if resp.status != StatusCode::OK {
            return Err(TokenRequestError::AuthRequest {
                status: resp.status,
                body: String::from_utf8_lossy(&resp.body).into_owned(),
            });
        }

        let payload: dto::TokenResponse = serde_json::from_slice(&resp.body)?;
        let token = Token::new(payload.access_token, self.clock.now(), payload.expires_in);

        tracing::debug!(
            scope = %payload.scope,
            lifetime = token.lifetime().0,
            expired_at = token.expired_at().0,
            "received new token"
        );

        Ok(token)
    }
}

fn check_credentials(app_id: &AppId, app_secret: &AppSecret) -> Result<(), ConfigError> {
    if app_id.as_str().is_empty() || app_secret.as_str().is_empty() {
        Err(ConfigError::MissingCredentials)
    } else {
        Ok(())
    }
}
