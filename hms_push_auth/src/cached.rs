//! Holding on to the current token

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use hms_push_clock::{Clock, DurationSecs, System};
use tokio::sync::Mutex;

use crate::{AuthClient, HttpTransport, RequestContext, ReqwestTransport, Token, TokenRequestError};

/// An [`AuthClient`] that remembers the most recently obtained token
///
/// Reading the current token never touches the network. Refreshes are
/// serialized, so concurrent callers of [`refresh()`][Self::refresh] never
/// interleave their updates of the stored token.
#[derive(Debug)]
pub struct CachedAuthClient<T = ReqwestTransport, C = System> {
    client: AuthClient<T, C>,
    current: ArcSwapOption<Token>,
    refresh_lock: Mutex<()>,
    expiry_margin: DurationSecs,
}

impl<T, C> CachedAuthClient<T, C> {
    /// Wraps a client without obtaining a token yet
    pub fn new(client: AuthClient<T, C>) -> Self {
        Self {
            client,
            current: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(()),
            expiry_margin: DurationSecs(60),
        }
    }

    /// Sets how long before expiry [`valid_token()`][Self::valid_token]
    /// treats the current token as unusable
    ///
    /// Defaults to 60 seconds. For a token whose lifetime is no more than
    /// twice the margin, half of its lifetime is used instead, so short-lived
    /// tokens are still reused for a while after being obtained.
    pub fn with_expiry_margin(mut self, expiry_margin: DurationSecs) -> Self {
        self.expiry_margin = expiry_margin;
        self
    }

    /// The current token, if one has been obtained
    pub fn token(&self) -> Option<Arc<Token>> {
        self.current.load_full()
    }

    /// The wrapped client
    pub fn auth_client(&self) -> &AuthClient<T, C> {
        &self.client
    }
}

impl<T: HttpTransport, C: Clock> CachedAuthClient<T, C> {
    /// Wraps a client and obtains the first token immediately
    pub async fn connect(
        client: AuthClient<T, C>,
        ctx: &RequestContext,
    ) -> Result<Self, TokenRequestError> {
        let cached = Self::new(client);
        cached.refresh(ctx).await?;
        Ok(cached)
    }

    /// Obtains a new token and replaces the current one
    ///
    /// If the request fails, the current token is left in place.
    pub async fn refresh(&self, ctx: &RequestContext) -> Result<Arc<Token>, TokenRequestError> {
        let _guard = self.refresh_lock.lock().await;

        let token = Arc::new(self.client.get_auth_token_with_context(ctx).await?);
        self.current.store(Some(Arc::clone(&token)));

        tracing::debug!(expired_at = token.expired_at().0, "replaced current token");

        Ok(token)
    }

    /// The current token if it remains valid beyond the expiry margin,
    /// otherwise a freshly obtained one
    ///
    /// Callers racing past an expiring token each perform their own refresh.
    pub async fn valid_token(&self, ctx: &RequestContext) -> Result<Arc<Token>, TokenRequestError> {
        match self.usable_token() {
            Some(token) => Ok(token),
            None => self.refresh(ctx).await,
        }
    }

    fn usable_token(&self) -> Option<Arc<Token>> {
        let now = self.client.clock().now();

        self.current.load_full().filter(|token| {
            let margin = self.expiry_margin.min(DurationSecs(token.lifetime().0 / 2));
            !token.is_expired_at(now + margin)
        })
    }
}

#[cfg(test)]
mod tests {
    use hms_push_clock::UnixTime;
    use reqwest::StatusCode;

    use super::*;
    use crate::test_util::*;

    const SHORT_TOKEN_BODY: &str = r#"{"access_token":"short","expires_in":30,"scope":"push"}"#;
    const SECOND_TOKEN_BODY: &str = r#"{"access_token":"def456","expires_in":3600,"scope":"push"}"#;

    fn cached_with(
        transport: Arc<StubTransport>,
        clock: SharedClock,
    ) -> CachedAuthClient<Arc<StubTransport>, SharedClock> {
        let client = AuthClient::with_transport(&test_config(), transport)
            .unwrap()
            .with_clock(clock);
        CachedAuthClient::new(client)
    }

    #[tokio::test]
    async fn starts_without_a_token() {
        let transport = StubTransport::replying(StatusCode::OK, TOKEN_BODY);
        let cached = cached_with(transport.clone(), SharedClock::default());

        assert!(cached.token().is_none());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn connect_obtains_the_first_token() {
        let transport = StubTransport::replying(StatusCode::OK, TOKEN_BODY);
        let client = AuthClient::with_transport(&test_config(), transport.clone()).unwrap();

        let cached = CachedAuthClient::connect(client, &RequestContext::default())
            .await
            .unwrap();

        assert_eq!(cached.token().unwrap().access_token().as_str(), "abc123");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn connect_surfaces_the_first_failure() {
        let transport = StubTransport::replying(StatusCode::UNAUTHORIZED, "{}");
        let client = AuthClient::with_transport(&test_config(), transport).unwrap();

        let err = CachedAuthClient::connect(client, &RequestContext::default())
            .await
            .unwrap_err();

        assert!(matches!(err, TokenRequestError::AuthRequest { .. }));
    }

    mod refresh {
        use super::*;

        #[tokio::test]
        async fn replaces_the_current_token() {
            let transport = StubTransport::scripted(vec![
                (StatusCode::OK, TOKEN_BODY),
                (StatusCode::OK, SECOND_TOKEN_BODY),
            ]);
            let cached = cached_with(transport, SharedClock::new(UnixTime(1_000)));
            let ctx = RequestContext::default();

            cached.refresh(&ctx).await.unwrap();
            let first = cached.token().unwrap();
            let returned = cached.refresh(&ctx).await.unwrap();
            let second = cached.token().unwrap();

            assert_eq!(first.access_token().as_str(), "abc123");
            assert_eq!(second.access_token().as_str(), "def456");
            assert!(Arc::ptr_eq(&returned, &second));
        }

        #[tokio::test]
        async fn failure_keeps_the_previous_token() {
            let transport = StubTransport::scripted(vec![
                (StatusCode::OK, TOKEN_BODY),
                (StatusCode::SERVICE_UNAVAILABLE, "try later"),
            ]);
            let cached = cached_with(transport, SharedClock::new(UnixTime(1_000)));
            let ctx = RequestContext::default();

            cached.refresh(&ctx).await.unwrap();
            let err = cached.refresh(&ctx).await.unwrap_err();

            assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
            assert_eq!(cached.token().unwrap().access_token().as_str(), "abc123");
        }

        #[tokio::test]
        async fn concurrent_refreshes_each_perform_an_exchange() {
            let transport = StubTransport::replying(StatusCode::OK, TOKEN_BODY);
            let cached = cached_with(transport.clone(), SharedClock::new(UnixTime(1_000)));
            let ctx = RequestContext::default();

            let (a, b) = tokio::join!(cached.refresh(&ctx), cached.refresh(&ctx));

            assert!(a.is_ok() && b.is_ok());
            assert_eq!(transport.calls(), 2);
        }
    }

    mod valid_token {
        use super::*;

        #[tokio::test]
        async fn reuses_the_token_outside_the_margin() {
            let transport = StubTransport::scripted(vec![
                (StatusCode::OK, TOKEN_BODY),
                (StatusCode::OK, SECOND_TOKEN_BODY),
            ]);
            let clock = SharedClock::new(UnixTime(1_000));
            let cached = cached_with(transport.clone(), clock.clone());
            let ctx = RequestContext::default();

            let first = cached.valid_token(&ctx).await.unwrap();
            clock.inc(3_000);
            let again = cached.valid_token(&ctx).await.unwrap();

            assert_eq!(transport.calls(), 1);
            assert!(Arc::ptr_eq(&first, &again));
        }

        #[tokio::test]
        async fn refreshes_inside_the_margin() {
            let transport = StubTransport::scripted(vec![
                (StatusCode::OK, TOKEN_BODY),
                (StatusCode::OK, SECOND_TOKEN_BODY),
            ]);
            let clock = SharedClock::new(UnixTime(1_000));
            let cached = cached_with(transport.clone(), clock.clone());
            let ctx = RequestContext::default();

            cached.valid_token(&ctx).await.unwrap();
            clock.inc(3_550);
            let token = cached.valid_token(&ctx).await.unwrap();

            assert_eq!(transport.calls(), 2);
            assert_eq!(token.access_token().as_str(), "def456");
        }

        #[tokio::test]
        async fn margin_is_configurable() {
            let transport = StubTransport::replying(StatusCode::OK, TOKEN_BODY);
            let clock = SharedClock::new(UnixTime(1_000));
            let cached =
                cached_with(transport.clone(), clock.clone()).with_expiry_margin(DurationSecs(0));
            let ctx = RequestContext::default();

            cached.valid_token(&ctx).await.unwrap();
            clock.inc(3_599);
            cached.valid_token(&ctx).await.unwrap();

            assert_eq!(transport.calls(), 1);
        }

        #[tokio::test]
        async fn short_lived_token_is_reused_for_half_its_lifetime() {
            let transport = StubTransport::scripted(vec![
                (StatusCode::OK, SHORT_TOKEN_BODY),
                (StatusCode::OK, SECOND_TOKEN_BODY),
            ]);
            let clock = SharedClock::new(UnixTime(1_000));
            let cached = cached_with(transport.clone(), clock.clone());
            let ctx = RequestContext::default();

            let first = cached.valid_token(&ctx).await.unwrap();
            clock.inc(10);
            let again = cached.valid_token(&ctx).await.unwrap();

            assert_eq!(transport.calls(), 1);
            assert!(Arc::ptr_eq(&first, &again));

            clock.inc(5);
            let renewed = cached.valid_token(&ctx).await.unwrap();

            assert_eq!(transport.calls(), 2);
            assert_eq!(renewed.access_token().as_str(), "def456");
        }

        #[tokio::test]
        async fn empty_cache_is_filled_on_first_use() {
            let transport = StubTransport::replying(StatusCode::OK, TOKEN_BODY);
            let cached = cached_with(transport.clone(), SharedClock::new(UnixTime(1_000)));

            let token = cached.valid_token(&RequestContext::default()).await.unwrap();

            assert!(Arc::ptr_eq(&token, &cached.token().unwrap()));
            assert_eq!(transport.calls(), 1);
        }
    }
}
