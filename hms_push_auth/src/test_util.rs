use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use hms_push_clock::{Clock, UnixTime};
use reqwest::StatusCode;

use crate::{Config, HttpRequest, HttpResponse, HttpTransport, TransportError};

pub const TEST_AUTH_URL: &str = "https://auth.example.com/oauth2/v3/token";
pub const TOKEN_BODY: &str = r#"{"access_token":"abc123","expires_in":3600,"scope":"push"}"#;

pub fn test_config() -> Config {
    Config::new("10086", "s3cr3t", TEST_AUTH_URL)
}

/// Replies with queued responses in order and records every request
///
/// Once the queue is drained, the last response is repeated.
#[derive(Debug)]
pub struct StubTransport {
    responses: Mutex<VecDeque<(StatusCode, &'static str)>>,
    last: Mutex<(StatusCode, &'static str)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn replying(status: StatusCode, body: &'static str) -> Arc<Self> {
        Self::scripted(vec![(status, body)])
    }

    pub fn scripted(responses: Vec<(StatusCode, &'static str)>) -> Arc<Self> {
        let last = responses
            .last()
            .copied()
            .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, ""));
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(last),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);

        let (status, body) = match self.responses.lock().unwrap().pop_front() {
            Some(next) => {
                *self.last.lock().unwrap() = next;
                next
            }
            None => *self.last.lock().unwrap(),
        };

        Ok(HttpResponse {
            status,
            body: Bytes::from_static(body.as_bytes()),
        })
    }
}

/// Never answers
#[derive(Debug, Default)]
pub struct PendingTransport;

#[async_trait]
impl HttpTransport for PendingTransport {
    async fn send(&self, _: HttpRequest) -> Result<HttpResponse, TransportError> {
        std::future::pending().await
    }
}

/// Fails every request at the transport level
#[derive(Debug, Default)]
pub struct FailingTransport;

#[async_trait]
impl HttpTransport for FailingTransport {
    async fn send(&self, _: HttpRequest) -> Result<HttpResponse, TransportError> {
        Err(TransportError::new("connection refused"))
    }
}

/// A test clock that can be advanced after being handed to a client
#[derive(Clone, Debug, Default)]
pub struct SharedClock(Arc<AtomicU64>);

impl SharedClock {
    pub fn new(time: UnixTime) -> Self {
        Self(Arc::new(AtomicU64::new(time.0)))
    }

    pub fn inc(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for SharedClock {
    fn now(&self) -> UnixTime {
        UnixTime(self.0.load(Ordering::SeqCst))
    }
}
