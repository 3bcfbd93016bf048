//! A minimal HTTP request/response primitive
//!
//! The transport knows nothing about authentication. It sends one request
//! and hands back the status and the raw body. [`ReqwestTransport`] is the
//! default implementation; tests and embedders can provide their own
//! [`HttpTransport`].

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{
    header::{HeaderName, HeaderValue},
    Method, StatusCode, Url,
};

use crate::TransportError;

/// An outbound HTTP request
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The request method
    pub method: Method,
    /// The target URL
    pub url: Url,
    /// The raw request body
    pub body: Bytes,
    /// Headers to send, in order
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl HttpRequest {
    /// Constructs a request with an empty body and no headers
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            body: Bytes::new(),
            headers: Vec::new(),
        }
    }

    /// Constructs a `POST` request
    pub fn post(url: Url) -> Self {
        Self::new(Method::POST, url)
    }

    /// Appends a header
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Replaces the request body
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

/// The status and raw body of an HTTP response
#[derive(Clone, Debug)]
pub struct HttpResponse {
    /// The response status
    pub status: StatusCode,
    /// The raw response body
    pub body: Bytes,
}

/// Executes single HTTP requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and waits for the complete response body
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for std::sync::Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// An [`HttpTransport`] backed by a [`reqwest::Client`]
///
/// Clones share the same connection pool.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Constructs a new transport with its own connection pool
    ///
    /// Requests carry only the headers they were built with. Fails if the
    /// underlying TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self { client })
    }

    /// Uses an existing client
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .body(request.body);

        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        Ok(HttpResponse { status, body })
    }
}
