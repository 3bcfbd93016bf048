//! Errors surfaced while building a client or requesting a token

use std::error::Error as StdError;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// A required configuration value is missing or unusable
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The application ID or application secret is empty
    #[error("app id or app secret is empty")]
    MissingCredentials,
    /// The token endpoint URL is empty
    #[error("auth url can't be empty")]
    MissingAuthUrl,
    /// The token endpoint URL could not be parsed
    #[error("auth url '{0}' is not a valid URL")]
    InvalidAuthUrl(String),
    /// A required environment variable is not set
    #[error("environment variable {0} is not set")]
    MissingEnvVar(&'static str),
}

/// The HTTP layer failed to deliver a request or read its response
#[derive(Debug, Error)]
#[error("error sending request to authority")]
pub struct TransportError {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl TransportError {
    /// Wraps an arbitrary error raised by a transport implementation
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err)
    }
}

/// An error while constructing an [`AuthClient`][crate::AuthClient]
#[derive(Debug, Error)]
pub enum NewClientError {
    /// The configuration was rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The HTTP transport could not be initialized
    #[error("failed to initialize http transport")]
    TransportInit(#[source] reqwest::Error),
}

/// An error while requesting a new token from the authority
#[derive(Debug, Error)]
pub enum TokenRequestError {
    /// The client's credentials are unusable
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The authority answered with a status other than `200 OK`
    #[error("auth token request returned status {status} with body: {body}")]
    AuthRequest {
        /// The response status
        status: StatusCode,
        /// The raw response body
        body: String,
    },
    /// The success body did not match the expected token shape
    #[error("error deserializing token body from authority")]
    Decode(#[from] serde_json::Error),
    /// The request could not be sent or its response could not be read
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The caller cancelled the request before a response arrived
    #[error("token request was cancelled")]
    Cancelled,
    /// The caller's deadline passed before a response arrived
    #[error("token request timed out")]
    Timeout,
}

/// The error fields of an OAuth2 error response
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderError {
    /// The OAuth2 error code, such as `invalid_client`
    #[serde(default)]
    pub error: String,
    /// A human readable description of the error
    #[serde(default)]
    pub error_description: String,
}

impl TokenRequestError {
    /// The HTTP status of a rejected token request
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::AuthRequest { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Parses the provider's error fields out of a rejected token request
    ///
    /// Returns `None` for other errors or when the body is not a JSON object.
    pub fn provider_error(&self) -> Option<ProviderError> {
        match self {
            Self::AuthRequest { body, .. } => serde_json::from_str(body).ok(),
            _ => None,
        }
    }
}
