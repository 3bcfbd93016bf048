//! Provider configuration

use std::env;

use serde::Deserialize;

use crate::{AppId, AppSecret, ConfigError};

/// The public HMS OAuth2 token endpoint
pub const DEFAULT_AUTH_URL: &str = "https://oauth-login.cloud.huawei.com/oauth2/v3/token";

/// Environment variable holding the application ID
pub const APP_ID_ENV: &str = "HMS_APP_ID";

/// Environment variable holding the application secret
pub const APP_SECRET_ENV: &str = "HMS_APP_SECRET";

/// Environment variable holding the token endpoint URL
pub const AUTH_URL_ENV: &str = "HMS_AUTH_URL";

/// Credentials and endpoint used to request access tokens
///
/// Values are not validated until an [`AuthClient`][crate::AuthClient] is
/// constructed from them.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// The application ID
    pub app_id: AppId,

    /// The application secret
    pub app_secret: AppSecret,

    /// The token endpoint
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_owned()
}

impl Config {
    /// Constructs a configuration from explicit values
    pub fn new(
        app_id: impl Into<AppId>,
        app_secret: impl Into<AppSecret>,
        auth_url: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            auth_url: auth_url.into(),
        }
    }

    /// Reads the configuration from the process environment
    ///
    /// `HMS_APP_ID` and `HMS_APP_SECRET` are required. `HMS_AUTH_URL` falls
    /// back to [`DEFAULT_AUTH_URL`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::MissingEnvVar(key));

        Ok(Self {
            app_id: AppId::new(required(APP_ID_ENV)?),
            app_secret: AppSecret::new(required(APP_SECRET_ENV)?),
            auth_url: lookup(AUTH_URL_ENV).unwrap_or_else(default_auth_url),
        })
    }
}
