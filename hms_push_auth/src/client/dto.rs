//! Wire shapes exchanged with the authentication endpoint

use hms_push_clock::DurationSecs;
use serde::Deserialize;

use crate::AccessToken;

/// The grant requested from the authority
pub(super) const GRANT_TYPE: &str = "client_credentials";

/// Renders the form body of a client-credentials request
///
/// Values are inserted as-is; the caller is responsible for providing
/// credentials that are already safe to place in a form body.
pub(super) fn client_credentials_body(client_id: &str, client_secret: &str) -> String {
    format!(
        "grant_type={}&client_secret={}&client_id={}",
        GRANT_TYPE, client_secret, client_id
    )
}

/// A successful token response
///
/// Error responses are described by [`ProviderError`][crate::ProviderError].
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: AccessToken,
    pub expires_in: DurationSecs,
    #[serde(default)]
    pub scope: String,
}
