//! Boundary to the Atlassian API: token refresh and Jira project lookup.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;

use crate::{error::AtlassianError, records::JiraProject};

/// Result of a token refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
}

#[async_trait]
pub trait AtlassianService: Send + Sync {
    /// Exchanges a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, AtlassianError>;

    /// Builds a client that authenticates with `access_token`.
    fn client(&self, access_token: &str) -> Box<dyn JiraClient>;
}

#[async_trait]
pub trait JiraClient: Send + Sync {
    async fn get_project(
        &self,
        cloud_id: &str,
        project_id: &str,
    ) -> Result<JiraProject, AtlassianError>;
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Reads the `exp` claim of a JWT without verifying its signature.
///
/// Returns `None` when the token is malformed or carries no expiry.
pub fn token_expiry(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice::<Claims>(&bytes).ok()?.exp
}

/// Whether `token` is still usable at `now` (seconds since the epoch).
pub fn is_token_fresh(token: &str, now: i64) -> bool {
    token_expiry(token).is_some_and(|exp| exp >= now)
}

#[cfg(test)]
pub(crate) fn encode_test_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"user","exp":{exp}}}"#));
    format!("{header}.{claims}.signature")
}
