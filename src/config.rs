//! OAuth client-secrets file handling.
//!
//! The secrets file follows Google's client-secrets layout: a single JSON
//! object keyed by the application type (`installed` for desktop tools, `web`
//! for server-side apps) whose value carries the client id and secret plus
//! the endpoint URLs.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// OAuth application credentials and endpoints, as read from the
/// client-secrets file.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Authorization endpoint shown to the user for consent.
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    /// Token endpoint used for both the code exchange and silent refresh.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: Option<OAuthConfig>,
    web: Option<OAuthConfig>,
}

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://www.googleapis.com/oauth2/v3/token".to_string()
}

/// Loads the client-secrets file, accepting either an `installed` or a `web`
/// application entry.
pub async fn load(path: &Path) -> Result<OAuthConfig> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| Error::io(format!("unable to read client secret file {}", path.display()), e))?;
    let secrets: ClientSecrets = serde_json::from_slice(&raw).map_err(|e| {
        Error::format(
            format!("unable to parse client secret file {}", path.display()),
            e,
        )
    })?;
    secrets.installed.or(secrets.web).ok_or_else(|| {
        Error::format(
            format!("unable to parse client secret file {}", path.display()),
            "expected an \"installed\" or \"web\" application entry",
        )
    })
}
