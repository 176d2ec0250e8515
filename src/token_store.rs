//! Persistence for the OAuth token record.
//!
//! The token file holds a single JSON object with the access/refresh token
//! pair, the token type, and an absolute expiry timestamp. It is created on
//! first successful authorization, overwritten on every refresh, and never
//! deleted here. Writes are not atomic; this tool assumes a single process
//! per token file.

use crate::error::{Error, Result};
use jiff::{SignedDuration, Timestamp};
use oauth2::TokenResponse;
use oauth2::basic::{BasicTokenResponse, BasicTokenType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Assumed lifetime when the token endpoint omits `expires_in`.
const FALLBACK_TOKEN_LIFETIME: SignedDuration = SignedDuration::from_secs(3300);

/// The persisted token record.
///
/// Invariant: a token used to authorize a request has `expiry` strictly in
/// the future at time of use, or was refreshed immediately beforehand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    /// Long-lived refresh token; empty when the endpoint never issued one.
    #[serde(default)]
    pub refresh_token: String,
    pub token_type: String,
    /// Absolute expiry of the access token.
    pub expiry: Timestamp,
}

impl StoredToken {
    /// Builds a record from a token endpoint response, converting the
    /// relative `expires_in` into an absolute expiry.
    ///
    /// Refresh responses commonly omit the refresh token; `prior_refresh_token`
    /// is carried over in that case so the record never loses it.
    pub(crate) fn from_token_response(
        token: &BasicTokenResponse,
        prior_refresh_token: Option<&str>,
    ) -> Self {
        let refresh_token = token
            .refresh_token()
            .map(|t| t.secret().clone())
            .or_else(|| prior_refresh_token.map(str::to_owned))
            .unwrap_or_default();
        let token_type = match token.token_type() {
            BasicTokenType::Bearer => "Bearer".to_string(),
            BasicTokenType::Mac => "MAC".to_string(),
            BasicTokenType::Extension(other) => other.clone(),
        };
        let lifetime = token
            .expires_in()
            .map(|ttl| SignedDuration::from_secs(ttl.as_secs() as i64))
            .unwrap_or(FALLBACK_TOKEN_LIFETIME);
        Self {
            access_token: token.access_token().secret().clone(),
            refresh_token,
            token_type,
            expiry: Timestamp::now() + lifetime,
        }
    }

    /// True when the expiry is not in the future.
    pub fn is_expired(&self) -> bool {
        self.expiry <= Timestamp::now()
    }

    /// True when the token expires within the given window.
    pub(crate) fn expires_within(&self, window: Duration) -> bool {
        self.expiry <= Timestamp::now() + SignedDuration::from_secs(window.as_secs() as i64)
    }
}

/// Reads and deserializes the token record at `path`.
pub async fn load(path: &Path) -> Result<StoredToken> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| Error::io(format!("unable to read token file {}", path.display()), e))?;
    serde_json::from_slice(&raw)
        .map_err(|e| Error::format(format!("unable to parse token file {}", path.display()), e))
}

/// Writes the full token record to `path`, creating the parent directory
/// with owner-only access when missing and restricting the file to
/// owner-read/write. Overwrites any prior content.
pub async fn save(path: &Path, token: &StoredToken) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if tokio::fs::metadata(dir).await.is_err() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::io("unable to create token directory", e))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))
                    .await
                    .map_err(|e| Error::io("unable to restrict token directory", e))?;
            }
        }
    }

    tracing::info!(path = %path.display(), "saving credential file");
    let json = serde_json::to_vec(token).expect("token record always serializes");
    tokio::fs::write(path, &json)
        .await
        .map_err(|e| Error::io(format!("unable to cache oauth token at {}", path.display()), e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| Error::io("unable to restrict token file", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_token(expiry: Timestamp) -> StoredToken {
        StoredToken {
            access_token: "access-123".to_string(),
            refresh_token: "refresh-456".to_string(),
            token_type: "Bearer".to_string(),
            expiry,
        }
    }

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ytt-store-{name}-{}", std::process::id()))
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("token.json");
        let token = sample_token(Timestamp::now() + SignedDuration::from_secs(3600));

        save(&path, &token).await.unwrap();
        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded.access_token, token.access_token);
        assert_eq!(loaded.refresh_token, token.refresh_token);
        assert_eq!(loaded.token_type, token.token_type);
        assert_eq!(loaded.expiry, token.expiry);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn save_restricts_modes_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = scratch_dir("modes");
        let path = dir.join("token.json");
        save(
            &path,
            &sample_token(Timestamp::now() + SignedDuration::from_secs(60)),
        )
        .await
        .unwrap();

        let file_mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode();
        let dir_mode = tokio::fs::metadata(&dir).await.unwrap().permissions().mode();
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(dir_mode & 0o777, 0o700);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = load(Path::new("/nonexistent/token.json")).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[tokio::test]
    async fn garbage_content_is_a_format_error() {
        let dir = scratch_dir("garbage");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("token.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let err = load(&path).await.unwrap_err();
        assert!(matches!(err, Error::Format { .. }));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn expiry_in_the_past_reads_as_expired() {
        let expired = sample_token(Timestamp::now() - SignedDuration::from_secs(1));
        assert!(expired.is_expired());
        let fresh = sample_token(Timestamp::now() + SignedDuration::from_secs(3600));
        assert!(!fresh.is_expired());
        assert!(fresh.expires_within(Duration::from_secs(7200)));
    }
}
