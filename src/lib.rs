//! YouTube channel catalog and transcript fetcher.
//!
//! The crate splits into the credential lifecycle (client-secrets
//! [`config`], the persisted [`token_store`] record, and the interactive
//! [`oauth`] flow with its one-shot redirect listener) and the API surface
//! ([`youtube_api`] for the catalog aggregation and [`transcript`] for
//! caption downloads). [`obtain_authorized_client`] ties the credential side
//! together and is the entry point the binary uses.

use std::ops::AsyncFnMut;
use std::path::Path;

pub mod config;
pub mod error;
pub mod oauth;
pub mod token_store;
pub mod transcript;
pub mod youtube_api;

pub use error::{Error, Result};
pub use oauth::OAuthManager;
pub use token_store::StoredToken;
pub use youtube_api::{VideoDetails, VideoSummary, YouTubeClient};

/// Produces an authorized API client from the client-secrets file and the
/// cached token file.
///
/// `consent_prompt` receives the consent URL whenever the interactive flow
/// is required; the binary prints it and opens a browser.
pub async fn obtain_authorized_client<F>(
    oauth_path: &Path,
    token_path: &Path,
    consent_prompt: &mut F,
) -> Result<YouTubeClient>
where
    F: AsyncFnMut(&str),
{
    let config = config::load(oauth_path).await?;
    obtain_authorized_client_with(OAuthManager::new(config), token_path, consent_prompt).await
}

/// [`obtain_authorized_client`] with a caller-supplied [`OAuthManager`]
/// (tests use this to point the flow at local endpoints).
///
/// The decision ladder:
///
/// 1. Load the stored token; when that fails, run the full authorization
///    flow and persist its result.
/// 2. When the stored token's expiry is not in the future, attempt a silent
///    refresh.
/// 3. When the refresh fails, fall back to the full flow (discarding the
///    expired token) and persist.
/// 4. When the refresh succeeds with a changed access token, persist the
///    update; when the access token is unchanged, skip the write.
/// 5. Return a client bound to the now-valid token.
pub async fn obtain_authorized_client_with<F>(
    oauth: OAuthManager,
    token_path: &Path,
    consent_prompt: &mut F,
) -> Result<YouTubeClient>
where
    F: AsyncFnMut(&str),
{
    let token = match token_store::load(token_path).await {
        Ok(stored) if !stored.is_expired() => stored,
        Ok(stored) => match oauth.refresh(&stored).await {
            Ok(Some(refreshed)) => {
                if refreshed.access_token != stored.access_token {
                    token_store::save(token_path, &refreshed).await?;
                } else {
                    tracing::debug!("refresh returned an unchanged access token, skipping write");
                }
                refreshed
            }
            Ok(None) => {
                tracing::warn!("token refresh rejected, re-authenticating");
                reauthorize(&oauth, token_path, consent_prompt).await?
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, re-authenticating");
                reauthorize(&oauth, token_path, consent_prompt).await?
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, "no usable stored token, starting authorization flow");
            reauthorize(&oauth, token_path, consent_prompt).await?
        }
    };

    Ok(YouTubeClient::new(token, oauth))
}

async fn reauthorize<F>(
    oauth: &OAuthManager,
    token_path: &Path,
    consent_prompt: &mut F,
) -> Result<StoredToken>
where
    F: AsyncFnMut(&str),
{
    let token = oauth.authenticate(consent_prompt).await?;
    token_store::save(token_path, &token).await?;
    Ok(token)
}
