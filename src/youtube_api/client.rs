//! Authorized YouTube Data API v3 client.

use crate::error::{Error, Result};
use crate::oauth::OAuthManager;
use crate::token_store::StoredToken;
use crate::youtube_api::captions::{Caption, CaptionListResponse};
use crate::youtube_api::channels::ChannelListResponse;
use crate::youtube_api::playlists::PlaylistItemListResponse;
use crate::youtube_api::videos::{
    VideoDetails, VideoListResponse, VideoSummary, is_short, parse_duration,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::instrument;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Refresh ahead of the stored expiry to prevent edge-case failures on
/// requests issued moments before it.
const TOKEN_FRESHNESS_BUFFER: Duration = Duration::from_secs(300);

/// Maximum page size the listing endpoints allow.
const PAGE_SIZE: u32 = 50;

/// Client for interacting with the YouTube Data API v3.
///
/// The client holds the OAuth token behind a mutex and silently refreshes it
/// before API calls when it is about to expire, so a long catalog walk keeps
/// working across the access token's lifetime. Mid-flight refreshes are kept
/// in memory only; persisting the record is the caller's concern.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    token: Arc<Mutex<StoredToken>>,
    oauth: Arc<OAuthManager>,
    http: reqwest::Client,
    api_base: String,
}

impl YouTubeClient {
    /// Creates a client bound to `token`, with `oauth` available for
    /// in-flight refreshes.
    pub fn new(token: StoredToken, oauth: OAuthManager) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            oauth: Arc::new(oauth),
            http: reqwest::Client::new(),
            api_base: API_BASE.to_string(),
        }
    }

    /// Points the client at a different API base URL (tests use a local
    /// fake endpoint).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Returns a snapshot of the current token record.
    pub async fn token(&self) -> StoredToken {
        self.token.lock().await.clone()
    }

    /// Gets a guaranteed-fresh access token, silently refreshing when the
    /// stored one is within the safety buffer of its expiry.
    async fn fresh_access_token(&self) -> Result<String> {
        let mut token = self.token.lock().await;
        if token.expires_within(TOKEN_FRESHNESS_BUFFER) {
            tracing::debug!("access token expired, attempting refresh");
            match self.oauth.refresh(&token).await? {
                Some(refreshed) => {
                    *token = refreshed;
                    tracing::debug!("access token successfully refreshed");
                }
                None => {
                    tracing::error!("access token refresh failed, client is unusable");
                    return Err(Error::Auth(
                        "unable to refresh expired access token".to_string(),
                    ));
                }
            }
        }
        Ok(token.access_token.clone())
    }

    /// Makes an authenticated GET request to the given API path.
    ///
    /// Consolidates the shared logic across all API calls: token freshness,
    /// the Authorization header, query parameters, and status validation.
    async fn make_authenticated_request(
        &self,
        path: &str,
        query_params: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let access_token = self.fresh_access_token().await?;
        let url = format!("{}/{path}", self.api_base);

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {access_token}"))
            .query(query_params)
            .send()
            .await
            .map_err(|e| Error::remote(format!("send GET request to YouTube API: {url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::remote(
                format!("YouTube API request to {path} failed with status {status}"),
                error_text,
            ));
        }

        Ok(response)
    }

    /// Resolves the authenticated user's own channel id via `channels.list`
    /// with `mine=true`.
    pub async fn my_channel_id(&self) -> Result<String> {
        let response = self
            .make_authenticated_request("channels", &[("part", "id,statistics"), ("mine", "true")])
            .await?;
        let channels: ChannelListResponse = response
            .json()
            .await
            .map_err(|e| Error::remote("parse YouTube channels API response as JSON", e))?;

        let Some(channel) = channels.items.into_iter().next() else {
            return Err(Error::NotFound(
                "no channel found for authenticated user".to_string(),
            ));
        };
        if let Some(stats) = &channel.statistics {
            tracing::debug!(
                videos = stats.video_count.as_deref().unwrap_or("?"),
                subscribers = stats.subscriber_count.as_deref().unwrap_or("?"),
                "authenticated user's channel statistics"
            );
        }
        Ok(channel.id)
    }

    /// Resolves the channel's canonical uploads playlist id.
    pub async fn uploads_playlist_id(&self, channel_id: &str) -> Result<String> {
        let response = self
            .make_authenticated_request("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;
        let channels: ChannelListResponse = response
            .json()
            .await
            .map_err(|e| Error::remote("parse YouTube channels API response as JSON", e))?;

        channels
            .items
            .into_iter()
            .next()
            .and_then(|channel| channel.content_details)
            .map(|details| details.related_playlists.uploads)
            .ok_or_else(|| Error::NotFound(format!("channel {channel_id} not found")))
    }

    /// Builds the filtered catalog of a channel's uploads.
    ///
    /// Walks the uploads playlist one page at a time, batch-fetches the full
    /// details of each page's videos in a single `videos.list` call, and
    /// drops entries shorter than `min_duration_seconds`. Without a channel
    /// id, the authenticated user's own channel is used.
    ///
    /// Pagination is strictly sequential and any page or batch failure aborts
    /// the whole operation; there is no partial-success mode.
    #[instrument(skip(self))]
    pub async fn list_videos(
        &self,
        channel_id: Option<&str>,
        min_duration_seconds: u64,
    ) -> Result<Vec<VideoSummary>> {
        let channel_id = match channel_id {
            Some(id) => id.to_owned(),
            None => self.my_channel_id().await?,
        };
        tracing::debug!(channel_id, "resolving uploads playlist");

        let playlist_id = self.uploads_playlist_id(&channel_id).await?;
        tracing::debug!(playlist_id, "walking uploads playlist");

        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .playlist_items_page(&playlist_id, page_token.as_deref())
                .await?;
            tracing::debug!(items = page.items.len(), "fetched one page of playlist items");

            let video_ids: Vec<String> = page
                .items
                .iter()
                .map(|item| item.snippet.resource_id.video_id.clone())
                .collect();

            if !video_ids.is_empty() {
                let details = self.videos_by_id(&video_ids).await?;
                for video in details.items {
                    let duration = video
                        .content_details
                        .as_ref()
                        .map(|details| details.duration.as_str())
                        .unwrap_or("");
                    let seconds = parse_duration(duration);
                    tracing::debug!(
                        video_id = video.id,
                        duration,
                        seconds,
                        min_duration_seconds,
                        short = is_short(seconds, min_duration_seconds),
                        "applying short filter"
                    );
                    if is_short(seconds, min_duration_seconds) {
                        continue;
                    }
                    videos.push(VideoSummary {
                        video_id: video.id,
                        title: video.snippet.title,
                        view_count: parse_count(
                            video.statistics.as_ref().and_then(|s| s.view_count.as_deref()),
                        ),
                        published_at: video.snippet.published_at,
                    });
                }
            }

            page_token = page.next_page_token.filter(|token| !token.is_empty());
            if page_token.is_none() {
                break;
            }
        }

        tracing::debug!(count = videos.len(), "returning videos after filtering");
        Ok(videos)
    }

    /// Retrieves detailed metadata for a single video.
    pub async fn get_video_details(&self, video_id: &str) -> Result<VideoDetails> {
        let response = self.videos_by_id(&[video_id.to_owned()]).await?;
        let Some(video) = response.items.into_iter().next() else {
            return Err(Error::NotFound(format!("video {video_id} not found")));
        };

        let stats = video.statistics.as_ref();
        Ok(VideoDetails {
            video_id: video.id,
            title: video.snippet.title,
            description: video.snippet.description.unwrap_or_default(),
            channel_id: video.snippet.channel_id.unwrap_or_default(),
            channel_title: video.snippet.channel_title.unwrap_or_default(),
            duration: video
                .content_details
                .map(|details| details.duration)
                .unwrap_or_default(),
            view_count: parse_count(stats.and_then(|s| s.view_count.as_deref())),
            like_count: parse_count(stats.and_then(|s| s.like_count.as_deref())),
            comment_count: parse_count(stats.and_then(|s| s.comment_count.as_deref())),
            published_at: video.snippet.published_at,
            tags: video.snippet.tags,
        })
    }

    /// Lists the caption tracks available for a video.
    pub async fn list_captions(&self, video_id: &str) -> Result<Vec<Caption>> {
        let response = self
            .make_authenticated_request("captions", &[("part", "snippet"), ("videoId", video_id)])
            .await?;
        let captions: CaptionListResponse = response
            .json()
            .await
            .map_err(|e| Error::remote("parse YouTube captions API response as JSON", e))?;
        Ok(captions.items)
    }

    /// Downloads the body of one caption track.
    pub async fn download_caption(&self, caption_id: &str) -> Result<String> {
        let path = format!("captions/{caption_id}");
        let response = self.make_authenticated_request(&path, &[]).await?;
        response
            .text()
            .await
            .map_err(|e| Error::remote("read caption track body", e))
    }

    /// Fetches one page of the uploads playlist.
    async fn playlist_items_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse> {
        let max_results = PAGE_SIZE.to_string();
        let mut query_params = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query_params.push(("pageToken", token));
        }

        let response = self
            .make_authenticated_request("playlistItems", &query_params)
            .await?;
        response
            .json()
            .await
            .map_err(|e| Error::remote("parse YouTube playlistItems API response as JSON", e))
    }

    /// Fetches full details for the given videos in one combined call, the
    /// ids comma-joined, bounding the request count per page.
    async fn videos_by_id(&self, video_ids: &[String]) -> Result<VideoListResponse> {
        tracing::debug!(?video_ids, "batch-fetching video details");
        let ids = video_ids.join(",");
        let response = self
            .make_authenticated_request(
                "videos",
                &[("part", "snippet,statistics,contentDetails"), ("id", ids.as_str())],
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| Error::remote("parse YouTube videos API response as JSON", e))
    }
}

/// The API serializes counters as strings; absent or malformed counters read
/// as zero.
fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(0)
}
