//! YouTube Channels API types.

use crate::youtube_api::types::PageInfo;
use serde::{Deserialize, Serialize};

/// Response structure for the `channels.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelListResponse {
    /// A list of channels that match the request criteria.
    ///
    /// The API omits this field entirely when nothing matched.
    #[serde(default)]
    pub items: Vec<Channel>,
    #[serde(default, rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
}

/// A `channel` resource contains information about a YouTube channel.
///
/// Only the parts this tool requests are modeled: the id, the related
/// playlists (for the uploads collection), and the channel statistics.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Channel {
    /// The ID that YouTube uses to uniquely identify the channel.
    pub id: String,
    #[serde(default, rename = "contentDetails")]
    pub content_details: Option<ChannelContentDetails>,
    #[serde(default)]
    pub statistics: Option<ChannelStatistics>,
}

/// The `contentDetails` part of a channel resource.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelContentDetails {
    #[serde(rename = "relatedPlaylists")]
    pub related_playlists: RelatedPlaylists,
}

/// Playlists associated with a channel; `uploads` aggregates everything the
/// channel has published.
#[derive(Debug, Serialize, Deserialize)]
pub struct RelatedPlaylists {
    pub uploads: String,
}

/// Channel statistics; the API serializes the counters as strings.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelStatistics {
    #[serde(rename = "videoCount")]
    pub video_count: Option<String>,
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
}
