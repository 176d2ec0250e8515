//! YouTube Videos API types, duration parsing, and the short filter.

use crate::youtube_api::types::PageInfo;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Response structure for the `videos.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<Video>,
    #[serde(default, rename = "pageInfo")]
    pub page_info: Option<PageInfo>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// A `video` resource represents a YouTube video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    pub id: String,
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
    #[serde(default, rename = "contentDetails")]
    pub content_details: Option<VideoContentDetails>,
}

/// Basic details about a video: title, description, publisher.
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoSnippet {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "channelId")]
    pub channel_id: Option<String>,
    #[serde(default, rename = "channelTitle")]
    pub channel_title: Option<String>,
    /// The date and time that the video was published, in ISO 8601 format.
    #[serde(rename = "publishedAt")]
    pub published_at: Timestamp,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Statistics about the video; the API serializes the counters as strings.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#statistics>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoStatistics {
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    #[serde(rename = "likeCount")]
    pub like_count: Option<String>,
    #[serde(rename = "commentCount")]
    pub comment_count: Option<String>,
}

/// The `contentDetails` part of a video resource.
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoContentDetails {
    /// The video length as an ISO 8601 duration, e.g. `PT1H30M45S`.
    pub duration: String,
}

/// Catalog entry produced by the aggregator; immutable once constructed and
/// kept in upstream listing order.
#[derive(Debug, Clone, Serialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub view_count: u64,
    pub published_at: Timestamp,
}

/// Detailed metadata for a single video.
#[derive(Debug, Clone, Serialize)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    /// Raw ISO 8601 duration as returned by the API.
    pub duration: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub published_at: Timestamp,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Parses a `PT`-prefixed ISO 8601 duration into total seconds.
///
/// Single left-to-right pass: consecutive digits form a magnitude, the
/// following unit letter (`H`, `M`, `S`) picks the multiplier, and each group
/// adds into the total. A missing marker, a digit run not followed by a unit
/// letter, or an empty remainder yield 0 rather than an error, so callers
/// cannot distinguish zero-length media from unparseable input here.
pub fn parse_duration(duration: &str) -> u64 {
    let Some(mut rest) = duration.strip_prefix("PT") else {
        return 0;
    };

    let mut total = 0u64;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 || digits >= rest.len() {
            break;
        }
        let value: u64 = rest[..digits].parse().unwrap_or(0);
        let mut chars = rest[digits..].chars();
        match chars.next() {
            Some('H') => total += value * 3600,
            Some('M') => total += value * 60,
            Some('S') => total += value,
            // Unsupported unit letters contribute nothing.
            _ => {}
        }
        rest = chars.as_str();
    }

    total
}

/// Strict inequality: a video exactly at the threshold is not short.
pub fn is_short(duration_seconds: u64, min_duration_seconds: u64) -> bool {
    duration_seconds < min_duration_seconds
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_duration_handles_the_restricted_grammar() {
        let cases = [
            ("PT30S", 30),
            ("PT5M", 300),
            ("PT2H", 7200),
            ("PT10M30S", 630),
            ("PT1H30M", 5400),
            ("PT1H30M45S", 5445),
            ("PT0S", 0),
            ("", 0),
            // missing PT marker
            ("1H30M", 0),
            // unsupported unit
            ("P1D", 0),
            ("PT1D", 0),
            // digit run not followed by a unit letter
            ("PT90", 0),
        ];
        for (input, want) in cases {
            assert_eq!(parse_duration(input), want, "parse_duration({input:?})");
        }
    }

    #[test]
    fn short_filter_uses_strict_inequality() {
        assert!(!is_short(60, 60));
        assert!(is_short(59, 60));
        assert!(is_short(0, 60));
        assert!(!is_short(120, 60));
    }
}
