//! YouTube Captions API types.

use serde::{Deserialize, Serialize};

/// Response structure for the `captions.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/captions/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptionListResponse {
    #[serde(default)]
    pub items: Vec<Caption>,
}

/// A `caption` resource represents one caption track of a video.
///
/// See: <https://developers.google.com/youtube/v3/docs/captions#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Caption {
    /// The ID that YouTube uses to uniquely identify the caption track.
    pub id: String,
    pub snippet: CaptionSnippet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptionSnippet {
    /// The language of the caption track; may be empty for auto-generated
    /// tracks.
    #[serde(default)]
    pub language: String,
    /// `standard` or `ASR` (auto-generated).
    #[serde(default, rename = "trackKind")]
    pub track_kind: Option<String>,
}
