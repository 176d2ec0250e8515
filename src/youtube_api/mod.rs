//! YouTube Data API v3 client library.
//!
//! Wire types for the handful of endpoints this tool touches, plus the
//! authorized [`client::YouTubeClient`] that paginates a channel's uploads,
//! batch-fetches video details, and filters out shorts.

pub mod captions;
pub mod channels;
pub mod client;
pub mod playlists;
pub mod types;
pub mod videos;

pub use client::YouTubeClient;
pub use videos::{VideoDetails, VideoSummary, is_short, parse_duration};
