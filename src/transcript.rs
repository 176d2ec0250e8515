//! Transcript download and output naming.

use crate::error::{Error, Result};
use crate::youtube_api::YouTubeClient;
use std::path::{Path, PathBuf};

/// Longest filename stem we will produce, in characters.
const MAX_FILENAME_LEN: usize = 100;

/// Downloads a caption track for `video_id` into `output_dir`, returning the
/// path written.
///
/// Prefers the first English or unlabeled track; falls back to whatever track
/// comes first. The file is named `<video_id>-<sanitized title>.txt`.
pub async fn download_transcript(
    client: &YouTubeClient,
    video_id: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let details = client.get_video_details(video_id).await?;
    let sanitized_title = sanitize_filename(&details.title);

    let captions = client.list_captions(video_id).await?;
    if captions.is_empty() {
        return Err(Error::NotFound(format!(
            "no captions found for video {video_id}"
        )));
    }
    let caption = captions
        .iter()
        .find(|c| c.snippet.language == "en" || c.snippet.language.is_empty())
        .unwrap_or(&captions[0]);

    let transcript = client.download_caption(&caption.id).await?;

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| Error::io("error creating output directory", e))?;
    let output_path = output_dir.join(format!("{video_id}-{sanitized_title}.txt"));
    tracing::info!(
        title = details.title,
        path = %output_path.display(),
        "saving transcript"
    );
    tokio::fs::write(&output_path, transcript)
        .await
        .map_err(|e| Error::io("error writing transcript", e))?;

    Ok(output_path)
}

/// Replaces characters that are invalid in filenames, caps the length, and
/// trims leading/trailing spaces and periods. Idempotent.
pub fn sanitize_filename(filename: &str) -> String {
    let mut sanitized: String = filename
        .chars()
        .map(|c| {
            if matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.chars().count() > MAX_FILENAME_LEN {
        sanitized = sanitized.chars().take(MAX_FILENAME_LEN).collect();
    }

    sanitized.trim_matches(|c| c == ' ' || c == '.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitize_filename_replaces_and_trims() {
        let cases = [
            ("hello world", "hello world"),
            ("file<>:\"/\\|?*name", "file_________name"),
            ("  filename", "filename"),
            ("filename  ", "filename"),
            ("..filename", "filename"),
            ("filename..", "filename"),
            ("...", ""),
            ("My Video: Part 1/2 | Q&A?", "My Video_ Part 1_2 _ Q&A_"),
        ];
        for (input, want) in cases {
            assert_eq!(sanitize_filename(input), want, "sanitize_filename({input:?})");
        }
    }

    #[test]
    fn sanitize_filename_truncates_long_names() {
        let long = "a".repeat(152);
        assert_eq!(sanitize_filename(&long), "a".repeat(MAX_FILENAME_LEN));
    }

    #[test]
    fn sanitize_filename_is_idempotent_and_bounded() {
        let inputs = [
            "  weird/name. ".to_string(),
            "...".to_string(),
            "a:b".repeat(80),
            "日本語/テスト?キャプション  ".to_string(),
            " .mixed<chars>everywhere*. ".to_string(),
        ];
        for input in &inputs {
            let once = sanitize_filename(input);
            let twice = sanitize_filename(&once);
            assert_eq!(once, twice, "sanitize_filename({input:?}) is not idempotent");
            assert!(once.chars().count() <= MAX_FILENAME_LEN);
            assert!(!once.starts_with([' ', '.']) && !once.ends_with([' ', '.']));
            assert!(!once.contains(['<', '>', ':', '"', '/', '\\', '|', '?', '*']));
        }
    }
}
