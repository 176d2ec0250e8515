//! Transcript download against local fakes of the video and caption
//! endpoints.

mod common;

use hyper::Request;
use hyper::body::Incoming;
use jiff::{SignedDuration, Timestamp};
use pretty_assertions::assert_eq;
use ytt::config::OAuthConfig;
use ytt::oauth::OAuthManager;
use ytt::token_store::StoredToken;
use ytt::transcript::download_transcript;
use ytt::{Error, YouTubeClient};

fn test_client(addr: std::net::SocketAddr) -> YouTubeClient {
    let token = StoredToken {
        access_token: "test-access".to_string(),
        refresh_token: "test-refresh".to_string(),
        token_type: "Bearer".to_string(),
        expiry: Timestamp::now() + SignedDuration::from_secs(3600),
    };
    let manager = OAuthManager::new(OAuthConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        auth_uri: format!("http://{addr}/auth"),
        token_uri: format!("http://{addr}/token"),
    });
    YouTubeClient::new(token, manager).with_api_base(format!("http://{addr}"))
}

const VIDEO_JSON: &str = r#"{
    "items": [{
        "id": "v1",
        "snippet": {"title": "My Video: Part 1/2", "publishedAt": "2024-03-01T12:00:00Z"},
        "contentDetails": {"duration": "PT10M"}
    }]
}"#;

const CAPTIONS_JSON: &str = r#"{
    "items": [
        {"id": "cap-de", "snippet": {"language": "de", "trackKind": "standard"}},
        {"id": "cap-en", "snippet": {"language": "en", "trackKind": "ASR"}}
    ]
}"#;

#[tokio::test]
async fn downloads_the_english_track_under_a_sanitized_name() {
    let addr = common::spawn_http(|req: Request<Incoming>| async move {
        match req.uri().path() {
            "/videos" => common::json_response(VIDEO_JSON),
            "/captions" => common::json_response(CAPTIONS_JSON),
            "/captions/cap-en" => common::json_response("one line of transcript"),
            other => common::status_response(404, format!(r#"{{"error":"no route {other}"}}"#)),
        }
    })
    .await;

    let dir = common::scratch_dir("transcript");
    let path = download_transcript(&test_client(addr), "v1", &dir)
        .await
        .expect("download transcript");

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "v1-My Video_ Part 1_2.txt"
    );
    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(contents, "one line of transcript");

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn missing_captions_are_not_found() {
    let addr = common::spawn_http(|req: Request<Incoming>| async move {
        match req.uri().path() {
            "/videos" => common::json_response(VIDEO_JSON),
            "/captions" => common::json_response(r#"{"items": []}"#),
            _ => common::status_response(404, "{}"),
        }
    })
    .await;

    let dir = common::scratch_dir("no-captions");
    let err = download_transcript(&test_client(addr), "v1", &dir)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
}
