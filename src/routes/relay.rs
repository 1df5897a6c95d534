use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{StreamCheck, UrlRequest};
use crate::services::relay::StreamPurpose;
use crate::AppState;

/// Query parameters for the stream relay
#[derive(Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub url: String,
}

/// Query parameters for downloads
#[derive(Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Guess content type from URL when the upstream does not send one
fn guess_content_type(url: &str) -> &'static str {
    let lower = url.to_lowercase();
    if lower.contains(".m3u8") {
        "application/vnd.apple.mpegurl"
    } else if lower.contains(".mp4") {
        "video/mp4"
    } else if lower.contains(".mkv") {
        "video/x-matroska"
    } else {
        "video/MP2T"
    }
}

/// Derive a download filename from the caller hint or the URL path
fn derive_filename(url: &str, hint: Option<&str>) -> String {
    if let Some(name) = hint {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }

    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.last().map(|s| s.to_string()))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "download".to_string())
}

/// GET /relay/stream?url=<encoded>
/// Pipes the upstream body to the caller as it arrives, without buffering.
/// Purpose: bypass CORS and ensure a usable Content-Type for players.
pub async fn relay_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, ApiError> {
    let upstream = state
        .relay
        .open_stream(&query.url, StreamPurpose::Live)
        .await?;

    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| guess_content_type(&query.url).to_string());

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        content_type
            .parse()
            .unwrap_or_else(|_| "video/MP2T".parse().unwrap()),
    );
    response_headers.insert(header::CACHE_CONTROL, "no-store".parse().unwrap());
    response_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".parse().unwrap());
    response_headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        "Content-Length, Content-Type".parse().unwrap(),
    );

    // Dropping the stream on client disconnect tears down the upstream
    // connection; backpressure propagates through the body channel
    let body = Body::from_stream(upstream.bytes_stream());

    let mut response = Response::builder().status(StatusCode::OK);
    for (key, value) in response_headers.iter() {
        response = response.header(key, value);
    }

    response
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {e}")))
}

/// GET /download?url=<encoded>&filename=<optional>
/// Streams the remote file with an attachment disposition.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let upstream = state
        .relay
        .open_stream(&query.url, StreamPurpose::Download)
        .await?;

    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let content_length = upstream
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let filename = derive_filename(&query.url, query.filename.as_deref());
    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        content_type
            .parse()
            .unwrap_or_else(|_| "application/octet-stream".parse().unwrap()),
    );
    response_headers.insert(
        header::CONTENT_DISPOSITION,
        disposition
            .parse()
            .unwrap_or_else(|_| "attachment".parse().unwrap()),
    );
    response_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".parse().unwrap());
    if let Some(len) = content_length {
        if let Ok(parsed) = len.parse() {
            response_headers.insert(header::CONTENT_LENGTH, parsed);
        }
    }

    let body = Body::from_stream(upstream.bytes_stream());

    let mut response = Response::builder().status(StatusCode::OK);
    for (key, value) in response_headers.iter() {
        response = response.header(key, value);
    }

    response
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {e}")))
}

/// POST /epg/fetch - fetch an EPG document, fully buffered, content-type
/// forced to XML regardless of what the upstream sent
pub async fn fetch_epg(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UrlRequest>,
) -> Result<Response, ApiError> {
    let body = state.relay.fetch_epg(&payload.url).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/xml"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        body,
    )
        .into_response())
}

/// POST /stream/check - liveness probe; failure is encoded in the body,
/// never as an error status
pub async fn check_stream(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UrlRequest>,
) -> Json<StreamCheck> {
    Json(state.relay.check_stream(&payload.url).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(
            guess_content_type("http://host/live/index.m3u8"),
            "application/vnd.apple.mpegurl"
        );
        assert_eq!(guess_content_type("http://host/movie.MP4"), "video/mp4");
        assert_eq!(guess_content_type("http://host/stream/123"), "video/MP2T");
    }

    #[test]
    fn test_derive_filename() {
        assert_eq!(
            derive_filename("http://host/files/show.mkv", None),
            "show.mkv"
        );
        assert_eq!(
            derive_filename("http://host/files/show.mkv", Some("mine.mkv")),
            "mine.mkv"
        );
        assert_eq!(derive_filename("http://host/files/show.mkv", Some("  ")), "show.mkv");
        assert_eq!(derive_filename("http://host/", None), "download");
        assert_eq!(derive_filename("not a url", None), "download");
    }
}
