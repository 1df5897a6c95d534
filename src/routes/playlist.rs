use axum::{
    extract::{Multipart, State},
    Json,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{ChannelsResponse, TextRequest, UrlRequest};
use crate::services::playlist::parse_playlist;
use crate::AppState;

/// POST /playlist/fetch - fetch a remote playlist document and parse it
pub async fn fetch_playlist(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UrlRequest>,
) -> Result<Json<ChannelsResponse>, ApiError> {
    let channels = state.relay.fetch_playlist(&payload.url).await?;
    tracing::info!("Parsed {} channels from remote playlist", channels.len());
    Ok(Json(ChannelsResponse::new(channels)))
}

/// POST /playlist/upload - parse an uploaded playlist file (multipart)
pub async fn upload_playlist(
    State(_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ChannelsResponse>, ApiError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
        .ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;

    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;

    // Playlists are text; tolerate stray non-UTF-8 bytes instead of rejecting
    let document = String::from_utf8_lossy(&bytes);
    let channels = parse_playlist(&document);
    tracing::info!(
        "Parsed {} channels from uploaded playlist ({} bytes)",
        channels.len(),
        bytes.len()
    );
    Ok(Json(ChannelsResponse::new(channels)))
}

/// POST /playlist/text - parse an inline playlist document
pub async fn text_playlist(
    State(_state): State<Arc<AppState>>,
    Json(payload): Json<TextRequest>,
) -> Result<Json<ChannelsResponse>, ApiError> {
    if payload.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content is required".to_string()));
    }

    let channels = parse_playlist(&payload.content);
    Ok(Json(ChannelsResponse::new(channels)))
}
