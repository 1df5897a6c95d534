use serde::{Deserialize, Serialize};

/// Sentinel group for entries without a group-title attribute
pub const DEFAULT_GROUP: &str = "Uncategorized";

/// Single channel entry parsed from an M3U playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Deterministic per-document id (hash of url + source index).
    /// Stable across re-parses of the same document, not a global identity.
    pub id: String,
    pub title: String,
    pub group: String,
    #[serde(default)]
    pub logo: String,
    pub url: String,
    #[serde(default)]
    pub tvg_id: String,
    #[serde(default)]
    pub tvg_name: String,
}

/// Request carrying a remote resource locator
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    pub url: String,
}

/// Request carrying an inline playlist document
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub content: String,
}

/// Parsed playlist response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsResponse {
    pub channels: Vec<Channel>,
    pub count: usize,
}

impl ChannelsResponse {
    pub fn new(channels: Vec<Channel>) -> Self {
        let count = channels.len();
        Self { channels, count }
    }
}

/// Result of a stream liveness probe. Failure is folded into the shape
/// rather than surfaced as an error.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamCheck {
    pub alive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamCheck {
    pub fn alive(status: u16, content_type: Option<String>) -> Self {
        Self {
            alive: true,
            content_type,
            status: Some(status),
            error: None,
        }
    }

    pub fn dead(error: impl Into<String>) -> Self {
        Self {
            alive: false,
            content_type: None,
            status: None,
            error: Some(error.into()),
        }
    }
}
