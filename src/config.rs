use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub allowed_origins: String,

    // Relay timeouts (per request class)
    pub playlist_fetch_timeout_ms: u64,
    pub stream_timeout_ms: u64,
    pub download_timeout_ms: u64,
    pub epg_timeout_ms: u64,
    pub check_timeout_ms: u64,

    // Upload
    pub max_upload_size_mb: usize,

    // Rate limiting
    pub rate_limit_enabled: bool,
    pub rate_limit_period_ms: u64,
    pub rate_limit_burst: u32,

    // Misc
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .unwrap_or(3001),
            allowed_origins: env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),

            // Relay timeouts
            playlist_fetch_timeout_ms: env::var("PLAYLIST_FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30_000), // 30 seconds

            stream_timeout_ms: env::var("STREAM_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()
                .unwrap_or(15_000), // 15 seconds to first byte

            download_timeout_ms: env::var("DOWNLOAD_TIMEOUT_MS")
                .unwrap_or_else(|_| "60000".to_string())
                .parse()
                .unwrap_or(60_000), // 1 minute to first byte

            epg_timeout_ms: env::var("EPG_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30_000),

            check_timeout_ms: env::var("CHECK_TIMEOUT_MS")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8_000),

            // Upload
            max_upload_size_mb: env::var("MAX_UPLOAD_SIZE_MB")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),

            // Rate limiting
            rate_limit_enabled: env::var("RATE_LIMIT_ENABLED")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            rate_limit_period_ms: env::var("RATE_LIMIT_PERIOD_MS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .unwrap_or(600),
            rate_limit_burst: env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),

            // Misc - Use VLC user agent to avoid IPTV server blocks
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "VLC/3.0.20 LibVLC/3.0.20".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
