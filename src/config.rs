//! Configuration management

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TRELLO_API_URL: &str = "https://api.trello.com/1";
pub const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_ARCEE_API_URL: &str = "https://models.arcee.ai/v1/chat/completions";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Board service API key
    pub trello_api_key: Option<String>,

    /// Board service user token
    pub trello_token: Option<String>,

    /// Board used when a command names none
    pub default_board_id: Option<String>,

    pub trello_api_url: String,

    /// Tabular task service credentials
    pub airtable_api_key: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_table_id: Option<String>,
    pub airtable_api_url: String,

    /// Chat model (OpenAI-compatible endpoint)
    pub arcee_api_key: Option<String>,
    pub arcee_model: String,
    pub arcee_api_url: String,

    /// Entity cache TTL in seconds
    pub cache_ttl_secs: u64,

    /// Per-request timeout in seconds
    pub http_timeout_secs: u64,

    /// SQLite database path for conversation history
    pub db_path: PathBuf,

    /// Messages replayed to the chat model per turn
    pub history_limit: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let cache_ttl_secs = match get("CHATBOARD_CACHE_TTL") {
            Some(v) => v
                .parse()
                .map_err(|_| anyhow::anyhow!("CHATBOARD_CACHE_TTL must be a number of seconds, got '{}'", v))?,
            None => 300,
        };

        let http_timeout_secs = match get("CHATBOARD_HTTP_TIMEOUT") {
            Some(v) => v
                .parse()
                .map_err(|_| anyhow::anyhow!("CHATBOARD_HTTP_TIMEOUT must be a number of seconds, got '{}'", v))?,
            None => 30,
        };

        let history_limit = get("CHATBOARD_HISTORY_LIMIT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(20);

        let db_path = get("CHATBOARD_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("chatboard")
                    .join("history.db")
            });

        Ok(Self {
            trello_api_key: get("TRELLO_API_KEY"),
            trello_token: get("TRELLO_TOKEN"),
            default_board_id: get("TRELLO_BOARD_ID"),
            trello_api_url: get("TRELLO_API_URL").unwrap_or_else(|| DEFAULT_TRELLO_API_URL.to_string()),
            airtable_api_key: get("AIRTABLE_API_KEY"),
            airtable_base_id: get("AIRTABLE_BASE_ID"),
            airtable_table_id: get("AIRTABLE_TABLE_ID"),
            airtable_api_url: get("AIRTABLE_API_URL").unwrap_or_else(|| DEFAULT_AIRTABLE_API_URL.to_string()),
            arcee_api_key: get("ARCEE_API_KEY"),
            arcee_model: get("ARCEE_MODEL").unwrap_or_else(|| "auto".to_string()),
            arcee_api_url: get("ARCEE_API_URL").unwrap_or_else(|| DEFAULT_ARCEE_API_URL.to_string()),
            cache_ttl_secs,
            http_timeout_secs,
            db_path,
            history_limit,
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
