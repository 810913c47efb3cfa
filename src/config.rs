//! Configuration and paths

use std::path::PathBuf;

/// All configurable paths, credentials, and constants
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub store_file: PathBuf,
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = std::env::var("SPEAKEASY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = dirs::home_dir().expect("Could not find home directory");
                home.join(".speakeasy")
            });

        Self {
            store_file: data_dir.join("store.json"),
            data_dir,
            groq_api_key: env_nonempty("GROQ_API_KEY"),
            gemini_api_key: env_nonempty("GEMINI_API_KEY"),
            telegram_bot_token: env_nonempty("TELEGRAM_BOT_TOKEN"),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Create config for testing with custom paths and no credentials
    pub fn for_test(temp_dir: &std::path::Path) -> Self {
        Self {
            data_dir: temp_dir.to_path_buf(),
            store_file: temp_dir.join("store.json"),
            groq_api_key: None,
            gemini_api_key: None,
            telegram_bot_token: None,
            request_timeout_secs: 1,
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Outbound HTTP timeout for AI providers and delivery (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
