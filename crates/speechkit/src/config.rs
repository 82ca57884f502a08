//! Configuration for the speech client and the external encoder

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the speech service client and its authorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechKitConfig {
    /// Cloud folder id sent with every speech request
    #[serde(default)]
    pub folder_id: String,

    /// Long-lived OAuth token exchanged for short-lived IAM tokens
    #[serde(default)]
    pub oauth_token: Option<String>,

    /// Base URL of the recognition endpoint
    #[serde(default = "default_stt_base_url")]
    pub stt_base_url: String,

    /// Base URL of the synthesis endpoint
    #[serde(default = "default_tts_base_url")]
    pub tts_base_url: String,

    /// Base URL of the token exchange endpoint
    #[serde(default = "default_iam_base_url")]
    pub iam_base_url: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// How long an obtained IAM token is treated as valid, in seconds.
    /// Kept below the service-side 12 hour expiry so a token is never
    /// attached to a request right as it lapses.
    #[serde(default = "default_token_validity_secs")]
    pub token_validity_secs: u64,
}

/// Configuration for the external Opus encoder invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Encoder binary to spawn
    #[serde(default = "default_encoder_path")]
    pub encoder_path: PathBuf,

    /// Directory for intermediate files; system temp dir when unset
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Deadline for the encoder process in milliseconds; waits
    /// indefinitely when unset
    #[serde(default)]
    pub wait_timeout_ms: Option<u64>,
}

fn default_stt_base_url() -> String {
    "https://stt.api.cloud.yandex.net".to_string()
}

fn default_tts_base_url() -> String {
    "https://tts.api.cloud.yandex.net".to_string()
}

fn default_iam_base_url() -> String {
    "https://iam.api.cloud.yandex.net".to_string()
}

const fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

const fn default_connect_timeout_ms() -> u64 {
    10000 // 10 seconds
}

const fn default_token_validity_secs() -> u64 {
    crate::auth::DEFAULT_TOKEN_VALIDITY.as_secs()
}

fn default_encoder_path() -> PathBuf {
    PathBuf::from("opusenc")
}

impl Default for SpeechKitConfig {
    fn default() -> Self {
        Self {
            folder_id: String::new(),
            oauth_token: None,
            stt_base_url: default_stt_base_url(),
            tts_base_url: default_tts_base_url(),
            iam_base_url: default_iam_base_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            token_validity_secs: default_token_validity_secs(),
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            encoder_path: default_encoder_path(),
            temp_dir: None,
            wait_timeout_ms: None,
        }
    }
}

impl SpeechKitConfig {
    /// Create a minimal config for testing
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            folder_id: "test-folder".to_string(),
            oauth_token: Some("test-oauth".to_string()),
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.folder_id.is_empty() {
            return Err("Folder id is required".to_string());
        }

        if matches!(self.oauth_token.as_deref(), Some("")) {
            return Err("OAuth token must not be empty when set".to_string());
        }

        for (name, url) in [
            ("stt_base_url", &self.stt_base_url),
            ("tts_base_url", &self.tts_base_url),
            ("iam_base_url", &self.iam_base_url),
        ] {
            if url.is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }

        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.connect_timeout_ms == 0 {
            return Err("Connect timeout must be greater than 0".to_string());
        }

        if self.token_validity_secs == 0 {
            return Err("Token validity must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl EncoderConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.encoder_path.as_os_str().is_empty() {
            return Err("Encoder path must not be empty".to_string());
        }

        if self.wait_timeout_ms == Some(0) {
            return Err("Encoder wait timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
