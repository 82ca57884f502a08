//! SpeechKit - Yandex SpeechKit v1 recognition and synthesis client
//!
//! Provides an async client for the short-audio speech APIs:
//! - `SpeechKitClient::recognize` - Transcribe audio to text (STT)
//! - `SpeechKitClient::synthesize` - Synthesize speech from text (TTS)
//! - `OpusEncoder` - Convert raw PCM to Ogg/Opus through an external encoder
//!
//! # Architecture
//!
//! - `auth` exchanges a long-lived OAuth token for a short-lived IAM token
//!   and caches it until its validity window lapses
//! - `client` builds the recognition and synthesis requests and attaches a
//!   fresh bearer token to each one
//! - `converter` shells out to an Opus encoder binary over temp files
//!
//! # Example
//!
//! ```ignore
//! use speechkit::{
//!     AudioFormat, RecognizeOptions, SpeechKitClient, SpeechKitConfig, SynthesizeOptions,
//! };
//!
//! let config = SpeechKitConfig {
//!     folder_id: "b1gexample".to_string(),
//!     oauth_token: Some(std::env::var("SPEECHKIT_OAUTH_TOKEN")?),
//!     ..SpeechKitConfig::default()
//! };
//! let client = SpeechKitClient::from_config(&config)?;
//!
//! // Transcribe audio
//! let text = client
//!     .recognize(&audio, AudioFormat::OggOpus, &RecognizeOptions::default())
//!     .await?;
//! println!("Recognized: {text}");
//!
//! // Synthesize speech
//! let audio = client
//!     .synthesize("Привет!", AudioFormat::OggOpus, &SynthesizeOptions::default())
//!     .await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod converter;
pub mod error;
mod http;
pub mod types;

pub use auth::{Authorizer, Credential, DEFAULT_TOKEN_VALIDITY, IamAuthorizer, StaticAuthorizer};
pub use client::{RecognizeOptions, SpeechKitClient, SynthesizeOptions};
pub use config::{EncoderConfig, SpeechKitConfig};
pub use converter::{OpusEncoder, pcm_to_wav_bytes};
pub use error::SpeechKitError;
pub use tokio_util::sync::CancellationToken;
pub use types::{
    AudioFormat, DEFAULT_SAMPLE_RATE, Emotion, Language, PcmFormat, SUPPORTED_PCM_SAMPLE_RATES,
    Topic, Voice,
};
