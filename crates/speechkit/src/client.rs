//! Speech service client
//!
//! Builds recognition and synthesis requests, obtains a bearer token from
//! the [`Authorizer`] before every call, validates caller parameters up
//! front, and maps the typed enums onto the service's wire tokens.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::auth::{Authorizer, IamAuthorizer};
use crate::config::SpeechKitConfig;
use crate::error::SpeechKitError;
use crate::http;
use crate::types::{
    AudioFormat, DEFAULT_SAMPLE_RATE, Emotion, Language, SUPPORTED_PCM_SAMPLE_RATES, Topic, Voice,
    is_supported_pcm_sample_rate,
};

/// Options for [`SpeechKitClient::recognize`]
#[derive(Debug, Clone)]
pub struct RecognizeOptions {
    /// Spoken language
    pub language: Language,
    /// Recognition topic hint
    pub topic: Topic,
    /// Mask profanity in the transcription
    pub filter_profanity: bool,
    /// Sample rate of the audio; validated and sent for PCM input only
    pub sample_rate: u32,
    /// Cancels the call when triggered
    pub cancel: CancellationToken,
}

impl Default for RecognizeOptions {
    fn default() -> Self {
        Self {
            language: Language::default(),
            topic: Topic::default(),
            filter_profanity: false,
            sample_rate: DEFAULT_SAMPLE_RATE,
            cancel: CancellationToken::new(),
        }
    }
}

impl RecognizeOptions {
    /// Set the spoken language
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the recognition topic hint
    #[must_use]
    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topic = topic;
        self
    }

    /// Set whether profanity is masked in the transcription
    #[must_use]
    pub fn with_filter_profanity(mut self, filter_profanity: bool) -> Self {
        self.filter_profanity = filter_profanity;
        self
    }

    /// Set the PCM sample rate
    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Attach a cancellation token
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Options for [`SpeechKitClient::synthesize`]
#[derive(Debug, Clone)]
pub struct SynthesizeOptions {
    /// Synthesis language
    pub language: Language,
    /// Voice to synthesize with
    pub voice: Voice,
    /// Emotional coloring of the voice
    pub emotion: Emotion,
    /// Speech rate multiplier, valid range 0.1 to 3.0
    pub speed: f32,
    /// Sample rate of the produced audio; validated for PCM output only
    pub sample_rate: u32,
    /// Cancels the call when triggered
    pub cancel: CancellationToken,
}

impl Default for SynthesizeOptions {
    fn default() -> Self {
        Self {
            language: Language::default(),
            voice: Voice::default(),
            emotion: Emotion::default(),
            speed: 1.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            cancel: CancellationToken::new(),
        }
    }
}

impl SynthesizeOptions {
    /// Set the synthesis language
    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Set the voice
    #[must_use]
    pub fn with_voice(mut self, voice: Voice) -> Self {
        self.voice = voice;
        self
    }

    /// Set the emotional coloring
    #[must_use]
    pub fn with_emotion(mut self, emotion: Emotion) -> Self {
        self.emotion = emotion;
        self
    }

    /// Set the speech rate multiplier
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set the PCM sample rate
    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Attach a cancellation token
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Recognition response payload
#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    result: String,
}

/// Client for the speech service's recognition and synthesis endpoints
#[derive(Clone)]
pub struct SpeechKitClient {
    client: reqwest::Client,
    authorizer: Arc<dyn Authorizer>,
    folder_id: String,
    stt_url: String,
    tts_url: String,
}

impl fmt::Debug for SpeechKitClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechKitClient")
            .field("folder_id", &self.folder_id)
            .field("stt_url", &self.stt_url)
            .field("tts_url", &self.tts_url)
            .finish_non_exhaustive()
    }
}

impl SpeechKitClient {
    /// Create a client using the given authorizer
    ///
    /// # Errors
    ///
    /// Returns `SpeechKitError::InvalidArgument` if the configuration is
    /// invalid.
    pub fn new(
        config: &SpeechKitConfig,
        authorizer: Arc<dyn Authorizer>,
    ) -> Result<Self, SpeechKitError> {
        config.validate().map_err(SpeechKitError::InvalidArgument)?;

        Ok(Self {
            client: http::build_client(config)?,
            authorizer,
            folder_id: config.folder_id.clone(),
            stt_url: format!("{}/speech/v1/stt:recognize", config.stt_base_url),
            tts_url: format!("{}/speech/v1/tts:synthesize", config.tts_base_url),
        })
    }

    /// Create a client with an [`IamAuthorizer`] built from the same config
    ///
    /// # Errors
    ///
    /// Returns `SpeechKitError::InvalidArgument` if the configuration is
    /// invalid or carries no OAuth token.
    pub fn from_config(config: &SpeechKitConfig) -> Result<Self, SpeechKitError> {
        let authorizer = Arc::new(IamAuthorizer::new(config)?);
        Self::new(config, authorizer)
    }

    /// Recognize speech in the given audio
    ///
    /// # Arguments
    ///
    /// * `audio` - Raw audio bytes in the stated format
    /// * `format` - Container format of `audio`
    /// * `options` - Language, topic, and stream parameters
    ///
    /// # Returns
    ///
    /// Returns the transcribed text.
    ///
    /// # Errors
    ///
    /// Returns `SpeechKitError::InvalidArgument` for an unsupported PCM
    /// sample rate (before any network call), an API-kind error when the
    /// exchange fails, and `SpeechKitError::Cancelled` on cancellation.
    #[instrument(
        skip(self, audio, options),
        fields(audio_size = audio.len(), format = %format, language = %options.language)
    )]
    pub async fn recognize(
        &self,
        audio: &[u8],
        format: AudioFormat,
        options: &RecognizeOptions,
    ) -> Result<String, SpeechKitError> {
        debug!("recognizing speech");

        if format == AudioFormat::Pcm && !is_supported_pcm_sample_rate(options.sample_rate) {
            return Err(SpeechKitError::InvalidArgument(format!(
                "unsupported PCM sample rate {}, expected one of {:?}",
                options.sample_rate, SUPPORTED_PCM_SAMPLE_RATES
            )));
        }

        http::with_cancel(&options.cancel, async {
            let token = self.authorizer.auth_token().await?;

            let mut query: Vec<(&str, String)> = vec![
                ("folderId", self.folder_id.clone()),
                ("lang", options.language.as_str().to_string()),
                ("topic", options.topic.as_str().to_string()),
                ("profanityFilter", options.filter_profanity.to_string()),
                ("format", format.as_str().to_string()),
            ];
            if format == AudioFormat::Pcm {
                query.push(("sampleRateHertz", options.sample_rate.to_string()));
            }

            let request = self
                .client
                .post(&self.stt_url)
                .query(&query)
                .bearer_auth(token)
                .body(audio.to_vec());

            let body = http::execute_text(request).await?;
            let parsed: RecognizeResponse = serde_json::from_str(&body).map_err(|e| {
                SpeechKitError::ApiPayload(format!("recognition response carried no result: {e}"))
            })?;

            debug!(text_len = parsed.result.len(), "recognition complete");
            Ok(parsed.result)
        })
        .await
    }

    /// Synthesize speech for the given text
    ///
    /// # Arguments
    ///
    /// * `text` - Text to speak, must not be empty
    /// * `format` - Desired output container format
    /// * `options` - Voice, emotion, speed, and stream parameters
    ///
    /// # Returns
    ///
    /// Returns the synthesized audio bytes.
    ///
    /// # Errors
    ///
    /// Returns `SpeechKitError::InvalidArgument` for empty text, an
    /// out-of-range speed, or an unsupported PCM sample rate (all before
    /// any network call), an API-kind error when the exchange fails or
    /// produces an empty body, and `SpeechKitError::Cancelled` on
    /// cancellation.
    #[instrument(
        skip(self, text, options),
        fields(text_len = text.len(), format = %format, voice = %options.voice)
    )]
    pub async fn synthesize(
        &self,
        text: &str,
        format: AudioFormat,
        options: &SynthesizeOptions,
    ) -> Result<Vec<u8>, SpeechKitError> {
        debug!("synthesizing speech");

        if text.is_empty() {
            return Err(SpeechKitError::InvalidArgument(
                "text must not be empty".to_string(),
            ));
        }

        if !(0.1..=3.0).contains(&options.speed) {
            return Err(SpeechKitError::InvalidArgument(format!(
                "speed must be within 0.1 and 3.0, got {}",
                options.speed
            )));
        }

        if format == AudioFormat::Pcm && !is_supported_pcm_sample_rate(options.sample_rate) {
            return Err(SpeechKitError::InvalidArgument(format!(
                "unsupported PCM sample rate {}, expected one of {:?}",
                options.sample_rate, SUPPORTED_PCM_SAMPLE_RATES
            )));
        }

        http::with_cancel(&options.cancel, async {
            let token = self.authorizer.auth_token().await?;

            let sample_rate = options.sample_rate.to_string();
            let speed = options.speed.to_string();
            let form = [
                ("text", text),
                ("lang", options.language.as_str()),
                ("folderId", self.folder_id.as_str()),
                ("format", format.as_str()),
                ("sampleRateHertz", sample_rate.as_str()),
                ("voice", options.voice.as_str()),
                ("emotion", options.emotion.as_str()),
                ("speed", speed.as_str()),
            ];

            let request = self.client.post(&self.tts_url).bearer_auth(token).form(&form);

            let bytes = http::execute_bytes(request).await?;
            if bytes.is_empty() {
                return Err(SpeechKitError::ApiPayload(
                    "synthesis returned an empty body".to_string(),
                ));
            }

            debug!(audio_size = bytes.len(), "synthesis complete");
            Ok(bytes.to_vec())
        })
        .await
    }
}
