//! Types for the speech service wire protocol
//!
//! Domain enums with their fixed wire-token mappings, plus the PCM stream
//! descriptor used by recognition and conversion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sample rates the service accepts for linear PCM audio
pub const SUPPORTED_PCM_SAMPLE_RATES: [u32; 3] = [8000, 16_000, 48_000];

/// Default sample rate for recognition, synthesis, and capture
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Whether the service accepts this sample rate for linear PCM audio
#[must_use]
pub const fn is_supported_pcm_sample_rate(rate: u32) -> bool {
    matches!(rate, 8000 | 16_000 | 48_000)
}

/// Audio container formats understood by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// Raw linear PCM samples without a container header
    Pcm,
    /// Opus-encoded audio wrapped in an Ogg container
    OggOpus,
}

impl AudioFormat {
    /// Wire token sent in the `format` parameter
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm => "lpcm",
            Self::OggOpus => "oggopus",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lpcm" | "pcm" => Ok(Self::Pcm),
            "oggopus" | "ogg" | "opus" => Ok(Self::OggOpus),
            _ => Err(format!("unknown audio format: {s}")),
        }
    }
}

/// Recognition and synthesis languages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Russian
    #[default]
    Russian,
    /// English
    English,
    /// Turkish
    Turkish,
}

impl Language {
    /// Wire token sent in the `lang` parameter
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Russian => "ru-RU",
            Self::English => "en-US",
            Self::Turkish => "tr-TR",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "russian" | "ru" | "ru-ru" => Ok(Self::Russian),
            "english" | "en" | "en-us" => Ok(Self::English),
            "turkish" | "tr" | "tr-tr" => Ok(Self::Turkish),
            _ => Err(format!("unknown language: {s}")),
        }
    }
}

/// Recognition hint narrowing the expected utterance domain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Short general-purpose phrases
    #[default]
    General,
    /// Addresses and organization names
    Maps,
    /// Dates
    Dates,
    /// Person names
    Names,
    /// Numbers
    Numbers,
}

impl Topic {
    /// Wire token sent in the `topic` parameter
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Maps => "maps",
            Self::Dates => "dates",
            Self::Names => "names",
            Self::Numbers => "numbers",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "maps" => Ok(Self::Maps),
            "dates" => Ok(Self::Dates),
            "names" => Ok(Self::Names),
            "numbers" => Ok(Self::Numbers),
            _ => Err(format!("unknown topic: {s}")),
        }
    }
}

/// Synthesis voices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    /// Female voice, the service default
    #[default]
    Oksana,
    /// Female voice
    Jane,
    /// Female voice
    Omazh,
    /// Male voice
    Zahar,
    /// Male voice
    Ermil,
}

impl Voice {
    /// Wire token sent in the `voice` parameter
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Oksana => "oksana",
            Self::Jane => "jane",
            Self::Omazh => "omazh",
            Self::Zahar => "zahar",
            Self::Ermil => "ermil",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "oksana" => Ok(Self::Oksana),
            "jane" => Ok(Self::Jane),
            "omazh" => Ok(Self::Omazh),
            "zahar" => Ok(Self::Zahar),
            "ermil" => Ok(Self::Ermil),
            _ => Err(format!("unknown voice: {s}")),
        }
    }
}

/// Emotional coloring applied to a synthesis voice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    /// No emotional coloring
    #[default]
    Neutral,
    /// Friendly tone
    Good,
    /// Irritated tone
    Evil,
}

impl Emotion {
    /// Wire token sent in the `emotion` parameter
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Good => "good",
            Self::Evil => "evil",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "good" => Ok(Self::Good),
            "evil" => Ok(Self::Evil),
            _ => Err(format!("unknown emotion: {s}")),
        }
    }
}

/// Stream parameters describing a raw PCM buffer
///
/// Mandatory context wherever headerless samples cross an API boundary:
/// the bytes alone do not say how to interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Samples per second
    sample_rate: u32,
    /// Interleaved channel count
    channels: u16,
    /// Bits per sample
    bits_per_sample: u16,
}

impl PcmFormat {
    /// Create a descriptor for the given stream parameters
    #[must_use]
    pub const fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Samples per second
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channel count
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Bits per sample
    #[must_use]
    pub const fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Bytes consumed per second of audio
    #[must_use]
    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * (self.bits_per_sample as u32 / 8)
    }
}

impl Default for PcmFormat {
    /// Mono 16-bit at 48 kHz, the capture and synthesis default
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, 1, 16)
    }
}
