//! SpeechKit CLI
//!
//! Command-line demo for microphone recognition and speech synthesis.

#![allow(clippy::print_stdout)]

mod playback;
mod record;
mod settings;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use speechkit::{
    AudioFormat, CancellationToken, Emotion, Language, OpusEncoder, PcmFormat, RecognizeOptions,
    SpeechKitClient, SynthesizeOptions, Topic, Voice,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// SpeechKit CLI
#[derive(Parser)]
#[command(name = "speechkit-cli")]
#[command(version, about = "Yandex SpeechKit demo CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (TOML, extension optional)
    #[arg(short, long, default_value = "speechkit")]
    config: String,

    /// Cloud folder id, overrides the configuration file
    #[arg(long, env = "SPEECHKIT_FOLDER_ID")]
    folder_id: Option<String>,

    /// OAuth token, overrides the configuration file
    #[arg(long, env = "SPEECHKIT_OAUTH_TOKEN")]
    oauth_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record from the microphone and print the transcription
    ///
    /// Records mono 16-bit 48 kHz audio from the default input device,
    /// optionally converts it to Ogg/Opus through the configured encoder,
    /// and sends it for recognition.
    ///
    /// Example: speechkit-cli recognize --duration 3 --lang en
    Recognize {
        /// Recording length in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Recognize an existing audio file instead of recording
        /// (raw 48 kHz mono PCM or Ogg/Opus, per --format)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Wire format to upload (lpcm or oggopus)
        #[arg(short, long, default_value = "lpcm")]
        format: AudioFormat,

        /// Spoken language
        #[arg(short, long, default_value = "ru-RU")]
        lang: Language,

        /// Recognition topic hint
        #[arg(short, long, default_value = "general")]
        topic: Topic,

        /// Mask profanity in the transcription
        #[arg(long)]
        filter_profanity: bool,
    },

    /// Synthesize speech and play it or write it to a file
    ///
    /// Example: speechkit-cli synthesize "Привет!" --voice jane --speed 1.2
    Synthesize {
        /// Text to speak
        text: String,

        /// Synthesis language
        #[arg(short, long, default_value = "ru-RU")]
        lang: Language,

        /// Voice to synthesize with
        #[arg(long, default_value = "oksana")]
        voice: Voice,

        /// Emotional coloring of the voice
        #[arg(long, default_value = "neutral")]
        emotion: Emotion,

        /// Speech rate multiplier (0.1 to 3.0)
        #[arg(short, long, default_value = "1.0")]
        speed: f32,

        /// Write Ogg/Opus audio here instead of playing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate the configuration and probe the encoder binary
    Check,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Apply command-line credential overrides onto the loaded settings
fn apply_overrides(
    settings: &mut settings::Settings,
    folder_id: Option<String>,
    oauth_token: Option<String>,
) {
    if let Some(folder_id) = folder_id {
        settings.client.folder_id = folder_id;
    }
    if let Some(oauth_token) = oauth_token {
        settings.client.oauth_token = Some(oauth_token);
    }
}

#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = log_filter_from_verbosity(cli.verbose);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = settings::load(&cli.config)?;
    apply_overrides(&mut settings, cli.folder_id, cli.oauth_token);

    // Ctrl-C cancels in-flight calls and kills a running encoder.
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    match cli.command {
        Commands::Recognize {
            duration,
            input,
            format,
            lang,
            topic,
            filter_profanity,
        } => {
            let client = SpeechKitClient::from_config(&settings.client)?;

            let (audio, upload_format) = match input {
                Some(path) => {
                    println!("📂 Reading {}", path.display());
                    (std::fs::read(&path)?, format)
                },
                None => {
                    println!("🎙️  Recording {duration}s from the default input device...");
                    let pcm = tokio::task::spawn_blocking(move || {
                        record::capture(Duration::from_secs(duration))
                    })
                    .await??;
                    println!("   Captured {} bytes", pcm.len());

                    if format == AudioFormat::OggOpus {
                        let encoder = OpusEncoder::new(settings.encoder.clone())?;
                        println!("🔄 Converting to Ogg/Opus...");
                        match encoder
                            .encode_pcm(&pcm, &record::CAPTURE_FORMAT, &cancel)
                            .await
                        {
                            Ok(encoded) => (encoded, AudioFormat::OggOpus),
                            Err(e) => {
                                println!("❌ Conversion failed: {e}");
                                std::process::exit(1);
                            },
                        }
                    } else {
                        (pcm, AudioFormat::Pcm)
                    }
                },
            };

            let options = RecognizeOptions::default()
                .with_language(lang)
                .with_topic(topic)
                .with_filter_profanity(filter_profanity)
                .with_sample_rate(record::CAPTURE_FORMAT.sample_rate())
                .with_cancel(cancel.clone());

            println!("🗣️  Recognizing...");
            match client.recognize(&audio, upload_format, &options).await {
                Ok(text) => {
                    println!();
                    println!("📝 {text}");
                },
                Err(e) => {
                    println!("❌ Recognition failed: {e}");
                    std::process::exit(1);
                },
            }
        },

        Commands::Synthesize {
            text,
            lang,
            voice,
            emotion,
            speed,
            output,
        } => {
            let client = SpeechKitClient::from_config(&settings.client)?;

            let options = SynthesizeOptions::default()
                .with_language(lang)
                .with_voice(voice)
                .with_emotion(emotion)
                .with_speed(speed)
                .with_cancel(cancel.clone());

            if let Some(path) = output {
                println!("🔊 Synthesizing to {}...", path.display());
                match client.synthesize(&text, AudioFormat::OggOpus, &options).await {
                    Ok(audio) => {
                        std::fs::write(&path, &audio)?;
                        println!("✅ Wrote {} bytes", audio.len());
                    },
                    Err(e) => {
                        println!("❌ Synthesis failed: {e}");
                        std::process::exit(1);
                    },
                }
            } else {
                println!("🔊 Synthesizing...");
                match client.synthesize(&text, AudioFormat::Pcm, &options).await {
                    Ok(audio) => {
                        println!("▶️  Playing {} bytes", audio.len());
                        tokio::task::spawn_blocking(move || {
                            playback::play_pcm(&audio, &PcmFormat::default())
                        })
                        .await??;
                    },
                    Err(e) => {
                        println!("❌ Synthesis failed: {e}");
                        std::process::exit(1);
                    },
                }
            }
        },

        Commands::Check => {
            let mut healthy = true;

            match settings.client.validate() {
                Ok(()) => println!("✅ Client configuration is valid"),
                Err(e) => {
                    println!("❌ Client configuration: {e}");
                    healthy = false;
                },
            }

            match OpusEncoder::new(settings.encoder.clone()) {
                Ok(encoder) => {
                    if encoder.is_available().await {
                        println!(
                            "✅ Encoder responds: {}",
                            settings.encoder.encoder_path.display()
                        );
                    } else {
                        println!(
                            "⚠️  Encoder not found: {} (Ogg/Opus conversion unavailable)",
                            settings.encoder.encoder_path.display()
                        );
                    }
                },
                Err(e) => {
                    println!("❌ Encoder configuration: {e}");
                    healthy = false;
                },
            }

            if !healthy {
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
