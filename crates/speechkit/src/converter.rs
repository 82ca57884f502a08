//! PCM to Ogg/Opus conversion through an external encoder
//!
//! Wraps raw samples in a WAV container, hands the container to the
//! configured encoder binary over temp files, and reads the encoded result
//! back. The child process is killed when the conversion future is dropped.

use std::io::Cursor;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::EncoderConfig;
use crate::error::SpeechKitError;
use crate::http;
use crate::types::PcmFormat;

/// Wrap raw little-endian PCM samples in a WAV container
///
/// # Errors
///
/// Returns `SpeechKitError::InvalidArgument` if the format is not 16-bit
/// or the byte length is not a whole number of samples, and
/// `SpeechKitError::Conversion` if the container cannot be built.
pub fn pcm_to_wav_bytes(pcm: &[u8], format: &PcmFormat) -> Result<Vec<u8>, SpeechKitError> {
    if format.bits_per_sample() != 16 {
        return Err(SpeechKitError::InvalidArgument(format!(
            "only 16-bit PCM is supported, got {} bits per sample",
            format.bits_per_sample()
        )));
    }
    if pcm.len() % 2 != 0 {
        return Err(SpeechKitError::InvalidArgument(format!(
            "PCM byte length {} is not a whole number of 16-bit samples",
            pcm.len()
        )));
    }

    let wav_error = |e: hound::Error| SpeechKitError::Conversion {
        message: format!("failed to build WAV container: {e}"),
        exit_code: None,
        stderr: String::new(),
    };

    let spec = hound::WavSpec {
        channels: format.channels(),
        sample_rate: format.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(wav_error)?;
    for sample in pcm.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([sample[0], sample[1]]))
            .map_err(wav_error)?;
    }
    writer.finalize().map_err(wav_error)?;

    Ok(cursor.into_inner())
}

/// Invokes an external Opus encoder binary over temp files
#[derive(Debug, Clone)]
pub struct OpusEncoder {
    config: EncoderConfig,
}

impl OpusEncoder {
    /// Create an encoder wrapper for the configured binary
    ///
    /// # Errors
    ///
    /// Returns `SpeechKitError::InvalidArgument` if the configuration is
    /// invalid.
    pub fn new(config: EncoderConfig) -> Result<Self, SpeechKitError> {
        config.validate().map_err(SpeechKitError::InvalidArgument)?;
        Ok(Self { config })
    }

    /// Check whether the encoder binary can be started
    pub async fn is_available(&self) -> bool {
        Command::new(&self.config.encoder_path)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .is_ok_and(|status| status.success())
    }

    /// Encode raw PCM samples into an Ogg/Opus stream
    ///
    /// # Arguments
    ///
    /// * `pcm` - Little-endian 16-bit samples
    /// * `format` - Sample rate and channel layout of `pcm`
    /// * `cancel` - Cancels the conversion and kills the encoder
    ///
    /// # Errors
    ///
    /// Returns `SpeechKitError::InvalidArgument` for malformed input,
    /// `SpeechKitError::Conversion` when the encoder cannot be run, exits
    /// with a failure status, times out, or produces no output, and
    /// `SpeechKitError::Cancelled` on cancellation.
    #[instrument(skip(self, pcm, cancel), fields(pcm_size = pcm.len()))]
    pub async fn encode_pcm(
        &self,
        pcm: &[u8],
        format: &PcmFormat,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, SpeechKitError> {
        let wav = pcm_to_wav_bytes(pcm, format)?;

        let input = self.create_temp(".wav")?;
        tokio::fs::write(input.path(), &wav)
            .await
            .map_err(|e| SpeechKitError::Conversion {
                message: format!("failed to write temp WAV file: {e}"),
                exit_code: None,
                stderr: String::new(),
            })?;
        let output = self.create_temp(".ogg")?;

        let result = http::with_cancel(cancel, self.run_encoder(input.path(), output.path())).await;

        remove_temp_files([input, output]);
        result
    }

    /// Encode an existing WAV file into an Ogg/Opus stream
    ///
    /// # Errors
    ///
    /// Same as [`OpusEncoder::encode_pcm`], minus the input validation.
    #[instrument(skip(self, cancel))]
    pub async fn convert_wav_file(
        &self,
        wav_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, SpeechKitError> {
        let output = self.create_temp(".ogg")?;

        let result = http::with_cancel(cancel, self.run_encoder(wav_path, output.path())).await;

        remove_temp_files([output]);
        result
    }

    async fn run_encoder(&self, input: &Path, output: &Path) -> Result<Vec<u8>, SpeechKitError> {
        debug!(encoder = %self.config.encoder_path.display(), "spawning encoder");

        let mut child = Command::new(&self.config.encoder_path)
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechKitError::Conversion {
                message: format!(
                    "failed to start {}: {e}",
                    self.config.encoder_path.display()
                ),
                exit_code: None,
                stderr: String::new(),
            })?;

        // Drain stderr concurrently so a chatty encoder cannot block on a
        // full pipe.
        let stderr_task = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf).await;
                buf
            })
        });

        let status = match self.config.wait_timeout_ms.map(Duration::from_millis) {
            Some(deadline) => match tokio::time::timeout(deadline, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "failed to kill timed out encoder");
                    }
                    let stderr = collect_stderr(stderr_task).await;
                    return Err(SpeechKitError::Conversion {
                        message: format!(
                            "encoder did not finish within {}ms",
                            deadline.as_millis()
                        ),
                        exit_code: None,
                        stderr,
                    });
                }
            },
            None => child.wait().await,
        };

        let status = status.map_err(|e| SpeechKitError::Conversion {
            message: format!("failed to wait for encoder: {e}"),
            exit_code: None,
            stderr: String::new(),
        })?;

        let stderr = collect_stderr(stderr_task).await;

        if !status.success() {
            return Err(SpeechKitError::Conversion {
                message: "encoder exited with a failure status".to_string(),
                exit_code: status.code(),
                stderr,
            });
        }

        let encoded = tokio::fs::read(output)
            .await
            .map_err(|e| SpeechKitError::Conversion {
                message: format!("failed to read encoder output: {e}"),
                exit_code: status.code(),
                stderr: stderr.clone(),
            })?;

        if encoded.is_empty() {
            return Err(SpeechKitError::Conversion {
                message: "encoder produced no output".to_string(),
                exit_code: status.code(),
                stderr,
            });
        }

        debug!(encoded_size = encoded.len(), "encoding complete");
        Ok(encoded)
    }

    fn create_temp(&self, suffix: &str) -> Result<NamedTempFile, SpeechKitError> {
        let dir = self
            .config
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        tempfile::Builder::new()
            .prefix("speechkit-")
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|e| SpeechKitError::Conversion {
                message: format!("failed to create temp file: {e}"),
                exit_code: None,
                stderr: String::new(),
            })
    }
}

fn remove_temp_files<const N: usize>(files: [NamedTempFile; N]) {
    for file in files {
        if let Err(e) = file.close() {
            warn!(error = %e, "failed to remove temp file");
        }
    }
}

async fn collect_stderr(task: Option<JoinHandle<Vec<u8>>>) -> String {
    match task {
        Some(handle) => match handle.await {
            Ok(buf) => String::from_utf8_lossy(&buf).trim().to_string(),
            Err(_) => String::new(),
        },
        None => String::new(),
    }
}
