//! Microphone capture through the default input device

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleRate, StreamConfig};
use speechkit::{DEFAULT_SAMPLE_RATE, PcmFormat};

/// Stream parameters requested from the audio device
pub const CAPTURE_FORMAT: PcmFormat = PcmFormat::new(DEFAULT_SAMPLE_RATE, 1, 16);

/// Record mono 16-bit PCM from the default input device
///
/// Blocks for `duration`; call through `spawn_blocking` from async code.
pub fn capture(duration: Duration) -> anyhow::Result<Vec<u8>> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("no default input device available"))?;

    let config = StreamConfig {
        channels: CAPTURE_FORMAT.channels(),
        sample_rate: SampleRate(CAPTURE_FORMAT.sample_rate()),
        buffer_size: BufferSize::Default,
    };

    let samples: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&samples);

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend(data.iter().map(|sample| to_i16_sample(*sample)));
                }
            },
            |err| tracing::warn!(error = %err, "input stream error"),
            None,
        )
        .context("failed to open a 48 kHz mono input stream")?;

    stream.play().context("failed to start recording")?;
    std::thread::sleep(duration);
    drop(stream);

    let samples = samples
        .lock()
        .map_err(|_| anyhow!("recording buffer poisoned"))?;
    Ok(samples.iter().flat_map(|sample| sample.to_le_bytes()).collect())
}

/// Convert a float sample to a 16-bit integer sample
#[allow(clippy::cast_possible_truncation)]
fn to_i16_sample(sample: f32) -> i16 {
    (sample * f32::from(i16::MAX)).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}
