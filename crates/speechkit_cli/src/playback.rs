//! Speaker playback through the default output device

use std::io::Cursor;

use anyhow::Context;
use rodio::{Decoder, OutputStreamBuilder, Sink};
use speechkit::{PcmFormat, pcm_to_wav_bytes};

/// Play raw PCM through the default output device
///
/// Blocks until playback finishes; call through `spawn_blocking` from
/// async code.
pub fn play_pcm(pcm: &[u8], format: &PcmFormat) -> anyhow::Result<()> {
    let wav = pcm_to_wav_bytes(pcm, format).context("failed to wrap PCM for playback")?;

    let stream_handle = OutputStreamBuilder::open_default_stream()
        .context("no default output device available")?;
    let sink = Sink::connect_new(stream_handle.mixer());
    let source = Decoder::new(Cursor::new(wav)).context("failed to decode WAV stream")?;
    sink.append(source);
    sink.sleep_until_end();

    Ok(())
}
