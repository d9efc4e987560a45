//! Audio playback through rodio.
//!
//! The output stream is opened on the blocking thread that plays the clip
//! and dropped when the sink drains, so nothing audio-related crosses
//! threads.

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStreamBuilder, Sink};
use tracing::debug;

use super::SpeechError;

/// Play mono `samples` at `sample_rate` and wait for the end of the clip.
pub async fn play(samples: Vec<f32>, sample_rate: u32) -> Result<(), SpeechError> {
    if samples.is_empty() {
        return Ok(());
    }

    let seconds = samples.len() as f32 / sample_rate as f32;
    debug!("Playing {} samples ({seconds:.1}s)", samples.len());

    tokio::task::spawn_blocking(move || -> Result<(), SpeechError> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| SpeechError::Playback(format!("Failed to open audio output: {e}")))?;

        // rodio 0.21: Sink::connect_new takes &Mixer
        let sink = Sink::connect_new(stream.mixer());
        sink.append(SamplesBuffer::new(1, sample_rate, samples));
        sink.sleep_until_end();
        Ok(())
    })
    .await
    .map_err(|e| SpeechError::Playback(format!("Playback task failed: {e}")))?
}

/// Convert 16-bit little-endian PCM into f32 samples in [-1, 1).
/// A trailing odd byte is ignored.
pub fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm16_conversion() {
        let bytes = [0x00, 0x00, 0xff, 0x7f, 0x00, 0x80, 0x00, 0x40, 0x01];
        let samples = pcm16_to_f32(&bytes);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 32767.0 / 32768.0).abs() < f32::EPSILON);
        assert_eq!(samples[2], -1.0);
        assert_eq!(samples[3], 0.5);
    }

    #[tokio::test]
    async fn test_empty_clip_is_noop() {
        assert!(play(Vec::new(), 24000).await.is_ok());
    }
}
