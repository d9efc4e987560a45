//! Speech trigger: turns a reminder message into audible speech.
//!
//! Components:
//! - `gemini`: Gemini generative speech API client
//! - `playback`: rodio playback of the returned PCM audio
//!
//! A speaker never retries. The reminder engine decides what happens when
//! speech fails.

pub mod gemini;
pub mod playback;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiSpeaker;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("speech output is disabled")]
    Disabled,

    #[error("no API key configured (set speech.api_key or ${0})")]
    MissingApiKey(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("speech API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("speech API response contained no audio")]
    NoAudio,

    #[error("invalid audio payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("playback failed: {0}")]
    Playback(String),

    #[error("speech task failed: {0}")]
    Task(String),
}

/// Something that can say a message out loud.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Resolves once playback has finished.
    async fn speak(&self, message: &str) -> Result<(), SpeechError>;
}

/// Speaker used when speech is turned off in config. Every call fails, so
/// reminders go through the fallback notification instead.
pub struct DisabledSpeaker;

#[async_trait]
impl Speaker for DisabledSpeaker {
    async fn speak(&self, _message: &str) -> Result<(), SpeechError> {
        Err(SpeechError::Disabled)
    }
}
