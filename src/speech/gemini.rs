//! Gemini text-to-speech client.
//!
//! Sends the message to `models/{model}:generateContent` asking for an
//! audio response, decodes the base64 PCM payload and plays it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::playback::{pcm16_to_f32, play};
use super::{SpeechError, Speaker};
use crate::config::SpeechConfig;

pub struct GeminiSpeaker {
    client: Client,
    api_key: Option<String>,
    api_key_env: String,
    url: String,
    voice: String,
    sample_rate: u32,
}

impl GeminiSpeaker {
    pub fn new(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.resolve_api_key(),
            api_key_env: config.api_key_env.clone(),
            url: format!(
                "{}/models/{}:generateContent",
                config.api_base.trim_end_matches('/'),
                config.model
            ),
            voice: config.voice.clone(),
            sample_rate: config.sample_rate,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn request_body(&self, text: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.voice }
                    }
                }
            }
        })
    }

    /// Generate speech audio for `text` as f32 samples.
    async fn synthesize(&self, text: &str) -> Result<Vec<f32>, SpeechError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SpeechError::MissingApiKey(self.api_key_env.clone()))?;

        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SpeechError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = resp.json().await?;
        let pcm = extract_audio(&data)?;
        Ok(pcm16_to_f32(&pcm))
    }
}

#[async_trait]
impl Speaker for GeminiSpeaker {
    async fn speak(&self, message: &str) -> Result<(), SpeechError> {
        let t_gen = Instant::now();
        let samples = self.synthesize(message).await?;
        let gen_ms = t_gen.elapsed().as_secs_f64() * 1000.0;
        debug!("Generated {} samples in {gen_ms:.0}ms", samples.len());

        let t_play = Instant::now();
        play(samples, self.sample_rate).await?;
        let play_ms = t_play.elapsed().as_secs_f64() * 1000.0;

        info!("Spoke reminder: gen={gen_ms:.0}ms play={play_ms:.0}ms");
        Ok(())
    }
}

/// Pull the inline audio bytes out of a generateContent response.
fn extract_audio(data: &Value) -> Result<Vec<u8>, SpeechError> {
    let encoded = data["candidates"][0]["content"]["parts"][0]["inlineData"]["data"]
        .as_str()
        .filter(|s| !s.is_empty())
        .ok_or(SpeechError::NoAudio)?;
    Ok(STANDARD.decode(encoded)?)
}
