//! Speech-to-text (STT) processing

use async_trait::async_trait;

use crate::voice::AudioClip;
use crate::{Error, Result};

/// Response from OpenAI Whisper transcription API
#[derive(serde::Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Outcome of one transcription attempt.
///
/// Transcription never raises: unusable audio and an unreachable service
/// are ordinary outcomes the loop routes on, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Recognized speech
    Text(String),
    /// Audio carried no recognizable speech
    Unintelligible,
    /// The transcription service could not be reached or rejected the request
    ServiceUnavailable,
}

impl Transcript {
    /// The recognized text, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Capability: transcribe recorded audio
#[async_trait]
pub trait Transcribe {
    /// Transcribe a recorded phrase, folding failures into the outcome
    async fn transcribe(&self, clip: &AudioClip) -> Transcript;
}

/// Transcribes speech via the OpenAI Whisper API
#[derive(Debug)]
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl SpeechToText {
    /// Create a new STT instance
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for Whisper".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }

    /// Send WAV bytes to the transcription endpoint
    async fn request_transcription(&self, wav: Vec<u8>) -> Result<String> {
        tracing::debug!(audio_bytes = wav.len(), "starting Whisper transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(wav)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone());

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;
        Ok(result.text)
    }
}

#[async_trait]
impl Transcribe for SpeechToText {
    async fn transcribe(&self, clip: &AudioClip) -> Transcript {
        let wav = match clip.to_wav() {
            Ok(wav) => wav,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode audio for transcription");
                return Transcript::Unintelligible;
            }
        };

        match self.request_transcription(wav).await {
            Ok(text) if text.trim().is_empty() => {
                tracing::warn!("speech was unintelligible");
                Transcript::Unintelligible
            }
            Ok(text) => {
                tracing::debug!(transcript = %text, "transcription complete");
                Transcript::Text(text)
            }
            Err(e) => {
                tracing::error!(error = %e, "speech recognition service unavailable");
                Transcript::ServiceUnavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let err = SpeechToText::new(String::new(), "whisper-1".to_string()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_transcript_text_accessor() {
        assert_eq!(
            Transcript::Text("hello".to_string()).text(),
            Some("hello")
        );
        assert_eq!(Transcript::Unintelligible.text(), None);
        assert_eq!(Transcript::ServiceUnavailable.text(), None);
    }
}
