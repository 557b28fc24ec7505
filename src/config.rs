//! Configuration for the genie assistant

use crate::{Error, Result};

/// Assistant configuration
///
/// Immutable for the lifetime of the interaction loop; every field maps
/// 1:1 onto a CLI flag.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Wake word that activates recording (matched case-insensitively)
    pub wake_word: String,

    /// Chat model to request
    pub model: String,

    /// Sampling temperature for the model
    pub temperature: f32,

    /// Maximum number of tokens in the reply
    pub max_output_tokens: u32,

    /// Seconds of silence that mark the end of a phrase
    pub pause_threshold: f32,

    /// Seconds of background noise sampled before each recording
    pub ambient_noise_duration: f32,

    /// Seconds to wait for speech to start before timing out (None = wait forever)
    pub listen_timeout: Option<f32>,

    /// Maximum seconds to record once speech starts (None = unbounded)
    pub phrase_time_limit: Option<f32>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: String,

    /// TTS model (e.g. "tts-1")
    pub tts_model: String,

    /// TTS voice identifier
    pub tts_voice: String,

    /// TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            wake_word: "genius".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_output_tokens: 400,
            pause_threshold: 0.8,
            ambient_noise_duration: 0.5,
            listen_timeout: None,
            phrase_time_limit: None,
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
        }
    }
}

impl AssistantConfig {
    /// Check that the duration-valued fields describe real durations.
    ///
    /// `Duration::from_secs_f32` panics on negative or non-finite input,
    /// so bad flag values must be rejected here, at startup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any duration field is negative or
    /// non-finite.
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("pause-threshold", Some(self.pause_threshold)),
            ("ambient-noise-duration", Some(self.ambient_noise_duration)),
            ("listen-timeout", self.listen_timeout),
            ("phrase-time-limit", self.phrase_time_limit),
        ];

        for (name, value) in durations {
            if let Some(secs) = value {
                if !secs.is_finite() || secs < 0.0 {
                    return Err(Error::Config(format!(
                        "{name} must be a non-negative number of seconds, got {secs}"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Resolve the OpenAI API key from an explicit value or the environment.
///
/// A missing key is the one fatal startup condition: the loop must not
/// start without it.
///
/// # Errors
///
/// Returns [`Error::Config`] if no key is supplied and `OPENAI_API_KEY`
/// is unset or empty.
pub fn resolve_api_key(explicit: Option<String>) -> Result<String> {
    explicit
        .filter(|k| !k.is_empty())
        .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
        .ok_or_else(|| {
            Error::Config(
                "an OpenAI API key is required; supply it with --api-key or the \
                 OPENAI_API_KEY environment variable"
                    .to_string(),
            )
        })
}
