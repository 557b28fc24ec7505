//! Error types for the genie assistant

use thiserror::Error;

/// Result type alias for genie operations
pub type Result<T> = std::result::Result<T, Error>;

/// How bad a failure is, from the interaction loop's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Expected steady-state outcome of an always-listening loop
    /// (nobody spoke, microphone briefly unavailable)
    Transient,
    /// Aborts the current turn; the loop keeps running
    Recoverable,
    /// Prevents the assistant from starting at all
    Fatal,
}

/// Errors that can occur in the genie assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credential, invalid settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// No speech started before the listen timeout elapsed
    #[error("timed out waiting for speech")]
    ListenTimeout,

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Completion request built from a blank prompt
    #[error("prompt must contain text")]
    InvalidPrompt,

    /// Completion transport or service error
    #[error("completion error: {0}")]
    Completion(String),

    /// Completion response that carries no usable reply
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio playback error
    #[error("playback error: {0}")]
    Playback(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error for the loop's two-tier handling.
    ///
    /// Device and timeout failures are `Transient` because they are the
    /// normal background noise of an always-listening loop; the loop
    /// escalates them itself once the user has signalled intent.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Config(_) => Severity::Fatal,
            Self::Audio(_) | Self::ListenTimeout => Severity::Transient,
            _ => Severity::Recoverable,
        }
    }
}
