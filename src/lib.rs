//! Genie - voice assistant that listens for a wake word and answers with OpenAI
//!
//! One synchronous interaction loop over four injected capabilities:
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 VoiceAssistant                    │
//! │  await wake word → capture → complete → speak    │
//! └──────┬──────────┬───────────┬───────────┬────────┘
//!        │          │           │           │
//!     Listen    Transcribe   Complete     Speak
//!    (cpal)     (Whisper)  (chat API)  (TTS + cpal)
//! ```
//!
//! Any single failed step degrades back to waiting for the wake word; only
//! a missing credential at startup is fatal.

pub mod assistant;
pub mod completion;
pub mod config;
pub mod error;
pub mod voice;

pub use assistant::VoiceAssistant;
pub use completion::{Complete, CompletionClient};
pub use config::{AssistantConfig, resolve_api_key};
pub use error::{Error, Result, Severity};
