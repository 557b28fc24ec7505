//! Voice processing module
//!
//! Audio capture, wake word matching, transcription, synthesis, playback.

mod capture;
mod playback;
mod stt;
mod tts;
mod wake_word;

pub use capture::{
    AudioClip, Listen, ListenOptions, Microphone, SAMPLE_RATE, calculate_energy, samples_to_wav,
};
pub use playback::{AudioPlayback, Speak, Speaker};
pub use stt::{SpeechToText, Transcribe, Transcript};
pub use tts::TextToSpeech;
pub use wake_word::WakeWord;
