//! The interaction loop
//!
//! Wait for the wake word, capture a question, generate a reply, speak it.
//! Every capability is injected, so the loop itself carries no I/O beyond
//! what its collaborators do.

use crate::completion::Complete;
use crate::config::AssistantConfig;
use crate::voice::{Listen, ListenOptions, Speak, Transcribe, WakeWord};
use crate::Severity;

/// Speech-driven assistant that delegates answers to a completion service.
///
/// Each loop iteration starts from a clean state: no audio or transcript
/// survives a turn. A failed step aborts the turn, never the process; only
/// an interrupt (or `once`) ends the run.
pub struct VoiceAssistant<L, T, C, S> {
    wake_word: WakeWord,
    listen_opts: ListenOptions,
    microphone: L,
    transcriber: T,
    completions: C,
    speaker: S,
}

impl<L, T, C, S> VoiceAssistant<L, T, C, S>
where
    L: Listen,
    T: Transcribe,
    C: Complete,
    S: Speak,
{
    /// Create an assistant from its configuration and capabilities
    pub fn new(
        config: &AssistantConfig,
        microphone: L,
        transcriber: T,
        completions: C,
        speaker: S,
    ) -> Self {
        Self {
            wake_word: WakeWord::new(&config.wake_word),
            listen_opts: ListenOptions::from_config(config),
            microphone,
            transcriber,
            completions,
            speaker,
        }
    }

    /// Run the interaction loop until interrupted.
    ///
    /// With `once`, the loop exits after the first iteration that advances
    /// past the wake word, whether or not that turn succeeds.
    pub async fn run(&mut self, once: bool) {
        tracing::info!(
            wake_word = self.wake_word.as_str(),
            "starting voice assistant"
        );

        let mut interrupt = Box::pin(tokio::signal::ctrl_c());

        loop {
            // The interrupt is observed only here, at the top of the loop;
            // a turn in progress runs to completion.
            let woken = tokio::select! {
                _ = &mut interrupt => {
                    tracing::info!("received interrupt; shutting down");
                    break;
                }
                woken = self.await_wake_word() => woken,
            };

            if !woken {
                continue;
            }

            self.take_turn().await;

            if once {
                break;
            }
        }
    }

    /// Listen once and report whether the wake word was spoken.
    ///
    /// Timeouts, a missing device, and unusable transcripts are the
    /// steady state of an always-listening loop; none of them escalate.
    async fn await_wake_word(&mut self) -> bool {
        println!(
            "Say '{}' to start recording your question...",
            self.wake_word.as_str()
        );

        let clip = match self.microphone.listen(&self.listen_opts) {
            Ok(clip) => clip,
            Err(e) if e.severity() == Severity::Transient => {
                tracing::debug!(error = %e, "wake word listen ended without speech");
                return false;
            }
            Err(e) => {
                tracing::error!(error = %e, "wake word listen failed");
                return false;
            }
        };

        match self.transcriber.transcribe(&clip).await.text() {
            Some(text) => {
                tracing::debug!(transcript = text, "wake-word transcription");
                self.wake_word.matches(text)
            }
            None => false,
        }
    }

    /// One turn past the wake word: capture the question, generate the
    /// reply, speak it. Failures abort the turn, never the run.
    async fn take_turn(&mut self) {
        println!("Keyword detected. Ask your question after the tone!");

        // The user has signalled intent, so a timeout or device failure is
        // now a recoverable error rather than background noise.
        let clip = match self.microphone.listen(&self.listen_opts) {
            Ok(clip) => clip,
            Err(e) => {
                tracing::error!(error = %e, "could not capture question");
                return;
            }
        };

        // Discard blank transcripts here, whatever the transcriber does:
        // a whitespace-only question must never reach generation.
        let transcript = self.transcriber.transcribe(&clip).await;
        let question = match transcript.text() {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                tracing::warn!("no speech detected after keyword; waiting again");
                return;
            }
        };

        tracing::info!(question, "user said");

        let reply = match self.completions.complete(question).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch completion");
                return;
            }
        };

        tracing::info!(reply, "assistant reply");
        self.speak_reply(&reply).await;
    }

    /// Speak a reply, skipping blank text and swallowing audio failures
    async fn speak_reply(&mut self, reply: &str) {
        if reply.trim().is_empty() {
            tracing::debug!("skipping empty reply");
            return;
        }

        if let Err(e) = self.speaker.speak(reply).await {
            tracing::error!(error = %e, "failed to speak reply");
        }
    }
}
