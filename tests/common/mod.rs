//! Deterministic mock capabilities for driving the interaction loop
//! without audio hardware or network access.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use genie::voice::{AudioClip, Listen, ListenOptions, SAMPLE_RATE, Speak, Transcribe, Transcript};
use genie::{Complete, Result};

/// A short, non-empty clip to stand in for recorded speech
pub fn clip() -> AudioClip {
    AudioClip {
        samples: vec![0.1; SAMPLE_RATE as usize / 10],
        sample_rate: SAMPLE_RATE,
    }
}

/// Microphone that replays a scripted sequence of listen outcomes
pub struct ScriptedMicrophone {
    outcomes: VecDeque<Result<AudioClip>>,
}

impl ScriptedMicrophone {
    pub fn new(outcomes: Vec<Result<AudioClip>>) -> Self {
        Self {
            outcomes: outcomes.into(),
        }
    }
}

impl Listen for ScriptedMicrophone {
    fn listen(&mut self, _opts: &ListenOptions) -> Result<AudioClip> {
        self.outcomes
            .pop_front()
            .expect("scripted microphone ran out of outcomes")
    }
}

/// Transcriber that replays a scripted sequence of transcripts
pub struct ScriptedTranscriber {
    transcripts: Mutex<VecDeque<Transcript>>,
}

impl ScriptedTranscriber {
    pub fn new(transcripts: Vec<Transcript>) -> Self {
        Self {
            transcripts: Mutex::new(transcripts.into()),
        }
    }

    pub fn text(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|t| Transcript::Text((*t).to_string()))
                .collect(),
        )
    }
}

#[async_trait]
impl Transcribe for ScriptedTranscriber {
    async fn transcribe(&self, _clip: &AudioClip) -> Transcript {
        self.transcripts
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted transcriber ran out of transcripts")
    }
}

/// Completion capability that records questions and replays scripted replies
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String>>>,
    questions: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            questions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the questions the loop sent for completion
    pub fn questions(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.questions)
    }
}

#[async_trait]
impl Complete for ScriptedCompletion {
    async fn complete(&self, question: &str) -> Result<String> {
        self.questions.lock().unwrap().push(question.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted completion ran out of replies")
    }
}

/// Speaker that records what it was asked to say
pub struct RecordingSpeaker {
    spoken: Arc<Mutex<Vec<String>>>,
    failures: VecDeque<genie::Error>,
}

impl Default for RecordingSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            failures: VecDeque::new(),
        }
    }

    /// Speaker whose next calls fail with the given errors
    pub fn failing(failures: Vec<genie::Error>) -> Self {
        Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
            failures: failures.into(),
        }
    }

    /// Handle to the texts spoken so far
    pub fn spoken(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.spoken)
    }
}

#[async_trait]
impl Speak for RecordingSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
