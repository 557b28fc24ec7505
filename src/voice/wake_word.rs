//! Wake word matching
//!
//! Deliberately strict: a transcript activates the assistant only when it
//! is exactly the wake word (after trimming and case folding). Substring
//! matches would fire on ordinary conversation.

/// Configured wake word, normalized once at construction
#[derive(Debug, Clone)]
pub struct WakeWord {
    word: String,
}

impl WakeWord {
    /// Create a wake word matcher
    #[must_use]
    pub fn new(word: &str) -> Self {
        Self {
            word: word.trim().to_lowercase(),
        }
    }

    /// Check whether a transcript is the wake word.
    ///
    /// Matches iff `lower(trim(transcript)) == lower(wake_word)`.
    #[must_use]
    pub fn matches(&self, transcript: &str) -> bool {
        transcript.trim().to_lowercase() == self.word
    }

    /// The normalized wake word
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let wake = WakeWord::new("genius");

        assert!(wake.matches("genius"));
        assert!(wake.matches("Genius"));
        assert!(wake.matches("GENIUS"));
        assert!(wake.matches("  genius  "));
    }

    #[test]
    fn test_no_partial_match() {
        let wake = WakeWord::new("genius");

        assert!(!wake.matches("hey genius"));
        assert!(!wake.matches("genius, what's up?"));
        assert!(!wake.matches("geniuses"));
        assert!(!wake.matches(""));
    }

    #[test]
    fn test_normalized_at_construction() {
        let wake = WakeWord::new("  Hey Computer  ");

        assert_eq!(wake.as_str(), "hey computer");
        assert!(wake.matches("hey computer"));
        assert!(wake.matches("HEY COMPUTER"));
    }
}
