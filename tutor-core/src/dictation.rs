/// Signals from a speech recognizer
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DictationEvent {
    ListeningStarted,
    /// Latest full transcript for the current listening session
    Transcript(String),
    ListeningEnded,
}

/// Turns recognizer signals into at most one submission per listening session.
#[derive(Debug, Default)]
pub struct Dictation {
    is_listening: bool,
    transcript: String,
    submitted: bool,
}

impl Dictation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_listening(&self) -> bool {
        self.is_listening
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Feed one event. Returns the transcript to submit on `ListeningEnded`,
    /// once, and only if it is not blank.
    pub fn handle(&mut self, event: DictationEvent) -> Option<String> {
        match event {
            DictationEvent::ListeningStarted => {
                self.is_listening = true;
                self.transcript.clear();
                self.submitted = false;
                None
            }
            DictationEvent::Transcript(text) => {
                if self.is_listening {
                    self.transcript = text;
                }
                None
            }
            DictationEvent::ListeningEnded => {
                let was_listening = std::mem::replace(&mut self.is_listening, false);
                if !was_listening || self.submitted || self.transcript.trim().is_empty() {
                    return None;
                }
                self.submitted = true;
                Some(self.transcript.trim().to_string())
            }
        }
    }
}
