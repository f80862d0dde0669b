//! Spoken input and output.
//!
//! Recognition and synthesis are platform capabilities behind
//! [`SpeechRecognizer`] and [`SpeechSynthesizer`]. Either may be absent, in
//! which case the controller hides the corresponding control.

use std::collections::VecDeque;
use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use crate::error::ChatError;

static BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("Invalid break regex"));

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid markup regex"));

static EMOJI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{1F300}-\x{1FAFF}\x{2600}-\x{27BF}]").expect("Invalid emoji regex")
});

static SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Reduce a chat message to plain text suitable for a voice.
///
/// `<br>` becomes a sentence break, other tags and pictographic emoji are
/// dropped, and whitespace is collapsed.
pub fn clean_for_speech(text: &str) -> String {
    let text = BREAK_TAG.replace_all(text, ". ");
    let text = MARKUP_TAG.replace_all(&text, "");
    let text = EMOJI.replace_all(&text, "");
    let text = text.replace('\u{FE0F}', "");
    SPACES.replace_all(&text, " ").trim().to_string()
}

/// Text-to-speech. At most one utterance plays at a time.
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, text: &str, language: &str);

    /// Cancel any in-flight utterance. A no-op when silent.
    fn cancel(&self);
}

/// Single-shot speech-to-text.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Listen for one utterance. `Ok(None)` means speech ended without a
    /// result.
    async fn recognize_once(&self, language: &str) -> Result<Option<String>, ChatError>;
}

// =============================================================================
// Microphone state
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MicState {
    Idle,
    Listening,
}

impl std::fmt::Display for MicState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MicState::Idle => write!(f, "Idle"),
            MicState::Listening => write!(f, "Listening"),
        }
    }
}

/// Tracks the microphone button.
#[derive(Debug)]
pub struct VoiceInput {
    pub language: String,
    state: MicState,
}

impl VoiceInput {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            state: MicState::Idle,
        }
    }

    pub fn state(&self) -> MicState {
        self.state
    }

    pub fn start_listening(&mut self) -> Result<(), ChatError> {
        if self.state == MicState::Listening {
            return Err(ChatError::VoiceError(
                "Voice capture is already active".to_string(),
            ));
        }
        self.state = MicState::Listening;
        Ok(())
    }

    pub fn stop_listening(&mut self) -> Result<(), ChatError> {
        if self.state != MicState::Listening {
            return Err(ChatError::VoiceError(
                "Voice capture is not active".to_string(),
            ));
        }
        self.state = MicState::Idle;
        Ok(())
    }
}

// =============================================================================
// Recording implementations
// =============================================================================

/// What a [`RecordingSynthesizer`] has been asked to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesizerLog {
    pub spoken: Vec<String>,
    pub cancels: usize,
    pub speaking: bool,
}

/// Synthesizer that records utterances instead of playing them.
#[derive(Debug, Clone, Default)]
pub struct RecordingSynthesizer {
    log: Arc<Mutex<SynthesizerLog>>,
}

impl RecordingSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> SynthesizerLog {
        match self.log.lock() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn with_log(&self, f: impl FnOnce(&mut SynthesizerLog)) {
        match self.log.lock() {
            Ok(mut g) => f(&mut g),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn speak(&self, text: &str, language: &str) {
        tracing::info!(language, chars = text.len(), "speech: speaking");
        self.with_log(|log| {
            log.spoken.push(text.to_string());
            log.speaking = true;
        });
    }

    fn cancel(&self) {
        self.with_log(|log| {
            log.cancels += 1;
            log.speaking = false;
        });
    }
}

/// Recognizer that replays queued results in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRecognizer {
    results: Arc<Mutex<VecDeque<Result<Option<String>, String>>>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_transcript(&self, text: &str) {
        self.push(Ok(Some(text.to_string())));
    }

    pub fn push_silence(&self) {
        self.push(Ok(None));
    }

    pub fn push_error(&self, message: &str) {
        self.push(Err(message.to_string()));
    }

    fn push(&self, result: Result<Option<String>, String>) {
        match self.results.lock() {
            Ok(mut q) => q.push_back(result),
            Err(poisoned) => poisoned.into_inner().push_back(result),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize_once(&self, _language: &str) -> Result<Option<String>, ChatError> {
        let next = match self.results.lock() {
            Ok(mut q) => q.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        };
        match next {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(ChatError::VoiceError(message)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // clean_for_speech
    // =========================================================================

    #[test]
    fn test_clean_replaces_breaks() {
        assert_eq!(
            clean_for_speech("Library is marked.<br><br>Open late"),
            "Library is marked.. . Open late"
        );
        assert_eq!(clean_for_speech("a<BR/>b"), "a. b");
    }

    #[test]
    fn test_clean_strips_tags() {
        assert_eq!(
            clean_for_speech("<span class='thinking'>Hello</span> <b>there</b>"),
            "Hello there"
        );
    }

    #[test]
    fn test_clean_strips_emoji() {
        assert_eq!(
            clean_for_speech("📍 Library is marked on the map."),
            "Library is marked on the map."
        );
        assert_eq!(clean_for_speech("🗺️ Showing route"), "Showing route");
        assert_eq!(clean_for_speech("☀ sunny ✨"), "sunny");
        assert_eq!(clean_for_speech("😥 Sorry"), "Sorry");
    }

    #[test]
    fn test_clean_keeps_plain_text() {
        assert_eq!(clean_for_speech("  The PSB is open.  "), "The PSB is open.");
        assert_eq!(clean_for_speech(""), "");
    }

    // =========================================================================
    // VoiceInput
    // =========================================================================

    #[test]
    fn test_voice_input_starts_idle() {
        let vi = VoiceInput::new("en-US");
        assert_eq!(vi.state(), MicState::Idle);
        assert_eq!(vi.language, "en-US");
    }

    #[test]
    fn test_double_start_listening_returns_error() {
        let mut vi = VoiceInput::new("en-US");
        vi.start_listening().unwrap();
        let err = vi.start_listening().unwrap_err();
        assert!(err.to_string().contains("already active"));
        assert_eq!(vi.state(), MicState::Listening);
    }

    #[test]
    fn test_stop_listening_when_not_active() {
        let mut vi = VoiceInput::new("en-US");
        let err = vi.stop_listening().unwrap_err();
        assert!(err.to_string().contains("not active"));
    }

    #[test]
    fn test_listen_cycle() {
        let mut vi = VoiceInput::new("en-US");
        vi.start_listening().unwrap();
        vi.stop_listening().unwrap();
        assert_eq!(vi.state(), MicState::Idle);
        vi.start_listening().unwrap();
    }

    // =========================================================================
    // Recording implementations
    // =========================================================================

    #[test]
    fn test_recording_synthesizer() {
        let synth = RecordingSynthesizer::new();
        synth.speak("hello", "en-US");
        assert!(synth.log().speaking);
        synth.cancel();
        let log = synth.log();
        assert_eq!(log.spoken, vec!["hello".to_string()]);
        assert_eq!(log.cancels, 1);
        assert!(!log.speaking);
    }

    #[tokio::test]
    async fn test_scripted_recognizer_replays_in_order() {
        let rec = ScriptedRecognizer::new();
        rec.push_transcript("where is the library");
        rec.push_silence();
        rec.push_error("no-speech");

        assert_eq!(
            rec.recognize_once("en-US").await.unwrap().as_deref(),
            Some("where is the library")
        );
        assert_eq!(rec.recognize_once("en-US").await.unwrap(), None);
        assert!(rec.recognize_once("en-US").await.is_err());
        assert_eq!(rec.recognize_once("en-US").await.unwrap(), None);
    }
}
