//! Chat controller for the campus navigator.
//!
//! Turns typed, spoken and hotspot input into backend queries and fans the
//! responses out to the transcript, the spatial surfaces and the speaker.
//! Only the latest submitted query is rendered; older responses resolve
//! their placeholder to a superseded notice.

pub mod controller;
pub mod error;
pub mod events;
pub mod query;
pub mod reply;
pub mod speech;
pub mod theme;
pub mod transcript;

pub use controller::{ChatController, ControllerOptions, QueryOutcome};
pub use error::ChatError;
pub use events::ChatEvent;
pub use query::{QueryState, QueryTicket, QueryTracker};
pub use speech::{
    clean_for_speech, MicState, RecordingSynthesizer, ScriptedRecognizer, SpeechRecognizer,
    SpeechSynthesizer, VoiceInput,
};
pub use theme::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Theme};
pub use transcript::{ChatMessage, MessageId, Sender, Transcript};
