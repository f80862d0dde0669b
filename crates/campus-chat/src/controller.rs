//! The chat controller: one application state object per page.
//!
//! Owns the transcript, the query tracker, the theme and the panel, and
//! drives the backend, the spatial adapters and the speech capabilities.
//! Shared state sits behind `std::sync::Mutex` guards that are always
//! released before an `.await`. Rendering is serialized by a separate async
//! guard so that only the latest query's response stays on the surfaces.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use campus_client::QueryBackend;
use campus_core::config::{CampusConfig, Surface};
use campus_core::types::{QueryRequest, QueryResponse};
use campus_render::{RenderError, SpatialAdapter};

use crate::error::ChatError;
use crate::events::{ChatEvent, EVENT_CHANNEL_CAPACITY};
use crate::query::{QueryState, QueryTicket, QueryTracker};
use crate::reply::{
    compose_reply, welcome_text, FAILURE_TEXT, MAP_CONFIG_ERROR_TEXT, ROUTE_FAILURE_TEXT,
    SUPERSEDED_TEXT, THINKING_TEXT,
};
use crate::speech::{clean_for_speech, MicState, SpeechRecognizer, SpeechSynthesizer, VoiceInput};
use crate::theme::{load_theme, save_theme, PreferenceStore, Theme};
use crate::transcript::{ChatMessage, MessageId, Sender, Transcript};

/// Per-controller settings.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub surface: Surface,
    pub language: String,
    /// Read each final reply aloud.
    pub auto_speak: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            surface: Surface::Map,
            language: "en-US".to_string(),
            auto_speak: false,
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &CampusConfig) -> Self {
        Self {
            surface: config.general.surface,
            language: config.speech.language.clone(),
            auto_speak: config.speech.auto_speak,
        }
    }
}

/// How a submitted query ended.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The response was applied to the transcript and the surfaces.
    Rendered(QueryResponse),
    /// The placeholder shows the failure text.
    Failed(String),
    /// A newer query was submitted before this one returned.
    Superseded,
}

pub struct ChatController {
    backend: Arc<dyn QueryBackend>,
    adapters: Vec<Arc<dyn SpatialAdapter>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    preferences: Arc<dyn PreferenceStore>,
    options: ControllerOptions,
    transcript: Mutex<Transcript>,
    tracker: Mutex<QueryTracker>,
    voice: Mutex<VoiceInput>,
    theme: Mutex<Theme>,
    panel_collapsed: AtomicBool,
    render_guard: tokio::sync::Mutex<()>,
    event_tx: broadcast::Sender<ChatEvent>,
}

impl ChatController {
    pub fn new(
        backend: Arc<dyn QueryBackend>,
        preferences: Arc<dyn PreferenceStore>,
        options: ControllerOptions,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let voice = VoiceInput::new(options.language.clone());
        Self {
            backend,
            adapters: Vec::new(),
            synthesizer: None,
            recognizer: None,
            preferences,
            options,
            transcript: Mutex::new(Transcript::new()),
            tracker: Mutex::new(QueryTracker::new()),
            voice: Mutex::new(voice),
            theme: Mutex::new(Theme::Light),
            panel_collapsed: AtomicBool::new(false),
            render_guard: tokio::sync::Mutex::new(()),
            event_tx,
        }
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn SpatialAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn surface(&self) -> Surface {
        self.options.surface
    }

    /// Receive every transcript, theme, panel and microphone change.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    /// Whether the microphone control should be shown.
    pub fn voice_input_available(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Whether the speaker controls should be shown.
    pub fn voice_output_available(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.transcript).messages().to_vec()
    }

    pub fn scroll_position(&self) -> Option<usize> {
        lock(&self.transcript).scroll_position()
    }

    pub fn theme(&self) -> Theme {
        *lock(&self.theme)
    }

    pub fn panel_collapsed(&self) -> bool {
        self.panel_collapsed.load(Ordering::SeqCst)
    }

    pub fn mic_state(&self) -> MicState {
        lock(&self.voice).state()
    }

    pub fn query_state(&self, message_id: MessageId) -> QueryState {
        lock(&self.tracker).state_of(message_id)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Apply the saved theme, bring every surface up and post the welcome
    /// message.
    pub async fn init(&self) -> Result<(), ChatError> {
        let theme = load_theme(self.preferences.as_ref());
        *lock(&self.theme) = theme;
        self.publish(ChatEvent::theme_changed(theme));

        let needs_key = self.adapters.iter().any(|a| a.requires_api_key());
        let api_key = if needs_key {
            match self.backend.fetch_config().await {
                Ok(config) => Some(config.api_key),
                Err(e) => {
                    warn!(error = %e, "Failed to load map configuration");
                    None
                }
            }
        } else {
            None
        };

        for adapter in &self.adapters {
            if adapter.requires_api_key() && api_key.is_none() {
                adapter.show_unavailable(MAP_CONFIG_ERROR_TEXT).await;
                continue;
            }
            if let Err(e) = adapter.initialize(api_key.as_deref()).await {
                warn!(adapter = adapter.name(), error = %e, "Surface failed to initialize");
                if adapter.requires_api_key() {
                    adapter.show_unavailable(MAP_CONFIG_ERROR_TEXT).await;
                }
            }
        }

        self.append(Sender::Bot, welcome_text(self.options.surface));
        info!(
            surface = %self.options.surface,
            adapters = self.adapters.len(),
            voice_input = self.voice_input_available(),
            "Chat controller ready"
        );
        Ok(())
    }

    /// Silence speech and release every surface's recurring work.
    pub async fn teardown(&self) {
        self.stop_speaking();
        for adapter in &self.adapters {
            adapter.teardown().await;
        }
        info!("Chat controller torn down");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Submit typed text. Whitespace-only input is rejected before anything
    /// is shown or sent.
    pub async fn submit(&self, text: &str) -> Result<QueryOutcome, ChatError> {
        let request = QueryRequest::new(text, self.options.surface.is_3d())
            .ok_or(ChatError::EmptyMessage)?;

        self.stop_speaking();
        for adapter in &self.adapters {
            adapter.highlight_query(&request.query).await;
        }

        self.append(Sender::User, &request.query);
        let ticket = self.begin_query()?;
        info!(query = %request.query, message_id = %ticket.message_id, "Query submitted");

        let result = self.backend.query(&request).await;

        // Held until the placeholder is resolved.
        let _rendering = self.render_guard.lock().await;
        if !self.is_latest(&ticket) {
            debug!(message_id = %ticket.message_id, "Discarding response to superseded query");
            self.finish(&ticket, QueryState::Superseded, SUPERSEDED_TEXT)?;
            return Ok(QueryOutcome::Superseded);
        }

        match result {
            Ok(response) => self.render(&ticket, response).await,
            Err(e) => {
                warn!(query = %request.query, error = %e, "Query failed");
                self.finish(&ticket, QueryState::Failed, FAILURE_TEXT)?;
                Ok(QueryOutcome::Failed(e.to_string()))
            }
        }
    }

    /// A hotspot was clicked: expand the chat panel and ask about it.
    pub async fn submit_hotspot(&self, name: &str) -> Result<QueryOutcome, ChatError> {
        if self.panel_collapsed() {
            self.set_panel_collapsed(false).await;
        }
        self.submit(name).await
    }

    /// Listen for one utterance and submit it.
    ///
    /// Returns `Ok(None)` when recognition is unavailable, fails, or hears
    /// nothing; the microphone is back to idle in every case.
    pub async fn listen_and_submit(&self) -> Result<Option<QueryOutcome>, ChatError> {
        let Some(recognizer) = self.recognizer.clone() else {
            return Ok(None);
        };

        self.stop_speaking();
        let language = {
            let mut voice = lock(&self.voice);
            voice.start_listening()?;
            voice.language.clone()
        };
        self.publish(ChatEvent::MicStateChanged {
            state: MicState::Listening,
        });

        let heard = recognizer.recognize_once(&language).await;

        let stopped = lock(&self.voice).stop_listening();
        if let Err(e) = stopped {
            warn!(error = %e, "Microphone state out of sync");
        }
        self.publish(ChatEvent::MicStateChanged {
            state: MicState::Idle,
        });

        match heard {
            Ok(Some(text)) if !text.trim().is_empty() => {
                debug!(chars = text.len(), "Speech recognized");
                self.submit(&text).await.map(Some)
            }
            Ok(_) => {
                debug!("Speech ended without a result");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "Speech recognition failed");
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Speech output
    // =========================================================================

    /// Read a bot message aloud, cancelling anything already playing.
    pub fn speak_message(&self, index: usize) -> Result<(), ChatError> {
        let text = {
            let transcript = lock(&self.transcript);
            let message = transcript.get(index).ok_or(ChatError::NotABotMessage(index))?;
            if message.sender != Sender::Bot {
                return Err(ChatError::NotABotMessage(index));
            }
            message.text.clone()
        };
        self.speak(&text);
        Ok(())
    }

    pub fn stop_speaking(&self) {
        if let Some(synthesizer) = &self.synthesizer {
            synthesizer.cancel();
        }
    }

    fn speak(&self, text: &str) {
        let Some(synthesizer) = &self.synthesizer else {
            return;
        };
        let cleaned = clean_for_speech(text);
        synthesizer.cancel();
        if !cleaned.is_empty() {
            synthesizer.speak(&cleaned, &self.options.language);
        }
    }

    // =========================================================================
    // Panel & theme
    // =========================================================================

    /// Flip the theme, persist it and publish the new visual class.
    ///
    /// Nothing changes when the preference cannot be saved.
    pub fn toggle_theme(&self) -> Result<Theme, ChatError> {
        let mut current = lock(&self.theme);
        let theme = current.toggled();
        save_theme(self.preferences.as_ref(), theme)?;
        *current = theme;
        drop(current);
        self.publish(ChatEvent::theme_changed(theme));
        Ok(theme)
    }

    /// Collapse or expand the chat panel. Returns the new collapsed state.
    pub async fn toggle_panel(&self) -> bool {
        let collapsed = !self.panel_collapsed();
        self.set_panel_collapsed(collapsed).await;
        collapsed
    }

    async fn set_panel_collapsed(&self, collapsed: bool) {
        self.panel_collapsed.store(collapsed, Ordering::SeqCst);
        self.publish(ChatEvent::PanelToggled { collapsed });
        for adapter in &self.adapters {
            adapter.on_layout_change().await;
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Apply a response to the surfaces and the transcript. Callers hold the
    /// render guard.
    async fn render(
        &self,
        ticket: &QueryTicket,
        response: QueryResponse,
    ) -> Result<QueryOutcome, ChatError> {
        if response.is_spatial() {
            self.clear_surfaces().await;
        }

        let mut route_failed = false;
        match &response {
            QueryResponse::Location(location) => {
                for adapter in &self.adapters {
                    if let Err(e) = adapter.show_location(location).await {
                        warn!(adapter = adapter.name(), error = %e, "Failed to show location");
                    }
                }
            }
            QueryResponse::Route(route) => {
                for adapter in &self.adapters {
                    match adapter.show_route(route).await {
                        Ok(()) => {}
                        Err(RenderError::RouteFailed(reason)) => {
                            warn!(adapter = adapter.name(), %reason, "Route could not be calculated");
                            route_failed = true;
                        }
                        Err(e) => {
                            warn!(adapter = adapter.name(), error = %e, "Failed to show route");
                        }
                    }
                }
            }
            _ => {}
        }

        // A newer query may have been submitted while the surfaces were busy.
        if !self.is_latest(ticket) {
            debug!(message_id = %ticket.message_id, "Query superseded while rendering");
            if response.is_spatial() {
                self.clear_surfaces().await;
            }
            self.finish(ticket, QueryState::Superseded, SUPERSEDED_TEXT)?;
            return Ok(QueryOutcome::Superseded);
        }

        let reply = compose_reply(&response, self.options.surface);
        self.finish(ticket, QueryState::Rendered, &reply)?;
        if route_failed {
            self.append(Sender::Bot, ROUTE_FAILURE_TEXT);
        }
        if self.options.auto_speak {
            self.speak(&reply);
        }
        info!(kind = response.kind(), message_id = %ticket.message_id, "Response rendered");
        Ok(QueryOutcome::Rendered(response))
    }

    async fn clear_surfaces(&self) {
        for adapter in &self.adapters {
            if let Err(e) = adapter.clear().await {
                warn!(adapter = adapter.name(), error = %e, "Failed to clear surface");
            }
        }
    }

    fn is_latest(&self, ticket: &QueryTicket) -> bool {
        lock(&self.tracker).is_latest(ticket)
    }

    fn begin_query(&self) -> Result<QueryTicket, ChatError> {
        let (index, id) = lock(&self.transcript).push_placeholder(THINKING_TEXT);
        self.publish_message(index, false);
        lock(&self.tracker).begin(id)
    }

    fn finish(&self, ticket: &QueryTicket, state: QueryState, text: &str) -> Result<(), ChatError> {
        let index = lock(&self.transcript).resolve(ticket.message_id, text)?;
        lock(&self.tracker).finish(ticket, state)?;
        self.publish_message(index, true);
        Ok(())
    }

    fn append(&self, sender: Sender, text: &str) -> usize {
        let index = lock(&self.transcript).push(sender, text);
        self.publish_message(index, false);
        index
    }

    fn publish_message(&self, index: usize, updated: bool) {
        let message = lock(&self.transcript).get(index).cloned();
        if let Some(message) = message {
            self.publish(if updated {
                ChatEvent::MessageUpdated { index, message }
            } else {
                ChatEvent::MessageAppended { index, message }
            });
        }
    }

    fn publish(&self, event: ChatEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
