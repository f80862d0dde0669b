//! campusnav binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Build the backend client and the surfaces for the chosen mode
//! 3. Run the chat controller behind an interactive terminal loop
//!
//! The surfaces are headless: the map and the 3D viewer log what they would
//! display.

mod cli;
mod commands;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use campus_chat::{
    ChatController, ChatEvent, ControllerOptions, FilePreferenceStore, Sender, SpeechSynthesizer,
};
use campus_client::HttpBackend;
use campus_core::config::{CampusConfig, Surface};
use campus_core::types::LatLng;
use campus_render::{
    HotspotCatalog, InMemoryMap, InMemoryViewer, MapAdapter, SpatialAdapter, TourAdapter,
    ViewerAdapter,
};

use cli::CliArgs;
use commands::{Command, HELP_TEXT};

/// Speaks by printing the cleaned utterance.
struct ConsoleSynthesizer;

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn speak(&self, text: &str, language: &str) {
        println!("  (speaking, {}) {}", language, text);
    }

    fn cancel(&self) {
        tracing::trace!("speech cancelled");
    }
}

fn build_adapters(surface: Surface, config: &CampusConfig) -> Vec<Arc<dyn SpatialAdapter>> {
    let catalog = HotspotCatalog::from_config(&config.viewer.hotspots);
    match surface {
        Surface::Map => {
            let map = MapAdapter::new(InMemoryMap::new(), config.map.clone());
            vec![Arc::new(map) as Arc<dyn SpatialAdapter>]
        }
        Surface::Model => {
            let viewer = ViewerAdapter::new(InMemoryViewer::new(), catalog);
            vec![Arc::new(viewer) as Arc<dyn SpatialAdapter>]
        }
        Surface::Tour => {
            // The tour flies over the same model the marker is placed on.
            let viewer = InMemoryViewer::new();
            let origin = LatLng::new(config.map.center_lat, config.map.center_lng);
            let marker = ViewerAdapter::new(viewer.clone(), catalog.clone());
            let tour = TourAdapter::new(viewer, catalog, origin, config.tour.clone());
            vec![
                Arc::new(marker) as Arc<dyn SpatialAdapter>,
                Arc::new(tour) as Arc<dyn SpatialAdapter>,
            ]
        }
    }
}

/// Print transcript changes as they are published.
async fn print_events(mut events: tokio::sync::broadcast::Receiver<ChatEvent>) {
    use tokio::sync::broadcast::error::RecvError;

    loop {
        match events.recv().await {
            Ok(ChatEvent::MessageAppended { index, message })
            | Ok(ChatEvent::MessageUpdated { index, message }) => {
                let who = match message.sender {
                    Sender::User => "you",
                    Sender::Bot => "bot",
                };
                let text = if message.pending {
                    format!("{}...", message.text)
                } else {
                    message.text.replace("<br>", "\n      ")
                };
                println!("[{}] {}: {}", index, who, text);
            }
            Ok(ChatEvent::ThemeChanged { theme, css_class }) => {
                println!("(theme: {}, class: {})", theme, css_class.unwrap_or_default());
            }
            Ok(ChatEvent::PanelToggled { collapsed }) => {
                println!("(chat panel {})", if collapsed { "collapsed" } else { "expanded" });
            }
            Ok(ChatEvent::MicStateChanged { state }) => {
                println!("(microphone: {})", state);
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Parsed before tracing so the file can set the log level.
    let config_file = args.resolve_config_path();
    let loaded = CampusConfig::load(&config_file);
    let log_level = args.resolve_log_level(
        loaded
            .as_ref()
            .ok()
            .map(|c| c.general.log_level.as_str()),
    );

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    tracing::info!("Starting campusnav v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %config_file.display(), error = %e, "Using default configuration");
            CampusConfig::default()
        }
    };
    config.backend.base_url = args.resolve_backend(&config.backend.base_url);
    config.general.surface = args.resolve_surface(config.general.surface);
    let surface = config.general.surface;

    // Backend.
    let backend = match HttpBackend::new(&config.backend) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build backend client");
            return Err(e.into());
        }
    };
    tracing::info!(backend = %backend.base_url(), surface = %surface, "Backend configured");

    // Controller.
    let preferences = FilePreferenceStore::new(&config.ui.preferences_path);
    let mut controller = ChatController::new(
        Arc::new(backend),
        Arc::new(preferences),
        ControllerOptions::from_config(&config),
    )
    .with_synthesizer(Arc::new(ConsoleSynthesizer));
    for adapter in build_adapters(surface, &config) {
        controller = controller.with_adapter(adapter);
    }
    let controller = Arc::new(controller);

    let printer = tokio::spawn(print_events(controller.subscribe()));
    controller.init().await?;
    println!("{}", HELP_TEXT);

    // === Input loop ===

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Query(text) => {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    if let Err(e) = controller.submit(&text).await {
                        tracing::warn!(error = %e, "Query not submitted");
                    }
                });
            }
            Command::Hotspot(name) => {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    if let Err(e) = controller.submit_hotspot(&name).await {
                        tracing::warn!(error = %e, "Hotspot query not submitted");
                    }
                });
            }
            Command::Theme => {
                if let Err(e) = controller.toggle_theme() {
                    tracing::warn!(error = %e, "Failed to save theme");
                }
            }
            Command::Panel => {
                controller.toggle_panel().await;
            }
            Command::Speak(index) => {
                if let Err(e) = controller.speak_message(index) {
                    println!("{}", e);
                }
            }
            Command::Stop => controller.stop_speaking(),
            Command::Help => println!("{}", HELP_TEXT),
            Command::Invalid(message) => println!("{}", message),
            Command::Quit => break,
        }
    }

    controller.teardown().await;
    printer.abort();
    tracing::info!("campusnav stopped");
    Ok(())
}
