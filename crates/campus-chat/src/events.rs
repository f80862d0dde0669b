//! Events published by the controller for front-ends to render.

use serde::Serialize;

use crate::speech::MicState;
use crate::theme::Theme;
use crate::transcript::ChatMessage;

/// Capacity of the controller's broadcast channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    MessageAppended {
        index: usize,
        message: ChatMessage,
    },
    /// A placeholder was resolved in place.
    MessageUpdated {
        index: usize,
        message: ChatMessage,
    },
    ThemeChanged {
        theme: Theme,
        css_class: Option<String>,
    },
    MicStateChanged {
        state: MicState,
    },
    PanelToggled {
        collapsed: bool,
    },
}

impl ChatEvent {
    pub fn theme_changed(theme: Theme) -> Self {
        ChatEvent::ThemeChanged {
            theme,
            css_class: theme.css_class().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Transcript;

    #[test]
    fn test_event_serialization() {
        let event = ChatEvent::theme_changed(Theme::Dark);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "theme_changed");
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["css_class"], "dark-mode");

        let json = serde_json::to_value(ChatEvent::MicStateChanged {
            state: MicState::Listening,
        })
        .unwrap();
        assert_eq!(json["state"], "listening");
    }

    #[test]
    fn test_message_event_carries_message() {
        let mut t = Transcript::new();
        let index = t.push(crate::transcript::Sender::User, "where is the library");
        let event = ChatEvent::MessageAppended {
            index,
            message: t.get(index).unwrap().clone(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "message_appended");
        assert_eq!(json["message"]["sender"], "user");
        assert_eq!(json["message"]["text"], "where is the library");
    }
}
