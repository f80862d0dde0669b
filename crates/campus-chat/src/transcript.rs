//! Append-only chat transcript with single-shot placeholder resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ChatError;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "User"),
            Sender::Bot => write!(f, "Bot"),
        }
    }
}

/// Stable identifier of a message that will be resolved later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bot-msg-{}", self.0)
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Option<MessageId>,
    pub sender: Sender,
    pub text: String,
    /// True while this is an unresolved placeholder.
    pub pending: bool,
    pub created_at: DateTime<Utc>,
}

/// Ordered, append-only message list.
///
/// The only mutation is [`Transcript::resolve`], allowed once per message
/// created with an id. The scroll position always points at the newest
/// message.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
    scroll_position: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished message and return its index.
    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> usize {
        self.append(ChatMessage {
            id: None,
            sender,
            text: text.into(),
            pending: false,
            created_at: Utc::now(),
        })
    }

    /// Append a bot placeholder that must later be resolved.
    pub fn push_placeholder(&mut self, text: impl Into<String>) -> (usize, MessageId) {
        let id = MessageId::new();
        let index = self.append(ChatMessage {
            id: Some(id),
            sender: Sender::Bot,
            text: text.into(),
            pending: true,
            created_at: Utc::now(),
        });
        (index, id)
    }

    /// Replace a placeholder's text. Fails if the id is unknown or the
    /// message was already resolved.
    pub fn resolve(&mut self, id: MessageId, text: impl Into<String>) -> Result<usize, ChatError> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id == Some(id))
            .ok_or(ChatError::MessageNotFound(id))?;
        let message = &mut self.messages[index];
        if !message.pending {
            return Err(ChatError::AlreadyResolved(id));
        }
        message.text = text.into();
        message.pending = false;
        self.scroll_to_latest();
        Ok(index)
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of placeholders still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.pending).count()
    }

    /// Index the view is scrolled to.
    pub fn scroll_position(&self) -> Option<usize> {
        self.scroll_position
    }

    fn append(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.scroll_to_latest();
        self.messages.len() - 1
    }

    fn scroll_to_latest(&mut self) {
        self.scroll_position = self.messages.len().checked_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_appends_in_order() {
        let mut t = Transcript::new();
        assert!(t.is_empty());
        assert_eq!(t.scroll_position(), None);

        assert_eq!(t.push(Sender::User, "hi"), 0);
        assert_eq!(t.push(Sender::Bot, "hello"), 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0).unwrap().sender, Sender::User);
        assert_eq!(t.get(1).unwrap().text, "hello");
        assert_eq!(t.scroll_position(), Some(1));
    }

    #[test]
    fn test_placeholder_resolves_once() {
        let mut t = Transcript::new();
        let (index, id) = t.push_placeholder("Thinking");
        assert!(t.get(index).unwrap().pending);
        assert_eq!(t.pending_count(), 1);

        assert_eq!(t.resolve(id, "Done").unwrap(), index);
        let msg = t.get(index).unwrap();
        assert_eq!(msg.text, "Done");
        assert!(!msg.pending);
        assert_eq!(t.pending_count(), 0);

        let err = t.resolve(id, "Again").unwrap_err();
        assert!(matches!(err, ChatError::AlreadyResolved(_)));
        assert_eq!(t.get(index).unwrap().text, "Done");
    }

    #[test]
    fn test_resolve_unknown_id() {
        let mut t = Transcript::new();
        t.push(Sender::User, "hi");
        let err = t.resolve(MessageId::new(), "x").unwrap_err();
        assert!(matches!(err, ChatError::MessageNotFound(_)));
    }

    #[test]
    fn test_resolving_older_message_keeps_scroll_at_latest() {
        let mut t = Transcript::new();
        let (_, first) = t.push_placeholder("Thinking");
        t.push(Sender::User, "second question");
        let (_, _second) = t.push_placeholder("Thinking");
        t.resolve(first, "first answer").unwrap();
        assert_eq!(t.scroll_position(), Some(2));
    }

    #[test]
    fn test_message_ids_are_unique() {
        let mut t = Transcript::new();
        let (_, a) = t.push_placeholder("…");
        let (_, b) = t.push_placeholder("…");
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("bot-msg-"));
    }

    #[test]
    fn test_sender_display() {
        assert_eq!(Sender::User.to_string(), "User");
        assert_eq!(Sender::Bot.to_string(), "Bot");
    }
}
