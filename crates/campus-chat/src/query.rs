//! Per-query lifecycle and last-submitted-wins tracking.
//!
//! Valid transitions:
//! - Idle -> Sent (placeholder shown, request issued)
//! - Sent -> Rendered (response applied)
//! - Sent -> Failed (failure message shown)
//! - Sent -> Superseded (a newer query was submitted first)

use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::error::ChatError;
use crate::transcript::MessageId;

/// Lifecycle state of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryState {
    Idle,
    Sent,
    Rendered,
    Failed,
    Superseded,
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryState::Idle => write!(f, "Idle"),
            QueryState::Sent => write!(f, "Sent"),
            QueryState::Rendered => write!(f, "Rendered"),
            QueryState::Failed => write!(f, "Failed"),
            QueryState::Superseded => write!(f, "Superseded"),
        }
    }
}

impl QueryState {
    pub fn can_transition_to(&self, target: &QueryState) -> bool {
        matches!(
            (self, target),
            (QueryState::Idle, QueryState::Sent)
                | (QueryState::Sent, QueryState::Rendered)
                | (QueryState::Sent, QueryState::Failed)
                | (QueryState::Sent, QueryState::Superseded)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Rendered | QueryState::Failed | QueryState::Superseded
        )
    }
}

/// Tag attached to an in-flight request: the placeholder it will resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket {
    pub message_id: MessageId,
    pub seq: u64,
}

/// Finished queries whose outcome is still remembered.
pub const FINISHED_HISTORY: usize = 128;

/// Tracks query states and which query was submitted last.
///
/// In-flight queries are always tracked; only the most recent
/// [`FINISHED_HISTORY`] outcomes are kept, older ones read as `Idle`.
#[derive(Debug, Default)]
pub struct QueryTracker {
    next_seq: u64,
    latest: Option<QueryTicket>,
    states: HashMap<MessageId, QueryState>,
    finished: VecDeque<MessageId>,
}

impl QueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new query for `message_id` and make it the latest.
    pub fn begin(&mut self, message_id: MessageId) -> Result<QueryTicket, ChatError> {
        let current = self
            .states
            .get(&message_id)
            .copied()
            .unwrap_or(QueryState::Idle);
        if !current.can_transition_to(&QueryState::Sent) {
            return Err(ChatError::InvalidTransition(format!(
                "{} -> {}",
                current,
                QueryState::Sent
            )));
        }
        self.next_seq += 1;
        let ticket = QueryTicket {
            message_id,
            seq: self.next_seq,
        };
        self.states.insert(message_id, QueryState::Sent);
        self.latest = Some(ticket);
        tracing::debug!(message_id = %message_id, seq = ticket.seq, "Query sent");
        Ok(ticket)
    }

    /// Whether no query has been submitted after this one.
    pub fn is_latest(&self, ticket: &QueryTicket) -> bool {
        self.latest.as_ref() == Some(ticket)
    }

    /// Move a query to a terminal state.
    pub fn finish(&mut self, ticket: &QueryTicket, outcome: QueryState) -> Result<(), ChatError> {
        let current = self
            .states
            .get(&ticket.message_id)
            .copied()
            .unwrap_or(QueryState::Idle);
        if !outcome.is_terminal() || !current.can_transition_to(&outcome) {
            return Err(ChatError::InvalidTransition(format!(
                "{} -> {}",
                current, outcome
            )));
        }
        self.states.insert(ticket.message_id, outcome);
        self.finished.push_back(ticket.message_id);
        while self.finished.len() > FINISHED_HISTORY {
            if let Some(oldest) = self.finished.pop_front() {
                self.states.remove(&oldest);
            }
        }
        if self.is_latest(ticket) {
            self.latest = None;
        }
        tracing::debug!(message_id = %ticket.message_id, state = %outcome, "Query finished");
        Ok(())
    }

    pub fn state_of(&self, message_id: MessageId) -> QueryState {
        self.states
            .get(&message_id)
            .copied()
            .unwrap_or(QueryState::Idle)
    }

    /// Number of queries still waiting for a response.
    pub fn in_flight(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == QueryState::Sent)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(QueryState::Idle.can_transition_to(&QueryState::Sent));
        assert!(QueryState::Sent.can_transition_to(&QueryState::Rendered));
        assert!(QueryState::Sent.can_transition_to(&QueryState::Failed));
        assert!(QueryState::Sent.can_transition_to(&QueryState::Superseded));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!QueryState::Idle.can_transition_to(&QueryState::Rendered));
        assert!(!QueryState::Rendered.can_transition_to(&QueryState::Failed));
        assert!(!QueryState::Failed.can_transition_to(&QueryState::Sent));
        assert!(!QueryState::Sent.can_transition_to(&QueryState::Sent));
    }

    #[test]
    fn test_begin_and_finish() {
        let mut tracker = QueryTracker::new();
        let id = MessageId::new();
        let ticket = tracker.begin(id).unwrap();
        assert_eq!(tracker.state_of(id), QueryState::Sent);
        assert!(tracker.is_latest(&ticket));
        assert_eq!(tracker.in_flight(), 1);

        tracker.finish(&ticket, QueryState::Rendered).unwrap();
        assert_eq!(tracker.state_of(id), QueryState::Rendered);
        assert!(!tracker.is_latest(&ticket));
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn test_later_query_supersedes_earlier() {
        let mut tracker = QueryTracker::new();
        let first = tracker.begin(MessageId::new()).unwrap();
        let second = tracker.begin(MessageId::new()).unwrap();
        assert!(!tracker.is_latest(&first));
        assert!(tracker.is_latest(&second));
        assert!(second.seq > first.seq);

        // Finishing the stale one does not clear the latest marker.
        tracker.finish(&first, QueryState::Superseded).unwrap();
        assert!(tracker.is_latest(&second));
    }

    #[test]
    fn test_finish_twice_rejected() {
        let mut tracker = QueryTracker::new();
        let ticket = tracker.begin(MessageId::new()).unwrap();
        tracker.finish(&ticket, QueryState::Failed).unwrap();
        let err = tracker.finish(&ticket, QueryState::Rendered).unwrap_err();
        assert!(matches!(err, ChatError::InvalidTransition(_)));
    }

    #[test]
    fn test_finish_with_non_terminal_rejected() {
        let mut tracker = QueryTracker::new();
        let ticket = tracker.begin(MessageId::new()).unwrap();
        assert!(tracker.finish(&ticket, QueryState::Sent).is_err());
        assert!(tracker.finish(&ticket, QueryState::Idle).is_err());
    }

    #[test]
    fn test_finished_history_is_bounded() {
        let mut tracker = QueryTracker::new();
        let pending = tracker.begin(MessageId::new()).unwrap();
        let mut ids = Vec::new();
        for _ in 0..FINISHED_HISTORY + 10 {
            let ticket = tracker.begin(MessageId::new()).unwrap();
            tracker.finish(&ticket, QueryState::Rendered).unwrap();
            ids.push(ticket.message_id);
        }

        assert_eq!(tracker.states.len(), FINISHED_HISTORY + 1);
        assert_eq!(tracker.state_of(ids[0]), QueryState::Idle);
        assert_eq!(tracker.state_of(*ids.last().unwrap()), QueryState::Rendered);
        // Still in flight, so never evicted.
        assert_eq!(tracker.state_of(pending.message_id), QueryState::Sent);
        assert_eq!(tracker.in_flight(), 1);
    }

    #[test]
    fn test_begin_same_message_twice_rejected() {
        let mut tracker = QueryTracker::new();
        let id = MessageId::new();
        tracker.begin(id).unwrap();
        assert!(tracker.begin(id).is_err());
    }
}
