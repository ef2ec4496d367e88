//! The session record.

use chrono::{DateTime, Utc};
use docent_types::{DetectedIntent, SessionId};
use serde::{Deserialize, Serialize};

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
    pub at: DateTime<Utc>,
}

/// Conversation state for one session id.
///
/// Owned by the [`SessionStore`](crate::SessionStore); callers receive
/// snapshots and request changes through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    /// Turns in the order they were recorded.
    #[serde(default)]
    pub turns: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_detected_intent: Option<DetectedIntent>,
}

impl Session {
    /// A fresh session with no turns.
    pub fn new(session_id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            created_at: now,
            last_active_at: now,
            turns: Vec::new(),
            last_detected_intent: None,
        }
    }

    /// Number of recorded turns.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Check if the session has no turns yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The last `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// Append a turn. An absent intent leaves the previous one in place.
    pub(crate) fn push_turn(
        &mut self,
        question: String,
        answer: String,
        detected_intent: Option<DetectedIntent>,
    ) {
        let now = Utc::now();
        self.turns.push(Turn {
            question,
            answer,
            at: now,
        });
        self.last_active_at = now;
        if detected_intent.is_some() {
            self.last_detected_intent = detected_intent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn intent(name: &str) -> DetectedIntent {
        DetectedIntent {
            intent: name.to_string(),
            route: "policy_info".to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn test_push_turn_keeps_order_and_intent() {
        let mut session = Session::new(Uuid::new_v4());
        assert!(session.is_empty());

        session.push_turn("q1".into(), "a1".into(), Some(intent("coverage")));
        session.push_turn("q2".into(), "a2".into(), None);

        assert_eq!(session.turn_count(), 2);
        assert_eq!(session.turns[0].question, "q1");
        assert_eq!(session.turns[1].answer, "a2");
        assert_eq!(session.last_detected_intent, Some(intent("coverage")));
        assert!(session.last_active_at >= session.created_at);
    }

    #[test]
    fn test_recent_turns() {
        let mut session = Session::new(Uuid::new_v4());
        for i in 0..5 {
            session.push_turn(format!("q{}", i), format!("a{}", i), None);
        }

        let recent = session.recent_turns(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].question, "q3");
        assert_eq!(session.recent_turns(10).len(), 5);
        assert!(session.recent_turns(0).is_empty());
    }

    #[test]
    fn test_serializes_without_absent_intent() {
        let session = Session::new(Uuid::new_v4());
        let value = serde_json::to_value(&session).unwrap();
        assert!(value.get("last_detected_intent").is_none());
        assert_eq!(value["turns"], serde_json::json!([]));
    }
}
