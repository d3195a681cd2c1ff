//! Outbound stream of partial state snapshots.
//!
//! Tools report progress while they run; the emitter forwards each
//! snapshot to whoever is rendering the conversation (the SSE endpoint,
//! the CLI spinner) without blocking the turn.

use super::runner::TurnOutput;
use super::state::Confirmation;
use crate::clients::WeatherReading;
use serde::Serialize;
use tokio::sync::mpsc;

/// A partial state snapshot. Only the populated fields changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_steps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_plan: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_confirmation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_context: Option<String>,
}

impl StateUpdate {
    pub fn steps(steps: &[String]) -> Self {
        Self {
            observed_steps: Some(steps.to_vec()),
            ..Default::default()
        }
    }

    pub fn plan(queries: &[String]) -> Self {
        Self {
            search_plan: Some(queries.to_vec()),
            ..Default::default()
        }
    }

    pub fn weather(reading: &WeatherReading) -> Self {
        Self {
            weather: Some(reading.clone()),
            ..Default::default()
        }
    }

    /// Flat view of the confirmation handshake, as a frontend renders it.
    pub fn confirmation(confirmation: &Confirmation) -> Self {
        Self {
            pending_confirmation: Some(confirmation.pending_confirmation()),
            confirmation_message: Some(confirmation.message().unwrap_or_default().to_string()),
            confirmation_context: Some(confirmation.context().unwrap_or_default().to_string()),
            ..Default::default()
        }
    }
}

/// Events produced while a turn runs.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Intermediate state snapshot.
    State(StateUpdate),
    /// The turn finished.
    Finished(Box<TurnOutput>),
    /// The turn failed.
    Failed { message: String },
}

/// Sender side of the state stream. Cloning shares the channel.
#[derive(Debug, Clone, Default)]
pub struct StateEmitter {
    tx: Option<mpsc::UnboundedSender<AgentEvent>>,
}

impl StateEmitter {
    /// Create an emitter and the receiver that observes it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AgentEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// An emitter that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, update: StateUpdate) {
        self.send(AgentEvent::State(update));
    }

    /// Send an event. A receiver that went away is not an error.
    pub fn send(&self, event: AgentEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update_serializes_only_set_fields() {
        let update = StateUpdate::steps(&["Getting coordinates for Oslo".to_string()]);
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"observed_steps": ["Getting coordinates for Oslo"]}));
    }

    #[test]
    fn test_confirmation_update_is_flat() {
        let mut confirmation = Confirmation::Idle;
        confirmation.request("Book the flight?", None);
        let update = StateUpdate::confirmation(&confirmation);
        assert_eq!(update.pending_confirmation, Some(true));
        assert_eq!(update.confirmation_message.as_deref(), Some("Book the flight?"));
        assert_eq!(update.confirmation_context.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_emitter_delivers_and_tolerates_closed_receiver() {
        let (emitter, mut rx) = StateEmitter::channel();
        emitter.emit(StateUpdate::plan(&["a".to_string(), "b".to_string()]));

        match rx.recv().await {
            Some(AgentEvent::State(update)) => {
                assert_eq!(update.search_plan.map(|p| p.len()), Some(2));
            }
            other => panic!("Expected state update, got {:?}", other),
        }

        drop(rx);
        emitter.emit(StateUpdate::default());
        StateEmitter::disabled().emit(StateUpdate::default());
    }
}
