//! Conversation state carried between turns.
//!
//! Durable session fields, the cross-turn confirmation handshake and
//! per-turn scratch state are kept in separate structures so nothing
//! transient survives a turn by accident.

use crate::clients::WeatherReading;
use crate::config::AgentProfile;
use crate::error::{Result, SporError};
use crate::llm::Message;
use crate::search::QueryOutcome;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// A conversation as exchanged with the caller: history plus state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub session: SessionState,
    #[serde(default)]
    pub confirmation: Confirmation,
}

impl Conversation {
    /// Start an empty conversation with the given personality.
    pub fn new(profile: &AgentProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            session: SessionState {
                agent_name: profile.agent_name.clone(),
                system_prompt: profile.system_prompt.clone(),
                ..Default::default()
            },
            confirmation: Confirmation::Idle,
        }
    }

    /// Text of the most recent assistant message, if any.
    pub fn last_reply(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Assistant {
                content: Some(text),
                ..
            } if !text.is_empty() => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Fields that persist for the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub agent_name: String,
    pub system_prompt: String,
    /// Latest weather reading fetched by the weather tool.
    pub weather: Option<WeatherReading>,
    /// Plan of the most recent web search.
    pub search_plan: Vec<String>,
    /// Results of the most recent web search, keyed by sub-query.
    pub search_results: BTreeMap<String, QueryOutcome>,
}

/// Human-in-the-loop confirmation handshake.
///
/// `Pending` means a question was asked and no answer has been recorded;
/// `Answered` holds the answer until the next `respond` step consumes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Confirmation {
    #[default]
    Idle,
    Pending {
        message: String,
        #[serde(default)]
        context: Option<String>,
    },
    Answered {
        message: String,
        #[serde(default)]
        context: Option<String>,
        response: String,
    },
}

/// A recorded answer to a confirmation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationAnswer {
    pub message: String,
    pub context: Option<String>,
    pub response: String,
}

impl Confirmation {
    /// Ask the user a question. Replaces any earlier request.
    pub fn request(&mut self, message: impl Into<String>, context: Option<String>) {
        *self = Confirmation::Pending {
            message: message.into(),
            context: context.filter(|c| !c.trim().is_empty()),
        };
    }

    /// Record the user's answer to the pending request.
    pub fn answer(&mut self, response: impl Into<String>) -> Result<()> {
        match std::mem::take(self) {
            Confirmation::Pending { message, context } => {
                *self = Confirmation::Answered {
                    message,
                    context,
                    response: response.into(),
                };
                Ok(())
            }
            other => {
                *self = other;
                Err(SporError::InvalidState(
                    "No confirmation is pending".to_string(),
                ))
            }
        }
    }

    /// Take a recorded answer, resetting the handshake to idle.
    pub fn take_answer(&mut self) -> Option<ConfirmationAnswer> {
        match std::mem::take(self) {
            Confirmation::Answered {
                message,
                context,
                response,
            } => Some(ConfirmationAnswer {
                message,
                context,
                response,
            }),
            other => {
                *self = other;
                None
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Confirmation::Idle;
    }

    /// True iff a question was asked and not yet answered.
    pub fn pending_confirmation(&self) -> bool {
        matches!(self, Confirmation::Pending { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Confirmation::Idle => None,
            Confirmation::Pending { message, .. } | Confirmation::Answered { message, .. } => {
                Some(message)
            }
        }
    }

    pub fn context(&self) -> Option<&str> {
        match self {
            Confirmation::Idle => None,
            Confirmation::Pending { context, .. } | Confirmation::Answered { context, .. } => {
                context.as_deref()
            }
        }
    }

    pub fn user_response(&self) -> Option<&str> {
        match self {
            Confirmation::Answered { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Scratch state for a single turn.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    /// Progress notices surfaced to the caller.
    pub observed_steps: Vec<String>,
    /// Tool call ids already executed this turn.
    pub executed_calls: HashSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_confirmation_round_trip() {
        let mut confirmation = Confirmation::default();
        assert!(!confirmation.pending_confirmation());

        confirmation.request("Delete all files?", Some("in /tmp".to_string()));
        assert!(confirmation.pending_confirmation());
        assert_eq!(confirmation.message(), Some("Delete all files?"));
        assert_eq!(confirmation.user_response(), None);

        assert_ok!(confirmation.answer("no"));
        assert!(!confirmation.pending_confirmation());
        assert_eq!(confirmation.user_response(), Some("no"));

        let answer = confirmation.take_answer().unwrap();
        assert_eq!(answer.response, "no");
        assert_eq!(answer.context.as_deref(), Some("in /tmp"));
        assert_eq!(confirmation, Confirmation::Idle);
        assert_eq!(confirmation.message(), None);
        assert_eq!(confirmation.context(), None);
    }

    #[test]
    fn test_answer_without_request_is_rejected() {
        let mut confirmation = Confirmation::Idle;
        let err = assert_err!(confirmation.answer("yes"));
        assert!(matches!(err, SporError::InvalidState(_)));
        assert_eq!(confirmation, Confirmation::Idle);
        assert!(confirmation.take_answer().is_none());
    }

    #[test]
    fn test_blank_context_is_dropped() {
        let mut confirmation = Confirmation::Idle;
        confirmation.request("Proceed?", Some("  ".to_string()));
        assert_eq!(confirmation.context(), None);
    }

    #[test]
    fn test_conversation_deserializes_with_defaults() {
        let conversation: Conversation = serde_json::from_str(
            r#"{"messages": [{"role": "user", "content": "hi"}]}"#,
        )
        .unwrap();
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.confirmation, Confirmation::Idle);
        assert!(conversation.session.weather.is_none());
    }

    #[test]
    fn test_last_reply_skips_tool_call_messages() {
        let mut conversation = Conversation::new(&AgentProfile {
            agent_name: "Jarvis".to_string(),
            system_prompt: "Be brief.".to_string(),
            icon: String::new(),
        });
        conversation.messages.push(Message::assistant("It is sunny."));
        conversation.messages.push(Message::Assistant {
            content: None,
            tool_calls: Vec::new(),
        });
        assert_eq!(conversation.last_reply(), Some("It is sunny."));
        assert_eq!(conversation.session.agent_name, "Jarvis");
    }
}
