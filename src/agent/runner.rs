//! Agent runner: the respond / execute-tools cycle.

use super::events::{StateEmitter, StateUpdate};
use super::state::{ConfirmationAnswer, Conversation, TurnState};
use super::tools::{ToolContext, ToolRegistry};
use crate::config::Prompts;
use crate::error::{Result, SporError};
use crate::llm::{ChatModel, CompletionRequest, Message, ToolCall, ToolSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// How a model response is checked against caller-supplied actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// Only the first requested call's name decides. If it names a caller
    /// action the turn stops, even when later calls name local tools.
    #[default]
    FirstCall,
    /// Execute whenever at least one call names something other than a
    /// caller action.
    AnyCall,
}

/// Why a turn stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// The model answered without requesting tools.
    FinalAnswer,
    /// A confirmation question is waiting for the user.
    AwaitingConfirmation,
    /// The model requested an action the caller executes itself.
    CallerAction { name: String },
}

/// Routing decision after a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ExecuteTools,
    End(StopReason),
}

/// Decide where a model response goes next.
pub fn route(policy: RoutingPolicy, tool_calls: &[ToolCall], actions: &[ToolSpec]) -> Route {
    let is_action = |call: &ToolCall| actions.iter().any(|a| a.name == call.name);

    let Some(first) = tool_calls.first() else {
        return Route::End(StopReason::FinalAnswer);
    };

    let execute = match policy {
        RoutingPolicy::FirstCall => !is_action(first),
        RoutingPolicy::AnyCall => tool_calls.iter().any(|c| !is_action(c)),
    };

    if execute {
        Route::ExecuteTools
    } else {
        Route::End(StopReason::CallerAction {
            name: first.name.clone(),
        })
    }
}

/// Input for one turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnRequest {
    /// New user text, if any.
    pub user_message: Option<String>,
    /// Answer to a pending confirmation question.
    pub confirmation_response: Option<String>,
    /// Results of caller actions requested in the previous turn.
    pub action_results: Vec<ActionResult>,
    /// Actions the caller executes itself; offered to the model but never
    /// run by the agent.
    pub actions: Vec<ToolSpec>,
}

impl TurnRequest {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            user_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn confirmation(response: impl Into<String>) -> Self {
        Self {
            confirmation_response: Some(response.into()),
            ..Default::default()
        }
    }

    pub fn with_actions(mut self, actions: Vec<ToolSpec>) -> Self {
        self.actions = actions;
        self
    }
}

/// Output of a caller-executed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub tool_call_id: String,
    pub content: String,
}

/// Record of a tool call made during a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutput {
    pub conversation: Conversation,
    pub stop: StopReason,
    pub observed_steps: Vec<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls made.
    pub iterations: usize,
}

impl TurnOutput {
    /// The assistant's final text, if the turn produced one.
    pub fn reply(&self) -> Option<&str> {
        match self.stop {
            StopReason::FinalAnswer => self.conversation.last_reply(),
            _ => None,
        }
    }
}

enum Node {
    Respond,
    ExecuteTools(Vec<ToolCall>),
    End(StopReason),
}

/// Tool-using chat agent.
pub struct ChatAgent {
    model: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    prompts: Arc<Prompts>,
    routing: RoutingPolicy,
    max_iterations: usize,
}

impl ChatAgent {
    /// Create a new agent with the given model and tools.
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry) -> Self {
        Self {
            model,
            tools,
            prompts: Arc::new(Prompts::default()),
            routing: RoutingPolicy::default(),
            max_iterations: 15,
        }
    }

    pub fn with_prompts(mut self, prompts: Arc<Prompts>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_routing(mut self, routing: RoutingPolicy) -> Self {
        self.routing = routing;
        self
    }

    /// Set maximum model calls per turn.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one turn of the conversation to completion.
    #[instrument(skip_all, fields(conversation = %conversation.id))]
    pub async fn run_turn(
        &self,
        mut conversation: Conversation,
        request: TurnRequest,
        emitter: &StateEmitter,
    ) -> Result<TurnOutput> {
        let TurnRequest {
            user_message,
            confirmation_response,
            action_results,
            actions,
        } = request;

        if let Some(response) = confirmation_response {
            conversation.confirmation.answer(response)?;
        } else if conversation.confirmation.pending_confirmation() {
            debug!("Dropping unanswered confirmation request");
            conversation.confirmation.clear();
            emitter.emit(StateUpdate::confirmation(&conversation.confirmation));
        }

        for result in action_results {
            conversation
                .messages
                .push(Message::tool(result.tool_call_id, result.content));
        }

        if let Some(text) = user_message {
            conversation.messages.push(Message::user(text));
        }

        let mut turn = TurnState::default();
        let mut records = Vec::new();
        let mut iterations = 0;
        let mut node = Node::Respond;

        let stop = loop {
            node = match node {
                Node::Respond => {
                    self.respond(&mut conversation, &actions, &mut iterations, emitter)
                        .await?
                }
                Node::ExecuteTools(calls) => {
                    self.execute_tools(
                        &mut conversation,
                        &mut turn,
                        calls,
                        &actions,
                        &mut records,
                        emitter,
                    )
                    .await
                }
                Node::End(stop) => break stop,
            };
        };

        info!("Turn finished after {} model call(s): {:?}", iterations, stop);

        Ok(TurnOutput {
            conversation,
            stop,
            observed_steps: turn.observed_steps,
            tool_calls: records,
            iterations,
        })
    }

    async fn respond(
        &self,
        conversation: &mut Conversation,
        actions: &[ToolSpec],
        iterations: &mut usize,
        emitter: &StateEmitter,
    ) -> Result<Node> {
        if let Some(answer) = conversation.confirmation.take_answer() {
            debug!("Consuming confirmation answer '{}'", answer.response);
            conversation
                .messages
                .push(Message::user(self.confirmation_reply(&answer)));
            emitter.emit(StateUpdate::confirmation(&conversation.confirmation));
            return Ok(Node::Respond);
        }

        *iterations += 1;
        if *iterations > self.max_iterations {
            return Err(SporError::Agent(format!(
                "Agent exceeded maximum iterations ({})",
                self.max_iterations
            )));
        }

        debug!(
            "Agent iteration {}, {} messages",
            iterations,
            conversation.messages.len()
        );

        let mut messages = Vec::with_capacity(conversation.messages.len() + 1);
        messages.push(self.system_message(conversation));
        messages.extend(conversation.messages.iter().cloned());

        let mut tools = self.tools.specs();
        tools.extend(actions.iter().cloned());

        let completion = self
            .model
            .complete(CompletionRequest::new(messages).with_tools(tools))
            .await?;

        let mut unanswered = Vec::new();
        let next = match route(self.routing, &completion.tool_calls, actions) {
            Route::ExecuteTools => Node::ExecuteTools(completion.tool_calls.clone()),
            Route::End(stop) => {
                if let StopReason::CallerAction { name } = &stop {
                    // Local calls sharing the response with a caller action are
                    // not run, but every call id still needs a tool reply.
                    unanswered = completion
                        .tool_calls
                        .iter()
                        .filter(|call| !actions.iter().any(|a| a.name == call.name))
                        .map(|call| {
                            Message::tool(
                                call.id.clone(),
                                format!(
                                    "Tool '{}' was not executed: the turn ended for client action '{}'.",
                                    call.name, name
                                ),
                            )
                        })
                        .collect();
                }
                Node::End(stop)
            }
        };

        conversation.messages.push(completion.into_message());
        conversation.messages.extend(unanswered);
        Ok(next)
    }

    async fn execute_tools(
        &self,
        conversation: &mut Conversation,
        turn: &mut TurnState,
        calls: Vec<ToolCall>,
        actions: &[ToolSpec],
        records: &mut Vec<ToolCallRecord>,
        emitter: &StateEmitter,
    ) -> Node {
        for call in calls {
            if !turn.executed_calls.insert(call.id.clone()) {
                warn!("Skipping repeated tool call id {}", call.id);
                continue;
            }

            info!("Agent calling tool: {} with args: {}", call.name, call.arguments);

            let result = if actions.iter().any(|a| a.name == call.name) {
                format!("Action '{}' is handled by the client.", call.name)
            } else {
                let mut ctx = ToolContext::new(
                    &call.id,
                    &mut conversation.session,
                    &mut conversation.confirmation,
                    &mut *turn,
                    emitter,
                );
                match self.tools.invoke(&call, &mut ctx).await {
                    Ok(output) => output,
                    Err(e @ SporError::LocationNotFound(_)) => e.to_string(),
                    Err(e @ (SporError::UnknownTool(_) | SporError::InvalidArguments { .. })) => {
                        format!("Failed to parse tool call: {}", e)
                    }
                    Err(e) => format!("Tool error: {}", e),
                }
            };

            conversation
                .messages
                .push(Message::tool(call.id.clone(), result.clone()));
            records.push(ToolCallRecord {
                name: call.name,
                arguments: call.arguments,
                result,
            });
        }

        if conversation.confirmation.pending_confirmation() {
            Node::End(StopReason::AwaitingConfirmation)
        } else {
            Node::Respond
        }
    }

    fn system_message(&self, conversation: &Conversation) -> Message {
        let session = &conversation.session;
        let system_prompt = if session.system_prompt.trim().is_empty() {
            self.prompts.agent.fallback_system.clone()
        } else {
            session.system_prompt.clone()
        };

        let mut vars = HashMap::new();
        vars.insert("system_prompt".to_string(), system_prompt);
        vars.insert("agent_name".to_string(), session.agent_name.clone());
        vars.insert(
            "now".to_string(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        );

        Message::system(self.prompts.render_with_custom(&self.prompts.agent.system, &vars))
    }

    fn confirmation_reply(&self, answer: &ConfirmationAnswer) -> String {
        let mut vars = HashMap::new();
        vars.insert("response".to_string(), answer.response.clone());
        vars.insert("message".to_string(), answer.message.clone());
        vars.insert(
            "context".to_string(),
            answer
                .context
                .as_ref()
                .map(|c| format!(" ({})", c))
                .unwrap_or_default(),
        );
        self.prompts
            .render_with_custom(&self.prompts.agent.confirmation_reply, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::Confirmation;
    use crate::agent::AgentEvent;
    use crate::clients::WeatherReading;
    use crate::search::{SearchExecutor, SearchPlanner};
    use crate::testing::{tool_call, FakeGeocoder, FakeSearch, FakeWeather, ScriptedModel};
    use crate::tools::{ConfirmationTool, WeatherTool, WebSearchTool};
    use std::time::Duration;
    use crate::config::AgentProfile;
    use crate::llm::Completion;

    fn action(name: &str) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            description: String::new(),
            parameters: serde_json::json!({"type": "object"}),
        }
    }

    fn conversation() -> Conversation {
        Conversation::new(&AgentProfile {
            agent_name: "Jarvis".to_string(),
            system_prompt: "You are terse.".to_string(),
            icon: String::new(),
        })
    }

    fn agent(model: &Arc<ScriptedModel>) -> ChatAgent {
        ChatAgent::new(
            model.clone(),
            ToolRegistry::new().with(Arc::new(ConfirmationTool)),
        )
    }

    #[test]
    fn test_route_without_tool_calls_ends() {
        for policy in [RoutingPolicy::FirstCall, RoutingPolicy::AnyCall] {
            assert_eq!(
                route(policy, &[], &[action("setThemeColor")]),
                Route::End(StopReason::FinalAnswer)
            );
        }
    }

    #[test]
    fn test_first_call_policy_checks_only_first_call() {
        let actions = [action("setThemeColor")];
        let calls = [
            tool_call("1", "setThemeColor", "{}"),
            tool_call("2", "get_weather", r#"{"location":"Oslo"}"#),
        ];

        assert_eq!(
            route(RoutingPolicy::FirstCall, &calls, &actions),
            Route::End(StopReason::CallerAction {
                name: "setThemeColor".to_string()
            })
        );
        assert_eq!(
            route(RoutingPolicy::AnyCall, &calls, &actions),
            Route::ExecuteTools
        );

        let reversed = [calls[1].clone(), calls[0].clone()];
        assert_eq!(
            route(RoutingPolicy::FirstCall, &reversed, &actions),
            Route::ExecuteTools
        );
    }

    #[tokio::test]
    async fn test_final_answer_without_tools() {
        let model = Arc::new(ScriptedModel::new(vec![Completion {
            content: Some("Hello!".to_string()),
            tool_calls: vec![],
        }]));
        let output = agent(&model)
            .run_turn(conversation(), TurnRequest::user("Hi"), &StateEmitter::disabled())
            .await
            .unwrap();

        assert_eq!(output.stop, StopReason::FinalAnswer);
        assert_eq!(output.reply(), Some("Hello!"));
        assert_eq!(output.iterations, 1);
        assert_eq!(output.conversation.messages.len(), 2);

        let request = &model.requests()[0];
        assert!(matches!(&request.messages[0], Message::System { content }
            if content.starts_with("You are terse.") && content.contains("Current date and time is")));
        assert_eq!(request.tools.len(), 1);
    }

    #[tokio::test]
    async fn test_tool_batch_runs_once_then_responds() {
        let model = Arc::new(ScriptedModel::new(vec![
            Completion {
                content: None,
                tool_calls: vec![
                    tool_call("a", "no_such_tool", "{}"),
                    tool_call("a", "no_such_tool", "{}"),
                ],
            },
            Completion {
                content: Some("Done.".to_string()),
                tool_calls: vec![],
            },
        ]));
        let output = agent(&model)
            .run_turn(conversation(), TurnRequest::user("Go"), &StateEmitter::disabled())
            .await
            .unwrap();

        assert_eq!(output.iterations, 2);
        // Repeated call id executes at most once.
        assert_eq!(output.tool_calls.len(), 1);
        assert!(output.tool_calls[0]
            .result
            .starts_with("Failed to parse tool call: Unknown tool"));
        let tool_messages = output
            .conversation
            .messages
            .iter()
            .filter(|m| matches!(m, Message::Tool { .. }))
            .count();
        assert_eq!(tool_messages, 1);
        assert_eq!(output.reply(), Some("Done."));
    }

    #[tokio::test]
    async fn test_caller_action_stops_turn() {
        let model = Arc::new(ScriptedModel::new(vec![Completion {
            content: None,
            tool_calls: vec![tool_call("x", "setThemeColor", r#"{"themeColor":"red"}"#)],
        }]));
        let request = TurnRequest::user("Make it red").with_actions(vec![action("setThemeColor")]);
        let output = agent(&model)
            .run_turn(conversation(), request, &StateEmitter::disabled())
            .await
            .unwrap();

        assert_eq!(
            output.stop,
            StopReason::CallerAction {
                name: "setThemeColor".to_string()
            }
        );
        assert!(output.tool_calls.is_empty());
        assert_eq!(model.requests()[0].tools.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_keeps_progress_of_every_tool() {
        let model = Arc::new(ScriptedModel::new(vec![
            Completion {
                content: None,
                tool_calls: vec![
                    tool_call("s", "web_search", r#"{"query": "Oslo events"}"#),
                    tool_call("w", "get_weather", r#"{"location": "Oslo"}"#),
                ],
            },
            // Search plan for the web_search call.
            Completion {
                content: Some(r#"["Oslo events"]"#.to_string()),
                tool_calls: vec![],
            },
            Completion {
                content: Some("Concerts tonight, and it is mild.".to_string()),
                tool_calls: vec![],
            },
        ]));
        let prompts = Arc::new(Prompts::default());
        let tools = ToolRegistry::new()
            .with(Arc::new(WebSearchTool::new(
                SearchPlanner::new(model.clone(), prompts.clone()),
                SearchExecutor::new(Arc::new(FakeSearch::new()), model.clone(), prompts)
                    .with_pacing(Duration::ZERO),
            )))
            .with(Arc::new(WeatherTool::new(
                Arc::new(FakeGeocoder::new()),
                Arc::new(FakeWeather::new(WeatherReading {
                    temperature: 12.0,
                    humidity: 70.0,
                    weather_code: 2.0,
                })),
            )));
        let (emitter, mut rx) = StateEmitter::channel();

        let output = ChatAgent::new(model.clone(), tools)
            .run_turn(conversation(), TurnRequest::user("Events and weather in Oslo?"), &emitter)
            .await
            .unwrap();

        assert_eq!(output.tool_calls.len(), 2);
        let steps = &output.observed_steps;
        assert_eq!(steps[0], "Analyzing search query...");
        assert!(steps.iter().any(|s| s == "✓ Web search completed"));
        assert!(steps.iter().any(|s| s == "Getting coordinates for Oslo"));
        assert!(steps
            .last()
            .unwrap()
            .starts_with("Weather data retrieved successfully for Oslo"));

        // The stream starts a fresh step list for each tool.
        drop(emitter);
        let mut streamed = Vec::new();
        while let Some(event) = rx.recv().await {
            if let AgentEvent::State(update) = event {
                if let Some(steps) = update.observed_steps {
                    streamed.push(steps);
                }
            }
        }
        let last = streamed.last().unwrap();
        assert_eq!(last[0], "Getting coordinates for Oslo");
        assert_eq!(last.len(), 3);
    }

    #[tokio::test]
    async fn test_caller_action_first_leaves_no_unanswered_calls() {
        let model = Arc::new(ScriptedModel::new(vec![Completion {
            content: None,
            tool_calls: vec![
                tool_call("1", "setThemeColor", r#"{"themeColor":"red"}"#),
                tool_call("2", "get_weather", r#"{"location":"Oslo"}"#),
            ],
        }]));
        let request = TurnRequest::user("Red theme, and the weather").with_actions(vec![action("setThemeColor")]);
        let output = agent(&model)
            .run_turn(conversation(), request, &StateEmitter::disabled())
            .await
            .unwrap();

        assert!(matches!(output.stop, StopReason::CallerAction { .. }));
        assert!(output.tool_calls.is_empty());

        let answered: Vec<&str> = output
            .conversation
            .messages
            .iter()
            .filter_map(|m| match m {
                Message::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();
        // The caller answers "1" through action_results; "2" is closed here.
        assert_eq!(answered, vec!["2"]);
        assert!(output
            .conversation
            .messages
            .last()
            .and_then(|m| m.text())
            .unwrap()
            .contains("was not executed"));
    }

    #[tokio::test]
    async fn test_any_call_policy_answers_caller_actions_in_batch() {
        let model = Arc::new(ScriptedModel::new(vec![
            Completion {
                content: None,
                tool_calls: vec![
                    tool_call("1", "setThemeColor", "{}"),
                    tool_call("2", "ask_user_confirmation", r#"{"message":"Sure?"}"#),
                ],
            },
        ]));
        let request = TurnRequest::user("Theme and ask").with_actions(vec![action("setThemeColor")]);
        let output = agent(&model)
            .with_routing(RoutingPolicy::AnyCall)
            .run_turn(conversation(), request, &StateEmitter::disabled())
            .await
            .unwrap();

        assert_eq!(output.stop, StopReason::AwaitingConfirmation);
        assert_eq!(
            output.tool_calls[0].result,
            "Action 'setThemeColor' is handled by the client."
        );
    }

    #[tokio::test]
    async fn test_confirmation_round_trip_across_turns() {
        let model = Arc::new(ScriptedModel::new(vec![
            Completion {
                content: None,
                tool_calls: vec![tool_call(
                    "c1",
                    "ask_user_confirmation",
                    r#"{"message": "Send the email?", "context": "to 3 recipients"}"#,
                )],
            },
            Completion {
                content: Some("Email sent.".to_string()),
                tool_calls: vec![],
            },
        ]));
        let agent = agent(&model);
        let (emitter, mut rx) = StateEmitter::channel();

        let first = agent
            .run_turn(conversation(), TurnRequest::user("Email the team"), &emitter)
            .await
            .unwrap();
        assert_eq!(first.stop, StopReason::AwaitingConfirmation);
        assert!(first.conversation.confirmation.pending_confirmation());
        assert_eq!(first.conversation.confirmation.message(), Some("Send the email?"));
        assert_eq!(model.requests().len(), 1);

        let history_before = first.conversation.messages.len();
        let second = agent
            .run_turn(first.conversation, TurnRequest::confirmation("yes"), &emitter)
            .await
            .unwrap();

        assert_eq!(second.stop, StopReason::FinalAnswer);
        assert_eq!(second.conversation.confirmation, Confirmation::Idle);
        assert_eq!(second.iterations, 1);

        // Exactly one synthetic message, placed before the model call.
        let requests = model.requests();
        let sent = &requests[1].messages;
        assert_eq!(sent.len(), history_before + 2);
        let synthetic = sent.last().and_then(|m| m.text()).unwrap();
        assert!(synthetic.contains("\"yes\""));
        assert!(synthetic.contains("Send the email?"));
        assert!(synthetic.contains("to 3 recipients"));

        drop(emitter);
        let mut cleared = false;
        while let Some(event) = rx.recv().await {
            if let AgentEvent::State(update) = event {
                if update.pending_confirmation == Some(false) {
                    cleared = true;
                }
            }
        }
        assert!(cleared);
    }

    #[tokio::test]
    async fn test_unanswered_confirmation_is_dropped_on_new_turn() {
        let model = Arc::new(ScriptedModel::new(vec![Completion {
            content: Some("Okay, never mind.".to_string()),
            tool_calls: vec![],
        }]));
        let mut conv = conversation();
        conv.confirmation.request("Delete the repo?", None);

        let output = agent(&model)
            .run_turn(conv, TurnRequest::user("Actually, what time is it?"), &StateEmitter::disabled())
            .await
            .unwrap();
        assert_eq!(output.conversation.confirmation, Confirmation::Idle);
        assert_eq!(model.requests()[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_confirmation_response_without_request_fails() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let result = agent(&model)
            .run_turn(conversation(), TurnRequest::confirmation("yes"), &StateEmitter::disabled())
            .await;
        assert!(matches!(result, Err(SporError::InvalidState(_))));
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let looping = (0..5)
            .map(|i| Completion {
                content: None,
                tool_calls: vec![tool_call(&format!("id{}", i), "missing", "{}")],
            })
            .collect();
        let model = Arc::new(ScriptedModel::new(looping));
        let result = agent(&model)
            .with_max_iterations(3)
            .run_turn(conversation(), TurnRequest::user("loop"), &StateEmitter::disabled())
            .await;
        assert!(matches!(result, Err(SporError::Agent(msg)) if msg.contains("maximum iterations")));
    }

    #[tokio::test]
    async fn test_action_results_are_appended_before_model_call() {
        let model = Arc::new(ScriptedModel::new(vec![Completion {
            content: Some("Theme updated.".to_string()),
            tool_calls: vec![],
        }]));
        let request = TurnRequest {
            action_results: vec![ActionResult {
                tool_call_id: "x".to_string(),
                content: "ok".to_string(),
            }],
            ..Default::default()
        };
        let output = agent(&model)
            .run_turn(conversation(), request, &StateEmitter::disabled())
            .await
            .unwrap();
        assert_eq!(output.reply(), Some("Theme updated."));
        assert!(matches!(
            &model.requests()[0].messages[1],
            Message::Tool { tool_call_id, .. } if tool_call_id == "x"
        ));
    }

    #[test]
    fn test_tool_call_record_display() {
        let record = ToolCallRecord {
            name: "web_search".to_string(),
            arguments: r#"{"query": "test"}"#.to_string(),
            result: "Found results".to_string(),
        };
        assert_eq!(format!("{}", record), r#"web_search({"query": "test"})"#);
    }
}
