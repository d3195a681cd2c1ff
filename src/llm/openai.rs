//! OpenAI chat completion implementation.

use super::{ChatModel, Completion, CompletionRequest, Message, ToolCall, ToolSpec};
use crate::error::{Result, SporError};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default timeout for model requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Chat model backed by the OpenAI chat completions API.
///
/// The API key and base URL come from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    parallel_tool_calls: bool,
}

impl OpenAIChatModel {
    /// Create a model client with the given request timeout.
    pub fn new(model: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Client::with_config(OpenAIConfig::default()).with_http_client(http_client),
            model: model.to_string(),
            parallel_tool_calls: true,
        })
    }

    /// Allow or forbid several tool calls in one response.
    pub fn with_parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = enabled;
        self
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model, messages = request.messages.len()))]
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        let messages = request
            .messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model).messages(messages);

        // The API rejects an empty tools array.
        if !request.tools.is_empty() {
            args.tools(request.tools.iter().map(to_tool).collect::<Vec<_>>())
                .parallel_tool_calls(self.parallel_tool_calls);
        }
        if let Some(temperature) = request.temperature {
            args.temperature(temperature);
        }

        let api_request = args.build().map_err(|e| SporError::OpenAI(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(|e| SporError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SporError::OpenAI("No response from model".to_string()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!("Model replied with {} tool call(s)", tool_calls.len());

        Ok(Completion {
            content: choice.message.content,
            tool_calls,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message {
        Message::System { content } => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(|e| SporError::OpenAI(e.to_string()))?
            .into(),
        Message::User { content } => ChatCompletionRequestUserMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(|e| SporError::OpenAI(e.to_string()))?
            .into(),
        Message::Assistant {
            content,
            tool_calls,
        } => {
            let mut args = ChatCompletionRequestAssistantMessageArgs::default();
            if let Some(text) = content {
                args.content(text.clone());
            }
            if !tool_calls.is_empty() {
                args.tool_calls(
                    tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            args.build()
                .map_err(|e| SporError::OpenAI(e.to_string()))?
                .into()
        }
        Message::Tool {
            tool_call_id,
            content,
        } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(tool_call_id.clone())
            .content(content.clone())
            .build()
            .map_err(|e| SporError::OpenAI(e.to_string()))?
            .into(),
    };
    Ok(built)
}

fn to_tool(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.parameters.clone()),
            strict: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_conversion_keeps_schema() {
        let spec = ToolSpec {
            name: "get_weather".to_string(),
            description: "Get the weather".to_string(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        };
        let tool = to_tool(&spec);
        assert_eq!(tool.function.name, "get_weather");
        assert_eq!(tool.function.parameters, Some(spec.parameters));
    }

    #[test]
    fn test_assistant_message_with_tool_calls_converts() {
        let message = Message::Assistant {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "web_search".to_string(),
                arguments: r#"{"query":"rust"}"#.to_string(),
            }],
        };
        let converted = to_request_message(&message).unwrap();
        assert!(matches!(
            converted,
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }
}
