//! HTTP API server for frontends.
//!
//! Exposes the turn entry point as plain JSON and as a Server-Sent Events
//! stream of state snapshots.

use crate::agent::{AgentEvent, Conversation, StateEmitter, TurnRequest};
use crate::cli::Output;
use crate::config::{AgentProfile, Settings};
use crate::error::SporError;
use crate::llm::ToolSpec;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(settings)?;
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Spor API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Tools", "GET  /tools");
    Output::kv("Profiles", "GET  /profiles");
    Output::kv("New conversation", "POST /conversations");
    Output::kv("Turn", "POST /turn");
    Output::kv("Turn (SSE)", "POST /turn/stream");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(orchestrator: Orchestrator) -> Router {
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tools", get(tools))
        .route("/profiles", get(profiles))
        .route("/conversations", post(new_conversation))
        .route("/turn", post(turn))
        .route("/turn/stream", post(turn_stream))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize, Default)]
struct NewConversationRequest {
    #[serde(default)]
    profile: Option<String>,
}

#[derive(Deserialize)]
struct TurnBody {
    /// Conversation returned by an earlier call; a new one is started when absent.
    #[serde(default)]
    conversation: Option<Conversation>,
    /// Profile for a new conversation.
    #[serde(default)]
    profile: Option<String>,
    #[serde(flatten)]
    request: TurnRequest,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Library error mapped to an HTTP status.
struct ApiError(SporError);

impl From<SporError> for ApiError {
    fn from(e: SporError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SporError::InvalidState(_) | SporError::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl AppState {
    fn conversation(&self, body: &mut TurnBody) -> Result<Conversation, SporError> {
        match body.conversation.take() {
            Some(conversation) => Ok(conversation),
            None => self.orchestrator.new_conversation(body.profile.as_deref()),
        }
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn tools(State(state): State<Arc<AppState>>) -> Json<Vec<ToolSpec>> {
    Json(state.orchestrator.tool_specs())
}

async fn profiles(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, AgentProfile>> {
    Json(state.orchestrator.settings().profiles.clone())
}

async fn new_conversation(
    State(state): State<Arc<AppState>>,
    body: Option<Json<NewConversationRequest>>,
) -> Result<Json<Conversation>, ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    Ok(Json(state.orchestrator.new_conversation(req.profile.as_deref())?))
}

async fn turn(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<TurnBody>,
) -> Result<Response, ApiError> {
    let conversation = state.conversation(&mut body)?;
    let output = state
        .orchestrator
        .run_turn(conversation, body.request, &StateEmitter::disabled())
        .await?;
    Ok(Json(output).into_response())
}

async fn turn_stream(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<TurnBody>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let conversation = state.conversation(&mut body)?;
    let (emitter, rx) = StateEmitter::channel();
    info!("Streaming turn for conversation {}", conversation.id);

    tokio::spawn(async move {
        match state
            .orchestrator
            .run_turn(conversation, body.request, &emitter)
            .await
        {
            Ok(output) => emitter.send(AgentEvent::Finished(Box::new(output))),
            Err(e) => {
                warn!("Streamed turn failed: {}", e);
                emitter.send(AgentEvent::Failed {
                    message: e.to_string(),
                });
            }
        }
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(sse_event(event)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn sse_event(event: AgentEvent) -> Event {
    let (event_type, data) = match event {
        AgentEvent::State(update) => ("state", serde_json::to_string(&update)),
        AgentEvent::Finished(output) => ("done", serde_json::to_string(&output)),
        AgentEvent::Failed { message } => (
            "error",
            serde_json::to_string(&ErrorResponse { error: message }),
        ),
    };

    Event::default()
        .event(event_type)
        .data(data.unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e)))
}
