//! HTTP boundary: the chat endpoint and the alert webhook.

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::agent::{AgentExecutor, ChatAgent};
use crate::config::Config;
use crate::llm::OpenAiClient;
use crate::notify::WebexNotifier;
use crate::nwpi::VmanageClient;
use crate::tools::ToolRegistry;

use types::{AlertRequest, ChatRequest, HealthResponse};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatAgent>,
    pub notifier: Option<Arc<WebexNotifier>>,
}

/// Wire up the application and serve it until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let backend = Arc::new(VmanageClient::new(&config.vmanage)?);
    let tools = ToolRegistry::new(backend);
    let llm = Arc::new(OpenAiClient::new(config.api_key.clone()));
    let executor = Arc::new(AgentExecutor::new(
        llm,
        tools,
        config.model.clone(),
        config.max_iterations,
    ));
    let state = AppState {
        chat: Arc::new(ChatAgent::new(executor)),
        notifier: WebexNotifier::from_config(&config.webex).map(Arc::new),
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Build the router over prepared state (separated for tests).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/alert", post(alert))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /chat - one chat turn, plain-text reply.
///
/// Recovered failures arrive here as normal "ERROR: ..." strings and still get
/// a 200; only unclassified failures become a server error.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<String, (StatusCode, String)> {
    let request_id = Uuid::new_v4();
    info!("MESSAGE_RECEIVED [{request_id}]: {}", request.message);

    state.chat.chat(&request.message).await.map_err(|err| {
        error!("chat turn {request_id} failed: {err}");
        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    })
}

/// POST /alert - forward an alert to the notification channel.
async fn alert(
    State(state): State<AppState>,
    Json(request): Json<AlertRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    match &state.notifier {
        Some(notifier) => {
            notifier
                .send_notification(&request.alert)
                .await
                .map_err(|err| {
                    error!("notification failed: {err}");
                    (StatusCode::BAD_GATEWAY, err.to_string())
                })?;
        }
        None => info!("notification channel disabled, dropping alert: {}", request.alert),
    }
    Ok(StatusCode::ACCEPTED)
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::agent::AgentInvoker;
    use crate::error::AgentError;

    use super::*;

    struct CannedInvoker(Result<&'static str, fn() -> AgentError>);

    #[async_trait]
    impl AgentInvoker for CannedInvoker {
        async fn invoke(&self, _message: &str) -> Result<String, AgentError> {
            match &self.0 {
                Ok(reply) => Ok(reply.to_string()),
                Err(make) => Err(make()),
            }
        }
    }

    fn state(invoker: CannedInvoker) -> AppState {
        AppState {
            chat: Arc::new(ChatAgent::new(Arc::new(invoker))),
            notifier: None,
        }
    }

    #[tokio::test]
    async fn chat_returns_the_agent_reply_as_plain_text() {
        let state = state(CannedInvoker(Ok("trace 42 running 🚦")));
        let reply = chat(
            State(state),
            Json(ChatRequest {
                message: "status of trace 42?".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(reply, "trace 42 running 🚦");
    }

    #[tokio::test]
    async fn unclassified_failure_becomes_a_server_error() {
        let state = state(CannedInvoker(Err(|| {
            AgentError::Other(anyhow::anyhow!("boom"))
        })));
        let (status, body) = chat(
            State(state),
            Json(ChatRequest {
                message: "hello".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "boom");
    }

    #[tokio::test]
    async fn exhausted_retries_still_answer_200() {
        // The retry wrapper converts recovered failures into a plain string;
        // the HTTP layer must not treat it as an error.
        let state = state(CannedInvoker(Err(|| {
            AgentError::Connectivity("vManage unreachable".into())
        })));
        let reply = chat(
            State(state),
            Json(ChatRequest {
                message: "hello".into(),
            }),
        )
        .await
        .unwrap();
        assert!(reply.starts_with("ERROR: "));
    }

    #[tokio::test]
    async fn alert_without_channel_is_accepted_and_dropped() {
        let state = state(CannedInvoker(Ok("unused")));
        let status = alert(
            State(state),
            Json(AlertRequest {
                alert: "bfd session down at site 200".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn health_reports_package_version() {
        let Json(body) = health().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }
}
