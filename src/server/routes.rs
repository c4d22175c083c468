//! HTTP route handlers for the Usha periodic-table API.

use std::sync::Arc;

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use url::form_urlencoded;

use crate::catalog::{Classification, ElementFilter, ElementRecord, Series};
use crate::chat::{ChatError, ChatTurn, ConversationContext, SessionError, SessionId, SessionSnapshot};
use crate::layout::{GridCell, grid_position};

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/api/elements", get(list_elements))
        .route("/api/elements/{number}", get(element_by_number))
        .route("/api/elements/by-name/{name}", get(element_by_name))
        .route("/api/classifications", get(list_classifications))
        .route("/api/chat", post(chat_once))
        .route("/api/sessions", post(open_session))
        .route("/api/sessions/{id}", get(get_session).delete(close_session))
        .route("/api/sessions/{id}/context", put(switch_context))
        .route("/api/sessions/{id}/messages", post(send_session_message))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "usha-table",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Element with its table position.
#[derive(Debug, Serialize)]
pub struct ElementDto {
    /// Catalog record.
    #[serde(flatten)]
    pub element: ElementRecord,
    /// Inner-transition series, if any.
    pub series: Option<Series>,
    /// Cell in the rendered table.
    pub grid: GridCell,
}

impl From<&ElementRecord> for ElementDto {
    fn from(element: &ElementRecord) -> Self {
        Self {
            series: element.series(),
            grid: grid_position(element),
            element: element.clone(),
        }
    }
}

/// Parse repeated `classification`, `block` and `series` parameters.
fn parse_filter(query: Option<&str>) -> Result<ElementFilter, (StatusCode, String)> {
    let mut filter = ElementFilter::new();
    let Some(query) = query else {
        return Ok(filter);
    };

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let bad = |what: &str| (StatusCode::BAD_REQUEST, format!("Unknown {what}: {value}"));
        match key.as_ref() {
            "classification" => {
                let classification: Classification =
                    value.parse().map_err(|_| bad("classification"))?;
                filter.classifications.insert(classification);
            }
            "block" => {
                filter
                    .blocks
                    .insert(value.parse().map_err(|_| bad("block"))?);
            }
            "series" => {
                let series: Series = value.parse().map_err(|_| bad("series"))?;
                filter.series.insert(series);
            }
            _ => {}
        }
    }
    Ok(filter)
}

/// List elements, optionally filtered.
async fn list_elements(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<ElementDto>>, (StatusCode, String)> {
    let filter = parse_filter(query.as_deref())?;
    let elements = state
        .catalog
        .filter(&filter)
        .into_iter()
        .map(ElementDto::from)
        .collect();
    Ok(Json(elements))
}

/// Look up an element by atomic number.
async fn element_by_number(
    State(state): State<Arc<AppState>>,
    Path(number): Path<u32>,
) -> Result<Json<ElementDto>, (StatusCode, String)> {
    state
        .catalog
        .lookup_by_atomic_number(number)
        .map(|e| Json(ElementDto::from(e)))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No element with atomic number {number}")))
}

/// Look up an element by name, ignoring case.
async fn element_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ElementDto>, (StatusCode, String)> {
    state
        .catalog
        .lookup_by_name(&name)
        .map(|e| Json(ElementDto::from(e)))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("No element named {name}")))
}

/// Sorted distinct classifications.
async fn list_classifications(State(state): State<Arc<AppState>>) -> Json<Vec<Classification>> {
    Json(state.catalog.list_classifications().into_iter().collect())
}

/// Stateless chat request.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Conversation so far, oldest first.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// Element name to scope the answer to.
    pub element: Option<String>,
}

/// Stateless chat response.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub reply: String,
    /// Element the reply was scoped to, if the name resolved.
    pub element: Option<String>,
}

/// Answer one message without storing anything.
async fn chat_once(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    if request.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, SessionError::EmptyMessage.to_string()));
    }

    let element = request
        .element
        .as_deref()
        .and_then(|name| state.catalog.lookup_by_name(name));

    let reply = state
        .chat
        .send_message(&request.message, &request.history, element)
        .await
        .map_err(|e| {
            tracing::warn!("Stateless chat failed: {e}");
            (StatusCode::BAD_GATEWAY, ChatError::USER_FALLBACK.to_string())
        })?;

    Ok(Json(ChatResponse {
        reply,
        element: element.map(|e| e.name.clone()),
    }))
}

/// Context selection body for opening or switching a session.
#[derive(Debug, Default, Deserialize)]
pub struct ContextRequest {
    /// Element name; absent or unknown means general chat.
    #[serde(default)]
    pub element: Option<String>,
}

impl ContextRequest {
    fn resolve(&self, state: &AppState) -> ConversationContext {
        ConversationContext::from_lookup(
            self.element
                .as_deref()
                .and_then(|name| state.catalog.lookup_by_name(name)),
        )
    }
}

/// Message body for a session.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// The user's message.
    pub text: String,
}

/// Outcome of a session message.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    /// Assistant turn appended for this message.
    pub reply: ChatTurn,
    /// Session after the reply was applied.
    pub session: SessionSnapshot,
}

fn session_error(err: SessionError) -> (StatusCode, String) {
    let status = match err {
        SessionError::UnknownSession(_) => StatusCode::NOT_FOUND,
        SessionError::RequestPending | SessionError::Superseded => StatusCode::CONFLICT,
        SessionError::EmptyMessage => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string())
}

/// Open a session.
async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContextRequest>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let context = request.resolve(&state);
    (StatusCode::CREATED, Json(state.sessions.open(context)))
}

/// Fetch a session.
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    state.sessions.get(id).map(Json).map_err(session_error)
}

/// Reset a session to a new context.
async fn switch_context(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<ContextRequest>,
) -> Result<Json<SessionSnapshot>, (StatusCode, String)> {
    let context = request.resolve(&state);
    state
        .sessions
        .switch_context(id, context)
        .map(Json)
        .map_err(session_error)
}

/// Send a message within a session.
async fn send_session_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, (StatusCode, String)> {
    let reply = state
        .sessions
        .send(id, &request.text, state.chat.as_ref())
        .await
        .map_err(session_error)?;
    let session = state.sessions.get(id).map_err(session_error)?;
    Ok(Json(SendMessageResponse { reply, session }))
}

/// Close a session.
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> StatusCode {
    if state.sessions.close(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::ElementCatalog;
    use crate::chat::{ChatResult, ChatService};
    use crate::config::UshaConfig;

    /// Replies with the element it was asked about, or fails on "fail".
    struct FakeChat;

    #[async_trait]
    impl ChatService for FakeChat {
        async fn send_message(
            &self,
            text: &str,
            prior_turns: &[ChatTurn],
            context: Option<&ElementRecord>,
        ) -> ChatResult<String> {
            if text == "fail" {
                return Err(ChatError::UpstreamUnavailable {
                    status: Some(500),
                    message: "down".to_string(),
                });
            }
            let about = context.map_or("general", |e| e.symbol.as_str());
            Ok(format!("[{about}] {} prior", prior_turns.len()))
        }
    }

    fn app() -> Router {
        let state = AppState::with_parts(
            UshaConfig::new("test-key"),
            ElementCatalog::bundled().unwrap(),
            Arc::new(FakeChat),
        );
        create_router(state)
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = call(app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn element_lookup_by_number_and_name() {
        let (status, body) = call(app(), Method::GET, "/api/elements/8", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Oxygen");
        assert_eq!(body["atomicNumber"], 8);
        assert_eq!(body["grid"], json!({"row": 2, "column": 16}));

        let (status, body) = call(app(), Method::GET, "/api/elements/by-name/gOLD", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "Au");

        let (status, _) = call(app(), Method::GET, "/api/elements/0", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(app(), Method::GET, "/api/elements/119", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn elements_are_filtered_by_repeated_parameters() {
        let (status, body) = call(
            app(),
            Method::GET,
            "/api/elements?classification=Noble%20gas&classification=Halogen",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let symbols: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["symbol"].as_str().unwrap())
            .collect();
        assert_eq!(
            symbols,
            ["F", "Ne", "Cl", "Ar", "Br", "Kr", "I", "Xe", "At", "Rn", "Ts", "Og"]
        );

        let (_, body) = call(app(), Method::GET, "/api/elements?series=actinide", None).await;
        let actinides = body.as_array().unwrap();
        assert_eq!(actinides.len(), 15);
        assert_eq!(actinides[0]["grid"], json!({"row": 10, "column": 4}));

        let (status, _) = call(app(), Method::GET, "/api/elements?block=x", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = call(app(), Method::GET, "/api/elements", None).await;
        assert_eq!(body.as_array().unwrap().len(), 118);
    }

    #[tokio::test]
    async fn classifications_are_sorted_and_distinct() {
        let (_, body) = call(app(), Method::GET, "/api/classifications", None).await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 10);
        assert!(!list.contains(&json!("Unknown")));
    }

    #[tokio::test]
    async fn stateless_chat_resolves_element_and_reports_failures() {
        let (status, body) = call(
            app(),
            Method::POST,
            "/api/chat",
            Some(json!({"message": "Mass?", "element": "hydrogen"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "[H] 0 prior");
        assert_eq!(body["element"], "Hydrogen");

        let (_, body) = call(
            app(),
            Method::POST,
            "/api/chat",
            Some(json!({"message": "Hi", "element": "Kryptonite"})),
        )
        .await;
        assert_eq!(body["reply"], "[general] 0 prior");
        assert_eq!(body["element"], Value::Null);

        let (status, _) = call(
            app(),
            Method::POST,
            "/api/chat",
            Some(json!({"message": "fail"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let app = app();

        let (status, opened) = call(
            app.clone(),
            Method::POST,
            "/api/sessions",
            Some(json!({"element": "Hydrogen"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = opened["id"].as_str().unwrap().to_string();
        assert_eq!(opened["turns"].as_array().unwrap().len(), 1);
        assert_eq!(opened["context"]["kind"], "element");

        let (status, body) = call(
            app.clone(),
            Method::POST,
            &format!("/api/sessions/{id}/messages"),
            Some(json!({"text": "Tell me more"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"]["text"], "[H] 1 prior");
        assert_eq!(body["session"]["turns"].as_array().unwrap().len(), 3);

        let (_, body) = call(
            app.clone(),
            Method::POST,
            &format!("/api/sessions/{id}/messages"),
            Some(json!({"text": "fail"})),
        )
        .await;
        assert_eq!(body["reply"]["text"], ChatError::USER_FALLBACK);

        let (status, body) = call(
            app.clone(),
            Method::PUT,
            &format!("/api/sessions/{id}/context"),
            Some(json!({"element": "Oxygen"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let turns = body["turns"].as_array().unwrap();
        assert_eq!(turns.len(), 1);
        assert!(turns[0]["text"].as_str().unwrap().contains("Oxygen"));

        let (status, _) = call(
            app.clone(),
            Method::POST,
            &format!("/api/sessions/{id}/messages"),
            Some(json!({"text": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(app.clone(), Method::DELETE, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(app, Method::GET, &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_element_opens_general_session() {
        let (_, opened) = call(
            app(),
            Method::POST,
            "/api/sessions",
            Some(json!({"element": "Adamantium"})),
        )
        .await;
        assert_eq!(opened["context"]["kind"], "general");
        assert_eq!(
            opened["turns"][0]["text"],
            "Hello! I'm Usha. How can I assist you with your chemistry questions today?"
        );
    }
}
