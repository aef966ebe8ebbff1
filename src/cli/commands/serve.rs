//! HTTP API server for course questions.
//!
//! Provides REST endpoints for querying the course assistant and listing
//! the indexed courses.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::PensumError;
use crate::rag::RagSystem;
use crate::tools::Source;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
pub struct AppState {
    pub rag: RagSystem,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let rag = RagSystem::new(&settings)?;

    let docs_dir = settings.docs_dir();
    if settings.server.load_docs_on_start && docs_dir.is_dir() {
        let spinner = Output::spinner(&format!("Loading courses from {}...", docs_dir.display()));
        let loaded = rag.add_course_folder(&docs_dir, false).await;
        spinner.finish_and_clear();

        match loaded {
            Ok((courses, chunks)) => {
                Output::success(&format!("Loaded {} new courses ({} chunks)", courses, chunks));
            }
            Err(e) => Output::warning(&format!("Could not load courses: {}", e)),
        }
    }

    let state = Arc::new(AppState { rag });
    let app = router(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Pensum API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query", "POST /api/query");
    Output::kv("Courses", "GET  /api/courses");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResponse {
    answer: String,
    sources: Vec<Source>,
    session_id: String,
}

#[derive(Serialize)]
struct CoursesResponse {
    total_courses: usize,
    course_titles: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn internal_error(e: PensumError) -> Response {
    error!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            detail: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> Response {
    let session_id = req
        .session_id
        .unwrap_or_else(|| state.rag.sessions().create_session());

    match state.rag.query(&req.query, Some(&session_id)).await {
        Ok(answer) => Json(QueryResponse {
            answer: answer.answer,
            sources: answer.sources,
            session_id,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn courses(State(state): State<Arc<AppState>>) -> Response {
    match state.rag.course_analytics().await {
        Ok(analytics) => Json(CoursesResponse {
            total_courses: analytics.total_courses,
            course_titles: analytics.course_titles,
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, CourseChunk};
    use crate::testing::{text_response, ScriptedClient, VocabEmbedder};
    use crate::vector_store::MemoryVectorStore;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(responses: Vec<crate::generation::MessageResponse>) -> (Router, Arc<AppState>) {
        let rag = RagSystem::with_components(
            &Settings::default(),
            Arc::new(ScriptedClient::new(responses)),
            Arc::new(VocabEmbedder::new()),
            Arc::new(MemoryVectorStore::new()),
        )
        .unwrap();
        let state = Arc::new(AppState { rag });
        (router(state.clone()), state)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_query(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(vec![]);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_query_creates_session() {
        let (app, state) = app(vec![text_response("MCP is a protocol.")]);

        let (status, body) = send(app, post_query(json!({"query": "What is MCP?", "extra": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "MCP is a protocol.");
        assert_eq!(body["sources"], json!([]));
        assert_eq!(body["session_id"], "session_1");

        let history = state.rag.sessions().conversation_history("session_1").unwrap();
        assert_eq!(history, "User: What is MCP?\nAssistant: MCP is a protocol.");
    }

    #[tokio::test]
    async fn test_query_keeps_given_session() {
        let (app, _) = app(vec![text_response("Yes.")]);

        let (status, body) = send(
            app,
            post_query(json!({"query": "Really?", "session_id": "session_42"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session_id"], "session_42");
    }

    #[tokio::test]
    async fn test_generation_failure_is_500_with_detail() {
        let (app, _) = app(vec![]);

        let (status, body) = send(app, post_query(json!({"query": "What is MCP?"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .contains("no scripted response left"));
    }

    #[tokio::test]
    async fn test_wrong_body_type_is_422() {
        let (app, _) = app(vec![]);

        let (status, _) = send(app, post_query(json!({"query": 42}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_courses() {
        let (app, state) = app(vec![]);
        let mut course = Course::new("Intro to ML");
        course.instructor = Some("Dr. Jane Smith".to_string());
        let chunks = vec![CourseChunk {
            content: "Gradient descent minimizes loss.".to_string(),
            course_title: course.title.clone(),
            lesson_number: Some(0),
            chunk_index: 0,
        }];
        state
            .rag
            .library()
            .index()
            .add_course(&course, &chunks)
            .await
            .unwrap();

        let request = Request::builder().uri("/api/courses").body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"total_courses": 1, "course_titles": ["Intro to ML"]})
        );
    }
}
