//! HTTP gateway for kbrelay.
//!
//! Exposes the request façade over plain JSON routes:
//!
//! - `POST /ask` — answer a question
//! - `GET|POST /api/policy` — read and overwrite a company's policy
//! - `GET /api/companies` — list companies and the documents they hold
//! - `GET /health`
//! - `GET /` — the embedded policy editor
//!
//! Built on Axum. The gateway holds no per-request state; every request
//! goes straight to the façade, which reads the filesystem afresh.

pub mod frontend;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Query};
use axum::http::{HeaderValue, Method, StatusCode, header, request};
use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use kbrelay_config::{AppConfig, GatewayConfig};
use kbrelay_relay::{FailureKind, RelayContext, Reply, RequestFacade};
use kbrelay_store::CompanySummary;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub facade: RequestFacade,
    pub config: GatewayConfig,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request body size limit (`gateway.max_body_bytes`)
/// - CORS for localhost origins
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.config.max_body_bytes;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(is_local_origin))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/ask", post(ask_handler))
        .route("/api/policy", get(get_policy_handler).post(save_policy_handler))
        .route("/api/companies", get(companies_handler))
        .with_state(state)
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Gateway state for `config`. Without an API key the policy routes still
/// work and `/ask` answers with a configuration error.
pub fn state_from_config(config: &AppConfig) -> SharedState {
    let provider = kbrelay_providers::build_or_unconfigured(config);
    let context = RelayContext::new(config.knowledge_root.clone(), provider, config.model.clone())
        .with_max_tokens(config.max_tokens);

    Arc::new(GatewayState {
        facade: RequestFacade::new(context),
        config: config.gateway.clone(),
    })
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let app = build_router(state_from_config(&config));

    info!(
        addr = %addr,
        knowledge_root = %config.knowledge_root.display(),
        model = %config.model,
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

fn is_local_origin(origin: &HeaderValue, _parts: &request::Parts) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    let host = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
        .unwrap_or("");
    let host = host.split(':').next().unwrap_or("");
    matches!(host, "localhost" | "127.0.0.1")
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

async fn ask_handler(
    State(state): State<SharedState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, JsonReply> {
    let Json(payload) = payload.map_err(rejected)?;
    info!(question_len = payload.question.len(), "Question received");
    let answer = state.facade.ask(&payload.question).await;
    Ok(Json(AskResponse { answer }))
}

#[derive(Deserialize)]
struct PolicyQuery {
    company: Option<String>,
}

#[derive(Deserialize)]
struct SavePolicyRequest {
    content: Option<String>,
    company: Option<String>,
}

type JsonReply = (StatusCode, Json<Value>);

fn failure(status: StatusCode, error: impl Into<String>) -> JsonReply {
    (
        status,
        Json(json!({ "success": false, "error": error.into() })),
    )
}

/// Malformed bodies get the same JSON error shape as every other failure.
/// An oversized body keeps its 413.
fn rejected(rejection: JsonRejection) -> JsonReply {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    warn!(status = %status, error = %rejection.body_text(), "Rejected request body");
    failure(status, rejection.body_text())
}

fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Validation => StatusCode::BAD_REQUEST,
        FailureKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn get_policy_handler(
    State(state): State<SharedState>,
    Query(query): Query<PolicyQuery>,
) -> JsonReply {
    match state.facade.load_policy(query.company.as_deref()).await {
        Reply::Ok { company, text } => (
            StatusCode::OK,
            Json(json!({ "success": true, "content": text, "company": company })),
        ),
        Reply::Failed { kind, error } => failure(failure_status(kind), error),
    }
}

async fn save_policy_handler(
    State(state): State<SharedState>,
    payload: Result<Json<SavePolicyRequest>, JsonRejection>,
) -> JsonReply {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected(rejection),
    };
    let Some(content) = payload.content else {
        return failure(StatusCode::BAD_REQUEST, "Missing 'content' field");
    };

    match state
        .facade
        .save_policy(payload.company.as_deref(), &content)
        .await
    {
        Reply::Ok { company, text } => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": text, "company": company })),
        ),
        Reply::Failed { kind, error } => failure(failure_status(kind), error),
    }
}

#[derive(Serialize)]
struct CompanyEntry {
    name: String,
    has_knowledge: bool,
    has_policy: bool,
}

impl From<CompanySummary> for CompanyEntry {
    fn from(s: CompanySummary) -> Self {
        Self {
            name: s.name,
            has_knowledge: s.has_knowledge,
            has_policy: s.has_policy,
        }
    }
}

async fn companies_handler(State(state): State<SharedState>) -> JsonReply {
    match state.facade.companies().await {
        Ok(companies) => {
            let companies: Vec<CompanyEntry> = companies.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(json!({ "companies": companies })))
        }
        Err(e) => {
            error!(error = %e, "Listing companies failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use kbrelay_core::message::Message;
    use kbrelay_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use kbrelay_core::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Answers every request with the same text and counts calls.
    struct FixedProvider {
        reply: String,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Provider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ProviderResponse {
                message: Message::assistant(self.reply.clone()),
                usage: None,
                model: "fixed-model".into(),
            })
        }
    }

    fn test_state(reply: &str) -> (TempDir, SharedState, Arc<FixedProvider>) {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(FixedProvider {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
        });
        let context = RelayContext::new(dir.path(), provider.clone(), "fixed-model");
        let state = Arc::new(GatewayState {
            facade: RequestFacade::new(context),
            config: GatewayConfig::default(),
        });
        (dir, state, provider)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (_dir, state, _) = test_state("unused");
        let app = build_router(state);

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn ask_returns_answer_text() {
        let (dir, state, provider) = test_state("Refunds take 30 days.");
        std::fs::create_dir_all(dir.path().join("Acme")).unwrap();
        std::fs::write(dir.path().join("Acme/companyinfo"), "Refund window: 30 days").unwrap();

        let app = build_router(state);
        let response = app
            .oneshot(json_request(
                "POST",
                "/ask",
                json!({ "question": "What is Acme's refund policy?" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "Refunds take 30 days.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ask_diagnostics_are_still_200() {
        let (_dir, state, provider) = test_state("unused");
        let app = build_router(state);
        let response = app
            .oneshot(json_request("POST", "/ask", json!({ "question": "anything" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["answer"].as_str().unwrap().contains("0 companies"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn policy_save_then_get() {
        let (_dir, state, _) = test_state("unused");
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/policy",
                json!({ "company": "Acme", "content": "No salaries.\n" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["company"], "Acme");

        let req = Request::builder()
            .uri("/api/policy?company=Acme")
            .body(Body::empty())
            .unwrap();
        let body = body_json(app.oneshot(req).await.unwrap()).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["content"], "No salaries.\n");
    }

    #[tokio::test]
    async fn get_policy_without_file_is_empty() {
        let (dir, state, _) = test_state("unused");
        std::fs::create_dir_all(dir.path().join("Acme")).unwrap();
        let app = build_router(state);

        let req = Request::builder()
            .uri("/api/policy")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["content"], "");
        assert_eq!(body["company"], "Acme");
    }

    #[tokio::test]
    async fn traversal_company_is_rejected() {
        let (dir, state, _) = test_state("unused");
        let app = build_router(state);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/policy",
                json!({ "company": "../escape", "content": "x" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Invalid company identifier"));
        assert!(!dir.path().parent().unwrap().join("escape").exists());
    }

    #[tokio::test]
    async fn save_without_content_is_rejected() {
        let (_dir, state, _) = test_state("unused");
        let app = build_router(state);
        let response = app
            .oneshot(json_request("POST", "/api/policy", json!({ "company": "Acme" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn companies_lists_documents() {
        let (dir, state, _) = test_state("unused");
        std::fs::create_dir_all(dir.path().join("Acme")).unwrap();
        std::fs::write(dir.path().join("Acme/companyinfo"), "k").unwrap();
        std::fs::create_dir_all(dir.path().join("Nexus")).unwrap();

        let app = build_router(state);
        let req = Request::builder()
            .uri("/api/companies")
            .body(Body::empty())
            .unwrap();
        let body = body_json(app.oneshot(req).await.unwrap()).await;
        let companies = body["companies"].as_array().unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0]["name"], "Acme");
        assert_eq!(companies[0]["has_knowledge"], true);
        assert_eq!(companies[1]["has_policy"], false);
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(FixedProvider {
            reply: "x".into(),
            calls: AtomicUsize::new(0),
        });
        let state = Arc::new(GatewayState {
            facade: RequestFacade::new(RelayContext::new(dir.path(), provider, "m")),
            config: GatewayConfig {
                max_body_bytes: 64,
                ..GatewayConfig::default()
            },
        });
        let app = build_router(state);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/policy",
                json!({ "company": "Acme", "content": "x".repeat(1024) }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
    }

    fn raw_request(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn malformed_policy_bodies_get_json_errors() {
        let (dir, state, _) = test_state("unused");
        let app = build_router(state);

        for body in [
            "not json",
            r#"{"company":"Acme","content":123}"#,
            r#"{"company":5,"content":"x"}"#,
        ] {
            let response = app.clone().oneshot(raw_request("/api/policy", body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert!(
                response.headers()["content-type"]
                    .to_str()
                    .unwrap()
                    .starts_with("application/json"),
                "{body}"
            );
            let json = body_json(response).await;
            assert_eq!(json["success"], false, "{body}");
            assert!(!json["error"].as_str().unwrap().is_empty(), "{body}");
        }
        assert!(!dir.path().join("Acme").exists());
    }

    #[tokio::test]
    async fn malformed_ask_body_gets_json_error() {
        let (_dir, state, provider) = test_state("unused");
        let app = build_router(state);

        let response = app
            .oneshot(raw_request("/ask", r#"{"question":42}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn serves_policy_editor_without_api_key() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Acme")).unwrap();
        std::fs::write(dir.path().join("Acme/companyinfo"), "Refund window: 30 days").unwrap();
        let config = AppConfig {
            api_key: None,
            knowledge_root: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let app = build_router(state_from_config(&config));

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/policy",
                json!({ "company": "Acme", "content": "No refunds talk." }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Acme/policy")).unwrap(),
            "No refunds talk."
        );

        let response = app
            .oneshot(json_request("POST", "/ask", json!({ "question": "Acme refunds?" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["answer"].as_str().unwrap().starts_with("Model API error:"));
    }

    #[test]
    fn local_origins_only() {
        let (parts, _) = Request::new(()).into_parts();
        let allowed = |o: &str| is_local_origin(&HeaderValue::from_str(o).unwrap(), &parts);
        assert!(allowed("http://localhost:8000"));
        assert!(allowed("http://127.0.0.1:3000"));
        assert!(!allowed("https://evil.example.com"));
        assert!(!allowed("http://localhost.evil.com"));
    }
}
