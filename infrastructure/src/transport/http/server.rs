//! axum server binding
//!
//! Routes:
//! - `GET /`: banner
//! - `POST /execute`, `POST /execute_batch`, `POST /register_agent`
//! - `GET|POST /health`
//! - `GET /metrics`: server stats
//!
//! Authentication failures answer 401 with `{"detail": "Unauthorized"}`.

use super::dto::{
    BatchExecuteRequest, BatchExecuteResponse, ErrorDetail, ExecuteRequest, ExecuteResponse,
    RegisterAgentRequest,
};
use crate::transport::ServerError;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, Method, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use strix_application::{ServerStats, ServiceError, ToolService};
use strix_domain::{HealthReport, RegistrationAck};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// [`ServiceError`] rendered as an HTTP response.
struct ApiError(ServiceError);

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::EmptyBatch | ServiceError::MissingAgentId => StatusCode::BAD_REQUEST,
            ServiceError::MissingToken => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorDetail {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

async fn root() -> Json<Value> {
    Json(json!({"message": "Strix Tool Server is running"}))
}

async fn execute(
    State(service): State<Arc<ToolService>>,
    headers: HeaderMap,
    Json(mut body): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    service.authorize(authorization(&headers), body.auth_token.as_deref())?;
    body.auth_token = None;
    info!(tool = %body.tool_name, agent_id = %body.agent_id, "Execute request");
    let result = service.execute(body.into_invocation()).await;
    Ok(Json(result.into()))
}

async fn execute_batch(
    State(service): State<Arc<ToolService>>,
    headers: HeaderMap,
    Json(body): Json<BatchExecuteRequest>,
) -> Result<Json<BatchExecuteResponse>, ApiError> {
    service.authorize(authorization(&headers), body.auth_token.as_deref())?;
    let (agent_id, invocations) = body.into_invocations();
    let results = service.execute_batch(&agent_id, invocations).await?;
    Ok(Json(BatchExecuteResponse {
        results: results.into_iter().map(ExecuteResponse::from).collect(),
    }))
}

async fn register_agent(
    State(service): State<Arc<ToolService>>,
    headers: HeaderMap,
    Json(body): Json<RegisterAgentRequest>,
) -> Result<Json<RegistrationAck>, ApiError> {
    service.authorize(authorization(&headers), body.auth_token.as_deref())?;
    Ok(Json(service.register_agent(&body.agent_id)?))
}

async fn health(State(service): State<Arc<ToolService>>) -> Json<HealthReport> {
    Json(service.health().await)
}

async fn metrics(State(service): State<Arc<ToolService>>) -> Json<ServerStats> {
    Json(service.stats())
}

/// Build the router over a shared service.
pub fn router(service: Arc<ToolService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/execute", post(execute))
        .route("/execute_batch", post(execute_batch))
        .route("/register_agent", post(register_agent))
        .route("/health", get(health).post(health))
        .route("/metrics", get(metrics))
        .layer(cors)
        .with_state(service)
}

/// Serve until `shutdown` resolves; in-flight requests complete first.
pub async fn serve<S>(
    service: Arc<ToolService>,
    listener: TcpListener,
    shutdown: S,
) -> Result<(), ServerError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().map_err(ServerError::Io)?;
    info!(%addr, tools = service.tool_names().len(), "HTTP tool server listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Io)?;
    warn!("HTTP tool server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use strix_application::{
        ExecutorParams, FnTool, MetricsCollector, ServerParams, StaticProbe, ToolExecutor,
        ToolRegistry,
    };
    use strix_application::ports::tool::ready;
    use strix_domain::{NetworkStatus, ParamType, ToolDefinition, ToolParameter};
    use tower::ServiceExt;

    fn service(token: Option<&str>) -> Arc<ToolService> {
        let registry = ToolRegistry::new().register(FnTool::new(
            ToolDefinition::new("echo", "Echo").with_parameter(
                ToolParameter::new("n", "A number", true).with_type(ParamType::Integer),
            ),
            |args, _| ready(Ok(json!({"n": args.get("n").cloned()}))),
        ));
        let executor = ToolExecutor::new(Arc::new(registry), ExecutorParams::default());
        let mut params = ServerParams::default();
        if let Some(token) = token {
            params = params.with_auth_token(token);
        }
        Arc::new(
            ToolService::new(
                Arc::new(executor),
                Arc::new(MetricsCollector::new()),
                Arc::new(StaticProbe(NetworkStatus::Connected)),
                params,
            )
            .unwrap(),
        )
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post(path: &str, auth: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post(path).header("content-type", "application/json");
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_execute_with_header_token() {
        let app = router(service(Some("tok")));
        let (status, body) = call(
            app,
            post("/execute", Some("Bearer tok"), json!({"tool_name": "echo", "kwargs": {"n": "42"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["result"], json!({"n": 42}));
        assert_eq!(body["exit_code"], json!(0));
    }

    #[tokio::test]
    async fn test_execute_with_body_token() {
        let app = router(service(Some("tok")));
        let (status, _) = call(
            app,
            post("/execute", None, json!({"tool_name": "echo", "kwargs": {"n": 1}, "auth_token": "tok"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_token_is_401() {
        let app = router(service(Some("tok")));
        let (status, body) = call(
            app,
            post("/execute", Some("Bearer nope"), json!({"tool_name": "echo"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"detail": "Unauthorized"}));
    }

    #[tokio::test]
    async fn test_tool_failure_is_200_with_kind() {
        let app = router(service(None));
        let (status, body) = call(
            app,
            post("/execute", None, json!({"tool_name": "echo", "kwargs": {"n": "abc"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error_kind"], json!("invalid_arguments"));
        assert_eq!(body["exit_code"], json!(1));
    }

    #[tokio::test]
    async fn test_empty_batch_is_400() {
        let app = router(service(None));
        let (status, body) = call(app, post("/execute_batch", None, json!({"tools": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], json!("tools list is required"));
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let app = router(service(None));
        let (status, body) = call(
            app,
            post(
                "/execute_batch",
                None,
                json!({"agent_id": "a1", "tools": [
                    {"tool_name": "missing"},
                    {"tool_name": "echo", "kwargs": {"n": 7}},
                ]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["error_kind"], json!("not_found"));
        assert_eq!(results[1]["result"], json!({"n": 7}));
    }

    #[tokio::test]
    async fn test_register_then_health_and_metrics() {
        let svc = service(None);
        let (status, body) = call(
            router(Arc::clone(&svc)),
            post("/register_agent", None, json!({"agent_id": "agent-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Agent agent-1 registered successfully"));

        let (status, body) = call(
            router(Arc::clone(&svc)),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], json!(true));
        assert_eq!(body["registered_agents"], json!(1));
        assert_eq!(body["network_status"], json!("connected"));

        let (status, _) = call(router(Arc::clone(&svc)), post("/health", None, json!({}))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(
            router(svc),
            Request::get("/metrics").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_requests"], json!(0));
    }

    #[tokio::test]
    async fn test_banner() {
        let (status, body) = call(
            router(service(None)),
            Request::get("/").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], json!("Strix Tool Server is running"));
    }
}
