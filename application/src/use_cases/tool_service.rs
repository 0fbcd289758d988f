//! Server-side tool service
//!
//! Everything the HTTP and gRPC servers share: token checks, delegation to
//! the local executor, agent registration, metrics and health. The wire
//! adapters only translate requests and map [`ServiceError`] onto their
//! own status codes.

use crate::config::ServerParams;
use crate::metrics::{MetricsCollector, ServerStats};
use crate::ports::network_probe::NetworkProbe;
use crate::ports::tool_executor::ToolExecutorPort;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use strix_domain::{ErrorKind, HealthReport, RegistrationAck, ToolInvocation, ToolResult};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("tools list is required")]
    EmptyBatch,

    #[error("agent_id is required")]
    MissingAgentId,

    #[error("Authentication is required but no server token is configured")]
    MissingToken,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Unauthorized => ErrorKind::Unauthorized,
            ServiceError::EmptyBatch | ServiceError::MissingAgentId => ErrorKind::InvalidArguments,
            ServiceError::MissingToken => ErrorKind::ServerError,
        }
    }
}

pub struct ToolService {
    executor: Arc<dyn ToolExecutorPort>,
    metrics: Arc<MetricsCollector>,
    probe: Arc<dyn NetworkProbe>,
    params: ServerParams,
    agents: RwLock<HashSet<String>>,
}

impl ToolService {
    /// Fails when authentication is required but no token is configured.
    pub fn new(
        executor: Arc<dyn ToolExecutorPort>,
        metrics: Arc<MetricsCollector>,
        probe: Arc<dyn NetworkProbe>,
        params: ServerParams,
    ) -> Result<Self, ServiceError> {
        if params.auth_token.is_none() {
            if params.require_auth {
                return Err(ServiceError::MissingToken);
            }
            warn!(
                "No server token configured: every request will be accepted. \
                 Set STRIX_SERVER_TOKEN to require authentication."
            );
        }
        Ok(Self {
            executor,
            metrics,
            probe,
            params,
            agents: RwLock::new(HashSet::new()),
        })
    }

    pub fn params(&self) -> &ServerParams {
        &self.params
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.executor.tool_names()
    }

    /// Check the caller's token.
    ///
    /// `header` is the raw `Authorization` value (`Bearer <token>`);
    /// `body_token` is the in-message fallback. Empty values count as
    /// absent. Always succeeds when no token is configured.
    pub fn authorize(
        &self,
        header: Option<&str>,
        body_token: Option<&str>,
    ) -> Result<(), ServiceError> {
        let Some(expected) = self.params.auth_token.as_deref() else {
            return Ok(());
        };
        let presented = header
            .and_then(bearer_token)
            .or(body_token.filter(|t| !t.is_empty()));

        match presented {
            Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
            Some(_) => {
                warn!("Rejected request with invalid token");
                Err(ServiceError::Unauthorized)
            }
            None => {
                warn!("Rejected request without token");
                Err(ServiceError::Unauthorized)
            }
        }
    }

    pub async fn execute(&self, invocation: ToolInvocation) -> ToolResult {
        let tool_name = invocation.tool_name.clone();
        debug!(
            agent_id = %invocation.agent_id,
            tool = %tool_name,
            args = %invocation.argument_summary(),
            "Executing tool"
        );
        let started = Instant::now();
        let result = self.executor.execute(invocation).await;
        self.metrics
            .record(&tool_name, started.elapsed(), result.is_success(), result.kind());
        result
    }

    pub async fn execute_batch(
        &self,
        agent_id: &str,
        invocations: Vec<ToolInvocation>,
    ) -> Result<Vec<ToolResult>, ServiceError> {
        if invocations.is_empty() {
            return Err(ServiceError::EmptyBatch);
        }
        let names: Vec<String> = invocations.iter().map(|i| i.tool_name.clone()).collect();
        debug!(agent_id, size = names.len(), "Executing batch");

        let started = Instant::now();
        let results = self.executor.execute_batch(invocations).await;
        let share = started.elapsed() / names.len() as u32;
        for (name, result) in names.iter().zip(&results) {
            self.metrics
                .record(name, share, result.is_success(), result.kind());
        }
        Ok(results)
    }

    pub fn register_agent(&self, agent_id: &str) -> Result<RegistrationAck, ServiceError> {
        if agent_id.trim().is_empty() {
            return Err(ServiceError::MissingAgentId);
        }
        let added = self.agents.write().insert(agent_id.to_string());
        if added {
            info!(agent_id, "Agent registered");
        }
        Ok(RegistrationAck::accepted(agent_id))
    }

    pub fn registered_agents(&self) -> Vec<String> {
        let mut agents: Vec<String> = self.agents.read().iter().cloned().collect();
        agents.sort();
        agents
    }

    pub async fn health(&self) -> HealthReport {
        let registered_agents = self.agents.read().len();
        let network_status = self.probe.check().await;
        HealthReport {
            healthy: true,
            version: self.params.version.clone(),
            registered_agents,
            tool_count: self.executor.tool_count(),
            network_status,
            reason: None,
            metrics: self.metrics.summary(),
            workers: self.executor.worker_stats(),
        }
    }

    pub fn stats(&self) -> ServerStats {
        self.metrics.server_stats()
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutorParams;
    use crate::ports::network_probe::StaticProbe;
    use crate::ports::tool::{FnTool, ready};
    use crate::registry::ToolRegistry;
    use crate::use_cases::tool_executor::ToolExecutor;
    use serde_json::json;
    use strix_domain::{NetworkStatus, ToolDefinition, ToolError};

    fn service(params: ServerParams) -> Result<ToolService, ServiceError> {
        let registry = ToolRegistry::new()
            .register(FnTool::new(ToolDefinition::new("ping", "Ping"), |_, _| {
                ready(Ok(json!("pong")))
            }))
            .register(FnTool::new(ToolDefinition::new("fail", "Fail"), |_, _| {
                ready(Err(ToolError::execution("nope")))
            }));
        let executor = ToolExecutor::new(Arc::new(registry), ExecutorParams::default());
        ToolService::new(
            Arc::new(executor),
            Arc::new(MetricsCollector::new()),
            Arc::new(StaticProbe(NetworkStatus::Connected)),
            params,
        )
    }

    struct SlowProbe;

    #[async_trait::async_trait]
    impl NetworkProbe for SlowProbe {
        async fn check(&self) -> NetworkStatus {
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            NetworkStatus::Connected
        }
    }

    fn service_with_probe(probe: Arc<dyn NetworkProbe>) -> ToolService {
        let registry = ToolRegistry::new().register(FnTool::new(
            ToolDefinition::new("ping", "Ping"),
            |_, _| ready(Ok(json!("pong"))),
        ));
        let executor = ToolExecutor::new(Arc::new(registry), ExecutorParams::default());
        ToolService::new(
            Arc::new(executor),
            Arc::new(MetricsCollector::new()),
            probe,
            ServerParams::default(),
        )
        .unwrap()
    }

    fn secured() -> ToolService {
        service(ServerParams::default().with_auth_token("s3cret")).unwrap()
    }

    #[test]
    fn test_header_token_accepted() {
        let svc = secured();
        assert!(svc.authorize(Some("Bearer s3cret"), None).is_ok());
        assert!(svc.authorize(Some("bearer s3cret"), None).is_ok());
    }

    #[test]
    fn test_body_token_fallback() {
        let svc = secured();
        assert!(svc.authorize(None, Some("s3cret")).is_ok());
        assert!(svc.authorize(Some(""), Some("s3cret")).is_ok());
    }

    #[test]
    fn test_wrong_or_missing_token_rejected() {
        let svc = secured();
        assert_eq!(
            svc.authorize(Some("Bearer nope"), None),
            Err(ServiceError::Unauthorized)
        );
        assert_eq!(svc.authorize(None, None), Err(ServiceError::Unauthorized));
        assert_eq!(
            svc.authorize(Some("Basic s3cret"), None),
            Err(ServiceError::Unauthorized)
        );
    }

    #[test]
    fn test_no_token_configured_accepts_everything() {
        let svc = service(ServerParams::default()).unwrap();
        assert!(svc.authorize(None, None).is_ok());
        assert!(svc.authorize(Some("Bearer anything"), None).is_ok());
    }

    #[test]
    fn test_required_auth_without_token_refuses_to_start() {
        let result = service(ServerParams::default().with_require_auth(true));
        assert_eq!(result.err(), Some(ServiceError::MissingToken));
    }

    #[tokio::test]
    async fn test_execute_records_metrics() {
        let svc = secured();
        assert_eq!(
            svc.execute(ToolInvocation::new("ping")).await,
            ToolResult::success("pong")
        );
        let failed = svc.execute(ToolInvocation::new("fail")).await;
        assert_eq!(failed.kind(), Some(ErrorKind::ExecutionError));

        let stats = svc.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.total_errors, 1);
        assert_eq!(stats.tools["fail"].errors_by_kind["execution_error"], 1);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let svc = secured();
        assert_eq!(
            svc.execute_batch("a1", Vec::new()).await,
            Err(ServiceError::EmptyBatch)
        );
        assert_eq!(ServiceError::EmptyBatch.kind(), ErrorKind::InvalidArguments);
    }

    #[tokio::test]
    async fn test_batch_results_in_order() {
        let svc = secured();
        let results = svc
            .execute_batch(
                "a1",
                vec![
                    ToolInvocation::new("fail"),
                    ToolInvocation::new("ping"),
                    ToolInvocation::new("missing"),
                ],
            )
            .await
            .unwrap();
        assert_eq!(results[0].kind(), Some(ErrorKind::ExecutionError));
        assert_eq!(results[1], ToolResult::success("pong"));
        assert_eq!(results[2].kind(), Some(ErrorKind::NotFound));
        assert_eq!(svc.stats().total_requests, 3);
    }

    #[tokio::test]
    async fn test_registration_and_health() {
        let svc = secured();
        svc.register_agent("agent-1").unwrap();
        svc.register_agent("agent-1").unwrap();
        svc.register_agent("agent-2").unwrap();
        assert_eq!(svc.register_agent("  "), Err(ServiceError::MissingAgentId));

        let report = svc.health().await;
        assert!(report.healthy);
        assert_eq!(report.registered_agents, 2);
        assert_eq!(report.tool_count, 2);
        assert_eq!(report.network_status, NetworkStatus::Connected);
        assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(report.workers.pool_size, 10);
        assert_eq!(svc.registered_agents(), vec!["agent-1", "agent-2"]);
    }

    #[test]
    fn test_health_future_is_send() {
        fn assert_send<T: Send>(_: T) {}
        let svc = secured();
        assert_send(svc.health());
    }

    #[tokio::test]
    async fn test_registration_not_blocked_by_health_probe() {
        let svc = Arc::new(service_with_probe(Arc::new(SlowProbe)));
        let health = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.health().await }
        });
        tokio::task::yield_now().await;
        let registered = tokio::time::timeout(
            std::time::Duration::from_millis(500),
            tokio::task::spawn_blocking({
                let svc = Arc::clone(&svc);
                move || svc.register_agent("agent-1")
            }),
        )
        .await
        .expect("registration waited on the probe")
        .unwrap();
        assert!(registered.is_ok());
        assert!(health.await.unwrap().healthy);
        assert_eq!(svc.registered_agents(), vec!["agent-1"]);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}
