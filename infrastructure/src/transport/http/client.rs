//! reqwest-backed client binding

use super::dto::{
    BatchExecuteRequest, BatchExecuteResponse, ErrorDetail, ExecuteRequest, ExecuteResponse,
    RegisterAgentRequest,
};
use crate::transport::url::normalize_http_url;
use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use strix_application::{
    ChannelFactory, ChannelTarget, ConnectionPool, Protocol, TransportBinding, TransportError,
    WireStatus,
};
use strix_domain::{HealthReport, RegistrationAck, ToolInvocation, ToolResult};
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One reqwest client per `(host, port, secure)`.
///
/// Request URLs come from the binding's endpoint, so a path prefix in the
/// server URL (a reverse-proxy mount) is kept.
#[derive(Debug, Clone)]
pub struct HttpChannel {
    client: reqwest::Client,
}

#[derive(Debug, Default)]
pub struct HttpChannelFactory;

impl ChannelFactory for HttpChannelFactory {
    type Channel = HttpChannel;

    fn connect(&self, _target: &ChannelTarget) -> Result<HttpChannel, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::unavailable(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpChannel { client })
    }
}

pub type HttpPool = ConnectionPool<HttpChannelFactory>;

pub struct HttpBinding {
    pool: Arc<HttpPool>,
    endpoint: String,
    secure: bool,
    auth_token: Option<String>,
}

impl HttpBinding {
    pub fn new(
        server_url: &str,
        auth_token: Option<String>,
        pool: Arc<HttpPool>,
    ) -> Result<Self, TransportError> {
        let endpoint = normalize_http_url(server_url);
        let secure = endpoint.starts_with("https://");
        ChannelTarget::parse(&endpoint, secure)?;
        debug!(endpoint = %endpoint, "HTTP binding ready");
        Ok(Self {
            pool,
            endpoint,
            secure,
            auth_token: auth_token.filter(|t| !t.is_empty()),
        })
    }

    async fn send<B, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        timeout: Option<Duration>,
    ) -> Result<R, TransportError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let channel = self.pool.checkout(&self.endpoint, self.secure)?;
        let url = format!("{}{}", self.endpoint, path);
        let mut request = channel.client.request(method, &url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.request_error(e, timeout))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorDetail>(&text)
                .map(|d| d.detail)
                .unwrap_or(text);
            return Err(TransportError::with_status(
                WireStatus::Http(status.as_u16()),
                format!("HTTP {}: {}", status.as_u16(), detail),
            ));
        }
        response
            .json::<R>()
            .await
            .map_err(|e| TransportError::protocol(format!("Invalid response from {}: {}", url, e)))
    }

    fn request_error(&self, error: reqwest::Error, timeout: Option<Duration>) -> TransportError {
        if error.is_timeout() {
            return match timeout {
                Some(after) => TransportError::timeout(after),
                None => TransportError::unavailable(format!("{}: request timed out", self.endpoint)),
            };
        }
        if error.is_connect() {
            return TransportError::unavailable(format!(
                "Cannot connect to {}: {}",
                self.endpoint, error
            ));
        }
        TransportError::unavailable(format!("Request to {} failed: {}", self.endpoint, error))
    }
}

#[async_trait]
impl TransportBinding for HttpBinding {
    fn protocol(&self) -> Protocol {
        Protocol::Http
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute_tool(
        &self,
        invocation: &ToolInvocation,
        timeout: Duration,
    ) -> Result<ToolResult, TransportError> {
        let body = ExecuteRequest::from_invocation(invocation, self.auth_token.as_deref());
        let response: ExecuteResponse = self
            .send(Method::POST, "/execute", Some(&body), Some(timeout))
            .await?;
        Ok(response.into())
    }

    async fn execute_batch(
        &self,
        agent_id: &str,
        invocations: &[ToolInvocation],
        timeout: Duration,
    ) -> Result<Vec<ToolResult>, TransportError> {
        let body =
            BatchExecuteRequest::from_invocations(agent_id, invocations, self.auth_token.as_deref());
        let response: BatchExecuteResponse = self
            .send(Method::POST, "/execute_batch", Some(&body), Some(timeout))
            .await?;
        Ok(response.results.into_iter().map(ToolResult::from).collect())
    }

    async fn health_check(&self) -> Result<HealthReport, TransportError> {
        self.send::<(), _>(Method::GET, "/health", None, None).await
    }

    async fn register_agent(&self, agent_id: &str) -> Result<RegistrationAck, TransportError> {
        let body = RegisterAgentRequest {
            agent_id: agent_id.to_string(),
            auth_token: self.auth_token.clone(),
        };
        self.send(Method::POST, "/register_agent", Some(&body), None)
            .await
    }

    fn shutdown(&self) {
        self.pool.shutdown();
    }
}
