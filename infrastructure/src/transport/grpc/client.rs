//! tonic-backed client binding

use super::proto::tool_service_client::ToolServiceClient;
use super::proto::{BatchToolRequest, HealthRequest, RegisterAgentRequest, ToolSpec};
use super::{encode_kwargs, status_error, tool_request};
use crate::transport::url::grpc_endpoint;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use strix_application::{
    ChannelFactory, ChannelTarget, ConnectionPool, PooledChannel, Protocol, TransportBinding,
    TransportError,
};
use strix_domain::{ErrorKind, HealthReport, RegistrationAck, ToolInvocation, ToolResult};
use tonic::Request;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates lazily connecting channels; TLS with webpki roots when secure.
#[derive(Debug, Default)]
pub struct GrpcChannelFactory;

impl ChannelFactory for GrpcChannelFactory {
    type Channel = Channel;

    fn connect(&self, target: &ChannelTarget) -> Result<Channel, TransportError> {
        let uri = target.uri();
        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| TransportError::invalid_endpoint(&uri, &e.to_string()))?
            .connect_timeout(CONNECT_TIMEOUT);
        if target.secure {
            let tls = ClientTlsConfig::new()
                .with_webpki_roots()
                .domain_name(target.host.clone());
            endpoint = endpoint
                .tls_config(tls)
                .map_err(|e| TransportError::invalid_endpoint(&uri, &e.to_string()))?;
        }
        Ok(endpoint.connect_lazy())
    }
}

pub type GrpcPool = ConnectionPool<GrpcChannelFactory>;

pub struct GrpcBinding {
    pool: Arc<GrpcPool>,
    endpoint: String,
    secure: bool,
    auth_token: Option<String>,
}

impl GrpcBinding {
    pub fn new(
        server_url: &str,
        auth_token: Option<String>,
        pool: Arc<GrpcPool>,
    ) -> Result<Self, TransportError> {
        let (endpoint, secure) = grpc_endpoint(server_url);
        ChannelTarget::parse(&endpoint, secure)?;
        debug!(endpoint = %endpoint, secure, "gRPC binding ready");
        Ok(Self {
            pool,
            endpoint,
            secure,
            auth_token: auth_token.filter(|t| !t.is_empty()),
        })
    }

    /// Client over a checked-out channel; keep the guard alive for the call.
    fn client(
        &self,
    ) -> Result<(ToolServiceClient<Channel>, PooledChannel<GrpcChannelFactory>), TransportError> {
        let pooled = self.pool.checkout(&self.endpoint, self.secure)?;
        let client = ToolServiceClient::new(pooled.channel().clone());
        Ok((client, pooled))
    }

    fn request<T>(&self, message: T, timeout: Option<Duration>) -> Result<Request<T>, TransportError> {
        let mut request = Request::new(message);
        if let Some(timeout) = timeout {
            request.set_timeout(timeout);
        }
        if let Some(token) = &self.auth_token {
            let value: MetadataValue<Ascii> = format!("Bearer {}", token).parse().map_err(|_| {
                TransportError::new(
                    ErrorKind::InvalidArguments,
                    "Auth token contains characters not allowed in metadata",
                )
            })?;
            request.metadata_mut().insert("authorization", value);
        }
        Ok(request)
    }
}

#[async_trait]
impl TransportBinding for GrpcBinding {
    fn protocol(&self) -> Protocol {
        Protocol::Grpc
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute_tool(
        &self,
        invocation: &ToolInvocation,
        timeout: Duration,
    ) -> Result<ToolResult, TransportError> {
        let (mut client, _guard) = self.client()?;
        let message = tool_request(invocation, self.auth_token.as_deref());
        let response = client
            .execute_tool(self.request(message, Some(timeout))?)
            .await
            .map_err(status_error)?;
        Ok(response.into_inner().into())
    }

    async fn execute_batch(
        &self,
        agent_id: &str,
        invocations: &[ToolInvocation],
        timeout: Duration,
    ) -> Result<Vec<ToolResult>, TransportError> {
        let (mut client, _guard) = self.client()?;
        let message = BatchToolRequest {
            agent_id: agent_id.to_string(),
            tools: invocations
                .iter()
                .map(|inv| ToolSpec {
                    tool_name: inv.tool_name.clone(),
                    kwargs: encode_kwargs(&inv.arguments),
                })
                .collect(),
            auth_token: self.auth_token.clone().unwrap_or_default(),
        };
        let response = client
            .execute_batch(self.request(message, Some(timeout))?)
            .await
            .map_err(status_error)?;
        Ok(response
            .into_inner()
            .results
            .into_iter()
            .map(ToolResult::from)
            .collect())
    }

    async fn health_check(&self) -> Result<HealthReport, TransportError> {
        let (mut client, _guard) = self.client()?;
        let response = client
            .health_check(self.request(HealthRequest {}, None)?)
            .await
            .map_err(status_error)?;
        Ok(response.into_inner().into())
    }

    async fn register_agent(&self, agent_id: &str) -> Result<RegistrationAck, TransportError> {
        let (mut client, _guard) = self.client()?;
        let message = RegisterAgentRequest {
            agent_id: agent_id.to_string(),
            auth_token: self.auth_token.clone().unwrap_or_default(),
        };
        let response = client
            .register_agent(self.request(message, None)?)
            .await
            .map_err(status_error)?;
        Ok(response.into_inner().into())
    }

    fn shutdown(&self) {
        self.pool.shutdown();
    }
}
