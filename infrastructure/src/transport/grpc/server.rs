//! tonic server binding

use super::proto::tool_service_server::{ToolService as ToolServiceRpc, ToolServiceServer};
use super::proto::{
    BatchToolRequest, BatchToolResponse, HealthRequest, HealthResponse, RegisterAgentRequest,
    RegisterAgentResponse, StreamResponse, ToolRequest, ToolResponse,
};
use super::{decode_kwargs, invocation_from};
use crate::transport::ServerError;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use strix_application::{ServiceError, ToolService};
use strix_domain::{ToolInvocation, ToolResult};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

type ResponseStream = Pin<Box<dyn Stream<Item = Result<StreamResponse, Status>> + Send>>;

fn to_status(error: ServiceError) -> Status {
    match error {
        ServiceError::Unauthorized => Status::unauthenticated(error.to_string()),
        ServiceError::EmptyBatch | ServiceError::MissingAgentId => {
            Status::invalid_argument(error.to_string())
        }
        ServiceError::MissingToken => Status::internal(error.to_string()),
    }
}

/// Adapts the shared [`ToolService`] to the generated gRPC service.
pub struct GrpcToolService {
    service: Arc<ToolService>,
}

impl GrpcToolService {
    pub fn new(service: Arc<ToolService>) -> Self {
        Self { service }
    }

    fn authorize<T>(&self, request: &Request<T>, body_token: &str) -> Result<(), Status> {
        let header = request
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        self.service
            .authorize(header, Some(body_token))
            .map_err(to_status)
    }
}

#[tonic::async_trait]
impl ToolServiceRpc for GrpcToolService {
    async fn execute_tool(
        &self,
        request: Request<ToolRequest>,
    ) -> Result<Response<ToolResponse>, Status> {
        self.authorize(&request, &request.get_ref().auth_token)?;
        let invocation = invocation_from(request.into_inner());
        info!(tool = %invocation.tool_name, agent_id = %invocation.agent_id, "Execute request");
        let result = self.service.execute(invocation).await;
        Ok(Response::new(result.into()))
    }

    async fn execute_batch(
        &self,
        request: Request<BatchToolRequest>,
    ) -> Result<Response<BatchToolResponse>, Status> {
        self.authorize(&request, &request.get_ref().auth_token)?;
        let body = request.into_inner();
        let invocations: Vec<ToolInvocation> = body
            .tools
            .into_iter()
            .map(|spec| {
                ToolInvocation::new(spec.tool_name)
                    .with_agent_id(body.agent_id.clone())
                    .with_arguments(decode_kwargs(spec.kwargs))
            })
            .collect();
        let results = self
            .service
            .execute_batch(&body.agent_id, invocations)
            .await
            .map_err(to_status)?;
        Ok(Response::new(BatchToolResponse {
            results: results.into_iter().map(ToolResponse::from).collect(),
        }))
    }

    async fn register_agent(
        &self,
        request: Request<RegisterAgentRequest>,
    ) -> Result<Response<RegisterAgentResponse>, Status> {
        self.authorize(&request, &request.get_ref().auth_token)?;
        let ack = self
            .service
            .register_agent(&request.get_ref().agent_id)
            .map_err(to_status)?;
        Ok(Response::new(ack.into()))
    }

    async fn health_check(
        &self,
        _request: Request<HealthRequest>,
    ) -> Result<Response<HealthResponse>, Status> {
        Ok(Response::new(self.service.health().await.into()))
    }

    type StreamToolOutputStream = ResponseStream;

    /// Runs the tool to completion and sends the result as one final chunk.
    async fn stream_tool_output(
        &self,
        request: Request<ToolRequest>,
    ) -> Result<Response<Self::StreamToolOutputStream>, Status> {
        self.authorize(&request, &request.get_ref().auth_token)?;
        let result = self
            .service
            .execute(invocation_from(request.into_inner()))
            .await;
        let chunk = match result {
            ToolResult::Success { value } => StreamResponse {
                chunk: value.to_string(),
                done: true,
                error: String::new(),
            },
            ToolResult::Failure { message, .. } => StreamResponse {
                chunk: String::new(),
                done: true,
                error: message,
            },
        };
        let stream: ResponseStream = Box::pin(futures::stream::once(async move { Ok(chunk) }));
        Ok(Response::new(stream))
    }
}

/// Serve until `shutdown` resolves; in-flight calls complete first.
pub async fn serve<S>(
    service: Arc<ToolService>,
    listener: TcpListener,
    shutdown: S,
) -> Result<(), ServerError>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().map_err(ServerError::Io)?;
    info!(%addr, tools = service.tool_names().len(), "gRPC tool server listening");
    tonic::transport::Server::builder()
        .add_service(ToolServiceServer::new(GrpcToolService::new(service)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
        .map_err(ServerError::Grpc)?;
    warn!("gRPC tool server stopped");
    Ok(())
}
