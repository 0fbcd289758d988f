//! REST/JSON binding (reqwest client, axum server)

pub mod client;
pub mod dto;
pub mod server;

pub use client::{HttpBinding, HttpChannel, HttpChannelFactory, HttpPool};
pub use server::{router, serve};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use strix_application::ports::tool::ready;
    use strix_application::{
        ConnectionPool, ExecutorParams, FnTool, MetricsCollector, PoolConfig, RemoteToolClient,
        ResultCache, ServerParams, StaticProbe, ToolExecutor, ToolRegistry, ToolService,
        TransportBinding,
    };
    use std::collections::BTreeMap;
    use strix_domain::{ErrorKind, NetworkStatus, ToolDefinition};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_loopback_round_trip() {
        let registry = ToolRegistry::new().register(FnTool::new(
            ToolDefinition::new("hostname", "Name"),
            |_, _| ready(Ok(json!("myhost"))),
        ));
        let service = Arc::new(
            ToolService::new(
                Arc::new(ToolExecutor::new(Arc::new(registry), ExecutorParams::default())),
                Arc::new(MetricsCollector::new()),
                Arc::new(StaticProbe(NetworkStatus::Unknown)),
                ServerParams::default().with_auth_token("tok"),
            )
            .unwrap(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(service, listener, async {
            let _ = stopped.await;
        }));

        let pool = Arc::new(ConnectionPool::new(HttpChannelFactory, PoolConfig::default()));
        let binding =
            HttpBinding::new(&addr.to_string(), Some("tok".into()), Arc::clone(&pool)).unwrap();
        assert_eq!(binding.endpoint(), format!("http://{}", addr));
        let client = RemoteToolClient::new(Arc::new(binding)).with_cache(Arc::new(ResultCache::default()));

        let value = client
            .execute_tool("a1", "hostname", BTreeMap::new(), None)
            .await
            .unwrap();
        assert_eq!(value, json!("myhost"));

        let err = client
            .execute_tool("a1", "nope", BTreeMap::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let report = client.health_check().await;
        assert!(report.healthy);
        assert_eq!(report.tool_count, 1);

        let ack = client.register_agent("a1").await.unwrap();
        assert!(ack.success);
        assert_eq!(pool.stats().pool_size, 1);

        let _ = stop.send(());
        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_server_mounted_under_path_prefix() {
        let registry = ToolRegistry::new().register(FnTool::new(
            ToolDefinition::new("hostname", "Name"),
            |_, _| ready(Ok(json!("myhost"))),
        ));
        let service = Arc::new(
            ToolService::new(
                Arc::new(ToolExecutor::new(Arc::new(registry), ExecutorParams::default())),
                Arc::new(MetricsCollector::new()),
                Arc::new(StaticProbe(NetworkStatus::Unknown)),
                ServerParams::default(),
            )
            .unwrap(),
        );
        let app = axum::Router::new().nest("/tools", router(service));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let pool = Arc::new(ConnectionPool::new(HttpChannelFactory, PoolConfig::default()));
        let binding = HttpBinding::new(&format!("http://{}/tools/", addr), None, pool).unwrap();
        assert_eq!(binding.endpoint(), format!("http://{}/tools", addr));
        let client = RemoteToolClient::new(Arc::new(binding));

        let value = client
            .execute_tool("a1", "hostname", BTreeMap::new(), None)
            .await
            .unwrap();
        assert_eq!(value, json!("myhost"));
        assert!(client.health_check().await.healthy);
    }

    #[tokio::test]
    async fn test_wrong_token_surfaces_unauthorized() {
        let service = Arc::new(
            ToolService::new(
                Arc::new(ToolExecutor::new(
                    Arc::new(ToolRegistry::new()),
                    ExecutorParams::default(),
                )),
                Arc::new(MetricsCollector::new()),
                Arc::new(StaticProbe(NetworkStatus::Unknown)),
                ServerParams::default().with_auth_token("tok"),
            )
            .unwrap(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(service, listener, std::future::pending()));

        let pool = Arc::new(ConnectionPool::new(HttpChannelFactory, PoolConfig::default()));
        let binding = HttpBinding::new(&addr.to_string(), Some("bad".into()), pool).unwrap();
        let err = binding.register_agent("a1").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert!(err.message.contains("401"));
    }
}
