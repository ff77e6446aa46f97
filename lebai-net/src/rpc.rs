//! Generic gRPC call gateway
//!
//! One gateway per remote service. The channel is opened on first use and
//! shared afterwards; a `OnceCell` guarantees a single connection even when
//! several callers race on the first call. Unavailable replies are retried
//! up to `max_retry_attempts` times.

use lebai_core::{ChannelConfig, Error, Result};
use prost::Message;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tonic::{
    client::Grpc,
    codec::{ProstCodec, Streaming},
    codegen::http::uri::PathAndQuery,
    transport::{Channel, Endpoint},
    Code, Request, Status,
};
use tracing::{info, warn};

/// Call handle for one gRPC service on the controller
pub struct RpcGateway {
    service: &'static str,
    url: String,
    channel_config: ChannelConfig,
    channel: OnceCell<Channel>,
}

impl RpcGateway {
    pub fn new(service: &'static str, url: impl Into<String>, channel_config: ChannelConfig) -> Self {
        Self {
            service,
            url: url.into(),
            channel_config,
            channel: OnceCell::new(),
        }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the channel has been opened yet
    pub fn is_connected(&self) -> bool {
        self.channel.initialized()
    }

    async fn channel(&self) -> std::result::Result<Channel, Status> {
        self.channel
            .get_or_try_init(|| async {
                info!(service = self.service, url = %self.url, "Opening gRPC channel");
                let endpoint = Endpoint::from_shared(self.url.clone())
                    .map_err(|e| Status::invalid_argument(format!("Invalid endpoint {}: {}", self.url, e)))?
                    .connect_timeout(self.channel_config.connect_timeout())
                    .timeout(self.channel_config.request_timeout());

                endpoint
                    .connect()
                    .await
                    .map_err(|e| Status::unavailable(format!("Failed to connect to {}: {}", self.url, e)))
            })
            .await
            .cloned()
    }

    fn path(&self, method: &str) -> std::result::Result<PathAndQuery, Status> {
        PathAndQuery::try_from(format!("/{}/{}", self.service, method))
            .map_err(|e| Status::invalid_argument(format!("Invalid method {}: {}", method, e)))
    }

    async fn ready(&self) -> std::result::Result<Grpc<Channel>, Status> {
        let mut grpc = Grpc::new(self.channel().await?);
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("Service was not ready: {}", e)))?;
        Ok(grpc)
    }

    /// Retry `attempt` while the service reports itself unavailable
    async fn with_retry<T, F, Fut>(&self, method: &str, mut attempt: F) -> std::result::Result<T, Status>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, Status>>,
    {
        let max_attempts = self.channel_config.max_retry_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match attempt().await {
                Err(status) if status.code() == Code::Unavailable && attempts < max_attempts => {
                    warn!(
                        service = self.service,
                        method,
                        attempt = attempts,
                        max_attempts,
                        "RPC unavailable, retrying: {}",
                        status.message()
                    );
                    tokio::time::sleep(self.channel_config.retry_delay()).await;
                }
                result => return result,
            }
        }
    }

    /// Unary call returning the raw gRPC status on failure
    pub async fn try_unary<Req, Resp>(&self, method: &str, request: Req) -> std::result::Result<Resp, Status>
    where
        Req: Message + Clone + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let path = self.path(method)?;
        self.with_retry(method, || {
            let path = path.clone();
            let request = request.clone();
            async move {
                let mut grpc = self.ready().await?;
                let codec = ProstCodec::<Req, Resp>::default();
                let response = grpc.unary(Request::new(request), path, codec).await?;
                Ok(response.into_inner())
            }
        })
        .await
    }

    /// Server-streaming call returning the raw gRPC status on failure
    pub async fn try_server_streaming<Req, Resp>(
        &self,
        method: &str,
        request: Req,
    ) -> std::result::Result<Streaming<Resp>, Status>
    where
        Req: Message + Clone + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        let path = self.path(method)?;
        self.with_retry(method, || {
            let path = path.clone();
            let request = request.clone();
            async move {
                let mut grpc = self.ready().await?;
                let codec = ProstCodec::<Req, Resp>::default();
                let response = grpc.server_streaming(Request::new(request), path, codec).await?;
                Ok(response.into_inner())
            }
        })
        .await
    }

    /// Cancellable unary call.
    ///
    /// Cancelling stops the local wait only; the controller may still act on
    /// a request that was already sent.
    pub async fn unary<Req, Resp>(&self, method: &str, request: Req, token: &CancellationToken) -> Result<Resp>
    where
        Req: Message + Clone + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Cancelled),
            result = self.try_unary(method, request) => result.map_err(Error::transport),
        }
    }

    /// Cancellable server-streaming call. The token only covers opening the stream.
    pub async fn server_streaming<Req, Resp>(
        &self,
        method: &str,
        request: Req,
        token: &CancellationToken,
    ) -> Result<Streaming<Resp>>
    where
        Req: Message + Clone + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Cancelled),
            result = self.try_server_streaming(method, request) => result.map_err(Error::transport),
        }
    }
}

impl std::fmt::Debug for RpcGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcGateway")
            .field("service", &self.service)
            .field("url", &self.url)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{RobotMode, CONTROLLER_SERVICE};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn unreachable_gateway(max_retry_attempts: u32) -> RpcGateway {
        let channel_config = ChannelConfig {
            max_retry_attempts,
            retry_delay_ms: 20,
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
        };
        RpcGateway::new(CONTROLLER_SERVICE, "http://127.0.0.1:1", channel_config)
    }

    #[test]
    fn test_method_path() {
        let gateway = unreachable_gateway(1);
        assert_eq!(
            gateway.path("GetRobotMode").unwrap().as_str(),
            "/robotc.RobotController/GetRobotMode"
        );
        assert!(!gateway.is_connected());
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable_after_retries() {
        let gateway = unreachable_gateway(3);
        let started = Instant::now();

        let status = gateway.try_unary::<(), RobotMode>("GetRobotMode", ()).await.unwrap_err();

        assert_eq!(status.code(), Code::Unavailable);
        // two retry delays between three attempts
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert!(!gateway.is_connected());
    }

    #[tokio::test]
    async fn test_concurrent_first_use_opens_one_connection() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                open.push(socket);
            }
        });

        let channel_config = ChannelConfig {
            max_retry_attempts: 1,
            retry_delay_ms: 20,
            connect_timeout_secs: 1,
            request_timeout_secs: 1,
        };
        let gateway = Arc::new(RpcGateway::new(
            CONTROLLER_SERVICE,
            format!("http://{}", addr),
            channel_config,
        ));

        let calls: Vec<_> = (0..16)
            .map(|_| {
                let gateway = Arc::clone(&gateway);
                tokio::spawn(async move {
                    // the listener never speaks HTTP/2, so every call ends in a timeout
                    let _ = tokio::time::timeout(
                        Duration::from_secs(3),
                        gateway.try_unary::<(), RobotMode>("GetRobotMode", ()),
                    )
                    .await;
                })
            })
            .collect();
        for call in calls {
            call.await.unwrap();
        }

        assert!(gateway.is_connected());
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_call() {
        let gateway = unreachable_gateway(1);
        let token = CancellationToken::new();
        token.cancel();

        let err = gateway
            .unary::<(), RobotMode>("GetRobotMode", (), &token)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_transport_fault_maps_to_transport_error() {
        let gateway = unreachable_gateway(1);
        let err = gateway
            .unary::<(), RobotMode>("GetRobotMode", (), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
