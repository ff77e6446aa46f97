//! Lebai Net - HTTP and gRPC transports for Lebai Core
//!
//! Wraps `lebai-core` with the controller's two network surfaces: the public
//! HTTP task API (via `reqwest`) and the control-plane and configuration-plane
//! gRPC services (via `tonic`). [`LebaiClient`] ties them together for one
//! controller; [`ClientRegistry`] shares clients per host.

pub mod client;
pub mod http;
pub mod proto;
pub mod registry;
pub mod rpc;

// Re-export core functionality
pub use lebai_core::{
    ApiError, ChannelConfig, ClientConfig, Error, GetTasksInput, PausedPolicy, PollingConfig,
    Result, RobotStatus, RunOptions, TaskApi, TaskExecuteResult, TaskExecutor, TaskInfo,
    TaskStatus, TasksResult,
};

// Transport-specific exports
pub use client::{LebaiClient, RpcFaultHandler};
pub use http::HttpTaskApi;
pub use registry::ClientRegistry;
pub use rpc::RpcGateway;

pub use tokio_util::sync::CancellationToken;
