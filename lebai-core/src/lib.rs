//! Lebai Core - transport-agnostic task orchestration for Lebai robot arms
//!
//! This library holds the task model, the result envelope decoder and the
//! task-completion state machine. It performs no I/O itself: transports
//! implement [`TaskApi`] (see the `lebai-net` crate for HTTP and gRPC).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lebai_core::{ClientConfig, RunOptions, TaskApi, TaskExecutor};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn run_scene<A: TaskApi>(api: A) -> lebai_core::Result<()> {
//!     let executor = TaskExecutor::new(api, ClientConfig::default().polling);
//!     let token = CancellationToken::new();
//!
//!     // Submit scene 10001 and wait until the controller reports success
//!     let task = executor
//!         .run_scene_until_done(10001, RunOptions::scene(), &token)
//!         .await?;
//!     println!("Task {} finished: {:?}", task.id, task.status);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **TaskExecutor**: busy check, submission and status polling
//! - **TaskApi**: one-call-per-method transport seam
//! - **ResultEnvelope**: `{ code, data }` decoding with the code message table
//! - **TaskStatus / RobotStatus**: controller-reported state enumerations

pub mod config;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod status;
pub mod task;
pub mod task_api;

// High-level exports for easy usage
pub use config::{ChannelConfig, ClientConfig, PausedPolicy, PollingConfig};
pub use envelope::{code_message, ApiError, ResultEnvelope};
pub use error::{Error, Result};
pub use executor::TaskExecutor;
pub use status::{RobotStatus, TaskStatus};
pub use task::{
    GetTasksInput, RunOptions, RunRequest, RunTarget, TaskExecuteResult, TaskInfo, TasksResult,
};
pub use task_api::TaskApi;
