//! LebaiClient - one controller, all transports
//!
//! Combines the control-plane and configuration-plane RPC gateways with the
//! HTTP task executor. Gateways connect on first use and are shared for the
//! lifetime of the client.

use crate::{
    http::HttpTaskApi,
    proto::{RobotMode, CONTROLLER_SERVICE, PRIVATE_CONTROLLER_SERVICE},
    rpc::RpcGateway,
};
use lebai_core::{
    ClientConfig, Error, GetTasksInput, Result, RobotStatus, RunOptions, TaskExecuteResult,
    TaskExecutor, TaskInfo, TasksResult,
};
use prost::Message;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tonic::{codec::Streaming, Status};
use tracing::{info, warn};

/// Invoked by [`LebaiClient::sync`] instead of returning a transport fault
pub type RpcFaultHandler = Arc<dyn Fn(&Status) + Send + Sync>;

pub struct LebaiClient {
    config: ClientConfig,
    controller: RpcGateway,
    private_controller: RpcGateway,
    tasks: TaskExecutor<HttpTaskApi>,
    on_rpc_fault: Option<RpcFaultHandler>,
}

impl LebaiClient {
    /// Create a client. No connection is made until the first call.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let controller = RpcGateway::new(CONTROLLER_SERVICE, config.controller_url(), config.channel.clone());
        let private_controller = RpcGateway::new(
            PRIVATE_CONTROLLER_SERVICE,
            config.private_controller_url(),
            config.channel.clone(),
        );
        let tasks = TaskExecutor::new(HttpTaskApi::from_config(&config)?, config.polling.clone());

        info!(host = %config.host, "Created Lebai client");
        Ok(Self {
            config,
            controller,
            private_controller,
            tasks,
            on_rpc_fault: None,
        })
    }

    /// Create a client for `host` with default ports and settings
    pub fn for_host(host: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::for_host(host))
    }

    /// Downgrade transport faults in [`sync`](Self::sync) to a callback
    pub fn with_rpc_fault_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Status) + Send + Sync + 'static,
    {
        self.on_rpc_fault = Some(Arc::new(handler));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Task executor over the HTTP task endpoint
    pub fn tasks(&self) -> &TaskExecutor<HttpTaskApi> {
        &self.tasks
    }

    pub fn controller(&self) -> &RpcGateway {
        &self.controller
    }

    pub fn private_controller(&self) -> &RpcGateway {
        &self.private_controller
    }

    // --- generic RPC surface ---

    /// Unary call on the control-plane service
    pub async fn call_controller<Req, Resp>(&self, method: &str, request: Req, token: &CancellationToken) -> Result<Resp>
    where
        Req: Message + Clone + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        self.controller.unary(method, request, token).await
    }

    /// Unary call on the privileged configuration service
    pub async fn call_private_controller<Req, Resp>(
        &self,
        method: &str,
        request: Req,
        token: &CancellationToken,
    ) -> Result<Resp>
    where
        Req: Message + Clone + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        self.private_controller.unary(method, request, token).await
    }

    /// Server-streaming call on the control-plane service, e.g. robot data feeds
    pub async fn stream_controller<Req, Resp>(
        &self,
        method: &str,
        request: Req,
        token: &CancellationToken,
    ) -> Result<Streaming<Resp>>
    where
        Req: Message + Clone + Send + Sync + 'static,
        Resp: Message + Default + Send + Sync + 'static,
    {
        self.controller.server_streaming(method, request, token).await
    }

    // --- control-plane pass-throughs ---

    pub async fn start_sys(&self, token: &CancellationToken) -> Result<()> {
        self.call_controller("StartSys", (), token).await
    }

    pub async fn stop_sys(&self, token: &CancellationToken) -> Result<()> {
        self.call_controller("StopSys", (), token).await
    }

    pub async fn power_down(&self, token: &CancellationToken) -> Result<()> {
        self.call_controller("PowerDown", (), token).await
    }

    pub async fn teach_mode(&self, token: &CancellationToken) -> Result<()> {
        self.call_controller("TeachMode", (), token).await
    }

    pub async fn end_teach_mode(&self, token: &CancellationToken) -> Result<()> {
        self.call_controller("EndTeachMode", (), token).await
    }

    /// Wait until queued motion commands have executed.
    ///
    /// With a fault handler installed, a transport fault is handed to the
    /// handler and the call returns `Ok(())`.
    pub async fn sync(&self, token: &CancellationToken) -> Result<()> {
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Error::Cancelled),
            result = self.controller.try_unary::<(), ()>("Sync", ()) => result,
        };

        match (result, &self.on_rpc_fault) {
            (Ok(()), _) => Ok(()),
            (Err(status), Some(handler)) => {
                warn!(code = ?status.code(), "Sync failed, passing fault to handler: {}", status.message());
                handler(&status);
                Ok(())
            }
            (Err(status), None) => Err(Error::transport(status)),
        }
    }

    /// Controller-wide robot state
    pub async fn robot_status(&self, token: &CancellationToken) -> Result<RobotStatus> {
        let reply: RobotMode = self.call_controller("GetRobotMode", (), token).await?;
        reply.status()
    }

    /// Fail with [`Error::RobotStatus`] unless the arm can take motion now
    pub async fn ensure_ready_for_motion(&self, token: &CancellationToken) -> Result<RobotStatus> {
        self.robot_status(token).await?.ensure_accepts_motion()
    }

    // --- task orchestration ---

    pub async fn get_task(&self, id: i32, token: &CancellationToken) -> Result<TaskInfo> {
        self.tasks.get_task(id, token).await
    }

    pub async fn get_tasks(&self, input: GetTasksInput, token: &CancellationToken) -> Result<TasksResult> {
        self.tasks.get_tasks(input, token).await
    }

    pub async fn is_can_run_task(&self, token: &CancellationToken) -> Result<bool> {
        self.tasks.is_can_run_task(token).await
    }

    /// Run a task once, stopping whatever is running first
    pub async fn run_task(&self, id: i32, token: &CancellationToken) -> Result<TaskExecuteResult> {
        self.tasks.run_task(id, RunOptions::task(), token).await
    }

    pub async fn run_task_with(&self, id: i32, options: RunOptions, token: &CancellationToken) -> Result<TaskExecuteResult> {
        self.tasks.run_task(id, options, token).await
    }

    /// Run a scene once without force-clearing
    pub async fn run_scene(&self, id: i32, token: &CancellationToken) -> Result<TaskExecuteResult> {
        self.tasks.run_scene(id, RunOptions::scene(), token).await
    }

    pub async fn run_scene_with(&self, id: i32, options: RunOptions, token: &CancellationToken) -> Result<TaskExecuteResult> {
        self.tasks.run_scene(id, options, token).await
    }

    pub async fn wait_task_run_completed(&self, id: i32, token: &CancellationToken) -> Result<TaskInfo> {
        self.tasks.wait_task_run_completed(id, token).await
    }

    pub async fn run_task_until_done(&self, id: i32, options: RunOptions, token: &CancellationToken) -> Result<TaskInfo> {
        self.tasks.run_task_until_done(id, options, token).await
    }

    pub async fn run_scene_until_done(&self, id: i32, options: RunOptions, token: &CancellationToken) -> Result<TaskInfo> {
        self.tasks.run_scene_until_done(id, options, token).await
    }

    pub async fn execute_lua(&self, code: &str, token: &CancellationToken) -> Result<TaskExecuteResult> {
        self.tasks.execute_lua(code, token).await
    }
}

impl std::fmt::Debug for LebaiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LebaiClient")
            .field("host", &self.config.host)
            .field("controller", &self.controller)
            .field("private_controller", &self.private_controller)
            .field("fault_handler", &self.on_rpc_fault.is_some())
            .finish()
    }
}
