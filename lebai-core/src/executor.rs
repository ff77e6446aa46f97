//! TaskExecutor - submits tasks and scenes and waits for them to finish
//!
//! Provides the "execute and wait for completion" pattern on top of any
//! [`TaskApi`] transport:
//! - a busy check that keeps the controller to one active task
//! - task and scene submission
//! - a fixed-interval status poller that stops on the first terminal state
//!
//! Every call takes a [`CancellationToken`]. Cancelling only stops local
//! waiting; a submitted task keeps running on the controller.

use crate::{
    config::{PausedPolicy, PollingConfig},
    status::TaskStatus,
    task::{GetTasksInput, RunOptions, RunRequest, RunTarget, TaskExecuteResult, TaskInfo, TasksResult},
    task_api::TaskApi,
    Error, Result,
};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the poller does with the latest snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollStep {
    Continue,
    Finished,
    Failed(TaskStatus),
}

/// Executes tasks and scenes against a single controller
pub struct TaskExecutor<A> {
    api: A,
    polling: PollingConfig,
}

impl<A: TaskApi> TaskExecutor<A> {
    pub fn new(api: A, polling: PollingConfig) -> Self {
        Self { api, polling }
    }

    /// Get access to the underlying transport
    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    pub async fn get_task(&self, id: i32, token: &CancellationToken) -> Result<TaskInfo> {
        cancellable(token, self.api.get_task(id)).await
    }

    pub async fn get_tasks(&self, input: GetTasksInput, token: &CancellationToken) -> Result<TasksResult> {
        cancellable(token, self.api.get_tasks(input)).await
    }

    /// Whether the controller is free to start another task.
    ///
    /// Looks at the most recent task only: free when there is none, or when
    /// it is neither running nor paused.
    pub async fn is_can_run_task(&self, token: &CancellationToken) -> Result<bool> {
        let latest = self.get_tasks(GetTasksInput::latest(), token).await?;
        let status = match latest.items.first() {
            Some(task) => task.task_status()?,
            None => None,
        };
        Ok(!status.is_some_and(TaskStatus::occupies_controller))
    }

    async fn ensure_can_run(&self, token: &CancellationToken) -> Result<()> {
        if !self.is_can_run_task(token).await? {
            warn!("Controller is busy with another task, refusing submission");
            return Err(Error::Busy);
        }
        Ok(())
    }

    /// Run a task. [`RunOptions::task`] gives the usual defaults.
    pub async fn run_task(
        &self,
        id: i32,
        options: RunOptions,
        token: &CancellationToken,
    ) -> Result<TaskExecuteResult> {
        self.submit(RunTarget::TaskId(id), options, token).await
    }

    /// Run a scene. [`RunOptions::scene`] gives the usual defaults.
    pub async fn run_scene(
        &self,
        id: i32,
        options: RunOptions,
        token: &CancellationToken,
    ) -> Result<TaskExecuteResult> {
        self.submit(RunTarget::SceneId(id), options, token).await
    }

    async fn submit(
        &self,
        target: RunTarget,
        options: RunOptions,
        token: &CancellationToken,
    ) -> Result<TaskExecuteResult> {
        self.ensure_can_run(token).await?;

        let request = RunRequest::new(target, options);
        info!(
            ?target,
            execute_count = request.execute_count,
            clear = options.clear,
            "Submitting run request"
        );

        let result = cancellable(token, self.api.run(request)).await?;
        info!(task_id = result.id, ?target, "Run request accepted");
        Ok(result)
    }

    /// Poll a task until it reaches a terminal state.
    ///
    /// Returns the last snapshot on success. Re-entering with the same id is
    /// safe; polling resumes from whatever the controller reports now.
    pub async fn wait_task_run_completed(&self, id: i32, token: &CancellationToken) -> Result<TaskInfo> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut task = self.fetch_status(id, token).await?;
        loop {
            if token.is_cancelled() {
                info!(task_id = id, "Wait for task cancelled");
                return Err(Error::Cancelled);
            }

            match self.classify(task.task_status()?) {
                PollStep::Continue => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            info!(task_id = id, "Wait for task cancelled");
                            return Err(Error::Cancelled);
                        }
                        _ = tokio::time::sleep(self.polling.interval()) => {}
                    }
                    task = self.fetch_status(id, token).await?;
                }
                PollStep::Finished => {
                    info!(task_id = id, "Task completed successfully");
                    return Ok(task);
                }
                PollStep::Failed(status) => {
                    warn!(task_id = id, ?status, "Task stopped without success");
                    return Err(Error::TaskStatus(status));
                }
            }
        }
    }

    async fn fetch_status(&self, id: i32, token: &CancellationToken) -> Result<TaskInfo> {
        let task = self.get_task(id, token).await?;
        debug!(task_id = id, status = ?task.status, "Fetched task status");
        Ok(task)
    }

    fn classify(&self, status: Option<TaskStatus>) -> PollStep {
        // No status yet means the controller has not picked the task up.
        match status.unwrap_or(TaskStatus::Idle) {
            TaskStatus::Idle | TaskStatus::Running => PollStep::Continue,
            TaskStatus::RunSuccess => PollStep::Finished,
            TaskStatus::Paused if self.polling.paused_policy == PausedPolicy::Wait => PollStep::Continue,
            other => PollStep::Failed(other),
        }
    }

    /// Run a task and wait for it to finish
    pub async fn run_task_until_done(
        &self,
        id: i32,
        options: RunOptions,
        token: &CancellationToken,
    ) -> Result<TaskInfo> {
        let handle = self.run_task(id, options, token).await?;
        self.wait_task_run_completed(handle.id, token).await
    }

    /// Run a scene and wait for the task it creates to finish
    pub async fn run_scene_until_done(
        &self,
        id: i32,
        options: RunOptions,
        token: &CancellationToken,
    ) -> Result<TaskInfo> {
        let handle = self.run_scene(id, options, token).await?;
        self.wait_task_run_completed(handle.id, token).await
    }

    /// Submit Lua source for execution. No busy check is made.
    pub async fn execute_lua(&self, code: &str, token: &CancellationToken) -> Result<TaskExecuteResult> {
        info!(code_len = code.len(), "Executing Lua code");
        cancellable(token, self.api.execute_lua(code)).await
    }
}

/// Race a call against cancellation
async fn cancellable<T, F>(token: &CancellationToken, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}
