//! Transport abstraction for the task-management endpoint
//!
//! Implementations perform one remote call per method and decode the
//! result envelope. They never retry or poll on their own.

use async_trait::async_trait;
use std::sync::Arc;
use crate::task::{GetTasksInput, RunRequest, TaskExecuteResult, TaskInfo, TasksResult};
use crate::Result;

#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Fetch a single task by id
    async fn get_task(&self, id: i32) -> Result<TaskInfo>;

    /// Fetch a page of tasks, most recent first
    async fn get_tasks(&self, input: GetTasksInput) -> Result<TasksResult>;

    /// Create a new task run on the controller
    async fn run(&self, request: RunRequest) -> Result<TaskExecuteResult>;

    /// Submit raw Lua source for execution
    async fn execute_lua(&self, code: &str) -> Result<TaskExecuteResult>;
}

#[async_trait]
impl<T> TaskApi for Arc<T>
where
    T: TaskApi + ?Sized,
{
    async fn get_task(&self, id: i32) -> Result<TaskInfo> {
        (**self).get_task(id).await
    }

    async fn get_tasks(&self, input: GetTasksInput) -> Result<TasksResult> {
        (**self).get_tasks(input).await
    }

    async fn run(&self, request: RunRequest) -> Result<TaskExecuteResult> {
        (**self).run(request).await
    }

    async fn execute_lua(&self, code: &str) -> Result<TaskExecuteResult> {
        (**self).execute_lua(code).await
    }
}
