//! Task data model exchanged with the task-management endpoint

use crate::status::TaskStatus;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Snapshot of a task at the moment it was fetched.
///
/// A fresh value is built for every fetch; nothing is merged across polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: i32,
    #[serde(default)]
    pub scene_id: Option<i32>,
    /// Requested number of runs
    #[serde(default)]
    pub execute_count: Option<i32>,
    /// Runs completed so far
    #[serde(default)]
    pub executed_count: Option<i32>,
    #[serde(default)]
    pub name: Option<String>,
    /// Status code as reported; see [`TaskInfo::task_status`]
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Cumulative run time, in the controller's own unit
    #[serde(default)]
    pub consume_time: Option<i64>,
    #[serde(default)]
    pub mode: Option<i32>,
    #[serde(default, rename = "create_time")]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default)]
    pub scene_type: Option<i32>,
    /// Opaque payload, never interpreted client-side
    #[serde(default)]
    pub first_pose: Option<serde_json::Value>,
}

impl TaskInfo {
    /// A snapshot carrying only an id and a status
    pub fn with_status(id: i32, status: TaskStatus) -> Self {
        Self {
            id,
            scene_id: None,
            execute_count: None,
            executed_count: None,
            name: None,
            status: Some(status.into()),
            comment: None,
            start_time: None,
            end_time: None,
            consume_time: None,
            mode: None,
            creation_time: None,
            update_time: None,
            scene_type: None,
            first_pose: None,
        }
    }

    /// Typed status, or [`crate::Error::UnknownStatus`] for a code this client does not know
    pub fn task_status(&self) -> Result<Option<TaskStatus>> {
        self.status.map(TaskStatus::try_from).transpose()
    }
}

/// Page of tasks, most recent first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksResult {
    #[serde(rename = "pi")]
    pub page_index: i32,
    #[serde(rename = "ps")]
    pub page_size: i32,
    #[serde(rename = "total")]
    pub total_count: i32,
    #[serde(rename = "records", default)]
    pub items: Vec<TaskInfo>,
}

/// Paging parameters for a task list query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTasksInput {
    pub page_index: i32,
    pub page_size: i32,
}

impl Default for GetTasksInput {
    fn default() -> Self {
        Self {
            page_index: 1,
            page_size: 10,
        }
    }
}

impl GetTasksInput {
    /// Just the most recent task
    pub fn latest() -> Self {
        Self {
            page_index: 1,
            page_size: 1,
        }
    }
}

/// Handle to a task created by a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskExecuteResult {
    pub id: i32,
}

/// What a run request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTarget {
    TaskId(i32),
    SceneId(i32),
}

/// Repeat count and force-clear flag for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub execute_count: i32,
    /// Stop whatever is running before starting this one
    pub clear: bool,
}

impl RunOptions {
    /// Defaults for running a task: one run, force-clear on
    pub fn task() -> Self {
        Self {
            execute_count: 1,
            clear: true,
        }
    }

    /// Defaults for running a scene: one run, force-clear off
    pub fn scene() -> Self {
        Self {
            execute_count: 1,
            clear: false,
        }
    }

    pub fn with_execute_count(mut self, execute_count: i32) -> Self {
        self.execute_count = execute_count;
        self
    }

    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }
}

/// Body posted to the task endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunRequest {
    pub execute_count: i32,
    /// `1` to force-clear, `0` otherwise
    pub clear: u8,
    #[serde(flatten)]
    pub target: RunTarget,
}

impl RunRequest {
    pub fn new(target: RunTarget, options: RunOptions) -> Self {
        Self {
            execute_count: options.execute_count,
            clear: u8::from(options.clear),
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_task_info_from_wire() {
        let info: TaskInfo = serde_json::from_value(json!({
            "id": 555,
            "scene_id": 10001,
            "execute_count": 1,
            "executed_count": 0,
            "name": "pick",
            "status": 1,
            "comment": "",
            "start_time": "2024-01-01 10:00:00",
            "end_time": null,
            "consume_time": 1200,
            "mode": 0,
            "create_time": "2024-01-01 09:59:59",
            "update_time": "2024-01-01 10:00:01",
            "scene_type": null,
            "first_pose": {"j1": 0.1}
        }))
        .unwrap();

        assert_eq!(info.id, 555);
        assert_eq!(info.scene_id, Some(10001));
        assert_eq!(info.task_status().unwrap(), Some(TaskStatus::Running));
        assert_eq!(info.creation_time.as_deref(), Some("2024-01-01 09:59:59"));
        assert_eq!(info.consume_time, Some(1200));
        assert_eq!(info.first_pose, Some(json!({"j1": 0.1})));
        assert_eq!(info.scene_type, None);
    }

    #[test]
    fn test_sparse_task_info() {
        let info: TaskInfo = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(info.id, 7);
        assert_eq!(info.task_status().unwrap(), None);
    }

    #[test]
    fn test_unknown_status_code_survives_decoding() {
        let info: TaskInfo = serde_json::from_value(json!({"id": 7, "status": 9})).unwrap();
        assert_eq!(info.status, Some(9));
        assert!(matches!(
            info.task_status(),
            Err(crate::Error::UnknownStatus { kind: "task", value: 9 })
        ));
    }

    #[test]
    fn test_tasks_result_field_names() {
        let result: TasksResult = serde_json::from_value(json!({
            "pi": 1,
            "ps": 1,
            "total": 42,
            "records": [{"id": 3, "status": 3}]
        }))
        .unwrap();

        assert_eq!(result.page_index, 1);
        assert_eq!(result.total_count, 42);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].task_status().unwrap(), Some(TaskStatus::RunSuccess));

        let empty: TasksResult =
            serde_json::from_value(json!({"pi": 1, "ps": 10, "total": 0})).unwrap();
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_run_request_body() {
        let body = RunRequest::new(RunTarget::TaskId(7), RunOptions::task());
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"execute_count": 1, "clear": 1, "task_id": 7})
        );

        let body = RunRequest::new(
            RunTarget::SceneId(10001),
            RunOptions::scene().with_execute_count(3),
        );
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"execute_count": 3, "clear": 0, "scene_id": 10001})
        );
    }

    #[test]
    fn test_default_paging() {
        let input = GetTasksInput::default();
        assert_eq!((input.page_index, input.page_size), (1, 10));
        let latest = GetTasksInput::latest();
        assert_eq!((latest.page_index, latest.page_size), (1, 1));
    }
}
