//! Error types for Lebai task and controller operations

use crate::envelope::ApiError;
use crate::status::{RobotStatus, TaskStatus};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed transport fault (HTTP or gRPC) kept opaque to the core.
pub type TransportSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[source] TransportSource),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Controller returned no data for {operation}")]
    MissingData { operation: &'static str },

    #[error("机器人正在执行其他任务!")]
    Busy,

    #[error("Task stopped in state {0:?}: {desc}", desc = .0.description())]
    TaskStatus(TaskStatus),

    #[error("Robot is in state {0:?}: {desc}", desc = .0.description())]
    RobotStatus(RobotStatus),

    #[error("Controller reported unknown {kind} status {value}")]
    UnknownStatus { kind: &'static str, value: i32 },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap any transport-layer failure.
    pub fn transport<E>(source: E) -> Self
    where
        E: Into<TransportSource>,
    {
        Error::Transport(source.into())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Whether re-issuing the same call later can reasonably succeed.
    ///
    /// Transport faults and a busy controller are transient; coded failures
    /// and terminal task states need a different request.
    pub fn can_retry(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Busy)
    }

    /// The controller error code, if this is a coded failure.
    pub fn api_code(&self) -> Option<i32> {
        match self {
            Error::Api(e) => Some(e.code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_distinct() {
        let transport = Error::transport("connection refused");
        assert!(transport.is_transport());
        assert!(transport.can_retry());
        assert!(!transport.is_cancelled());

        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Cancelled.can_retry());
        assert!(Error::Busy.can_retry());
        assert!(!Error::TaskStatus(TaskStatus::ManualStop).can_retry());
    }

    #[test]
    fn test_status_errors_carry_description() {
        let err = Error::TaskStatus(TaskStatus::AbnormalStop);
        let message = err.to_string();
        assert!(message.contains("AbnormalStop"));
        assert!(message.contains("异常停止"));

        let err = Error::RobotStatus(RobotStatus::EStop);
        assert!(err.to_string().contains("急停停止状态"));
    }

    #[test]
    fn test_unknown_status_is_not_a_transport_fault() {
        let err = Error::UnknownStatus { kind: "robot", value: 42 };
        assert!(!err.is_transport());
        assert!(!err.can_retry());
        assert_eq!(err.to_string(), "Controller reported unknown robot status 42");
    }

    #[test]
    fn test_api_code_accessor() {
        let err = Error::Api(ApiError::new(2012, None));
        assert_eq!(err.api_code(), Some(2012));
        assert_eq!(Error::Busy.api_code(), None);
    }
}
