//! Task and robot status enumerations reported by the controller
//!
//! Both enums are closed sets keyed by the integer the controller sends on
//! the wire. Descriptions are fixed strings looked up by ordinal.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const TASK_STATUS_DESCRIPTIONS: [&str; 6] = [
    "空闲",
    "运行",
    "暂停",
    "运行成功",
    "手动停止",
    "异常停止",
];

const ROBOT_STATUS_DESCRIPTIONS: [&str; 13] = [
    "已断开连接",
    "急停停止状态",
    "启动中",
    "电源关闭",
    "电源开启",
    "空闲中",
    "暂停中",
    "机器人运动运行中",
    "更新固件中",
    "启动中",
    "停止中",
    "示教中",
    "普通停止",
];

/// Execution status of a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum TaskStatus {
    Idle = 0,
    Running = 1,
    Paused = 2,
    RunSuccess = 3,
    ManualStop = 4,
    AbnormalStop = 5,
}

impl TaskStatus {
    pub fn description(self) -> &'static str {
        TASK_STATUS_DESCRIPTIONS[self as usize]
    }

    /// Idle and Running mean the task has not finished yet
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Idle | TaskStatus::Running)
    }

    pub fn is_success(self) -> bool {
        self == TaskStatus::RunSuccess
    }

    /// A task in this state still holds the controller
    pub fn occupies_controller(self) -> bool {
        matches!(self, TaskStatus::Running | TaskStatus::Paused)
    }
}

impl TryFrom<i32> for TaskStatus {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(TaskStatus::Idle),
            1 => Ok(TaskStatus::Running),
            2 => Ok(TaskStatus::Paused),
            3 => Ok(TaskStatus::RunSuccess),
            4 => Ok(TaskStatus::ManualStop),
            5 => Ok(TaskStatus::AbnormalStop),
            other => Err(Error::UnknownStatus { kind: "task", value: other }),
        }
    }
}

impl From<TaskStatus> for i32 {
    fn from(status: TaskStatus) -> Self {
        status as i32
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Controller-wide robot state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum RobotStatus {
    Disconnected = 0,
    EStop = 1,
    Booting = 2,
    RobotOff = 3,
    RobotOn = 4,
    Idle = 5,
    Paused = 6,
    Running = 7,
    Updating = 8,
    Starting = 9,
    Stopping = 10,
    Teaching = 11,
    Stop = 12,
}

impl RobotStatus {
    pub fn description(self) -> &'static str {
        ROBOT_STATUS_DESCRIPTIONS[self as usize]
    }

    /// Whether the arm can accept a new motion program right now
    pub fn accepts_motion(self) -> bool {
        matches!(self, RobotStatus::Idle | RobotStatus::Running | RobotStatus::Paused)
    }

    /// Pass the status through, or fail with [`Error::RobotStatus`]
    pub fn ensure_accepts_motion(self) -> Result<Self> {
        if !self.accepts_motion() {
            return Err(Error::RobotStatus(self));
        }
        Ok(self)
    }
}

impl TryFrom<i32> for RobotStatus {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        let status = match value {
            0 => RobotStatus::Disconnected,
            1 => RobotStatus::EStop,
            2 => RobotStatus::Booting,
            3 => RobotStatus::RobotOff,
            4 => RobotStatus::RobotOn,
            5 => RobotStatus::Idle,
            6 => RobotStatus::Paused,
            7 => RobotStatus::Running,
            8 => RobotStatus::Updating,
            9 => RobotStatus::Starting,
            10 => RobotStatus::Stopping,
            11 => RobotStatus::Teaching,
            12 => RobotStatus::Stop,
            other => return Err(Error::UnknownStatus { kind: "robot", value: other }),
        };
        Ok(status)
    }
}

impl From<RobotStatus> for i32 {
    fn from(status: RobotStatus) -> Self {
        status as i32
    }
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
