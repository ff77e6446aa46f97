//! Result envelope returned by every task-management call
//!
//! The controller wraps each payload as `{ "code": <int>, "data": <T> }`.
//! Code `0` is success; anything else is looked up in [`code_message`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Success code carried by a successful envelope
pub const SUCCESS_CODE: i32 = 0;

const CODE_MESSAGES: &[(i32, &str)] = &[
    (2001, "系统异常"),
    (2002, "登录授权码错误"),
    (2003, "登录授权码已失效"),
    (2004, "机器人控制系统异常"),
    (2005, "404"),
    (2006, "参数错误"),
    (2007, "数据不存在"),
    (2009, "请登录"),
    (2010, "同一时间只能有一个用户登录"),
    (2011, "队列任务执行报错"),
    (2012, "机器人任务运行中不能运行其他任务"),
    (2015, "场景导入失败，导入文件格式错误"),
    (2021, "数据库异常"),
    (2022, "签名失败"),
    (2023, "任务队列恢复失败，手臂当前位置与即将运行轨迹的首个位置数据校验失败"),
    (2024, "无效机器人操作命令"),
    (2025, "机器人当前状态没有满足执行当前指令的预期（废弃）"),
    (2026, "请求超时"),
    (2027, "网络配置中，不能频繁进行操作"),
    (2028, "条件任务执行超时"),
    (2029, "机器人控制系统故障，请重启机器人后再试"),
    (2030, "机器人通信故障，请检查机器人是否已正确连接"),
    (2031, "机器人初始化中，请稍候再试"),
    (2032, "机器人更新中，请稍候再试"),
    (2033, "机器人启动中，请稍候再试"),
    (2034, "机器人停止中，请稍候再试"),
    (2035, "请结束示教操作后再试"),
    (2036, "请先停止任务历史中的当前任务后再执行相应操作"),
    (2037, "仿真模式暂不支持该功能"),
];

/// Human-readable message for a controller error code
pub fn code_message(code: i32) -> Option<&'static str> {
    CODE_MESSAGES
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, message)| *message)
}

/// Coded failure reported inside an envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: i32,
    /// Caller-supplied label for the failing operation, e.g. the scene id
    pub context: Option<String>,
    pub message: Option<&'static str>,
}

impl ApiError {
    pub fn new(code: i32, context: Option<String>) -> Self {
        Self {
            code,
            context,
            message: code_message(code),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "调用失败")?;
        if let Some(context) = &self.context {
            write!(f, "，{}", context)?;
        }
        write!(f, "，code: {}", self.code)?;
        if let Some(message) = self.message {
            write!(f, "，{}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Generic `{ code, data }` wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub code: i32,
    pub data: Option<T>,
}

impl<T> ResultEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            data: Some(data),
        }
    }

    pub fn failure(code: i32) -> Self {
        Self { code, data: None }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Unwrap the payload or fail with the mapped code message.
    ///
    /// An absent payload on success is returned as `None`, untouched.
    pub fn into_result(self, context: Option<&str>) -> Result<Option<T>, ApiError> {
        if self.code != SUCCESS_CODE {
            return Err(ApiError::new(self.code, context.map(str::to_string)));
        }
        Ok(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_passes_data_through() {
        let envelope: ResultEnvelope<serde_json::Value> =
            serde_json::from_value(json!({"code": 0, "data": {"id": 555}})).unwrap();
        let data = envelope.into_result(None).unwrap();
        assert_eq!(data, Some(json!({"id": 555})));
    }

    #[test]
    fn test_success_with_null_or_missing_data() {
        let envelope: ResultEnvelope<i64> =
            serde_json::from_value(json!({"code": 0, "data": null})).unwrap();
        assert_eq!(envelope.into_result(None).unwrap(), None);

        let envelope: ResultEnvelope<i64> = serde_json::from_value(json!({"code": 0})).unwrap();
        assert_eq!(envelope.into_result(None).unwrap(), None);
    }

    #[test]
    fn test_mapped_code_message() {
        let envelope: ResultEnvelope<i64> =
            serde_json::from_value(json!({"code": 2012, "data": null})).unwrap();
        let err = envelope.into_result(Some("scene id: 10001")).unwrap_err();

        assert_eq!(err.code, 2012);
        assert_eq!(err.context.as_deref(), Some("scene id: 10001"));
        let message = err.to_string();
        assert!(message.contains("2012"));
        assert!(message.contains("机器人任务运行中不能运行其他任务"));
        assert!(message.contains("scene id: 10001"));
    }

    #[test]
    fn test_unmapped_code_has_no_suffix() {
        let err = ResultEnvelope::<i64>::failure(9999).into_result(None).unwrap_err();
        assert_eq!(err.message, None);
        assert_eq!(err.to_string(), "调用失败，code: 9999");
    }

    #[test]
    fn test_code_table_is_sparse() {
        assert_eq!(code_message(2001), Some("系统异常"));
        assert_eq!(code_message(2037), Some("仿真模式暂不支持该功能"));
        assert_eq!(code_message(2008), None);
        assert_eq!(code_message(SUCCESS_CODE), None);
    }
}
