//! Wire messages for the few controller RPCs this crate calls itself.
//!
//! Everything else goes through the generic calls on [`crate::RpcGateway`]
//! with caller-supplied `prost` messages. `()` stands in for
//! `google.protobuf.Empty`.

use lebai_core::{Result, RobotStatus};

/// gRPC service served on the control-plane port
pub const CONTROLLER_SERVICE: &str = "robotc.RobotController";

/// gRPC service served on the privileged configuration port
pub const PRIVATE_CONTROLLER_SERVICE: &str = "robotc.RobotPrivateController";

/// Reply of `GetRobotMode`
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct RobotMode {
    #[prost(int32, tag = "1")]
    pub mode: i32,
}

impl RobotMode {
    /// Typed mode; an out-of-range value is [`lebai_core::Error::UnknownStatus`]
    pub fn status(&self) -> Result<RobotStatus> {
        RobotStatus::try_from(self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_robot_mode_wire_format() {
        let bytes = RobotMode { mode: 7 }.encode_to_vec();
        assert_eq!(bytes, vec![0x08, 0x07]);
        assert_eq!(RobotMode::decode(bytes.as_slice()).unwrap().mode, 7);
        assert_eq!(RobotMode::decode(&[][..]).unwrap().mode, 0);
    }
}
