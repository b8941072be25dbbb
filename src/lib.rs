#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod estimator;
pub mod failsafe;
pub mod hal;
pub mod protocol;
pub mod state;

pub use estimator::{MagnetStatus, PositionEstimator, RawSample};
pub use failsafe::{DegradedMode, FailSafeSupervisor, Heartbeat, Verdict};
pub use hal::{Actuator, Countdown, SerialLink};
pub use protocol::{Action, Command, CommandProtocol, ProtocolError, Reply};
pub use state::{Axis, ControlMode, ControlState, RotatorError, RotatorStatus};
