pub mod protocol;
pub mod sensor;
pub mod supervisor;

pub use protocol::protocol_task;
pub use sensor::sensor_task;
pub use supervisor::supervisor_task;
