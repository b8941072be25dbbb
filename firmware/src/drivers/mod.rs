pub mod as5601;
pub mod endstop;
pub mod i2c_mux;
pub mod motor;
pub mod rs485;
pub mod tc74;
pub mod watchdog;

use embassy_stm32::{i2c, mode::Async};

pub use as5601::As5601;
pub use endstop::EndStops;
pub use i2c_mux::I2cMux;
pub use motor::{MotorEnable, MotorFaults};
pub use rs485::Rs485Link;
pub use tc74::Tc74;
pub use watchdog::HardwareWatchdog;

/// Sensor bus shared by the mux, both angle sensors and the thermometer.
pub type I2cBus = i2c::I2c<'static, Async>;

#[derive(Debug, defmt::Format)]
pub enum SensorError {
    I2c(i2c::Error),
    Timeout,
}

impl From<i2c::Error> for SensorError {
    fn from(e: i2c::Error) -> Self {
        Self::I2c(e)
    }
}
