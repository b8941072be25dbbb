//! PCA9540B two-channel I²C multiplexer
//!
//! Both AS5601 sensors answer on the same fixed address, so every angle read
//! is preceded by a channel select.

use embassy_time::{with_timeout, Duration};
use satnogs_rotator::Axis;

use super::{I2cBus, SensorError};

const CHANNEL_0: u8 = 0x04;
const CHANNEL_1: u8 = 0x05;
const DESELECT: u8 = 0x00;

pub struct I2cMux {
    addr: u8,
    timeout: Duration,
    selected: Option<Axis>,
}

impl I2cMux {
    pub const fn new(addr: u8, timeout: Duration) -> Self {
        Self {
            addr,
            timeout,
            selected: None,
        }
    }

    /// Route the downstream bus to the sensor of `axis`.
    pub async fn select(&mut self, i2c: &mut I2cBus, axis: Axis) -> Result<(), SensorError> {
        if self.selected == Some(axis) {
            return Ok(());
        }
        let ctrl = match axis {
            Axis::Azimuth => CHANNEL_0,
            Axis::Elevation => CHANNEL_1,
        };
        self.write(i2c, ctrl).await?;
        self.selected = Some(axis);
        Ok(())
    }

    pub async fn deselect(&mut self, i2c: &mut I2cBus) -> Result<(), SensorError> {
        self.selected = None;
        self.write(i2c, DESELECT).await
    }

    async fn write(&mut self, i2c: &mut I2cBus, ctrl: u8) -> Result<(), SensorError> {
        let res = with_timeout(self.timeout, i2c.write(self.addr, &[ctrl]))
            .await
            .map_err(|_| SensorError::Timeout)
            .and_then(|r| r.map_err(SensorError::from));
        if res.is_err() {
            // unknown channel state, force a reselect next time
            self.selected = None;
        }
        res
    }
}
