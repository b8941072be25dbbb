//! TC74 digital temperature sensor

use embassy_time::{with_timeout, Duration};

use super::{I2cBus, SensorError};

const REG_TEMP: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

const CONFIG_STANDBY: u8 = 0x80;
const CONFIG_DATA_READY: u8 = 0x40;

pub struct Tc74 {
    addr: u8,
    timeout: Duration,
}

impl Tc74 {
    pub const fn new(addr: u8, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    /// Leave standby and start continuous conversion.
    pub async fn wake_up(&mut self, i2c: &mut I2cBus) -> Result<(), SensorError> {
        let config = self.read_reg(i2c, REG_CONFIG).await?;
        if config & CONFIG_STANDBY != 0 {
            self.write_reg(i2c, REG_CONFIG, config & !CONFIG_STANDBY).await?;
        }
        Ok(())
    }

    /// Temperature in °C, `None` while the first conversion is still pending.
    pub async fn read_temperature(&mut self, i2c: &mut I2cBus) -> Result<Option<i8>, SensorError> {
        let config = self.read_reg(i2c, REG_CONFIG).await?;
        if config & CONFIG_DATA_READY == 0 {
            return Ok(None);
        }
        let raw = self.read_reg(i2c, REG_TEMP).await?;
        Ok(Some(raw as i8))
    }

    async fn read_reg(&mut self, i2c: &mut I2cBus, reg: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        with_timeout(self.timeout, i2c.write_read(self.addr, &[reg], &mut buf))
            .await
            .map_err(|_| SensorError::Timeout)??;
        Ok(buf[0])
    }

    async fn write_reg(&mut self, i2c: &mut I2cBus, reg: u8, value: u8) -> Result<(), SensorError> {
        with_timeout(self.timeout, i2c.write(self.addr, &[reg, value]))
            .await
            .map_err(|_| SensorError::Timeout)??;
        Ok(())
    }
}
