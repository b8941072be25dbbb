//! AS5601 12-bit magnetic rotary position sensor
//! ===========================================================

use defmt::*;
use embassy_time::{with_timeout, Duration};
use satnogs_rotator::{MagnetStatus, RawSample};

use super::{I2cBus, SensorError};

/* ------------------------------------------------------------------------- */
/*  Registers                                                                */
/* ------------------------------------------------------------------------- */
const REG_CONF_HI: u8 = 0x07;
const REG_STATUS: u8 = 0x0B;
const REG_RAW_ANGLE_HI: u8 = 0x0C;
const REG_AGC: u8 = 0x1A;
const REG_MAGNITUDE_HI: u8 = 0x1B;

/// Magnet diagnostics, logged at start-up.
#[derive(Debug, Format, Clone, Copy)]
pub struct Diagnostics {
    pub status: MagnetStatus,
    pub agc: u8,
    pub magnitude: u16,
    pub conf: u16,
}

pub struct As5601 {
    addr: u8,
    timeout: Duration,
}

impl As5601 {
    pub const fn new(addr: u8, timeout: Duration) -> Self {
        Self { addr, timeout }
    }

    /// Raw angle plus magnet status in one bounded transaction pair.
    pub async fn read_raw(&self, i2c: &mut I2cBus) -> Result<RawSample, SensorError> {
        let status = self.read_bytes::<1>(i2c, REG_STATUS).await?[0];
        let angle = self.read_bytes::<2>(i2c, REG_RAW_ANGLE_HI).await?;
        Ok(RawSample {
            angle: u16::from_be_bytes(angle),
            status: MagnetStatus::from_register(status),
        })
    }

    pub async fn diagnostics(&self, i2c: &mut I2cBus) -> Result<Diagnostics, SensorError> {
        let status = self.read_bytes::<1>(i2c, REG_STATUS).await?[0];
        let agc = self.read_bytes::<1>(i2c, REG_AGC).await?[0];
        let magnitude = self.read_bytes::<2>(i2c, REG_MAGNITUDE_HI).await?;
        let conf = self.read_bytes::<2>(i2c, REG_CONF_HI).await?;
        let diag = Diagnostics {
            status: MagnetStatus::from_register(status),
            agc,
            magnitude: u16::from_be_bytes(magnitude) & 0x0FFF,
            conf: u16::from_be_bytes(conf) & 0x3FFF,
        };
        debug!("AS5601 0x{:02X}: {:?}", self.addr, diag);
        Ok(diag)
    }

    async fn read_bytes<const N: usize>(
        &self,
        i2c: &mut I2cBus,
        reg: u8,
    ) -> Result<[u8; N], SensorError> {
        let mut buf = [0u8; N];
        with_timeout(self.timeout, i2c.write_read(self.addr, &[reg], &mut buf))
            .await
            .map_err(|_| SensorError::Timeout)??;
        Ok(buf)
    }
}
