//! Continuous position from a bounded absolute angle sensor.
//!
//! The sensor reports 0..4095 counts per revolution. The estimator unwraps the
//! 360° → 0° rollover into a revolution counter and divides by the gearing
//! between the sensor shaft and the output axis. Consecutive samples must be
//! less than 180° apart at the sensor; the sampling rate is chosen so that the
//! axis cannot move further than that between reads.

/// Degrees per sensor count (12-bit sensor).
pub const DEGREES_PER_COUNT: f32 = 360.0 / 4096.0;

const RAW_MASK: u16 = 0x0FFF;

// AS5601 STATUS register bits
const STATUS_MH: u8 = 0x08;
const STATUS_ML: u8 = 0x10;
const STATUS_MD: u8 = 0x20;

/// Validity of the sensor's magnetic target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MagnetStatus {
    TooStrong,
    TooWeak,
    Detected,
}

impl MagnetStatus {
    /// Decode the STATUS register of an AS5601.
    pub fn from_register(status: u8) -> Self {
        if status & STATUS_MH != 0 {
            Self::TooStrong
        } else if status & STATUS_ML != 0 {
            Self::TooWeak
        } else if status & STATUS_MD != 0 {
            Self::Detected
        } else {
            // no magnet at all
            Self::TooWeak
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Detected
    }
}

/// One reading from the angle sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub angle: u16,
    pub status: MagnetStatus,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionEstimator {
    offset: f32,
    wrap_count: i32,
    prev_raw: f32,
    gear_ratio: f32,
    position: f32,
}

impl PositionEstimator {
    /// `gear_ratio` must be strictly positive.
    pub const fn new(gear_ratio: f32) -> Self {
        Self {
            offset: 0.0,
            wrap_count: 0,
            prev_raw: 0.0,
            gear_ratio,
            position: 0.0,
        }
    }

    /// Feed one sensor sample.
    ///
    /// The position is only recomputed for [`MagnetStatus::Detected`]; any
    /// other status returns the last good position together with the status
    /// so the caller can flag the anomaly.
    pub fn update(&mut self, raw: u16, status: MagnetStatus) -> (f32, MagnetStatus) {
        if !status.is_ok() {
            return (self.position, status);
        }

        let raw_deg = (raw & RAW_MASK) as f32 * DEGREES_PER_COUNT;
        let delta = self.prev_raw - raw_deg;
        if delta > 180.0 {
            self.wrap_count += 1;
        } else if delta < -180.0 {
            self.wrap_count -= 1;
        }
        self.prev_raw = raw_deg;

        let unwrapped = raw_deg + 360.0 * self.wrap_count as f32;
        // + 0.0 turns a -0.0 result into 0.0
        self.position = -(unwrapped / self.gear_ratio) - self.offset + 0.0;
        (self.position, status)
    }

    pub fn update_sample(&mut self, sample: RawSample) -> (f32, MagnetStatus) {
        self.update(sample.angle, sample.status)
    }

    /// Make the current position the new zero.
    pub fn set_zero(&mut self) {
        self.offset += self.position;
        self.position = 0.0;
    }

    /// Drop any zero calibration.
    pub fn init_zero(&mut self) {
        self.position += self.offset;
        self.offset = 0.0;
    }

    /// Sensor revolutions per output revolution. A zero divisor is a caller
    /// error and yields non-finite positions.
    pub fn set_gear_ratio(&mut self, divisor: f32) {
        self.gear_ratio = divisor;
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn wrap_count(&self) -> i32 {
        self.wrap_count
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn gear_ratio(&self) -> f32 {
        self.gear_ratio
    }
}
