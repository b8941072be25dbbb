//! Shared controller state.
//!
//! One [`ControlState`] exists per rotator. The normal execution path (command
//! protocol + control loop) and the fail-safe path both receive it explicitly;
//! nothing in this crate keeps it in a global.

use core::ops::BitOr;

/// Rotator status word as reported by `GS`.
///
/// The values are single bits, so the type behaves like a flag set even though
/// the firmware only ever assigns one value at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotatorStatus(u8);

impl RotatorStatus {
    pub const IDLE: Self = Self(1);
    pub const MOVING: Self = Self(2);
    pub const POINTING: Self = Self(4);
    pub const ERROR: Self = Self(8);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RotatorStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Rotator error word as reported by `GE`.
///
/// `OVER_TEMPERATURE` is numerically `MOTOR | HOMING`. Whether that is meant
/// as "both" or as a distinct code is unresolved, so the value is kept as-is
/// and `contains` is answered bitwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotatorError(u8);

impl RotatorError {
    pub const NONE: Self = Self(1);
    pub const SENSOR: Self = Self(2);
    pub const HOMING: Self = Self(4);
    pub const MOTOR: Self = Self(8);
    pub const OVER_TEMPERATURE: Self = Self(12);
    pub const WATCHDOG: Self = Self(16);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for RotatorError {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ControlMode {
    Position = 0,
    Speed = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    Azimuth,
    Elevation,
}

/// Per-axis control record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisControl {
    /// Measured position, deg
    pub input: f32,
    /// Measured position one sample earlier, deg
    pub input_prev: f32,
    /// Measured speed, deg/s
    pub speed: f32,
    /// Position setpoint, deg
    pub setpoint: f32,
    /// Speed setpoint, deg/s
    pub setpoint_speed: f32,
    /// Raw driver current feedback
    pub load: u16,
    /// Drive command
    pub output: f32,
    pub p: f32,
    pub i: f32,
    pub d: f32,
}

impl AxisControl {
    pub const fn with_gains(p: f32, i: f32, d: f32) -> Self {
        Self {
            input: 0.0,
            input_prev: 0.0,
            speed: 0.0,
            setpoint: 0.0,
            setpoint_speed: 0.0,
            load: 0,
            output: 0.0,
            p,
            i,
            d,
        }
    }

    /// Record a new position sample taken `dt_s` seconds after the previous one.
    pub fn record_input(&mut self, position: f32, dt_s: f32) {
        self.input_prev = self.input;
        self.input = position;
        if dt_s > 0.0 {
            self.speed = (self.input - self.input_prev) / dt_s;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotatorState {
    pub status: RotatorStatus,
    pub error: RotatorError,
    pub control_mode: ControlMode,
    pub homing_flag: bool,
    /// Enclosure temperature, °C
    pub inside_temperature: i8,
    pub park_az: f32,
    pub park_el: f32,
    pub fault_az: bool,
    pub fault_el: bool,
    pub switch_az: bool,
    pub switch_el: bool,
}

impl RotatorState {
    pub const fn new() -> Self {
        Self {
            status: RotatorStatus::IDLE,
            error: RotatorError::NONE,
            control_mode: ControlMode::Position,
            homing_flag: false,
            inside_temperature: 0,
            park_az: 0.0,
            park_el: 0.0,
            fault_az: false,
            fault_el: false,
            switch_az: false,
            switch_el: false,
        }
    }

    /// Latch a non-fatal fault for polling via `GS`/`GE`.
    pub fn raise(&mut self, error: RotatorError) {
        self.error = error;
        self.status = RotatorStatus::ERROR;
    }
}

impl Default for RotatorState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlState {
    pub az: AxisControl,
    pub el: AxisControl,
    pub rotator: RotatorState,
}

impl ControlState {
    pub const fn new() -> Self {
        Self {
            az: AxisControl::with_gains(8.0, 0.0, 0.5),
            el: AxisControl::with_gains(10.0, 0.0, 0.3),
            rotator: RotatorState::new(),
        }
    }

    pub fn axis(&self, axis: Axis) -> &AxisControl {
        match axis {
            Axis::Azimuth => &self.az,
            Axis::Elevation => &self.el,
        }
    }

    pub fn axis_mut(&mut self, axis: Axis) -> &mut AxisControl {
        match axis {
            Axis::Azimuth => &mut self.az,
            Axis::Elevation => &mut self.el,
        }
    }

    /// Hold both axes at their current measured position.
    pub fn hold_position(&mut self) {
        self.rotator.control_mode = ControlMode::Position;
        self.az.setpoint = self.az.input;
        self.el.setpoint = self.el.input;
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_up_defaults() {
        let s = ControlState::new();
        assert_eq!(s.az.p, 8.0);
        assert_eq!(s.az.d, 0.5);
        assert_eq!(s.el.p, 10.0);
        assert_eq!(s.el.d, 0.3);
        assert_eq!(s.rotator.status, RotatorStatus::IDLE);
        assert_eq!(s.rotator.error, RotatorError::NONE);
        assert_eq!(s.rotator.control_mode, ControlMode::Position);
    }

    #[test]
    fn over_temperature_keeps_composite_value() {
        assert_eq!(RotatorError::OVER_TEMPERATURE.bits(), 12);
        assert_eq!(
            RotatorError::MOTOR | RotatorError::HOMING,
            RotatorError::OVER_TEMPERATURE
        );
        assert!(RotatorError::OVER_TEMPERATURE.contains(RotatorError::MOTOR));
        assert!(!RotatorError::OVER_TEMPERATURE.contains(RotatorError::WATCHDOG));
    }

    #[test]
    fn raise_sets_error_status() {
        let mut r = RotatorState::new();
        r.raise(RotatorError::SENSOR);
        assert_eq!(r.status.bits(), 8);
        assert_eq!(r.error.bits(), 2);
    }

    #[test]
    fn record_input_derives_speed() {
        let mut a = AxisControl::with_gains(1.0, 0.0, 0.0);
        a.record_input(10.0, 0.5);
        a.record_input(11.0, 0.5);
        assert_eq!(a.input_prev, 10.0);
        assert_eq!(a.input, 11.0);
        assert!((a.speed - 2.0).abs() < 1e-6);
    }

    #[test]
    fn hold_position_copies_inputs() {
        let mut s = ControlState::new();
        s.az.input = 12.5;
        s.el.input = -3.0;
        s.rotator.control_mode = ControlMode::Speed;
        s.hold_position();
        assert_eq!(s.az.setpoint, 12.5);
        assert_eq!(s.el.setpoint, -3.0);
        assert_eq!(s.rotator.control_mode, ControlMode::Position);
    }
}
