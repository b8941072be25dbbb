//! Motor driver enable line and fault feedback.

use embassy_stm32::gpio::{Input, Output};
use satnogs_rotator::{Actuator, Axis};

/// Shared enable input of both motor drivers, active high.
pub struct MotorEnable {
    pin: Output<'static>,
}

impl MotorEnable {
    pub fn new(pin: Output<'static>) -> Self {
        Self { pin }
    }

    pub fn is_enabled(&self) -> bool {
        self.pin.is_set_high()
    }
}

impl Actuator for MotorEnable {
    fn enable(&mut self) {
        self.pin.set_high();
    }

    fn disable(&mut self) {
        self.pin.set_low();
    }
}

/// Open-drain fault outputs of the two drivers. Low means fault.
pub struct MotorFaults {
    az: Input<'static>,
    el: Input<'static>,
}

impl MotorFaults {
    pub fn new(az: Input<'static>, el: Input<'static>) -> Self {
        Self { az, el }
    }

    pub fn is_faulted(&self, axis: Axis) -> bool {
        match axis {
            Axis::Azimuth => self.az.is_low(),
            Axis::Elevation => self.el.is_low(),
        }
    }
}
