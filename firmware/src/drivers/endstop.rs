//! Homing end-stop switches.

use embassy_stm32::gpio::{Input, Level};
use satnogs_rotator::Axis;

pub struct EndStops {
    az: Input<'static>,
    el: Input<'static>,
    active: Level,
}

impl EndStops {
    /// `active` is the pin level read while a switch is closed.
    pub fn new(az: Input<'static>, el: Input<'static>, active: Level) -> Self {
        Self { az, el, active }
    }

    pub fn is_triggered(&self, axis: Axis) -> bool {
        let pin = match axis {
            Axis::Azimuth => &self.az,
            Axis::Elevation => &self.el,
        };
        pin.get_level() == self.active
    }
}
