use embassy_stm32::peripherals::IWDG;
use embassy_stm32::wdg::IndependentWatchdog;
use satnogs_rotator::Countdown;

/// Independent watchdog behind the [`Countdown`] interface.
///
/// The IWDG timeout is fixed once started, so the peripheral is only
/// configured on the first `arm`.
pub struct HardwareWatchdog {
    iwdg: Option<IWDG>,
    wdg: Option<IndependentWatchdog<'static, IWDG>>,
}

impl HardwareWatchdog {
    pub fn new(iwdg: IWDG) -> Self {
        Self {
            iwdg: Some(iwdg),
            wdg: None,
        }
    }
}

impl Countdown for HardwareWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        if let Some(iwdg) = self.iwdg.take() {
            let mut wdg = IndependentWatchdog::new(iwdg, timeout_ms * 1000);
            wdg.unleash();
            self.wdg = Some(wdg);
        }
    }

    fn reset(&mut self) {
        if let Some(wdg) = self.wdg.as_mut() {
            wdg.pet();
        }
    }
}
