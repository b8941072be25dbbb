//! Watchdog supervision and the degraded mode entered when it trips.
//!
//! The normal path proves liveness by beating a [`Heartbeat`]. The
//! [`FailSafeSupervisor`] samples it from a preempting context and keeps the
//! hardware countdown from expiring while beats arrive. Once the beats stop
//! for longer than the trip timeout the supervisor is consumed by
//! [`FailSafeSupervisor::trip`] and turns into a [`DegradedMode`], which only
//! answers `GS`/`GE` until a hardware reset.

use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::config::LINE_BUFFER_SIZE;
use crate::hal::{Actuator, Countdown, SerialLink};
use crate::protocol::{self, Command, LineBuffer};
use crate::state::{ControlState, RotatorError};

/// Liveness counter shared between the normal path and the supervisor.
pub struct Heartbeat {
    beats: AtomicU32,
    reboot: AtomicBool,
}

impl Heartbeat {
    pub const fn new() -> Self {
        Self {
            beats: AtomicU32::new(0),
            reboot: AtomicBool::new(false),
        }
    }

    pub fn beat(&self) {
        self.beats.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u32 {
        self.beats.load(Ordering::Relaxed)
    }

    /// Ask the supervisor to let the hardware watchdog expire.
    pub fn request_reboot(&self) {
        self.reboot.store(true, Ordering::Release);
    }

    pub fn reboot_requested(&self) -> bool {
        self.reboot.load(Ordering::Acquire)
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// Main path is making progress; the countdown was reset.
    Alive,
    /// No beat for the whole trip timeout. Call [`FailSafeSupervisor::trip`].
    Starved,
    /// Reboot requested; the countdown is left to expire.
    Rebooting,
}

/// Armed state of the fail-safe.
#[derive(Debug)]
pub struct FailSafeSupervisor {
    timeout_ms: u32,
    last_beat: u32,
    last_change_ms: u64,
}

impl FailSafeSupervisor {
    pub fn new(timeout_ms: u32, now_ms: u64) -> Self {
        Self {
            timeout_ms,
            last_beat: 0,
            last_change_ms: now_ms,
        }
    }

    /// Sample the heartbeat once.
    ///
    /// The countdown is reset on every `Alive` verdict, including samples
    /// inside the grace period where the count has not moved yet.
    pub fn supervise<C: Countdown>(
        &mut self,
        heartbeat: &Heartbeat,
        now_ms: u64,
        countdown: &mut C,
    ) -> Verdict {
        if heartbeat.reboot_requested() {
            return Verdict::Rebooting;
        }

        let beats = heartbeat.count();
        if beats != self.last_beat {
            self.last_beat = beats;
            self.last_change_ms = now_ms;
        } else if now_ms.saturating_sub(self.last_change_ms) >= u64::from(self.timeout_ms) {
            return Verdict::Starved;
        }

        countdown.reset();
        Verdict::Alive
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Enter degraded mode: drop actuation and latch the watchdog error.
    ///
    /// There is no way back to the armed state short of a hardware reset.
    pub fn trip<A: Actuator>(self, state: &mut ControlState, actuator: &mut A) -> DegradedMode {
        actuator.disable();
        state.az.output = 0.0;
        state.el.output = 0.0;
        state.rotator.raise(RotatorError::WATCHDOG);
        DegradedMode::new()
    }
}

/// Terminal read-only service loop.
pub struct DegradedMode {
    line: LineBuffer<LINE_BUFFER_SIZE>,
    reboot_pending: bool,
}

impl DegradedMode {
    fn new() -> Self {
        Self {
            line: LineBuffer::new(),
            reboot_pending: false,
        }
    }

    /// One iteration of the degraded loop.
    ///
    /// Resets the countdown, answers any complete `GS`/`GE` lines and resets
    /// it again. After `RB` the countdown is never touched again so the next
    /// expiry resets the MCU.
    pub fn serve<L: SerialLink, C: Countdown>(
        &mut self,
        link: &mut L,
        countdown: &mut C,
        state: &ControlState,
    ) -> Result<(), L::Error> {
        if self.reboot_pending {
            return Ok(());
        }
        countdown.reset();

        for _ in 0..LINE_BUFFER_SIZE {
            let Some(byte) = link.read_byte() else {
                break;
            };
            let Ok(Some(line)) = self.line.push(byte) else {
                continue;
            };
            let cmd = core::str::from_utf8(line)
                .ok()
                .and_then(Command::parse)
                .filter(Command::is_diagnostic);
            match cmd {
                Some(Command::Reboot) => {
                    self.reboot_pending = true;
                    return Ok(());
                }
                Some(cmd) => {
                    if let Some(out) = protocol::status_report(cmd, state) {
                        link.write(out.as_bytes())?;
                    }
                }
                None => {}
            }
        }

        countdown.reset();
        Ok(())
    }

    pub fn reboot_pending(&self) -> bool {
        self.reboot_pending
    }

    /// Serve forever. Link errors are dropped; the loop has nowhere to report them.
    pub fn run<L: SerialLink, C: Countdown>(
        mut self,
        link: &mut L,
        countdown: &mut C,
        state: &ControlState,
    ) -> ! {
        loop {
            let _ = self.serve(link, countdown, state);
        }
    }
}
