use defmt::*;
use embassy_executor::task;
use embassy_time::{Duration, Instant, Ticker};
use satnogs_rotator::config::{
    HARDWARE_WATCHDOG_TIMEOUT_MS, SUPERVISOR_PERIOD_MS, WATCHDOG_TIMEOUT_MS,
};
use satnogs_rotator::{Countdown, FailSafeSupervisor, Verdict};

use crate::drivers::HardwareWatchdog;
use crate::ipc::{ACTUATION, CONTROL, HEARTBEAT, LINK};

/// Runs on the high-priority interrupt executor.
///
/// After a trip this task never returns, so the USART2 handler never
/// returns and thread mode is not scheduled again.
#[task]
pub async fn supervisor_task(mut watchdog: HardwareWatchdog) {
    info!(
        "Supervisor started - trip after {}ms, IWDG {}ms",
        WATCHDOG_TIMEOUT_MS, HARDWARE_WATCHDOG_TIMEOUT_MS
    );
    watchdog.arm(HARDWARE_WATCHDOG_TIMEOUT_MS);
    let mut supervisor = FailSafeSupervisor::new(WATCHDOG_TIMEOUT_MS, Instant::now().as_millis());
    let mut ticker = Ticker::every(Duration::from_millis(SUPERVISOR_PERIOD_MS));
    let mut rebooting = false;

    loop {
        ticker.next().await;
        match supervisor.supervise(&HEARTBEAT, Instant::now().as_millis(), &mut watchdog) {
            Verdict::Alive => {}
            Verdict::Rebooting => {
                if !rebooting {
                    rebooting = true;
                    warn!("Reboot requested, IWDG left to expire");
                }
            }
            Verdict::Starved => break,
        }
    }

    error!(
        "Main loop stalled for {}ms, entering degraded mode",
        supervisor.timeout_ms()
    );

    let Some(mut motor) = ACTUATION.lock(|a| a.borrow_mut().take()) else {
        error!("Motor enable unavailable, waiting for IWDG reset");
        halt();
    };
    let (degraded, snapshot) = CONTROL.lock(|c| {
        let mut state = c.borrow_mut();
        let degraded = supervisor.trip(&mut state, &mut motor);
        (degraded, state.clone())
    });
    info!("Motors disabled: {}", !motor.is_enabled());

    let Some(mut link) = LINK.lock(|l| l.borrow_mut().take()) else {
        error!("Serial link unavailable, waiting for IWDG reset");
        halt();
    };
    degraded.run(&mut link, &mut watchdog, &snapshot)
}

fn halt() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}
