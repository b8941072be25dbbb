use defmt::*;
use embassy_executor::task;
use embassy_time::{Duration, Ticker};
use satnogs_rotator::config::PROTOCOL_POLL_PERIOD_MS;
use satnogs_rotator::{Action, CommandProtocol};

use crate::ipc::{CONTROL, HEARTBEAT, LINK};

#[task]
pub async fn protocol_task() {
    info!(
        "Protocol task started - polling every {}ms",
        PROTOCOL_POLL_PERIOD_MS
    );
    let mut proto = CommandProtocol::new();
    let mut ticker = Ticker::every(Duration::from_millis(PROTOCOL_POLL_PERIOD_MS));
    let mut write_errors = 0u32;
    let mut overflows = 0u32;
    let mut rx_errors = 0u32;

    loop {
        ticker.next().await;

        let (res, link_errors) = LINK.lock(|link| {
            let mut link = link.borrow_mut();
            match link.as_mut() {
                Some(link) => (
                    CONTROL.lock(|c| proto.poll(link, &mut c.borrow_mut())),
                    link.rx_errors(),
                ),
                None => (Ok(None), rx_errors),
            }
        });

        match res {
            Ok(None) => {}
            Ok(Some(Action::Hang)) => {
                warn!("RST received, stalling main loop");
                stall();
            }
            Ok(Some(Action::Reboot)) => {
                warn!("RB received, waiting for hardware watchdog reset");
                HEARTBEAT.request_reboot();
                stall();
            }
            Err(e) => {
                write_errors += 1;
                if write_errors % 100 == 1 {
                    warn!("RS-485 write error #{}: {:?}", write_errors, e);
                }
            }
        }

        if link_errors != rx_errors {
            rx_errors = link_errors;
            warn!("RS-485 receive error, byte dropped ({} total)", rx_errors);
        }

        if proto.overflows() != overflows {
            overflows = proto.overflows();
            warn!("Oversized command line dropped ({} total)", overflows);
        }
    }
}

/// Spin outside any critical section so the supervisor can still preempt.
fn stall() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}
