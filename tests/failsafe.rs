use std::collections::VecDeque;
use std::convert::Infallible;

use satnogs_rotator::config::WATCHDOG_TIMEOUT_MS;
use satnogs_rotator::{
    Action, Actuator, CommandProtocol, ControlState, Countdown, FailSafeSupervisor, Heartbeat,
    RotatorError, RotatorStatus, SerialLink, Verdict,
};

#[derive(Default)]
struct MockLink {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl MockLink {
    fn send(&mut self, s: &str) {
        self.rx.extend(s.bytes());
    }

    fn take_output(&mut self) -> String {
        String::from_utf8(std::mem::take(&mut self.tx)).unwrap()
    }
}

impl SerialLink for MockLink {
    type Error = Infallible;

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Infallible> {
        self.tx.extend_from_slice(bytes);
        Ok(())
    }
}

#[derive(Default)]
struct MockCountdown {
    armed_ms: Option<u32>,
    resets: u32,
}

impl Countdown for MockCountdown {
    fn arm(&mut self, timeout_ms: u32) {
        self.armed_ms = Some(timeout_ms);
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

struct MockMotor {
    enabled: bool,
}

impl Actuator for MockMotor {
    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }
}

/// Run the normal path until a `RST` hangs it, then let the supervisor trip.
fn hang_and_trip(state: &mut ControlState, motor: &mut MockMotor) -> satnogs_rotator::DegradedMode {
    let heartbeat = Heartbeat::new();
    let mut countdown = MockCountdown::default();
    countdown.arm(WATCHDOG_TIMEOUT_MS);
    let mut supervisor = FailSafeSupervisor::new(WATCHDOG_TIMEOUT_MS, 0);
    let mut proto = CommandProtocol::new();
    let mut link = MockLink::default();
    link.send("AZ90 EL45\nRST\n");

    let mut now = 0;
    let mut hung = false;
    loop {
        now += 100;
        if !hung {
            heartbeat.beat();
            hung = proto.poll(&mut link, state).unwrap() == Some(Action::Hang);
        }
        match supervisor.supervise(&heartbeat, now, &mut countdown) {
            Verdict::Alive => {}
            Verdict::Starved => break,
            Verdict::Rebooting => unreachable!(),
        }
    }
    assert!(hung);
    assert!(now >= u64::from(WATCHDOG_TIMEOUT_MS));
    supervisor.trip(state, motor)
}

#[test]
fn trip_disables_actuation_and_reports_watchdog() {
    let mut state = ControlState::new();
    let mut motor = MockMotor { enabled: true };
    let _degraded = hang_and_trip(&mut state, &mut motor);

    assert!(!motor.enabled);
    assert_eq!(state.az.setpoint, 90.0);
    assert_eq!(state.rotator.status, RotatorStatus::ERROR);
    assert_eq!(state.rotator.error, RotatorError::WATCHDOG);
}

#[test]
fn degraded_mode_answers_only_status_and_error() {
    let mut state = ControlState::new();
    let mut motor = MockMotor { enabled: true };
    let mut degraded = hang_and_trip(&mut state, &mut motor);
    let mut link = MockLink::default();
    let mut countdown = MockCountdown::default();

    link.send("GS\nAZ EL\nVE\nGE\rIP0\nCR1\nAZ10 EL10\nPARK\nGS\n");
    while !link.rx.is_empty() {
        degraded.serve(&mut link, &mut countdown, &state).unwrap();
    }
    assert_eq!(link.take_output(), "GS8\nGE16\nGS8\n");
    assert_eq!(state.az.setpoint, 90.0);
}

#[test]
fn degraded_mode_resets_countdown_until_reboot() {
    let mut state = ControlState::new();
    let mut motor = MockMotor { enabled: true };
    let mut degraded = hang_and_trip(&mut state, &mut motor);
    let mut link = MockLink::default();
    let mut countdown = MockCountdown::default();

    for _ in 0..10 {
        degraded.serve(&mut link, &mut countdown, &state).unwrap();
    }
    assert_eq!(countdown.resets, 20);

    link.send("GS\nRB\nGE\n");
    degraded.serve(&mut link, &mut countdown, &state).unwrap();
    assert!(degraded.reboot_pending());
    assert_eq!(link.take_output(), "GS8\n");
    // only the reset at the top of the iteration happened
    assert_eq!(countdown.resets, 21);

    for _ in 0..10 {
        degraded.serve(&mut link, &mut countdown, &state).unwrap();
    }
    assert_eq!(countdown.resets, 21);
    assert_eq!(link.take_output(), "");
}

#[test]
fn reboot_request_from_normal_path_starves_hardware_countdown() {
    let heartbeat = Heartbeat::new();
    let mut countdown = MockCountdown::default();
    let mut supervisor = FailSafeSupervisor::new(WATCHDOG_TIMEOUT_MS, 0);
    let mut proto = CommandProtocol::new();
    let mut state = ControlState::new();
    let mut link = MockLink::default();

    heartbeat.beat();
    assert_eq!(supervisor.supervise(&heartbeat, 100, &mut countdown), Verdict::Alive);

    link.send("RB\n");
    if proto.poll(&mut link, &mut state).unwrap() == Some(Action::Reboot) {
        heartbeat.request_reboot();
    }
    for t in 2..50 {
        heartbeat.beat();
        assert_eq!(supervisor.supervise(&heartbeat, t * 100, &mut countdown), Verdict::Rebooting);
    }
    assert_eq!(countdown.resets, 1);
}
