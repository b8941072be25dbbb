//! State shared between the thread-mode tasks and the supervisor.
//!
//! Every slot is a critical-section mutex, so the supervisor running in the
//! USART2 interrupt can never observe a half-finished update.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex as RawMutex, Mutex};
use satnogs_rotator::{ControlState, Heartbeat};

use crate::drivers::{MotorEnable, Rs485Link};

pub static CONTROL: Mutex<RawMutex, RefCell<ControlState>> =
    Mutex::new(RefCell::new(ControlState::new()));

/* Taken by the supervisor on trip */
pub static LINK: Mutex<RawMutex, RefCell<Option<Rs485Link>>> = Mutex::new(RefCell::new(None));
pub static ACTUATION: Mutex<RawMutex, RefCell<Option<MotorEnable>>> =
    Mutex::new(RefCell::new(None));

pub static HEARTBEAT: Heartbeat = Heartbeat::new();

/// Run `f` on the shared control state.
pub fn with_control<R>(f: impl FnOnce(&mut ControlState) -> R) -> R {
    CONTROL.lock(|c| f(&mut c.borrow_mut()))
}
