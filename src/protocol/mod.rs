//! Easycomm III command engine.
//!
//! Bytes from the serial link are assembled into lines, each line is
//! classified into a [`Command`] and applied to the shared [`ControlState`].
//! Get-type commands produce exactly one `\n`-terminated response line;
//! set-type commands are silent. Malformed payloads and unknown opcodes are
//! dropped without a reply.

mod command;
mod line;

pub use command::{Command, ConfigRegister, InfoField};
pub use line::LineBuffer;

use core::fmt::Write as _;

use heapless::String;

use crate::config::{LINE_BUFFER_SIZE, RESPONSE_MAX, VERSION};
use crate::hal::SerialLink;
use crate::state::{Axis, ControlMode, ControlState};

/// One formatted response line, terminator included.
pub type Response = String<RESPONSE_MAX>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    /// Line exceeded the buffer; the whole line was dropped.
    Overflow { capacity: usize },
}

/// Side effects the engine cannot carry out itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Stop making progress so the supervisor trips.
    Hang,
    /// Let the hardware watchdog reset the MCU.
    Reboot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Silent,
    Line(Response),
    Action(Action),
}

/// Apply one command to the state.
///
/// A reply that does not fit [`Response`] is dropped rather than sent
/// without its terminator.
pub fn execute(cmd: Command, state: &mut ControlState) -> Reply {
    let mut out = Response::new();
    let written = match cmd {
        Command::GetPosition => write_position(&mut out, state),
        Command::SetPosition { az, el } => {
            state.rotator.control_mode = ControlMode::Position;
            if let Some(az) = az {
                state.az.setpoint = az;
            }
            if let Some(el) = el {
                state.el.setpoint = el;
            }
            return Reply::Silent;
        }
        Command::SetSpeed { axis, speed } => {
            state.rotator.control_mode = ControlMode::Speed;
            if let Some(speed) = speed {
                state.axis_mut(axis).setpoint_speed = speed;
            }
            return Reply::Silent;
        }
        Command::Stop => {
            let r = write_position(&mut out, state);
            state.hold_position();
            r
        }
        Command::Reset => {
            let r = write_position(&mut out, state);
            state.rotator.homing_flag = false;
            r
        }
        Command::Park => {
            state.rotator.control_mode = ControlMode::Position;
            let r = write_position(&mut out, state);
            state.az.setpoint = state.rotator.park_az;
            state.el.setpoint = state.rotator.park_el;
            r
        }
        Command::Version => writeln!(out, "VE{}", VERSION),
        Command::Info(field) => write_info(&mut out, field, state),
        Command::GetStatus | Command::GetError => {
            return status_report(cmd, state).map_or(Reply::Silent, Reply::Line);
        }
        Command::ReadConfig(ConfigRegister::ControlMode) => {
            writeln!(out, "9,{}", state.rotator.control_mode as u8)
        }
        Command::ReadConfig(reg) => match register(state, reg) {
            Some(value) => writeln!(out, "{},{:.2}", reg.number(), *value),
            None => return Reply::Silent,
        },
        Command::WriteConfig(reg, value) => {
            if let (Some(value), Some(slot)) = (value, register(state, reg)) {
                *slot = value;
            }
            return Reply::Silent;
        }
        Command::Hang => return Reply::Action(Action::Hang),
        Command::Reboot => return Reply::Action(Action::Reboot),
    };
    match written {
        Ok(()) => Reply::Line(out),
        Err(_) => Reply::Silent,
    }
}

/// Answer the read-only `GS`/`GE` queries. Any other command yields `None`.
pub fn status_report(cmd: Command, state: &ControlState) -> Option<Response> {
    let mut out = Response::new();
    let r = &state.rotator;
    match cmd {
        Command::GetStatus => writeln!(out, "GS{}", r.status.bits()).ok()?,
        Command::GetError => writeln!(out, "GE{}", r.error.bits()).ok()?,
        _ => return None,
    }
    Some(out)
}

/// Parse and apply one raw line.
pub fn dispatch(line: &[u8], state: &mut ControlState) -> Reply {
    match core::str::from_utf8(line).ok().and_then(Command::parse) {
        Some(cmd) => execute(cmd, state),
        None => Reply::Silent,
    }
}

fn write_position(out: &mut Response, state: &ControlState) -> core::fmt::Result {
    writeln!(out, "AZ{:.1} EL{:.1}", state.az.input, state.el.input)
}

fn write_info(out: &mut Response, field: InfoField, state: &ControlState) -> core::fmt::Result {
    let n = field.index();
    let r = &state.rotator;
    match field {
        InfoField::InsideTemperature => writeln!(out, "IP{},{}", n, r.inside_temperature),
        InfoField::EndStop(Axis::Azimuth) => writeln!(out, "IP{},{}", n, r.switch_az as u8),
        InfoField::EndStop(Axis::Elevation) => writeln!(out, "IP{},{}", n, r.switch_el as u8),
        InfoField::Position(axis) => writeln!(out, "IP{},{:.2}", n, state.axis(axis).input),
        InfoField::Load(axis) => writeln!(out, "IP{},{}", n, state.axis(axis).load),
        InfoField::Speed(axis) => writeln!(out, "IP{},{:.2}", n, state.axis(axis).speed),
    }
}

/// Storage behind a float configuration register.
fn register(state: &mut ControlState, reg: ConfigRegister) -> Option<&mut f32> {
    Some(match reg {
        ConfigRegister::Kp(axis) => &mut state.axis_mut(axis).p,
        ConfigRegister::Ki(axis) => &mut state.axis_mut(axis).i,
        ConfigRegister::Kd(axis) => &mut state.axis_mut(axis).d,
        ConfigRegister::Park(Axis::Azimuth) => &mut state.rotator.park_az,
        ConfigRegister::Park(Axis::Elevation) => &mut state.rotator.park_el,
        ConfigRegister::ControlMode => return None,
    })
}

/// Line-at-a-time protocol engine for the normal execution path.
pub struct CommandProtocol {
    line: LineBuffer<LINE_BUFFER_SIZE>,
    overflows: u32,
}

impl CommandProtocol {
    pub const fn new() -> Self {
        Self {
            line: LineBuffer::new(),
            overflows: 0,
        }
    }

    /// Feed one received byte. A reply is produced only on a line terminator.
    pub fn feed(&mut self, byte: u8, state: &mut ControlState) -> Result<Reply, ProtocolError> {
        match self.line.push(byte) {
            Ok(Some(line)) => Ok(dispatch(line, state)),
            Ok(None) => Ok(Reply::Silent),
            Err(e) => {
                self.overflows = self.overflows.wrapping_add(1);
                Err(e)
            }
        }
    }

    /// Drain pending input from `link`, answering each completed line.
    ///
    /// Reads at most one buffer's worth of bytes per call so a chattering
    /// link cannot keep the caller here. Returns the first `RST`/`RB` action
    /// seen; bytes after it stay unread.
    pub fn poll<L: SerialLink>(
        &mut self,
        link: &mut L,
        state: &mut ControlState,
    ) -> Result<Option<Action>, L::Error> {
        for _ in 0..LINE_BUFFER_SIZE {
            let Some(byte) = link.read_byte() else {
                break;
            };
            match self.feed(byte, state) {
                Ok(Reply::Line(out)) => link.write(out.as_bytes())?,
                Ok(Reply::Action(action)) => return Ok(Some(action)),
                // overflow is counted, the line is gone
                Ok(Reply::Silent) | Err(_) => {}
            }
        }
        Ok(None)
    }

    /// Lines dropped for exceeding the buffer since start-up.
    pub fn overflows(&self) -> u32 {
        self.overflows
    }
}

impl Default for CommandProtocol {
    fn default() -> Self {
        Self::new()
    }
}
