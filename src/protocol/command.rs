//! Easycomm III opcode classification.
//!
//! Classification is purely by prefix, first match wins, in the order of
//! [`Command::parse`]. Numeric payloads that fail validation come back as
//! `None`; the command itself still parses so that side effects that do not
//! depend on the payload (e.g. switching the control mode) still happen.

use crate::state::Axis;

/// `IPn` telemetry fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InfoField {
    InsideTemperature,
    EndStop(Axis),
    Position(Axis),
    Load(Axis),
    Speed(Axis),
}

impl InfoField {
    pub fn from_digit(d: u8) -> Option<Self> {
        use Axis::*;
        Some(match d {
            b'0' => Self::InsideTemperature,
            b'1' => Self::EndStop(Azimuth),
            b'2' => Self::EndStop(Elevation),
            b'3' => Self::Position(Azimuth),
            b'4' => Self::Position(Elevation),
            b'5' => Self::Load(Azimuth),
            b'6' => Self::Load(Elevation),
            b'7' => Self::Speed(Azimuth),
            b'8' => Self::Speed(Elevation),
            _ => return None,
        })
    }

    pub fn index(self) -> u8 {
        use Axis::*;
        match self {
            Self::InsideTemperature => 0,
            Self::EndStop(Azimuth) => 1,
            Self::EndStop(Elevation) => 2,
            Self::Position(Azimuth) => 3,
            Self::Position(Elevation) => 4,
            Self::Load(Azimuth) => 5,
            Self::Load(Elevation) => 6,
            Self::Speed(Azimuth) => 7,
            Self::Speed(Elevation) => 8,
        }
    }
}

/// `CRn` / `CWn` configuration registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigRegister {
    Kp(Axis),
    Ki(Axis),
    Kd(Axis),
    Park(Axis),
    /// Read-only
    ControlMode,
}

impl ConfigRegister {
    pub fn from_digit(d: u8) -> Option<Self> {
        use Axis::*;
        Some(match d {
            b'1' => Self::Kp(Azimuth),
            b'2' => Self::Ki(Azimuth),
            b'3' => Self::Kd(Azimuth),
            b'4' => Self::Kp(Elevation),
            b'5' => Self::Ki(Elevation),
            b'6' => Self::Kd(Elevation),
            b'7' => Self::Park(Azimuth),
            b'8' => Self::Park(Elevation),
            b'9' => Self::ControlMode,
            _ => return None,
        })
    }

    pub fn number(self) -> u8 {
        use Axis::*;
        match self {
            Self::Kp(Azimuth) => 1,
            Self::Ki(Azimuth) => 2,
            Self::Kd(Azimuth) => 3,
            Self::Kp(Elevation) => 4,
            Self::Ki(Elevation) => 5,
            Self::Kd(Elevation) => 6,
            Self::Park(Azimuth) => 7,
            Self::Park(Elevation) => 8,
            Self::ControlMode => 9,
        }
    }

    pub fn is_writable(self) -> bool {
        self != Self::ControlMode
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// `AZ EL`
    GetPosition,
    /// `AZx ELy` or `ELy`
    SetPosition { az: Option<f32>, el: Option<f32> },
    /// `VU`/`VD` (elevation) and `VL`/`VR` (azimuth), already in deg/s
    SetSpeed { axis: Axis, speed: Option<f32> },
    /// `SA SE`
    Stop,
    /// `RESET`
    Reset,
    /// `PARK`
    Park,
    /// `VE`
    Version,
    /// `IP0`..`IP8`
    Info(InfoField),
    /// `GS`
    GetStatus,
    /// `GE`
    GetError,
    /// `CR1`..`CR9`
    ReadConfig(ConfigRegister),
    /// `CW1`..`CW8`
    WriteConfig(ConfigRegister, Option<f32>),
    /// `RST`
    Hang,
    /// `RB`
    Reboot,
}

impl Command {
    /// Classify one line (terminator already stripped). Unknown opcodes and
    /// unusable register digits give `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let b = line.as_bytes();

        if line.starts_with("AZ EL") {
            return Some(Self::GetPosition);
        }
        if line.starts_with("AZ") {
            let mut tokens = tokens(line);
            let az = tokens.next().and_then(|t| number(&t[2..]));
            let el = tokens
                .next()
                .filter(|t| t.starts_with("EL"))
                .and_then(|t| number(&t[2..]));
            return Some(Self::SetPosition { az, el });
        }
        if line.starts_with("EL") {
            let el = tokens(line).next().and_then(|t| number(&t[2..]));
            return Some(Self::SetPosition { az: None, el });
        }
        for (op, axis, sign) in [
            ("VU", Axis::Elevation, 1.0),
            ("VD", Axis::Elevation, -1.0),
            ("VL", Axis::Azimuth, 1.0),
            ("VR", Axis::Azimuth, -1.0),
        ] {
            if line.starts_with(op) {
                // payload is in mdeg/s
                let speed = number(line[2..].trim()).map(|v| sign * v / 1000.0);
                return Some(Self::SetSpeed { axis, speed });
            }
        }
        if line.starts_with("SA SE") {
            return Some(Self::Stop);
        }
        if line.starts_with("RESET") {
            return Some(Self::Reset);
        }
        if line.starts_with("PARK") {
            return Some(Self::Park);
        }
        if line.starts_with("VE") {
            return Some(Self::Version);
        }
        if line.starts_with("IP") {
            return b.get(2).copied().and_then(InfoField::from_digit).map(Self::Info);
        }
        if line.starts_with("GS") {
            return Some(Self::GetStatus);
        }
        if line.starts_with("GE") {
            return Some(Self::GetError);
        }
        if line.starts_with("CR") {
            let digit = match b.get(2) {
                Some(b' ') | Some(b',') => b.get(3),
                other => other,
            };
            return digit
                .copied()
                .and_then(ConfigRegister::from_digit)
                .map(Self::ReadConfig);
        }
        if line.starts_with("CW") {
            let reg = b
                .get(2)
                .copied()
                .and_then(ConfigRegister::from_digit)
                .filter(|r| r.is_writable())?;
            let value = number(tokens(&line[3..]).next().unwrap_or(""));
            return Some(Self::WriteConfig(reg, value));
        }
        if line.starts_with("RST") {
            return Some(Self::Hang);
        }
        if line.starts_with("RB") {
            return Some(Self::Reboot);
        }
        None
    }

    /// Commands still answered once the fail-safe has tripped.
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::GetStatus | Self::GetError | Self::Reboot)
    }
}

fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split([' ', ',']).filter(|t| !t.is_empty())
}

/// Payload conversion. Any ASCII letter rejects the payload; otherwise the
/// longest leading `[+-]digits[.digits]` is taken and no digits at all mean 0.
fn number(s: &str) -> Option<f32> {
    if s.bytes().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.trim_start();
    let b = s.as_bytes();
    let digits = |from: usize| b[from..].iter().take_while(|c| c.is_ascii_digit()).count();

    let mut end = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    end += digits(end);
    if b.get(end) == Some(&b'.') {
        end += 1 + digits(end + 1);
    }
    Some(s[..end].parse().unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_position_wins_over_set() {
        assert_eq!(Command::parse("AZ EL"), Some(Command::GetPosition));
    }

    #[test]
    fn set_both_axes() {
        assert_eq!(
            Command::parse("AZ123.4 EL45.6"),
            Some(Command::SetPosition {
                az: Some(123.4),
                el: Some(45.6)
            })
        );
    }

    #[test]
    fn comma_separated_tokens() {
        assert_eq!(
            Command::parse("AZ10,EL20"),
            Some(Command::SetPosition {
                az: Some(10.0),
                el: Some(20.0)
            })
        );
    }

    #[test]
    fn bad_azimuth_keeps_elevation() {
        assert_eq!(
            Command::parse("AZabc EL10"),
            Some(Command::SetPosition {
                az: None,
                el: Some(10.0)
            })
        );
    }

    #[test]
    fn azimuth_only() {
        assert_eq!(
            Command::parse("AZ-5"),
            Some(Command::SetPosition {
                az: Some(-5.0),
                el: None
            })
        );
        assert_eq!(
            Command::parse("AZ"),
            Some(Command::SetPosition {
                az: Some(0.0),
                el: None
            })
        );
    }

    #[test]
    fn elevation_only() {
        assert_eq!(
            Command::parse("EL30"),
            Some(Command::SetPosition {
                az: None,
                el: Some(30.0)
            })
        );
    }

    #[test]
    fn speed_commands_scale_and_sign() {
        assert_eq!(
            Command::parse("VU1500"),
            Some(Command::SetSpeed {
                axis: Axis::Elevation,
                speed: Some(1.5)
            })
        );
        assert_eq!(
            Command::parse("VD 2000"),
            Some(Command::SetSpeed {
                axis: Axis::Elevation,
                speed: Some(-2.0)
            })
        );
        assert_eq!(
            Command::parse("VL500"),
            Some(Command::SetSpeed {
                axis: Axis::Azimuth,
                speed: Some(0.5)
            })
        );
        assert_eq!(
            Command::parse("VRx"),
            Some(Command::SetSpeed {
                axis: Axis::Azimuth,
                speed: None
            })
        );
    }

    #[test]
    fn letters_in_payload_rejected() {
        assert_eq!(number("1e3"), None);
        assert_eq!(number("inf"), None);
        assert_eq!(number("NaN"), None);
        assert_eq!(number("12x"), None);
    }

    #[test]
    fn payload_takes_numeric_prefix() {
        assert_eq!(number("+7.25"), Some(7.25));
        assert_eq!(number(" -3.5"), Some(-3.5));
        assert_eq!(number("1.2.3"), Some(1.2));
        assert_eq!(number("12-4"), Some(12.0));
        assert_eq!(number(".5"), Some(0.5));
        assert_eq!(number("5."), Some(5.0));
    }

    #[test]
    fn payload_without_digits_is_zero() {
        assert_eq!(number(""), Some(0.0));
        assert_eq!(number("-"), Some(0.0));
        assert_eq!(number("."), Some(0.0));
        assert_eq!(number("#"), Some(0.0));
    }

    #[test]
    fn bare_speed_opcode_means_zero() {
        assert_eq!(
            Command::parse("VU"),
            Some(Command::SetSpeed {
                axis: Axis::Elevation,
                speed: Some(0.0)
            })
        );
        assert_eq!(
            Command::parse("CW7,"),
            Some(Command::WriteConfig(ConfigRegister::Park(Axis::Azimuth), Some(0.0)))
        );
    }

    #[test]
    fn actions() {
        assert_eq!(Command::parse("SA SE"), Some(Command::Stop));
        assert_eq!(Command::parse("RESET"), Some(Command::Reset));
        assert_eq!(Command::parse("PARK"), Some(Command::Park));
        assert_eq!(Command::parse("RST"), Some(Command::Hang));
        assert_eq!(Command::parse("RB"), Some(Command::Reboot));
        assert_eq!(Command::parse("VE"), Some(Command::Version));
        assert_eq!(Command::parse("SA"), None);
    }

    #[test]
    fn info_fields() {
        assert_eq!(
            Command::parse("IP0"),
            Some(Command::Info(InfoField::InsideTemperature))
        );
        assert_eq!(
            Command::parse("IP8"),
            Some(Command::Info(InfoField::Speed(Axis::Elevation)))
        );
        assert_eq!(Command::parse("IP9"), None);
        assert_eq!(Command::parse("IP"), None);
        for d in b'0'..=b'8' {
            let f = InfoField::from_digit(d).unwrap();
            assert_eq!(f.index(), d - b'0');
        }
    }

    #[test]
    fn config_read_accepts_separator() {
        let kp_az = Some(Command::ReadConfig(ConfigRegister::Kp(Axis::Azimuth)));
        assert_eq!(Command::parse("CR1"), kp_az);
        assert_eq!(Command::parse("CR 1"), kp_az);
        assert_eq!(Command::parse("CR,1"), kp_az);
        assert_eq!(
            Command::parse("CR9"),
            Some(Command::ReadConfig(ConfigRegister::ControlMode))
        );
        assert_eq!(Command::parse("CR0"), None);
    }

    #[test]
    fn config_write() {
        assert_eq!(
            Command::parse("CW2,0.25"),
            Some(Command::WriteConfig(ConfigRegister::Ki(Axis::Azimuth), Some(0.25)))
        );
        assert_eq!(
            Command::parse("CW8 12.5"),
            Some(Command::WriteConfig(ConfigRegister::Park(Axis::Elevation), Some(12.5)))
        );
        assert_eq!(
            Command::parse("CW1,abc"),
            Some(Command::WriteConfig(ConfigRegister::Kp(Axis::Azimuth), None))
        );
        assert_eq!(Command::parse("CW9,1"), None);
        for n in 1..=9u8 {
            let r = ConfigRegister::from_digit(b'0' + n).unwrap();
            assert_eq!(r.number(), n);
        }
    }

    #[test]
    fn unknown_opcodes() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("XX"), None);
        assert_eq!(Command::parse("az el"), None);
    }

    #[test]
    fn diagnostic_subset() {
        assert!(Command::GetStatus.is_diagnostic());
        assert!(Command::GetError.is_diagnostic());
        assert!(Command::Reboot.is_diagnostic());
        assert!(!Command::GetPosition.is_diagnostic());
        assert!(!Command::Hang.is_diagnostic());
    }
}
