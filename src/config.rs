// Centralize all configuration constants

// Serial link
pub const UART_BAUDRATE: u32 = 19_200;
pub const LINE_BUFFER_SIZE: usize = 256;
// Position echo with both axes at -f32::MAX is 90 bytes
pub const RESPONSE_MAX: usize = 96;
pub const VERSION: &str = "SatNOGS-v2.2";

// Fail-safe supervision
pub const WATCHDOG_TIMEOUT_MS: u32 = 2_000;
pub const HARDWARE_WATCHDOG_TIMEOUT_MS: u32 = 4_000;
pub const SUPERVISOR_PERIOD_MS: u64 = 100;

// Task periods
pub const SENSOR_SAMPLE_RATE_HZ: u32 = 50;
pub const SENSOR_SAMPLE_PERIOD_MS: u64 = 1000 / SENSOR_SAMPLE_RATE_HZ as u64;
pub const SENSOR_READ_TIMEOUT_MS: u64 = 5;
pub const TEMPERATURE_PERIOD_MS: u64 = 1_000;
// 19200 baud fills ~3.8 of the 8 RX FIFO slots per poll
pub const PROTOCOL_POLL_PERIOD_MS: u64 = 2;

// Encoder to axis gearing
pub const GEAR_RATIO_AZ: f32 = 54.0;
pub const GEAR_RATIO_EL: f32 = 54.0;

// I2C bus
pub const I2C_FREQUENCY_HZ: u32 = 100_000;
pub const AS5601_ADDRESS: u8 = 0x36;
pub const TC74_ADDRESS: u8 = 0x48;
pub const I2C_MUX_ADDRESS: u8 = 0x70;
