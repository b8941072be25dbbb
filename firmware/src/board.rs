use embassy_stm32::mode::Async;
use embassy_stm32::peripherals::IWDG;
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{Config as UsartConfig, Uart};
use embassy_stm32::{
    bind_interrupts,
    gpio::{Input, Level, Output, Pull, Speed},
    i2c, peripherals, rcc, Config,
};
use satnogs_rotator::config::{I2C_FREQUENCY_HZ, UART_BAUDRATE};

use crate::drivers::{EndStops, MotorEnable, MotorFaults, Rs485Link};

// ── IRQ table ─────────────────────────────────────────────
bind_interrupts!(pub struct Irqs {
    I2C2   => i2c::EventInterruptHandler<peripherals::I2C2>,
              i2c::ErrorInterruptHandler<peripherals::I2C2>;
});

// ── Board struct ──────────────────────────────────────────
pub struct Board {
    pub link: Rs485Link,
    pub i2c2: i2c::I2c<'static, Async>, // DMA
    pub motor_enable: MotorEnable,
    pub motor_faults: MotorFaults,
    pub end_stops: EndStops,
    pub iwdg: IWDG,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();

        // Enable HSI and configure PLL for 64MHz
        config.rcc.hsi = Some(rcc::Hsi {
            sys_div: rcc::HsiSysDiv::DIV1,
        });
        config.rcc.pll = Some(rcc::Pll {
            source: rcc::PllSource::HSI,    // Use HSI as PLL source
            prediv: rcc::PllPreDiv::DIV2,   // 16MHz / 2 = 8MHz
            mul: rcc::PllMul::MUL16,        // 8MHz * 16 = 128MHz
            divp: None,                     // Not used
            divq: None,                     // Not used
            divr: Some(rcc::PllRDiv::DIV2), // 128MHz / 2 = 64MHz
        });
        config.rcc.sys = rcc::Sysclk::PLL1_R;
        let p = embassy_stm32::init(config);

        // Motor drivers stay disabled until the tasks are running
        let motor_enable = MotorEnable::new(Output::new(p.PB0, Level::Low, Speed::Low));
        let motor_faults =
            MotorFaults::new(Input::new(p.PB1, Pull::Up), Input::new(p.PB2, Pull::Up));
        let end_stops = EndStops::new(
            Input::new(p.PA0, Pull::Up),
            Input::new(p.PA1, Pull::Up),
            Level::Low,
        );

        // RS-485 on USART1, DE on PA12
        let mut us_cfg = UsartConfig::default();
        us_cfg.baudrate = UART_BAUDRATE;
        us_cfg.rx_pull = Pull::Up;
        let uart = Uart::new_blocking(p.USART1, p.PC5, p.PC4, us_cfg).unwrap();
        enable_rx_fifo();
        let (tx, rx) = uart.split();
        let de = Output::new(p.PA12, Level::Low, Speed::Medium);
        let link = Rs485Link::new(tx, rx, de);

        // I²C2  (DMA CH7 TX, CH6 RX)
        let mut i2c_cfg = i2c::Config::default();
        i2c_cfg.sda_pullup = false;
        i2c_cfg.scl_pullup = false;

        let i2c2 = i2c::I2c::new(
            p.I2C2,
            p.PB10,
            p.PB11,
            Irqs,
            p.DMA1_CH7,
            p.DMA1_CH6,
            Hertz(I2C_FREQUENCY_HZ),
            i2c_cfg,
        );

        Self {
            link,
            i2c2,
            motor_enable,
            motor_faults,
            end_stops,
            iwdg: p.IWDG,
        }
    }
}

/// Turn on the 8-byte USART1 RX FIFO. FIFOEN is only writable while UE is clear.
fn enable_rx_fifo() {
    let usart1 = embassy_stm32::pac::USART1;
    usart1.cr1().modify(|w| w.set_ue(false));
    usart1.cr1().modify(|w| w.set_fifoen(true));
    usart1.cr1().modify(|w| w.set_ue(true));
}
