//! Half-duplex RS-485 link on a blocking-mode USART.
//!
//! Blocking mode keeps the link usable from the degraded loop, which runs
//! inside an interrupt handler and never yields to an executor.

use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Blocking;
use embassy_stm32::usart::{Error as UartError, UartRx, UartTx};
use satnogs_rotator::SerialLink;

pub struct Rs485Link {
    tx: UartTx<'static, Blocking>,
    rx: UartRx<'static, Blocking>,
    de: Output<'static>,
    rx_errors: u32,
}

impl Rs485Link {
    pub fn new(
        tx: UartTx<'static, Blocking>,
        rx: UartRx<'static, Blocking>,
        mut de: Output<'static>,
    ) -> Self {
        de.set_low();
        Self {
            tx,
            rx,
            de,
            rx_errors: 0,
        }
    }

    /// Overrun, framing, noise and parity errors seen since start-up.
    pub fn rx_errors(&self) -> u32 {
        self.rx_errors
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), UartError> {
        self.tx.blocking_write(bytes)?;
        // DE must stay asserted until the last stop bit has left the shifter
        self.tx.blocking_flush()
    }
}

impl SerialLink for Rs485Link {
    type Error = UartError;

    fn read_byte(&mut self) -> Option<u8> {
        match self.rx.nb_read() {
            Ok(byte) => Some(byte),
            Err(nb::Error::WouldBlock) => None,
            // the byte is lost; the protocol resyncs on the next terminator
            Err(nb::Error::Other(_)) => {
                self.rx_errors = self.rx_errors.wrapping_add(1);
                None
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), UartError> {
        self.de.set_high();
        let res = self.transmit(bytes);
        self.de.set_low();
        res
    }
}
