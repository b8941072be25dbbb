use heapless::Vec;

use super::ProtocolError;

/// Bounded line assembler.
///
/// Bytes accumulate until `\n` or `\r`. A line longer than `N` is dropped in
/// full: the overflow is reported once and everything up to the next
/// terminator is discarded.
pub struct LineBuffer<const N: usize> {
    buf: Vec<u8, N>,
    discarding: bool,
    complete: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            discarding: false,
            complete: false,
        }
    }

    /// Push one byte. Returns the finished line when `byte` is a terminator.
    pub fn push(&mut self, byte: u8) -> Result<Option<&[u8]>, ProtocolError> {
        if self.complete {
            self.buf.clear();
            self.complete = false;
        }

        match byte {
            b'\n' | b'\r' => {
                if self.discarding {
                    self.discarding = false;
                    return Ok(None);
                }
                self.complete = true;
                Ok(Some(&self.buf))
            }
            _ if self.discarding => Ok(None),
            _ => {
                if self.buf.push(byte).is_err() {
                    self.buf.clear();
                    self.discarding = true;
                    return Err(ProtocolError::Overflow { capacity: N });
                }
                Ok(None)
            }
        }
    }

    /// Bytes of the line currently being assembled.
    pub fn pending(&self) -> usize {
        if self.complete {
            0
        } else {
            self.buf.len()
        }
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
