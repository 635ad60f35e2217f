use crate::error::{FrameError, Result};

/// A wrapping 0–255 frame counter for one direction of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequence(u8);

impl Sequence {
    pub fn new(start: u8) -> Self {
        Self(start)
    }

    /// The id the next frame carries.
    pub fn current(self) -> u8 {
        self.0
    }

    /// Move to the next id, wrapping after 255. Returns the id just used.
    pub fn advance(&mut self) -> u8 {
        let used = self.0;
        self.0 = self.0.wrapping_add(1);
        used
    }

    /// Fail with [`FrameError::Sequence`] unless `actual` is the expected id.
    pub fn check(self, actual: u8) -> Result<()> {
        if actual != self.0 {
            return Err(FrameError::Sequence {
                expected: self.0,
                actual,
            });
        }
        Ok(())
    }

    /// Restart at 0, as at the start of a new command.
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
