//! Controller configuration.

use crate::consts::DEFAULT_RESET_SETTLE_MS;

/// Timing parameters for the [`Radio`](crate::driver::Radio) controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RadioConfig {
    /// How long the reset line is held at each level during a reset pulse, in
    /// milliseconds.
    pub reset_settle_ms: u32,
}

impl RadioConfig {
    /// The board defaults.
    pub const fn new() -> Self {
        Self {
            reset_settle_ms: DEFAULT_RESET_SETTLE_MS,
        }
    }

    /// Overrides the reset settle interval.
    pub const fn with_reset_settle_ms(mut self, ms: u32) -> Self {
        self.reset_settle_ms = ms;
        self
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(RadioConfig::default().reset_settle_ms, 100);
        assert_eq!(
            RadioConfig::new().with_reset_settle_ms(5).reset_settle_ms,
            5
        );
    }
}
