//! Round Timer
//!
//! Counts down the time a god has before a forced swap. When it runs out it
//! reports expiry once and immediately starts the next round.

use serde::{Serialize, Deserialize};

/// Swap countdown, in ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTimer {
    /// Full round length
    length_ticks: u32,
    /// Ticks left in this round
    remaining_ticks: u32,
    /// Counting down?
    running: bool,
}

impl RoundTimer {
    /// Create a stopped timer.
    pub fn new(length_ticks: u32) -> Self {
        Self {
            length_ticks,
            remaining_ticks: length_ticks,
            running: false,
        }
    }

    /// Resume counting.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Pause counting.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Refill to full length and run.
    pub fn reset(&mut self) {
        self.remaining_ticks = self.length_ticks;
        self.running = true;
    }

    /// Change the round length; takes effect on the next reset.
    pub fn set_length(&mut self, length_ticks: u32) {
        self.length_ticks = length_ticks;
    }

    /// Advance one tick. Returns true on the tick the round runs out.
    pub fn advance(&mut self) -> bool {
        if !self.running {
            return false;
        }
        if self.remaining_ticks > 0 {
            self.remaining_ticks -= 1;
            return false;
        }
        self.reset();
        true
    }

    /// Ticks left.
    pub fn remaining_ticks(&self) -> u32 {
        self.remaining_ticks
    }

    /// Round length.
    pub fn length_ticks(&self) -> u32 {
        self.length_ticks
    }

    /// Counting down?
    pub fn is_running(&self) -> bool {
        self.running
    }
}
