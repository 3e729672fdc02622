//! Pausable game clock
//!
//! Every time delta in the game flows through here. While paused the clock
//! swallows frame time, so nothing time-based catches up on resume.

/// Longest frame delta accepted (seconds); a backgrounded tab can report huge gaps
pub const MAX_FRAME_DT: f64 = 0.1;

#[derive(Debug, Clone, Default)]
pub struct PausableClock {
    elapsed: f64,
    paused: bool,
}

impl PausableClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by a raw frame delta. Returns the delta actually applied
    /// (0 while paused).
    pub fn advance(&mut self, raw_dt: f64) -> f64 {
        if self.paused || !raw_dt.is_finite() || raw_dt <= 0.0 {
            return 0.0;
        }
        let dt = raw_dt.min(MAX_FRAME_DT);
        self.elapsed += dt;
        dt
    }

    /// Game time in seconds, excluding paused spans
    #[inline]
    pub fn now(&self) -> f64 {
        self.elapsed
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }
}
