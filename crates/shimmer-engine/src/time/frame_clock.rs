/// Divisor applied to elapsed milliseconds before they reach the time uniform.
pub const DEFAULT_TIME_DIVISOR: f64 = 5000.0;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTime {
    /// Scaled time since the clock started (`elapsed_ms / divisor`).
    pub elapsed: f64,

    /// Milliseconds since the previous tick (or since start for the first tick).
    pub delta_ms: f64,

    /// Host timestamp of the tick, in milliseconds.
    pub now: f64,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Deltas are reported raw. A host timestamp that goes backwards yields a zero
/// delta rather than a negative one.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: f64,
    last: f64,
    divisor: f64,
    frame_index: u64,
}

impl FrameClock {
    /// Creates a clock anchored at `start` (milliseconds) with the default divisor.
    pub fn new(start: f64) -> Self {
        Self::with_divisor(start, DEFAULT_TIME_DIVISOR)
    }

    /// Creates a clock with a custom elapsed-time divisor.
    ///
    /// Non-positive or non-finite divisors fall back to `1.0`.
    pub fn with_divisor(start: f64, divisor: f64) -> Self {
        let divisor = if divisor.is_finite() && divisor > 0.0 {
            divisor
        } else {
            1.0
        };

        Self {
            start,
            last: start,
            divisor,
            frame_index: 0,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self, now: f64) -> FrameTime {
        let delta_ms = (now - self.last).max(0.0);
        self.last = now;

        let ft = FrameTime {
            elapsed: (now - self.start) / self.divisor,
            delta_ms,
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}
