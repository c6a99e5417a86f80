use web_time::{Duration, Instant};

/// Timer for tracking frame timing and elapsed time.
///
/// Frames are stamped by the caller (the host's vsync callback), which keeps
/// the timer deterministic under test.
#[derive(Debug, Clone)]
pub struct Timer {
    start_time: Option<Instant>,
    last_update: Option<Instant>,
    /// Time since last tick
    pub delta: Duration,
    /// Total elapsed time since the first tick
    pub elapsed: Duration,
    /// Total number of ticks
    pub frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: None,
            last_update: None,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advances to `now`. The first tick reports a nominal 60Hz delta.
    pub fn tick(&mut self, now: Instant) {
        let start = *self.start_time.get_or_insert(now);
        self.delta = match self.last_update {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_secs_f64(1.0 / 60.0),
        };
        self.elapsed = now.saturating_duration_since(start);
        self.last_update = Some(now);
        self.frame_count += 1;
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}
