use std::time::{Duration, Instant};

#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,
    /// Sum of every `dt` so far, in seconds.
    pub elapsed: f32,
    pub now: Instant,
    pub frame_index: u64,
}

/// Produces clamped frame deltas and their running sum.
///
/// Deltas are clamped so that a stall (debugger, minimised window) does not
/// jump animations forward.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f64,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            elapsed: 0.0,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts the delta baseline without touching `elapsed`.
    ///
    /// Call after a surface reconfigure or resume.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let raw = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance(raw, now)
    }

    fn advance(&mut self, raw: Duration, now: Instant) -> FrameTime {
        let dt = raw.clamp(self.dt_min, self.dt_max);
        // f64 keeps long sessions from losing sub-millisecond steps.
        self.elapsed += dt.as_secs_f64();

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: self.elapsed as f32,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_the_sum_of_clamped_deltas() {
        let mut clock = FrameClock::new();
        let now = Instant::now();

        let a = clock.advance(Duration::from_millis(16), now);
        assert_eq!(a.frame_index, 0);
        assert!((a.elapsed - 0.016).abs() < 1e-6);

        // A 5 s stall only counts as the max step.
        let b = clock.advance(Duration::from_secs(5), now);
        assert!((b.dt - 0.25).abs() < 1e-6);
        assert!((b.elapsed - 0.266).abs() < 1e-6);
        assert_eq!(b.frame_index, 1);

        let c = clock.advance(Duration::ZERO, now);
        assert!((c.dt - 0.0001).abs() < 1e-7);
        assert!((clock.elapsed() - c.elapsed).abs() < 1e-9);
    }

    #[test]
    fn reset_keeps_accumulated_time() {
        let mut clock = FrameClock::new();
        clock.advance(Duration::from_millis(100), Instant::now());
        clock.reset();
        assert!((clock.elapsed() - 0.1).abs() < 1e-6);
    }
}
