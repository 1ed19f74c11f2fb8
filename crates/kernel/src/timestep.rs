/// Fixed-timestep accumulator.
///
/// Real frame time is added with [`accumulate`](Self::accumulate); each full
/// interval is handed out by [`consume_step`](Self::consume_step). A slow frame
/// therefore yields several catch-up steps instead of skipping logic.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedTimestep {
    interval: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(interval: f32) -> Self {
        debug_assert!(interval > 0.0);
        Self {
            interval,
            accumulator: 0.0,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn accumulate(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.accumulator += dt;
        }
    }

    /// Take one interval out of the accumulator if a full one is available.
    pub fn consume_step(&mut self) -> bool {
        if self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            true
        } else {
            false
        }
    }

    /// Progress through the current interval, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.interval).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_until_full_interval() {
        let mut ts = FixedTimestep::new(0.5);
        ts.accumulate(0.3);
        assert!(!ts.consume_step());
        ts.accumulate(0.3);
        assert!(ts.consume_step());
        assert!((ts.accumulator() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn slow_frame_yields_catch_up_steps() {
        let mut ts = FixedTimestep::new(0.5);
        ts.accumulate(1.6);
        let mut steps = 0;
        while ts.consume_step() {
            steps += 1;
        }
        assert_eq!(steps, 3);
        assert!((ts.alpha() - 0.2).abs() < 1e-5);
    }

    #[test]
    fn ignores_negative_and_nan() {
        let mut ts = FixedTimestep::new(0.5);
        ts.accumulate(-1.0);
        ts.accumulate(f32::NAN);
        assert_eq!(ts.accumulator(), 0.0);
    }
}
