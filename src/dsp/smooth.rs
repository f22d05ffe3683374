//! One-pole parameter smoothing.

/*
One-Pole Smoothing
==================

Every time-varying target in the effects chain (delay time, LFO rate,
depth, feedback, dry/wet) goes through one of these. A raw write would
jump the value in a single sample; for a delay time that is an audible
click, for a dry/wet it is a zipper.

    current += (target - current) * coeff

  coeff       Fraction of the remaining distance covered per sample.
              coeff = 1 - e^(-1 / (τ · fs))
              After τ seconds the value is ~63% of the way there, after
              5τ it is within 1%.

Once the remaining distance is below 1e-6 the value snaps to the target so
that settled parameters compare equal to what was asked for.
*/

#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
}

const SNAP_DISTANCE: f32 = 1e-6;

impl SmoothedParam {
    /// A smoothed value with an explicit per-sample coefficient in (0, 1].
    pub fn new(initial: f32, coeff: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: coeff.clamp(f32::MIN_POSITIVE, 1.0),
        }
    }

    /// A smoothed value with a time constant in milliseconds.
    pub fn with_time(initial: f32, time_ms: f32, sample_rate: f32) -> Self {
        Self::new(initial, coefficient_for(time_ms, sample_rate))
    }

    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Set the target and jump straight to it.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Jump to whatever the target currently is.
    #[inline]
    pub fn snap(&mut self) {
        self.current = self.target;
    }

    #[inline]
    pub fn advance(&mut self) -> f32 {
        let distance = self.target - self.current;
        if distance.abs() < SNAP_DISTANCE {
            self.current = self.target;
        } else {
            self.current += distance * self.coeff;
        }
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }
}

/// `1 - e^(-1 / (τ · fs))`, or 1.0 (instant) for a zero time constant.
pub fn coefficient_for(time_ms: f32, sample_rate: f32) -> f32 {
    let samples = time_ms.max(0.0) * 0.001 * sample_rate;
    if samples <= 1.0 {
        1.0
    } else {
        1.0 - (-1.0 / samples).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approaches_target_without_overshoot() {
        let mut p = SmoothedParam::with_time(0.0, 10.0, 48_000.0);
        p.set_target(1.0);

        let mut previous = 0.0;
        for _ in 0..480 {
            let v = p.advance();
            assert!(v >= previous && v <= 1.0);
            previous = v;
        }
        // One time constant: ~63%.
        assert!((previous - 0.632).abs() < 0.01, "got {previous}");
    }

    #[test]
    fn settles_exactly() {
        let mut p = SmoothedParam::with_time(0.0, 1.0, 48_000.0);
        p.set_target(0.5);
        for _ in 0..10_000 {
            p.advance();
        }
        assert!(p.is_settled());
        assert_eq!(p.current(), 0.5);
    }

    #[test]
    fn first_step_is_a_fraction_of_the_jump() {
        let mut p = SmoothedParam::new(0.0, 0.1);
        p.set_target(1.0);
        assert!((p.advance() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn zero_time_is_instant() {
        let mut p = SmoothedParam::with_time(0.0, 0.0, 48_000.0);
        p.set_target(3.0);
        assert_eq!(p.advance(), 3.0);
    }

    #[test]
    fn snap_and_immediate_skip_the_glide() {
        let mut p = SmoothedParam::new(0.0, 0.01);
        p.set_target(2.0);
        p.snap();
        assert_eq!(p.current(), 2.0);
        p.set_immediate(-1.0);
        assert_eq!(p.advance(), -1.0);
    }
}
