/*
Ring-Buffer Delay Line
======================

The buffer is allocated once, at construction, and never resized. Every
read and write index is reduced modulo the capacity, so no access can land
outside the allocation whatever delay a caller asks for.

  write_pos   Slot the next write goes to. The newest sample sits at
              write_pos - 1.

  read(d)     The sample written d writes ago (d = 1 is the newest). Used in
              "read, then write" order this gives y[n] = x[n - d].

Delays are clamped to [1, capacity]: asking for more history than the
buffer holds returns the oldest sample instead of wrapping into the future.
*/

#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Allocate a delay line holding `capacity` samples of history.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(2)],
            write_pos: 0,
        }
    }

    /// Allocate enough history for `seconds` at `sample_rate`, plus guard samples.
    pub fn with_max_time(seconds: f32, sample_rate: f32) -> Self {
        let samples = (seconds.max(0.0) * sample_rate).ceil() as usize;
        Self::new(samples + 2)
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest fractional delay `read_interpolated` can honour exactly.
    pub fn max_delay(&self) -> f32 {
        (self.buffer.len() - 1) as f32
    }

    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    #[inline]
    pub fn read(&self, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.clamp(1, len);
        self.buffer[(self.write_pos + len - delay) % len]
    }

    /// Linear-interpolated read for modulated (fractional) delay times.
    #[inline]
    pub fn read_interpolated(&self, delay_samples: f32) -> f32 {
        let delay = delay_samples.clamp(1.0, self.max_delay());
        let whole = delay.floor();
        let frac = delay - whole;
        let newer = self.read(whole as usize);
        if frac == 0.0 {
            return newer;
        }
        let older = self.read(whole as usize + 1);
        newer + (older - newer) * frac
    }

    /// Read `delay_samples` back, then write `sample`.
    #[inline]
    pub fn next_sample(&mut self, sample: f32, delay_samples: usize) -> f32 {
        let delayed = self.read(delay_samples);
        self.write(sample);
        delayed
    }

    pub fn render(&mut self, buffer: &mut [f32], delay_samples: usize) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample, delay_samples);
        }
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impulse_comes_back_after_delay() {
        let mut line = DelayLine::new(64);
        let mut buffer = vec![0.0; 32];
        buffer[0] = 1.0;

        line.render(&mut buffer, 10);

        for (i, &s) in buffer.iter().enumerate() {
            let expected = if i == 10 { 1.0 } else { 0.0 };
            assert_eq!(s, expected, "sample {i}");
        }
    }

    #[test]
    fn indices_wrap_without_leaving_the_buffer() {
        let mut line = DelayLine::new(8);
        for i in 0..100 {
            line.write(i as f32);
        }
        assert_eq!(line.read(1), 99.0);
        assert_eq!(line.read(8), 92.0);
        // Over-long requests clamp to the oldest sample.
        assert_eq!(line.read(1_000), 92.0);
        // Zero is treated as the newest sample.
        assert_eq!(line.read(0), 99.0);
    }

    #[test]
    fn interpolated_read_blends_neighbours() {
        let mut line = DelayLine::new(16);
        line.write(0.0);
        line.write(1.0);
        // delay 1 = 1.0, delay 2 = 0.0
        assert!((line.read_interpolated(1.5) - 0.5).abs() < 1e-6);
        assert_eq!(line.read_interpolated(1.0), 1.0);
        assert_eq!(line.read_interpolated(50.0), line.read(15));
    }

    #[test]
    fn capacity_comes_from_max_time() {
        let line = DelayLine::with_max_time(0.5, 48_000.0);
        assert_eq!(line.capacity(), 24_002);
    }

    #[test]
    fn reset_clears_history() {
        let mut line = DelayLine::new(8);
        line.write(1.0);
        line.reset();
        assert_eq!(line.read(1), 0.0);
    }
}
