use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use crate::error::ControlError;

pub const KNOB_COUNT: usize = 2;

// Bit pattern of a NaN, used for "never moved"
const UNSET: u32 = 0x7fc0_0000;

/// `f32` stored as its bits, so reads can never tear.
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    const fn unset() -> Self {
        Self(AtomicU32::new(UNSET))
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Continuous controls shared between the control and audio contexts.
///
/// Knobs are latest-value-wins: the audio side reads whatever was written
/// last. The encoder accumulates: the control side adds detents, the audio
/// side takes the running total once per block and resets it.
#[derive(Debug)]
pub struct SharedControls {
    knobs: [AtomicF32; KNOB_COUNT],
    encoder: AtomicI32,
}

impl Default for SharedControls {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedControls {
    pub const fn new() -> Self {
        Self {
            knobs: [AtomicF32::unset(), AtomicF32::unset()],
            encoder: AtomicI32::new(0),
        }
    }

    /// Store a knob position, clamped to [0, 1]. Non-finite values are
    /// ignored.
    pub fn set_knob(&self, index: usize, value: f32) -> Result<(), ControlError> {
        let knob = self.knobs.get(index).ok_or(ControlError::UnknownKnob(index))?;
        if value.is_finite() {
            knob.store(value.clamp(0.0, 1.0));
        }
        Ok(())
    }

    /// Latest position, or `None` if the knob was never set.
    pub fn knob(&self, index: usize) -> Option<f32> {
        let value = self.knobs.get(index)?.load();
        (!value.is_nan()).then_some(value)
    }

    pub fn knobs(&self) -> [Option<f32>; KNOB_COUNT] {
        std::array::from_fn(|i| self.knob(i))
    }

    pub fn turn_encoder(&self, increment: i32) {
        self.encoder.fetch_add(increment, Ordering::AcqRel);
    }

    /// Detents accumulated since the last call.
    pub fn take_encoder(&self) -> i32 {
        self.encoder.swap(0, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn knobs_start_unset_and_clamp() {
        let controls = SharedControls::new();
        assert_eq!(controls.knobs(), [None, None]);

        controls.set_knob(0, 1.7).unwrap();
        controls.set_knob(1, -0.2).unwrap();
        assert_eq!(controls.knobs(), [Some(1.0), Some(0.0)]);

        controls.set_knob(0, f32::NAN).unwrap();
        assert_eq!(controls.knob(0), Some(1.0));
    }

    #[test]
    fn unknown_knob_is_an_error() {
        let controls = SharedControls::new();
        assert_eq!(controls.set_knob(2, 0.5), Err(ControlError::UnknownKnob(2)));
        assert_eq!(controls.knob(5), None);
    }

    #[test]
    fn encoder_accumulates_across_threads() {
        let controls = Arc::new(SharedControls::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let controls = Arc::clone(&controls);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        controls.turn_encoder(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(controls.take_encoder(), 4_000);
        assert_eq!(controls.take_encoder(), 0);
    }
}
