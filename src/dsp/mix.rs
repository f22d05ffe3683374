//! Stereo frames and the mixing primitives the block loop is built from.

/*
Mixing
======

Every stage past the voices works on one stereo frame at a time: the pools
average their voices into a frame, the effects chain maps a frame to a
frame, and the block processor clips the frame before interleaving it into
the output buffer.

  dry/wet      output = dry × (1 - mix) + wet × mix
               mix = 0.0 → untouched input, mix = 1.0 → effect only.
               The weights sum to 1.0, so blending never adds gain.

  hard clip    The last thing that happens to a sample. FM feedback and
               delay feedback are both bounded upstream, but the ceiling is
               what guarantees the DAC never sees more than ±ceiling.
*/

use std::ops::{Add, AddAssign, Mul};

/// One stereo sample pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    pub const SILENCE: Frame = Frame {
        left: 0.0,
        right: 0.0,
    };

    #[inline]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Same sample on both channels.
    #[inline]
    pub const fn mono(sample: f32) -> Self {
        Self {
            left: sample,
            right: sample,
        }
    }

    /// Clip both channels to `±ceiling`.
    #[inline]
    pub fn clip(self, ceiling: f32) -> Self {
        Self {
            left: hard_clip(self.left, ceiling),
            right: hard_clip(self.right, ceiling),
        }
    }

    /// Largest absolute channel value.
    #[inline]
    pub fn peak(self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}

impl Add for Frame {
    type Output = Frame;

    #[inline]
    fn add(self, rhs: Frame) -> Frame {
        Frame::new(self.left + rhs.left, self.right + rhs.right)
    }
}

impl AddAssign for Frame {
    #[inline]
    fn add_assign(&mut self, rhs: Frame) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl Mul<f32> for Frame {
    type Output = Frame;

    #[inline]
    fn mul(self, gain: f32) -> Frame {
        Frame::new(self.left * gain, self.right * gain)
    }
}

/// Blend dry and wet samples using linear crossfade.
///
/// output = (dry × (1-mix)) + (wet × mix)
#[inline]
pub fn blend_dry_wet(dry: f32, wet: f32, mix: f32) -> f32 {
    let mix = mix.clamp(0.0, 1.0);
    dry * (1.0 - mix) + wet * mix
}

/// [`blend_dry_wet`] applied to both channels.
#[inline]
pub fn blend_frames(dry: Frame, wet: Frame, mix: f32) -> Frame {
    Frame::new(
        blend_dry_wet(dry.left, wet.left, mix),
        blend_dry_wet(dry.right, wet.right, mix),
    )
}

/// Clamp a sample to `±ceiling`. Non-finite input becomes silence.
#[inline]
pub fn hard_clip(sample: f32, ceiling: f32) -> f32 {
    if sample.is_finite() {
        sample.clamp(-ceiling, ceiling)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_dry_wet() {
        // All dry
        assert_eq!(blend_dry_wet(1.0, 0.5, 0.0), 1.0);
        // All wet
        assert_eq!(blend_dry_wet(1.0, 0.5, 1.0), 0.5);
        // 50/50 mix
        assert_eq!(blend_dry_wet(1.0, 0.0, 0.5), 0.5);
    }

    #[test]
    fn test_blend_clamps_mix() {
        assert_eq!(blend_dry_wet(1.0, 0.0, 2.0), 0.0);
        assert_eq!(blend_dry_wet(1.0, 0.0, -1.0), 1.0);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let out = blend_frames(Frame::mono(1.0), Frame::mono(1.0), 0.3);
        assert!((out.left - 1.0).abs() < 1e-6);
        assert!((out.right - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hard_clip_bounds() {
        assert_eq!(hard_clip(1.5, 0.9), 0.9);
        assert_eq!(hard_clip(-3.0, 0.9), -0.9);
        assert_eq!(hard_clip(0.25, 0.9), 0.25);
    }

    #[test]
    fn test_hard_clip_rejects_non_finite() {
        assert_eq!(hard_clip(f32::NAN, 0.9), 0.0);
        assert_eq!(hard_clip(f32::INFINITY, 0.9), 0.0);
    }

    #[test]
    fn test_frame_arithmetic() {
        let mut acc = Frame::SILENCE;
        acc += Frame::new(0.25, -0.5);
        acc += Frame::new(0.25, 0.0);
        assert_eq!(acc, Frame::new(0.5, -0.5));
        assert_eq!(acc * 2.0, Frame::new(1.0, -1.0));
        assert_eq!(Frame::new(0.2, -0.7).peak(), 0.7);
    }
}
