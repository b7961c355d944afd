//! Stereo Output Mixer
//!
//! Sums the voice samples of one tick into a left and a right accumulator.
//! Routing follows each voice's pan bits; sums saturate at the i16 range
//! instead of wrapping.

use crate::command::PanRouting;

/// One tick's worth of stereo accumulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StereoMixer {
    left: i16,
    right: i16,
}

impl StereoMixer {
    /// Create a mixer with both sides at zero
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a voice sample to the sides selected by `pan`
    #[inline]
    pub fn add(&mut self, sample: i16, pan: u8) {
        let routing = PanRouting::from_pan(pan);
        if routing.contains(PanRouting::RIGHT) {
            self.right = self.right.saturating_add(sample);
        }
        if routing.contains(PanRouting::LEFT) {
            self.left = self.left.saturating_add(sample);
        }
    }

    /// Mixed `(left, right)` pair
    #[inline]
    pub fn output(&self) -> (i16, i16) {
        (self.left, self.right)
    }
}
