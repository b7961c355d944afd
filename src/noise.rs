//! Noise generator for the fourth voice
//!
//! A 16-bit xorshift LFSR clocked by a fractional accumulator. Each time the
//! accumulator crosses an integer boundary the register is stepped and a new
//! bipolar value (+1 or -1) is latched, so higher frequencies re-randomize
//! more often.

use crate::constants::{NOISE_REFERENCE, NOISE_SEED};

/// Noise generator state: LFSR register and the last latched value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseGenerator {
    /// 16-bit LFSR state, never zero
    seed: u16,
    /// Last emitted value: +1, -1, or 0 before the first step
    last_random: i16,
}

impl NoiseGenerator {
    /// Create a new noise generator seeded with [`NOISE_SEED`]
    pub fn new() -> Self {
        Self {
            seed: NOISE_SEED,
            last_random: 0,
        }
    }

    /// Current LFSR state
    #[inline]
    pub fn seed(&self) -> u16 {
        self.seed
    }

    /// Last value latched by [`NoiseGenerator::step`]
    #[inline]
    pub fn last_random(&self) -> i16 {
        self.last_random
    }

    /// Step the LFSR once and latch the new bipolar value.
    ///
    /// Taps: `x ^= x >> 7; x ^= x << 9; x ^= x >> 13` on 16 bits.
    #[inline]
    pub fn step(&mut self) -> i16 {
        self.seed ^= self.seed >> 7;
        self.seed ^= self.seed << 9;
        self.seed ^= self.seed >> 13;
        self.last_random = if self.seed & 1 != 0 { 1 } else { -1 };
        self.last_random
    }

    /// Advance the noise clock by one output sample.
    ///
    /// `phase` is the voice's accumulator. It grows by
    /// `freq² / (NOISE_REFERENCE * sample_rate)` and the LFSR is stepped
    /// while it stays above zero. Returns the latched value.
    #[inline]
    pub fn advance(&mut self, phase: &mut f32, freq: u16, sample_rate: u32) -> i16 {
        let freq = freq as u32;
        *phase += (freq * freq) as f32 / (NOISE_REFERENCE * sample_rate as f32);
        while *phase > 0.0 {
            *phase -= 1.0;
            self.step();
        }
        self.last_random
    }

    /// Reset to the power-on seed
    pub fn reset(&mut self) {
        self.seed = NOISE_SEED;
        self.last_random = 0;
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}
