//! Chip Constants
//!
//! Shared constants used across the engine, the tone decoder and the
//! synthesis loop.

/// Default audio sample rate (44.1 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Maximum level of the pulse and noise voices (~15% of `i16::MAX`)
pub const MAX_VOLUME: i16 = 0x1333;

/// Maximum level of the triangle voice (~25% of `i16::MAX`)
pub const MAX_VOLUME_TRIANGLE: i16 = 0x2000;

/// Number of voices on the chip
pub const NUM_CHANNELS: usize = 4;

/// Envelope durations are expressed in ticks of a 60 Hz clock
pub const TICKS_PER_SECOND: u64 = 60;

/// Initial LFSR state of the noise voice (must be non-zero)
pub const NOISE_SEED: u16 = 0x0001;

/// Reference divisor of the noise clock, tuned against a 44.1 kHz host.
///
/// The noise accumulator grows by `freq² / (NOISE_REFERENCE * sample_rate)`
/// per sample. This constant does not follow the configured sample rate.
pub const NOISE_REFERENCE: f32 = 1_000_000.0 / 44_100.0;

/// Upper bound of the volume bytes in a tone command (percent)
pub const VOLUME_PERCENT_MAX: u32 = 100;

/// Restart phase of the triangle voice (zero crossing, heading for the trough)
pub const TRIANGLE_START_PHASE: f32 = 0.25;

/// Number of samples in one millisecond at `sample_rate`
///
/// Integer division: 44 100 Hz gives 44 samples.
#[inline]
pub fn samples_per_millisecond(sample_rate: u32) -> u64 {
    sample_rate as u64 / 1000
}

/// Convert a 60 Hz tick count to a sample count at `sample_rate`
#[inline]
pub fn ticks_to_samples(sample_rate: u32, ticks: u8) -> u64 {
    sample_rate as u64 * ticks as u64 / TICKS_PER_SECOND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_volumes_are_fractions_of_full_scale() {
        let full = i16::MAX as f32;
        assert!((MAX_VOLUME as f32 / full - 0.15).abs() < 0.01);
        assert!((MAX_VOLUME_TRIANGLE as f32 / full - 0.25).abs() < 0.01);
    }

    #[test]
    fn test_ticks_to_samples() {
        assert_eq!(ticks_to_samples(44_100, 0), 0);
        assert_eq!(ticks_to_samples(44_100, 60), 44_100);
        assert_eq!(ticks_to_samples(44_100, 1), 735);
        assert_eq!(ticks_to_samples(48_000, 255), 204_000);
        // 22050 * 1 / 60 = 367.5, truncated
        assert_eq!(ticks_to_samples(22_050, 1), 367);
    }

    #[test]
    fn test_samples_per_millisecond() {
        assert_eq!(samples_per_millisecond(44_100), 44);
        assert_eq!(samples_per_millisecond(48_000), 48);
        assert_eq!(samples_per_millisecond(22_050), 22);
    }

    #[test]
    fn test_noise_seed_non_zero() {
        assert_ne!(NOISE_SEED, 0);
    }
}
