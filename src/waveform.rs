//! Waveform generators for the tonal voices
//!
//! Phase is a normalized position in `[0, 1)`. The pulse voice uses PolyBLEP
//! correction at both edges of each half-cycle to keep aliasing down.

/// PolyBLEP correction factor for a sub-phase `p` advancing by `dp`.
///
/// Returns 1.0 away from the edges and a smooth 0..1 ramp within one
/// increment of either end.
#[inline]
pub fn polyblep(p: f32, dp: f32) -> f32 {
    if p < dp {
        let t = p / dp;
        t + t - t * t
    } else if p > 1.0 - dp {
        let t = (p - (1.0 - dp)) / dp;
        1.0 - (t + t - t * t)
    } else {
        1.0
    }
}

/// Phase increment per sample for `freq` at `sample_rate`
#[inline]
pub fn phase_increment(freq: u16, sample_rate: u32) -> f32 {
    freq as f32 / sample_rate as f32
}

/// Advance `phase` by `inc`, wrapping back into `[0, 1)`.
#[inline]
pub fn advance_phase(phase: &mut f32, inc: f32) {
    *phase += inc;
    if *phase >= 1.0 {
        *phase = phase.fract();
    }
}

/// Band-limited pulse sample.
///
/// The high part of the cycle (`phase < duty`) outputs `+volume`, the rest
/// `-volume`. Each part is remapped to its own 0..1 sub-phase before the
/// PolyBLEP correction is applied.
#[inline]
pub fn pulse_sample(phase: f32, inc: f32, duty: f32, volume: i16) -> i16 {
    let (sub_phase, sub_inc, amplitude) = if phase < duty {
        (phase / duty, inc / duty, volume as i32)
    } else {
        let low = 1.0 - duty;
        ((phase - duty) / low, inc / low, -(volume as i32))
    };
    (amplitude as f32 * polyblep(sub_phase, sub_inc)) as i16
}

/// Triangle sample, peaking at `phase` 0 and 1 and bottoming out at 0.5.
#[inline]
pub fn triangle_sample(phase: f32, volume: i16) -> i16 {
    let fold = (2.0 * phase - 1.0).abs() as f64;
    (volume as f64 * (2.0 * fold - 1.0)) as i16
}
