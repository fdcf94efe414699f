//! Seed sources and deterministic math helpers.
//!
//! Hosts inject a [`RandomSource`] instead of reaching for a global clock.
//! Deterministic runs thread a [`FixedRandomSource`] through the settings.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// Seed sources
// ---------------------------------------------------------------------------

/// Produces 32-bit world seeds.
pub trait RandomSource {
    fn next_seed(&mut self) -> u32;
}

/// Seeds drawn from a ChaCha stream keyed by the system clock at construction.
#[derive(Clone, Debug)]
pub struct ClockRandomSource {
    rng: ChaCha8Rng,
}

impl ClockRandomSource {
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self {
            rng: ChaCha8Rng::seed_from_u64(nanos),
        }
    }
}

impl Default for ClockRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ClockRandomSource {
    fn next_seed(&mut self) -> u32 {
        self.rng.next_u32()
    }
}

/// Always yields the same seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedRandomSource(pub u32);

impl RandomSource for FixedRandomSource {
    fn next_seed(&mut self) -> u32 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Deterministic math (libm)
// ---------------------------------------------------------------------------

/// Deterministic `powf` using libm (not platform libc).
#[inline]
pub fn det_powf(x: f32, y: f32) -> f32 {
    libm::powf(x, y)
}

/// Deterministic square root using libm.
#[inline]
pub fn det_sqrtf(x: f32) -> f32 {
    libm::sqrtf(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_source_repeats() {
        let mut source = FixedRandomSource(12345);
        assert_eq!(source.next_seed(), 12345);
        assert_eq!(source.next_seed(), 12345);
    }

    #[test]
    fn test_clock_source_advances() {
        let mut source = ClockRandomSource::new();
        let seeds: Vec<u32> = (0..8).map(|_| source.next_seed()).collect();
        assert!(seeds.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_sources_are_object_safe() {
        let mut sources: Vec<Box<dyn RandomSource>> = vec![
            Box::new(FixedRandomSource(1)),
            Box::new(ClockRandomSource::default()),
        ];
        assert_eq!(sources[0].next_seed(), 1);
        let _ = sources[1].next_seed();
    }

    #[test]
    fn test_det_math_matches_expectations() {
        assert_eq!(det_powf(2.0, 3.0), 8.0);
        assert_eq!(det_sqrtf(16.0), 4.0);
    }
}
