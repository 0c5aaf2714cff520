//! Deterministic seed derivation for the per-`m` noise streams.
//!
//! Not cryptographic. The only goals are that the same `(base, m)` always maps to the same seed
//! and that neighbouring `m` values land far apart in seed space.

/// Tag mixed into every noise seed ("NOIS").
const NOISE_TAG: u64 = 0x4E4F_4953;

/// Rule mapping a hypothesis count `m` to the seed of its base-noise matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeedPolicy {
    pub base: u64,
}

impl Default for SeedPolicy {
    fn default() -> Self {
        Self {
            base: crate::DEFAULT_SEED,
        }
    }
}

impl SeedPolicy {
    pub fn new(base: u64) -> Self {
        Self { base }
    }

    /// Seed for the noise matrix shared by every configuration with this `m`.
    #[must_use]
    pub fn seed_for(&self, m: usize) -> u64 {
        splitmix64(self.base ^ splitmix64((m as u64) ^ NOISE_TAG))
    }
}

/// SplitMix64 finalizer (good bit diffusion for sequential inputs).
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn seed_is_stable() {
        let p = SeedPolicy::new(12_345);
        assert_eq!(p.seed_for(16), p.seed_for(16));
    }

    #[test]
    fn distinct_m_get_distinct_seeds() {
        let p = SeedPolicy::default();
        let seeds: BTreeSet<u64> = (1..=256).map(|m| p.seed_for(m)).collect();
        assert_eq!(seeds.len(), 256);
    }

    #[test]
    fn base_changes_every_seed() {
        let a = SeedPolicy::new(1);
        let b = SeedPolicy::new(2);
        for m in [4, 8, 16, 32, 64] {
            assert_ne!(a.seed_for(m), b.seed_for(m));
        }
    }
}
