//! Base noise: one `n_reps × m` matrix of standard-normal draws per hypothesis count.
//!
//! Every configuration sharing an `m` reads the *same* matrix (common random numbers), so
//! differences between configurations and between methods are not confounded by independent
//! sampling noise. Matrices are immutable once built and handed out as `Arc`.

use crate::{config, Result, SeedPolicy, SimError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Row-major `n_reps × m` matrix of i.i.d. standard-normal values.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseNoise {
    n_reps: usize,
    m: usize,
    seed: Option<u64>,
    values: Vec<f64>,
}

impl BaseNoise {
    /// Draw a fresh matrix from `StdRng::seed_from_u64(seed)`.
    pub fn generate(m: usize, n_reps: usize, seed: u64) -> Result<Self> {
        config::validate_m(m)?;
        if n_reps == 0 {
            return Err(SimError::NoReplications);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let values: Vec<f64> = (0..n_reps * m)
            .map(|_| rng.sample::<f64, _>(StandardNormal))
            .collect();
        Ok(Self {
            n_reps,
            m,
            seed: Some(seed),
            values,
        })
    }

    /// Wrap caller-supplied noise (row-major).
    pub fn from_values(n_reps: usize, m: usize, values: Vec<f64>) -> Result<Self> {
        config::validate_m(m)?;
        if n_reps == 0 {
            return Err(SimError::NoReplications);
        }
        let expected = n_reps * m;
        if values.len() != expected {
            return Err(SimError::NoiseLength {
                len: values.len(),
                expected,
            });
        }
        Ok(Self {
            n_reps,
            m,
            seed: None,
            values,
        })
    }

    /// All-zero noise: every observation equals its mean.
    pub fn zeros(n_reps: usize, m: usize) -> Self {
        Self {
            n_reps,
            m,
            seed: None,
            values: vec![0.0; n_reps * m],
        }
    }

    pub fn n_reps(&self) -> usize {
        self.n_reps
    }

    pub fn m(&self) -> usize {
        self.m
    }

    /// Seed the matrix was drawn from (`None` for caller-supplied noise).
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Noise for replication `rep`, or `None` past the end.
    pub fn row(&self, rep: usize) -> Option<&[f64]> {
        if rep >= self.n_reps {
            return None;
        }
        let start = rep * self.m;
        self.values.get(start..start + self.m)
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.values.chunks_exact(self.m.max(1))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Check that this matrix fits a configuration's `(n_reps, m)`.
    pub fn check_shape(&self, n_reps: usize, m: usize) -> Result<()> {
        if self.n_reps != n_reps || self.m != m {
            return Err(SimError::NoiseShape {
                rows: self.n_reps,
                cols: self.m,
                expected_rows: n_reps,
                expected_cols: m,
            });
        }
        Ok(())
    }
}

/// Generate the base noise for `m` under a seeding rule.
///
/// Same `(m, n_reps, policy)` gives a bit-identical matrix; different `m` values use unrelated
/// seeds.
pub fn get_base_noise(m: usize, n_reps: usize, policy: SeedPolicy) -> Result<BaseNoise> {
    BaseNoise::generate(m, n_reps, policy.seed_for(m))
}

/// Process-scoped cache of base noise keyed by `m`.
///
/// An entry is generated once and never replaced or mutated, so handing out `Arc` clones to
/// concurrent readers is safe once the cache is prepared.
#[derive(Debug, Clone)]
pub struct NoiseCache {
    policy: SeedPolicy,
    n_reps: usize,
    entries: BTreeMap<usize, Arc<BaseNoise>>,
}

impl NoiseCache {
    pub fn new(policy: SeedPolicy, n_reps: usize) -> Self {
        Self {
            policy,
            n_reps,
            entries: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> SeedPolicy {
        self.policy
    }

    pub fn n_reps(&self) -> usize {
        self.n_reps
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Published matrix for `m`, if any.
    pub fn get(&self, m: usize) -> Option<Arc<BaseNoise>> {
        self.entries.get(&m).cloned()
    }

    /// Return the matrix for `m`, generating it on first access.
    pub fn get_or_generate(&mut self, m: usize) -> Result<Arc<BaseNoise>> {
        if let Some(hit) = self.entries.get(&m) {
            tracing::debug!(m, "base noise cache hit");
            return Ok(Arc::clone(hit));
        }
        let seed = self.policy.seed_for(m);
        let noise = Arc::new(BaseNoise::generate(m, self.n_reps, seed)?);
        tracing::debug!(m, n_reps = self.n_reps, seed, "generated base noise");
        self.entries.insert(m, Arc::clone(&noise));
        Ok(noise)
    }

    /// Populate every `m` up front, before any configuration runs.
    pub fn prepare(&mut self, ms: &[usize]) -> Result<()> {
        for &m in ms {
            self.get_or_generate(m)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_has_requested_shape() {
        let n = BaseNoise::generate(8, 50, 3).unwrap();
        assert_eq!(n.n_reps(), 50);
        assert_eq!(n.m(), 8);
        assert_eq!(n.as_slice().len(), 400);
        assert_eq!(n.rows().count(), 50);
        assert_eq!(n.row(49).map(<[f64]>::len), Some(8));
        assert!(n.row(50).is_none());
        assert_eq!(n.seed(), Some(3));
    }

    #[test]
    fn generate_rejects_empty_dimensions() {
        assert_eq!(BaseNoise::generate(0, 10, 1), Err(SimError::EmptyFamily));
        assert_eq!(BaseNoise::generate(4, 0, 1), Err(SimError::NoReplications));
    }

    #[test]
    fn noise_is_roughly_standard_normal() {
        let n = BaseNoise::generate(64, 500, 99).unwrap();
        let v = n.as_slice();
        let len = v.len() as f64;
        let mean = v.iter().sum::<f64>() / len;
        let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (len - 1.0);
        // 32000 draws: SE(mean) ~ 0.0056, SE(var) ~ 0.008.
        assert!(mean.abs() < 0.03, "mean={mean}");
        assert!((var - 1.0).abs() < 0.05, "var={var}");
    }

    #[test]
    fn from_values_checks_length() {
        assert_eq!(
            BaseNoise::from_values(2, 3, vec![0.0; 5]),
            Err(SimError::NoiseLength {
                len: 5,
                expected: 6
            })
        );
        let n = BaseNoise::from_values(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(n.row(1), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(n.seed(), None);
    }

    #[test]
    fn check_shape_reports_mismatch() {
        let n = BaseNoise::zeros(10, 4);
        assert!(n.check_shape(10, 4).is_ok());
        assert_eq!(
            n.check_shape(10, 8),
            Err(SimError::NoiseShape {
                rows: 10,
                cols: 4,
                expected_rows: 10,
                expected_cols: 8
            })
        );
    }

    #[test]
    fn cache_returns_the_same_allocation() {
        let mut cache = NoiseCache::new(SeedPolicy::new(7), 20);
        let a = cache.get_or_generate(16).unwrap();
        let b = cache.get_or_generate(16).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(8).is_none());
    }

    #[test]
    fn prepare_populates_each_m_once() {
        let mut cache = NoiseCache::new(SeedPolicy::default(), 5);
        cache.prepare(&[4, 8, 4, 16]).unwrap();
        assert_eq!(cache.len(), 3);
        assert!(cache.prepare(&[0]).is_err());
        assert_eq!(cache.len(), 3);
    }
}
