//! Replication data: `observation = mean + noise`, one row per replication.

use crate::{BaseNoise, MeanVector, ObservationModel, Result};

/// One replication's observations plus the ground truth they were drawn under.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationRecord<'a> {
    /// Replication index (row of the base noise).
    pub index: usize,
    pub observations: Vec<f64>,
    /// `true` where the hypothesis is a true alternative.
    pub alternative: &'a [bool],
}

/// Lazily synthesized replications for one `(MeanVector, BaseNoise)` pair.
#[derive(Debug, Clone)]
pub struct Replications<'a> {
    means: &'a MeanVector,
    noise: &'a BaseNoise,
    noise_scale: f64,
    next: usize,
}

impl<'a> Iterator for Replications<'a> {
    type Item = ReplicationRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.noise.row(self.next)?;
        let mut observations = Vec::with_capacity(row.len());
        observe_into(self.means.values(), row, self.noise_scale, &mut observations);
        let record = ReplicationRecord {
            index: self.next,
            observations,
            alternative: self.means.alternative(),
        };
        self.next += 1;
        Some(record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.noise.n_reps().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Replications<'_> {}

/// Broadcast `means` over every row of `noise` (single-draw observations).
pub fn synthesize<'a>(means: &'a MeanVector, noise: &'a BaseNoise) -> Result<Replications<'a>> {
    synthesize_with(means, noise, ObservationModel::SingleDraw)
}

/// Like [`synthesize`], scaling the noise by the observation model's standard error.
pub fn synthesize_with<'a>(
    means: &'a MeanVector,
    noise: &'a BaseNoise,
    observation: ObservationModel,
) -> Result<Replications<'a>> {
    noise.check_shape(noise.n_reps(), means.len())?;
    Ok(Replications {
        means,
        noise,
        noise_scale: observation.standard_error(),
        next: 0,
    })
}

/// Write `means[i] + noise_scale * noise_row[i]` into `out` (cleared first).
pub fn observe_into(means: &[f64], noise_row: &[f64], noise_scale: f64, out: &mut Vec<f64>) {
    debug_assert_eq!(means.len(), noise_row.len());
    out.clear();
    out.extend(
        means
            .iter()
            .zip(noise_row)
            .map(|(&mu, &e)| mu + noise_scale * e),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_means, Shape, SimError};

    #[test]
    fn adds_means_to_every_row() {
        let mv = build_means(4, 0.5, Shape::Equal, 4.0).unwrap();
        // m1=2 under E: round(0.5) -> 0 everywhere, both land on L.
        assert_eq!(mv.values(), &[0.0, 0.0, 4.0, 4.0][..]);
        let noise =
            BaseNoise::from_values(2, 4, vec![0.1, -0.2, 0.3, -0.4, 1.0, 1.0, 1.0, 1.0]).unwrap();
        let recs: Vec<_> = synthesize(&mv, &noise).unwrap().collect();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].index, 0);
        assert_eq!(recs[0].observations, vec![0.1, -0.2, 4.3, 3.6]);
        assert_eq!(recs[1].observations, vec![1.0, 1.0, 5.0, 5.0]);
        assert_eq!(recs[1].alternative, &[false, false, true, true][..]);
    }

    #[test]
    fn sample_mean_scales_noise() {
        let mv = build_means(4, 0.0, Shape::Equal, 4.0).unwrap();
        let noise = BaseNoise::from_values(1, 4, vec![2.0; 4]).unwrap();
        let rec = synthesize_with(&mv, &noise, ObservationModel::SampleMean { n: 4 })
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(rec.observations, vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn mismatched_width_is_rejected() {
        let mv = build_means(8, 0.5, Shape::Equal, 5.0).unwrap();
        let noise = BaseNoise::zeros(3, 4);
        assert!(matches!(
            synthesize(&mv, &noise),
            Err(SimError::NoiseShape { .. })
        ));
    }

    #[test]
    fn zero_noise_reproduces_the_means() {
        let mv = build_means(16, 0.25, Shape::Decreasing, 10.0).unwrap();
        let noise = BaseNoise::zeros(5, 16);
        let it = synthesize(&mv, &noise).unwrap();
        assert_eq!(it.len(), 5);
        for rec in it {
            assert_eq!(rec.observations, mv.values());
        }
    }
}
