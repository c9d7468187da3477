//! # Weight Sampler
//!
//! $$
//! u_i\sim\mathcal U(0,1)\ \text{i.i.d.},\qquad w_i=\frac{u_i}{\sum_{j=1}^{n}u_j}
//! $$
//!
//! Normalized uniforms land on the simplex but are not Dirichlet(1, ..., 1)
//! distributed for `n > 2`; the density is higher near the centroid. This is the
//! sampling law of the search and is kept as is.

use ndarray::Array1;
use ndarray_rand::RandomExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Open01;

use super::types::WeightVector;
use crate::error::PortfolioError;
use crate::error::Result;

const TRIAL_STREAM_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Draws random long-only weight vectors.
#[derive(Clone, Debug)]
pub struct WeightSampler {
  rng: StdRng,
}

impl WeightSampler {
  /// Reproducible sampler.
  pub fn seeded(seed: u64) -> Self {
    Self {
      rng: StdRng::seed_from_u64(seed),
    }
  }

  /// Independent stream for trial `index` of a run seeded with `seed`.
  ///
  /// Each trial owns its stream, so the draw does not depend on which worker
  /// scores the trial or in which order.
  pub fn for_trial(seed: u64, index: usize) -> Self {
    let stream = (index as u64).wrapping_add(1).wrapping_mul(TRIAL_STREAM_MIX);
    Self::seeded(seed ^ stream)
  }

  /// Draw one weight vector of length `n`, `n >= 2`.
  pub fn sample(&mut self, n: usize) -> Result<WeightVector> {
    if n < 2 {
      return Err(PortfolioError::InputValidation(format!(
        "weight vectors need at least 2 assets, got {n}"
      )));
    }

    let raw: Array1<f64> = Array1::random_using(n, Open01, &mut self.rng);
    let total = raw.sum();
    Ok(WeightVector::from_normalized(
      raw.iter().map(|u| u / total).collect(),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::quant::portfolio::types::WEIGHT_SUM_TOLERANCE;

  #[test]
  fn weights_are_on_the_simplex() {
    let mut sampler = WeightSampler::seeded(11);

    for n in 2..=10 {
      for _ in 0..500 {
        let w = sampler.sample(n).unwrap();
        assert_eq!(w.len(), n);
        assert!(w.as_slice().iter().all(|&x| (0.0..=1.0).contains(&x)));
        let sum: f64 = w.as_slice().iter().sum();
        assert!((sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE, "sum = {sum}");
      }
    }
  }

  #[test]
  fn seeded_samplers_are_reproducible() {
    let mut a = WeightSampler::seeded(42);
    let mut b = WeightSampler::seeded(42);
    let mut c = WeightSampler::seeded(43);

    let wa = a.sample(5).unwrap();
    assert_eq!(wa, b.sample(5).unwrap());
    assert_ne!(wa, c.sample(5).unwrap());
  }

  #[test]
  fn trial_streams_are_distinct_and_stable() {
    let w0 = WeightSampler::for_trial(7, 0).sample(3).unwrap();
    let w1 = WeightSampler::for_trial(7, 1).sample(3).unwrap();

    assert_ne!(w0, w1);
    assert_eq!(w1, WeightSampler::for_trial(7, 1).sample(3).unwrap());
  }

  #[test]
  fn single_asset_is_rejected() {
    let mut sampler = WeightSampler::seeded(1);
    assert!(matches!(
      sampler.sample(1),
      Err(PortfolioError::InputValidation(_))
    ));
    assert!(sampler.sample(0).is_err());
  }

  #[test]
  fn two_asset_draws_cover_both_tails() {
    let mut sampler = WeightSampler::seeded(3);
    let firsts: Vec<f64> = (0..2000)
      .map(|_| sampler.sample(2).unwrap().as_slice()[0])
      .collect();

    assert!(firsts.iter().any(|&w| w > 0.9));
    assert!(firsts.iter().any(|&w| w < 0.1));
  }
}
