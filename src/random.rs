//! Every stochastic draw in the simulation goes through a [`DistributionSampler`].
//!
//! The kernel holds exactly one sampler and calls it in a fixed order per step, so a run is
//! reproducible from its seed. [`RandomSampler`] is the production implementation over a
//! seeded `SmallRng`; tests substitute scripted samplers to force individual branches.

use log::trace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution as _, Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionType {
    /// Always `round(mean)`, within `[0, max]`.
    Flat,
    /// Uniform integer in `0..=max`.
    Uniform,
    /// Normal around `mean` with a standard deviation of a third of the distance to `max`.
    Gaussian,
    /// Exponential with the given `mean`.
    Exponential,
}

/// An integer-valued distribution, truncated to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(rename = "type")]
    pub distribution_type: DistributionType,
    pub mean: f64,
    pub max: i64,
}

impl Distribution {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn flat(value: i64) -> Distribution {
        Distribution {
            distribution_type: DistributionType::Flat,
            mean: value as f64,
            max: value,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn uniform(max: i64) -> Distribution {
        Distribution {
            distribution_type: DistributionType::Uniform,
            mean: max as f64 / 2.0,
            max,
        }
    }

    /// # Errors
    ///
    /// Returns `SimError::InvalidConfiguration` for negative or non-finite parameters.
    pub fn validate(&self, name: &str) -> Result<(), SimError> {
        if !self.mean.is_finite() || self.mean < 0.0 || self.max < 0 {
            return Err(SimError::InvalidConfiguration(format!(
                "distribution {name} must have a finite, non-negative mean and max: {self:?}"
            )));
        }
        Ok(())
    }
}

/// The stochastic primitives used by the simulation kernel.
pub trait DistributionSampler {
    /// Draws an integer from `distribution`.
    fn get_distribution_value(&mut self, distribution: &Distribution) -> i64;

    /// Draws a double uniformly from `[0, 1)`.
    fn uniform_between_zero_and_one(&mut self) -> f64;

    /// Draws an integer uniformly from `0..n`; returns 0 when `n <= 0`.
    fn uniform_integer(&mut self, n: i64) -> i64;
}

/// A [`DistributionSampler`] backed by a single seeded `SmallRng`.
pub struct RandomSampler {
    rng: SmallRng,
}

impl RandomSampler {
    #[must_use]
    pub fn new(seed: u64) -> RandomSampler {
        trace!("creating new RNG (seed={seed})");
        RandomSampler {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_to_max(value: f64, max: i64) -> i64 {
    (value.round() as i64).clamp(0, max.max(0))
}

impl DistributionSampler for RandomSampler {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn get_distribution_value(&mut self, distribution: &Distribution) -> i64 {
        let Distribution {
            distribution_type,
            mean,
            max,
        } = *distribution;
        match distribution_type {
            DistributionType::Flat => clamp_to_max(mean, max),
            DistributionType::Uniform => self.rng.random_range(0..=max.max(0)),
            DistributionType::Gaussian => {
                let std_dev = ((max as f64) - mean).abs() / 3.0;
                let value = Normal::new(mean, std_dev).map_or(mean, |d| d.sample(&mut self.rng));
                clamp_to_max(value, max)
            }
            DistributionType::Exponential => {
                if mean <= 0.0 {
                    return 0;
                }
                let value = Exp::new(1.0 / mean).map_or(mean, |d| d.sample(&mut self.rng));
                clamp_to_max(value, max)
            }
        }
    }

    fn uniform_between_zero_and_one(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn uniform_integer(&mut self, n: i64) -> i64 {
        if n <= 0 {
            return 0;
        }
        self.rng.random_range(0..n)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::{Distribution, DistributionSampler};

    /// Replays queued values; falls back to fixed defaults once a queue runs dry.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedSampler {
        pub(crate) values: VecDeque<i64>,
        pub(crate) uniforms: VecDeque<f64>,
        pub(crate) default_value: i64,
        pub(crate) default_uniform: f64,
        pub(crate) uniform_draws: usize,
        pub(crate) value_draws: usize,
    }

    impl ScriptedSampler {
        /// Every distribution yields `value` and every uniform draw yields `uniform`.
        pub(crate) fn fixed(value: i64, uniform: f64) -> ScriptedSampler {
            ScriptedSampler {
                default_value: value,
                default_uniform: uniform,
                ..ScriptedSampler::default()
            }
        }

        pub(crate) fn with_values(mut self, values: &[i64]) -> ScriptedSampler {
            self.values.extend(values);
            self
        }

        pub(crate) fn with_uniforms(mut self, uniforms: &[f64]) -> ScriptedSampler {
            self.uniforms.extend(uniforms);
            self
        }
    }

    impl DistributionSampler for ScriptedSampler {
        fn get_distribution_value(&mut self, _distribution: &Distribution) -> i64 {
            self.value_draws += 1;
            self.values.pop_front().unwrap_or(self.default_value)
        }

        fn uniform_between_zero_and_one(&mut self) -> f64 {
            self.uniform_draws += 1;
            self.uniforms.pop_front().unwrap_or(self.default_uniform)
        }

        fn uniform_integer(&mut self, n: i64) -> i64 {
            self.value_draws += 1;
            self.values
                .pop_front()
                .unwrap_or(self.default_value)
                .clamp(0, (n - 1).max(0))
        }
    }
}
