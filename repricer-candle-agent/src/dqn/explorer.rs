//! Exploration strategy of DQN.
use candle_core::{shape::D, DType, Tensor};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer for DQN.
///
/// With probability `eps` a uniformly random action is taken, otherwise the
/// greedy one. The exploration rate decays multiplicatively after every
/// learning update and never falls below `eps_min`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    pub(crate) eps: f64,
    pub(crate) eps_min: f64,
    pub(crate) eps_decay: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps: 1.0,
            eps_min: 0.01,
            eps_decay: 0.995,
        }
    }
}

impl EpsilonGreedy {
    /// Sets the initial exploration rate.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps = v;
        self
    }

    /// Sets the lower bound of the exploration rate.
    pub fn eps_min(mut self, v: f64) -> Self {
        self.eps_min = v;
        self
    }

    /// Sets the multiplicative decay factor.
    pub fn eps_decay(mut self, v: f64) -> Self {
        self.eps_decay = v;
        self
    }

    /// Current exploration rate.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Overrides the current exploration rate, e.g. when restoring a
    /// checkpoint.
    pub fn set_eps(&mut self, v: f64) {
        self.eps = v;
    }

    /// Decays the exploration rate after a learning update.
    pub fn decay(&mut self) {
        self.eps = (self.eps * self.eps_decay).max(self.eps_min);
    }

    /// Takes an action based on action values, returns an i64 tensor.
    ///
    /// * `a` - action values of shape `[n_samples, n_actions]`.
    pub fn action(&self, a: &Tensor, rng: &mut impl Rng) -> Tensor {
        let r = rng.gen::<f64>();

        if r < self.eps {
            let n_samples = a.dims()[0];
            let n_actions = a.dims()[1] as u64;
            Tensor::from_slice(
                (0..n_samples)
                    .map(|_| (rng.gen::<u64>() % n_actions) as i64)
                    .collect::<Vec<_>>()
                    .as_slice(),
                &[n_samples],
                a.device(),
            )
            .unwrap()
        } else {
            greedy(a)
        }
    }
}

/// The greedy action per sample, as an i64 tensor.
pub(crate) fn greedy(a: &Tensor) -> Tensor {
    a.argmax(D::Minus1).unwrap().to_dtype(DType::I64).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use rand::{rngs::SmallRng, SeedableRng};

    fn action_values() -> Tensor {
        // Action 2 is the greedy one.
        Tensor::from_slice(&[0.1f32, -0.4, 0.9, 0.2], (1, 4), &Device::Cpu).unwrap()
    }

    fn take_action(explorer: &EpsilonGreedy, rng: &mut SmallRng) -> i64 {
        explorer.action(&action_values(), rng).to_vec1::<i64>().unwrap()[0]
    }

    #[test]
    fn fully_random_covers_all_actions() {
        let explorer = EpsilonGreedy::default().eps_start(1.0);
        let mut rng = SmallRng::seed_from_u64(0);
        let mut counts = [0usize; 4];

        for _ in 0..4000 {
            counts[take_action(&explorer, &mut rng) as usize] += 1;
        }
        // Roughly uniform: every action within 3 sigma of the expectation.
        for &c in counts.iter() {
            assert!((c as f64 - 1000.0).abs() < 3.0 * (4000.0f64 * 0.25 * 0.75).sqrt());
        }
    }

    #[test]
    fn fully_greedy_always_argmax() {
        let explorer = EpsilonGreedy::default().eps_start(0.0);
        let mut rng = SmallRng::seed_from_u64(0);
        for _ in 0..100 {
            assert_eq!(take_action(&explorer, &mut rng), 2);
        }
    }

    #[test]
    fn decay_is_bounded_below() {
        let mut explorer = EpsilonGreedy::default()
            .eps_start(1.0)
            .eps_min(0.05)
            .eps_decay(0.5);
        for _ in 0..20 {
            explorer.decay();
        }
        assert_eq!(explorer.eps(), 0.05);
    }
}
