//! Configuration of [`Dqn`](super::Dqn).
use super::{DqnModelConfig, EpsilonGreedy};
use crate::{
    util::{CriticLoss, OutDim},
    Device,
};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn).
///
/// `Q` is the configuration type of the action-value function, e.g.
/// [`MlpConfig`](crate::mlp::MlpConfig).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q>
where
    Q: OutDim,
{
    /// Configuration of the action-value function and its optimizer.
    pub model_config: DqnModelConfig<Q>,

    /// Interval of soft updates of the target network, in optimization
    /// steps.
    pub soft_update_interval: usize,

    /// Gradient steps per optimization step.
    pub n_updates_per_opt: usize,

    /// Batch size sampled from the replay buffer. Optimization is skipped
    /// until the buffer holds more transitions than this.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f64,

    /// Interpolation coefficient of soft updates.
    pub tau: f64,

    /// Loss applied to the TD error.
    pub critic_loss: CriticLoss,

    /// Selects the next-state action with the online network instead of the
    /// target network.
    pub double_dqn: bool,

    /// Exploration strategy.
    pub explorer: EpsilonGreedy,

    /// Device on which tensors are placed. `None` selects the CPU.
    pub device: Option<Device>,

    /// Seed of the agent's random stream.
    pub seed: u64,
}

impl<Q> Default for DqnConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            model_config: DqnModelConfig::default(),
            soft_update_interval: 1,
            n_updates_per_opt: 1,
            batch_size: 64,
            discount_factor: 0.99,
            tau: 1e-3,
            critic_loss: CriticLoss::Mse,
            double_dqn: false,
            explorer: EpsilonGreedy::default(),
            device: None,
            seed: 42,
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the model configuration.
    pub fn model_config(mut self, v: DqnModelConfig<Q>) -> Self {
        self.model_config = v;
        self
    }

    /// Sets the interval of soft updates in optimization steps.
    pub fn soft_update_interval(mut self, v: usize) -> Self {
        self.soft_update_interval = v;
        self
    }

    /// Sets the number of gradient steps per optimization step.
    pub fn n_updates_per_opt(mut self, v: usize) -> Self {
        self.n_updates_per_opt = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the soft-update coefficient.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the loss applied to the TD error.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Enables or disables double DQN.
    pub fn double_dqn(mut self, v: bool) -> Self {
        self.double_dqn = v;
        self
    }

    /// Sets the exploration strategy.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = Some(v);
        self
    }

    /// Sets the seed of the agent's random stream.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`DqnConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mlp::MlpConfig;
    use tempdir::TempDir;

    #[test]
    fn yaml_round_trip() -> Result<()> {
        let config = DqnConfig::<MlpConfig>::default()
            .model_config(
                DqnModelConfig::default().q_config(MlpConfig::new(33, vec![128, 128], 10, false)),
            )
            .batch_size(32)
            .tau(0.005)
            .explorer(EpsilonGreedy::default().eps_decay(0.99));

        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn.yaml");
        config.save(&path)?;
        assert_eq!(DqnConfig::<MlpConfig>::load(&path)?, config);
        Ok(())
    }
}
