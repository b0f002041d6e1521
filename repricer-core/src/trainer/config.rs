//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of training episodes.
    pub episodes: usize,

    /// Optional cap on the number of environment steps per episode, applied
    /// on top of the environment's own episode bound.
    pub max_steps: Option<usize>,

    /// Interval of optimization steps in environment steps.
    pub opt_interval: usize,

    /// Warmup period, for filling the replay buffer, in environment steps.
    pub warmup_period: usize,

    /// Interval of saving model parameters, in episodes.
    pub save_freq: usize,

    /// Interval of evaluation, in episodes. `None` disables evaluation
    /// during training.
    pub eval_interval: Option<usize>,

    /// Interval of progress reports, in episodes.
    pub log_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,

    /// Random seed passed to the training environment.
    pub seed: i64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_steps: None,
            opt_interval: 4,
            warmup_period: 0,
            save_freq: 100,
            eval_interval: None,
            log_interval: 10,
            model_dir: None,
            seed: 0,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training episodes.
    pub fn episodes(mut self, v: usize) -> Self {
        self.episodes = v;
        self
    }

    /// Sets the per-episode step cap.
    pub fn max_steps(mut self, v: Option<usize>) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the interval of optimization in environment steps.
    pub fn opt_interval(mut self, opt_interval: usize) -> Self {
        self.opt_interval = opt_interval;
        self
    }

    /// Sets the warmup period in environment steps.
    pub fn warmup_period(mut self, warmup_period: usize) -> Self {
        self.warmup_period = warmup_period;
        self
    }

    /// Sets the interval of saving in episodes.
    pub fn save_freq(mut self, save_freq: usize) -> Self {
        self.save_freq = save_freq;
        self
    }

    /// Sets the interval of evaluation in episodes.
    pub fn eval_interval(mut self, v: Option<usize>) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the interval of progress reports in episodes.
    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v;
        self
    }

    /// Sets the directory where models are saved.
    pub fn model_dir(mut self, model_dir: impl Into<String>) -> Self {
        self.model_dir = Some(model_dir.into());
        self
    }

    /// Sets the random seed of the training environment.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Constructs [`TrainerConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn yaml_round_trip() -> Result<()> {
        let config = TrainerConfig::default()
            .episodes(250)
            .opt_interval(2)
            .save_freq(50)
            .eval_interval(Some(25))
            .model_dir("some/directory");

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
