//! Configuration of [`MarketEnv`](crate::MarketEnv).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`MarketEnv`](crate::MarketEnv).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MarketEnvConfig {
    /// Episode length in decision points.
    pub max_steps: usize,

    /// Steepness of the sigmoid mapping price deviation to sale probability.
    pub price_sensitivity: f64,

    /// Scale of the price deviation's effect on expected days-to-sell.
    pub time_sensitivity: f64,

    /// Scale of the random jitter applied to the market response.
    pub market_volatility: f64,

    /// Price-adjustment range `[lo, hi]` as fractions of the current price.
    pub price_adjustment_range: [f64; 2],

    /// Number of discrete price adjustments; equals the action-space size.
    pub price_adjustment_steps: usize,

    /// Weight of the profit term in the reward.
    pub profit_weight: f64,

    /// Weight of the time-penalty term in the reward.
    pub time_weight: f64,

    /// Path of the category-statistics JSON file produced by the
    /// preprocessing stage. `None` (or a broken file) selects the built-in
    /// table.
    pub stats_path: Option<String>,
}

impl Default for MarketEnvConfig {
    fn default() -> Self {
        Self {
            max_steps: 30,
            price_sensitivity: 0.7,
            time_sensitivity: 0.3,
            market_volatility: 0.1,
            price_adjustment_range: [-0.3, 0.3],
            price_adjustment_steps: 10,
            profit_weight: 0.7,
            time_weight: 0.3,
            stats_path: None,
        }
    }
}

impl MarketEnvConfig {
    /// Sets the episode length.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the price sensitivity.
    pub fn price_sensitivity(mut self, v: f64) -> Self {
        self.price_sensitivity = v;
        self
    }

    /// Sets the time sensitivity.
    pub fn time_sensitivity(mut self, v: f64) -> Self {
        self.time_sensitivity = v;
        self
    }

    /// Sets the market volatility.
    pub fn market_volatility(mut self, v: f64) -> Self {
        self.market_volatility = v;
        self
    }

    /// Sets the price-adjustment range.
    pub fn price_adjustment_range(mut self, lo: f64, hi: f64) -> Self {
        self.price_adjustment_range = [lo, hi];
        self
    }

    /// Sets the number of discrete price adjustments.
    pub fn price_adjustment_steps(mut self, v: usize) -> Self {
        self.price_adjustment_steps = v;
        self
    }

    /// Sets the profit weight of the reward.
    pub fn profit_weight(mut self, v: f64) -> Self {
        self.profit_weight = v;
        self
    }

    /// Sets the time weight of the reward.
    pub fn time_weight(mut self, v: f64) -> Self {
        self.time_weight = v;
        self
    }

    /// Sets the path of the category-statistics file.
    pub fn stats_path(mut self, v: impl Into<String>) -> Self {
        self.stats_path = Some(v.into());
        self
    }

    /// Constructs [`MarketEnvConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`MarketEnvConfig`] as a YAML file.
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
        let config = MarketEnvConfig::default()
            .max_steps(10)
            .price_adjustment_range(-0.2, 0.2)
            .price_adjustment_steps(5)
            .stats_path("data/features/category_stats.json");

        let dir = TempDir::new("market_env_config")?;
        let path = dir.path().join("env.yaml");
        config.save(&path)?;
        assert_eq!(MarketEnvConfig::load(&path)?, config);
        Ok(())
    }
}
