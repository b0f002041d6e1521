//! The market environment.
use crate::{
    config::MarketEnvConfig,
    item::{Condition, Item},
    obs::{FeatureSchema, MarketObs},
    stats::{
        profile, CategoryTable, FALLBACK_AVG_DAYS, FALLBACK_PRICE_MEAN, FALLBACK_PRICE_STD,
        FALLBACK_STD_DAYS,
    },
    MarketAct,
};
use anyhow::Result;
use chrono::{Datelike, Local};
use log::info;
use repricer_core::{
    record::{Record, RecordValue::Scalar},
    Env, Info, Step,
};

const TITLE_SUFFIXES: &[&str] = &["Pro", "Air", "Ultra", "Max", "Plus", "Mini"];

/// Diagnostic information attached to every environment step.
#[derive(Debug, Clone)]
pub struct MarketInfo {
    /// Price before the adjustment.
    pub original_price: f64,

    /// Price after the adjustment.
    pub new_price: f64,

    /// Applied adjustment ratio.
    pub price_adjustment: f64,

    /// Simulated probability that the item sells at the new price.
    pub sale_probability: f64,

    /// Simulated expected days until the item sells.
    pub expected_days: f64,

    /// Step index within the episode, starting at 1.
    pub step: usize,
}

impl Info for MarketInfo {}

/// Simulates the market response to pricing decisions for one listed item
/// per episode.
///
/// Each step applies a discrete price adjustment, computes the market's
/// response (sale probability and expected days-to-sell, both driven by the
/// price's deviation from the category mean) and rewards the agent for
/// expected profit net of a time penalty. Episodes are bounded by
/// `max_steps`; reaching the bound truncates the episode.
pub struct MarketEnv {
    config: MarketEnvConfig,
    table: CategoryTable,
    schema: FeatureSchema,

    /// Adjustment-ratio distance between two adjacent actions.
    price_step: f64,

    seed: u64,
    rng: fastrand::Rng,
    item: Option<Item>,
    episode_step: usize,
}

impl MarketEnv {
    /// Number of features in an observation.
    pub fn state_space_size(&self) -> usize {
        self.schema.len()
    }

    /// Number of discrete actions.
    pub fn action_space_size(&self) -> usize {
        self.config.price_adjustment_steps
    }

    /// Feature names in observation order.
    pub fn feature_names(&self) -> &[String] {
        self.schema.names()
    }

    /// Maps an action index to a price-adjustment ratio.
    ///
    /// Indices are clamped into `[0, action_space_size)`; index 0 maps to
    /// the lower bound of the adjustment range and the last index to the
    /// upper bound.
    pub fn action_to_adjustment(&self, action: i64) -> f64 {
        let action = action.clamp(0, self.config.price_adjustment_steps as i64 - 1);
        self.config.price_adjustment_range[0] + action as f64 * self.price_step
    }

    /// Human-readable descriptions of all actions.
    pub fn action_meanings(&self) -> Vec<String> {
        (0..self.config.price_adjustment_steps as i64)
            .map(|a| format!("Adjust price {:+.1}%", self.action_to_adjustment(a) * 100.0))
            .collect()
    }

    /// Starts a new episode with the given item.
    pub fn reset_with_item(&mut self, item: Item) -> MarketObs {
        self.reset_(Some(item))
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.rng.f64()
    }

    fn active_item(&self) -> &Item {
        self.item
            .as_ref()
            .expect("no active episode; reset() must be called before step()")
    }

    /// Standardized deviation of the current price from the category mean;
    /// zero when the category's price spread is degenerate.
    fn price_deviation(&self) -> f64 {
        let item = self.active_item();
        let (price_mean, price_std) = match self.table.get(&item.category_id) {
            Some(s) => (s.price_mean, s.price_std),
            None => (FALLBACK_PRICE_MEAN, FALLBACK_PRICE_STD),
        };
        if price_std > 0.0 {
            (item.price - price_mean) / price_std
        } else {
            0.0
        }
    }

    /// Computes the market's response to the current price: the sale
    /// probability and the expected days-to-sell.
    ///
    /// A lower price (more negative deviation) raises the sale probability
    /// through a sigmoid and shortens the expected time-to-sell; both are
    /// jittered in proportion to the configured market volatility.
    fn market_response(&mut self) -> (f64, f64) {
        let deviation = self.price_deviation();
        let (avg_days, std_days) = match self.table.get(&self.active_item().category_id) {
            Some(s) => (s.avg_days_to_sell, s.std_days_to_sell),
            None => (FALLBACK_AVG_DAYS, FALLBACK_STD_DAYS),
        };

        let sale_probability = 1.0 / (1.0 + (self.config.price_sensitivity * deviation).exp());
        let jitter = self.uniform(-0.1, 0.1) * self.config.market_volatility;
        let sale_probability = (sale_probability + jitter).clamp(0.01, 1.0);

        let expected_days = avg_days * (1.0 + self.config.time_sensitivity * deviation);
        let jitter = self.uniform(-1.0, 1.0) * std_days * self.config.market_volatility;
        let expected_days = (expected_days + jitter).max(1.0);

        (sale_probability, expected_days)
    }

    /// Computes the reward for one repricing decision.
    ///
    /// The cost basis is assumed to be 70% of the pre-adjustment price; the
    /// profit share of the reward is scaled by the sale probability, and the
    /// expected time-to-sell is penalized relative to the category average.
    pub fn compute_reward(
        &self,
        original_price: f64,
        new_price: f64,
        sale_probability: f64,
        expected_days: f64,
    ) -> f64 {
        let estimated_cost = original_price * 0.7;
        let profit = new_price - estimated_cost;
        let normalized_profit = if original_price > 0.0 {
            profit / original_price
        } else {
            0.0
        };

        let avg_days = self
            .table
            .get(&self.active_item().category_id)
            .map(|s| s.avg_days_to_sell)
            .unwrap_or(FALLBACK_AVG_DAYS);
        let time_penalty = if avg_days > 0.0 {
            expected_days / avg_days
        } else {
            expected_days / 10.0
        };

        normalized_profit * sale_probability * self.config.profit_weight
            - time_penalty * self.config.time_weight
    }

    fn build_obs(&self) -> MarketObs {
        let item = self.active_item();
        let stats = self.table.get(&item.category_id);
        let (price_mean, price_std) = match stats {
            Some(s) => (s.price_mean, s.price_std),
            None => (FALLBACK_PRICE_MEAN, FALLBACK_PRICE_STD),
        };
        let avg_days = stats.map(|s| s.avg_days_to_sell).unwrap_or(FALLBACK_AVG_DAYS);

        let mut v: Vec<f32> = Vec::with_capacity(self.schema.len());

        // Item features
        let normalized_price = if price_std > 0.0 {
            (item.price - price_mean) / price_std
        } else {
            0.0
        };
        v.push(normalized_price as f32);
        v.push(item.condition.score() as f32);
        for id in self.table.ids() {
            v.push(if id == item.category_id { 1.0 } else { 0.0 });
        }

        // Market features
        v.push(self.config.market_volatility as f32);
        v.push((avg_days / 30.0) as f32);
        v.push((price_std / 1000.0) as f32);

        // Time features
        let now = Local::now();
        let weekday = now.weekday().num_days_from_monday();
        v.push(weekday as f32 / 6.0);
        v.push((now.month() - 1) as f32 / 11.0);
        v.push(if weekday >= 5 { 1.0 } else { 0.0 });

        // Normalized step counter
        v.push(self.episode_step as f32 / self.config.max_steps as f32);

        MarketObs(v)
    }

    fn random_item(&mut self) -> Item {
        let ix = self.rng.usize(..self.table.len());
        let category_id = self
            .table
            .ids()
            .nth(ix)
            .expect("category table is never empty")
            .to_string();
        let condition = Condition::ALL[self.rng.usize(..Condition::ALL.len())];

        let (lo, hi) = self.table.price_range(&category_id);
        let price = self.uniform(lo, hi);

        let prefix = match profile(&category_id) {
            Some(p) => p.title_prefixes[self.rng.usize(..p.title_prefixes.len())],
            None => "Item",
        };
        let suffix = TITLE_SUFFIXES[self.rng.usize(..TITLE_SUFFIXES.len())];
        let title = format!("{} {} {}", prefix, suffix, self.rng.u32(5..16));

        let now = Local::now();
        Item {
            id: format!("sim_{}_{}", now.timestamp(), self.rng.u32(1000..10000)),
            title,
            condition,
            price,
            category_id,
            listed_at: now,
            collected_at: now,
        }
    }

    fn reset_(&mut self, item: Option<Item>) -> MarketObs {
        self.episode_step = 0;
        let item = match item {
            Some(item) => item,
            None => self.random_item(),
        };
        self.item = Some(item);
        self.build_obs()
    }
}

impl Env for MarketEnv {
    type Config = MarketEnvConfig;
    type Obs = MarketObs;
    type Act = MarketAct;
    type Info = MarketInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        let table =
            CategoryTable::load_or_default(config.stats_path.as_ref().map(|p| p.as_ref()));
        let schema = FeatureSchema::new(&table);
        let price_step = if config.price_adjustment_steps > 1 {
            (config.price_adjustment_range[1] - config.price_adjustment_range[0])
                / (config.price_adjustment_steps - 1) as f64
        } else {
            0.0
        };
        let seed = seed as u64;

        info!(
            "MarketEnv over {} categories, {} features, {} actions",
            table.len(),
            schema.len(),
            config.price_adjustment_steps
        );

        Ok(Self {
            config: config.clone(),
            table,
            schema,
            price_step,
            seed,
            rng: fastrand::Rng::with_seed(seed),
            item: None,
            episode_step: 0,
        })
    }

    fn step(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        self.episode_step += 1;

        let adjustment = self.action_to_adjustment(a.0);
        let original_price = self.active_item().price;
        let new_price = original_price * (1.0 + adjustment);
        self.item
            .as_mut()
            .expect("no active episode; reset() must be called before step()")
            .price = new_price;

        let (sale_probability, expected_days) = self.market_response();
        let reward = self.compute_reward(original_price, new_price, sale_probability, expected_days);
        let obs = self.build_obs();
        let is_truncated = (self.episode_step >= self.config.max_steps) as i8;

        let record = Record::from_slice(&[
            ("original_price", Scalar(original_price as f32)),
            ("new_price", Scalar(new_price as f32)),
            ("price_adjustment", Scalar(adjustment as f32)),
            ("sale_probability", Scalar(sale_probability as f32)),
            ("expected_days", Scalar(expected_days as f32)),
        ]);
        let info = MarketInfo {
            original_price,
            new_price,
            price_adjustment: adjustment,
            sale_probability,
            expected_days,
            step: self.episode_step,
        };

        (
            Step::new(obs, a.clone(), reward as f32, 0, is_truncated, info, None),
            record,
        )
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        Ok(self.reset_(None))
    }

    fn step_with_reset(&mut self, a: &Self::Act) -> (Step<Self>, Record) {
        let (mut step, record) = self.step(a);
        if step.is_done() {
            step.init_obs = Some(self.reset_(None));
        }
        (step, record)
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = fastrand::Rng::with_seed(self.seed.wrapping_add(ix as u64));
        Ok(self.reset_(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(config: &MarketEnvConfig, seed: i64) -> MarketEnv {
        MarketEnv::build(config, seed).unwrap()
    }

    fn fixed_item(price: f64) -> Item {
        let now = Local::now();
        Item {
            id: "test_1".to_string(),
            title: "ThinkPad Pro 9".to_string(),
            condition: Condition::VeryGood,
            price,
            category_id: "9355".to_string(),
            listed_at: now,
            collected_at: now,
        }
    }

    #[test]
    fn deterministic_under_fixed_seed() {
        let config = MarketEnvConfig::default();
        let mut env1 = build(&config, 7);
        let mut env2 = build(&config, 7);

        for episode in 0..3 {
            let o1 = env1.reset().unwrap();
            let o2 = env2.reset().unwrap();
            assert_eq!(o1, o2, "episode {} initial obs differ", episode);

            loop {
                let a = MarketAct((episode % 10) as i64);
                let (s1, _) = env1.step(&a);
                let (s2, _) = env2.step(&a);
                assert_eq!(s1.obs, s2.obs);
                assert_eq!(s1.reward, s2.reward);
                assert_eq!(s1.is_truncated, s2.is_truncated);
                if s1.is_done() {
                    break;
                }
            }
        }
    }

    #[test]
    fn reset_with_index_reproduces_episodes() {
        let config = MarketEnvConfig::default();
        let mut env = build(&config, 42);
        let o1 = env.reset_with_index(3).unwrap();
        let (s1, _) = env.step(&MarketAct(4));
        let o2 = env.reset_with_index(3).unwrap();
        let (s2, _) = env.step(&MarketAct(4));
        assert_eq!(o1, o2);
        assert_eq!(s1.reward, s2.reward);
    }

    #[test]
    fn action_discretization_endpoints_and_monotonicity() {
        let env = build(&MarketEnvConfig::default(), 0);
        assert_eq!(env.action_to_adjustment(0), -0.3);
        assert!((env.action_to_adjustment(9) - 0.3).abs() < 1e-12);
        for a in 1..10 {
            assert!(env.action_to_adjustment(a) > env.action_to_adjustment(a - 1));
        }
        // Out-of-range indices are clamped.
        assert_eq!(env.action_to_adjustment(-5), env.action_to_adjustment(0));
        assert_eq!(env.action_to_adjustment(99), env.action_to_adjustment(9));
        assert_eq!(env.action_meanings().len(), 10);
    }

    #[test]
    fn feature_vector_is_stable() {
        let config = MarketEnvConfig::default();
        let mut env = build(&config, 1);
        let n = env.state_space_size();
        assert_eq!(n, env.feature_names().len());

        for _ in 0..3 {
            let obs = env.reset().unwrap();
            assert_eq!(obs.dim(), n);
            for _ in 0..5 {
                let (step, _) = env.step(&MarketAct(3));
                assert_eq!(step.obs.dim(), n);
            }
        }
    }

    #[test]
    fn episode_truncates_after_max_steps() {
        let config = MarketEnvConfig::default().max_steps(7);
        let mut env = build(&config, 5);
        env.reset().unwrap();

        let mut steps = 0;
        loop {
            let (step, _) = env.step(&MarketAct(0));
            steps += 1;
            assert!(steps <= 7, "episode did not truncate at the bound");
            if step.is_done() {
                assert_eq!(step.is_truncated, 1);
                assert_eq!(step.info.step, 7);
                break;
            }
        }
        assert_eq!(steps, 7);
    }

    #[test]
    fn reward_equals_profit_term_without_time_weight() {
        let config = MarketEnvConfig::default().profit_weight(1.0).time_weight(0.0);
        let mut env = build(&config, 0);
        env.reset_with_item(fixed_item(800.0));

        let (original, new, p, days) = (800.0, 900.0, 0.5, 12.0);
        let expected = ((new - original * 0.7) / original) * p;
        assert!((env.compute_reward(original, new, p, days) - expected).abs() < 1e-12);
    }

    #[test]
    fn reward_grows_with_price_at_fixed_time_cost() {
        let mut env = build(&MarketEnvConfig::default(), 0);
        env.reset_with_item(fixed_item(800.0));

        let (p, days) = (0.5, 12.0);
        let mut prev = f64::NEG_INFINITY;
        for new_price in [600.0, 700.0, 800.0, 900.0, 1000.0].iter() {
            let r = env.compute_reward(800.0, *new_price, p, days);
            assert!(r > prev);
            prev = r;
        }
    }

    #[test]
    fn step_reports_price_chain() {
        let mut env = build(&MarketEnvConfig::default(), 9);
        env.reset_with_item(fixed_item(1000.0));

        let (step, record) = env.step(&MarketAct(9));
        assert_eq!(step.info.original_price, 1000.0);
        assert!((step.info.new_price - 1300.0).abs() < 1e-9);
        assert!((record.get_scalar("new_price").unwrap() - 1300.0).abs() < 1e-3);

        // The adjusted price persists on the item.
        let (step, _) = env.step(&MarketAct(0));
        assert!((step.info.original_price - 1300.0).abs() < 1e-9);
    }
}
