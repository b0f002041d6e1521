//! Train and evaluate sessions.
use crate::{MarketDqn, MarketEvaluator, ReplayBuffer, StepProc};
use anyhow::Result;
use repricer_candle_agent::{
    dqn::{DqnConfig, DqnModelConfig, EpsilonGreedy},
    mlp::MlpConfig,
    opt::OptimizerConfig,
};
use repricer_core::{
    generic_replay_buffer::{SimpleReplayBufferConfig, SimpleStepProcessorConfig},
    record::LogRecorder,
    Agent, Configurable, Env, EvalSummary, Evaluator, Trainer, TrainerConfig, TrainingSummary,
};
use repricer_market_env::{MarketEnv, MarketEnvConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hyperparameters of the value-learning agent, mirroring the `drl` section
/// of the project configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DrlParams {
    /// Width of the two hidden layers of the Q-network.
    pub hidden_size: i64,

    /// Capacity of the replay buffer.
    pub buffer_size: usize,

    /// Batch size of learning updates.
    pub batch_size: usize,

    /// Discount factor.
    pub gamma: f64,

    /// Soft-update coefficient of the target network.
    pub tau: f64,

    /// Learning rate of the Adam optimizer.
    pub learning_rate: f64,

    /// Environment steps between learning updates.
    pub update_every: usize,

    /// Initial exploration rate.
    pub epsilon_start: f64,

    /// Lower bound of the exploration rate.
    pub epsilon_min: f64,

    /// Multiplicative decay of the exploration rate per learning update.
    pub epsilon_decay: f64,

    /// Seed of the agent's and the replay buffer's random streams.
    pub seed: u64,
}

impl Default for DrlParams {
    fn default() -> Self {
        Self {
            hidden_size: 128,
            buffer_size: 10000,
            batch_size: 64,
            gamma: 0.99,
            tau: 1e-3,
            learning_rate: 1e-3,
            update_every: 4,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            seed: 42,
        }
    }
}

/// State and action dimensions of an environment configuration, probed by
/// building a throwaway instance.
pub fn probe_dims(env_config: &MarketEnvConfig) -> Result<(i64, i64)> {
    let env = MarketEnv::build(env_config, 0)?;
    Ok((env.state_space_size() as i64, env.action_space_size() as i64))
}

/// Assembles the agent configuration for the given dimensions.
pub fn dqn_config(in_dim: i64, out_dim: i64, params: &DrlParams) -> DqnConfig<MlpConfig> {
    let mlp_config = MlpConfig::new(
        in_dim,
        vec![params.hidden_size, params.hidden_size],
        out_dim,
        false,
    );
    let model_config = DqnModelConfig::default()
        .q_config(mlp_config)
        .opt_config(OptimizerConfig::Adam {
            lr: params.learning_rate,
        });
    let explorer = EpsilonGreedy::default()
        .eps_start(params.epsilon_start)
        .eps_min(params.epsilon_min)
        .eps_decay(params.epsilon_decay);

    DqnConfig::default()
        .model_config(model_config)
        .batch_size(params.batch_size)
        .discount_factor(params.gamma)
        .tau(params.tau)
        .explorer(explorer)
        .seed(params.seed)
}

/// Trains a fresh agent and returns the run statistics.
///
/// `eval_episodes` sizes the evaluator used when the trainer's
/// `eval_interval` is set.
pub fn train(
    env_config: &MarketEnvConfig,
    params: &DrlParams,
    trainer_config: TrainerConfig,
    eval_episodes: usize,
) -> Result<TrainingSummary> {
    let (in_dim, out_dim) = probe_dims(env_config)?;
    let agent_config = dqn_config(in_dim, out_dim, params);
    let buffer_config = SimpleReplayBufferConfig::default()
        .capacity(params.buffer_size)
        .seed(params.seed);
    let trainer_config = trainer_config.opt_interval(params.update_every);
    let eval_seed = trainer_config.seed + 1;

    let mut trainer = Trainer::<MarketEnv, StepProc, ReplayBuffer>::build(
        trainer_config,
        env_config.clone(),
        SimpleStepProcessorConfig::default(),
        buffer_config,
    );
    let mut agent = MarketDqn::build(agent_config);
    let mut recorder = LogRecorder::new();
    let mut evaluator = MarketEvaluator::new(env_config, eval_seed, eval_episodes)?;

    trainer.train(&mut agent, &mut recorder, &mut evaluator)
}

/// Evaluates a trained agent restored from `model_dir`.
pub fn evaluate(
    env_config: &MarketEnvConfig,
    params: &DrlParams,
    model_dir: impl AsRef<Path>,
    episodes: usize,
    seed: i64,
) -> Result<EvalSummary> {
    let (in_dim, out_dim) = probe_dims(env_config)?;
    let agent_config = dqn_config(in_dim, out_dim, params);
    let mut agent = MarketDqn::build(agent_config);
    agent.load_params(model_dir.as_ref())?;
    agent.eval();

    let mut evaluator = MarketEvaluator::new(env_config, seed, episodes)?;
    evaluator.evaluate(&mut agent)
}
