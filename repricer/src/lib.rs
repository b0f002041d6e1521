//! Dynamic repricing of second-hand listings with a DQN agent.
//!
//! This crate wires the [`MarketEnv`] simulation, the candle DQN agent and
//! the episode-driven trainer together, and exposes the train/evaluate
//! session entry points used by the CLI.
mod batch;
pub mod session;
pub use batch::{ActBatch, ObsBatch};

use repricer_candle_agent::{dqn::Dqn, mlp::Mlp};
use repricer_core::{
    generic_replay_buffer::{SimpleReplayBuffer, SimpleStepProcessor},
    DefaultEvaluator,
};
use repricer_market_env::MarketEnv;

/// Step processor turning market steps into tensor-backed transitions.
pub type StepProc = SimpleStepProcessor<MarketEnv, ObsBatch, ActBatch>;

/// Replay buffer over tensor-backed observation and action sets.
pub type ReplayBuffer = SimpleReplayBuffer<ObsBatch, ActBatch>;

/// The DQN agent on the market environment.
pub type MarketDqn = Dqn<MarketEnv, Mlp, ReplayBuffer>;

/// Greedy evaluator of the agent.
pub type MarketEvaluator = DefaultEvaluator<MarketEnv, MarketDqn>;
