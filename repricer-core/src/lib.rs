#![warn(missing_docs)]
//! Core abstractions for reinforcement-learning based repricing.
//!
//! This crate defines the interfaces between an environment, an agent and a
//! replay buffer, together with an episode-driven [`Trainer`] and an
//! [`Evaluator`]. It is backend-agnostic: tensor types live behind the
//! [`generic_replay_buffer::BatchBase`] seam, implemented by the agent crate.
pub mod error;
pub mod generic_replay_buffer;
pub mod record;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Info, Obs, Policy, ReplayBufferBase, Step,
    StepProcessor, TransitionBatch,
};

mod trainer;
pub use trainer::{Sampler, Trainer, TrainerConfig, TrainingSummary};

mod evaluator;
pub use evaluator::{DefaultEvaluator, EvalSummary, Evaluator};
