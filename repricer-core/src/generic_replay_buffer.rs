//! A generic implementation of a replay buffer.
//!
//! [`SimpleReplayBuffer`] stores transitions of arbitrary observation and
//! action types behind the [`BatchBase`] seam and samples uniform batches
//! without replacement within a single call.
mod base;
mod batch;
mod config;
mod step_proc;
pub use base::SimpleReplayBuffer;
pub use batch::{BatchBase, GenericTransitionBatch};
pub use config::SimpleReplayBufferConfig;
pub use step_proc::{SimpleStepProcessor, SimpleStepProcessorConfig};
