//! Evaluate a policy.
use crate::{Env, Policy};
use anyhow::Result;
use serde::Serialize;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Aggregate statistics of an evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct EvalSummary {
    /// Number of evaluation episodes.
    pub episodes: usize,

    /// Average return over the episodes.
    pub avg_return: f32,

    /// Smallest episode return.
    pub min_return: f32,

    /// Largest episode return.
    pub max_return: f32,

    /// Wall-clock evaluation time in seconds.
    pub eval_time: f64,
}

/// Evaluates a policy.
pub trait Evaluator<E: Env, P: Policy<E>> {
    /// Runs evaluation episodes and aggregates their returns.
    ///
    /// The caller is responsible for the internal state of `policy`, like
    /// switching an agent to evaluation mode beforehand.
    fn evaluate(&mut self, policy: &mut P) -> Result<EvalSummary>;
}
