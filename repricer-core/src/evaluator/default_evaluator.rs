//! Default implementation of the [`Evaluator`] trait.
use super::{EvalSummary, Evaluator};
use crate::{Env, Policy};
use anyhow::Result;
use log::info;
use std::{marker::PhantomData, time::SystemTime};

/// Runs a fixed number of episodes and aggregates episode returns.
///
/// Each episode resets the environment with the episode index
/// ([`Env::reset_with_index`]), which reseeds the environment's random
/// stream and makes evaluation runs reproducible.
pub struct DefaultEvaluator<E: Env, P: Policy<E>> {
    n_episodes: usize,
    env: E,
    phantom: PhantomData<P>,
}

impl<E: Env, P: Policy<E>> Evaluator<E, P> for DefaultEvaluator<E, P> {
    fn evaluate(&mut self, policy: &mut P) -> Result<EvalSummary> {
        let mut returns = Vec::with_capacity(self.n_episodes);
        let timer = SystemTime::now();

        for ix in 0..self.n_episodes {
            let mut prev_obs = self.env.reset_with_index(ix)?;
            let mut episode_return = 0f32;

            loop {
                let act = policy.sample(&prev_obs);
                let (step, _) = self.env.step(&act);
                episode_return += step.reward;
                if step.is_done() {
                    break;
                }
                prev_obs = step.obs;
            }

            returns.push(episode_return);
        }

        let eval_time = timer.elapsed()?.as_secs_f64();
        let avg_return = returns.iter().sum::<f32>() / returns.len().max(1) as f32;
        info!(
            "Evaluation over {} episodes: average return {:.2}",
            self.n_episodes, avg_return
        );

        Ok(EvalSummary {
            episodes: self.n_episodes,
            avg_return,
            min_return: returns.iter().cloned().fold(f32::INFINITY, f32::min),
            max_return: returns.iter().cloned().fold(f32::NEG_INFINITY, f32::max),
            eval_time,
        })
    }
}

impl<E: Env, P: Policy<E>> DefaultEvaluator<E, P> {
    /// Constructs a [`DefaultEvaluator`].
    ///
    /// * `config` - Configuration of the environment.
    /// * `seed` - Random seed for building the environment.
    /// * `n_episodes` - Number of episodes run per evaluation.
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
            phantom: PhantomData,
        })
    }
}
