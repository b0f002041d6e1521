//! Train [`Agent`].
mod config;
mod sampler;
use std::time::SystemTime;

use crate::{
    record::{Record, RecordValue::Scalar, Recorder},
    Agent, Env, Evaluator, ExperienceBufferBase, ReplayBufferBase, StepProcessor,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::{info, warn};
pub use sampler::Sampler;
use serde::Serialize;

/// Aggregate statistics of a training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    /// Requested number of episodes.
    pub episodes: usize,

    /// Episodes that ran to completion. Failed episodes are excluded from
    /// the return statistics below.
    pub completed_episodes: usize,

    /// Average return over completed episodes.
    pub avg_return: f32,

    /// Smallest episode return.
    pub min_return: f32,

    /// Largest episode return.
    pub max_return: f32,

    /// Exploration rate after the last optimization step, when the agent
    /// reports one.
    pub final_epsilon: Option<f32>,

    /// Wall-clock training time in seconds.
    pub training_time: f64,

    /// Path of the final checkpoint, when a model directory was configured.
    pub model_path: Option<String>,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop and related objects.
///
/// Training proceeds by episodes. In each episode the environment is reset
/// and stepped until it reports `done` (or an optional step cap is hit);
/// every transition is pushed into the replay buffer, and every
/// `opt_interval` environment steps past the warmup period the agent gets an
/// optimization step. The agent itself may still skip the update while the
/// buffer does not hold enough transitions for a batch.
///
/// Objects interact as follows:
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|A
///     B -->|"Step&lt;E: Env&gt;"|C[StepProcessor]
///     C -->|ReplayBufferBase::Item|D[ReplayBufferBase]
///     D -->|TransitionBatch|A
/// ```
///
/// Every `log_interval` episodes the rolling average return and the
/// exploration rate are reported; every `save_freq` episodes the agent's
/// parameters are checkpointed; if `eval_interval` is set, the agent is
/// periodically evaluated and the best-scoring parameters are kept in
/// `(model_dir)/best`. A failure inside one episode is logged and the
/// episode's partial return is dropped from the aggregates; the run itself
/// continues with a fresh episode.
pub struct Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Configuration of the environment for training.
    env_config: E::Config,

    /// Configuration of the transition producer.
    step_proc_config: P::Config,

    /// Configuration of the replay buffer.
    replay_buffer_config: R::Config,

    config: TrainerConfig,
}

impl<E, P, R> Trainer<E, P, R>
where
    E: Env,
    P: StepProcessor<E>,
    R: ExperienceBufferBase<Item = P::Output> + ReplayBufferBase,
{
    /// Constructs a trainer.
    pub fn build(
        config: TrainerConfig,
        env_config: E::Config,
        step_proc_config: P::Config,
        replay_buffer_config: R::Config,
    ) -> Self {
        Self {
            env_config,
            step_proc_config,
            replay_buffer_config,
            config,
        }
    }

    fn save_model<A: Agent<E, R>>(agent: &A, model_dir: String) {
        match agent.save_params(model_dir.as_ref()) {
            Ok(()) => info!("Saved the model in {:?}.", &model_dir),
            Err(_) => warn!("Failed to save model in {:?}.", &model_dir),
        }
    }

    fn save_best_model<A: Agent<E, R>>(agent: &A, model_dir: String) {
        let model_dir = model_dir + "/best";
        Self::save_model(agent, model_dir);
    }

    fn save_model_with_episode<A: Agent<E, R>>(agent: &A, model_dir: String, episode: usize) {
        let model_dir = model_dir + format!("/episode_{}", episode).as_str();
        Self::save_model(agent, model_dir);
    }

    /// Runs one episode. Returns the episode return, or an error if the
    /// environment or the buffer failed mid-episode.
    fn train_episode<A: Agent<E, R>>(
        &self,
        agent: &mut A,
        buffer: &mut R,
        sampler: &mut Sampler<E, P>,
        recorder: &mut dyn Recorder,
        env_steps: &mut usize,
        last_epsilon: &mut Option<f32>,
    ) -> Result<f32> {
        let mut episode_return = 0f32;
        let mut episode_steps = 0usize;

        loop {
            let (record, reward, done) = sampler.sample_and_push(agent, buffer)?;
            episode_return += reward;
            episode_steps += 1;
            *env_steps += 1;

            let mut record = record;
            if *env_steps >= self.config.warmup_period
                && *env_steps % self.config.opt_interval == 0
            {
                if let Some(record_agent) = agent.opt(buffer) {
                    if let Ok(eps) = record_agent.get_scalar("epsilon") {
                        *last_epsilon = Some(eps);
                    }
                    record = record.merge(record_agent);
                }
            }
            if !record.is_empty() {
                recorder.store(record);
            }

            if done {
                return Ok(episode_return);
            }

            if let Some(max_steps) = self.config.max_steps {
                if episode_steps >= max_steps {
                    // The env does not know about the external cap;
                    // drop the rest of the episode.
                    sampler.reset();
                    return Ok(episode_return);
                }
            }
        }
    }

    /// Trains the agent and returns aggregate statistics of the run.
    pub fn train<A, D>(
        &mut self,
        agent: &mut A,
        recorder: &mut dyn Recorder,
        evaluator: &mut D,
    ) -> Result<TrainingSummary>
    where
        A: Agent<E, R>,
        D: Evaluator<E, A>,
    {
        let env = E::build(&self.env_config, self.config.seed)?;
        let producer = P::build(&self.step_proc_config);
        let mut buffer = R::build(&self.replay_buffer_config);
        let mut sampler = Sampler::new(env, producer);
        let mut returns: Vec<f32> = Vec::with_capacity(self.config.episodes);
        let mut env_steps = 0usize;
        let mut last_epsilon: Option<f32> = None;
        let mut best_eval_return = f32::MIN;
        let timer = SystemTime::now();
        agent.train();

        for episode in 1..=self.config.episodes {
            match self.train_episode(
                agent,
                &mut buffer,
                &mut sampler,
                recorder,
                &mut env_steps,
                &mut last_epsilon,
            ) {
                Ok(episode_return) => returns.push(episode_return),
                Err(e) => {
                    warn!("Episode {} failed and was dropped: {}", episode, e);
                    sampler.reset();
                }
            }

            if episode % self.config.log_interval == 0 {
                let tail = &returns[returns.len().saturating_sub(self.config.log_interval)..];
                let avg = tail.iter().sum::<f32>() / tail.len().max(1) as f32;
                match last_epsilon {
                    Some(eps) => info!(
                        "Episode {}/{} | average return {:.2} | epsilon {:.4}",
                        episode, self.config.episodes, avg, eps
                    ),
                    None => info!(
                        "Episode {}/{} | average return {:.2}",
                        episode, self.config.episodes, avg
                    ),
                }
                recorder.flush(episode as _);
            }

            if let Some(eval_interval) = self.config.eval_interval {
                if episode % eval_interval == 0 {
                    agent.eval();
                    let summary = evaluator.evaluate(agent)?;
                    agent.train();
                    recorder.write(Record::from_slice(&[(
                        "eval_return",
                        Scalar(summary.avg_return),
                    )]));

                    if summary.avg_return > best_eval_return {
                        best_eval_return = summary.avg_return;
                        if let Some(model_dir) = self.config.model_dir.as_ref() {
                            Self::save_best_model(agent, model_dir.clone());
                        }
                    }
                }
            }

            if episode % self.config.save_freq == 0 {
                if let Some(model_dir) = self.config.model_dir.as_ref() {
                    Self::save_model_with_episode(agent, model_dir.clone(), episode);
                }
            }
        }

        let model_path = self.config.model_dir.as_ref().map(|model_dir| {
            let path = format!("{}/final", model_dir);
            Self::save_model(agent, path.clone());
            path
        });

        let training_time = timer.elapsed()?.as_secs_f64();
        let n = returns.len();
        let avg_return = returns.iter().sum::<f32>() / n.max(1) as f32;
        let min_return = returns.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_return = returns.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        info!(
            "Training finished after {:.1}s, average return {:.2}",
            training_time, avg_return
        );

        Ok(TrainingSummary {
            episodes: self.config.episodes,
            completed_episodes: n,
            avg_return,
            min_return,
            max_return,
            final_epsilon: last_epsilon,
            training_time,
            model_path,
        })
    }
}
