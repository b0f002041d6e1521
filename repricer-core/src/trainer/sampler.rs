//! Samples experiences from the environment and pushes them to a buffer.
use crate::{record::Record, Env, ExperienceBufferBase, Policy, StepProcessor};
use anyhow::Result;

/// Drives one environment with a policy and feeds the resulting transitions
/// into a replay buffer through a [`StepProcessor`].
pub struct Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    env: E,

    /// Previous observation; `None` forces an environment reset on the next
    /// call to [`Sampler::sample_and_push`].
    prev_obs: Option<E::Obs>,

    step_processor: P,
}

impl<E, P> Sampler<E, P>
where
    E: Env,
    P: StepProcessor<E>,
{
    /// Creates a sampler from an environment and a step processor.
    pub fn new(env: E, step_processor: P) -> Self {
        Self {
            env,
            prev_obs: None,
            step_processor,
        }
    }

    /// Discards the current episode state.
    ///
    /// The next call to [`Sampler::sample_and_push`] resets the environment
    /// and starts a fresh episode. Used after an episode is aborted, either
    /// by an error or by an external step cap.
    pub fn reset(&mut self) {
        self.prev_obs = None;
    }

    /// Performs one environment step and pushes the transition.
    ///
    /// Returns the step's [`Record`], the reward and whether the episode
    /// ended with this step.
    pub fn sample_and_push<Q, R>(&mut self, policy: &mut Q, buffer: &mut R) -> Result<(Record, f32, bool)>
    where
        Q: Policy<E>,
        R: ExperienceBufferBase<Item = P::Output>,
    {
        // Reset the environment at the start of an episode
        if self.prev_obs.is_none() {
            self.prev_obs = Some(self.env.reset()?);
            self.step_processor
                .reset(self.prev_obs.as_ref().unwrap().clone());
        }

        // Sample an action and apply it to the environment
        let (step, record) = {
            let act = policy.sample(self.prev_obs.as_ref().unwrap());
            self.env.step_with_reset(&act)
        };
        let is_done = step.is_done();
        let reward = step.reward;

        // Update the previous observation
        self.prev_obs = match is_done {
            true => Some(step.init_obs.clone().expect("Failed to unwrap init_obs")),
            false => Some(step.obs.clone()),
        };

        // Produce and push the transition
        let transition = self.step_processor.process(step);
        buffer.push(transition)?;

        // Prime the step processor for the next episode
        if is_done {
            self.step_processor
                .reset(self.prev_obs.as_ref().unwrap().clone());
        }

        Ok((record, reward, is_done))
    }
}
