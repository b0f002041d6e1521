//! DQN agent implemented with candle.
use super::{
    config::DqnConfig,
    explorer::{greedy, EpsilonGreedy},
    model::DqnModel,
};
use crate::{
    model::SubModel1,
    util::{smooth_l1_loss, track, CriticLoss, OutDim},
};
use anyhow::Result;
use candle_core::{shape::D, Device, Tensor};
use candle_nn::loss::mse;
use log::{info, warn};
use rand::{rngs::SmallRng, SeedableRng};
use repricer_core::{
    record::{Record, RecordValue},
    Agent, Configurable, Env, ExperienceBufferBase, Policy, ReplayBufferBase, TransitionBatch,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs, io::Write, marker::PhantomData, path::Path};

/// Checkpoint metadata, stored next to the network parameters.
///
/// Carries the full architecture declaration; a checkpoint whose declared
/// architecture does not match the live agent is refused wholesale.
#[derive(Debug, Deserialize, Serialize)]
struct DqnCheckpointMeta<C> {
    q_config: C,
    opt_config: crate::opt::OptimizerConfig,
    epsilon: f64,
}

#[allow(clippy::upper_case_acronyms)]
/// DQN agent implemented with candle.
///
/// Keeps an online and a target copy of the action-value network. Action
/// selection is ε-greedy in training mode and purely greedy in evaluation
/// mode. Each optimization step samples a batch of transitions, minimizes
/// the TD error against the target network, soft-updates the target
/// parameters and decays the exploration rate.
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    pub(in crate::dqn) soft_update_interval: usize,
    pub(in crate::dqn) soft_update_counter: usize,
    pub(in crate::dqn) n_updates_per_opt: usize,
    pub(in crate::dqn) batch_size: usize,
    pub(in crate::dqn) qnet: DqnModel<Q>,
    pub(in crate::dqn) qnet_tgt: DqnModel<Q>,
    pub(in crate::dqn) train: bool,
    pub(in crate::dqn) discount_factor: f64,
    pub(in crate::dqn) tau: f64,
    pub(in crate::dqn) explorer: EpsilonGreedy,
    pub(in crate::dqn) device: Device,
    pub(in crate::dqn) n_opts: usize,
    pub(in crate::dqn) double_dqn: bool,
    pub(in crate::dqn) critic_loss: CriticLoss,
    pub(in crate::dqn) phantom: PhantomData<(E, R)>,
    rng: SmallRng,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.explorer.eps()
    }

    fn update_critic(&mut self, buffer: &mut R) -> f32 {
        let batch = buffer.batch(self.batch_size).unwrap();
        let (obs, act, next_obs, reward, is_terminated, is_truncated) = batch.unpack();
        let obs = obs.into();
        let act = act.into().to_device(&self.device).unwrap();
        let next_obs = next_obs.into();
        let reward = Tensor::from_slice(&reward[..], (reward.len(),), &self.device).unwrap();
        let is_not_done = {
            let v = is_terminated
                .iter()
                .zip(is_truncated.iter())
                .map(|(t, u)| 1f32 - (*t | *u) as f32)
                .collect::<Vec<_>>();
            Tensor::from_slice(&v[..], (v.len(),), &self.device).unwrap()
        };

        let pred = {
            let x = self.qnet.forward(&obs);
            x.gather(&act, D::Minus1)
                .unwrap()
                .squeeze(D::Minus1)
                .unwrap()
        };

        let tgt = {
            let q = if self.double_dqn {
                let x = self.qnet.forward(&next_obs);
                let y = x.argmax(D::Minus1).unwrap().unsqueeze(D::Minus1).unwrap();
                self.qnet_tgt.forward(&next_obs).gather(&y, D::Minus1).unwrap()
            } else {
                let x = self.qnet_tgt.forward(&next_obs);
                let y = x.argmax(D::Minus1).unwrap();
                x.gather(&y.unsqueeze(D::Minus1).unwrap(), D::Minus1)
                    .unwrap()
            };
            let q = q.squeeze(D::Minus1).unwrap();
            let gamma_q = (is_not_done * (self.discount_factor * q).unwrap()).unwrap();
            (reward + gamma_q).unwrap().detach()
        };

        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(&pred, &tgt).unwrap(),
            CriticLoss::SmoothL1 => smooth_l1_loss(&pred, &tgt).unwrap(),
        };

        self.qnet.backward_step(&loss).unwrap();

        loss.to_scalar::<f32>().unwrap()
    }

    fn opt_(&mut self, buffer: &mut R) -> Record {
        let mut loss_critic = 0f32;

        for _ in 0..self.n_updates_per_opt {
            loss_critic += self.update_critic(buffer);
        }

        self.soft_update_counter += 1;
        if self.soft_update_counter == self.soft_update_interval {
            self.soft_update_counter = 0;
            let _ = track(self.qnet_tgt.get_varmap(), self.qnet.get_varmap(), self.tau);
        }

        self.explorer.decay();

        loss_critic /= self.n_updates_per_opt as f32;
        self.n_opts += 1;

        Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("epsilon", RecordValue::Scalar(self.explorer.eps() as f32)),
        ])
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    /// In training mode actions are ε-greedy; in evaluation mode the greedy
    /// action is always taken.
    fn sample(&mut self, obs: &E::Obs) -> E::Act {
        let a = self.qnet.forward(&obs.clone().into());
        let a = if self.train {
            self.explorer.action(&a, &mut self.rng)
        } else {
            greedy(&a)
        };
        a.into()
    }
}

impl<E, Q, R> Configurable for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    type Config = DqnConfig<Q::Config>;

    /// Constructs a DQN agent.
    fn build(config: Self::Config) -> Self {
        let device: Device = config.device.unwrap_or(crate::Device::Cpu).into();
        let qnet = DqnModel::build(config.model_config.clone(), device.clone()).unwrap();
        let qnet_tgt = DqnModel::build(config.model_config, device.clone()).unwrap();

        Dqn {
            qnet,
            qnet_tgt,
            soft_update_interval: config.soft_update_interval,
            soft_update_counter: 0,
            n_updates_per_opt: config.n_updates_per_opt,
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            tau: config.tau,
            train: false,
            explorer: config.explorer,
            device,
            n_opts: 0,
            double_dqn: config.double_dqn,
            critic_loss: config.critic_loss,
            phantom: PhantomData,
            rng: SmallRng::seed_from_u64(config.seed),
        }
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Output = Tensor>,
    R: ReplayBufferBase + ExperienceBufferBase,
    E::Obs: Into<Q::Input>,
    E::Act: From<Q::Output>,
    Q::Config: DeserializeOwned + Serialize + OutDim + std::fmt::Debug + PartialEq + Clone,
    R::Batch: TransitionBatch,
    <R::Batch as TransitionBatch>::ObsBatch: Into<Q::Input>,
    <R::Batch as TransitionBatch>::ActBatch: Into<Tensor>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    /// Skips the update until the buffer holds more transitions than the
    /// batch size.
    fn opt(&mut self, buffer: &mut R) -> Option<Record> {
        if buffer.len() > self.batch_size {
            Some(self.opt_(buffer))
        } else {
            None
        }
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.qnet.save(path.join("qnet.safetensors"))?;
        self.qnet_tgt.save(path.join("qnet_tgt.safetensors"))?;

        let meta = DqnCheckpointMeta {
            q_config: self.qnet.q_config().clone(),
            opt_config: self.qnet.opt_config().clone(),
            epsilon: self.explorer.eps(),
        };
        let mut file = fs::File::create(path.join("meta.yaml"))?;
        file.write_all(serde_yaml::to_string(&meta)?.as_bytes())?;
        info!("Saved DQN checkpoint in {:?}", path);
        Ok(())
    }

    /// Refuses a checkpoint whose declared architecture differs from the
    /// live agent: a warning is logged and the current parameters are kept
    /// untouched.
    fn load_params(&mut self, path: &Path) -> Result<()> {
        let file = fs::File::open(path.join("meta.yaml"))?;
        let meta: DqnCheckpointMeta<Q::Config> = serde_yaml::from_reader(file)?;

        if &meta.q_config != self.qnet.q_config() {
            warn!(
                "Checkpoint in {:?} declares architecture {:?}, but the agent is configured with {:?}; keeping current parameters",
                path,
                meta.q_config,
                self.qnet.q_config()
            );
            return Ok(());
        }

        self.qnet.load(path.join("qnet.safetensors"))?;
        self.qnet_tgt.load(path.join("qnet_tgt.safetensors"))?;
        self.explorer.set_eps(meta.epsilon);
        info!("Loaded DQN checkpoint from {:?}", path);
        Ok(())
    }
}
