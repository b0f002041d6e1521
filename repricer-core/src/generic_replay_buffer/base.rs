//! A generic ring-buffer implementation of experience replay.
use super::{BatchBase, GenericTransitionBatch, SimpleReplayBufferConfig};
use crate::{ExperienceBufferBase, ReplayBufferBase, TransitionBatch};
use anyhow::Result;
use rand::{rngs::StdRng, seq::index, SeedableRng};

/// A uniform replay buffer over observation set `O` and action set `A`.
///
/// Transitions are stored in a fixed-capacity ring: once the buffer is full,
/// each push overwrites the oldest entry. [`ReplayBufferBase::batch`] draws
/// `min(size, len)` distinct indices uniformly at random, so one batch never
/// contains the same stored transition twice, while separate calls may
/// repeat transitions.
pub struct SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    capacity: usize,

    /// Current insertion index.
    i: usize,

    /// Current number of stored transitions.
    size: usize,

    obs: O,
    act: A,
    next_obs: O,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
    is_truncated: Vec<i8>,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl<O, A> SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    #[inline]
    fn push_scalar_f32(dst: &mut [f32], i: usize, capacity: usize, b: &[f32]) {
        let mut j = i;
        for r in b.iter() {
            dst[j] = *r;
            j += 1;
            if j == capacity {
                j = 0;
            }
        }
    }

    #[inline]
    fn push_scalar_i8(dst: &mut [i8], i: usize, capacity: usize, b: &[i8]) {
        let mut j = i;
        for d in b.iter() {
            dst[j] = *d;
            j += 1;
            if j == capacity {
                j = 0;
            }
        }
    }

    fn sample_reward(&self, ixs: &[usize]) -> Vec<f32> {
        ixs.iter().map(|ix| self.reward[*ix]).collect()
    }

    fn sample_is_terminated(&self, ixs: &[usize]) -> Vec<i8> {
        ixs.iter().map(|ix| self.is_terminated[*ix]).collect()
    }

    fn sample_is_truncated(&self, ixs: &[usize]) -> Vec<i8> {
        ixs.iter().map(|ix| self.is_truncated[*ix]).collect()
    }

    /// Returns the sum of all rewards in the buffer.
    pub fn sum_rewards(&self) -> f32 {
        self.reward.iter().sum()
    }
}

impl<O, A> ExperienceBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Item = GenericTransitionBatch<O, A>;

    fn len(&self) -> usize {
        self.size
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        let len = tr.len();
        let (obs, act, next_obs, reward, is_terminated, is_truncated) = tr.unpack();
        self.obs.push(self.i, obs);
        self.act.push(self.i, act);
        self.next_obs.push(self.i, next_obs);
        Self::push_scalar_f32(&mut self.reward, self.i, self.capacity, &reward);
        Self::push_scalar_i8(&mut self.is_terminated, self.i, self.capacity, &is_terminated);
        Self::push_scalar_i8(&mut self.is_truncated, self.i, self.capacity, &is_truncated);

        self.i = (self.i + len) % self.capacity;
        self.size += len;
        if self.size >= self.capacity {
            self.size = self.capacity;
        }

        Ok(())
    }
}

impl<O, A> ReplayBufferBase for SimpleReplayBuffer<O, A>
where
    O: BatchBase,
    A: BatchBase,
{
    type Config = SimpleReplayBufferConfig;
    type Batch = GenericTransitionBatch<O, A>;

    fn build(config: &Self::Config) -> Self {
        let capacity = config.capacity;

        Self {
            capacity,
            i: 0,
            size: 0,
            obs: O::new(capacity),
            act: A::new(capacity),
            next_obs: O::new(capacity),
            reward: vec![0.; capacity],
            is_terminated: vec![0; capacity],
            is_truncated: vec![0; capacity],
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        // Distinct indices within one batch, like drawing a combination.
        let amount = size.min(self.size);
        let ixs = index::sample(&mut self.rng, self.size, amount).into_vec();

        Ok(Self::Batch {
            obs: self.obs.sample(&ixs),
            act: self.act.sample(&ixs),
            next_obs: self.next_obs.sample(&ixs),
            reward: self.sample_reward(&ixs),
            is_terminated: self.sample_is_terminated(&ixs),
            is_truncated: self.sample_is_truncated(&ixs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One f32 per transition, stored in a plain vector.
    #[derive(Clone, Debug)]
    struct VecBatch(Vec<f32>);

    impl BatchBase for VecBatch {
        fn new(capacity: usize) -> Self {
            Self(vec![0.; capacity])
        }

        fn push(&mut self, ix: usize, data: Self) {
            let capacity = self.0.len();
            let mut j = ix;
            for v in data.0.iter() {
                self.0[j] = *v;
                j += 1;
                if j == capacity {
                    j = 0;
                }
            }
        }

        fn sample(&self, ixs: &Vec<usize>) -> Self {
            Self(ixs.iter().map(|ix| self.0[*ix]).collect())
        }
    }

    fn transition(tag: f32) -> GenericTransitionBatch<VecBatch, VecBatch> {
        GenericTransitionBatch {
            obs: VecBatch(vec![tag]),
            act: VecBatch(vec![tag]),
            next_obs: VecBatch(vec![tag]),
            reward: vec![tag],
            is_terminated: vec![0],
            is_truncated: vec![0],
        }
    }

    fn build(capacity: usize) -> SimpleReplayBuffer<VecBatch, VecBatch> {
        let config = SimpleReplayBufferConfig::default().capacity(capacity);
        SimpleReplayBuffer::build(&config)
    }

    #[test]
    fn bounded_fifo_eviction() {
        let capacity = 8;
        let extra = 3;
        let mut buffer = build(capacity);

        for tag in 0..(capacity + extra) {
            buffer.push(transition(tag as f32)).unwrap();
            assert!(buffer.len() <= capacity);
        }
        assert_eq!(buffer.len(), capacity);

        // Only the most recent `capacity` tags survive.
        let expected: f32 = (extra..capacity + extra).map(|t| t as f32).sum();
        assert_eq!(buffer.sum_rewards(), expected);
    }

    #[test]
    fn batch_has_distinct_indices_and_bounded_size() {
        let mut buffer = build(16);
        for tag in 0..5 {
            buffer.push(transition(tag as f32)).unwrap();
        }

        // Requesting more than stored yields all stored transitions.
        let batch = buffer.batch(64).unwrap();
        assert_eq!(batch.len(), 5);
        let mut tags = batch.reward.clone();
        tags.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(tags, vec![0., 1., 2., 3., 4.]);

        // A smaller batch holds no duplicates.
        let batch = buffer.batch(3).unwrap();
        let mut tags = batch.reward.clone();
        tags.sort_by(|a, b| a.partial_cmp(b).unwrap());
        tags.dedup();
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn obs_and_reward_stay_aligned_after_wraparound() {
        let mut buffer = build(4);
        for tag in 0..11 {
            buffer.push(transition(tag as f32)).unwrap();
        }
        let batch = buffer.batch(4).unwrap();
        for (o, r) in batch.obs.0.iter().zip(batch.reward.iter()) {
            assert_eq!(o, r);
        }
    }
}
