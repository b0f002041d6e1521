//! Tensor-backed observation and action sets for the replay buffer.
use candle_core::Tensor;
use repricer_candle_agent::TensorBatch;
use repricer_core::generic_replay_buffer::BatchBase;
use repricer_market_env::{MarketAct, MarketObs};

/// A set of observations stored as rows of a tensor.
pub struct ObsBatch(TensorBatch);

impl BatchBase for ObsBatch {
    fn new(capacity: usize) -> Self {
        Self(TensorBatch::new(capacity))
    }

    fn push(&mut self, i: usize, data: Self) {
        self.0.push(i, data.0)
    }

    fn sample(&self, ixs: &Vec<usize>) -> Self {
        Self(self.0.sample(ixs))
    }
}

impl From<MarketObs> for ObsBatch {
    fn from(obs: MarketObs) -> Self {
        let tensor = obs.into();
        Self(TensorBatch::from_tensor(tensor))
    }
}

impl From<ObsBatch> for Tensor {
    fn from(b: ObsBatch) -> Self {
        b.0.into()
    }
}

/// A set of action indices stored as rows of an `i64` tensor.
pub struct ActBatch(TensorBatch);

impl BatchBase for ActBatch {
    fn new(capacity: usize) -> Self {
        Self(TensorBatch::new(capacity))
    }

    fn push(&mut self, i: usize, data: Self) {
        self.0.push(i, data.0)
    }

    fn sample(&self, ixs: &Vec<usize>) -> Self {
        Self(self.0.sample(ixs))
    }
}

impl From<MarketAct> for ActBatch {
    fn from(act: MarketAct) -> Self {
        let tensor = act.into();
        Self(TensorBatch::from_tensor(tensor))
    }
}

impl From<ActBatch> for Tensor {
    fn from(b: ActBatch) -> Self {
        b.0.into()
    }
}
