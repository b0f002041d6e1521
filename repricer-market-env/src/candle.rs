//! Conversions between environment types and candle tensors.
use crate::{MarketAct, MarketObs};
use candle_core::{Device, Tensor};

impl From<MarketObs> for Tensor {
    /// A `[1, n_features]` tensor on the CPU.
    fn from(obs: MarketObs) -> Tensor {
        let n = obs.0.len();
        Tensor::from_vec(obs.0, (1, n), &Device::Cpu)
            .expect("Failed to convert MarketObs to Tensor")
    }
}

impl From<Tensor> for MarketAct {
    /// `t` must be a 1-dimensional `i64` tensor holding one action index.
    fn from(t: Tensor) -> Self {
        let data = t
            .to_vec1::<i64>()
            .expect("Failed to convert Tensor to MarketAct");
        Self(data[0])
    }
}

impl From<MarketAct> for Tensor {
    /// A `[1, 1]` index tensor, as expected by `gather` on action values.
    fn from(a: MarketAct) -> Tensor {
        Tensor::from_vec(vec![a.0], (1, 1), &Device::Cpu)
            .expect("Failed to convert MarketAct to Tensor")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obs_round_trip_keeps_features() {
        let obs = MarketObs(vec![0.5, -1.0, 2.0]);
        let t: Tensor = obs.into();
        assert_eq!(t.dims(), &[1, 3]);
        assert_eq!(t.to_vec2::<f32>().unwrap()[0], vec![0.5, -1.0, 2.0]);
    }

    #[test]
    fn act_round_trip() {
        let t = Tensor::from_vec(vec![7i64], (1,), &Device::Cpu).unwrap();
        let a = MarketAct::from(t);
        assert_eq!(a, MarketAct(7));
        let t: Tensor = a.into();
        assert_eq!(t.to_vec2::<i64>().unwrap(), vec![vec![7]]);
    }
}
