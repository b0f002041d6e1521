//! Discrete price-adjustment actions.
use repricer_core::Act;

/// A price-adjustment action: an index into the discretized adjustment
/// range. Indices outside `[0, action_space_size)` are clamped by the
/// environment, not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketAct(pub i64);

impl Act for MarketAct {
    fn len(&self) -> usize {
        1
    }
}

impl From<i64> for MarketAct {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

impl From<MarketAct> for i64 {
    fn from(a: MarketAct) -> Self {
        a.0
    }
}
