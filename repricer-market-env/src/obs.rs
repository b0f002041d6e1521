//! Observations and their feature schema.
use crate::stats::{profile, CategoryTable};
use repricer_core::Obs;

/// The frozen, ordered feature-name list of an environment instance.
///
/// The schema is derived once at environment construction and never changes
/// afterwards, so every observation the instance produces is a vector of the
/// same length with features at the same positions.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Builds the schema from the category table.
    ///
    /// Layout: item features (`normalized_price`, `condition_score`, one
    /// one-hot flag per category in table order), market features
    /// (`market_volatility`, `avg_days_to_sell`, `price_std`), time features
    /// (`day_of_week`, `month`, `is_weekend`) and the normalized step
    /// counter (`step`).
    pub fn new(table: &CategoryTable) -> Self {
        let mut names = vec!["normalized_price".to_string(), "condition_score".to_string()];
        for id in table.ids() {
            let slug = match profile(id) {
                Some(p) => format!("is_{}", p.slug),
                None => format!("is_cat_{}", id),
            };
            names.push(slug);
        }
        names.extend(
            [
                "market_volatility",
                "avg_days_to_sell",
                "price_std",
                "day_of_week",
                "month",
                "is_weekend",
                "step",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        Self { names }
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Feature names in vector order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// An observation of [`MarketEnv`](crate::MarketEnv): the feature vector of
/// the current listing and market circumstances, laid out according to the
/// environment's [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct MarketObs(pub Vec<f32>);

impl MarketObs {
    /// Number of features in the observation.
    pub fn dim(&self) -> usize {
        self.0.len()
    }
}

impl Obs for MarketObs {
    fn dummy(_n: usize) -> Self {
        Self(Vec::new())
    }

    fn len(&self) -> usize {
        1
    }
}

impl From<MarketObs> for Vec<f32> {
    fn from(obs: MarketObs) -> Self {
        obs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_covers_categories_once() {
        let table = CategoryTable::default_table();
        let schema = FeatureSchema::new(&table);
        // 2 item features + one flag per category + 3 market + 3 time + step
        assert_eq!(schema.len(), 2 + table.len() + 3 + 3 + 1);
        assert_eq!(schema.names()[0], "normalized_price");
        assert_eq!(schema.names()[schema.len() - 1], "step");
        assert!(schema.names().iter().any(|n| n == "is_laptop"));
    }
}
