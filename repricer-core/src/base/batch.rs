//! Batch of transitions.

/// A batch of transitions `(o_t, a_t, o_t+1, r_t, is_terminated, is_truncated)`.
pub trait TransitionBatch {
    /// A set of observations in the batch.
    type ObsBatch;

    /// A set of actions in the batch.
    type ActBatch;

    /// Unpacks the batch into its individual components:
    /// `(obs, act, next_obs, reward, is_terminated, is_truncated)`.
    fn unpack(
        self,
    ) -> (
        Self::ObsBatch,
        Self::ActBatch,
        Self::ObsBatch,
        Vec<f32>,
        Vec<i8>,
        Vec<i8>,
    );

    /// Returns the number of transitions in the batch.
    fn len(&self) -> usize;

    /// Returns a reference to the observations.
    fn obs(&self) -> &Self::ObsBatch;

    /// Returns a reference to the actions.
    fn act(&self) -> &Self::ActBatch;
}
