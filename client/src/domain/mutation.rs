//! Lifecycle of one optimistic cache mutation.
//!
//! A mutation captures the previous cache value on entry, is reconciled once
//! the remote call returns, and ends either committed (snapshot dropped) or
//! rolled back (snapshot handed back for restoration):
//!
//! ```text
//! PendingOptimistic -> Reconciling -> Committed
//!                                  -> RolledBack
//! ```

use std::fmt;

use thiserror::Error;

use super::ports::QueryKey;

/// Phase of an [`OptimisticMutation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    /// The optimistic value is in the cache; the remote call is pending.
    PendingOptimistic,
    /// The remote call returned; the outcome is being applied.
    Reconciling,
    /// The remote accepted the change.
    Committed,
    /// The remote rejected the change and the snapshot was restored.
    RolledBack,
}

impl fmt::Display for MutationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PendingOptimistic => "pending_optimistic",
            Self::Reconciling => "reconciling",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(label)
    }
}

/// Raised when a mutation is driven through an illegal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("mutation cannot move from {from} to {to}")]
pub struct MutationPhaseError {
    /// Phase the mutation was in.
    pub from: MutationPhase,
    /// Phase that was requested.
    pub to: MutationPhase,
}

/// Result of a mutation request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The optimistic value was confirmed by the remote.
    Committed,
    /// The target was not cached, so nothing was written or sent.
    Skipped,
}

/// One in-flight optimistic mutation and the snapshot needed to undo it.
///
/// # Examples
/// ```
/// use todo_client::domain::{MutationPhase, OptimisticMutation};
/// use todo_client::domain::ports::QueryKey;
///
/// let mut mutation = OptimisticMutation::begin(QueryKey::todo_list(), vec![1, 2]);
/// mutation.start_reconciling().expect("pending mutations reconcile");
/// let restored = mutation.roll_back().expect("reconciling mutations roll back");
/// assert_eq!(restored, vec![1, 2]);
/// assert_eq!(mutation.phase(), MutationPhase::RolledBack);
/// ```
#[derive(Debug)]
pub struct OptimisticMutation<V> {
    key: QueryKey,
    phase: MutationPhase,
    snapshot: Option<V>,
}

impl<V> OptimisticMutation<V> {
    /// Start a mutation whose optimistic value has just replaced `snapshot`.
    #[must_use]
    pub fn begin(key: QueryKey, snapshot: V) -> Self {
        Self {
            key,
            phase: MutationPhase::PendingOptimistic,
            snapshot: Some(snapshot),
        }
    }

    /// Cache key the mutation targets.
    #[must_use]
    pub const fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> MutationPhase {
        self.phase
    }

    /// Value the cache held before the optimistic write.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&V> {
        self.snapshot.as_ref()
    }

    fn transition(
        &mut self,
        expected: MutationPhase,
        next: MutationPhase,
    ) -> Result<(), MutationPhaseError> {
        if self.phase != expected {
            return Err(MutationPhaseError {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Record that the remote call has returned.
    pub fn start_reconciling(&mut self) -> Result<(), MutationPhaseError> {
        self.transition(MutationPhase::PendingOptimistic, MutationPhase::Reconciling)
    }

    /// Accept the optimistic value and drop the snapshot.
    pub fn commit(&mut self) -> Result<(), MutationPhaseError> {
        self.transition(MutationPhase::Reconciling, MutationPhase::Committed)?;
        self.snapshot = None;
        Ok(())
    }

    /// Reject the optimistic value, returning the snapshot to restore.
    pub fn roll_back(&mut self) -> Result<V, MutationPhaseError> {
        let illegal = MutationPhaseError {
            from: self.phase,
            to: MutationPhase::RolledBack,
        };
        let snapshot = self.snapshot.take().ok_or(illegal)?;
        if let Err(err) = self.transition(MutationPhase::Reconciling, MutationPhase::RolledBack) {
            self.snapshot = Some(snapshot);
            return Err(err);
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    //! Legal and illegal phase transitions.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn mutation() -> OptimisticMutation<Vec<u8>> {
        OptimisticMutation::begin(QueryKey::todo_list(), vec![1])
    }

    #[rstest]
    fn commit_drops_the_snapshot(mut mutation: OptimisticMutation<Vec<u8>>) {
        mutation.start_reconciling().expect("reconcile");
        mutation.commit().expect("commit");
        assert_eq!(mutation.phase(), MutationPhase::Committed);
        assert!(mutation.snapshot().is_none());
    }

    #[rstest]
    fn commit_requires_reconciling(mut mutation: OptimisticMutation<Vec<u8>>) {
        let err = mutation.commit().expect_err("pending mutations cannot commit");
        assert_eq!(
            err,
            MutationPhaseError {
                from: MutationPhase::PendingOptimistic,
                to: MutationPhase::Committed,
            }
        );
        assert_eq!(mutation.snapshot(), Some(&vec![1]));
    }

    #[rstest]
    fn premature_roll_back_keeps_the_snapshot(mut mutation: OptimisticMutation<Vec<u8>>) {
        mutation.roll_back().expect_err("pending mutations cannot roll back");
        assert_eq!(mutation.phase(), MutationPhase::PendingOptimistic);
        assert_eq!(mutation.snapshot(), Some(&vec![1]));
    }

    #[rstest]
    fn committed_mutations_cannot_roll_back(mut mutation: OptimisticMutation<Vec<u8>>) {
        mutation.start_reconciling().expect("reconcile");
        mutation.commit().expect("commit");
        let err = mutation.roll_back().expect_err("already committed");
        assert_eq!(err.from, MutationPhase::Committed);
    }

    #[rstest]
    fn reconciling_twice_is_rejected(mut mutation: OptimisticMutation<Vec<u8>>) {
        mutation.start_reconciling().expect("reconcile");
        let err = mutation.start_reconciling().expect_err("second reconcile");
        assert_eq!(err.to_string(), "mutation cannot move from reconciling to reconciling");
    }
}
