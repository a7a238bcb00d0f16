//! Association rewriter
//!
//! Replaces one join row with another as a single atomic swap, and only when
//! the current row exists exactly once and the desired row does not exist.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::association::{
    Association, ChangeRequest, Eligibility, RewriteOutcome, RewriteState,
};
use crate::domain::errors::RewriteError;
use crate::domain::repositories::AssociationRepository;
use crate::domain::services::pair_locks::PairLocks;

pub struct AssociationRewriter<A: Association> {
    repository: Arc<dyn AssociationRepository<A>>,
    locks: Option<PairLocks>,
}

impl<A: Association> Clone for AssociationRewriter<A> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            locks: self.locks.clone(),
        }
    }
}

impl<A: Association> AssociationRewriter<A> {
    /// Rewriter with its own pair locks
    pub fn new(repository: Arc<dyn AssociationRepository<A>>) -> Self {
        Self::with_locks(repository, PairLocks::new())
    }

    /// Rewriter sharing `locks` with other rewriters of the same process
    pub fn with_locks(repository: Arc<dyn AssociationRepository<A>>, locks: PairLocks) -> Self {
        Self { repository, locks: Some(locks) }
    }

    /// Rewriter relying on the store's conditional swap alone
    pub fn unserialized(repository: Arc<dyn AssociationRepository<A>>) -> Self {
        Self { repository, locks: None }
    }

    /// Classify a change request against the current store state
    #[instrument(skip_all, fields(kind = %A::KIND, current = %request.current.key_pair(), desired = %request.desired.key_pair()))]
    pub async fn eligibility(&self, request: &ChangeRequest<A>) -> Result<Eligibility, RewriteError> {
        let check_failed = |source| RewriteError::Check {
            current: request.current.key_pair(),
            desired: request.desired.key_pair(),
            source,
        };

        let current_rows = self.repository.count(&request.current).await.map_err(check_failed)?;
        let desired_rows = self.repository.count(&request.desired).await.map_err(check_failed)?;

        let eligibility = Eligibility::from_counts(current_rows, desired_rows);
        debug!(current_rows, desired_rows, state = ?RewriteState::checked(eligibility), "Checked change request");
        Ok(eligibility)
    }

    /// True only when exactly one current row and no desired row exist.
    /// Has no side effects.
    pub async fn can_rewrite(&self, request: &ChangeRequest<A>) -> Result<bool, RewriteError> {
        Ok(self.eligibility(request).await?.is_eligible())
    }

    /// Swap the current row for the desired one.
    ///
    /// Returns `NotApplied` without touching the store when the preconditions
    /// no longer hold. A store failure rolls back and is returned as
    /// `RewriteError::Swap`.
    #[instrument(skip_all, fields(kind = %A::KIND, current = %request.current.key_pair(), desired = %request.desired.key_pair()))]
    pub async fn rewrite(&self, request: &ChangeRequest<A>) -> Result<RewriteOutcome, RewriteError> {
        let current = request.current.key_pair();
        let desired = request.desired.key_pair();

        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(&[current, desired]).await),
            None => None,
        };

        let result = self
            .repository
            .swap(&request.current, &request.desired)
            .await
            .map_err(|source| RewriteError::Swap { current, desired, source });

        match (&result, RewriteState::finished(&result)) {
            (Ok(RewriteOutcome::Applied), _) => info!("Rewrote association"),
            (Ok(RewriteOutcome::NotApplied(reason)), state) => {
                info!(%reason, ?state, "Association rewrite not applied");
            }
            (Err(error), state) => warn!(%error, ?state, "Association rewrite abandoned"),
        }

        result
    }
}
