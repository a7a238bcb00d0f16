//! Error types for the catalog store and the admin workflows

use thiserror::Error;

use crate::domain::association::KeyPair;

/// Failures raised by a repository
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Association {pair} already exists")]
    Duplicate { pair: KeyPair },

    #[error("Association {pair} references a missing entity")]
    MissingReference { pair: KeyPair },
}

impl StoreError {
    /// Classify an insert failure for `pair`
    #[must_use]
    pub fn from_insert(error: sqlx::Error, pair: KeyPair) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Duplicate { pair },
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                Self::MissingReference { pair }
            }
            _ => Self::Database(error),
        }
    }
}

/// The store failed while a change request was being checked or applied.
/// Precondition failures are not errors; see `RewriteOutcome`.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("Eligibility check {current} -> {desired} failed: {source}")]
    Check {
        current: KeyPair,
        desired: KeyPair,
        #[source]
        source: StoreError,
    },

    #[error("Swap {current} -> {desired} failed and was rolled back: {source}")]
    Swap {
        current: KeyPair,
        desired: KeyPair,
        #[source]
        source: StoreError,
    },
}

/// Errors surfaced by the admin use cases
#[derive(Error, Debug)]
pub enum AdminError {
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("Association {0} already exists")]
    Duplicate(KeyPair),

    #[error("Association {0} references a missing entity")]
    MissingReference(KeyPair),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

impl From<StoreError> for AdminError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate { pair } => Self::Duplicate(pair),
            StoreError::MissingReference { pair } => Self::MissingReference(pair),
            other => Self::Store(other),
        }
    }
}
