//! Domain services
//!
//! Contains business logic that doesn't naturally fit within entities.

pub mod association_rewriter;
pub mod pair_locks;

pub use association_rewriter::AssociationRewriter;
pub use pair_locks::{PairGuard, PairLocks};
