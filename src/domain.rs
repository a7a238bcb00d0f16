//! Domain module - Core business logic and entities
//!
//! This module contains the catalog entities, the association model,
//! repository interfaces, and the association rewriter.

pub mod association;
pub mod entities;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used items for convenience
pub use association::{
    Association, AssociationKind, ChangeRequest, Eligibility, EntityKey, KeyPair, RewriteOutcome,
    RewriteState,
};
pub use entities::{
    Item, ItemId, Product, ProductId, ProductItem, ProductLinkText, ProductLinkTextId, ProductType,
    ProductTypeId, Subscription, SubscriptionId, SubscriptionProduct,
};
pub use errors::{AdminError, RewriteError, StoreError};
pub use repositories::{AssociationRepository, CatalogRepository, StoreResult};
pub use services::{AssociationRewriter, PairLocks};
