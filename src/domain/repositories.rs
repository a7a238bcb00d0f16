//! Repository interfaces for the memberships catalog
//!
//! Contains trait definitions for data access. The association repository is
//! the narrow store interface the rewriter consumes.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::association::{Association, RewriteOutcome};
use crate::domain::entities::{
    Item, ItemId, Product, ProductId, ProductLinkText, ProductLinkTextId, ProductType,
    ProductTypeId, Subscription, SubscriptionId,
};
use crate::domain::errors::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // Products
    async fn save_product(&self, product: &Product) -> StoreResult<()>;
    async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn find_all_products(&self) -> StoreResult<Vec<Product>>;
    async fn product_titles(&self) -> StoreResult<HashMap<ProductId, String>>;

    // Product lookups
    async fn save_link_text(&self, text: &ProductLinkText) -> StoreResult<()>;
    async fn find_link_text(&self, id: ProductLinkTextId) -> StoreResult<Option<ProductLinkText>>;
    async fn find_all_link_texts(&self) -> StoreResult<Vec<ProductLinkText>>;
    async fn save_product_type(&self, product_type: &ProductType) -> StoreResult<()>;
    async fn find_product_type(&self, id: ProductTypeId) -> StoreResult<Option<ProductType>>;
    async fn find_all_product_types(&self) -> StoreResult<Vec<ProductType>>;

    // Items
    async fn save_item(&self, item: &Item) -> StoreResult<()>;
    async fn find_item(&self, id: ItemId) -> StoreResult<Option<Item>>;
    async fn find_all_items(&self) -> StoreResult<Vec<Item>>;
    async fn item_titles(&self) -> StoreResult<HashMap<ItemId, String>>;

    // Subscriptions
    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<()>;
    async fn find_subscription(&self, id: SubscriptionId) -> StoreResult<Option<Subscription>>;
    async fn find_all_subscriptions(&self) -> StoreResult<Vec<Subscription>>;
    async fn subscription_titles(&self) -> StoreResult<HashMap<SubscriptionId, String>>;
}

/// Join-table access for one association kind
#[async_trait]
pub trait AssociationRepository<A: Association>: Send + Sync {
    /// Rows matching the key pair of `row`
    async fn count(&self, row: &A) -> StoreResult<u64>;
    async fn find(&self, row: &A) -> StoreResult<Option<A>>;
    async fn find_all(&self) -> StoreResult<Vec<A>>;

    /// Fails with `StoreError::Duplicate` when the pair already exists
    async fn insert(&self, row: &A) -> StoreResult<()>;
    /// Returns whether a row was removed
    async fn remove(&self, row: &A) -> StoreResult<bool>;

    /// Remove `current` and insert `desired` in one unit of work.
    ///
    /// Preconditions are re-validated inside the unit of work. When they do
    /// not hold nothing is written and `NotApplied` is returned. Any store
    /// failure rolls the whole unit back.
    async fn swap(&self, current: &A, desired: &A) -> StoreResult<RewriteOutcome>;
}
