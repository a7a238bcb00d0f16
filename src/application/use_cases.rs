//! Application use cases for the memberships admin area
//!
//! Each use case set wraps the repositories and returns view models ready to
//! serialize for the admin front end.

use std::sync::Arc;
use tracing::info;

use crate::application::conversions::{convert_product, convert_products, AssociationView};
use crate::application::dto::ProductModel;
use crate::domain::association::{ChangeRequest, RewriteOutcome};
use crate::domain::entities::{ProductId, ProductItem, SubscriptionProduct};
use crate::domain::errors::AdminError;
use crate::domain::repositories::{AssociationRepository, CatalogRepository};
use crate::domain::services::{AssociationRewriter, PairLocks};

// ============================================================================
// Products
// ============================================================================

pub struct ProductUseCases {
    catalog: Arc<dyn CatalogRepository>,
}

impl ProductUseCases {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn list(&self) -> Result<Vec<ProductModel>, AdminError> {
        let products = self.catalog.find_all_products().await?;
        Ok(convert_products(&products, self.catalog.as_ref()).await?)
    }

    pub async fn details(&self, id: ProductId) -> Result<ProductModel, AdminError> {
        let product = self
            .catalog
            .find_product(id)
            .await?
            .ok_or_else(|| AdminError::NotFound {
                entity: "Product",
                key: id.to_string(),
            })?;

        Ok(convert_product(&product, self.catalog.as_ref()).await?)
    }
}

// ============================================================================
// Associations
// ============================================================================

/// List, create, edit and delete for one join table
pub struct AssociationUseCases<A: AssociationView> {
    catalog: Arc<dyn CatalogRepository>,
    repository: Arc<dyn AssociationRepository<A>>,
    rewriter: AssociationRewriter<A>,
}

pub type ProductItemUseCases = AssociationUseCases<ProductItem>;
pub type SubscriptionProductUseCases = AssociationUseCases<SubscriptionProduct>;

impl<A: AssociationView> AssociationUseCases<A> {
    /// With `locks` set, edits are serialized per key pair inside this process
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        repository: Arc<dyn AssociationRepository<A>>,
        locks: Option<PairLocks>,
    ) -> Self {
        let rewriter = match locks {
            Some(locks) => AssociationRewriter::with_locks(Arc::clone(&repository), locks),
            None => AssociationRewriter::unserialized(Arc::clone(&repository)),
        };

        Self { catalog, repository, rewriter }
    }

    pub async fn list(&self) -> Result<Vec<A::Model>, AdminError> {
        let rows = self.repository.find_all().await?;
        Ok(A::convert_all(&rows, self.catalog.as_ref()).await?)
    }

    /// `None` when the pair is not linked
    pub async fn details(&self, row: &A, add_list_data: bool) -> Result<Option<A::Model>, AdminError> {
        match self.repository.find(row).await? {
            Some(found) => Ok(Some(found.convert_one(self.catalog.as_ref(), add_list_data).await?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, row: &A) -> Result<A::Model, AdminError> {
        self.repository.insert(row).await?;
        info!(pair = %row.key_pair(), "Created association");
        Ok(row.convert_one(self.catalog.as_ref(), false).await?)
    }

    pub async fn can_edit(&self, request: &ChangeRequest<A>) -> Result<bool, AdminError> {
        Ok(self.rewriter.can_rewrite(request).await?)
    }

    pub async fn edit(&self, request: &ChangeRequest<A>) -> Result<RewriteOutcome, AdminError> {
        Ok(self.rewriter.rewrite(request).await?)
    }

    /// Returns whether a row was removed
    pub async fn delete(&self, row: &A) -> Result<bool, AdminError> {
        let removed = self.repository.remove(row).await?;
        if removed {
            info!(pair = %row.key_pair(), "Deleted association");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::association::Eligibility;
    use crate::domain::entities::{ItemId, SubscriptionId};
    use crate::test_utils::TestContext;

    fn product_item_use_cases(ctx: &TestContext) -> ProductItemUseCases {
        AssociationUseCases::new(ctx.catalog.clone(), ctx.product_items.clone(), Some(PairLocks::new()))
    }

    #[tokio::test]
    async fn test_product_details() {
        let ctx = TestContext::seeded().await.unwrap();
        let products = ProductUseCases::new(ctx.catalog.clone());

        let model = products.details(ProductId(1)).await.unwrap();
        assert_eq!(model.title, "Beginner Course");

        let missing = products.details(ProductId(404)).await;
        assert!(matches!(missing, Err(AdminError::NotFound { entity: "Product", .. })));

        assert_eq!(products.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_list_and_delete() {
        let ctx = TestContext::seeded().await.unwrap();
        let use_cases = product_item_use_cases(&ctx);
        let row = ProductItem::new(ProductId(1), ItemId(3));

        let created = use_cases.create(&row).await.unwrap();
        assert_eq!(created.item_title.as_deref(), Some("Live Q&A"));

        let duplicate = use_cases.create(&row).await;
        assert!(matches!(duplicate, Err(AdminError::Duplicate(_))));

        let listed = use_cases.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product_title.as_deref(), Some("Beginner Course"));

        assert!(use_cases.delete(&row).await.unwrap());
        assert!(!use_cases.delete(&row).await.unwrap());
        assert!(use_cases.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_unknown_entity_is_missing_reference() {
        let ctx = TestContext::seeded().await.unwrap();
        let use_cases = product_item_use_cases(&ctx);

        let result = use_cases.create(&ProductItem::new(ProductId(404), ItemId(1))).await;
        assert!(matches!(result, Err(AdminError::MissingReference(_))));
    }

    #[tokio::test]
    async fn test_details_for_unlinked_pair_is_none() {
        let ctx = TestContext::seeded().await.unwrap();
        let use_cases = product_item_use_cases(&ctx);
        let row = ProductItem::new(ProductId(2), ItemId(2));

        assert!(use_cases.details(&row, true).await.unwrap().is_none());

        use_cases.create(&row).await.unwrap();
        let model = use_cases.details(&row, true).await.unwrap().expect("linked pair");
        assert!(model.items.is_some());
        assert!(model.products.is_some());
    }

    #[tokio::test]
    async fn test_edit_delegates_to_rewriter() {
        let ctx = TestContext::seeded().await.unwrap();
        let use_cases: SubscriptionProductUseCases =
            AssociationUseCases::new(ctx.catalog.clone(), ctx.subscription_products.clone(), None);

        let current = SubscriptionProduct::new(ProductId(1), SubscriptionId(1));
        let desired = SubscriptionProduct::new(ProductId(1), SubscriptionId(2));
        let request = ChangeRequest::new(current, desired);

        assert!(!use_cases.can_edit(&request).await.unwrap());
        assert_eq!(
            use_cases.edit(&request).await.unwrap(),
            RewriteOutcome::NotApplied(Eligibility::CurrentMissing)
        );

        use_cases.create(&current).await.unwrap();
        assert!(use_cases.can_edit(&request).await.unwrap());
        assert_eq!(use_cases.edit(&request).await.unwrap(), RewriteOutcome::Applied);

        let listed = use_cases.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].subscription_title.as_deref(), Some("Annual"));
    }
}
