//! Test utilities for the memberships admin crate
//!
//! Provides common testing infrastructure so tests stay isolated and use the
//! same database setup.

use anyhow::Result;
use std::sync::Arc;

use crate::domain::entities::{
    Item, ItemId, Product, ProductId, ProductItem, ProductLinkText, ProductLinkTextId,
    ProductType, ProductTypeId, Subscription, SubscriptionId, SubscriptionProduct,
};
use crate::domain::repositories::{AssociationRepository, CatalogRepository};
use crate::infrastructure::{DatabaseConnection, SqliteAssociationRepository, SqliteCatalogRepository};

/// Test database configuration
pub struct TestDatabase {
    pub connection: DatabaseConnection,
}

impl TestDatabase {
    /// Create a new migrated in-memory test database.
    ///
    /// Each test gets a fresh, clean database state.
    pub async fn new() -> Result<Self> {
        let db = DatabaseConnection::new("sqlite::memory:").await?;
        db.migrate().await?;
        Ok(Self { connection: db })
    }

    /// Get the database pool for use in repositories
    pub fn pool(&self) -> sqlx::Pool<sqlx::Sqlite> {
        self.connection.pool().clone()
    }
}

/// Test context with every repository wired to one database
pub struct TestContext {
    pub database: TestDatabase,
    pub catalog: Arc<dyn CatalogRepository>,
    pub product_items: Arc<dyn AssociationRepository<ProductItem>>,
    pub subscription_products: Arc<dyn AssociationRepository<SubscriptionProduct>>,
}

impl TestContext {
    /// Empty catalog
    pub async fn new() -> Result<Self> {
        let database = TestDatabase::new().await?;
        let pool = database.pool();

        Ok(Self {
            catalog: Arc::new(SqliteCatalogRepository::new(pool.clone())),
            product_items: Arc::new(SqliteAssociationRepository::<ProductItem>::new(pool.clone())),
            subscription_products: Arc::new(SqliteAssociationRepository::<SubscriptionProduct>::new(pool)),
            database,
        })
    }

    /// Catalog with two products, three items and two subscriptions, and
    /// no links between them
    pub async fn seeded() -> Result<Self> {
        let ctx = Self::new().await?;

        for (id, title) in [(1, "Buy now"), (2, "Learn more")] {
            ctx.catalog
                .save_link_text(&ProductLinkText { id: ProductLinkTextId(id), title: title.to_string() })
                .await?;
        }
        for (id, title) in [(1, "Course"), (2, "Bundle")] {
            ctx.catalog
                .save_product_type(&ProductType { id: ProductTypeId(id), title: title.to_string() })
                .await?;
        }

        for (id, title) in [(1, "Beginner Course"), (2, "Advanced Bundle")] {
            ctx.catalog
                .save_product(&Product {
                    id: ProductId(id),
                    title: title.to_string(),
                    description: format!("{title} description"),
                    image_url: format!("/images/products/{id}.png"),
                    product_link_text_id: ProductLinkTextId(id),
                    product_type_id: ProductTypeId(id),
                })
                .await?;
        }

        for (id, title, is_free) in [(1, "Welcome Video", true), (2, "Workbook", false), (3, "Live Q&A", false)] {
            ctx.catalog
                .save_item(&Item {
                    id: ItemId(id),
                    title: title.to_string(),
                    description: String::new(),
                    url: format!("/items/{id}"),
                    image_url: String::new(),
                    is_free,
                })
                .await?;
        }

        for (id, title, code) in [(1, "Monthly", "MONTH"), (2, "Annual", "YEAR")] {
            ctx.catalog
                .save_subscription(&Subscription {
                    id: SubscriptionId(id),
                    title: title.to_string(),
                    description: String::new(),
                    registration_code: code.to_string(),
                })
                .await?;
        }

        Ok(ctx)
    }
}

/// Helper macros for common test patterns
#[macro_export]
macro_rules! test_context {
    () => {{
        $crate::test_utils::TestContext::seeded().await.expect("Failed to create test context")
    }};
}

#[macro_export]
macro_rules! test_db {
    () => {{
        $crate::test_utils::TestDatabase::new().await.expect("Failed to create test database")
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_creation() {
        let db = test_db!();
        assert!(!db.pool().is_closed());
    }

    #[tokio::test]
    async fn test_seeded_context_matches_fixture_data() {
        let ctx = test_context!();

        let products = ctx.catalog.product_titles().await.unwrap();
        assert_eq!(products.get(&ProductId(1)).map(String::as_str), Some("Beginner Course"));
        assert_eq!(products.get(&ProductId(2)).map(String::as_str), Some("Advanced Bundle"));

        let items = ctx.catalog.item_titles().await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items.get(&ItemId(1)).map(String::as_str), Some("Welcome Video"));
        assert_eq!(items.get(&ItemId(2)).map(String::as_str), Some("Workbook"));
        assert_eq!(items.get(&ItemId(3)).map(String::as_str), Some("Live Q&A"));

        let subscriptions = ctx.catalog.subscription_titles().await.unwrap();
        assert_eq!(subscriptions.len(), 2);
        assert_eq!(subscriptions.get(&SubscriptionId(2)).map(String::as_str), Some("Annual"));

        assert_eq!(ctx.catalog.find_all_link_texts().await.unwrap().len(), 2);
        assert_eq!(ctx.catalog.find_all_product_types().await.unwrap().len(), 2);
        assert!(ctx.product_items.find_all().await.unwrap().is_empty());
        assert!(ctx.subscription_products.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multiple_databases_are_isolated() {
        let seeded = TestContext::seeded().await.unwrap();
        let empty = TestContext::new().await.unwrap();

        assert_eq!(seeded.catalog.find_all_products().await.unwrap().len(), 2);
        assert!(empty.catalog.find_all_products().await.unwrap().is_empty());
    }
}
