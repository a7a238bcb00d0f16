//! Repository implementations for the memberships catalog
//!
//! Contains the SQLite implementations of the catalog and association
//! repository traits.

use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::{debug, warn};

use crate::domain::{
    association::{Association, EntityKey, Eligibility, RewriteOutcome},
    entities::{
        Item, ItemId, Product, ProductId, ProductLinkText, ProductLinkTextId, ProductType,
        ProductTypeId, Subscription, SubscriptionId,
    },
    errors::StoreError,
    repositories::{AssociationRepository, CatalogRepository, StoreResult},
};

// ============================================================================
// CatalogRepository Implementation
// ============================================================================

#[derive(Clone)]
pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn titles<K>(&self, table: &str) -> StoreResult<HashMap<K, String>>
    where
        K: From<i64> + Eq + std::hash::Hash + Send,
    {
        let rows: Vec<(i64, String)> = sqlx::query_as(&format!("SELECT id, title FROM {table}"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id, title)| (K::from(id), title)).collect())
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn save_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, title, description, image_url, product_link_text_id, product_type_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                image_url = excluded.image_url,
                product_link_text_id = excluded.product_link_text_id,
                product_type_id = excluded.product_type_id
            "#,
        )
        .bind(product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.product_link_text_id)
        .bind(product.product_type_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, title, description, image_url, product_link_text_id, product_type_id FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_all_products(&self) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, title, description, image_url, product_link_text_id, product_type_id FROM products ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn product_titles(&self) -> StoreResult<HashMap<ProductId, String>> {
        self.titles("products").await
    }

    async fn save_link_text(&self, text: &ProductLinkText) -> StoreResult<()> {
        sqlx::query("INSERT INTO product_link_texts (id, title) VALUES ($1, $2) ON CONFLICT(id) DO UPDATE SET title = excluded.title")
            .bind(text.id)
            .bind(&text.title)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_link_text(&self, id: ProductLinkTextId) -> StoreResult<Option<ProductLinkText>> {
        let text = sqlx::query_as::<_, ProductLinkText>("SELECT id, title FROM product_link_texts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(text)
    }

    async fn find_all_link_texts(&self) -> StoreResult<Vec<ProductLinkText>> {
        let texts = sqlx::query_as::<_, ProductLinkText>("SELECT id, title FROM product_link_texts ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(texts)
    }

    async fn save_product_type(&self, product_type: &ProductType) -> StoreResult<()> {
        sqlx::query("INSERT INTO product_types (id, title) VALUES ($1, $2) ON CONFLICT(id) DO UPDATE SET title = excluded.title")
            .bind(product_type.id)
            .bind(&product_type.title)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_product_type(&self, id: ProductTypeId) -> StoreResult<Option<ProductType>> {
        let product_type = sqlx::query_as::<_, ProductType>("SELECT id, title FROM product_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product_type)
    }

    async fn find_all_product_types(&self) -> StoreResult<Vec<ProductType>> {
        let types = sqlx::query_as::<_, ProductType>("SELECT id, title FROM product_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(types)
    }

    async fn save_item(&self, item: &Item) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, title, description, url, image_url, is_free)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                url = excluded.url,
                image_url = excluded.image_url,
                is_free = excluded.is_free
            "#,
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.url)
        .bind(&item.image_url)
        .bind(item.is_free)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_item(&self, id: ItemId) -> StoreResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT id, title, description, url, image_url, is_free FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn find_all_items(&self) -> StoreResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT id, title, description, url, image_url, is_free FROM items ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn item_titles(&self) -> StoreResult<HashMap<ItemId, String>> {
        self.titles("items").await
    }

    async fn save_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, title, description, registration_code)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                registration_code = excluded.registration_code
            "#,
        )
        .bind(subscription.id)
        .bind(&subscription.title)
        .bind(&subscription.description)
        .bind(&subscription.registration_code)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_subscription(&self, id: SubscriptionId) -> StoreResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "SELECT id, title, description, registration_code FROM subscriptions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn find_all_subscriptions(&self) -> StoreResult<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            "SELECT id, title, description, registration_code FROM subscriptions ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }

    async fn subscription_titles(&self) -> StoreResult<HashMap<SubscriptionId, String>> {
        self.titles("subscriptions").await
    }
}

// ============================================================================
// AssociationRepository Implementation
// ============================================================================

/// SQL for one join table, rendered once from the association kind
#[derive(Debug, Clone)]
struct AssociationStatements {
    count: String,
    select_one: String,
    select_all: String,
    insert: String,
    delete: String,
}

impl AssociationStatements {
    fn for_kind<A: Association>() -> Self {
        let table = A::KIND.table();
        let left = A::KIND.left_column();
        let right = A::KIND.right_column();

        Self {
            count: format!("SELECT COUNT(*) FROM {table} WHERE {left} = $1 AND {right} = $2"),
            select_one: format!("SELECT {left}, {right} FROM {table} WHERE {left} = $1 AND {right} = $2"),
            select_all: format!("SELECT {left}, {right} FROM {table} ORDER BY {left}, {right}"),
            insert: format!("INSERT INTO {table} ({left}, {right}) VALUES ($1, $2)"),
            delete: format!("DELETE FROM {table} WHERE {left} = $1 AND {right} = $2"),
        }
    }
}

pub struct SqliteAssociationRepository<A> {
    pool: SqlitePool,
    statements: AssociationStatements,
    _kind: PhantomData<fn() -> A>,
}

impl<A: Association> SqliteAssociationRepository<A> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            statements: AssociationStatements::for_kind::<A>(),
            _kind: PhantomData,
        }
    }

    fn row_to_association((left, right): (i64, i64)) -> A {
        A::from_keys(A::Left::from_raw(left), A::Right::from_raw(right))
    }

    async fn count_in(&self, tx: &mut Transaction<'_, Sqlite>, row: &A) -> Result<u64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(&self.statements.count)
            .bind(row.left().raw())
            .bind(row.right().raw())
            .fetch_one(&mut **tx)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Body of the swap unit of work; the caller owns commit and rollback
    async fn swap_in(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        current: &A,
        desired: &A,
    ) -> StoreResult<RewriteOutcome> {
        // Conditional delete: the row count is the existence check and takes
        // the write lock before anything is read
        let removed = sqlx::query(&self.statements.delete)
            .bind(current.left().raw())
            .bind(current.right().raw())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        match removed {
            0 => return Ok(RewriteOutcome::NotApplied(Eligibility::CurrentMissing)),
            1 => {}
            n => return Ok(RewriteOutcome::NotApplied(Eligibility::CurrentDuplicated(n))),
        }

        if current.key_pair() == desired.key_pair() || self.count_in(tx, desired).await? > 0 {
            return Ok(RewriteOutcome::NotApplied(Eligibility::DesiredExists));
        }

        match sqlx::query(&self.statements.insert)
            .bind(desired.left().raw())
            .bind(desired.right().raw())
            .execute(&mut **tx)
            .await
        {
            Ok(_) => Ok(RewriteOutcome::Applied),
            Err(error) => match StoreError::from_insert(error, desired.key_pair()) {
                StoreError::Duplicate { .. } => Ok(RewriteOutcome::NotApplied(Eligibility::DesiredExists)),
                other => Err(other),
            },
        }
    }
}

#[async_trait]
impl<A: Association> AssociationRepository<A> for SqliteAssociationRepository<A> {
    async fn count(&self, row: &A) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(&self.statements.count)
            .bind(row.left().raw())
            .bind(row.right().raw())
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find(&self, row: &A) -> StoreResult<Option<A>> {
        let found: Option<(i64, i64)> = sqlx::query_as(&self.statements.select_one)
            .bind(row.left().raw())
            .bind(row.right().raw())
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.map(Self::row_to_association))
    }

    async fn find_all(&self) -> StoreResult<Vec<A>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(&self.statements.select_all)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Self::row_to_association).collect())
    }

    async fn insert(&self, row: &A) -> StoreResult<()> {
        sqlx::query(&self.statements.insert)
            .bind(row.left().raw())
            .bind(row.right().raw())
            .execute(&self.pool)
            .await
            .map_err(|error| StoreError::from_insert(error, row.key_pair()))?;
        Ok(())
    }

    async fn remove(&self, row: &A) -> StoreResult<bool> {
        let removed = sqlx::query(&self.statements.delete)
            .bind(row.left().raw())
            .bind(row.right().raw())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn swap(&self, current: &A, desired: &A) -> StoreResult<RewriteOutcome> {
        let mut tx = self.pool.begin().await?;

        match self.swap_in(&mut tx, current, desired).await {
            Ok(RewriteOutcome::Applied) => {
                tx.commit().await?;
                debug!(current = %current.key_pair(), desired = %desired.key_pair(), "Swap committed");
                Ok(RewriteOutcome::Applied)
            }
            Ok(not_applied) => {
                tx.rollback().await?;
                Ok(not_applied)
            }
            Err(error) => {
                if let Err(rollback_error) = tx.rollback().await {
                    warn!(%rollback_error, "Rollback after failed swap also failed");
                }
                Err(error)
            }
        }
    }
}
