//! Admin commands
//!
//! Every command takes the shared `AppState`, returns a serializable value
//! and reports failures as display strings for the caller.

use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

use crate::application::{
    AssociationUseCases, ChangeProductItemDto, ChangeSubscriptionProductDto, ProductItemModel,
    ProductItemUseCases, ProductModel, ProductUseCases, RewriteOutcomeDto,
    SubscriptionProductModel, SubscriptionProductUseCases,
};
use crate::domain::association::ChangeRequest;
use crate::domain::entities::{ProductItem, SubscriptionProduct};
use crate::domain::repositories::{AssociationRepository, CatalogRepository};
use crate::domain::services::PairLocks;
use crate::infrastructure::{AdminConfig, SqliteAssociationRepository, SqliteCatalogRepository};

pub const USAGE: &str = "\
usage: memberships-admin [--config <path>] <command> [args]

commands:
  products
  product-items
  subscription-products
  product-item-rewrite OLD_PRODUCT OLD_ITEM NEW_PRODUCT NEW_ITEM
  subscription-product-rewrite OLD_PRODUCT OLD_SUBSCRIPTION NEW_PRODUCT NEW_SUBSCRIPTION";

/// Use cases wired to one database pool
pub struct AppState {
    pub products: ProductUseCases,
    pub product_items: ProductItemUseCases,
    pub subscription_products: SubscriptionProductUseCases,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &AdminConfig) -> Self {
        let catalog: Arc<dyn CatalogRepository> = Arc::new(SqliteCatalogRepository::new(pool.clone()));
        let product_items: Arc<dyn AssociationRepository<ProductItem>> =
            Arc::new(SqliteAssociationRepository::new(pool.clone()));
        let subscription_products: Arc<dyn AssociationRepository<SubscriptionProduct>> =
            Arc::new(SqliteAssociationRepository::new(pool));

        // Both kinds share one lock table; their key pairs never collide
        let locks = config.serialize_rewrites.then(PairLocks::new);

        Self {
            products: ProductUseCases::new(Arc::clone(&catalog)),
            product_items: AssociationUseCases::new(Arc::clone(&catalog), product_items, locks.clone()),
            subscription_products: AssociationUseCases::new(catalog, subscription_products, locks),
        }
    }
}

pub async fn get_products(state: &AppState) -> Result<Vec<ProductModel>, String> {
    state.products.list().await.map_err(|e| {
        error!("Failed to list products: {}", e);
        format!("Failed to list products: {e}")
    })
}

pub async fn get_product_items(state: &AppState) -> Result<Vec<ProductItemModel>, String> {
    state.product_items.list().await.map_err(|e| {
        error!("Failed to list product items: {}", e);
        format!("Failed to list product items: {e}")
    })
}

pub async fn get_subscription_products(state: &AppState) -> Result<Vec<SubscriptionProductModel>, String> {
    state.subscription_products.list().await.map_err(|e| {
        error!("Failed to list subscription products: {}", e);
        format!("Failed to list subscription products: {e}")
    })
}

pub async fn rewrite_product_item(state: &AppState, dto: ChangeProductItemDto) -> Result<RewriteOutcomeDto, String> {
    let request = ChangeRequest::from(dto);
    let outcome = state.product_items.edit(&request).await.map_err(|e| {
        error!("Failed to rewrite product item: {}", e);
        format!("Failed to rewrite product item: {e}")
    })?;

    info!(applied = outcome.is_applied(), "Product item rewrite finished");
    Ok(outcome.into())
}

pub async fn rewrite_subscription_product(
    state: &AppState,
    dto: ChangeSubscriptionProductDto,
) -> Result<RewriteOutcomeDto, String> {
    let request = ChangeRequest::from(dto);
    let outcome = state.subscription_products.edit(&request).await.map_err(|e| {
        error!("Failed to rewrite subscription product: {}", e);
        format!("Failed to rewrite subscription product: {e}")
    })?;

    info!(applied = outcome.is_applied(), "Subscription product rewrite finished");
    Ok(outcome.into())
}

/// Run one command line against `state`
pub async fn dispatch(state: &AppState, args: &[String]) -> Result<Value, String> {
    let (command, rest) = args.split_first().ok_or_else(|| USAGE.to_string())?;

    match command.as_str() {
        "products" => to_json(get_products(state).await?),
        "product-items" => to_json(get_product_items(state).await?),
        "subscription-products" => to_json(get_subscription_products(state).await?),
        "product-item-rewrite" => {
            let [old_product_id, old_item_id, product_id, item_id] = four_args(command, rest)?;
            let dto = ChangeProductItemDto {
                old_product_id: parse_id(old_product_id)?,
                old_item_id: parse_id(old_item_id)?,
                product_id: parse_id(product_id)?,
                item_id: parse_id(item_id)?,
            };
            to_json(rewrite_product_item(state, dto).await?)
        }
        "subscription-product-rewrite" => {
            let [old_product_id, old_subscription_id, product_id, subscription_id] = four_args(command, rest)?;
            let dto = ChangeSubscriptionProductDto {
                old_product_id: parse_id(old_product_id)?,
                old_subscription_id: parse_id(old_subscription_id)?,
                product_id: parse_id(product_id)?,
                subscription_id: parse_id(subscription_id)?,
            };
            to_json(rewrite_subscription_product(state, dto).await?)
        }
        other => Err(format!("Unknown command: {other}\n\n{USAGE}")),
    }
}

fn four_args<'a>(command: &str, rest: &'a [String]) -> Result<[&'a str; 4], String> {
    match rest {
        [a, b, c, d] => Ok([a.as_str(), b.as_str(), c.as_str(), d.as_str()]),
        _ => Err(format!("{command} takes 4 ids, got {}\n\n{USAGE}", rest.len())),
    }
}

fn parse_id<T: FromStr>(raw: &str) -> Result<T, String> {
    raw.parse().map_err(|_| format!("Invalid id: {raw:?}"))
}

fn to_json<T: Serialize>(value: T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| format!("Failed to serialize result: {e}"))
}
