//! Entity to view-model conversions for the admin screens
//!
//! List conversions load lookup data once per call rather than once per row.
//! Single conversions resolve only what their one row references.

use async_trait::async_trait;
use futures::try_join;
use serde::Serialize;

use crate::application::dto::{ProductItemModel, ProductModel, SubscriptionProductModel};
use crate::domain::association::Association;
use crate::domain::entities::{Product, ProductItem, SubscriptionProduct};
use crate::domain::repositories::{CatalogRepository, StoreResult};

// ============================================================================
// Products
// ============================================================================

/// Every model carries the full link text and product type lists
pub async fn convert_products(
    products: &[Product],
    catalog: &dyn CatalogRepository,
) -> StoreResult<Vec<ProductModel>> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let (link_texts, product_types) =
        try_join!(catalog.find_all_link_texts(), catalog.find_all_product_types())?;

    Ok(products
        .iter()
        .cloned()
        .map(|product| ProductModel::new(product, link_texts.clone(), product_types.clone()))
        .collect())
}

pub async fn convert_product(product: &Product, catalog: &dyn CatalogRepository) -> StoreResult<ProductModel> {
    let (link_text, product_type) = try_join!(
        catalog.find_link_text(product.product_link_text_id),
        catalog.find_product_type(product.product_type_id)
    )?;

    Ok(ProductModel::new(
        product.clone(),
        link_text.into_iter().collect(),
        product_type.into_iter().collect(),
    ))
}

// ============================================================================
// Product items
// ============================================================================

pub async fn convert_product_items(
    rows: &[ProductItem],
    catalog: &dyn CatalogRepository,
) -> StoreResult<Vec<ProductItemModel>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let (product_titles, item_titles) = try_join!(catalog.product_titles(), catalog.item_titles())?;

    Ok(rows
        .iter()
        .map(|row| ProductItemModel {
            product_id: row.product_id,
            item_id: row.item_id,
            product_title: product_titles.get(&row.product_id).cloned(),
            item_title: item_titles.get(&row.item_id).cloned(),
            items: None,
            products: None,
        })
        .collect())
}

/// With `add_list_data` the model also carries every item and product for
/// the edit form drop-downs
pub async fn convert_product_item(
    row: &ProductItem,
    catalog: &dyn CatalogRepository,
    add_list_data: bool,
) -> StoreResult<ProductItemModel> {
    let (product, item) = try_join!(catalog.find_product(row.product_id), catalog.find_item(row.item_id))?;

    let (items, products) = if add_list_data {
        let (items, products) = try_join!(catalog.find_all_items(), catalog.find_all_products())?;
        (Some(items), Some(products))
    } else {
        (None, None)
    };

    Ok(ProductItemModel {
        product_id: row.product_id,
        item_id: row.item_id,
        product_title: product.map(|p| p.title),
        item_title: item.map(|i| i.title),
        items,
        products,
    })
}

// ============================================================================
// Subscription products
// ============================================================================

pub async fn convert_subscription_products(
    rows: &[SubscriptionProduct],
    catalog: &dyn CatalogRepository,
) -> StoreResult<Vec<SubscriptionProductModel>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let (product_titles, subscription_titles) =
        try_join!(catalog.product_titles(), catalog.subscription_titles())?;

    Ok(rows
        .iter()
        .map(|row| SubscriptionProductModel {
            product_id: row.product_id,
            subscription_id: row.subscription_id,
            product_title: product_titles.get(&row.product_id).cloned(),
            subscription_title: subscription_titles.get(&row.subscription_id).cloned(),
            subscriptions: None,
            products: None,
        })
        .collect())
}

pub async fn convert_subscription_product(
    row: &SubscriptionProduct,
    catalog: &dyn CatalogRepository,
    add_list_data: bool,
) -> StoreResult<SubscriptionProductModel> {
    let (product, subscription) = try_join!(
        catalog.find_product(row.product_id),
        catalog.find_subscription(row.subscription_id)
    )?;

    let (subscriptions, products) = if add_list_data {
        let (subscriptions, products) =
            try_join!(catalog.find_all_subscriptions(), catalog.find_all_products())?;
        (Some(subscriptions), Some(products))
    } else {
        (None, None)
    };

    Ok(SubscriptionProductModel {
        product_id: row.product_id,
        subscription_id: row.subscription_id,
        product_title: product.map(|p| p.title),
        subscription_title: subscription.map(|s| s.title),
        subscriptions,
        products,
    })
}

// ============================================================================
// Generic access for the association use cases
// ============================================================================

/// An association with an admin view model
#[async_trait]
pub trait AssociationView: Association {
    type Model: Serialize + Send + Sync + 'static;

    async fn convert_all(rows: &[Self], catalog: &dyn CatalogRepository) -> StoreResult<Vec<Self::Model>>;

    async fn convert_one(&self, catalog: &dyn CatalogRepository, add_list_data: bool) -> StoreResult<Self::Model>;
}

#[async_trait]
impl AssociationView for ProductItem {
    type Model = ProductItemModel;

    async fn convert_all(rows: &[Self], catalog: &dyn CatalogRepository) -> StoreResult<Vec<ProductItemModel>> {
        convert_product_items(rows, catalog).await
    }

    async fn convert_one(&self, catalog: &dyn CatalogRepository, add_list_data: bool) -> StoreResult<ProductItemModel> {
        convert_product_item(self, catalog, add_list_data).await
    }
}

#[async_trait]
impl AssociationView for SubscriptionProduct {
    type Model = SubscriptionProductModel;

    async fn convert_all(
        rows: &[Self],
        catalog: &dyn CatalogRepository,
    ) -> StoreResult<Vec<SubscriptionProductModel>> {
        convert_subscription_products(rows, catalog).await
    }

    async fn convert_one(
        &self,
        catalog: &dyn CatalogRepository,
        add_list_data: bool,
    ) -> StoreResult<SubscriptionProductModel> {
        convert_subscription_product(self, catalog, add_list_data).await
    }
}
