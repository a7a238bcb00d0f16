//! Data Transfer Objects for the memberships admin area
//!
//! View models sent to the admin front end and the request payloads it sends
//! back. View models are exported to TypeScript through `ts-rs`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::association::{ChangeRequest, RewriteOutcome};
use crate::domain::entities::{
    Item, ItemId, Product, ProductId, ProductItem, ProductLinkText, ProductLinkTextId,
    ProductType, ProductTypeId, Subscription, SubscriptionId, SubscriptionProduct,
};

// ============================================================================
// Product view models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ProductModel {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub product_link_text_id: ProductLinkTextId,
    pub product_type_id: ProductTypeId,
    /// Drop-down data; a single model only carries its own selection
    pub product_link_texts: Vec<ProductLinkText>,
    pub product_types: Vec<ProductType>,
}

impl ProductModel {
    pub(crate) fn new(
        product: Product,
        product_link_texts: Vec<ProductLinkText>,
        product_types: Vec<ProductType>,
    ) -> Self {
        Self {
            id: product.id,
            title: product.title,
            description: product.description,
            image_url: product.image_url,
            product_link_text_id: product.product_link_text_id,
            product_type_id: product.product_type_id,
            product_link_texts,
            product_types,
        }
    }
}

// ============================================================================
// Association view models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ProductItemModel {
    pub product_id: ProductId,
    pub item_id: ItemId,
    pub product_title: Option<String>,
    pub item_title: Option<String>,
    pub items: Option<Vec<Item>>,
    pub products: Option<Vec<Product>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct SubscriptionProductModel {
    pub product_id: ProductId,
    pub subscription_id: SubscriptionId,
    pub product_title: Option<String>,
    pub subscription_title: Option<String>,
    pub subscriptions: Option<Vec<Subscription>>,
    pub products: Option<Vec<Product>>,
}

// ============================================================================
// Change requests
// ============================================================================

/// Edit form payload for a product/item link
#[derive(Debug, Clone, Copy, Deserialize, TS)]
#[ts(export)]
pub struct ChangeProductItemDto {
    pub old_product_id: ProductId,
    pub old_item_id: ItemId,
    pub product_id: ProductId,
    pub item_id: ItemId,
}

impl From<ChangeProductItemDto> for ChangeRequest<ProductItem> {
    fn from(dto: ChangeProductItemDto) -> Self {
        ChangeRequest::new(
            ProductItem::new(dto.old_product_id, dto.old_item_id),
            ProductItem::new(dto.product_id, dto.item_id),
        )
    }
}

/// Edit form payload for a subscription/product link
#[derive(Debug, Clone, Copy, Deserialize, TS)]
#[ts(export)]
pub struct ChangeSubscriptionProductDto {
    pub old_product_id: ProductId,
    pub old_subscription_id: SubscriptionId,
    pub product_id: ProductId,
    pub subscription_id: SubscriptionId,
}

impl From<ChangeSubscriptionProductDto> for ChangeRequest<SubscriptionProduct> {
    fn from(dto: ChangeSubscriptionProductDto) -> Self {
        ChangeRequest::new(
            SubscriptionProduct::new(dto.old_product_id, dto.old_subscription_id),
            SubscriptionProduct::new(dto.product_id, dto.subscription_id),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct RewriteOutcomeDto {
    pub applied: bool,
    /// Why the change was skipped, when it was
    pub reason: Option<String>,
}

impl From<RewriteOutcome> for RewriteOutcomeDto {
    fn from(outcome: RewriteOutcome) -> Self {
        match outcome {
            RewriteOutcome::Applied => Self { applied: true, reason: None },
            RewriteOutcome::NotApplied(eligibility) => Self {
                applied: false,
                reason: Some(eligibility.describe().to_string()),
            },
        }
    }
}
