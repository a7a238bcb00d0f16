//! Domain entities
//!
//! Catalog entities and the two join rows that link products to items and
//! subscriptions. Every entity is keyed by its own strongly typed id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use ts_rs::TS;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize, sqlx::Type, TS,
        )]
        #[sqlx(transparent)]
        #[ts(export)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw database id
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Product identifier
    ProductId
);
entity_id!(
    /// Content item identifier
    ItemId
);
entity_id!(
    /// Subscription identifier
    SubscriptionId
);
entity_id!(ProductLinkTextId);
entity_id!(ProductTypeId);

/// A sellable product shown in the memberships catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub product_link_text_id: ProductLinkTextId,
    pub product_type_id: ProductTypeId,
}

/// Call-to-action text displayed on a product link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct ProductLinkText {
    pub id: ProductLinkTextId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct ProductType {
    pub id: ProductTypeId,
    pub title: String,
}

/// A piece of content (article, video, download) that products bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    pub is_free: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, TS)]
#[ts(export)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub title: String,
    pub description: String,
    pub registration_code: String,
}

/// Join row: product bundles item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductItem {
    pub product_id: ProductId,
    pub item_id: ItemId,
}

impl ProductItem {
    #[must_use]
    pub const fn new(product_id: ProductId, item_id: ItemId) -> Self {
        Self { product_id, item_id }
    }
}

/// Join row: subscription grants access to product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SubscriptionProduct {
    pub product_id: ProductId,
    pub subscription_id: SubscriptionId,
}

impl SubscriptionProduct {
    #[must_use]
    pub const fn new(product_id: ProductId, subscription_id: SubscriptionId) -> Self {
        Self { product_id, subscription_id }
    }
}
