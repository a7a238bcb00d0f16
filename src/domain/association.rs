//! Many-to-many association model
//!
//! An association is a join row identified by an ordered key pair. Both join
//! relations of the catalog (product/item and product/subscription) implement
//! [`Association`], so the rewrite logic is written once for both kinds.

use serde::Serialize;
use std::fmt;
use std::hash::Hash;

use crate::domain::entities::{
    ItemId, ProductId, ProductItem, SubscriptionId, SubscriptionProduct,
};

/// The join relations known to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    ProductItem,
    SubscriptionProduct,
}

impl AssociationKind {
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::ProductItem => "product_items",
            Self::SubscriptionProduct => "subscription_products",
        }
    }

    #[must_use]
    pub const fn left_column(self) -> &'static str {
        match self {
            Self::ProductItem | Self::SubscriptionProduct => "product_id",
        }
    }

    #[must_use]
    pub const fn right_column(self) -> &'static str {
        match self {
            Self::ProductItem => "item_id",
            Self::SubscriptionProduct => "subscription_id",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProductItem => "product_item",
            Self::SubscriptionProduct => "subscription_product",
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Entity id usable as one side of a join key
pub trait EntityKey: Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {
    fn raw(self) -> i64;
    fn from_raw(raw: i64) -> Self;
}

macro_rules! entity_key {
    ($($id:ty),* $(,)?) => {
        $(
            impl EntityKey for $id {
                fn raw(self) -> i64 {
                    self.get()
                }

                fn from_raw(raw: i64) -> Self {
                    Self::from(raw)
                }
            }
        )*
    };
}

entity_key!(ProductId, ItemId, SubscriptionId);

/// Kind-tagged raw key pair, used for locking, logging and error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct KeyPair {
    pub kind: AssociationKind,
    pub left: i64,
    pub right: i64,
}

impl fmt::Display for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.kind, self.left, self.right)
    }
}

/// A join row of one association kind
pub trait Association: Clone + fmt::Debug + Send + Sync + Unpin + 'static {
    type Left: EntityKey;
    type Right: EntityKey;

    const KIND: AssociationKind;

    fn from_keys(left: Self::Left, right: Self::Right) -> Self;
    fn left(&self) -> Self::Left;
    fn right(&self) -> Self::Right;

    fn key_pair(&self) -> KeyPair {
        KeyPair {
            kind: Self::KIND,
            left: self.left().raw(),
            right: self.right().raw(),
        }
    }
}

impl Association for ProductItem {
    type Left = ProductId;
    type Right = ItemId;

    const KIND: AssociationKind = AssociationKind::ProductItem;

    fn from_keys(left: ProductId, right: ItemId) -> Self {
        Self::new(left, right)
    }

    fn left(&self) -> ProductId {
        self.product_id
    }

    fn right(&self) -> ItemId {
        self.item_id
    }
}

impl Association for SubscriptionProduct {
    type Left = ProductId;
    type Right = SubscriptionId;

    const KIND: AssociationKind = AssociationKind::SubscriptionProduct;

    fn from_keys(left: ProductId, right: SubscriptionId) -> Self {
        Self::new(left, right)
    }

    fn left(&self) -> ProductId {
        self.product_id
    }

    fn right(&self) -> SubscriptionId {
        self.subscription_id
    }
}

/// Replace the `current` join row with the `desired` one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest<A> {
    pub current: A,
    pub desired: A,
}

impl<A: Association> ChangeRequest<A> {
    #[must_use]
    pub const fn new(current: A, desired: A) -> Self {
        Self { current, desired }
    }

    /// Both sides name the same pair
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.current.key_pair() == self.desired.key_pair()
    }
}

/// Why a change request may or may not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "rows", rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    CurrentMissing,
    CurrentDuplicated(u64),
    DesiredExists,
}

impl Eligibility {
    /// Exactly one current row and no desired row
    #[must_use]
    pub const fn from_counts(current_rows: u64, desired_rows: u64) -> Self {
        match (current_rows, desired_rows) {
            (0, _) => Self::CurrentMissing,
            (_, d) if d > 0 => Self::DesiredExists,
            (1, _) => Self::Eligible,
            (n, _) => Self::CurrentDuplicated(n),
        }
    }

    #[must_use]
    pub const fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }

    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Eligible => "eligible",
            Self::CurrentMissing => "current association does not exist",
            Self::CurrentDuplicated(_) => "current association is duplicated",
            Self::DesiredExists => "desired association already exists",
        }
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Result of a rewrite that reached the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum RewriteOutcome {
    Applied,
    NotApplied(Eligibility),
}

impl RewriteOutcome {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Lifecycle of a single change request
///
/// `Unchecked -> {Eligible, Ineligible}` through the precondition check,
/// `Eligible -> {Applied, Abandoned}` through the rewrite. A rewrite that
/// finds the preconditions broken at execution time lands in `Ineligible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteState {
    #[default]
    Unchecked,
    Eligible,
    Ineligible(Eligibility),
    Applied,
    Abandoned,
}

impl RewriteState {
    #[must_use]
    pub const fn checked(eligibility: Eligibility) -> Self {
        match eligibility {
            Eligibility::Eligible => Self::Eligible,
            other => Self::Ineligible(other),
        }
    }

    #[must_use]
    pub fn finished<E>(result: &Result<RewriteOutcome, E>) -> Self {
        match result {
            Ok(RewriteOutcome::Applied) => Self::Applied,
            Ok(RewriteOutcome::NotApplied(reason)) => Self::Ineligible(*reason),
            Err(_) => Self::Abandoned,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ineligible(_) | Self::Applied | Self::Abandoned)
    }
}
