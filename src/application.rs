//! Application layer module
//!
//! View models, the conversions that build them, and the admin use cases
//! that orchestrate the domain logic.

pub mod conversions;
pub mod dto;
pub mod use_cases;

pub use conversions::AssociationView;
pub use dto::{
    ChangeProductItemDto, ChangeSubscriptionProductDto, ProductItemModel, ProductModel,
    RewriteOutcomeDto, SubscriptionProductModel,
};
pub use use_cases::{
    AssociationUseCases, ProductItemUseCases, ProductUseCases, SubscriptionProductUseCases,
};
