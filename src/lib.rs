//! Vimal Jewellers Backend
//!
//! Storefront and back-office API for a jewellery retailer.
//!
//! ## Features
//! - Product catalog with category filtering and a mega menu
//! - Live price breakup from metal rates, making charges and tax
//! - Wishlist, orders and customer profile
//! - Home page, CMS pages, settings and footer content
//! - Inquiries and store appointments

pub mod api;
pub mod config;
pub mod domain;
pub mod store;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Page not found")]
    PageNotFound,

    #[error("Shop For item not found")]
    ShopForNotFound,

    #[error("Metal rate not found")]
    MetalRateNotFound,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Product already in wishlist")]
    AlreadyInWishlist,

    #[error("A product with this slug already exists")]
    DuplicateSlug,

    #[error("Referenced category, collection or metal rate does not exist")]
    UnknownReference,

    #[error("Order has no items")]
    EmptyOrder,

    #[error("Product {0} is not available")]
    ProductUnavailable(i64),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, ShopError>;
