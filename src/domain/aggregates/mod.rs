//! Aggregates module
pub mod product;
pub mod order;
pub mod user;

pub use product::{Product, ProductDetail, ProductInput, ProductListing};
pub use order::{Address, LineItem, NewOrder, Order, OrderStatus};
pub use user::{ProfileUpdate, User};
