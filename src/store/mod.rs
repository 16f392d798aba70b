//! Persistence port.
//!
//! Handlers talk to a `dyn Store`; `MySqlStore` backs the running service and
//! `MemoryStore` backs the handler tests.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::aggregates::{NewOrder, Order, OrderStatus, Product, ProductInput, ProductListing, ProfileUpdate, User};
use crate::domain::catalog::{Banner, Category, Collection, MegaCategory, MetalRate, ShopForDetail};
use crate::domain::content::{
    Appointment, EnquiryStatus, FooterConfig, HomeContent, Inquiry, NewAppointment, NewInquiry, Page, Settings,
};
use crate::domain::filter::PriceFilter;
use crate::Result;

pub mod mysql;
#[cfg(test)]
pub mod memory;

pub use mysql::MySqlStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Active products in listing order.
    async fn list_products(&self) -> Result<Vec<ProductListing>>;
    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductListing>>;
    async fn find_product(&self, id: i64) -> Result<Option<Product>>;
    /// Products that still exist among `ids`, active or not.
    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>>;
    async fn create_product(&self, input: ProductInput) -> Result<Product>;
    async fn update_product(&self, id: i64, input: ProductInput) -> Result<Option<Product>>;
    /// Soft delete; false when nothing was deleted.
    async fn delete_product(&self, id: i64) -> Result<bool>;

    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;
    /// Active products of a category within the price constraints.
    async fn category_products(&self, category_id: i64, price: &PriceFilter) -> Result<Vec<ProductListing>>;
    async fn find_banner_by_url(&self, url: &str) -> Result<Option<Banner>>;
    async fn list_collections(&self) -> Result<Vec<Collection>>;

    async fn metal_rates(&self) -> Result<Vec<MetalRate>>;
    async fn update_metal_rate(&self, id: i64, rate: Decimal) -> Result<Option<MetalRate>>;

    async fn mega_menu(&self) -> Result<Vec<MegaCategory>>;
    async fn find_shop_for(&self, id: i64) -> Result<Option<ShopForDetail>>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    async fn wishlist_product_ids(&self, user_id: i64) -> Result<Vec<i64>>;
    async fn wishlist_contains(&self, user_id: i64, product_id: i64) -> Result<bool>;
    /// Fails with `AlreadyInWishlist` on a duplicate pair.
    async fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> Result<WishlistEntry>;
    async fn remove_from_wishlist(&self, user_id: i64, product_id: i64) -> Result<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create_order(&self, order: NewOrder) -> Result<Order>;
    /// Newest first.
    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>>;
    async fn find_order(&self, id: i64) -> Result<Option<Order>>;
    /// Moves the order from `from` to `to` only if it is still in `from`;
    /// otherwise fails with `InvalidTransition`.
    async fn set_order_status(&self, id: i64, from: OrderStatus, to: OrderStatus) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<User>>;
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<Option<User>>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn home(&self) -> Result<HomeContent>;
    async fn find_page(&self, slug: &str) -> Result<Option<Page>>;
    async fn settings(&self) -> Result<Option<Settings>>;
    /// Active configs, highest priority first.
    async fn footer_configs(&self) -> Result<Vec<FooterConfig>>;

    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry>;
    async fn list_inquiries(&self) -> Result<Vec<Inquiry>>;
    async fn set_inquiry_status(&self, id: i64, status: EnquiryStatus) -> Result<bool>;

    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment>;
    async fn list_appointments(&self) -> Result<Vec<Appointment>>;
    async fn set_appointment_status(&self, id: i64, status: EnquiryStatus) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

pub trait Store: CatalogStore + WishlistStore + OrderStore + UserStore + ContentStore + Send + Sync {}

impl<T> Store for T where T: CatalogStore + WishlistStore + OrderStore + UserStore + ContentStore + Send + Sync {}

#[derive(Clone, Debug, PartialEq, serde::Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
