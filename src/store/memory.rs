//! In-memory store backing the handler tests.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{CatalogStore, ContentStore, OrderStore, UserStore, WishlistEntry, WishlistStore};
use crate::domain::aggregates::{NewOrder, Order, OrderStatus, Product, ProductInput, ProductListing, ProfileUpdate, User};
use crate::domain::catalog::{Banner, Category, Collection, MegaCategory, MetalRate, ShopForDetail};
use crate::domain::content::{
    Appointment, EnquiryStatus, FooterConfig, HomeContent, Inquiry, NewAppointment, NewInquiry, Page, Settings,
};
use crate::domain::filter::PriceFilter;
use crate::domain::value_objects::normalize_images;
use crate::{Result, ShopError};

#[derive(Default)]
pub struct Tables {
    pub products: Vec<ProductListing>,
    pub deleted_products: HashSet<i64>,
    pub categories: Vec<Category>,
    pub banners: Vec<Banner>,
    pub collections: Vec<Collection>,
    pub metal_rates: Vec<MetalRate>,
    pub mega_menu: Vec<MegaCategory>,
    pub wishlist: Vec<WishlistEntry>,
    pub orders: Vec<Order>,
    pub users: Vec<User>,
    pub home: HomeContent,
    pub pages: Vec<Page>,
    pub settings: Option<Settings>,
    pub footer_configs: Vec<FooterConfig>,
    pub inquiries: Vec<Inquiry>,
    pub appointments: Vec<Appointment>,
    pub fail_ping: bool,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        1000 + self.next_id
    }

    fn live_product(&self, id: i64) -> Option<&ProductListing> {
        self.products.iter().find(|l| l.product.id == id && !self.deleted_products.contains(&id))
    }

    /// Mirrors the products table's unique slug and foreign keys.
    fn check_product_write(&self, id: Option<i64>, input: &ProductInput) -> Result<()> {
        if let Some(slug) = input.slug.as_deref() {
            let taken = self.products.iter().any(|l| Some(l.product.id) != id && l.product.slug.as_deref() == Some(slug));
            if taken {
                return Err(ShopError::DuplicateSlug);
            }
        }
        let known_category = input.category_id.map_or(true, |c| self.categories.iter().any(|x| x.id == c));
        let known_collection = input.collection_id.map_or(true, |c| self.collections.iter().any(|x| x.id == c));
        let known_rate = input.metal_rate_id.map_or(true, |r| self.metal_rates.iter().any(|x| x.id == r));
        if known_category && known_collection && known_rate { Ok(()) } else { Err(ShopError::UnknownReference) }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn seed(&self, f: impl FnOnce(&mut Tables)) { f(&mut self.tables()); }

    pub fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T { f(&self.tables()) }

    fn tables(&self) -> MutexGuard<'_, Tables> { self.tables.lock().unwrap_or_else(PoisonError::into_inner) }
}

fn apply_input(p: &mut Product, input: ProductInput) {
    macro_rules! assign {
        ($($field:ident),* $(,)?) => { $( if let Some(v) = input.$field { p.$field = v; } )* };
    }
    macro_rules! assign_opt {
        ($($field:ident),* $(,)?) => { $( if input.$field.is_some() { p.$field = input.$field; } )* };
    }
    if let Some(images) = &input.images {
        p.images = normalize_images(images, input.name.as_deref().unwrap_or(&p.name));
    }
    assign!(name, category_id, collection_id, trending_order, listing_order, active, sizes, product_details, size_chart,
        is_tax_included, is_new_arrival, product_summary, available_metals, available_diamonds, price_breakup);
    assign_opt!(slug, sub_heading, badge_tag, tag_line, metal_rate_id, mrp, price, discount, offer_text, shortcode,
        description, instructions, tax_rate, meesho_link, flipkart_link, myntra_link, amazon_link, making_charges,
        metal_weight, gross_weight, metal_details, diamond_details);
    p.updated_at = Utc::now();
}

fn blank_product(id: i64) -> Product {
    let now = Utc::now();
    Product {
        id, name: String::new(), slug: None, images: vec![], sub_heading: None, badge_tag: None, tag_line: None,
        category_id: 0, collection_id: 0, metal_rate_id: None, trending_order: 0, listing_order: 0,
        mrp: None, price: None, discount: Some(0.0), offer_text: None, shortcode: None, active: true,
        sizes: Value::Array(vec![]), description: None, product_details: Value::Null, instructions: None,
        size_chart: Value::Null, tax_rate: Some(crate::domain::aggregates::product::DEFAULT_TAX_RATE), is_tax_included: true,
        meesho_link: None, flipkart_link: None, myntra_link: None, amazon_link: None, is_new_arrival: false,
        units_sold: 0.0, making_charges: Some(0.0), product_summary: Value::Null, metal_weight: None, gross_weight: None,
        metal_details: None, diamond_details: None, available_metals: Value::Array(vec![]),
        available_diamonds: Value::Array(vec![]), price_breakup: Value::Array(vec![]), created_at: now, updated_at: now,
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> Result<Vec<ProductListing>> {
        let t = self.tables();
        let mut listings: Vec<_> = t.products.iter()
            .filter(|l| l.product.active && !t.deleted_products.contains(&l.product.id))
            .cloned()
            .collect();
        listings.sort_by_key(|l| (l.product.listing_order, l.product.id));
        Ok(listings)
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductListing>> {
        let t = self.tables();
        Ok(t.products.iter()
            .find(|l| l.product.slug.as_deref() == Some(slug) && l.product.active && !t.deleted_products.contains(&l.product.id))
            .cloned())
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.tables().live_product(id).map(|l| l.product.clone()))
    }

    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>> {
        let t = self.tables();
        Ok(ids.iter().filter_map(|id| t.live_product(*id)).map(|l| l.product.clone()).collect())
    }

    async fn create_product(&self, input: ProductInput) -> Result<Product> {
        let mut t = self.tables();
        t.check_product_write(None, &input)?;
        let mut product = blank_product(t.next_id());
        apply_input(&mut product, input);
        t.products.push(ProductListing::bare(product.clone()));
        Ok(product)
    }

    async fn update_product(&self, id: i64, input: ProductInput) -> Result<Option<Product>> {
        let mut t = self.tables();
        if t.deleted_products.contains(&id) {
            return Ok(None);
        }
        if !t.products.iter().any(|l| l.product.id == id) {
            return Ok(None);
        }
        t.check_product_write(Some(id), &input)?;
        let Some(listing) = t.products.iter_mut().find(|l| l.product.id == id) else { return Ok(None) };
        apply_input(&mut listing.product, input);
        Ok(Some(listing.product.clone()))
    }

    async fn delete_product(&self, id: i64) -> Result<bool> {
        let mut t = self.tables();
        if t.live_product(id).is_none() {
            return Ok(false);
        }
        Ok(t.deleted_products.insert(id))
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self.tables().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Ok(self.tables().categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn category_products(&self, category_id: i64, price: &PriceFilter) -> Result<Vec<ProductListing>> {
        let listings = self.list_products().await?;
        Ok(listings.into_iter()
            .filter(|l| l.product.category_id == category_id && price.matches(l.product.price))
            .collect())
    }

    async fn find_banner_by_url(&self, url: &str) -> Result<Option<Banner>> {
        Ok(self.tables().banners.iter().find(|b| b.active && b.url.as_deref() == Some(url)).cloned())
    }

    async fn list_collections(&self) -> Result<Vec<Collection>> {
        Ok(self.tables().collections.iter().filter(|c| c.active).cloned().collect())
    }

    async fn metal_rates(&self) -> Result<Vec<MetalRate>> { Ok(self.tables().metal_rates.clone()) }

    async fn update_metal_rate(&self, id: i64, rate: Decimal) -> Result<Option<MetalRate>> {
        let mut t = self.tables();
        Ok(t.metal_rates.iter_mut().find(|r| r.id == id).map(|r| {
            r.rate = rate;
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn mega_menu(&self) -> Result<Vec<MegaCategory>> { Ok(self.tables().mega_menu.clone()) }

    async fn find_shop_for(&self, id: i64) -> Result<Option<ShopForDetail>> {
        let t = self.tables();
        Ok(t.mega_menu.iter().find_map(|cat| {
            cat.shop_fors.iter().find(|s| s.id == id).map(|s| ShopForDetail {
                shop_for: s.clone(),
                shop_for_mega_category: Some(MegaCategory {
                    styles: vec![],
                    materials: vec![],
                    shop_fors: vec![],
                    occasions: vec![],
                    ..cat.clone()
                }),
            })
        }))
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn wishlist_product_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        Ok(self.tables().wishlist.iter().rev().filter(|w| w.user_id == user_id).map(|w| w.product_id).collect())
    }

    async fn wishlist_contains(&self, user_id: i64, product_id: i64) -> Result<bool> {
        Ok(self.tables().wishlist.iter().any(|w| w.user_id == user_id && w.product_id == product_id))
    }

    async fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> Result<WishlistEntry> {
        let mut t = self.tables();
        if t.wishlist.iter().any(|w| w.user_id == user_id && w.product_id == product_id) {
            return Err(ShopError::AlreadyInWishlist);
        }
        let entry = WishlistEntry { id: t.next_id(), user_id, product_id, created_at: Utc::now() };
        t.wishlist.push(entry.clone());
        Ok(entry)
    }

    async fn remove_from_wishlist(&self, user_id: i64, product_id: i64) -> Result<()> {
        self.tables().wishlist.retain(|w| !(w.user_id == user_id && w.product_id == product_id));
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order> {
        let mut t = self.tables();
        let now = Utc::now();
        let order = Order {
            id: t.next_id(), user_id: order.user_id, items: order.items, total: order.total, status: OrderStatus::Pending,
            address: order.address, payment_method: order.payment_method, payment_id: order.payment_id,
            created_at: now, updated_at: now,
        };
        t.orders.push(order.clone());
        Ok(order)
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>> {
        Ok(self.tables().orders.iter().rev().filter(|o| o.user_id == user_id).cloned().collect())
    }

    async fn find_order(&self, id: i64) -> Result<Option<Order>> {
        Ok(self.tables().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn set_order_status(&self, id: i64, from: OrderStatus, to: OrderStatus) -> Result<()> {
        let mut t = self.tables();
        match t.orders.iter_mut().find(|o| o.id == id && o.status == from) {
            Some(order) => {
                order.status = to;
                order.updated_at = Utc::now();
                Ok(())
            }
            None => Err(ShopError::InvalidTransition { from: from.to_string(), to: to.to_string() }),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<Option<User>> {
        Ok(self.tables().users.iter_mut().find(|u| u.id == id).map(|u| {
            u.apply(update);
            u.clone()
        }))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn home(&self) -> Result<HomeContent> { Ok(self.tables().home.clone()) }

    async fn find_page(&self, slug: &str) -> Result<Option<Page>> {
        Ok(self.tables().pages.iter().find(|p| p.slug == slug && p.active).cloned())
    }

    async fn settings(&self) -> Result<Option<Settings>> { Ok(self.tables().settings.clone()) }

    async fn footer_configs(&self) -> Result<Vec<FooterConfig>> {
        let mut configs: Vec<_> = self.tables().footer_configs.iter().filter(|c| c.active).cloned().collect();
        configs.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(configs)
    }

    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry> {
        let mut t = self.tables();
        let inquiry = Inquiry {
            id: t.next_id(), name: inquiry.name.trim().to_string(), phone: inquiry.phone.trim().to_string(),
            email: inquiry.email, message: inquiry.message, kind: inquiry.kind, status: EnquiryStatus::New,
            created_at: Utc::now(),
        };
        t.inquiries.push(inquiry.clone());
        Ok(inquiry)
    }

    async fn list_inquiries(&self) -> Result<Vec<Inquiry>> {
        Ok(self.tables().inquiries.iter().rev().cloned().collect())
    }

    async fn set_inquiry_status(&self, id: i64, status: EnquiryStatus) -> Result<bool> {
        Ok(self.tables().inquiries.iter_mut().find(|i| i.id == id).map(|i| i.status = status).is_some())
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment> {
        let mut t = self.tables();
        let appointment = Appointment {
            id: t.next_id(), name: appointment.name.trim().to_string(), phone: appointment.phone.trim().to_string(),
            email: appointment.email, date: appointment.date.trim().to_string(), time: appointment.time.trim().to_string(),
            message: appointment.message, status: EnquiryStatus::New, created_at: Utc::now(),
        };
        t.appointments.push(appointment.clone());
        Ok(appointment)
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        Ok(self.tables().appointments.iter().rev().cloned().collect())
    }

    async fn set_appointment_status(&self, id: i64, status: EnquiryStatus) -> Result<bool> {
        Ok(self.tables().appointments.iter_mut().find(|a| a.id == id).map(|a| a.status = status).is_some())
    }

    async fn ping(&self) -> Result<()> {
        if self.tables().fail_ping {
            return Err(ShopError::Storage(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}
