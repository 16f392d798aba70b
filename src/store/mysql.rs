//! MySQL adapter
//!
//! Runtime-checked queries only. Dynamic SQL (category price predicates,
//! partial product updates, `IN` lists) goes through `QueryBuilder` so every
//! value is a bound parameter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::{MySql, MySqlPool, MySqlPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, QueryBuilder};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{CatalogStore, ContentStore, OrderStore, UserStore, WishlistEntry, WishlistStore};
use crate::config::Config;
use crate::domain::aggregates::{Address, LineItem, NewOrder, Order, OrderStatus, Product, ProductInput, ProductListing, ProfileUpdate, User};
use crate::domain::catalog::{
    Banner, Category, Collection, GlobalMaterial, Material, MaterialCategory, MegaCategory, MenuEntry, MetalRate, ShopFor, ShopForDetail,
};
use crate::domain::content::{
    footer_links, Appointment, EnquiryStatus, FooterConfig, HomeContent, HomeData, HomeGift, Inquiry, InquiryKind, NewAppointment,
    NewInquiry, Page, SectionImage, Settings, Video,
};
use crate::domain::filter::{PriceBand, PriceFilter};
use crate::domain::value_objects::{decode_json, normalize_images};
use crate::{Result, ShopError};

const PRODUCT_COLUMNS: &str = "id, name, slug, images, sub_heading, badge_tag, tag_line, category_id, collection_id, \
    metal_rate_id, trending_order, listing_order, mrp, price, discount, offer_text, shortcode, active, sizes, description, \
    product_details, instructions, size_chart, tax_rate, is_tax_included, meesho_link, flipkart_link, myntra_link, amazon_link, \
    is_new_arrival, units_sold, making_charges, product_summary, metal_weight, gross_weight, metal_details, diamond_details, \
    available_metals, available_diamonds, price_breakup, created_at, updated_at";

const USER_COLUMNS: &str = "id, username, email, password, first_name, last_name, phone, alternate_phone, gender, dob, anniversary, \
    created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, items, total, status, address, payment_method, payment_id, created_at, updated_at";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect_with(config.database.clone())
            .await?;
        info!(max_connections = config.db_max_connections, "MySQL pool ready");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await.map_err(sqlx::Error::from)?;
        info!("Schema migrations applied");
        Ok(())
    }

    async fn fetch_products(&self, mut qb: QueryBuilder<'_, MySql>) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Loads the material and global material links of `products` in two queries.
    async fn attach_materials(&self, products: Vec<Product>) -> Result<Vec<ProductListing>> {
        if products.is_empty() {
            return Ok(vec![]);
        }
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT pm.product_id, m.id, m.name, m.image, m.mega_category_id \
             FROM product_materials pm JOIN materials m ON m.id = pm.material_id \
             WHERE m.deleted_at IS NULL AND pm.product_id IN ",
        );
        push_id_list(&mut qb, &ids);
        let links: Vec<MaterialLinkRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut materials = group_by(links, |row| row.product_id, Material::from);

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT pg.product_id, g.id, g.name, g.active, g.category \
             FROM product_global_materials pg JOIN global_materials g ON g.id = pg.global_material_id \
             WHERE g.deleted_at IS NULL AND g.active = TRUE AND pg.product_id IN ",
        );
        push_id_list(&mut qb, &ids);
        let links: Vec<GlobalMaterialLinkRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut globals = group_by(links, |row| row.product_id, GlobalMaterial::from);

        Ok(products
            .into_iter()
            .map(|product| ProductListing {
                materials: materials.remove(&product.id).unwrap_or_default(),
                global_materials: globals.remove(&product.id).unwrap_or_default(),
                product,
            })
            .collect())
    }

    async fn menu_entries(&self, table: &str) -> Result<Vec<MenuEntry>> {
        let sql = format!("SELECT id, name, image, mega_category_id FROM {table} WHERE deleted_at IS NULL ORDER BY id");
        Ok(sqlx::query_as::<_, MenuEntry>(&sql).fetch_all(&self.pool).await?)
    }

    async fn banners(&self, table: &str) -> Result<Vec<Banner>> {
        let sql = format!("SELECT id, title, image, url, active FROM {table} WHERE active = TRUE ORDER BY id");
        Ok(sqlx::query_as::<_, Banner>(&sql).fetch_all(&self.pool).await?)
    }

    async fn section_images(&self) -> Result<Vec<SectionImage>> {
        Ok(sqlx::query_as("SELECT id, name, image, active, sort_order FROM section_images WHERE active = TRUE ORDER BY sort_order, id")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn gifts(&self) -> Result<Vec<HomeGift>> {
        Ok(sqlx::query_as("SELECT id, name, description, icon, active, sort_order FROM home_gifts WHERE active = TRUE ORDER BY sort_order, id")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn videos(&self) -> Result<Vec<Video>> {
        Ok(sqlx::query_as("SELECT id, title, youtube_url, video_file, active FROM videos WHERE active = TRUE ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn home_data(&self) -> Result<Option<HomeData>> {
        let row: Option<HomeDataRow> = sqlx::query_as(
            "SELECT id, youtube_video_url, explore_url, text, other_banner_image, feed_images, feed_videos, gift_section_bg, \
             store_section_bg, sparkle_seeker_config, traditional_section_config, modern_section_config \
             FROM home_data WHERE deleted_at IS NULL ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(HomeData::from))
    }

    async fn exists(&self, table: &str, id: i64) -> Result<bool> {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?");
        let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(count > 0)
    }

    async fn find_inquiry(&self, id: i64) -> Result<Option<Inquiry>> {
        let row: Option<InquiryRow> =
            sqlx::query_as("SELECT id, name, phone, email, message, `type`, status, created_at FROM inquiries WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Inquiry::from))
    }

    async fn find_appointment(&self, id: i64) -> Result<Option<Appointment>> {
        let row: Option<AppointmentRow> = sqlx::query_as(
            "SELECT id, name, phone, email, `date`, `time`, message, status, created_at FROM appointments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Appointment::from))
    }
}

// =============================================================================
// Query building
// =============================================================================

/// Unique and foreign-key violations on a product write map to client errors.
fn product_write_error(e: sqlx::Error) -> ShopError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => ShopError::DuplicateSlug,
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => ShopError::UnknownReference,
        other => ShopError::Storage(other),
    }
}

/// Active products of a category, with the price filter rendered as bound predicates.
pub(crate) fn category_products_query(category_id: i64, price: &PriceFilter) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL AND active = TRUE AND category_id = "
    ));
    qb.push_bind(category_id);

    if !price.bands.is_empty() {
        qb.push(" AND (");
        for (i, band) in price.bands.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            push_band(&mut qb, band);
        }
        qb.push(")");
    }
    if let Some(min) = price.min {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = price.max {
        qb.push(" AND price <= ").push_bind(max);
    }

    qb.push(" ORDER BY listing_order, id");
    qb
}

fn push_band(qb: &mut QueryBuilder<'static, MySql>, band: &PriceBand) {
    let mut clauses = vec![];
    if let Some(b) = band.lower() {
        clauses.push((if b.inclusive { "price >= " } else { "price > " }, b.value));
    }
    if let Some(b) = band.upper() {
        clauses.push((if b.inclusive { "price <= " } else { "price < " }, b.value));
    }
    qb.push("(");
    for (i, (op, value)) in clauses.into_iter().enumerate() {
        if i > 0 {
            qb.push(" AND ");
        }
        qb.push(op).push_bind(value);
    }
    qb.push(")");
}

fn push_id_list(qb: &mut QueryBuilder<'_, MySql>, ids: &[i64]) {
    qb.push("(");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

/// Appends `, column = ?` when a value is present.
fn set<'a, T>(qb: &mut QueryBuilder<'a, MySql>, column: &str, value: Option<T>)
where
    T: 'a + sqlx::Encode<'a, MySql> + sqlx::Type<MySql> + Send,
{
    if let Some(value) = value {
        qb.push(", ").push(column).push(" = ").push_bind(value);
    }
}

/// Partial update touching only the fields present in `input`.
pub(crate) fn product_update(id: i64, input: ProductInput) -> QueryBuilder<'static, MySql> {
    let mut qb = QueryBuilder::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP");
    set(&mut qb, "name", input.name);
    set(&mut qb, "slug", input.slug);
    set(&mut qb, "images", input.images.map(Json));
    set(&mut qb, "sub_heading", input.sub_heading);
    set(&mut qb, "badge_tag", input.badge_tag);
    set(&mut qb, "tag_line", input.tag_line);
    set(&mut qb, "category_id", input.category_id);
    set(&mut qb, "collection_id", input.collection_id);
    set(&mut qb, "metal_rate_id", input.metal_rate_id);
    set(&mut qb, "trending_order", input.trending_order);
    set(&mut qb, "listing_order", input.listing_order);
    set(&mut qb, "mrp", input.mrp);
    set(&mut qb, "price", input.price);
    set(&mut qb, "discount", input.discount);
    set(&mut qb, "offer_text", input.offer_text);
    set(&mut qb, "shortcode", input.shortcode);
    set(&mut qb, "active", input.active);
    set(&mut qb, "sizes", input.sizes.map(Json));
    set(&mut qb, "description", input.description);
    set(&mut qb, "product_details", input.product_details.map(Json));
    set(&mut qb, "instructions", input.instructions);
    set(&mut qb, "size_chart", input.size_chart.map(Json));
    set(&mut qb, "tax_rate", input.tax_rate);
    set(&mut qb, "is_tax_included", input.is_tax_included);
    set(&mut qb, "meesho_link", input.meesho_link);
    set(&mut qb, "flipkart_link", input.flipkart_link);
    set(&mut qb, "myntra_link", input.myntra_link);
    set(&mut qb, "amazon_link", input.amazon_link);
    set(&mut qb, "is_new_arrival", input.is_new_arrival);
    set(&mut qb, "making_charges", input.making_charges);
    set(&mut qb, "product_summary", input.product_summary.map(Json));
    set(&mut qb, "metal_weight", input.metal_weight);
    set(&mut qb, "gross_weight", input.gross_weight);
    set(&mut qb, "metal_details", input.metal_details);
    set(&mut qb, "diamond_details", input.diamond_details);
    set(&mut qb, "available_metals", input.available_metals.map(Json));
    set(&mut qb, "available_diamonds", input.available_diamonds.map(Json));
    set(&mut qb, "price_breakup", input.price_breakup.map(Json));
    qb.push(" WHERE deleted_at IS NULL AND id = ").push_bind(id);
    qb
}

fn group_by<R, T>(rows: Vec<R>, key: impl Fn(&R) -> i64, into: impl Fn(R) -> T) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(key(&row)).or_default().push(into(row));
    }
    grouped
}

// =============================================================================
// Rows
// =============================================================================

fn json_column(raw: Option<Json<Value>>) -> Value {
    raw.map(|Json(v)| decode_json(v)).unwrap_or(Value::Null)
}

fn json_list(raw: Option<Json<Value>>) -> Value {
    match json_column(raw) {
        Value::Null => Value::Array(vec![]),
        other => other,
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    slug: Option<String>,
    images: Option<Json<Value>>,
    sub_heading: Option<String>,
    badge_tag: Option<String>,
    tag_line: Option<String>,
    category_id: i64,
    collection_id: i64,
    metal_rate_id: Option<i64>,
    trending_order: i32,
    listing_order: i32,
    mrp: Option<f64>,
    price: Option<f64>,
    discount: Option<f64>,
    offer_text: Option<String>,
    shortcode: Option<String>,
    active: bool,
    sizes: Option<Json<Value>>,
    description: Option<String>,
    product_details: Option<Json<Value>>,
    instructions: Option<String>,
    size_chart: Option<Json<Value>>,
    tax_rate: Option<f64>,
    is_tax_included: bool,
    meesho_link: Option<String>,
    flipkart_link: Option<String>,
    myntra_link: Option<String>,
    amazon_link: Option<String>,
    is_new_arrival: bool,
    units_sold: f64,
    making_charges: Option<f64>,
    product_summary: Option<Json<Value>>,
    metal_weight: Option<String>,
    gross_weight: Option<String>,
    metal_details: Option<String>,
    diamond_details: Option<String>,
    available_metals: Option<Json<Value>>,
    available_diamonds: Option<Json<Value>>,
    price_breakup: Option<Json<Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let images = normalize_images(&row.images.map(|Json(v)| v).unwrap_or(Value::Null), &row.name);
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            images,
            sub_heading: row.sub_heading,
            badge_tag: row.badge_tag,
            tag_line: row.tag_line,
            category_id: row.category_id,
            collection_id: row.collection_id,
            metal_rate_id: row.metal_rate_id,
            trending_order: row.trending_order,
            listing_order: row.listing_order,
            mrp: row.mrp,
            price: row.price,
            discount: row.discount,
            offer_text: row.offer_text,
            shortcode: row.shortcode,
            active: row.active,
            sizes: json_list(row.sizes),
            description: row.description,
            product_details: json_column(row.product_details),
            instructions: row.instructions,
            size_chart: json_column(row.size_chart),
            tax_rate: row.tax_rate,
            is_tax_included: row.is_tax_included,
            meesho_link: row.meesho_link,
            flipkart_link: row.flipkart_link,
            myntra_link: row.myntra_link,
            amazon_link: row.amazon_link,
            is_new_arrival: row.is_new_arrival,
            units_sold: row.units_sold,
            making_charges: row.making_charges,
            product_summary: json_column(row.product_summary),
            metal_weight: row.metal_weight,
            gross_weight: row.gross_weight,
            metal_details: row.metal_details,
            diamond_details: row.diamond_details,
            available_metals: json_list(row.available_metals),
            available_diamonds: json_list(row.available_diamonds),
            price_breakup: json_list(row.price_breakup),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct MaterialLinkRow {
    product_id: i64,
    id: i64,
    name: String,
    image: Option<String>,
    mega_category_id: i64,
}

impl From<MaterialLinkRow> for Material {
    fn from(row: MaterialLinkRow) -> Self {
        Self { id: row.id, name: row.name, image: row.image, mega_category_id: row.mega_category_id, icon: None }
    }
}

#[derive(FromRow)]
struct GlobalMaterialLinkRow {
    product_id: i64,
    id: i64,
    name: String,
    active: bool,
    category: String,
}

impl From<GlobalMaterialLinkRow> for GlobalMaterial {
    fn from(row: GlobalMaterialLinkRow) -> Self {
        Self { id: row.id, name: row.name, active: row.active, category: MaterialCategory::parse(&row.category) }
    }
}

#[derive(FromRow)]
struct MegaCategoryRow {
    id: i64,
    name: String,
    slug: Option<String>,
    image: Option<String>,
}

impl From<MegaCategoryRow> for MegaCategory {
    fn from(row: MegaCategoryRow) -> Self {
        Self {
            id: row.id, name: row.name, slug: row.slug, image: row.image,
            styles: vec![], materials: vec![], shop_fors: vec![], occasions: vec![],
        }
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    items: Json<Vec<LineItem>>,
    total: f64,
    status: String,
    address: Json<Address>,
    payment_method: Option<String>,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = ShopError;

    fn try_from(row: OrderRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            items: row.items.0,
            total: row.total,
            status: row.status.parse()?,
            address: row.address.0,
            payment_method: row.payment_method,
            payment_id: row.payment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct HomeDataRow {
    id: i64,
    youtube_video_url: Option<String>,
    explore_url: Option<String>,
    text: Option<String>,
    other_banner_image: Option<String>,
    feed_images: Option<Json<Value>>,
    feed_videos: Option<Json<Value>>,
    gift_section_bg: Option<String>,
    store_section_bg: Option<String>,
    sparkle_seeker_config: Option<Json<Value>>,
    traditional_section_config: Option<Json<Value>>,
    modern_section_config: Option<Json<Value>>,
}

impl From<HomeDataRow> for HomeData {
    fn from(row: HomeDataRow) -> Self {
        Self {
            id: row.id,
            youtube_video_url: row.youtube_video_url,
            explore_url: row.explore_url,
            text: row.text,
            other_banner_image: row.other_banner_image,
            feed_images: json_list(row.feed_images),
            feed_videos: json_list(row.feed_videos),
            gift_section_bg: row.gift_section_bg,
            store_section_bg: row.store_section_bg,
            sparkle_seeker_config: json_column(row.sparkle_seeker_config),
            traditional_section_config: json_column(row.traditional_section_config),
            modern_section_config: json_column(row.modern_section_config),
        }
    }
}

#[derive(FromRow)]
struct FooterConfigRow {
    id: i64,
    title: String,
    priority: i32,
    active: bool,
    links: Option<Json<Value>>,
}

#[derive(FromRow)]
struct InquiryRow {
    id: i64,
    name: String,
    phone: String,
    email: Option<String>,
    message: Option<String>,
    #[sqlx(rename = "type")]
    kind: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<InquiryRow> for Inquiry {
    fn from(row: InquiryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            message: row.message,
            kind: InquiryKind::parse(&row.kind),
            status: EnquiryStatus::parse(&row.status).unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct AppointmentRow {
    id: i64,
    name: String,
    phone: String,
    email: Option<String>,
    date: String,
    time: String,
    message: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            date: row.date,
            time: row.time,
            message: row.message,
            status: EnquiryStatus::parse(&row.status).unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Store implementations
// =============================================================================

#[async_trait]
impl CatalogStore for MySqlStore {
    async fn list_products(&self) -> Result<Vec<ProductListing>> {
        let qb = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL AND active = TRUE ORDER BY listing_order, id"
        ));
        let products = self.fetch_products(qb).await?;
        self.attach_materials(products).await
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<ProductListing>> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL AND active = TRUE AND slug = "
        ));
        qb.push_bind(slug.to_string()).push(" LIMIT 1");
        let products = self.fetch_products(qb).await?;
        Ok(self.attach_materials(products).await?.into_iter().next())
    }

    async fn find_product(&self, id: i64) -> Result<Option<Product>> {
        let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL AND id = "));
        qb.push_bind(id);
        Ok(self.fetch_products(qb).await?.into_iter().next())
    }

    async fn products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let mut qb = QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL AND id IN "));
        push_id_list(&mut qb, ids);
        let mut products = self.fetch_products(qb).await?;
        products.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(products)
    }

    async fn create_product(&self, input: ProductInput) -> Result<Product> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query("INSERT INTO products (name, category_id, collection_id) VALUES (?, ?, ?)")
            .bind(input.name.clone())
            .bind(input.category_id)
            .bind(input.collection_id)
            .execute(&mut *tx)
            .await
            .map_err(product_write_error)?
            .last_insert_id() as i64;
        product_update(id, input).build().execute(&mut *tx).await.map_err(product_write_error)?;
        tx.commit().await?;

        info!(product_id = id, "Product created");
        self.find_product(id).await?.ok_or(ShopError::ProductNotFound)
    }

    async fn update_product(&self, id: i64, input: ProductInput) -> Result<Option<Product>> {
        product_update(id, input).build().execute(&self.pool).await.map_err(product_write_error)?;
        debug!(product_id = id, "Product updated");
        self.find_product(id).await
    }

    async fn delete_product(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE products SET deleted_at = CURRENT_TIMESTAMP WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(sqlx::query_as("SELECT id, name, slug, image, created_at, updated_at FROM categories WHERE deleted_at IS NULL ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Ok(sqlx::query_as(
            "SELECT id, name, slug, image, created_at, updated_at FROM categories WHERE deleted_at IS NULL AND slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn category_products(&self, category_id: i64, price: &PriceFilter) -> Result<Vec<ProductListing>> {
        let products = self.fetch_products(category_products_query(category_id, price)).await?;
        debug!(category_id, count = products.len(), "Category products fetched");
        self.attach_materials(products).await
    }

    async fn find_banner_by_url(&self, url: &str) -> Result<Option<Banner>> {
        Ok(sqlx::query_as("SELECT id, title, image, url, active FROM banners WHERE url = ? AND active = TRUE ORDER BY id LIMIT 1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_collections(&self) -> Result<Vec<Collection>> {
        Ok(sqlx::query_as("SELECT id, name, image, active FROM collections WHERE deleted_at IS NULL AND active = TRUE ORDER BY name")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn metal_rates(&self) -> Result<Vec<MetalRate>> {
        Ok(sqlx::query_as("SELECT id, name, rate, updated_at FROM metal_rates ORDER BY id").fetch_all(&self.pool).await?)
    }

    async fn update_metal_rate(&self, id: i64, rate: Decimal) -> Result<Option<MetalRate>> {
        sqlx::query("UPDATE metal_rates SET rate = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(rate)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(sqlx::query_as("SELECT id, name, rate, updated_at FROM metal_rates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn mega_menu(&self) -> Result<Vec<MegaCategory>> {
        let categories: Vec<MegaCategoryRow> =
            sqlx::query_as("SELECT id, name, slug, image FROM mega_categories WHERE deleted_at IS NULL ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        let shop_fors: Vec<ShopFor> = sqlx::query_as(
            "SELECT id, name, start_price, end_price, active, mega_category_id FROM shopfor \
             WHERE deleted_at IS NULL AND active = TRUE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut styles = group_by(self.menu_entries("styles").await?, |e| e.mega_category_id, |e| e);
        let mut materials = group_by(self.menu_entries("materials").await?, |e| e.mega_category_id, |e| e);
        let mut occasions = group_by(self.menu_entries("occasions").await?, |e| e.mega_category_id, |e| e);
        let mut shop_fors = group_by(shop_fors, |s| s.mega_category_id, |s| s);

        Ok(categories
            .into_iter()
            .map(|row| {
                let id = row.id;
                MegaCategory {
                    styles: styles.remove(&id).unwrap_or_default(),
                    materials: materials.remove(&id).unwrap_or_default(),
                    shop_fors: shop_fors.remove(&id).unwrap_or_default(),
                    occasions: occasions.remove(&id).unwrap_or_default(),
                    ..MegaCategory::from(row)
                }
            })
            .collect())
    }

    async fn find_shop_for(&self, id: i64) -> Result<Option<ShopForDetail>> {
        let shop_for: Option<ShopFor> = sqlx::query_as(
            "SELECT id, name, start_price, end_price, active, mega_category_id FROM shopfor WHERE deleted_at IS NULL AND id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(shop_for) = shop_for else { return Ok(None) };

        let parent: Option<MegaCategoryRow> =
            sqlx::query_as("SELECT id, name, slug, image FROM mega_categories WHERE deleted_at IS NULL AND id = ?")
                .bind(shop_for.mega_category_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(Some(ShopForDetail { shop_for, shop_for_mega_category: parent.map(MegaCategory::from) }))
    }
}

#[async_trait]
impl WishlistStore for MySqlStore {
    async fn wishlist_product_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        Ok(sqlx::query_scalar("SELECT product_id FROM wishlist WHERE user_id = ? ORDER BY created_at DESC, id DESC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn wishlist_contains(&self, user_id: i64, product_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wishlist WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn add_to_wishlist(&self, user_id: i64, product_id: i64) -> Result<WishlistEntry> {
        let id = sqlx::query("INSERT INTO wishlist (user_id, product_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => ShopError::AlreadyInWishlist,
                other => ShopError::Storage(other),
            })?
            .last_insert_id() as i64;

        Ok(sqlx::query_as("SELECT id, user_id, product_id, created_at FROM wishlist WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn remove_from_wishlist(&self, user_id: i64, product_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM wishlist WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MySqlStore {
    async fn create_order(&self, order: NewOrder) -> Result<Order> {
        let id = sqlx::query(
            "INSERT INTO orders (user_id, items, total, status, address, payment_method, payment_id) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.user_id)
        .bind(Json(&order.items))
        .bind(order.total)
        .bind(OrderStatus::Pending.as_str())
        .bind(Json(&order.address))
        .bind(order.payment_method.as_deref())
        .bind(order.payment_id.as_deref())
        .execute(&self.pool)
        .await?
        .last_insert_id() as i64;

        info!(order_id = id, user_id = order.user_id, total = order.total, "Order placed");
        self.find_order(id).await?.ok_or(ShopError::OrderNotFound)
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE deleted_at IS NULL AND user_id = ? ORDER BY created_at DESC, id DESC");
        let rows: Vec<OrderRow> = sqlx::query_as(&sql).bind(user_id).fetch_all(&self.pool).await?;
        rows.into_iter().map(Order::try_from).collect()
    }

    async fn find_order(&self, id: i64) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE deleted_at IS NULL AND id = ?");
        let row: Option<OrderRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(Order::try_from).transpose()
    }

    async fn set_order_status(&self, id: i64, from: OrderStatus, to: OrderStatus) -> Result<()> {
        let result = sqlx::query(
            "UPDATE orders SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE deleted_at IS NULL AND id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ShopError::InvalidTransition { from: from.to_string(), to: to.to_string() });
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL AND id = ?");
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> Result<Option<User>> {
        let Some(mut user) = self.find_user(id).await? else { return Ok(None) };
        user.apply(update);
        sqlx::query(
            "UPDATE users SET first_name = ?, last_name = ?, phone = ?, alternate_phone = ?, gender = ?, dob = ?, anniversary = ?, \
             updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(user.first_name.as_deref())
        .bind(user.last_name.as_deref())
        .bind(user.phone.as_deref())
        .bind(user.alternate_phone.as_deref())
        .bind(user.gender.as_deref())
        .bind(user.dob)
        .bind(user.anniversary)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(Some(user))
    }
}

#[async_trait]
impl ContentStore for MySqlStore {
    async fn home(&self) -> Result<HomeContent> {
        let (banners, sub_banners, categories, collections, section_images, gifts, videos, home_data) = tokio::try_join!(
            self.banners("banners"),
            self.banners("sub_banners"),
            CatalogStore::list_categories(self),
            CatalogStore::list_collections(self),
            self.section_images(),
            self.gifts(),
            self.videos(),
            self.home_data(),
        )?;
        Ok(HomeContent { banners, sub_banners, categories, collections, section_images, gifts, videos, home_data })
    }

    async fn find_page(&self, slug: &str) -> Result<Option<Page>> {
        Ok(sqlx::query_as(
            "SELECT id, title, slug, content, active, updated_at FROM pages WHERE deleted_at IS NULL AND active = TRUE AND slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn settings(&self) -> Result<Option<Settings>> {
        Ok(sqlx::query_as(
            "SELECT id, contact_number, contact_timing, support_email, facebook_link, instagram_link, twitter_link, youtube_link, \
             pinterest_link, whatsapp_link FROM settings ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn footer_configs(&self) -> Result<Vec<FooterConfig>> {
        let rows: Vec<FooterConfigRow> =
            sqlx::query_as("SELECT id, title, priority, active, links FROM footer_configs WHERE active = TRUE ORDER BY priority DESC, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|row| FooterConfig {
                links: footer_links(&json_column(row.links)),
                id: row.id,
                title: row.title,
                priority: row.priority,
                active: row.active,
            })
            .collect())
    }

    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry> {
        let id = sqlx::query("INSERT INTO inquiries (name, phone, email, message, `type`, status) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(inquiry.name.trim())
            .bind(inquiry.phone.trim())
            .bind(inquiry.email.as_deref())
            .bind(inquiry.message.as_deref())
            .bind(inquiry.kind.as_str())
            .bind(EnquiryStatus::New.as_str())
            .execute(&self.pool)
            .await?
            .last_insert_id() as i64;
        info!(inquiry_id = id, kind = inquiry.kind.as_str(), "Inquiry received");
        self.find_inquiry(id).await?.ok_or(ShopError::RecordNotFound)
    }

    async fn list_inquiries(&self) -> Result<Vec<Inquiry>> {
        let rows: Vec<InquiryRow> = sqlx::query_as(
            "SELECT id, name, phone, email, message, `type`, status, created_at FROM inquiries ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Inquiry::from).collect())
    }

    async fn set_inquiry_status(&self, id: i64, status: EnquiryStatus) -> Result<bool> {
        if !self.exists("inquiries", id).await? {
            return Ok(false);
        }
        sqlx::query("UPDATE inquiries SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> Result<Appointment> {
        let id = sqlx::query(
            "INSERT INTO appointments (name, phone, email, `date`, `time`, message, status) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(appointment.name.trim())
        .bind(appointment.phone.trim())
        .bind(appointment.email.as_deref())
        .bind(appointment.date.trim())
        .bind(appointment.time.trim())
        .bind(appointment.message.as_deref())
        .bind(EnquiryStatus::New.as_str())
        .execute(&self.pool)
        .await?
        .last_insert_id() as i64;
        info!(appointment_id = id, date = %appointment.date, "Appointment booked");
        self.find_appointment(id).await?.ok_or(ShopError::RecordNotFound)
    }

    async fn list_appointments(&self) -> Result<Vec<Appointment>> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(
            "SELECT id, name, phone, email, `date`, `time`, message, status, created_at FROM appointments \
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Appointment::from).collect())
    }

    async fn set_appointment_status(&self, id: i64, status: EnquiryStatus) -> Result<bool> {
        if !self.exists("appointments", id).await? {
            return Ok(false);
        }
        sqlx::query("UPDATE appointments SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
