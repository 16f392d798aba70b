//! Products, categories, collections, metal rates and the mega menu.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::auth::AdminUser;
use super::error::{ApiError, ApiResult};
use super::{AppState, Body, Path, Query};
use crate::domain::aggregates::{Product, ProductDetail, ProductInput, ProductListing};
use crate::domain::catalog::{Category, CategoryWithBanner, Collection, MegaCategory, MetalRate, ShopForDetail};
use crate::domain::filter::{CategoryFilter, CategoryQuery};
use crate::domain::value_objects::{resolve_optional, slugify};
use crate::ShopError;

#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub category: CategoryWithBanner,
    pub products: Vec<ProductListing>,
}

#[derive(Debug, Deserialize)]
pub struct RateUpdate {
    pub rate: Decimal,
}

fn resolve_listings(state: &AppState, listings: &mut [ProductListing]) {
    listings.iter_mut().for_each(|l| l.product.resolve_images(state.image_base()));
}

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<ProductListing>>> {
    let mut products = state.store.list_products().await?;
    resolve_listings(&state, &mut products);
    Ok(Json(products))
}

pub async fn product_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Json<ProductDetail>> {
    let listing = state
        .store
        .find_product_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::ProductSlugNotFound(slug.clone()))?;
    let rates = state.store.metal_rates().await?;
    Ok(Json(ProductDetail::build(listing, rates, state.image_base())))
}

pub async fn create_product(
    _admin: AdminUser,
    State(state): State<AppState>,
    Body(mut input): Body<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    input.validate()?;
    if let Some(field) = input.missing_required() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    if input.slug.is_none() {
        input.slug = input.name.as_deref().map(slugify);
    }

    let mut product = state.store.create_product(input).await?;
    product.resolve_images(state.image_base());
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Body(input): Body<ProductInput>,
) -> ApiResult<Json<Product>> {
    input.validate()?;
    let mut product = state.store.update_product(id, input).await?.ok_or(ShopError::ProductNotFound)?;
    product.resolve_images(state.image_base());
    info!(product_id = id, "Product updated");
    Ok(Json(product))
}

pub async fn delete_product(_admin: AdminUser, State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if !state.store.delete_product(id).await? {
        return Err(ShopError::ProductNotFound.into());
    }
    info!(product_id = id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    let mut categories = state.store.list_categories().await?;
    categories.iter_mut().for_each(|c| c.image = resolve_optional(state.image_base(), c.image.as_deref()));
    Ok(Json(categories))
}

/// Category header with its banner, and the products passing every filter in the query string.
pub async fn category_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> ApiResult<Json<CategoryPage>> {
    let mut category = state.store.find_category_by_slug(&slug).await?.ok_or(ShopError::CategoryNotFound)?;
    category.image = resolve_optional(state.image_base(), category.image.as_deref());

    let filter = CategoryFilter::from_query(&query);
    let fetched = state.store.category_products(category.id, &filter.price).await?;
    let mut products = filter.apply(fetched);
    resolve_listings(&state, &mut products);

    let banner = state
        .store
        .find_banner_by_url(&CategoryWithBanner::banner_url(&category.slug))
        .await?
        .and_then(|b| resolve_optional(state.image_base(), b.image.as_deref()));

    Ok(Json(CategoryPage { category: CategoryWithBanner { category, banner }, products }))
}

pub async fn list_collections(State(state): State<AppState>) -> ApiResult<Json<Vec<Collection>>> {
    let mut collections = state.store.list_collections().await?;
    collections.iter_mut().for_each(|c| c.image = resolve_optional(state.image_base(), c.image.as_deref()));
    Ok(Json(collections))
}

pub async fn metal_rates(State(state): State<AppState>) -> ApiResult<Json<Vec<MetalRate>>> {
    Ok(Json(state.store.metal_rates().await?))
}

pub async fn update_metal_rate(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Body(update): Body<RateUpdate>,
) -> ApiResult<Json<MetalRate>> {
    if update.rate.is_sign_negative() {
        return Err(ApiError::BadRequest("Rate must not be negative".into()));
    }
    let rate = state.store.update_metal_rate(id, update.rate).await?.ok_or(ShopError::MetalRateNotFound)?;
    info!(metal_rate_id = id, rate = %rate.rate, "Metal rate updated");
    Ok(Json(rate))
}

pub async fn mega_menu(State(state): State<AppState>) -> ApiResult<Json<Vec<MegaCategory>>> {
    let mut menu = state.store.mega_menu().await?;
    for category in &mut menu {
        category.resolve_icons(state.image_base());
        category.image = resolve_optional(state.image_base(), category.image.as_deref());
    }
    Ok(Json(menu))
}

pub async fn shop_for(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<ShopForDetail>> {
    Ok(Json(state.store.find_shop_for(id).await?.ok_or(ShopError::ShopForNotFound)?))
}

#[cfg(test)]
mod tests {
    use crate::api::auth::tests::{admin_bearer, bearer};
    use crate::api::testing::*;
    use crate::domain::aggregates::product::tests::sample_product;
    use crate::domain::aggregates::ProductListing;
    use crate::domain::catalog::{Banner, Category, Collection, MegaCategory, MenuEntry, MetalRate, ShopFor};
    use crate::store::memory::MemoryStore;
    use axum::http::StatusCode;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::sync::Arc;

    fn category(id: i64, slug: &str) -> Category {
        Category { id, name: slug.to_uppercase(), slug: slug.into(), image: None, created_at: Utc::now(), updated_at: Utc::now() }
    }

    fn catalog_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store.seed(|t| {
            t.categories.push(category(1, "rings"));
            t.collections.push(Collection { id: 1, name: "Bridal".into(), image: None, active: true });
            t.banners.push(Banner { id: 1, title: None, image: Some("ring-banner.jpg".into()), url: Some("/category/rings".into()), active: true });

            let mut cheap = sample_product(1, "Petite Band");
            cheap.price = Some(3500.0);
            let mut mid = sample_product(2, "Halo Ring");
            mid.price = Some(8000.0);
            mid.product_details = json!({"style": "Halo"});
            let mut hidden = sample_product(3, "Draft Ring");
            hidden.active = false;
            let mut gold = sample_product(4, "Gold Hoop");
            gold.category_id = 2;
            gold.metal_rate_id = Some(1);
            gold.metal_weight = Some("2 g".into());
            gold.making_charges = Some(1000.0);
            gold.tax_rate = Some(3.0);
            t.products.extend([cheap, mid, hidden, gold].map(ProductListing::bare));

            t.metal_rates.push(MetalRate { id: 1, name: "Gold 22K".into(), rate: Decimal::new(5000, 0), updated_at: Utc::now() });
        });
        store
    }

    #[tokio::test]
    async fn test_list_hides_inactive_and_resolves_images() {
        let app = app(catalog_store());
        let (status, body) = send(&app, request("GET", "/api/products", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap().to_string()).collect();
        assert_eq!(names, ["Petite Band", "Halo Ring", "Gold Hoop"]);
        assert_eq!(body[0]["images"][0]["src"], "https://cdn.test/images/ring.jpg");
    }

    #[tokio::test]
    async fn test_product_detail_prices_from_linked_rate() {
        let app = app(catalog_store());
        let (status, body) = send(&app, request("GET", "/api/products/slug/gold-hoop", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["priceBreakdown"]["total"], 11330);
        assert_eq!(body["metalRate"]["id"], 1);
        assert_eq!(body["reviews"], json!([]));

        let (status, body) = send(&app, request("GET", "/api/products/slug/missing", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Product not found", "message": "Product not found", "slug": "missing"}));
    }

    #[tokio::test]
    async fn test_category_page_filters_by_price_and_style() {
        let app = app(catalog_store());
        let (status, body) = send(&app, request("GET", "/api/categories/rings?price=under-5000", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"]["slug"], "rings");
        assert_eq!(body["category"]["banner"], "https://cdn.test/images/ring-banner.jpg");
        assert_eq!(body["products"].as_array().unwrap().len(), 1);
        assert_eq!(body["products"][0]["id"], 1);

        let (_, body) = send(&app, request("GET", "/api/categories/rings?style=halo&minPrice=oops", None, None)).await;
        assert_eq!(body["products"].as_array().unwrap().len(), 1);
        assert_eq!(body["products"][0]["id"], 2);

        let (status, _) = send(&app, request("GET", "/api/categories/bangles", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_product_lifecycle() {
        let store = catalog_store();
        let app = app(store.clone());
        let payload = json!({"name": "Rose Stud", "categoryId": 1, "collectionId": 1, "price": 4200, "images": ["stud.jpg"]});

        let (status, _) = send(&app, request("POST", "/api/products", Some(&bearer(9)), Some(payload.clone()))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, request("POST", "/api/products", None, Some(payload.clone()))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, created) = send(&app, request("POST", "/api/products", Some(&admin_bearer()), Some(payload))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["slug"], "rose-stud");
        let id = created["id"].as_i64().unwrap();

        let uri = format!("/api/products/{id}");
        let (status, updated) = send(&app, request("PUT", &uri, Some(&admin_bearer()), Some(json!({"price": 3900})))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["price"], 3900.0);
        assert_eq!(updated["name"], "Rose Stud");

        let (status, _) = send(&app, request("DELETE", &uri, Some(&admin_bearer()), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, request("DELETE", &uri, Some(&admin_bearer()), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_product_writes_reject_duplicate_slug_and_unknown_references() {
        let app = app(catalog_store());
        let taken = json!({"name": "Halo Ring", "categoryId": 1, "collectionId": 1});
        let (status, body) = send(&app, request("POST", "/api/products", Some(&admin_bearer()), Some(taken))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "A product with this slug already exists");

        let orphan = json!({"name": "Lone Pendant", "categoryId": 1, "collectionId": 42});
        let (status, body) = send(&app, request("POST", "/api/products", Some(&admin_bearer()), Some(orphan))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Referenced category, collection or metal rate does not exist");

        let (status, _) =
            send(&app, request("PUT", "/api/products/2", Some(&admin_bearer()), Some(json!({"slug": "petite-band"})))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = send(&app, request("PUT", "/api/products/2", Some(&admin_bearer()), Some(json!({"slug": "halo-ring"})))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, request("PUT", "/api/products/2", Some(&admin_bearer()), Some(json!({"categoryId": 9})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_numeric_ids_get_json_errors() {
        let app = app(catalog_store());
        let (status, body) = send(&app, request("PUT", "/api/products/abc", Some(&admin_bearer()), Some(json!({"price": 1})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid path parameter"));
        let (status, body) = send(&app, request("GET", "/api/mega-menu/shop-for/gifts", None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_create_requires_collection() {
        let app = app(catalog_store());
        let (status, body) =
            send(&app, request("POST", "/api/products", Some(&admin_bearer()), Some(json!({"name": "Chain", "categoryId": 1})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "collectionId is required");
    }

    #[tokio::test]
    async fn test_metal_rate_update() {
        let store = catalog_store();
        let app = app(store.clone());
        let (status, _) = send(&app, request("PUT", "/api/metal-rates/1", Some(&admin_bearer()), Some(json!({"rate": -1})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, request("PUT", "/api/metal-rates/1", Some(&admin_bearer()), Some(json!({"rate": 6100.5})))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(store.read(|t| t.metal_rates[0].rate), Decimal::new(61005, 1));
        let (status, _) = send(&app, request("PUT", "/api/metal-rates/9", Some(&admin_bearer()), Some(json!({"rate": 1})))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mega_menu_and_shop_for() {
        let store = Arc::new(MemoryStore::default());
        store.seed(|t| {
            t.mega_menu.push(MegaCategory {
                id: 5, name: "Earrings".into(), slug: Some("earrings".into()), image: None,
                styles: vec![MenuEntry { id: 1, name: "Studs".into(), image: Some("studs.png".into()), mega_category_id: 5, icon: None }],
                materials: vec![],
                shop_fors: vec![ShopFor { id: 7, name: "Under 10K".into(), start_price: None, end_price: Some(10000.0), active: true, mega_category_id: 5 }],
                occasions: vec![],
            });
        });
        let app = app(store);

        let (status, body) = send(&app, request("GET", "/api/mega-menu", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["styles"][0]["icon"], "https://cdn.test/images/studs.png");
        assert!(body[0]["occassions"].is_array());

        let (status, body) = send(&app, request("GET", "/api/mega-menu/shop-for/7", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shopForMegaCategory"]["name"], "Earrings");
        assert_eq!(body["shopForMegaCategory"]["shopFors"], json!([]));

        let (status, body) = send(&app, request("GET", "/api/mega-menu/shop-for/8", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Shop For item not found");
    }
}
