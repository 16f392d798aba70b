use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::auth::CurrentUser;
use super::error::{ApiError, ApiResult};
use super::{AppState, Body, Path};
use crate::domain::aggregates::Product;
use crate::store::WishlistEntry;
use crate::ShopError;

#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub products: Vec<Product>,
}

/// `productId` may be the numeric id or the product slug.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(i64),
    Slug(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlist {
    #[serde(default)]
    pub product_id: Option<ProductRef>,
}

fn missing_product_id() -> ApiError { ApiError::BadRequest("Product ID is required".into()) }

async fn resolve_product(state: &AppState, reference: Option<ProductRef>) -> ApiResult<Product> {
    let id = match reference {
        None | Some(ProductRef::Id(0)) => return Err(missing_product_id()),
        Some(ProductRef::Id(id)) => id,
        Some(ProductRef::Slug(raw)) => {
            let raw = raw.trim();
            match raw.parse::<i64>() {
                Ok(0) => return Err(missing_product_id()),
                Ok(id) => id,
                Err(_) if raw.is_empty() => return Err(missing_product_id()),
                Err(_) => {
                    let listing = state.store.find_product_by_slug(raw).await?.ok_or(ShopError::ProductNotFound)?;
                    return Ok(listing.product);
                }
            }
        }
    };
    Ok(state.store.find_product(id).await?.ok_or(ShopError::ProductNotFound)?)
}

pub async fn list(user: CurrentUser, State(state): State<AppState>) -> ApiResult<Json<WishlistView>> {
    let ids = state.store.wishlist_product_ids(user.id()).await?;
    let mut products = state.store.products_by_ids(&ids).await?;
    products.iter_mut().for_each(|p| p.resolve_images(state.image_base()));
    Ok(Json(WishlistView { products }))
}

pub async fn add(
    user: CurrentUser,
    State(state): State<AppState>,
    Body(body): Body<AddToWishlist>,
) -> ApiResult<(StatusCode, Json<WishlistEntry>)> {
    let product = resolve_product(&state, body.product_id).await?;
    if state.store.wishlist_contains(user.id(), product.id).await? {
        return Err(ShopError::AlreadyInWishlist.into());
    }
    let entry = state.store.add_to_wishlist(user.id(), product.id).await?;
    info!(user_id = user.id(), product_id = product.id, "Added to wishlist");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove(user: CurrentUser, State(state): State<AppState>, Path(product_id): Path<i64>) -> ApiResult<Json<Value>> {
    state.store.remove_from_wishlist(user.id(), product_id).await?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use crate::api::auth::tests::bearer;
    use crate::api::testing::*;
    use crate::domain::aggregates::product::tests::sample_product;
    use crate::domain::aggregates::ProductListing;
    use crate::store::memory::MemoryStore;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store.seed(|t| {
            t.products.push(ProductListing::bare(sample_product(11, "Pearl Drops")));
            t.products.push(ProductListing::bare(sample_product(12, "Temple Necklace")));
        });
        store
    }

    #[tokio::test]
    async fn test_wishlist_post_then_get_returns_product_and_second_post_conflicts() {
        let app = app(store());
        let user = bearer(3);

        let (status, entry) = send(&app, request("POST", "/api/wishlist", Some(&user), Some(json!({"productId": 11})))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["productId"], 11);
        assert_eq!(entry["userId"], 3);

        let (status, body) = send(&app, request("GET", "/api/wishlist", Some(&user), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["products"].as_array().unwrap().len(), 1);
        assert_eq!(body["products"][0]["name"], "Pearl Drops");
        assert_eq!(body["products"][0]["images"][0]["src"], "https://cdn.test/images/ring.jpg");

        let (status, body) = send(&app, request("POST", "/api/wishlist", Some(&user), Some(json!({"productId": 11})))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Product already in wishlist");
    }

    #[tokio::test]
    async fn test_wishlist_accepts_slug_and_rejects_bad_ids() {
        let app = app(store());
        let user = bearer(4);

        let (status, entry) = send(&app, request("POST", "/api/wishlist", Some(&user), Some(json!({"productId": "temple-necklace"})))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["productId"], 12);

        let (status, _) = send(&app, request("POST", "/api/wishlist", Some(&user), Some(json!({})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, request("POST", "/api/wishlist", Some(&user), Some(json!({"productId": "0"})))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, request("POST", "/api/wishlist", Some(&user), Some(json!({"productId": 999})))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wishlist_is_per_user_and_removable() {
        let app = app(store());
        send(&app, request("POST", "/api/wishlist", Some(&bearer(5)), Some(json!({"productId": 11})))).await;

        let (_, other) = send(&app, request("GET", "/api/wishlist", Some(&bearer(6)), None)).await;
        assert_eq!(other["products"], json!([]));

        let (status, body) = send(&app, request("DELETE", "/api/wishlist/11", Some(&bearer(5)), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
        let (_, mine) = send(&app, request("GET", "/api/wishlist", Some(&bearer(5)), None)).await;
        assert_eq!(mine["products"], json!([]));

        let (status, body) = send(&app, request("DELETE", "/api/wishlist/pearl-drops", Some(&bearer(5)), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_wishlist_requires_token() {
        let app = app(store());
        let (status, body) = send(&app, request("GET", "/api/wishlist", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");
        let (status, _) = send(&app, request("GET", "/api/wishlist", Some("Bearer garbage"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
