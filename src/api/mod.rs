//! HTTP surface: router, shared state and the handlers behind each route.

use axum::{
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::Config;
use crate::store::Store;

pub mod auth;
mod catalog;
mod content;
pub mod error;
mod orders;
mod profile;
mod wishlist;

use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub jwt: DecodingKey,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let jwt = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        Self { store, config: Arc::new(config), jwt }
    }

    pub(crate) fn image_base(&self) -> &str { &self.config.image_base_url }
}

/// JSON body whose rejections render as `{"error": ...}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Body<T>(pub T);

/// Path parameters; a segment that does not parse is a JSON 400.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub status: String,
}

pub fn router(state: AppState) -> Router {
    let images = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("cross-origin"),
        ))
        .service(ServeDir::new(&state.config.images_dir));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        // Catalog
        .route("/api/products", get(catalog::list_products).post(catalog::create_product))
        .route("/api/products/slug/:slug", get(catalog::product_by_slug))
        .route("/api/products/:id", put(catalog::update_product).delete(catalog::delete_product))
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/categories/:slug", get(catalog::category_page))
        .route("/api/collections", get(catalog::list_collections))
        .route("/api/metal-rates", get(catalog::metal_rates))
        .route("/api/metal-rates/:id", put(catalog::update_metal_rate))
        .route("/api/mega-menu", get(catalog::mega_menu))
        .route("/api/mega-menu/shop-for/:id", get(catalog::shop_for))
        // Customer
        .route("/api/wishlist", get(wishlist::list).post(wishlist::add))
        .route("/api/wishlist/:product_id", axum::routing::delete(wishlist::remove))
        .route("/api/orders", get(orders::list).post(orders::place))
        .route("/api/orders/:id", get(orders::get_order))
        .route("/api/orders/:id/cancel", post(orders::cancel))
        .route("/api/orders/:id/status", patch(orders::set_status))
        .route("/api/profile", get(profile::get_profile).put(profile::update_profile))
        // Content
        .route("/api/home", get(content::home))
        .route("/api/pages/:slug", get(content::page))
        .route("/api/settings", get(content::settings))
        .route("/api/footer-configs", get(content::footer_configs))
        .route("/api/inquiries", get(content::list_inquiries).post(content::create_inquiry))
        .route("/api/inquiries/:id/status", patch(content::set_inquiry_status))
        .route("/api/appointments", get(content::list_appointments).post(content::create_appointment))
        .route("/api/appointments/:id/status", patch(content::set_appointment_status))
        .nest_service("/images", images)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn welcome() -> &'static str { "Welcome to the Vimal Jewellers API" }

async fn health(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => Json(json!({"status": "healthy", "database": "connected"})).into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "unhealthy", "database": "disconnected"}))).into_response()
        }
    }
}

async fn not_found() -> (StatusCode, &'static str) { (StatusCode::NOT_FOUND, "404: Route not found") }
