//! Checkout and order history.
//!
//! Line prices are never taken from the client: each line is priced from the
//! product's current breakup at the moment the order is placed.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;
use validator::Validate;

use super::auth::{AdminUser, CurrentUser};
use super::error::ApiResult;
use super::{AppState, Body, Path, StatusUpdate};
use crate::domain::aggregates::{Address, LineItem, Order, OrderStatus};
use crate::domain::value_objects::resolve_image_url;
use crate::ShopError;

fn one() -> u32 { 1 }

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: i64,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 100))]
    pub quantity: u32,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[validate(length(min = 1, max = 50))]
    pub items: Vec<OrderLine>,
    pub address: Address,
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
}

impl PlaceOrder {
    fn validate_all(&self) -> Result<(), validator::ValidationErrors> {
        self.validate()?;
        self.address.validate()?;
        self.items.iter().try_for_each(|line| line.validate())
    }
}

pub async fn place(
    user: CurrentUser,
    State(state): State<AppState>,
    Body(body): Body<PlaceOrder>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    body.validate_all()?;

    let ids: Vec<i64> = body.items.iter().map(|l| l.product_id).collect();
    let products = state.store.products_by_ids(&ids).await?;
    let rates = state.store.metal_rates().await?;

    let mut lines = Vec::with_capacity(body.items.len());
    for line in body.items {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id && p.active)
            .ok_or(ShopError::ProductUnavailable(line.product_id))?;
        let unit_price = product.price_breakup_with(product.linked_rate(&rates), &rates).unit_price();

        let mut item = LineItem::new(product.id, product.name.clone(), line.quantity, unit_price);
        item.slug = product.slug.clone();
        item.image = product.images.first().map(|i| resolve_image_url(state.image_base(), &i.src));
        item.size = line.size;
        lines.push(item);
    }

    let new_order = Order::place(user.id(), lines, body.address, body.payment_method, body.payment_id)?;
    let order = state.store.create_order(new_order).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list(user: CurrentUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.store.orders_for_user(user.id()).await?))
}

/// Customers only see their own orders; admins see any.
async fn visible_order(state: &AppState, user: &CurrentUser, id: i64) -> ApiResult<Order> {
    let order = state.store.find_order(id).await?.ok_or(ShopError::OrderNotFound)?;
    if !order.is_owned_by(user.id()) && !user.is_admin() {
        return Err(ShopError::OrderNotFound.into());
    }
    Ok(order)
}

pub async fn get_order(user: CurrentUser, State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Order>> {
    Ok(Json(visible_order(&state, &user, id).await?))
}

pub async fn cancel(user: CurrentUser, State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Order>> {
    let mut order = visible_order(&state, &user, id).await?;
    let from = order.status;
    order.cancel()?;
    state.store.set_order_status(id, from, order.status).await?;
    info!(order_id = id, user_id = user.id(), "Order cancelled");
    Ok(Json(order))
}

pub async fn set_status(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Body(update): Body<StatusUpdate>,
) -> ApiResult<Json<Order>> {
    let next = OrderStatus::from_str(update.status.trim())?;
    let mut order = state.store.find_order(id).await?.ok_or(ShopError::OrderNotFound)?;
    let from = order.status;
    order.transition(next)?;
    state.store.set_order_status(id, from, next).await?;
    info!(order_id = id, status = %next, admin_id = admin.0.id, "Order status changed");
    Ok(Json(order))
}
