//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::{Result, ShopError};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub address: Address,
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line as captured at checkout; prices are fixed at the time of the order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: f64,
    pub total: f64,
}

impl LineItem {
    pub fn new(product_id: i64, name: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        Self {
            product_id, name: name.into(), slug: None, image: None, size: None,
            quantity, unit_price, total: unit_price * f64::from(quantity),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub line1: String,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub city: String,
    #[validate(length(min = 1, max = 80))]
    pub state: String,
    #[validate(length(min = 4, max = 10))]
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String { "India".to_string() }

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "Processing")]
    Processing,
    #[serde(alias = "Shipped")]
    Shipped,
    #[serde(alias = "Delivered")]
    Delivered,
    #[serde(alias = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (*self, next),
            (Pending, Processing) | (Pending, Cancelled) | (Processing, Shipped) | (Processing, Cancelled) | (Shipped, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ShopError::UnknownStatus(other.to_string())),
        }
    }
}

/// Order ready to be persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub user_id: i64,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub address: Address,
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
}

impl Order {
    pub fn place(user_id: i64, items: Vec<LineItem>, address: Address, payment_method: Option<String>, payment_id: Option<String>) -> Result<NewOrder> {
        if items.is_empty() { return Err(ShopError::EmptyOrder); }
        let total: f64 = items.iter().map(|i| i.total).sum();
        Ok(NewOrder { user_id, items, total, address, payment_method, payment_id })
    }

    pub fn transition(&mut self, next: OrderStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ShopError::InvalidTransition { from: self.status.to_string(), to: next.to_string() });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> { self.transition(OrderStatus::Cancelled) }

    pub fn is_owned_by(&self, user_id: i64) -> bool { self.user_id == user_id }
}
