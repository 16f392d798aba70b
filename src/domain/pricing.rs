//! Price breakup for weight-priced jewellery.
//!
//! A product whose metal weight and metal rate are both known is priced live:
//! metal cost (weight x rate) plus making charges, with tax charged on the sum.
//! Anything else falls back to the price stored on the product.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::domain::catalog::MetalRate;
use crate::domain::value_objects::{parse_weight, ProductSummary};

/// Summary keys that may carry the metal weight, in lookup order.
pub const WEIGHT_KEYS: [&str; 5] = ["metalWeight", "metal weight", "weight", "net weight", "gold weight"];

#[derive(Clone, Debug)]
pub struct PricingInput<'a> {
    pub name: &'a str,
    pub summary: ProductSummary,
    pub metal_weight: Option<&'a str>,
    pub metal_details: Option<&'a str>,
    pub linked_rate: Option<Decimal>,
    pub rates: &'a [MetalRate],
    pub making_charges: Option<f64>,
    pub tax_rate: Option<f64>,
    pub stored_price: Option<f64>,
}

/// Itemised price in whole rupees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakup {
    pub metal: i64,
    pub making_charges: i64,
    pub tax: i64,
    pub total: i64,
    pub dynamic: bool,
}

impl PriceBreakup {
    pub fn calculate(input: &PricingInput<'_>) -> Self {
        let weight = metal_weight(input).unwrap_or(Decimal::ZERO);
        let rate = select_rate(input);
        let making = to_decimal(input.making_charges);

        if weight > Decimal::ZERO && rate > Decimal::ZERO {
            let metal = weight * rate;
            let base = metal + making;
            let tax = base * to_decimal(input.tax_rate) / Decimal::ONE_HUNDRED;
            Self {
                metal: round(metal),
                making_charges: round(making),
                tax: round(tax),
                total: round(base + tax),
                dynamic: true,
            }
        } else {
            Self {
                metal: 0,
                making_charges: round(making),
                tax: 0,
                total: round(to_decimal(input.stored_price)),
                dynamic: false,
            }
        }
    }

    /// Price charged per unit at checkout.
    pub fn unit_price(&self) -> f64 { self.total as f64 }
}

fn metal_weight(input: &PricingInput<'_>) -> Option<Decimal> {
    let text = input
        .summary
        .read(&WEIGHT_KEYS)
        .filter(|s| !s.trim().is_empty())
        .or(input.metal_weight)
        .map(str::trim)
        .filter(|s| !s.is_empty())?;
    parse_weight(text)
}

/// Linked rate first, then a rate matched from the metal named in the details or product name.
fn select_rate(input: &PricingInput<'_>) -> Decimal {
    if let Some(rate) = input.linked_rate.filter(|r| *r > Decimal::ZERO) {
        return rate;
    }

    let details = input.metal_details.unwrap_or_default().to_lowercase();
    let name = input.name.to_lowercase();
    let mentions = |metal: &str| details.contains(metal) || name.contains(metal);
    let rate_for = |metal: &str| {
        input.rates.iter().find(|r| r.name.to_lowercase().contains(metal)).map(|r| r.rate).unwrap_or_default()
    };

    let matched = if mentions("gold") {
        rate_for("gold")
    } else if mentions("silver") {
        rate_for("silver")
    } else {
        Decimal::ZERO
    };

    match input.rates.first() {
        Some(first) if matched.is_zero() => first.rate,
        _ => matched,
    }
}

fn to_decimal(value: Option<f64>) -> Decimal {
    value.and_then(Decimal::from_f64).unwrap_or_default()
}

fn round(value: Decimal) -> i64 {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero).to_i64().unwrap_or_default()
}
