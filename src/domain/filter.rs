//! Category page filters.
//!
//! Price constraints are pushed down to the database; material, style and
//! occasion facets live in relations and free-form product details, so they
//! are applied to the fetched listings.

use serde::Deserialize;
use std::str::FromStr;

use crate::domain::aggregates::ProductListing;
use crate::domain::value_objects::split_tokens;

/// Query string of `GET /api/categories/:slug`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    pub price: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub material: Option<String>,
    pub style: Option<String>,
    pub occasion: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceBand {
    Under5000,
    From5000To10000,
    From10000To20000,
    Above20000,
}

/// One side of a price range: the limit and whether it is inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

impl PriceBand {
    pub fn lower(&self) -> Option<Bound> {
        match self {
            Self::Under5000 => None,
            Self::From5000To10000 => Some(Bound { value: 5000.0, inclusive: true }),
            Self::From10000To20000 => Some(Bound { value: 10000.0, inclusive: true }),
            Self::Above20000 => Some(Bound { value: 20000.0, inclusive: false }),
        }
    }

    pub fn upper(&self) -> Option<Bound> {
        match self {
            Self::Under5000 => Some(Bound { value: 5000.0, inclusive: false }),
            Self::From5000To10000 => Some(Bound { value: 10000.0, inclusive: true }),
            Self::From10000To20000 => Some(Bound { value: 20000.0, inclusive: true }),
            Self::Above20000 => None,
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        let above = self.lower().map_or(true, |b| if b.inclusive { price >= b.value } else { price > b.value });
        let below = self.upper().map_or(true, |b| if b.inclusive { price <= b.value } else { price < b.value });
        above && below
    }
}

impl FromStr for PriceBand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "under-5000" => Ok(Self::Under5000),
            "5000-10000" => Ok(Self::From5000To10000),
            "10000-20000" => Ok(Self::From10000To20000),
            "above-20000" => Ok(Self::Above20000),
            _ => Err(()),
        }
    }
}

/// Bands are alternatives; `min`/`max` narrow whatever the bands allow.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceFilter {
    pub bands: Vec<PriceBand>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceFilter {
    pub fn is_empty(&self) -> bool { self.bands.is_empty() && self.min.is_none() && self.max.is_none() }

    pub fn matches(&self, price: Option<f64>) -> bool {
        if self.is_empty() { return true; }
        let Some(price) = price else { return false };
        let in_band = self.bands.is_empty() || self.bands.iter().any(|b| b.contains(price));
        in_band && self.min.map_or(true, |m| price >= m) && self.max.map_or(true, |m| price <= m)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeFilter {
    pub materials: Vec<String>,
    pub styles: Vec<String>,
    pub occasions: Vec<String>,
}

impl AttributeFilter {
    pub fn is_empty(&self) -> bool { self.materials.is_empty() && self.styles.is_empty() && self.occasions.is_empty() }

    pub fn matches(&self, listing: &ProductListing) -> bool {
        self.matches_material(listing) && self.matches_style(listing) && self.matches_occasion(listing)
    }

    fn matches_material(&self, listing: &ProductListing) -> bool {
        if self.materials.is_empty() { return true; }
        let wanted = |name: &str| self.materials.contains(&name.to_lowercase());
        listing.materials.iter().any(|m| wanted(&m.name))
            || listing.global_materials.iter().any(|m| wanted(&m.name))
            || listing.product.detail("material").map_or(false, wanted)
    }

    fn matches_style(&self, listing: &ProductListing) -> bool {
        if self.styles.is_empty() { return true; }
        listing.product.detail("style").map_or(false, |s| self.styles.contains(&s.to_lowercase()))
    }

    fn matches_occasion(&self, listing: &ProductListing) -> bool {
        if self.occasions.is_empty() { return true; }
        let wanted = |name: &str| self.occasions.contains(&name.to_lowercase());
        listing.product.detail("occasion").map_or(false, wanted)
            || listing.product.detail_list("occasions").into_iter().any(wanted)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryFilter {
    pub price: PriceFilter,
    pub attributes: AttributeFilter,
}

impl CategoryFilter {
    pub fn from_query(query: &CategoryQuery) -> Self {
        let bands = split_tokens(query.price.as_deref()).iter().filter_map(|t| t.parse().ok()).collect();
        Self {
            price: PriceFilter { bands, min: parse_bound(query.min_price.as_deref()), max: parse_bound(query.max_price.as_deref()) },
            attributes: AttributeFilter {
                materials: split_tokens(query.material.as_deref()),
                styles: split_tokens(query.style.as_deref()),
                occasions: split_tokens(query.occasion.as_deref()),
            },
        }
    }

    /// Drops listings the attribute facets reject.
    pub fn apply(&self, listings: Vec<ProductListing>) -> Vec<ProductListing> {
        if self.attributes.is_empty() { return listings; }
        listings.into_iter().filter(|l| self.attributes.matches(l)).collect()
    }
}

fn parse_bound(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok()).filter(|v| v.is_finite())
}
