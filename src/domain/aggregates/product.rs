//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::domain::catalog::{GlobalMaterial, Material, MaterialCategory, MaterialOption, MetalRate};
use crate::domain::pricing::{PriceBreakup, PricingInput};
use crate::domain::value_objects::{Image, ProductSummary};

pub const DEFAULT_TAX_RATE: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub images: Vec<Image>,
    pub sub_heading: Option<String>,
    pub badge_tag: Option<String>,
    pub tag_line: Option<String>,
    pub category_id: i64,
    pub collection_id: i64,
    pub metal_rate_id: Option<i64>,
    pub trending_order: i32,
    pub listing_order: i32,
    pub mrp: Option<f64>,
    pub price: Option<f64>,
    pub discount: Option<f64>,
    pub offer_text: Option<String>,
    pub shortcode: Option<String>,
    pub active: bool,
    pub sizes: Value,
    pub description: Option<String>,
    pub product_details: Value,
    pub instructions: Option<String>,
    pub size_chart: Value,
    pub tax_rate: Option<f64>,
    pub is_tax_included: bool,
    pub meesho_link: Option<String>,
    pub flipkart_link: Option<String>,
    pub myntra_link: Option<String>,
    pub amazon_link: Option<String>,
    pub is_new_arrival: bool,
    pub units_sold: f64,
    pub making_charges: Option<f64>,
    pub product_summary: Value,
    pub metal_weight: Option<String>,
    pub gross_weight: Option<String>,
    pub metal_details: Option<String>,
    pub diamond_details: Option<String>,
    pub available_metals: Value,
    pub available_diamonds: Value,
    pub price_breakup: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn summary(&self) -> ProductSummary { ProductSummary::from_json(&self.product_summary) }

    /// String attribute from the free-form product details blob.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.product_details.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// String list attribute from the product details blob.
    pub fn detail_list(&self, key: &str) -> Vec<&str> {
        self.product_details
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn price_breakup_with(&self, linked: Option<&MetalRate>, rates: &[MetalRate]) -> PriceBreakup {
        PriceBreakup::calculate(&PricingInput {
            name: &self.name,
            summary: self.summary(),
            metal_weight: self.metal_weight.as_deref(),
            metal_details: self.metal_details.as_deref(),
            linked_rate: linked.map(|r| r.rate),
            rates,
            making_charges: self.making_charges,
            tax_rate: self.tax_rate,
            stored_price: self.price,
        })
    }

    /// Linked metal rate looked up from the full rate list.
    pub fn linked_rate<'a>(&self, rates: &'a [MetalRate]) -> Option<&'a MetalRate> {
        self.metal_rate_id.and_then(|id| rates.iter().find(|r| r.id == id))
    }

    pub fn resolve_images(&mut self, base_url: &str) {
        self.images = self.images.iter().map(|i| i.resolved(base_url)).collect();
    }

    /// Customisation options default to the linked global materials when none were set by hand.
    pub fn fill_material_options(&mut self, globals: &[GlobalMaterial]) {
        let options = |category: MaterialCategory| -> Value {
            let opts: Vec<MaterialOption> = globals.iter().filter(|m| m.category == category).map(MaterialOption::from).collect();
            serde_json::to_value(opts).unwrap_or(Value::Array(vec![]))
        };
        if is_blank_list(&self.available_metals) { self.available_metals = options(MaterialCategory::Metal); }
        if is_blank_list(&self.available_diamonds) { self.available_diamonds = options(MaterialCategory::Diamond); }
    }
}

fn is_blank_list(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Admin create/update payload. Absent fields are left untouched on update.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub slug: Option<String>,
    pub images: Option<Value>,
    pub sub_heading: Option<String>,
    pub badge_tag: Option<String>,
    pub tag_line: Option<String>,
    pub category_id: Option<i64>,
    pub collection_id: Option<i64>,
    pub metal_rate_id: Option<i64>,
    pub trending_order: Option<i32>,
    pub listing_order: Option<i32>,
    #[validate(range(min = 0.0))]
    pub mrp: Option<f64>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount: Option<f64>,
    pub offer_text: Option<String>,
    pub shortcode: Option<String>,
    pub active: Option<bool>,
    pub sizes: Option<Value>,
    pub description: Option<String>,
    pub product_details: Option<Value>,
    pub instructions: Option<String>,
    pub size_chart: Option<Value>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub tax_rate: Option<f64>,
    pub is_tax_included: Option<bool>,
    pub meesho_link: Option<String>,
    pub flipkart_link: Option<String>,
    pub myntra_link: Option<String>,
    pub amazon_link: Option<String>,
    pub is_new_arrival: Option<bool>,
    #[validate(range(min = 0.0))]
    pub making_charges: Option<f64>,
    pub product_summary: Option<Value>,
    pub metal_weight: Option<String>,
    pub gross_weight: Option<String>,
    pub metal_details: Option<String>,
    pub diamond_details: Option<String>,
    pub available_metals: Option<Value>,
    pub available_diamonds: Option<Value>,
    pub price_breakup: Option<Value>,
}

impl ProductInput {
    /// Fields a new product cannot do without.
    pub fn missing_required(&self) -> Option<&'static str> {
        if self.name.as_deref().map_or(true, str::is_empty) { return Some("name"); }
        if self.category_id.is_none() { return Some("categoryId"); }
        if self.collection_id.is_none() { return Some("collectionId"); }
        None
    }
}

/// Product with the materials it is linked to, as listed in the storefront.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub materials: Vec<Material>,
    pub global_materials: Vec<GlobalMaterial>,
}

impl ProductListing {
    pub fn bare(product: Product) -> Self { Self { product, materials: vec![], global_materials: vec![] } }
}

/// Product page payload.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub listing: ProductListing,
    pub metal_rate: Option<MetalRate>,
    pub metal_rates: Vec<MetalRate>,
    pub current_price: String,
    pub original_price: String,
    pub price_breakdown: PriceBreakup,
    pub you_may_also_like: Vec<Value>,
    pub included_with_purchase: Vec<Value>,
    pub badges: Vec<Value>,
    pub reviews: Vec<Value>,
}

impl ProductDetail {
    pub fn build(mut listing: ProductListing, metal_rates: Vec<MetalRate>, image_base_url: &str) -> Self {
        listing.product.resolve_images(image_base_url);
        listing.product.fill_material_options(&listing.global_materials);

        let metal_rate = listing.product.linked_rate(&metal_rates).cloned();
        let price_breakdown = listing.product.price_breakup_with(metal_rate.as_ref(), &metal_rates);
        let current_price = price_text(listing.product.price);
        let original_price = price_text(listing.product.mrp);

        Self {
            listing, metal_rate, metal_rates, current_price, original_price, price_breakdown,
            you_may_also_like: vec![], included_with_purchase: vec![], badges: vec![], reviews: vec![],
        }
    }
}

fn price_text(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 && v.is_finite() => v.to_string(),
        _ => "0".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    pub(crate) fn sample_product(id: i64, name: &str) -> Product {
        let now = Utc::now();
        Product {
            id, name: name.into(), slug: Some(crate::domain::value_objects::slugify(name)),
            images: vec![Image { src: "ring.jpg".into(), alt: name.into() }],
            sub_heading: None, badge_tag: None, tag_line: None,
            category_id: 1, collection_id: 1, metal_rate_id: None,
            trending_order: 0, listing_order: 0,
            mrp: Some(12000.0), price: Some(10000.0), discount: Some(0.0),
            offer_text: None, shortcode: None, active: true,
            sizes: json!([]), description: None, product_details: Value::Null,
            instructions: None, size_chart: Value::Null,
            tax_rate: Some(DEFAULT_TAX_RATE), is_tax_included: true,
            meesho_link: None, flipkart_link: None, myntra_link: None, amazon_link: None,
            is_new_arrival: false, units_sold: 0.0, making_charges: Some(0.0),
            product_summary: Value::Null, metal_weight: None, gross_weight: None,
            metal_details: None, diamond_details: None,
            available_metals: json!([]), available_diamonds: json!([]), price_breakup: json!([]),
            created_at: now, updated_at: now,
        }
    }

    #[test]
    fn test_detail_uses_linked_rate() {
        let mut p = sample_product(7, "Gold Hoop");
        p.metal_rate_id = Some(2);
        p.metal_weight = Some("2 g".into());
        p.making_charges = Some(1000.0);
        p.tax_rate = Some(3.0);
        let rates = vec![
            MetalRate { id: 1, name: "Silver".into(), rate: Decimal::new(90, 0), updated_at: Utc::now() },
            MetalRate { id: 2, name: "Gold 18K".into(), rate: Decimal::new(5000, 0), updated_at: Utc::now() },
        ];
        let detail = ProductDetail::build(ProductListing::bare(p), rates, "https://cdn.test");
        assert_eq!(detail.metal_rate.as_ref().map(|r| r.id), Some(2));
        assert_eq!(detail.price_breakdown.total, 11330);
        assert_eq!(detail.current_price, "10000");
        assert_eq!(detail.listing.product.images[0].src, "https://cdn.test/images/ring.jpg");

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["priceBreakdown"]["total"], 11330);
        assert_eq!(json["currentPrice"], "10000");
        assert_eq!(json["name"], "Gold Hoop");
    }

    #[test]
    fn test_material_options_filled_only_when_blank() {
        let mut p = sample_product(1, "Band");
        p.available_diamonds = json!([{"id": "vvs", "name": "VVS"}]);
        let globals = vec![
            GlobalMaterial { id: 1, name: "Yellow Gold".into(), active: true, category: MaterialCategory::Metal },
            GlobalMaterial { id: 2, name: "SI IJ".into(), active: true, category: MaterialCategory::Diamond },
        ];
        p.fill_material_options(&globals);
        assert_eq!(p.available_metals, json!([{"id": "yellow-gold", "name": "Yellow Gold"}]));
        assert_eq!(p.available_diamonds, json!([{"id": "vvs", "name": "VVS"}]));
    }

    #[test]
    fn test_required_fields() {
        let input = ProductInput { name: Some("Stud".into()), category_id: Some(1), ..Default::default() };
        assert_eq!(input.missing_required(), Some("collectionId"));
    }
}
