//! Catalog reference data: categories, collections, metal rates, materials and the mega menu.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{resolve_optional, slugify};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category page header: the category plus the banner pointing at it.
#[derive(Clone, Debug, Serialize)]
pub struct CategoryWithBanner {
    #[serde(flatten)]
    pub category: Category,
    pub banner: Option<String>,
}

impl CategoryWithBanner {
    /// Banner URL a category page looks up.
    pub fn banner_url(slug: &str) -> String { format!("/category/{slug}") }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: i64,
    pub title: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MetalRate {
    pub id: i64,
    pub name: String,
    pub rate: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialCategory {
    #[default]
    Metal,
    Diamond,
    Gemstone,
    Other,
}

impl MaterialCategory {
    pub fn parse(value: &str) -> Self {
        match value {
            "Diamond" => Self::Diamond,
            "Gemstone" => Self::Gemstone,
            "Other" => Self::Other,
            _ => Self::Metal,
        }
    }
}

/// Store-wide customisation option (metal, diamond grade, stone).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalMaterial {
    pub id: i64,
    pub name: String,
    pub active: bool,
    pub category: MaterialCategory,
}

/// Option shown in the product page metal/diamond pickers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialOption {
    pub id: String,
    pub name: String,
}

impl From<&GlobalMaterial> for MaterialOption {
    fn from(m: &GlobalMaterial) -> Self { Self { id: slugify(&m.name), name: m.name.clone() } }
}

// =============================================================================
// Mega menu
// =============================================================================

/// Style, material or occasion entry under a mega category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub mega_category_id: i64,
    #[serde(skip_deserializing)]
    #[sqlx(skip)]
    pub icon: Option<String>,
}

impl MenuEntry {
    fn resolve_icon(&mut self, base_url: &str) { self.icon = resolve_optional(base_url, self.image.as_deref()); }
}

/// Material linked to products, shown under a mega category.
pub type Material = MenuEntry;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShopFor {
    pub id: i64,
    pub name: String,
    pub start_price: Option<f64>,
    pub end_price: Option<f64>,
    pub active: bool,
    pub mega_category_id: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MegaCategory {
    pub id: i64,
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub styles: Vec<MenuEntry>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub shop_fors: Vec<ShopFor>,
    #[serde(default, rename = "occassions")]
    pub occasions: Vec<MenuEntry>,
}

impl MegaCategory {
    /// Fills `icon` on every style, material and occasion.
    pub fn resolve_icons(&mut self, base_url: &str) {
        self.styles.iter_mut()
            .chain(self.materials.iter_mut())
            .chain(self.occasions.iter_mut())
            .for_each(|entry| entry.resolve_icon(base_url));
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopForDetail {
    #[serde(flatten)]
    pub shop_for: ShopFor,
    pub shop_for_mega_category: Option<MegaCategory>,
}
