//! Value Objects for the catalog

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

pub const PLACEHOLDER_IMAGE: &str = "/placeholder.jpg";
const DEFAULT_ALT: &str = "Product Image";

/// Image reference as served to the storefront
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
}

impl Image {
    pub fn placeholder(name: &str) -> Self {
        Self { src: PLACEHOLDER_IMAGE.to_string(), alt: alt_for(name) }
    }

    pub fn resolved(&self, base_url: &str) -> Self {
        Self { src: resolve_image_url(base_url, &self.src), alt: self.alt.clone() }
    }
}

fn alt_for(name: &str) -> String {
    if name.is_empty() { DEFAULT_ALT.to_string() } else { name.to_string() }
}

/// Decodes the stored images column into `{src, alt}` pairs.
///
/// The column has held several shapes over time: a JSON array of paths, an
/// array of `{src, alt}` objects, a single object, or any of those encoded as
/// a JSON string. Unusable data collapses to a single placeholder image.
pub fn normalize_images(raw: &Value, name: &str) -> Vec<Image> {
    match raw {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::String(path)) => vec![Image { src: path, alt: alt_for(name) }],
            Ok(parsed) => normalize_images(&parsed, name),
            Err(_) => vec![Image::placeholder(name)],
        },
        Value::Array(items) => items.iter().map(|item| image_entry(item, name)).collect(),
        Value::Object(_) => vec![image_entry(raw, name)],
        _ => vec![Image::placeholder(name)],
    }
}

fn image_entry(item: &Value, name: &str) -> Image {
    match item {
        Value::String(src) => Image { src: src.clone(), alt: alt_for(name) },
        Value::Object(obj) => Image {
            src: non_empty_str(obj.get("src")).unwrap_or(PLACEHOLDER_IMAGE).to_string(),
            alt: non_empty_str(obj.get("alt")).map(str::to_string).unwrap_or_else(|| alt_for(name)),
        },
        _ => Image::placeholder(name),
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Turns a stored image path into an absolute URL under `base_url`.
pub fn resolve_image_url(base_url: &str, url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else if url.starts_with("/images/") {
        format!("{base}{url}")
    } else if url.starts_with("images/") {
        format!("{base}/{url}")
    } else if !url.contains('/') {
        format!("{base}/images/{url}")
    } else {
        url.to_string()
    }
}

pub fn resolve_optional(base_url: &str, url: Option<&str>) -> Option<String> {
    url.map(|u| resolve_image_url(base_url, u))
}

/// Lowercase, whitespace runs collapsed to `-`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace().map(str::to_lowercase).collect::<Vec<_>>().join("-")
}

/// First decimal number in a free-text weight such as `"5.2 g"` or `"Net 3g"`.
pub fn parse_weight(text: &str) -> Option<Decimal> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let re = NUMBER.get_or_init(|| Regex::new(r"\d+(\.\d+)?").expect("static regex"));
    re.find(text).and_then(|m| Decimal::from_str(m.as_str()).ok())
}

/// Product summary as a case-insensitive key/value table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductSummary(BTreeMap<String, String>);

impl ProductSummary {
    /// Accepts an object, an array of `{key, value}` rows, or either encoded as a JSON string.
    pub fn from_json(raw: &Value) -> Self {
        let mut map = BTreeMap::new();
        match raw {
            Value::String(text) => {
                return serde_json::from_str::<Value>(text)
                    .map(|parsed| if parsed.is_string() { Self::default() } else { Self::from_json(&parsed) })
                    .unwrap_or_default();
            }
            Value::Array(rows) => {
                for row in rows {
                    let key = row.get("key").map(scalar_text).unwrap_or_default();
                    let value = row.get("value").map(scalar_text).unwrap_or_default();
                    if !key.is_empty() { map.insert(key.to_lowercase(), value); }
                }
            }
            Value::Object(obj) => {
                for (key, value) in obj {
                    map.insert(key.to_lowercase(), scalar_text(value));
                }
            }
            _ => {}
        }
        Self(map)
    }

    /// Value of the first of `keys` present, compared case-insensitively.
    /// A present key with a blank value still stops the search.
    pub fn read(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.0.get(&k.to_lowercase())).map(String::as_str)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reads a JSON column that may have been stored as an encoded string.
pub fn decode_json(raw: Value) -> Value {
    match raw {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

/// Optional form field where an empty or whitespace-only string means absent.
pub fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// Comma-separated facet tokens, lowercased with blanks dropped.
pub fn split_tokens(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| s.split(',').map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty()).collect())
        .unwrap_or_default()
}
