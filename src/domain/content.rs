//! Site content: home page sections, CMS pages, settings, footer, and customer enquiries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::domain::catalog::{Banner, Category, Collection};
use crate::domain::value_objects::{blank_as_none, resolve_image_url, resolve_optional};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: i64,
    pub contact_number: Option<String>,
    pub contact_timing: Option<String>,
    pub support_email: Option<String>,
    pub facebook_link: Option<String>,
    pub instagram_link: Option<String>,
    pub twitter_link: Option<String>,
    pub youtube_link: Option<String>,
    pub pinterest_link: Option<String>,
    pub whatsapp_link: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterLink {
    pub label: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterConfig {
    pub id: i64,
    pub title: String,
    pub priority: i32,
    pub active: bool,
    pub links: Vec<FooterLink>,
}

/// Footer links column; rows that are not `{label, url}` are skipped.
pub fn footer_links(raw: &Value) -> Vec<FooterLink> {
    raw.as_array()
        .map(|items| items.iter().filter_map(|i| serde_json::from_value(i.clone()).ok()).collect())
        .unwrap_or_default()
}

/// Singleton home page configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeData {
    pub id: i64,
    pub youtube_video_url: Option<String>,
    pub explore_url: Option<String>,
    pub text: Option<String>,
    pub other_banner_image: Option<String>,
    pub feed_images: Value,
    pub feed_videos: Value,
    pub gift_section_bg: Option<String>,
    pub store_section_bg: Option<String>,
    pub sparkle_seeker_config: Value,
    pub traditional_section_config: Value,
    pub modern_section_config: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    pub title: Option<String>,
    pub youtube_url: Option<String>,
    pub video_file: Option<String>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SectionImage {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub active: bool,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HomeGift {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub active: bool,
    #[sqlx(rename = "sort_order")]
    pub order: i32,
}

/// Everything the home page renders, fetched in one go.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeContent {
    pub banners: Vec<Banner>,
    pub sub_banners: Vec<Banner>,
    pub categories: Vec<Category>,
    pub collections: Vec<Collection>,
    pub section_images: Vec<SectionImage>,
    pub gifts: Vec<HomeGift>,
    pub videos: Vec<Video>,
    pub home_data: Option<HomeData>,
}

impl HomeContent {
    pub fn resolve_images(mut self, base_url: &str) -> Self {
        let resolve = |image: &mut Option<String>| *image = resolve_optional(base_url, image.as_deref());
        self.banners.iter_mut().chain(self.sub_banners.iter_mut()).for_each(|b| resolve(&mut b.image));
        self.categories.iter_mut().for_each(|c| resolve(&mut c.image));
        self.section_images.iter_mut().for_each(|s| s.image = resolve_image_url(base_url, &s.image));
        self.videos.iter_mut().for_each(|v| resolve(&mut v.video_file));
        if let Some(home) = self.home_data.as_mut() {
            resolve(&mut home.other_banner_image);
            resolve(&mut home.gift_section_bg);
            resolve(&mut home.store_section_bg);
        }
        self
    }
}

// =============================================================================
// Enquiries
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnquiryStatus {
    #[default]
    New,
    Contacted,
    Confirmed,
    Cancelled,
    Closed,
}

impl EnquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
            Self::Closed => "Closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "New" => Some(Self::New),
            "Contacted" => Some(Self::Contacted),
            "Confirmed" => Some(Self::Confirmed),
            "Cancelled" => Some(Self::Cancelled),
            "Closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Inquiries only move between New, Contacted and Closed.
    pub fn applies_to_inquiry(&self) -> bool { matches!(self, Self::New | Self::Contacted | Self::Closed) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InquiryKind {
    #[default]
    Chat,
    Call,
}

impl InquiryKind {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Chat => "Chat", Self::Call => "Call" }
    }

    pub fn parse(value: &str) -> Self { if value == "Call" { Self::Call } else { Self::Chat } }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: InquiryKind,
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct NewInquiry {
    #[serde(default)]
    #[validate(length(max = 120))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 2000))]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: InquiryKind,
}

impl NewInquiry {
    pub fn has_contact(&self) -> bool { !self.name.trim().is_empty() && !self.phone.trim().is_empty() }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub date: String,
    pub time: String,
    pub message: Option<String>,
    pub status: EnquiryStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct NewAppointment {
    #[serde(default)]
    #[validate(length(max = 120))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub phone: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub date: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub time: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

impl NewAppointment {
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.phone, &self.date, &self.time].iter().all(|f| !f.trim().is_empty())
    }
}
