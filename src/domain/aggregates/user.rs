//! Customer profile

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub alternate_phone: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub anniversary: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable profile fields; absent fields keep their stored value.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(max = 80))]
    pub first_name: Option<String>,
    #[validate(length(max = 80))]
    pub last_name: Option<String>,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 7, max = 20))]
    pub alternate_phone: Option<String>,
    #[validate(length(max = 20))]
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub anniversary: Option<NaiveDate>,
}

impl User {
    pub fn apply(&mut self, update: ProfileUpdate) {
        let ProfileUpdate { first_name, last_name, phone, alternate_phone, gender, dob, anniversary } = update;
        if first_name.is_some() { self.first_name = first_name; }
        if last_name.is_some() { self.last_name = last_name; }
        if phone.is_some() { self.phone = phone; }
        if alternate_phone.is_some() { self.alternate_phone = alternate_phone; }
        if gender.is_some() { self.gender = gender; }
        if dob.is_some() { self.dob = dob; }
        if anniversary.is_some() { self.anniversary = anniversary; }
        self.updated_at = Utc::now();
    }
}
