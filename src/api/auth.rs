//! Bearer token extractors.
//!
//! Tokens are HS256 JWTs carrying `{id, role?, exp}`; `role == "admin"`
//! unlocks the back-office routes.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{error::ApiError, AppState};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool { self.role.as_deref() == Some("admin") }
}

/// Any signed-in customer.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    pub fn id(&self) -> i64 { self.0.id }

    pub fn is_admin(&self) -> bool { self.0.is_admin() }
}

/// Signed-in user with the admin role.
#[derive(Clone, Debug)]
pub struct AdminUser(pub Claims);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::Unauthorized("Authentication required"))?;
        let data = decode::<Claims>(token, &state.jwt, &Validation::new(Algorithm::HS256)).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized("Invalid or expired token")
        })?;
        Ok(Self(data.claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            debug!(user_id = claims.id, "Non-admin hit an admin route");
            return Err(ApiError::Forbidden);
        }
        Ok(Self(claims))
    }
}
