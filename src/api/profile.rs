use axum::{extract::State, Json};
use serde::Serialize;
use validator::Validate;

use super::auth::CurrentUser;
use super::error::ApiResult;
use super::{AppState, Body};
use crate::domain::aggregates::{ProfileUpdate, User};
use crate::ShopError;

#[derive(Debug, Serialize)]
pub struct ProfileView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub profile: User,
}

pub async fn get_profile(user: CurrentUser, State(state): State<AppState>) -> ApiResult<Json<ProfileView>> {
    let profile = state.store.find_user(user.id()).await?.ok_or(ShopError::UserNotFound)?;
    Ok(Json(ProfileView { message: None, profile }))
}

pub async fn update_profile(
    user: CurrentUser,
    State(state): State<AppState>,
    Body(update): Body<ProfileUpdate>,
) -> ApiResult<Json<ProfileView>> {
    update.validate()?;
    let profile = state.store.update_profile(user.id(), update).await?.ok_or(ShopError::UserNotFound)?;
    Ok(Json(ProfileView { message: Some("Profile updated successfully"), profile }))
}
