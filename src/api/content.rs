//! Home page, CMS pages, site settings, footer, inquiries and appointments.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::info;
use validator::Validate;

use super::auth::AdminUser;
use super::error::{ApiError, ApiResult};
use super::{AppState, Body, Path, StatusUpdate};
use crate::domain::content::{Appointment, EnquiryStatus, FooterConfig, HomeContent, Inquiry, NewAppointment, NewInquiry, Page};
use crate::ShopError;

pub async fn home(State(state): State<AppState>) -> ApiResult<Json<HomeContent>> {
    Ok(Json(state.store.home().await?.resolve_images(state.image_base())))
}

pub async fn page(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Json<Page>> {
    Ok(Json(state.store.find_page(&slug).await?.ok_or(ShopError::PageNotFound)?))
}

/// The settings row, or `{}` before one has been saved.
pub async fn settings(State(state): State<AppState>) -> ApiResult<Response> {
    Ok(match state.store.settings().await? {
        Some(settings) => Json(settings).into_response(),
        None => Json(json!({})).into_response(),
    })
}

pub async fn footer_configs(State(state): State<AppState>) -> ApiResult<Json<Vec<FooterConfig>>> {
    Ok(Json(state.store.footer_configs().await?))
}

pub async fn create_inquiry(State(state): State<AppState>, Body(inquiry): Body<NewInquiry>) -> ApiResult<(StatusCode, Json<Inquiry>)> {
    if !inquiry.has_contact() {
        return Err(ApiError::BadRequest("Name and phone are required".into()));
    }
    inquiry.validate()?;
    let inquiry = state.store.create_inquiry(inquiry).await?;
    Ok((StatusCode::CREATED, Json(inquiry)))
}

pub async fn list_inquiries(_admin: AdminUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Inquiry>>> {
    Ok(Json(state.store.list_inquiries().await?))
}

pub async fn set_inquiry_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Body(update): Body<StatusUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    let status = EnquiryStatus::parse(update.status.trim())
        .filter(EnquiryStatus::applies_to_inquiry)
        .ok_or_else(|| ShopError::UnknownStatus(update.status.clone()))?;
    if !state.store.set_inquiry_status(id, status).await? {
        return Err(ShopError::RecordNotFound.into());
    }
    info!(inquiry_id = id, status = status.as_str(), "Inquiry status changed");
    Ok(Json(json!({ "success": true, "status": status })))
}

pub async fn create_appointment(
    State(state): State<AppState>,
    Body(appointment): Body<NewAppointment>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    if !appointment.is_complete() {
        return Err(ApiError::BadRequest("Name, phone, date and time are required".into()));
    }
    appointment.validate()?;
    let appointment = state.store.create_appointment(appointment).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn list_appointments(_admin: AdminUser, State(state): State<AppState>) -> ApiResult<Json<Vec<Appointment>>> {
    Ok(Json(state.store.list_appointments().await?))
}

pub async fn set_appointment_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Body(update): Body<StatusUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    let status = EnquiryStatus::parse(update.status.trim()).ok_or_else(|| ShopError::UnknownStatus(update.status.clone()))?;
    if !state.store.set_appointment_status(id, status).await? {
        return Err(ShopError::RecordNotFound.into());
    }
    info!(appointment_id = id, status = status.as_str(), "Appointment status changed");
    Ok(Json(json!({ "success": true, "status": status })))
}
