//! User profile, location and nearby-campaign endpoints

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use streetsavvy_promotions::{EntityId, GeoPoint};
use tracing::debug;

use super::parse_number;
use crate::error::ApiError;
use crate::{models::*, ApiState};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/:id", get(get_user))
        .route("/:id/locations", post(record_location))
        .route("/:id/nearby-campaigns", get(nearby_campaigns))
}

#[derive(Debug, Default, Deserialize)]
pub struct PointParams {
    lat: Option<String>,
    lng: Option<String>,
}

impl PointParams {
    /// Both coordinates or neither
    fn point(&self) -> Result<Option<GeoPoint>, ApiError> {
        let lat = parse_number("lat", self.lat.as_deref())?;
        let lng = parse_number("lng", self.lng.as_deref())?;
        match (lat, lng) {
            (Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng)?)),
            (None, None) => Ok(None),
            _ => Err(ApiError::invalid_parameter("lat and lng must be given together")),
        }
    }
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserView),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let user = state.users.get_user(&EntityId::from_string(id)).await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// Record a location ping
#[utoipa::path(
    post,
    path = "/api/users/{id}/locations",
    params(("id" = String, Path, description = "User ID")),
    request_body = LocationCreate,
    responses(
        (status = 201, description = "Location recorded", body = LocationView),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn record_location(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    body: Result<Json<LocationCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<LocationView>>), ApiError> {
    let Json(req) = body?;
    let event = state
        .users
        .record_location(&EntityId::from_string(id), req.lat, req.lng)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(event.into()))))
}

/// Campaigns the user currently qualifies for
#[utoipa::path(
    get,
    path = "/api/users/{id}/nearby-campaigns",
    operation_id = "user_nearby_campaigns",
    params(
        ("id" = String, Path, description = "User ID"),
        ("lat" = Option<f64>, Query, description = "Explicit latitude; requires lng"),
        ("lng" = Option<f64>, Query, description = "Explicit longitude; requires lat")
    ),
    responses(
        (status = 200, description = "Eligible campaigns", body = [CampaignMatchView]),
        (status = 400, description = "Invalid coordinates", body = ErrorResponse),
        (status = 404, description = "No location recorded for user", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn nearby_campaigns(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    params: Result<Query<PointParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<CampaignMatchView>>>, ApiError> {
    let Query(params) = params?;
    let location = params.point()?;
    let user_id = EntityId::from_string(id);
    debug!(%user_id, explicit = location.is_some(), "eligible campaigns requested");

    let matches = state.campaigns.eligible_campaigns(&user_id, location).await?;
    Ok(Json(ApiResponse::success(matches.into_iter().map(Into::into).collect())))
}
