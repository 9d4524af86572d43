//! Campaign listing endpoints

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use super::parse_number;
use crate::error::ApiError;
use crate::{models::*, ApiState};

pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/active", get(active_campaigns))
        .route("/nearby", get(nearby_campaigns))
}

#[derive(Debug, Default, Deserialize)]
pub struct NearbyParams {
    lat: Option<String>,
    lng: Option<String>,
    radius_km: Option<String>,
}

/// List live campaigns
#[utoipa::path(
    get,
    path = "/api/campaigns/active",
    responses(
        (status = 200, description = "Live campaigns", body = [CampaignView])
    ),
    tag = "campaigns"
)]
pub async fn active_campaigns(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<ApiResponse<Vec<CampaignView>>>, ApiError> {
    let campaigns = state.campaigns.active_campaigns().await?;
    Ok(Json(ApiResponse::success(campaigns.into_iter().map(Into::into).collect())))
}

/// Live campaigns whose vendor is near a point
#[utoipa::path(
    get,
    path = "/api/campaigns/nearby",
    params(
        ("lat" = f64, Query, description = "Latitude"),
        ("lng" = f64, Query, description = "Longitude"),
        ("radius_km" = Option<f64>, Query, description = "Search radius in km (default 1.0)")
    ),
    responses(
        (status = 200, description = "Nearby campaigns", body = [CampaignView]),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse)
    ),
    tag = "campaigns"
)]
pub async fn nearby_campaigns(
    State(state): State<Arc<ApiState>>,
    params: Result<Query<NearbyParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<CampaignView>>>, ApiError> {
    let Query(params) = params?;
    let lat = parse_number("lat", params.lat.as_deref())?
        .ok_or_else(|| ApiError::invalid_parameter("lat is required"))?;
    let lng = parse_number("lng", params.lng.as_deref())?
        .ok_or_else(|| ApiError::invalid_parameter("lng is required"))?;
    let radius_km = parse_number("radius_km", params.radius_km.as_deref())?;

    let campaigns = state.campaigns.campaigns_near(lat, lng, radius_km).await?;
    Ok(Json(ApiResponse::success(campaigns.into_iter().map(Into::into).collect())))
}
