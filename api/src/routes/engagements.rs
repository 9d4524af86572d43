//! Engagement endpoint

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use streetsavvy_promotions::EntityId;

use crate::error::ApiError;
use crate::{models::*, ApiState};

/// Mounted under `/users`
pub fn router() -> Router<Arc<ApiState>> {
    Router::new().route("/:id/campaigns/:campaign_id/engage", post(engage))
}

/// Record a click or use of a campaign
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/campaigns/{campaign_id}/engage",
    params(
        ("user_id" = String, Path, description = "User ID"),
        ("campaign_id" = String, Path, description = "Campaign ID")
    ),
    request_body = EngagementCreate,
    responses(
        (status = 200, description = "Engagement recorded or ignored as duplicate", body = EngagementView),
        (status = 400, description = "Invalid action", body = ErrorResponse),
        (status = 404, description = "No location recorded for user", body = ErrorResponse)
    ),
    tag = "engagements"
)]
pub async fn engage(
    State(state): State<Arc<ApiState>>,
    Path((user_id, campaign_id)): Path<(String, String)>,
    body: Result<Json<EngagementCreate>, JsonRejection>,
) -> Result<Json<ApiResponse<EngagementView>>, ApiError> {
    let Json(req) = body?;
    let result = state
        .engagements
        .record_engagement(
            &EntityId::from_string(user_id),
            &EntityId::from_string(campaign_id),
            &req.action,
        )
        .await?;
    Ok(Json(ApiResponse::success(result.into())))
}
