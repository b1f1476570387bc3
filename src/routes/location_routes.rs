use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::controllers::RideController;
use crate::dto::ride_dto::UpdateLocationRequest;
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::ride::RideLocation;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_location_router() -> Router<AppState> {
    Router::new().route("/update_location", post(update_location))
}

async fn update_location(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RideLocation>>), AppError> {
    let response = RideController::new(&state)
        .record_location(request.ride_id, request.latitude, request.longitude)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}
