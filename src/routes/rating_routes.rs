use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::controllers::RideController;
use crate::dto::ride_dto::RateRideRequest;
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::ride::Rating;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_rating_router() -> Router<AppState> {
    Router::new().route("/rate_ride", post(rate_ride))
}

async fn rate_ride(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<RateRideRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Rating>>), AppError> {
    let response = RideController::new(&state).rate_ride(user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(response, "Rating submitted")),
    ))
}
