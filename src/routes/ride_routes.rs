use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::controllers::RideController;
use crate::dto::ride_dto::{
    CancelRideRequest, CompleteRideRequest, ListRidesQuery, RequestRideRequest, RideDetailResponse,
};
use crate::dto::{optional_json, ApiResponse};
use crate::middleware::AuthenticatedUser;
use crate::models::ride::{Rating, Ride, RideLocation};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_ride_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rides))
        .route("/request_ride", post(request_ride))
        .route("/:id", get(get_ride))
        .route("/:id/accept_ride", post(accept_ride))
        .route("/:id/start_ride", post(start_ride))
        .route("/:id/complete_ride", post(complete_ride))
        .route("/:id/cancel_ride", post(cancel_ride))
        .route("/:id/locations", get(list_locations))
        .route("/:id/ratings", get(list_ratings))
}

async fn list_rides(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListRidesQuery>,
) -> Result<Json<Vec<Ride>>, AppError> {
    let response = RideController::new(&state)
        .list_rides(user.user_id, query.status.as_deref())
        .await?;
    Ok(Json(response))
}

async fn request_ride(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<RequestRideRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Ride>>), AppError> {
    let response = RideController::new(&state).request_ride(user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(response, "Ride requested")),
    ))
}

async fn get_ride(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RideDetailResponse>, AppError> {
    let response = RideController::new(&state).get_ride(id).await?;
    Ok(Json(response))
}

async fn accept_ride(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Ride>>, AppError> {
    let response = RideController::new(&state).accept_ride(user.user_id, id).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Ride accepted")))
}

async fn start_ride(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Ride>>, AppError> {
    let response = RideController::new(&state).start_ride(id).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Ride started")))
}

async fn complete_ride(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ApiResponse<Ride>>, AppError> {
    let request: CompleteRideRequest = optional_json(&body)?;
    let response = RideController::new(&state)
        .complete_ride(id, request.actual_fare)
        .await?;
    Ok(Json(ApiResponse::success_with_message(response, "Ride completed")))
}

async fn cancel_ride(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ApiResponse<Ride>>, AppError> {
    let request: CancelRideRequest = optional_json(&body)?;
    request.validate()?;
    let response = RideController::new(&state).cancel_ride(id, request.reason).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Ride cancelled")))
}

async fn list_locations(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RideLocation>>, AppError> {
    let response = RideController::new(&state).list_locations(id).await?;
    Ok(Json(response))
}

async fn list_ratings(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Rating>>, AppError> {
    let response = RideController::new(&state).list_ratings(id).await?;
    Ok(Json(response))
}
