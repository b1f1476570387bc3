use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};

use crate::controllers::UserController;
use crate::dto::user_dto::CreateVehicleRequest;
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::user::{DriverProfile, Vehicle};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(driver_me))
        .route("/go_online", post(go_online))
        .route("/go_offline", post(go_offline))
        .route("/vehicles", post(add_vehicle).get(list_vehicles))
}

async fn driver_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<DriverProfile>, AppError> {
    let response = UserController::new(&state).driver_profile(user.user_id).await?;
    Ok(Json(response))
}

async fn go_online(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<DriverProfile>>, AppError> {
    let response = UserController::new(&state).set_online(user.user_id, true).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Driver is now online")))
}

async fn go_offline(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<DriverProfile>>, AppError> {
    let response = UserController::new(&state).set_online(user.user_id, false).await?;
    Ok(Json(ApiResponse::success_with_message(response, "Driver is now offline")))
}

async fn add_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vehicle>>), AppError> {
    let response = UserController::new(&state).add_vehicle(user.user_id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(response, "Vehicle registered successfully")),
    ))
}

async fn list_vehicles(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Vehicle>>, AppError> {
    let response = UserController::new(&state).list_vehicles(user.user_id).await?;
    Ok(Json(response))
}
