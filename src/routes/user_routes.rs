use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};

use crate::controllers::UserController;
use crate::dto::user_dto::{
    AuthResponse, LoginRequest, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::AuthenticatedUser;
use crate::models::user::{PassengerProfile, User};
use crate::services::AuthService;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_user_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
}

pub fn create_token_router() -> Router<AppState> {
    Router::new().route("/refresh", post(refresh_token))
}

pub fn create_passenger_router() -> Router<AppState> {
    Router::new().route("/me", get(passenger_me))
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.identities.clone(), state.jwt.clone(), state.config.bcrypt_cost)
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    let response = auth_service(&state).register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(response, "User registered successfully")),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let response = auth_service(&state).login(request).await?;
    Ok(Json(ApiResponse::success(response)))
}

async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<RefreshTokenResponse>, AppError> {
    let response = auth_service(&state).refresh(request).await?;
    Ok(Json(response))
}

async fn profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<User>, AppError> {
    let response = UserController::new(&state).me(user.user_id).await?;
    Ok(Json(response))
}

async fn passenger_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<PassengerProfile>, AppError> {
    let response = UserController::new(&state).passenger_profile(user.user_id).await?;
    Ok(Json(response))
}
