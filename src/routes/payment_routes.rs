use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::PaymentController;
use crate::dto::payment_dto::{CreatePaymentMethodRequest, SettleRideRequest};
use crate::dto::{optional_json, ApiResponse};
use crate::middleware::AuthenticatedUser;
use crate::models::payment::{Invoice, PaymentMethod, Settlement, Transaction};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_payment_router() -> Router<AppState> {
    Router::new()
        .route("/rides/:id/settle", post(settle_ride))
        .route("/rides/:id/invoice", get(get_invoice))
        .route("/transactions", get(list_transactions))
        .route("/methods", post(add_payment_method).get(list_payment_methods))
}

async fn settle_ride(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<Settlement>>), AppError> {
    let request: SettleRideRequest = optional_json(&body)?;
    let response = PaymentController::new(&state).settle(id, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(response, "Ride settled")),
    ))
}

async fn get_invoice(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, AppError> {
    let response = PaymentController::new(&state).get_invoice(id).await?;
    Ok(Json(response))
}

async fn list_transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let response = PaymentController::new(&state).list_transactions(user.user_id).await?;
    Ok(Json(response))
}

async fn add_payment_method(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePaymentMethodRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentMethod>>), AppError> {
    let response = PaymentController::new(&state)
        .add_payment_method(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

async fn list_payment_methods(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<PaymentMethod>>, AppError> {
    let response = PaymentController::new(&state).list_payment_methods(user.user_id).await?;
    Ok(Json(response))
}
