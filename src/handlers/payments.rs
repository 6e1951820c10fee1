use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::AppState;
use crate::db::queries;
use crate::domain::{EwalletPaymentInput, QrCodePaymentInput, VirtualAccountPaymentInput};
use crate::error::AppError;

use super::{idempotent_create, with_timeout};

#[derive(Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn create_ewallet_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<EwalletPaymentInput>,
) -> Result<Response, AppError> {
    idempotent_create(
        &state,
        &headers,
        "create_ewallet_payment",
        state.orchestrator.create_ewallet_payment(input),
    )
    .await
}

pub async fn create_qr_code_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<QrCodePaymentInput>,
) -> Result<Response, AppError> {
    idempotent_create(
        &state,
        &headers,
        "create_qr_code_payment",
        state.orchestrator.create_qr_code_payment(input),
    )
    .await
}

pub async fn create_virtual_account_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<VirtualAccountPaymentInput>,
) -> Result<Response, AppError> {
    idempotent_create(
        &state,
        &headers,
        "create_virtual_account_payment",
        state.orchestrator.create_virtual_account_payment(input),
    )
    .await
}

pub async fn get_payment_method(
    State(state): State<AppState>,
    Path((customer_id, payment_method_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let deadline = state.registry().snapshot().config.request_timeout();
    let method = with_timeout(
        deadline,
        state
            .orchestrator
            .find_payment_method(&customer_id, &payment_method_id),
    )
    .await?;
    Ok(Json(method))
}

pub async fn list_payment_methods(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let limit = pagination.limit.unwrap_or(20).clamp(1, 100);
    let offset = pagination.offset.unwrap_or(0).max(0);

    let ctx = state.registry().snapshot();
    let methods =
        queries::list_payment_methods_by_customer(&ctx.pool, &customer_id, limit, offset).await?;
    Ok(Json(methods))
}

pub async fn update_payment_method_status(
    State(state): State<AppState>,
    Path((customer_id, payment_method_id)): Path<(String, String)>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let deadline = state.registry().snapshot().config.request_timeout();
    let method = with_timeout(
        deadline,
        state.orchestrator.update_payment_method_status(
            &payment_method_id,
            &customer_id,
            &request.status,
        ),
    )
    .await?;
    Ok(Json(method))
}
