use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::domain::CreateCustomerInput;
use crate::error::AppError;

use super::{idempotent_create, with_timeout};

pub async fn create_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateCustomerInput>,
) -> Result<Response, AppError> {
    idempotent_create(
        &state,
        &headers,
        "create_customer",
        state.orchestrator.create_customer(input),
    )
    .await
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(app_customer_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deadline = state.registry().snapshot().config.request_timeout();
    let customer = with_timeout(deadline, state.orchestrator.find_customer(&app_customer_id)).await?;
    Ok(Json(customer))
}
