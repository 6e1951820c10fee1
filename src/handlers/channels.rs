use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::AppState;
use crate::db::models::NewPaymentChannel;
use crate::db::queries;
use crate::error::AppError;

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub async fn create_channel(
    State(state): State<AppState>,
    Json(channel): Json<NewPaymentChannel>,
) -> Result<impl IntoResponse, AppError> {
    if channel.name.trim().is_empty() {
        return Err(AppError::Validation("channel name is required".to_string()));
    }
    if channel.min_amount > channel.max_amount {
        return Err(AppError::Validation(
            "min_amount must not exceed max_amount".to_string(),
        ));
    }

    let ctx = state.registry().snapshot();
    let created = queries::insert_payment_channel(&ctx.pool, &channel).await?;
    tracing::info!(channel = %created.name, "Payment channel created (inactive)");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_channels(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let ctx = state.registry().snapshot();
    Ok(Json(queries::list_payment_channels(&ctx.pool).await?))
}

pub async fn get_channel(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.registry().snapshot();
    let channel = queries::get_payment_channel_by_name(&ctx.pool, &name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("payment channel {}", name)))?;
    Ok(Json(channel))
}

pub async fn set_channel_active(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = state.registry().snapshot();
    let channel = queries::set_payment_channel_active(&ctx.pool, &name, request.is_active)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("payment channel {}", name)))?;
    tracing::info!(channel = %channel.name, is_active = channel.is_active, "Payment channel updated");
    Ok(Json(channel))
}
