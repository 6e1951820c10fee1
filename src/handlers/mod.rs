pub mod channels;
pub mod customers;
pub mod payments;

use std::future::Future;
use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::AppState;
use crate::error::AppError;
use crate::services::OrchestratorError;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub const REPLAYED_HEADER: &str = "idempotent-replayed";

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let ctx = state.registry().snapshot();
    let db_status = match sqlx::query("SELECT 1").execute(&ctx.pool).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the store");
            "disconnected"
        }
    };

    let status_code = if db_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "status": if status_code == StatusCode::OK { "healthy" } else { "unhealthy" },
            "version": env!("CARGO_PKG_VERSION"),
            "db": db_status,
        })),
    )
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    match headers.get(IDEMPOTENCY_KEY_HEADER) {
        None => Ok(None),
        Some(value) => {
            let key = value
                .to_str()
                .map_err(|_| AppError::BadRequest("Invalid idempotency key format".to_string()))?
                .trim();
            if key.is_empty() {
                return Err(AppError::BadRequest("Empty idempotency key".to_string()));
            }
            Ok(Some(key.to_string()))
        }
    }
}

/// Runs an operation under the request deadline. Expiry drops the
/// operation, which rolls back any transaction it holds.
pub(crate) async fn with_timeout<T, Fut>(deadline: Duration, operation: Fut) -> Result<T, AppError>
where
    Fut: Future<Output = Result<T, OrchestratorError>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::warn!(timeout_secs = deadline.as_secs(), "Request deadline exceeded");
            Err(AppError::Timeout)
        }
    }
}

/// Create endpoint wrapper. With an `Idempotency-Key` header a cached result
/// is replayed instead of calling the gateway again; a fresh result is cached
/// under that key after it is persisted. Cached results are scoped by
/// `operation_name`.
pub(crate) async fn idempotent_create<T, Fut>(
    state: &AppState,
    headers: &HeaderMap,
    operation_name: &'static str,
    operation: Fut,
) -> Result<Response, AppError>
where
    T: Serialize + DeserializeOwned + Sync,
    Fut: Future<Output = Result<T, OrchestratorError>>,
{
    let ctx = state.registry().snapshot();
    let key = idempotency_key(headers)?;
    let cache = ctx.response_cache();

    if let Some(key) = &key {
        if let Ok(cached) = cache.get::<T>(operation_name, key).await {
            tracing::info!(operation = operation_name, idempotency_key = %key, "Replaying cached response");
            return Ok((
                StatusCode::CREATED,
                [(REPLAYED_HEADER, "true")],
                Json(cached),
            )
                .into_response());
        }
    }

    let created = with_timeout(ctx.config.request_timeout(), operation).await?;
    if let Some(key) = &key {
        cache.put(operation_name, key, &created).await;
    }

    Ok((StatusCode::CREATED, Json(created)).into_response())
}
