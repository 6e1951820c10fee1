pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod registry;
pub mod reload;
pub mod services;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::registry::Registry;
use crate::services::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            orchestrator: Orchestrator::new(registry),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.orchestrator.registry()
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/customers", post(handlers::customers::create_customer))
        .route(
            "/v1/customers/:app_customer_id",
            get(handlers::customers::get_customer),
        )
        .route(
            "/v1/customers/:customer_id/payment-methods",
            get(handlers::payments::list_payment_methods),
        )
        .route(
            "/v1/customers/:customer_id/payment-methods/:payment_method_id",
            get(handlers::payments::get_payment_method),
        )
        .route(
            "/v1/customers/:customer_id/payment-methods/:payment_method_id/status",
            put(handlers::payments::update_payment_method_status),
        )
        .route(
            "/v1/payments/ewallet",
            post(handlers::payments::create_ewallet_payment),
        )
        .route(
            "/v1/payments/qr-code",
            post(handlers::payments::create_qr_code_payment),
        )
        .route(
            "/v1/payments/virtual-account",
            post(handlers::payments::create_virtual_account_payment),
        )
        .route(
            "/v1/channels",
            get(handlers::channels::list_channels).post(handlers::channels::create_channel),
        )
        .route("/v1/channels/:name", get(handlers::channels::get_channel))
        .route(
            "/v1/channels/:name/active",
            put(handlers::channels::set_channel_active),
        )
        .with_state(state)
}
