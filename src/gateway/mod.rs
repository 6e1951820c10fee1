use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod client;
pub mod types;

pub use client::HttpGateway;
pub use types::{
    CustomerRequest, EwalletPaymentRequest, GatewayAction, GatewayCustomer,
    GatewayPaymentResource, QrCodePaymentRequest, VirtualAccountPaymentRequest,
};

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway rejected the request with status {status}: {error_code}")]
    Rejected {
        status: u16,
        error_code: String,
        message: Option<String>,
        body: String,
    },
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response from gateway: {reason}")]
    InvalidResponse { reason: String, body: String },
    #[error("circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

impl GatewayError {
    /// Summary that is safe to hand to API callers.
    pub fn safe_message(&self) -> String {
        match self {
            GatewayError::Rejected { error_code, .. } => {
                format!("payment gateway rejected the request ({})", error_code)
            }
            GatewayError::Transport(e) if e.is_timeout() => {
                "payment gateway timed out".to_string()
            }
            GatewayError::Transport(_) => "payment gateway is unreachable".to_string(),
            GatewayError::InvalidResponse { .. } => {
                "payment gateway returned an unexpected response".to_string()
            }
            GatewayError::CircuitBreakerOpen(_) => {
                "payment gateway is temporarily unavailable".to_string()
            }
        }
    }

    /// Full diagnostic payload for logs.
    pub fn diagnostic(&self) -> String {
        match self {
            GatewayError::Rejected {
                status,
                error_code,
                message,
                body,
            } => format!(
                "status={} error_code={} message={} body={}",
                status,
                error_code,
                message.as_deref().unwrap_or(""),
                body
            ),
            GatewayError::InvalidResponse { reason, body } => {
                format!("reason={} body={}", reason, body)
            }
            other => other.to_string(),
        }
    }

    /// Whether this error says something about gateway health, as opposed to
    /// the gateway refusing one particular request.
    pub fn is_gateway_failure(&self) -> bool {
        match self {
            GatewayError::Rejected { status, .. } => *status >= 500,
            GatewayError::Transport(_) => true,
            GatewayError::InvalidResponse { .. } | GatewayError::CircuitBreakerOpen(_) => false,
        }
    }
}

/// Fresh, request-scoped idempotency token for a single gateway call.
pub fn new_idempotency_key() -> String {
    Uuid::new_v4().to_string()
}

/// Remote payment gateway. Every call carries an idempotency token; replaying
/// a token returns the original resource instead of creating another one.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_customer(
        &self,
        request: &CustomerRequest,
        idempotency_key: &str,
    ) -> Result<GatewayCustomer, GatewayError>;

    async fn create_ewallet_payment(
        &self,
        request: &EwalletPaymentRequest,
        idempotency_key: &str,
    ) -> Result<GatewayPaymentResource, GatewayError>;

    async fn create_qr_code_payment(
        &self,
        request: &QrCodePaymentRequest,
        idempotency_key: &str,
    ) -> Result<GatewayPaymentResource, GatewayError>;

    async fn create_virtual_account_payment(
        &self,
        request: &VirtualAccountPaymentRequest,
        idempotency_key: &str,
    ) -> Result<GatewayPaymentResource, GatewayError>;
}
