//! Caller-facing parameters of the create operations.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::gateway::types::deserialize_decimal;

pub const DEFAULT_CURRENCY: &str = "IDR";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomerInput {
    pub app_customer_id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EwalletPaymentInput {
    /// Gateway-assigned customer id.
    pub customer_id: String,
    pub reference_id: String,
    pub channel: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub amount: BigDecimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub description: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub success_return_url: Option<String>,
    #[serde(default)]
    pub failure_return_url: Option<String>,
    /// Required by push-notification wallets such as OVO.
    #[serde(default)]
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrCodePaymentInput {
    pub customer_id: String,
    pub reference_id: String,
    pub channel: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub amount: BigDecimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub description: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualAccountPaymentInput {
    pub customer_id: String,
    pub reference_id: String,
    pub channel: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub amount: BigDecimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub description: String,
    pub customer_name: String,
    pub expires_at: DateTime<Utc>,
}

/// Statuses after which a payment method never changes again.
pub const TERMINAL_STATUSES: [&str; 2] = ["SUCCEEDED", "FAILED"];

pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_STATUSES
        .iter()
        .any(|terminal| terminal.eq_ignore_ascii_case(status.trim()))
}

/// Decimal places a stored amount keeps.
pub const AMOUNT_SCALE: i64 = 2;

/// Amounts must be positive, carry at most [`AMOUNT_SCALE`] decimal places
/// and fit the stored NUMERIC(20, 2) column.
pub fn check_amount(amount: &BigDecimal) -> Result<(), String> {
    if *amount <= BigDecimal::from(0) {
        return Err("amount must be positive".to_string());
    }
    if amount.with_scale(AMOUNT_SCALE) != *amount {
        return Err(format!(
            "amount {} has more than {} decimal places",
            amount, AMOUNT_SCALE
        ));
    }
    if *amount >= BigDecimal::from(1_000_000_000_000_000_000i64) {
        return Err(format!("amount {} is too large", amount));
    }
    Ok(())
}
