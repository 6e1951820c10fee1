use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::gateway::types::deserialize_decimal;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub app_customer_id: String,
    /// Assigned by the gateway; a row only exists once registration succeeded.
    pub payment_customer_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PaymentChannel {
    pub id: String,
    pub name: String,
    pub channel_type: String,
    pub min_amount: BigDecimal,
    pub max_amount: BigDecimal,
    pub tax: BigDecimal,
    pub is_tax_percentage: bool,
    pub is_active: bool,
}

impl PaymentChannel {
    /// Checks that a payment on this channel may be issued for `amount`.
    pub fn check_payable(&self, amount: &BigDecimal) -> Result<(), String> {
        if !self.is_active {
            return Err(format!("payment channel {} is not active", self.name));
        }
        if amount < &self.min_amount || amount > &self.max_amount {
            return Err(format!(
                "amount {} is outside the range {}..={} for channel {}",
                amount, self.min_amount, self.max_amount, self.name
            ));
        }
        Ok(())
    }
}

/// Exactly one of `payment_qr_code`, `payment_virtual_account_number` and
/// `payment_url` is populated, chosen by `payment_type`. An OVO e-wallet
/// payment carries an empty `payment_url`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    pub payment_method_id: String,
    pub payment_request_id: Option<String>,
    pub reference_id: String,
    pub business_id: String,
    pub customer_id: String,
    pub payment_type: String,
    pub payment_status: String,
    pub payment_reusability: String,
    pub payment_channel: String,
    pub payment_amount: BigDecimal,
    pub payment_qr_code: Option<String>,
    pub payment_virtual_account_number: Option<String>,
    pub payment_url: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub id: String,
    pub app_customer_id: String,
    pub payment_customer_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPaymentChannel {
    pub name: String,
    pub channel_type: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub min_amount: BigDecimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub max_amount: BigDecimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub tax: BigDecimal,
    pub is_tax_percentage: bool,
}

/// Kind-specific payment instrument returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentInstrument {
    QrCode(String),
    VirtualAccount(String),
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentMethod {
    pub id: String,
    pub payment_method_id: String,
    pub payment_request_id: Option<String>,
    pub reference_id: String,
    pub business_id: String,
    pub customer_id: String,
    pub payment_type: String,
    pub payment_status: String,
    pub payment_reusability: String,
    pub payment_channel: String,
    pub payment_amount: BigDecimal,
    pub instrument: PaymentInstrument,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl NewPaymentMethod {
    pub fn qr_code(&self) -> Option<&str> {
        match &self.instrument {
            PaymentInstrument::QrCode(qr) => Some(qr),
            _ => None,
        }
    }

    pub fn virtual_account_number(&self) -> Option<&str> {
        match &self.instrument {
            PaymentInstrument::VirtualAccount(number) => Some(number),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.instrument {
            PaymentInstrument::Redirect(url) => Some(url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn channel(active: bool) -> PaymentChannel {
        PaymentChannel {
            id: "ch_1".to_string(),
            name: "BCA".to_string(),
            channel_type: "VIRTUAL_ACCOUNT".to_string(),
            min_amount: BigDecimal::from(10000),
            max_amount: BigDecimal::from_str("50000000.00").unwrap(),
            tax: BigDecimal::from(4000),
            is_tax_percentage: false,
            is_active: active,
        }
    }

    #[test]
    fn test_payable_within_bounds() {
        let ch = channel(true);
        assert!(ch.check_payable(&BigDecimal::from(10000)).is_ok());
        assert!(ch.check_payable(&BigDecimal::from_str("150000.00").unwrap()).is_ok());
        assert!(ch.check_payable(&BigDecimal::from(50_000_000)).is_ok());
    }

    #[test]
    fn test_payable_rejects_out_of_range() {
        let ch = channel(true);
        assert!(ch.check_payable(&BigDecimal::from_str("9999.99").unwrap()).is_err());
        assert!(ch.check_payable(&BigDecimal::from_str("50000000.01").unwrap()).is_err());
    }

    #[test]
    fn test_payable_rejects_inactive_channel() {
        let err = channel(false).check_payable(&BigDecimal::from(20000)).unwrap_err();
        assert!(err.contains("not active"));
    }

    #[test]
    fn test_instrument_accessors_are_exclusive() {
        let now = Utc::now();
        let method = NewPaymentMethod {
            id: "pm_local".to_string(),
            payment_method_id: "pm-123".to_string(),
            payment_request_id: None,
            reference_id: "ref-1".to_string(),
            business_id: "biz".to_string(),
            customer_id: "cust-1".to_string(),
            payment_type: "VIRTUAL_ACCOUNT".to_string(),
            payment_status: "PENDING".to_string(),
            payment_reusability: "ONE_TIME_USE".to_string(),
            payment_channel: "BCA".to_string(),
            payment_amount: BigDecimal::from(150000),
            instrument: PaymentInstrument::VirtualAccount("8808123456789".to_string()),
            description: "order".to_string(),
            created_at: now,
            updated_at: now,
            expires_at: now,
        };
        assert_eq!(method.virtual_account_number(), Some("8808123456789"));
        assert_eq!(method.qr_code(), None);
        assert_eq!(method.url(), None);
    }
}
