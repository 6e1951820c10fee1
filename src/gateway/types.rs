//! Wire types exchanged with the payment gateway.
//!
//! Requests serialize to the gateway's JSON shape. Responses for the three
//! payment kinds are normalized into a single [`GatewayPaymentResource`].

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// --- Requests ---

#[derive(Debug, Clone, Serialize)]
pub struct CustomerRequest {
    pub reference_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub individual_detail: IndividualDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualDetail {
    pub given_names: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EwalletPaymentRequest {
    pub reference_id: String,
    pub customer_id: String,
    #[serde(serialize_with = "serialize_amount")]
    pub amount: BigDecimal,
    pub currency: String,
    pub description: String,
    pub payment_method: EwalletPaymentMethodRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct EwalletPaymentMethodRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub reusability: &'static str,
    pub ewallet: EwalletChannelRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct EwalletChannelRequest {
    pub channel_code: String,
    pub channel_properties: EwalletChannelProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct EwalletChannelProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrCodePaymentRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub reusability: &'static str,
    pub reference_id: String,
    pub customer_id: String,
    pub description: String,
    pub qr_code: QrCodeRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrCodeRequest {
    pub channel_code: String,
    #[serde(serialize_with = "serialize_amount")]
    pub amount: BigDecimal,
    pub currency: String,
    pub channel_properties: ExpiryProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpiryProperties {
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VirtualAccountPaymentRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub reusability: &'static str,
    pub reference_id: String,
    pub customer_id: String,
    pub description: String,
    pub virtual_account: VirtualAccountRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct VirtualAccountRequest {
    pub channel_code: String,
    #[serde(serialize_with = "serialize_amount")]
    pub amount: BigDecimal,
    pub currency: String,
    pub channel_properties: VirtualAccountRequestProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct VirtualAccountRequestProperties {
    pub customer_name: String,
    pub expires_at: DateTime<Utc>,
}

// --- Responses ---

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayCustomer {
    pub id: String,
    pub reference_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub individual_detail: Option<IndividualDetail>,
    pub created: DateTime<Utc>,
}

/// Follow-up action the payer has to take, e.g. open a redirect URL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayAction {
    pub action: String,
    pub url_type: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Payment resource as returned for any of the three payment kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayPaymentResource {
    pub payment_method_id: String,
    /// Only present for e-wallet payments.
    pub payment_request_id: Option<String>,
    pub business_id: String,
    pub reference_id: String,
    pub customer_id: Option<String>,
    pub payment_type: String,
    pub status: String,
    pub reusability: String,
    pub channel_code: Option<String>,
    pub amount: Option<BigDecimal>,
    pub qr_string: Option<String>,
    pub virtual_account_number: Option<String>,
    pub actions: Vec<GatewayAction>,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// `POST /payment_requests` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequestResponse {
    pub id: String,
    pub business_id: String,
    pub reference_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub amount: BigDecimal,
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub payment_method: PaymentMethodResponse,
    #[serde(default)]
    pub actions: Vec<GatewayAction>,
}

/// `POST /v2/payment_methods` response body, also nested in payment requests.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub reusability: String,
    #[serde(default)]
    pub business_id: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ewallet: Option<EwalletDetail>,
    #[serde(default)]
    pub qr_code: Option<QrCodeDetail>,
    #[serde(default)]
    pub virtual_account: Option<VirtualAccountDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EwalletDetail {
    pub channel_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QrCodeDetail {
    pub channel_code: String,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub amount: Option<BigDecimal>,
    #[serde(default)]
    pub channel_properties: Option<QrCodeProperties>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QrCodeProperties {
    #[serde(default)]
    pub qr_string: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirtualAccountDetail {
    pub channel_code: String,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    pub amount: Option<BigDecimal>,
    #[serde(default)]
    pub channel_properties: Option<VirtualAccountProperties>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirtualAccountProperties {
    #[serde(default)]
    pub virtual_account_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Error body the gateway attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayErrorBody {
    pub error_code: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<PaymentRequestResponse> for GatewayPaymentResource {
    fn from(resp: PaymentRequestResponse) -> Self {
        let method = resp.payment_method;
        GatewayPaymentResource {
            payment_method_id: method.id,
            payment_request_id: Some(resp.id),
            business_id: resp.business_id,
            reference_id: resp.reference_id,
            customer_id: resp.customer_id.or(method.customer_id),
            payment_type: method.kind,
            // The request status is what later status updates refer to.
            status: resp.status,
            reusability: method.reusability,
            channel_code: method.ewallet.map(|e| e.channel_code),
            amount: Some(resp.amount),
            qr_string: None,
            virtual_account_number: None,
            actions: resp.actions,
            description: resp.description,
            created: resp.created,
            updated: resp.updated,
            expires_at: None,
        }
    }
}

impl PaymentMethodResponse {
    /// Normalizes a standalone payment method. Timestamps missing from the
    /// body fall back to `received_at`.
    pub fn into_resource(self, received_at: DateTime<Utc>) -> GatewayPaymentResource {
        let (channel_code, amount, qr_string, virtual_account_number, expires_at) =
            if let Some(qr) = self.qr_code {
                let props = qr.channel_properties;
                (
                    Some(qr.channel_code),
                    qr.amount,
                    props.as_ref().and_then(|p| p.qr_string.clone()),
                    None,
                    props.and_then(|p| p.expires_at),
                )
            } else if let Some(va) = self.virtual_account {
                let props = va.channel_properties;
                (
                    Some(va.channel_code),
                    va.amount,
                    None,
                    props.as_ref().and_then(|p| p.virtual_account_number.clone()),
                    props.and_then(|p| p.expires_at),
                )
            } else {
                (self.ewallet.map(|e| e.channel_code), None, None, None, None)
            };

        let created = self.created.unwrap_or(received_at);
        GatewayPaymentResource {
            payment_method_id: self.id,
            payment_request_id: None,
            business_id: self.business_id.unwrap_or_default(),
            reference_id: self.reference_id.unwrap_or_default(),
            customer_id: self.customer_id,
            payment_type: self.kind,
            status: self.status,
            reusability: self.reusability,
            channel_code,
            amount,
            qr_string,
            virtual_account_number,
            actions: Vec::new(),
            description: self.description,
            created,
            updated: self.updated.unwrap_or(created),
            expires_at,
        }
    }
}

// --- Amount (de)serialization ---

// Amounts travel as JSON numbers. serde_json keeps the literal text of every
// number (arbitrary_precision), so amounts are parsed from and written as
// that text and never pass through f64.

fn parse_decimal_value<E: serde::de::Error>(value: serde_json::Value) -> Result<BigDecimal, E> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s,
        other => return Err(E::custom(format!("expected a decimal amount, got {}", other))),
    };
    BigDecimal::from_str(text.trim()).map_err(|e| E::custom(format!("invalid amount {}: {}", text, e)))
}

pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    parse_decimal_value(value)
}

pub fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => parse_decimal_value(value).map(Some),
    }
}

fn serialize_amount<S>(amount: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if amount.is_integer() {
        if let Some(whole) = amount.to_i64() {
            return serializer.serialize_i64(whole);
        }
    }
    let text = amount.normalized().to_string();
    let number = serde_json::Number::from_str(&text)
        .map_err(|e| serde::ser::Error::custom(format!("amount {} is not a JSON number: {}", text, e)))?;
    number.serialize(serializer)
}
