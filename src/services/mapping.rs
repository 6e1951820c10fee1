//! Translation between caller input, gateway requests/responses and store
//! rows. Everything here is pure so the create flows stay deterministic.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::models::{NewCustomer, NewPaymentMethod, PaymentInstrument};
use crate::domain::{
    CreateCustomerInput, EwalletPaymentInput, QrCodePaymentInput, VirtualAccountPaymentInput,
};
use crate::gateway::types::{
    EwalletChannelProperties, EwalletChannelRequest, EwalletPaymentMethodRequest, ExpiryProperties,
    IndividualDetail, QrCodeRequest, VirtualAccountRequest, VirtualAccountRequestProperties,
};
use crate::gateway::{
    CustomerRequest, EwalletPaymentRequest, GatewayAction, GatewayCustomer,
    GatewayPaymentResource, QrCodePaymentRequest, VirtualAccountPaymentRequest,
};

const ONE_TIME_USE: &str = "ONE_TIME_USE";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct MappingError(pub String);

/// Which follow-up action an e-wallet channel must return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRequirement {
    /// The channel authorizes by push notification and never returns a URL.
    NoAction,
    UrlType(&'static str),
}

pub fn action_requirement(channel: &str) -> ActionRequirement {
    match channel.trim().to_ascii_uppercase().as_str() {
        "OVO" => ActionRequirement::NoAction,
        "SHOPEEPAY" => ActionRequirement::UrlType("DEEPLINK"),
        _ => ActionRequirement::UrlType("MOBILE"),
    }
}

/// Picks the payer-facing URL for an e-wallet payment.
pub fn select_action_url(channel: &str, actions: &[GatewayAction]) -> Result<String, MappingError> {
    let url_type = match action_requirement(channel) {
        ActionRequirement::NoAction => return Ok(String::new()),
        ActionRequirement::UrlType(url_type) => url_type,
    };

    let mut matching = actions.iter().filter_map(|action| {
        let url = action.url.as_deref().filter(|url| !url.is_empty())?;
        action.url_type.eq_ignore_ascii_case(url_type).then_some(url)
    });

    let url = matching.next().ok_or_else(|| {
        MappingError(format!(
            "gateway returned no {} action for e-wallet channel {}",
            url_type, channel
        ))
    })?;

    if matching.next().is_some() {
        tracing::warn!(channel = %channel, url_type = %url_type, "Multiple matching actions, using the first");
    }

    Ok(url.to_string())
}

// --- Requests ---

pub fn customer_request(input: &CreateCustomerInput) -> CustomerRequest {
    CustomerRequest {
        reference_id: input.app_customer_id.clone(),
        kind: "INDIVIDUAL",
        individual_detail: IndividualDetail {
            given_names: input.name.clone(),
        },
        email: input.email.clone(),
        mobile_number: input.phone.clone(),
    }
}

pub fn ewallet_request(input: &EwalletPaymentInput) -> EwalletPaymentRequest {
    EwalletPaymentRequest {
        reference_id: input.reference_id.clone(),
        customer_id: input.customer_id.clone(),
        amount: input.amount.clone(),
        currency: input.currency.clone(),
        description: input.description.clone(),
        payment_method: EwalletPaymentMethodRequest {
            kind: "EWALLET",
            reusability: ONE_TIME_USE,
            ewallet: EwalletChannelRequest {
                channel_code: input.channel.clone(),
                channel_properties: EwalletChannelProperties {
                    success_return_url: input.success_return_url.clone(),
                    failure_return_url: input.failure_return_url.clone(),
                    mobile_number: input.mobile_number.clone(),
                },
            },
        },
    }
}

pub fn qr_code_request(input: &QrCodePaymentInput) -> QrCodePaymentRequest {
    QrCodePaymentRequest {
        kind: "QR_CODE",
        reusability: ONE_TIME_USE,
        reference_id: input.reference_id.clone(),
        customer_id: input.customer_id.clone(),
        description: input.description.clone(),
        qr_code: QrCodeRequest {
            channel_code: input.channel.clone(),
            amount: input.amount.clone(),
            currency: input.currency.clone(),
            channel_properties: ExpiryProperties {
                expires_at: input.expires_at,
            },
        },
    }
}

pub fn virtual_account_request(input: &VirtualAccountPaymentInput) -> VirtualAccountPaymentRequest {
    VirtualAccountPaymentRequest {
        kind: "VIRTUAL_ACCOUNT",
        reusability: ONE_TIME_USE,
        reference_id: input.reference_id.clone(),
        customer_id: input.customer_id.clone(),
        description: input.description.clone(),
        virtual_account: VirtualAccountRequest {
            channel_code: input.channel.clone(),
            amount: input.amount.clone(),
            currency: input.currency.clone(),
            channel_properties: VirtualAccountRequestProperties {
                customer_name: input.customer_name.clone(),
                expires_at: input.expires_at,
            },
        },
    }
}

// --- Responses ---

fn required(field: &str, value: &str) -> Result<String, MappingError> {
    if value.trim().is_empty() {
        Err(MappingError(format!("gateway response is missing {}", field)))
    } else {
        Ok(value.to_string())
    }
}

pub fn new_customer(
    id: String,
    input: &CreateCustomerInput,
    gw: &GatewayCustomer,
) -> Result<NewCustomer, MappingError> {
    Ok(NewCustomer {
        id,
        app_customer_id: input.app_customer_id.clone(),
        payment_customer_id: required("customer id", &gw.id)?,
        name: gw
            .individual_detail
            .as_ref()
            .map(|detail| detail.given_names.clone())
            .unwrap_or_else(|| input.name.clone()),
        email: gw.email.clone().or_else(|| input.email.clone()),
        phone: gw.mobile_number.clone().or_else(|| input.phone.clone()),
        created_at: gw.created,
    })
}

/// Caller-side values used where the gateway response is silent.
struct PaymentFallback<'a> {
    reference_id: &'a str,
    customer_id: &'a str,
    channel: &'a str,
    amount: &'a bigdecimal::BigDecimal,
    description: &'a str,
    expires_at: DateTime<Utc>,
}

fn new_payment(
    id: String,
    gw: &GatewayPaymentResource,
    fallback: PaymentFallback<'_>,
    instrument: PaymentInstrument,
) -> Result<NewPaymentMethod, MappingError> {
    Ok(NewPaymentMethod {
        id,
        payment_method_id: required("payment method id", &gw.payment_method_id)?,
        payment_request_id: gw.payment_request_id.clone(),
        reference_id: non_empty_or(&gw.reference_id, fallback.reference_id),
        business_id: required("business_id", &gw.business_id)?,
        customer_id: gw
            .customer_id
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| fallback.customer_id.to_string()),
        payment_type: required("type", &gw.payment_type)?,
        payment_status: required("status", &gw.status)?,
        payment_reusability: required("reusability", &gw.reusability)?,
        payment_channel: gw
            .channel_code
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| fallback.channel.to_string()),
        payment_amount: gw.amount.clone().unwrap_or_else(|| fallback.amount.clone()),
        instrument,
        description: gw
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| fallback.description.to_string()),
        created_at: gw.created,
        updated_at: gw.updated,
        expires_at: gw.expires_at.unwrap_or(fallback.expires_at),
    })
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

pub fn new_ewallet_payment(
    id: String,
    input: &EwalletPaymentInput,
    gw: &GatewayPaymentResource,
) -> Result<NewPaymentMethod, MappingError> {
    let channel = gw.channel_code.as_deref().unwrap_or(&input.channel);
    let url = select_action_url(channel, &gw.actions)?;

    new_payment(
        id,
        gw,
        PaymentFallback {
            reference_id: &input.reference_id,
            customer_id: &input.customer_id,
            channel: &input.channel,
            amount: &input.amount,
            description: &input.description,
            expires_at: input.expires_at,
        },
        PaymentInstrument::Redirect(url),
    )
}

pub fn new_qr_code_payment(
    id: String,
    input: &QrCodePaymentInput,
    gw: &GatewayPaymentResource,
) -> Result<NewPaymentMethod, MappingError> {
    let qr = gw
        .qr_string
        .clone()
        .filter(|qr| !qr.is_empty())
        .ok_or_else(|| MappingError("gateway response is missing qr_string".to_string()))?;

    new_payment(
        id,
        gw,
        PaymentFallback {
            reference_id: &input.reference_id,
            customer_id: &input.customer_id,
            channel: &input.channel,
            amount: &input.amount,
            description: &input.description,
            expires_at: input.expires_at,
        },
        PaymentInstrument::QrCode(qr),
    )
}

pub fn new_virtual_account_payment(
    id: String,
    input: &VirtualAccountPaymentInput,
    gw: &GatewayPaymentResource,
) -> Result<NewPaymentMethod, MappingError> {
    let number = gw
        .virtual_account_number
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            MappingError("gateway response is missing virtual_account_number".to_string())
        })?;

    new_payment(
        id,
        gw,
        PaymentFallback {
            reference_id: &input.reference_id,
            customer_id: &input.customer_id,
            channel: &input.channel,
            amount: &input.amount,
            description: &input.description,
            expires_at: input.expires_at,
        },
        PaymentInstrument::VirtualAccount(number),
    )
}
