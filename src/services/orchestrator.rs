use std::sync::Arc;

use bigdecimal::BigDecimal;
use sqlx::{Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{Customer, NewPaymentMethod, PaymentMethod};
use crate::db::queries::{self, LookupTable};
use crate::domain::{
    check_amount, is_terminal_status, CreateCustomerInput, EwalletPaymentInput, QrCodePaymentInput,
    VirtualAccountPaymentInput,
};
use crate::gateway::{new_idempotency_key, GatewayError};
use crate::registry::{Collaborators, Registry};
use crate::services::lookup::LookupNames;
use crate::services::mapping;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("gateway call failed during {step}: {source}")]
    Gateway {
        step: &'static str,
        #[source]
        source: GatewayError,
    },
    #[error("store operation failed during {step}: {source}")]
    Store {
        step: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

fn store_error(step: &'static str) -> impl FnOnce(sqlx::Error) -> OrchestratorError {
    move |source| OrchestratorError::Store { step, source }
}

fn gateway_error(step: &'static str) -> impl FnOnce(GatewayError) -> OrchestratorError {
    move |source| {
        tracing::warn!(step, error = %source, "Aborting before any local write");
        OrchestratorError::Gateway { step, source }
    }
}

/// Runs every payment operation: remote call first, then one local
/// transaction for the rows it produces.
///
/// All methods are cancellable by dropping the returned future. An open
/// transaction rolls back when dropped; a gateway call that already
/// succeeded is not undone and shows up as an orphaned remote resource.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<Registry>,
}

impl Orchestrator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<Customer, OrchestratorError> {
        require("app_customer_id", &input.app_customer_id)?;
        require("name", &input.name)?;

        let ctx = self.registry.snapshot();
        let request = mapping::customer_request(&input);
        let remote = ctx
            .gateway
            .create_customer(&request, &new_idempotency_key())
            .await
            .map_err(gateway_error("create_customer"))?;

        let record = mapping::new_customer(Uuid::new_v4().to_string(), &input, &remote)
            .map_err(|e| {
                let err = OrchestratorError::Validation(e.0);
                report_orphan("customer", &remote.reference_id, &err);
                err
            })?;

        let result: Result<Customer, OrchestratorError> = async {
            let mut tx = ctx.pool.begin().await.map_err(store_error("begin"))?;
            let customer = queries::insert_customer(&mut *tx, &record)
                .await
                .map_err(store_error("insert_customer"))?;
            tx.commit().await.map_err(store_error("commit"))?;
            Ok(customer)
        }
        .await;

        match result {
            Ok(customer) => {
                tracing::info!(
                    app_customer_id = %customer.app_customer_id,
                    payment_customer_id = %customer.payment_customer_id,
                    "Customer created"
                );
                Ok(customer)
            }
            Err(e) => {
                report_orphan("customer", &remote.id, &e);
                Err(e)
            }
        }
    }

    pub async fn create_ewallet_payment(
        &self,
        input: EwalletPaymentInput,
    ) -> Result<PaymentMethod, OrchestratorError> {
        let ctx = self.registry.snapshot();
        check_payment(&ctx, &input.customer_id, &input.channel, &input.amount).await?;

        let request = mapping::ewallet_request(&input);
        let remote = ctx
            .gateway
            .create_ewallet_payment(&request, &new_idempotency_key())
            .await
            .map_err(gateway_error("create_ewallet_payment"))?;

        let record = mapping::new_ewallet_payment(Uuid::new_v4().to_string(), &input, &remote)
            .map_err(|e| {
                let err = OrchestratorError::Validation(e.0);
                report_orphan("ewallet payment", &remote.payment_method_id, &err);
                err
            })?;

        persist_payment(&ctx, record).await
    }

    pub async fn create_qr_code_payment(
        &self,
        input: QrCodePaymentInput,
    ) -> Result<PaymentMethod, OrchestratorError> {
        let ctx = self.registry.snapshot();
        check_payment(&ctx, &input.customer_id, &input.channel, &input.amount).await?;

        let request = mapping::qr_code_request(&input);
        let remote = ctx
            .gateway
            .create_qr_code_payment(&request, &new_idempotency_key())
            .await
            .map_err(gateway_error("create_qr_code_payment"))?;

        let record = mapping::new_qr_code_payment(Uuid::new_v4().to_string(), &input, &remote)
            .map_err(|e| {
                let err = OrchestratorError::Validation(e.0);
                report_orphan("qr code payment", &remote.payment_method_id, &err);
                err
            })?;

        persist_payment(&ctx, record).await
    }

    pub async fn create_virtual_account_payment(
        &self,
        input: VirtualAccountPaymentInput,
    ) -> Result<PaymentMethod, OrchestratorError> {
        let ctx = self.registry.snapshot();
        check_payment(&ctx, &input.customer_id, &input.channel, &input.amount).await?;

        let request = mapping::virtual_account_request(&input);
        let remote = ctx
            .gateway
            .create_virtual_account_payment(&request, &new_idempotency_key())
            .await
            .map_err(gateway_error("create_virtual_account_payment"))?;

        let record =
            mapping::new_virtual_account_payment(Uuid::new_v4().to_string(), &input, &remote)
                .map_err(|e| {
                    let err = OrchestratorError::Validation(e.0);
                    report_orphan("virtual account payment", &remote.payment_method_id, &err);
                    err
                })?;

        persist_payment(&ctx, record).await
    }

    /// Moves a payment method to `new_status` unless it already reached a
    /// terminal status, in which case the current row is returned untouched.
    pub async fn update_payment_method_status(
        &self,
        payment_method_id: &str,
        customer_id: &str,
        new_status: &str,
    ) -> Result<PaymentMethod, OrchestratorError> {
        let new_status = new_status.trim();
        require("status", new_status)?;

        let ctx = self.registry.snapshot();
        let mut tx = ctx.pool.begin().await.map_err(store_error("begin"))?;

        let current = queries::get_payment_method_for_update(&mut *tx, payment_method_id, customer_id)
            .await
            .map_err(store_error("load_payment_method"))?
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!(
                    "payment method {} for customer {}",
                    payment_method_id, customer_id
                ))
            })?;

        if is_terminal_status(&current.payment_status) {
            tx.commit().await.map_err(store_error("commit"))?;
            tracing::info!(
                payment_method_id = %payment_method_id,
                status = %current.payment_status,
                requested = %new_status,
                "Payment method is terminal, status update ignored"
            );
            return Ok(current);
        }

        ensure_lookup(&mut tx, &ctx.lookups, LookupTable::PaymentStatus, new_status).await?;
        let updated =
            queries::update_payment_method_status(&mut *tx, payment_method_id, customer_id, new_status)
                .await
                .map_err(store_error("update_payment_method_status"))?;
        tx.commit().await.map_err(store_error("commit"))?;

        ctx.lookups
            .remember([(LookupTable::PaymentStatus, new_status)]);
        // Overwrite rather than evict so a read that started before the
        // commit is less likely to leave the old status cached.
        ctx.entity_cache().put_payment_method(&updated).await;

        tracing::info!(
            payment_method_id = %payment_method_id,
            from = %current.payment_status,
            to = %updated.payment_status,
            "Payment method status updated"
        );
        Ok(updated)
    }

    pub async fn find_customer(
        &self,
        app_customer_id: &str,
    ) -> Result<Customer, OrchestratorError> {
        let ctx = self.registry.snapshot();
        let cache = ctx.entity_cache();
        if let Ok(customer) = cache.get_customer(app_customer_id).await {
            return Ok(customer);
        }

        let customer = queries::get_customer_by_app_id(&ctx.pool, app_customer_id)
            .await
            .map_err(store_error("load_customer"))?
            .ok_or_else(|| OrchestratorError::NotFound(format!("customer {}", app_customer_id)))?;
        cache.put_customer(&customer).await;
        Ok(customer)
    }

    pub async fn find_payment_method(
        &self,
        customer_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentMethod, OrchestratorError> {
        let ctx = self.registry.snapshot();
        let cache = ctx.entity_cache();
        if let Ok(method) = cache.get_payment_method(customer_id, payment_method_id).await {
            return Ok(method);
        }

        let method = queries::get_payment_method(&ctx.pool, payment_method_id, customer_id)
            .await
            .map_err(store_error("load_payment_method"))?
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!(
                    "payment method {} for customer {}",
                    payment_method_id, customer_id
                ))
            })?;
        cache.put_payment_method(&method).await;
        Ok(method)
    }
}

fn require(field: &str, value: &str) -> Result<(), OrchestratorError> {
    if value.trim().is_empty() {
        return Err(OrchestratorError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Rejects a payment before any remote call: the customer must be known
/// locally and the channel must accept the amount.
async fn check_payment(
    ctx: &Collaborators,
    customer_id: &str,
    channel: &str,
    amount: &BigDecimal,
) -> Result<(), OrchestratorError> {
    require("customer_id", customer_id)?;
    require("channel", channel)?;
    check_amount(amount).map_err(OrchestratorError::Validation)?;

    queries::get_customer_by_payment_customer_id(&ctx.pool, customer_id)
        .await
        .map_err(store_error("load_customer"))?
        .ok_or_else(|| OrchestratorError::NotFound(format!("customer {}", customer_id)))?;

    let payment_channel = queries::get_payment_channel_by_name(&ctx.pool, channel)
        .await
        .map_err(store_error("load_payment_channel"))?
        .ok_or_else(|| {
            OrchestratorError::Validation(format!("unknown payment channel {}", channel))
        })?;

    payment_channel
        .check_payable(amount)
        .map_err(OrchestratorError::Validation)
}

async fn ensure_lookup(
    tx: &mut Transaction<'_, Postgres>,
    lookups: &LookupNames,
    table: LookupTable,
    name: &str,
) -> Result<(), OrchestratorError> {
    if lookups.contains(table, name) {
        return Ok(());
    }
    queries::create_lookup(&mut **tx, table, name)
        .await
        .map_err(store_error("create_lookup"))?;
    Ok(())
}

async fn persist_payment(
    ctx: &Collaborators,
    record: NewPaymentMethod,
) -> Result<PaymentMethod, OrchestratorError> {
    let lookups = [
        (LookupTable::PaymentType, record.payment_type.as_str()),
        (LookupTable::PaymentStatus, record.payment_status.as_str()),
        (
            LookupTable::PaymentReusability,
            record.payment_reusability.as_str(),
        ),
    ];

    let result: Result<PaymentMethod, OrchestratorError> = async {
        let mut tx = ctx.pool.begin().await.map_err(store_error("begin"))?;
        for (table, name) in lookups {
            ensure_lookup(&mut tx, &ctx.lookups, table, name).await?;
        }
        let method = queries::insert_payment_method(&mut *tx, &record)
            .await
            .map_err(store_error("insert_payment_method"))?;
        tx.commit().await.map_err(store_error("commit"))?;
        Ok(method)
    }
    .await;

    match result {
        Ok(method) => {
            ctx.lookups.remember(lookups);
            tracing::info!(
                payment_method_id = %method.payment_method_id,
                customer_id = %method.customer_id,
                payment_type = %method.payment_type,
                status = %method.payment_status,
                "Payment method created"
            );
            Ok(method)
        }
        Err(e) => {
            report_orphan(&record.payment_type, &record.payment_method_id, &e);
            Err(e)
        }
    }
}

/// The gateway already holds a resource the store does not know about.
fn report_orphan(kind: &str, remote_id: &str, error: &OrchestratorError) {
    tracing::error!(
        kind = %kind,
        remote_id = %remote_id,
        error = %error,
        "Remote resource created but not recorded locally"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::test_config;
    use crate::gateway::HttpGateway;
    use sqlx::postgres::PgPoolOptions;

    fn orchestrator() -> Orchestrator {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let gateway = Arc::new(HttpGateway::new(&config.gateway));
        let registry = Registry::new(pool, Arc::new(MemoryStore::new()), gateway, config);
        Orchestrator::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_blank_customer_fields_rejected_before_any_call() {
        let result = orchestrator()
            .create_customer(CreateCustomerInput {
                app_customer_id: "  ".to_string(),
                name: "Budi".to_string(),
                email: None,
                phone: None,
            })
            .await;
        assert!(matches!(result, Err(OrchestratorError::Validation(_))));
    }

    #[tokio::test]
    async fn test_blank_status_rejected() {
        let result = orchestrator()
            .update_payment_method_status("pm-1", "cust-1", " ")
            .await;
        assert!(matches!(result, Err(OrchestratorError::Validation(_))));
    }

    #[tokio::test]
    async fn test_sub_cent_amount_rejected_before_any_call() {
        let result = orchestrator()
            .create_qr_code_payment(QrCodePaymentInput {
                customer_id: "cust-1".to_string(),
                reference_id: "order-1".to_string(),
                channel: "QRIS".to_string(),
                amount: "75000.505".parse().unwrap(),
                currency: "IDR".to_string(),
                description: "order 1".to_string(),
                expires_at: chrono::Utc::now(),
            })
            .await;
        match result {
            Err(OrchestratorError::Validation(msg)) => assert!(msg.contains("decimal places")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_messages() {
        let err = OrchestratorError::NotFound("customer app-1".to_string());
        assert_eq!(err.to_string(), "Not found: customer app-1");

        let err = OrchestratorError::Store {
            step: "commit",
            source: sqlx::Error::PoolTimedOut,
        };
        assert!(err.to_string().starts_with("store operation failed during commit"));
    }
}
