use sqlx::{PgExecutor, Result};
use uuid::Uuid;

use crate::db::models::{
    Customer, NewCustomer, NewPaymentChannel, NewPaymentMethod, PaymentChannel, PaymentMethod,
};

// Every query takes any Postgres executor, so callers pass either `&PgPool`
// or `&mut *tx` for an open transaction.

// --- Customer Queries ---

pub async fn insert_customer<'e, E>(executor: E, customer: &NewCustomer) -> Result<Customer>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO customers (
            id, app_customer_id, payment_customer_id, name, email, phone, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.app_customer_id)
    .bind(&customer.payment_customer_id)
    .bind(&customer.name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(customer.created_at)
    .fetch_one(executor)
    .await
}

pub async fn get_customer_by_app_id<'e, E>(
    executor: E,
    app_customer_id: &str,
) -> Result<Option<Customer>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE app_customer_id = $1")
        .bind(app_customer_id)
        .fetch_optional(executor)
        .await
}

pub async fn get_customer_by_payment_customer_id<'e, E>(
    executor: E,
    payment_customer_id: &str,
) -> Result<Option<Customer>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE payment_customer_id = $1")
        .bind(payment_customer_id)
        .fetch_optional(executor)
        .await
}

// --- Payment Channel Queries ---

pub async fn insert_payment_channel<'e, E>(
    executor: E,
    channel: &NewPaymentChannel,
) -> Result<PaymentChannel>
where
    E: PgExecutor<'e>,
{
    // Channels start inactive; activation is an administrative action.
    sqlx::query_as::<_, PaymentChannel>(
        r#"
        INSERT INTO payment_channels (
            id, name, channel_type, min_amount, max_amount, tax, is_tax_percentage, is_active
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&channel.name)
    .bind(&channel.channel_type)
    .bind(&channel.min_amount)
    .bind(&channel.max_amount)
    .bind(&channel.tax)
    .bind(channel.is_tax_percentage)
    .fetch_one(executor)
    .await
}

pub async fn get_payment_channel_by_name<'e, E>(
    executor: E,
    name: &str,
) -> Result<Option<PaymentChannel>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PaymentChannel>("SELECT * FROM payment_channels WHERE name = $1")
        .bind(name)
        .fetch_optional(executor)
        .await
}

pub async fn list_payment_channels<'e, E>(executor: E) -> Result<Vec<PaymentChannel>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PaymentChannel>("SELECT * FROM payment_channels ORDER BY name")
        .fetch_all(executor)
        .await
}

pub async fn set_payment_channel_active<'e, E>(
    executor: E,
    name: &str,
    is_active: bool,
) -> Result<Option<PaymentChannel>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PaymentChannel>(
        "UPDATE payment_channels SET is_active = $1 WHERE name = $2 RETURNING *",
    )
    .bind(is_active)
    .bind(name)
    .fetch_optional(executor)
    .await
}

// --- Payment Method Queries ---

pub async fn insert_payment_method<'e, E>(
    executor: E,
    method: &NewPaymentMethod,
) -> Result<PaymentMethod>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PaymentMethod>(
        r#"
        INSERT INTO payment_methods (
            id, payment_method_id, payment_request_id, reference_id, business_id, customer_id,
            payment_type, payment_status, payment_reusability, payment_channel, payment_amount,
            payment_qr_code, payment_virtual_account_number, payment_url, description,
            created_at, updated_at, expires_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING *
        "#,
    )
    .bind(&method.id)
    .bind(&method.payment_method_id)
    .bind(&method.payment_request_id)
    .bind(&method.reference_id)
    .bind(&method.business_id)
    .bind(&method.customer_id)
    .bind(&method.payment_type)
    .bind(&method.payment_status)
    .bind(&method.payment_reusability)
    .bind(&method.payment_channel)
    .bind(&method.payment_amount)
    .bind(method.qr_code())
    .bind(method.virtual_account_number())
    .bind(method.url())
    .bind(&method.description)
    .bind(method.created_at)
    .bind(method.updated_at)
    .bind(method.expires_at)
    .fetch_one(executor)
    .await
}

pub async fn get_payment_method<'e, E>(
    executor: E,
    payment_method_id: &str,
    customer_id: &str,
) -> Result<Option<PaymentMethod>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PaymentMethod>(
        "SELECT * FROM payment_methods WHERE payment_method_id = $1 AND customer_id = $2",
    )
    .bind(payment_method_id)
    .bind(customer_id)
    .fetch_optional(executor)
    .await
}

/// Same as [`get_payment_method`] but locks the row until the surrounding
/// transaction ends.
pub async fn get_payment_method_for_update<'e, E>(
    executor: E,
    payment_method_id: &str,
    customer_id: &str,
) -> Result<Option<PaymentMethod>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PaymentMethod>(
        r#"
        SELECT * FROM payment_methods
        WHERE payment_method_id = $1 AND customer_id = $2
        FOR UPDATE
        "#,
    )
    .bind(payment_method_id)
    .bind(customer_id)
    .fetch_optional(executor)
    .await
}

pub async fn get_payment_method_by_reference_id<'e, E>(
    executor: E,
    reference_id: &str,
) -> Result<Option<PaymentMethod>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PaymentMethod>("SELECT * FROM payment_methods WHERE reference_id = $1")
        .bind(reference_id)
        .fetch_optional(executor)
        .await
}

pub async fn list_payment_methods_by_customer<'e, E>(
    executor: E,
    customer_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<PaymentMethod>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PaymentMethod>(
        r#"
        SELECT * FROM payment_methods
        WHERE customer_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(customer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn update_payment_method_status<'e, E>(
    executor: E,
    payment_method_id: &str,
    customer_id: &str,
    status: &str,
) -> Result<PaymentMethod>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, PaymentMethod>(
        r#"
        UPDATE payment_methods
        SET payment_status = $1, updated_at = NOW()
        WHERE payment_method_id = $2 AND customer_id = $3
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(payment_method_id)
    .bind(customer_id)
    .fetch_one(executor)
    .await
}

// --- Lookup Queries ---

/// Single-column tables holding gateway enumerations observed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTable {
    PaymentType,
    PaymentStatus,
    PaymentReusability,
}

impl LookupTable {
    pub fn table_name(self) -> &'static str {
        match self {
            LookupTable::PaymentType => "payment_types",
            LookupTable::PaymentStatus => "payment_statuses",
            LookupTable::PaymentReusability => "payment_reusabilities",
        }
    }
}

/// Insert-if-absent keyed by name. Returns the name whether it was inserted
/// now or already existed.
pub async fn create_lookup<'e, E>(executor: E, table: LookupTable, name: &str) -> Result<String>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "INSERT INTO {} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING",
        table.table_name()
    );
    sqlx::query(&sql).bind(name).execute(executor).await?;
    Ok(name.to_string())
}

pub async fn get_lookup<'e, E>(executor: E, table: LookupTable, name: &str) -> Result<Option<String>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT name FROM {} WHERE name = $1", table.table_name());
    sqlx::query_scalar::<_, String>(&sql)
        .bind(name)
        .fetch_optional(executor)
        .await
}

pub async fn list_lookup<'e, E>(executor: E, table: LookupTable) -> Result<Vec<String>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("SELECT name FROM {} ORDER BY name", table.table_name());
    sqlx::query_scalar::<_, String>(&sql).fetch_all(executor).await
}

pub async fn create_payment_type<'e, E>(executor: E, name: &str) -> Result<String>
where
    E: PgExecutor<'e>,
{
    create_lookup(executor, LookupTable::PaymentType, name).await
}

pub async fn create_payment_status<'e, E>(executor: E, name: &str) -> Result<String>
where
    E: PgExecutor<'e>,
{
    create_lookup(executor, LookupTable::PaymentStatus, name).await
}

pub async fn create_payment_reusability<'e, E>(executor: E, name: &str) -> Result<String>
where
    E: PgExecutor<'e>,
{
    create_lookup(executor, LookupTable::PaymentReusability, name).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_table_names() {
        assert_eq!(LookupTable::PaymentType.table_name(), "payment_types");
        assert_eq!(LookupTable::PaymentStatus.table_name(), "payment_statuses");
        assert_eq!(
            LookupTable::PaymentReusability.table_name(),
            "payment_reusabilities"
        );
    }
}
