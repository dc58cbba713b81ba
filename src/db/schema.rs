use sqlx::PgPool;

use super::postgres::map_sqlx_error;
use crate::domain::order::OrderError;

// ============================================================================
// Schema bootstrap
// ============================================================================
//
// Idempotent CREATE ... IF NOT EXISTS, run once at startup. This is not a
// migration system; existing tables are left untouched.
//
// ============================================================================

pub(crate) const CREATE_ORDERS: &str = r#"
    CREATE TABLE IF NOT EXISTS orders (
        order_id      BIGSERIAL PRIMARY KEY,
        customer_name TEXT NOT NULL,
        ordered_at    TIMESTAMPTZ NOT NULL
    )
"#;

pub(crate) const CREATE_ITEMS: &str = r#"
    CREATE TABLE IF NOT EXISTS items (
        item_id     BIGSERIAL PRIMARY KEY,
        item_code   TEXT NOT NULL,
        description TEXT NOT NULL,
        quantity    INTEGER NOT NULL CHECK (quantity >= 0),
        order_id    BIGINT NOT NULL REFERENCES orders (order_id)
    )
"#;

pub(crate) const CREATE_ITEMS_ORDER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS items_order_id_idx ON items (order_id)";

pub async fn ensure_schema(pool: &PgPool) -> Result<(), OrderError> {
    for (name, statement) in [
        ("create_orders", CREATE_ORDERS),
        ("create_items", CREATE_ITEMS),
        ("create_items_order_index", CREATE_ITEMS_ORDER_INDEX),
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error(name, e))?;
    }

    tracing::info!("Schema ready (orders, items)");
    Ok(())
}
