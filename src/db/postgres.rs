//! Postgres-backed order store.
//!
//! Each mutating operation runs inside one transaction. A failing statement
//! triggers an explicit rollback before the error is returned, so callers
//! never observe a partially written aggregate.
//!
//! ## Error Mapping
//!
//! | SQLx error | SQLSTATE | OrderError |
//! |------------|----------|------------|
//! | Database (not-null violation) | `23502` | `InvalidInput` |
//! | Database (check violation) | `23514` | `InvalidInput` |
//! | Database (numeric out of range) | `22003` | `InvalidInput` |
//! | Database (other) | any other | `Store` |
//! | PoolClosed, Io, Tls, ... | N/A | `Store` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use crate::domain::order::{
    Item, JoinedRow, NewItem, NewOrder, Order, OrderAssembler, OrderError, OrderRepository,
};

const LIST_ORDERS_SQL: &str = r#"
    SELECT
        o.order_id,
        o.customer_name,
        o.ordered_at,
        i.item_id,
        i.item_code,
        i.description,
        i.quantity
    FROM orders o
    LEFT JOIN items i ON o.order_id = i.order_id
    ORDER BY o.order_id ASC, i.item_id ASC
"#;

/// Order store over a shared `PgPool`.
///
/// The pool is owned by the process; this type only borrows connections
/// from it for the duration of one operation.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, OrderError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }
}

#[async_trait]
impl OrderRepository for PgOrderStore {
    #[instrument(skip(self, order), fields(item_count = order.items.len()), err)]
    async fn create_order(&self, order: NewOrder) -> Result<i64, OrderError> {
        let mut tx = self.begin().await?;

        let written = insert_aggregate(&mut tx, &order).await;
        let order_id = match written {
            Ok(order_id) => order_id,
            Err(err) => return Err(rollback(tx, "create_order", err).await),
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(
            order_id = order_id,
            item_count = order.items.len(),
            "✅ Order created"
        );

        Ok(order_id)
    }

    #[instrument(skip(self), err)]
    async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        let mut rows = sqlx::query(LIST_ORDERS_SQL).fetch(&self.pool);
        let mut assembler = OrderAssembler::new();
        let mut row_count = 0usize;

        while let Some(row) = rows
            .try_next()
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?
        {
            let record = JoinedRowRecord::from_row(&row)
                .map_err(|e| map_sqlx_error("decode_joined_row", e))?;
            assembler.push(JoinedRow::try_from(record)?);
            row_count += 1;
        }

        tracing::debug!(
            row_count = row_count,
            order_count = assembler.len(),
            "Assembled orders from joined rows"
        );

        Ok(assembler.finish())
    }

    #[instrument(skip(self, order), fields(item_count = order.items.len()), err)]
    async fn replace_order(&self, order_id: i64, order: NewOrder) -> Result<(), OrderError> {
        let mut tx = self.begin().await?;

        let replaced = replace_aggregate(&mut tx, order_id, &order).await;
        if let Err(err) = replaced {
            return Err(rollback(tx, "replace_order", err).await);
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(
            order_id = order_id,
            item_count = order.items.len(),
            "✅ Order replaced"
        );

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn delete_order(&self, order_id: i64) -> Result<(), OrderError> {
        let mut tx = self.begin().await?;

        let deleted = delete_aggregate(&mut tx, order_id).await;
        let items_deleted = match deleted {
            Ok(count) => count,
            Err(err) => return Err(rollback(tx, "delete_order", err).await),
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(
            order_id = order_id,
            items_deleted = items_deleted,
            "✅ Order deleted"
        );

        Ok(())
    }
}

// ============================================================================
// Statement helpers (all run on the caller's transaction)
// ============================================================================

async fn insert_aggregate(conn: &mut PgConnection, order: &NewOrder) -> Result<i64, OrderError> {
    let order_id = insert_order(conn, order).await?;
    insert_items(conn, order_id, &order.items).await?;
    Ok(order_id)
}

async fn insert_order(conn: &mut PgConnection, order: &NewOrder) -> Result<i64, OrderError> {
    let row = sqlx::query(
        r#"
        INSERT INTO orders (customer_name, ordered_at)
        VALUES ($1, $2)
        RETURNING order_id
        "#,
    )
    .bind(&order.customer_name)
    .bind(order.ordered_at)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("insert_order", e))?;

    row.try_get("order_id")
        .map_err(|e| map_sqlx_error("insert_order", e))
}

async fn insert_items(
    conn: &mut PgConnection,
    order_id: i64,
    items: &[NewItem],
) -> Result<(), OrderError> {
    for item in items {
        // Bound as BIGINT so the INTEGER column itself rejects out-of-range values.
        sqlx::query(
            r#"
            INSERT INTO items (item_code, description, quantity, order_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&item.item_code)
        .bind(&item.description)
        .bind(i64::from(item.quantity))
        .bind(order_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("insert_item", e))?;
    }
    Ok(())
}

async fn replace_aggregate(
    conn: &mut PgConnection,
    order_id: i64,
    order: &NewOrder,
) -> Result<(), OrderError> {
    let updated = sqlx::query(
        r#"
        UPDATE orders
        SET customer_name = $1, ordered_at = $2
        WHERE order_id = $3
        "#,
    )
    .bind(&order.customer_name)
    .bind(order.ordered_at)
    .bind(order_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error("update_order", e))?;

    if updated.rows_affected() == 0 {
        return Err(OrderError::NotFound(order_id));
    }

    let removed = sqlx::query("DELETE FROM items WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("delete_items", e))?;

    tracing::debug!(
        order_id = order_id,
        removed_items = removed.rows_affected(),
        "Cleared previous item set"
    );

    insert_items(conn, order_id, &order.items).await
}

async fn delete_aggregate(conn: &mut PgConnection, order_id: i64) -> Result<u64, OrderError> {
    // Row lock keeps a concurrent create from attaching items mid-delete.
    let existing = sqlx::query("SELECT order_id FROM orders WHERE order_id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("check_order_exists", e))?;

    if existing.is_none() {
        return Err(OrderError::NotFound(order_id));
    }

    let items = sqlx::query("DELETE FROM items WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("delete_items", e))?;

    let orders = sqlx::query("DELETE FROM orders WHERE order_id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("delete_order", e))?;

    if orders.rows_affected() == 0 {
        return Err(OrderError::NotFound(order_id));
    }

    Ok(items.rows_affected())
}

/// Roll back and hand back the error the caller should see.
///
/// A failed rollback replaces the original cause with a `Store` error.
async fn rollback(
    tx: Transaction<'static, Postgres>,
    operation: &str,
    cause: OrderError,
) -> OrderError {
    match tx.rollback().await {
        Ok(()) => {
            tracing::warn!(
                operation = operation,
                error = %cause,
                "Transaction rolled back"
            );
            cause
        }
        Err(e) => {
            tracing::error!(
                operation = operation,
                error = %e,
                cause = %cause,
                "Rollback failed"
            );
            OrderError::Store(format!("rollback failed in {operation}: {e}"))
        }
    }
}

/// Map SQLx errors to OrderError.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> OrderError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                Some("23502") | Some("23514") | Some("22003") => OrderError::InvalidInput(msg),
                _ => OrderError::Store(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            OrderError::Store(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::RowNotFound => {
            OrderError::Store(format!("unexpected row not found in {}", operation))
        }
        _ => OrderError::Store(format!("sqlx error in {}: {}", operation, err)),
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(Debug)]
struct JoinedRowRecord {
    order_id: i64,
    customer_name: String,
    ordered_at: DateTime<Utc>,
    item_id: Option<i64>,
    item_code: Option<String>,
    description: Option<String>,
    quantity: Option<i32>,
}

impl<'r> FromRow<'r, PgRow> for JoinedRowRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(JoinedRowRecord {
            order_id: row.try_get("order_id")?,
            customer_name: row.try_get("customer_name")?,
            ordered_at: row.try_get("ordered_at")?,
            item_id: row.try_get("item_id")?,
            item_code: row.try_get("item_code")?,
            description: row.try_get("description")?,
            quantity: row.try_get("quantity")?,
        })
    }
}

impl TryFrom<JoinedRowRecord> for JoinedRow {
    type Error = OrderError;

    fn try_from(record: JoinedRowRecord) -> Result<Self, Self::Error> {
        // item_id is the primary key, so NULL here means the outer join found no item.
        let item = match record.item_id {
            Some(item_id) => {
                let quantity = record.quantity.unwrap_or_default();
                let quantity = u32::try_from(quantity).map_err(|_| {
                    OrderError::Store(format!(
                        "item {item_id} has negative quantity {quantity}"
                    ))
                })?;
                Some(Item {
                    item_id,
                    item_code: record.item_code.unwrap_or_default(),
                    description: record.description.unwrap_or_default(),
                    quantity,
                })
            }
            None => None,
        };

        Ok(JoinedRow {
            order_id: record.order_id,
            customer_name: record.customer_name,
            ordered_at: record.ordered_at,
            item,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
