use async_trait::async_trait;

use super::aggregate::Order;
use super::commands::NewOrder;
use super::errors::OrderError;

/// Persistence contract for the order aggregate.
///
/// Every mutating operation is atomic: it either commits all of its
/// statements or leaves the store exactly as it was.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert the order and its items, returning the store-assigned order id.
    async fn create_order(&self, order: NewOrder) -> Result<i64, OrderError>;

    /// All orders with their items, ascending by order id.
    async fn list_orders(&self) -> Result<Vec<Order>, OrderError>;

    /// Overwrite the header and swap the entire item set.
    ///
    /// Fails with `NotFound` when no order has `order_id`.
    async fn replace_order(&self, order_id: i64, order: NewOrder) -> Result<(), OrderError>;

    /// Remove the order together with all of its items.
    async fn delete_order(&self, order_id: i64) -> Result<(), OrderError>;
}
