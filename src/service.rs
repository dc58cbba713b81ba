use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::order::{NewOrder, Order, OrderError, OrderRepository};
use crate::metrics::Metrics;

// ============================================================================
// Order Service
// ============================================================================
//
// Orchestrates: request -> validation -> repository -> metrics
//
// The repository is injected; this type never opens or closes a store
// handle itself.
//
// ============================================================================

pub struct OrderService {
    repository: Arc<dyn OrderRepository>,
    metrics: Arc<Metrics>,
}

impl OrderService {
    pub fn new(repository: Arc<dyn OrderRepository>, metrics: Arc<Metrics>) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    pub async fn create(&self, order: NewOrder) -> Result<i64, OrderError> {
        order.validate()?;
        let item_count = order.items.len();

        tracing::debug!(item_count = item_count, "Creating order");

        let order_id = self
            .observe("create", self.repository.create_order(order))
            .await?;
        self.metrics.record_items_written(item_count);
        Ok(order_id)
    }

    pub async fn list(&self) -> Result<Vec<Order>, OrderError> {
        self.observe("list", self.repository.list_orders()).await
    }

    pub async fn replace(&self, order_id: i64, order: NewOrder) -> Result<(), OrderError> {
        order.validate()?;
        let item_count = order.items.len();

        tracing::debug!(order_id = order_id, item_count = item_count, "Replacing order");

        self.observe("replace", self.repository.replace_order(order_id, order))
            .await?;
        self.metrics.record_items_written(item_count);
        Ok(())
    }

    pub async fn delete(&self, order_id: i64) -> Result<(), OrderError> {
        tracing::debug!(order_id = order_id, "Deleting order");
        self.observe("delete", self.repository.delete_order(order_id))
            .await
    }

    async fn observe<T, Fut>(&self, operation: &'static str, fut: Fut) -> Result<T, OrderError>
    where
        Fut: Future<Output = Result<T, OrderError>>,
    {
        let started = Instant::now();
        let result = fut.await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(_) => self.metrics.record_operation(operation, "ok", elapsed),
            Err(err) => {
                self.metrics.record_operation(operation, err.kind(), elapsed);
                match err {
                    OrderError::Store(_) => tracing::error!(
                        operation = operation,
                        error = %err,
                        "Order operation failed"
                    ),
                    _ => tracing::info!(
                        operation = operation,
                        error = %err,
                        "Order operation rejected"
                    ),
                }
            }
        }

        result
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
