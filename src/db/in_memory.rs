use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::order::{
    assemble_orders, JoinedRow, NewItem, NewOrder, Order, OrderError, OrderRepository,
};

#[derive(Debug, Clone)]
struct OrderRecord {
    customer_name: String,
    ordered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ItemRecord {
    item_code: String,
    description: String,
    quantity: i32,
    order_id: i64,
}

/// The two relations plus their id sequences.
#[derive(Debug, Clone)]
struct Tables {
    orders: BTreeMap<i64, OrderRecord>,
    items: BTreeMap<i64, ItemRecord>,
    next_order_id: i64,
    next_item_id: i64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            orders: BTreeMap::new(),
            items: BTreeMap::new(),
            next_order_id: 1,
            next_item_id: 1,
        }
    }
}

impl Tables {
    fn insert_order(&mut self, order: &NewOrder) -> i64 {
        let order_id = self.next_order_id;
        self.next_order_id += 1;
        self.orders.insert(
            order_id,
            OrderRecord {
                customer_name: order.customer_name.clone(),
                ordered_at: order.ordered_at,
            },
        );
        order_id
    }

    /// Same constraints as the `items` table: in-range quantity, existing parent.
    fn insert_item(&mut self, order_id: i64, item: &NewItem) -> Result<i64, OrderError> {
        let quantity = item.stored_quantity().ok_or_else(|| {
            OrderError::InvalidInput(format!(
                "quantity {} out of range for items.quantity",
                item.quantity
            ))
        })?;

        if !self.orders.contains_key(&order_id) {
            return Err(OrderError::Store(format!(
                "items.order_id {order_id} references a missing order"
            )));
        }

        let item_id = self.next_item_id;
        self.next_item_id += 1;
        self.items.insert(
            item_id,
            ItemRecord {
                item_code: item.item_code.clone(),
                description: item.description.clone(),
                quantity,
                order_id,
            },
        );
        Ok(item_id)
    }

    fn delete_items(&mut self, order_id: i64) -> usize {
        let before = self.items.len();
        self.items.retain(|_, item| item.order_id != order_id);
        before - self.items.len()
    }

    /// Equivalent of `orders LEFT JOIN items ORDER BY order_id, item_id`.
    fn joined_rows(&self) -> Vec<JoinedRow> {
        let mut rows = Vec::with_capacity(self.orders.len() + self.items.len());

        for (&order_id, order) in &self.orders {
            let row = |item| JoinedRow {
                order_id,
                customer_name: order.customer_name.clone(),
                ordered_at: order.ordered_at,
                item,
            };

            let before = rows.len();
            for (&item_id, item) in self.items.iter().filter(|(_, i)| i.order_id == order_id) {
                let new_item = NewItem::new(
                    item.item_code.clone(),
                    item.description.clone(),
                    item.quantity as u32,
                );
                rows.push(row(Some(new_item.into_item(item_id))));
            }
            if rows.len() == before {
                rows.push(row(None));
            }
        }

        rows
    }
}

/// In-process order store with the same transactional contract as Postgres.
///
/// Each mutation works on a staged copy of the tables and swaps it in only
/// when every step succeeded. Intended for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    tables: RwLock<Tables>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against a staged copy; commit only on `Ok`.
    fn transaction<T, F>(&self, operation: &str, f: F) -> Result<T, OrderError>
    where
        F: FnOnce(&mut Tables) -> Result<T, OrderError>,
    {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| OrderError::Store("lock poisoned".to_string()))?;

        let mut staged = tables.clone();
        match f(&mut staged) {
            Ok(value) => {
                *tables = staged;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(
                    operation = operation,
                    error = %err,
                    "Transaction rolled back"
                );
                Err(err)
            }
        }
    }

    /// `(item_id, order_id)` for every stored item row.
    pub fn item_rows(&self) -> Result<Vec<(i64, i64)>, OrderError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| OrderError::Store("lock poisoned".to_string()))?;
        Ok(tables
            .items
            .iter()
            .map(|(&item_id, item)| (item_id, item.order_id))
            .collect())
    }

    /// Ids of every stored order row.
    pub fn order_ids(&self) -> Result<Vec<i64>, OrderError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| OrderError::Store("lock poisoned".to_string()))?;
        Ok(tables.orders.keys().copied().collect())
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<i64, OrderError> {
        let order_id = self.transaction("create_order", |tables| {
            let order_id = tables.insert_order(&order);
            for item in &order.items {
                tables.insert_item(order_id, item)?;
            }
            Ok(order_id)
        })?;

        tracing::info!(
            order_id = order_id,
            item_count = order.items.len(),
            "✅ Order created"
        );
        Ok(order_id)
    }

    async fn list_orders(&self) -> Result<Vec<Order>, OrderError> {
        let rows = {
            let tables = self
                .tables
                .read()
                .map_err(|_| OrderError::Store("lock poisoned".to_string()))?;
            tables.joined_rows()
        };
        Ok(assemble_orders(rows))
    }

    async fn replace_order(&self, order_id: i64, order: NewOrder) -> Result<(), OrderError> {
        self.transaction("replace_order", |tables| {
            let record = tables
                .orders
                .get_mut(&order_id)
                .ok_or(OrderError::NotFound(order_id))?;
            record.customer_name = order.customer_name.clone();
            record.ordered_at = order.ordered_at;

            let removed = tables.delete_items(order_id);
            tracing::debug!(
                order_id = order_id,
                removed_items = removed,
                "Cleared previous item set"
            );

            for item in &order.items {
                tables.insert_item(order_id, item)?;
            }
            Ok(())
        })?;

        tracing::info!(
            order_id = order_id,
            item_count = order.items.len(),
            "✅ Order replaced"
        );
        Ok(())
    }

    async fn delete_order(&self, order_id: i64) -> Result<(), OrderError> {
        let items_deleted = self.transaction("delete_order", |tables| {
            if !tables.orders.contains_key(&order_id) {
                return Err(OrderError::NotFound(order_id));
            }
            let items_deleted = tables.delete_items(order_id);
            tables.orders.remove(&order_id);
            Ok(items_deleted)
        })?;

        tracing::info!(
            order_id = order_id,
            items_deleted = items_deleted,
            "✅ Order deleted"
        );
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn alice() -> NewOrder {
        NewOrder::new("Alice", t0(), vec![NewItem::new("A1", "Widget", 3)])
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let store = InMemoryOrderStore::new();

        let order_id = store.create_order(alice()).await.unwrap();
        assert_eq!(order_id, 1);

        let orders = store.list_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, 1);
        assert_eq!(orders[0].customer_name, "Alice");
        assert_eq!(orders[0].ordered_at, t0());
        assert_eq!(orders[0].items.len(), 1);
        assert_eq!(orders[0].items[0].item_code, "A1");
        assert_eq!(orders[0].items[0].description, "Widget");
        assert_eq!(orders[0].items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_order_without_items_is_listed() {
        let store = InMemoryOrderStore::new();
        store
            .create_order(NewOrder::new("Bob", t0(), vec![]))
            .await
            .unwrap();

        let orders = store.list_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert!(orders[0].items.is_empty());
    }

    #[tokio::test]
    async fn test_items_keep_insertion_order() {
        let store = InMemoryOrderStore::new();
        let items = vec![
            NewItem::new("Z9", "Last code first", 1),
            NewItem::new("A1", "First code last", 2),
            NewItem::new("M5", "Middle", 0),
        ];
        store
            .create_order(NewOrder::new("Alice", t0(), items))
            .await
            .unwrap();

        let orders = store.list_orders().await.unwrap();
        let codes: Vec<&str> = orders[0].items.iter().map(|i| i.item_code.as_str()).collect();
        assert_eq!(codes, vec!["Z9", "A1", "M5"]);
    }

    #[tokio::test]
    async fn test_failed_create_persists_nothing() {
        let store = InMemoryOrderStore::new();
        let order = NewOrder::new(
            "Alice",
            t0(),
            vec![NewItem::new("A1", "Widget", 1), NewItem::new("A2", "Huge", u32::MAX)],
        );

        let err = store.create_order(order).await.unwrap_err();
        assert!(matches!(err, OrderError::InvalidInput(_)));
        assert!(store.list_orders().await.unwrap().is_empty());
        assert!(store.item_rows().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_swaps_item_set() {
        let store = InMemoryOrderStore::new();
        let order_id = store.create_order(alice()).await.unwrap();

        let replacement = NewOrder::new(
            "Alice Cooper",
            t0() + chrono::Duration::hours(1),
            vec![NewItem::new("B1", "Bolt", 10), NewItem::new("B2", "Nut", 20)],
        );
        store.replace_order(order_id, replacement).await.unwrap();

        let orders = store.list_orders().await.unwrap();
        assert_eq!(orders[0].customer_name, "Alice Cooper");
        assert_eq!(orders[0].ordered_at, t0() + chrono::Duration::hours(1));
        let codes: Vec<&str> = orders[0].items.iter().map(|i| i.item_code.as_str()).collect();
        assert_eq!(codes, vec!["B1", "B2"]);
        assert_eq!(store.item_rows().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_replace_missing_order_is_not_found() {
        let store = InMemoryOrderStore::new();
        let err = store.replace_order(42, alice()).await.unwrap_err();
        assert_eq!(err, OrderError::NotFound(42));
        assert!(store.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_prior_state() {
        let store = InMemoryOrderStore::new();
        let order_id = store.create_order(alice()).await.unwrap();
        let before = store.list_orders().await.unwrap();

        let bad = NewOrder::new(
            "Mallory",
            t0() + chrono::Duration::days(1),
            vec![NewItem::new("M1", "Fine", 1), NewItem::new("M2", "Overflow", u32::MAX)],
        );
        let err = store.replace_order(order_id, bad).await.unwrap_err();

        assert!(matches!(err, OrderError::InvalidInput(_)));
        assert_eq!(store.list_orders().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = InMemoryOrderStore::new();
        let order_id = store.create_order(alice()).await.unwrap();

        store.delete_order(order_id).await.unwrap();
        assert!(store.list_orders().await.unwrap().is_empty());
        assert!(store.item_rows().unwrap().is_empty());

        let err = store.delete_order(order_id).await.unwrap_err();
        assert_eq!(err, OrderError::NotFound(order_id));
    }

    #[tokio::test]
    async fn test_delete_unknown_order() {
        let store = InMemoryOrderStore::new();
        assert_eq!(
            store.delete_order(999).await.unwrap_err(),
            OrderError::NotFound(999)
        );
    }

    #[tokio::test]
    async fn test_delete_leaves_other_orders() {
        let store = InMemoryOrderStore::new();
        let first = store.create_order(alice()).await.unwrap();
        let second = store
            .create_order(NewOrder::new("Bob", t0(), vec![NewItem::new("B1", "Bolt", 2)]))
            .await
            .unwrap();

        store.delete_order(first).await.unwrap();

        let orders = store.list_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, second);
        assert_eq!(store.order_ids().unwrap(), vec![second]);
        assert!(store.item_rows().unwrap().iter().all(|(_, o)| *o == second));
    }

    #[tokio::test]
    async fn test_ids_are_never_reused() {
        let store = InMemoryOrderStore::new();
        let first = store.create_order(alice()).await.unwrap();
        store.delete_order(first).await.unwrap();
        let second = store.create_order(alice()).await.unwrap();
        assert!(second > first);
    }
}
