use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::aggregate::Order;
use super::value_objects::Item;

// ============================================================================
// Aggregate Reader - folds outer-joined rows into nested orders
// ============================================================================
//
// Input shape: one row per (order, item) pair, ordered by order_id. An order
// without items still produces exactly one row, with every item column NULL.
//
// Output order is the first appearance of each order_id in the row stream.
// No sorting happens here; the query is responsible for ORDER BY.
//
// ============================================================================

/// One row of `orders LEFT JOIN items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub order_id: i64,
    pub customer_name: String,
    pub ordered_at: DateTime<Utc>,
    /// `None` when the item-side columns were NULL.
    pub item: Option<Item>,
}

/// Incremental assembler, fed one row at a time from a forward-only cursor.
#[derive(Debug, Default)]
pub struct OrderAssembler {
    orders: Vec<Order>,
    positions: HashMap<i64, usize>,
}

impl OrderAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: JoinedRow) {
        let JoinedRow {
            order_id,
            customer_name,
            ordered_at,
            item,
        } = row;

        let position = match self.positions.get(&order_id) {
            Some(&position) => position,
            None => {
                let position = self.orders.len();
                self.orders
                    .push(Order::header(order_id, customer_name, ordered_at));
                self.positions.insert(order_id, position);
                position
            }
        };

        if let Some(item) = item {
            self.orders[position].items.push(item);
        }
    }

    /// Number of distinct orders seen so far.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn finish(self) -> Vec<Order> {
        self.orders
    }
}

/// Fold a complete row sequence into orders.
pub fn assemble_orders<I>(rows: I) -> Vec<Order>
where
    I: IntoIterator<Item = JoinedRow>,
{
    let mut assembler = OrderAssembler::new();
    for row in rows {
        assembler.push(row);
    }
    assembler.finish()
}

// ============================================================================
// Unit Tests
// ============================================================================
