use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::Item;

// ============================================================================
// Order Aggregate
// ============================================================================
//
// An order owns its items exclusively. Items have no identity outside the
// order and are only ever replaced as a whole set.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: i64,
    pub customer_name: String,
    pub ordered_at: DateTime<Utc>,
    pub items: Vec<Item>,
}

impl Order {
    /// An order header with no items attached yet.
    pub fn header(order_id: i64, customer_name: String, ordered_at: DateTime<Utc>) -> Self {
        Self {
            order_id,
            customer_name,
            ordered_at,
            items: Vec::new(),
        }
    }
}
