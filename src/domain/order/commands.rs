use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::OrderError;
use super::value_objects::NewItem;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

/// Input of create and replace: the whole aggregate minus store-assigned ids.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_name: String,
    pub ordered_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<NewItem>,
}

impl NewOrder {
    pub fn new(customer_name: impl Into<String>, ordered_at: DateTime<Utc>, items: Vec<NewItem>) -> Self {
        Self {
            customer_name: customer_name.into(),
            ordered_at,
            items,
        }
    }

    /// Structural checks a caller should run before handing the order to a store.
    pub fn validate(&self) -> Result<(), OrderError> {
        for (idx, item) in self.items.iter().enumerate() {
            if item.stored_quantity().is_none() {
                return Err(OrderError::InvalidInput(format!(
                    "item {idx} quantity {} exceeds {}",
                    item.quantity,
                    i32::MAX
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deserialize_request_body() {
        let json = r#"{
            "orderId": 99,
            "customerName": "Alice",
            "orderedAt": "2024-01-02T03:04:05Z",
            "items": [{"itemCode": "A1", "description": "Widget", "quantity": 3}]
        }"#;

        let order: NewOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.customer_name, "Alice");
        assert_eq!(order.ordered_at, Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(order.items, vec![NewItem::new("A1", "Widget", 3)]);
    }

    #[test]
    fn test_missing_items_defaults_to_empty() {
        let json = r#"{"customerName": "Bob", "orderedAt": "2024-01-02T03:04:05Z"}"#;
        let order: NewOrder = serde_json::from_str(json).unwrap();
        assert!(order.items.is_empty());
    }

    #[test]
    fn test_null_customer_name_rejected() {
        let json = r#"{"customerName": null, "orderedAt": "2024-01-02T03:04:05Z"}"#;
        assert!(serde_json::from_str::<NewOrder>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_quantity() {
        let order = NewOrder::new(
            "Alice",
            Utc::now(),
            vec![NewItem::new("A1", "Widget", 1), NewItem::new("A2", "Bolt", u32::MAX)],
        );

        match order.validate() {
            Err(OrderError::InvalidInput(msg)) => assert!(msg.starts_with("item 1")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_empty_items() {
        assert!(NewOrder::new("Alice", Utc::now(), vec![]).validate().is_ok());
    }
}
