use serde::{Deserialize, Serialize};

// ============================================================================
// Order Value Objects
// ============================================================================

/// A persisted line item. `item_id` is assigned by the store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: i64,
    pub item_code: String,
    pub description: String,
    pub quantity: u32,
}

/// A line item as supplied by a caller, before the store assigns an id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub item_code: String,
    pub description: String,
    pub quantity: u32,
}

impl NewItem {
    pub fn new(item_code: impl Into<String>, description: impl Into<String>, quantity: u32) -> Self {
        Self {
            item_code: item_code.into(),
            description: description.into(),
            quantity,
        }
    }

    /// Quantity as stored in the 32-bit `items.quantity` column, if it fits.
    pub fn stored_quantity(&self) -> Option<i32> {
        i32::try_from(self.quantity).ok()
    }

    pub(crate) fn into_item(self, item_id: i64) -> Item {
        Item {
            item_id,
            item_code: self.item_code,
            description: self.description,
            quantity: self.quantity,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
