// ============================================================================
// Order Domain - Order + Item aggregate
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (Item, NewItem)
// - Commands (NewOrder, the input of create/replace)
// - Errors (OrderError enum)
// - Aggregate (Order with its owned items)
// - Repository (the persistence contract)
// - Reader (folds outer-joined rows back into aggregates)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod repository;
pub mod reader;

// Re-export for convenience
pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use repository::*;
pub use reader::*;
