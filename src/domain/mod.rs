// ============================================================================
// Domain Layer - Order Aggregate
// ============================================================================
//
// Types, errors and persistence contract for the order aggregate.
// Storage adapters live in src/db/, the request layer in src/http/.
//
// ============================================================================

pub mod order;
