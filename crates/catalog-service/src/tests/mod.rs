//! Scenario tests for the product service.
//!
//! - `harness.rs`     - service over in-memory or on-disk stores, outbox inspection
//! - `lifecycle.rs`   - create / read / update / delete and their outbox records
//! - `conflicts.rs`   - duplicate sku and optimistic-lock conflicts
//! - `store_modes.rs` - shared, separate and disabled outbox modes

mod store_modes;
