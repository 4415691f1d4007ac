//! Scenario tests for the outbox relay, sweeper and scheduler.
//!
//! - `harness.rs`   - in-memory database, scripted mock publisher, seeding helpers
//! - `delivery.rs`  - success, failure, mixed outcomes, idempotent re-runs
//! - `poison.rs`    - invalid payloads never block or get published
//! - `ordering.rs`  - oldest-first publishing and batch limits
//! - `timeout.rs`   - slow brokers and overlapping passes
//! - `retention.rs` - sweeper cleanup and cron schedule
//! - `scheduler.rs` - background loops and shutdown

mod delivery;
mod poison;
mod retention;
