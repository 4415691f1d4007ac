//! Product domain service.
//!
//! Orchestrates each product mutation together with its outbox event:
//! - `create` records `ProductCreated`
//! - `update` records `ProductUpdated` (optimistic concurrency on `version`)
//! - `delete` records `ProductDeleted`
//! - `read` is a plain lookup
//!
//! Storage and outbox errors surface as [`ServiceError`].

mod error;
mod requests;
mod service;

#[cfg(test)]
mod tests;

pub use error::{ServiceError, ServiceResult};
pub use requests::{CreateProductRequest, UpdateProductRequest};
pub use service::{OutboxMode, ProductService};
