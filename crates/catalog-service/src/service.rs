//! Product service: entity mutations paired with outbox events.

use crate::{CreateProductRequest, ServiceError, ServiceResult, UpdateProductRequest};
use catalog_database::{queries, AsyncDatabase, NewProduct, Product, Transaction};
use catalog_outbox::{DomainEvent, OutboxWriter};
use chrono::Utc;
use tracing::{debug, error, info};

/// Where (and whether) domain events are recorded.
#[derive(Clone)]
pub enum OutboxMode {
    /// No outbox records are written.
    Disabled,
    /// Outbox table lives in the entity database; entity write and event
    /// commit in one transaction.
    Shared,
    /// Outbox lives in its own database. The entity commits first and the
    /// event is appended afterwards on a best-effort basis.
    Separate(AsyncDatabase),
}

impl OutboxMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxMode::Disabled => "disabled",
            OutboxMode::Shared => "shared",
            OutboxMode::Separate(_) => "separate",
        }
    }
}

/// Create / update / delete / read for products.
#[derive(Clone)]
pub struct ProductService {
    db: AsyncDatabase,
    writer: OutboxWriter,
    outbox: OutboxMode,
}

impl ProductService {
    pub fn new(db: AsyncDatabase, writer: OutboxWriter, outbox: OutboxMode) -> Self {
        info!(outbox = outbox.as_str(), "Product service ready");
        Self { db, writer, outbox }
    }

    pub fn outbox_mode(&self) -> &OutboxMode {
        &self.outbox
    }

    /// Create a product at version 0 and record `ProductCreated`.
    pub async fn create(&self, request: CreateProductRequest) -> ServiceResult<Product> {
        request.validate()?;

        let new_product = NewProduct {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name,
            description: request.description,
            category: request.category,
            price: request.price,
            brand: request.brand,
            sku: request.sku,
            specifications: request.specifications,
            tags: request.tags,
            created_by: request.created_by,
        };

        let product = self
            .mutate(move |tx| {
                if queries::sku_exists(tx, &new_product.sku)? {
                    return Err(ServiceError::ConcurrentModification(format!(
                        "sku {} already exists",
                        new_product.sku
                    )));
                }
                let product = queries::insert_product(tx, &new_product)?;
                let event = DomainEvent::ProductCreated(product.clone());
                Ok((product, event))
            })
            .await?;

        info!(product_id = %product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Apply `request` to an existing product and record `ProductUpdated`.
    ///
    /// The write is guarded by `request.expected_version` when given, otherwise
    /// by the version read in the same transaction.
    pub async fn update(&self, id: &str, request: UpdateProductRequest) -> ServiceResult<Product> {
        request.validate()?;
        let id = id.to_string();

        let product = self
            .mutate(move |tx| {
                let mut product = queries::get_product(tx, &id)?
                    .ok_or_else(|| ServiceError::NotFound(id.clone()))?;
                let expected_version = request.expected_version.unwrap_or(product.version);
                let current_sku = product.sku.clone();

                request.apply_to(&mut product);
                if product.sku != current_sku && queries::sku_exists(tx, &product.sku)? {
                    return Err(ServiceError::ConcurrentModification(format!(
                        "sku {} already exists",
                        product.sku
                    )));
                }

                let updated = queries::update_product(tx, &product, expected_version)?;
                let event = DomainEvent::ProductUpdated(updated.clone());
                Ok((updated, event))
            })
            .await?;

        info!(product_id = %product.id, version = product.version, "Product updated");
        Ok(product)
    }

    /// Delete a product and record `ProductDeleted`. Returns the removed row.
    pub async fn delete(&self, id: &str) -> ServiceResult<Product> {
        let id = id.to_string();

        let product = self
            .mutate(move |tx| {
                let product = queries::get_product(tx, &id)?
                    .ok_or_else(|| ServiceError::NotFound(id.clone()))?;
                if !queries::delete_product(tx, &id)? {
                    return Err(ServiceError::NotFound(id));
                }
                let event = DomainEvent::ProductDeleted {
                    id: product.id.clone(),
                    sku: product.sku.clone(),
                    deleted_at: Utc::now(),
                };
                Ok((product, event))
            })
            .await?;

        info!(product_id = %product.id, sku = %product.sku, "Product deleted");
        Ok(product)
    }

    /// Plain lookup.
    pub async fn read(&self, id: &str) -> ServiceResult<Product> {
        let lookup = id.to_string();
        self.db
            .call(move |conn| queries::get_product(conn, &lookup))
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Run an entity mutation as one unit of work and record its event
    /// according to the outbox mode.
    async fn mutate<F, T>(&self, op: F) -> ServiceResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> ServiceResult<(T, DomainEvent)> + Send + 'static,
        T: Send + 'static,
    {
        match &self.outbox {
            OutboxMode::Shared => {
                let writer = self.writer.clone();
                self.db
                    .unit_of_work(move |tx| -> ServiceResult<T> {
                        let (value, event) = op(tx)?;
                        writer.append_event(tx, &event)?;
                        Ok(value)
                    })
                    .await
            }
            OutboxMode::Disabled => {
                let (value, event) = self.db.unit_of_work(op).await?;
                debug!(
                    aggregate_id = %event.aggregate_id(),
                    event_type = %event.event_type(),
                    "Outbox disabled; no event recorded"
                );
                Ok(value)
            }
            OutboxMode::Separate(outbox_db) => {
                let (value, event) = self.db.unit_of_work(op).await?;
                let aggregate_id = event.aggregate_id().to_string();
                let event_type = event.event_type();

                let writer = self.writer.clone();
                let appended = outbox_db
                    .unit_of_work(move |tx| -> ServiceResult<_> {
                        Ok(writer.append_event(tx, &event)?)
                    })
                    .await;

                if let Err(e) = appended {
                    error!(
                        aggregate_id = %aggregate_id,
                        event_type = %event_type,
                        error = %e,
                        "Entity committed but outbox append failed; event lost"
                    );
                }
                Ok(value)
            }
        }
    }
}
