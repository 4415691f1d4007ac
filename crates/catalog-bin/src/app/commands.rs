//! One-shot CLI commands.

use crate::app::publisher::build_publisher;
use crate::app::CatalogState;
use catalog_config_and_utils::{Config, Paths};
use catalog_database::{queries, Price};
use catalog_outbox::{retention_cutoff, OutboxRelay, RetentionSweeper};
use catalog_service::{CreateProductRequest, ServiceError, ServiceResult, UpdateProductRequest};
use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

/// Product fields as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct ProductFields {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub tags: Vec<String>,
    /// `key=value` pairs.
    pub specs: Vec<String>,
    pub created_by: Option<String>,
    pub expected_version: Option<i64>,
}

pub fn create_request(fields: ProductFields) -> ServiceResult<CreateProductRequest> {
    let price = fields
        .price
        .as_deref()
        .ok_or_else(|| ServiceError::Validation("price is required".to_string()))
        .and_then(parse_price)?;

    Ok(CreateProductRequest {
        name: fields.name.unwrap_or_default(),
        description: fields.description,
        category: fields.category,
        price,
        brand: fields.brand,
        sku: fields.sku.unwrap_or_default(),
        specifications: parse_specs(&fields.specs)?,
        tags: fields.tags,
        created_by: fields.created_by,
    })
}

/// Empty tag and specification lists leave the stored values untouched.
pub fn update_request(fields: ProductFields) -> ServiceResult<UpdateProductRequest> {
    let price = fields.price.as_deref().map(parse_price).transpose()?;
    let specifications = if fields.specs.is_empty() {
        None
    } else {
        Some(parse_specs(&fields.specs)?)
    };
    let tags = (!fields.tags.is_empty()).then_some(fields.tags);

    Ok(UpdateProductRequest {
        name: fields.name,
        description: fields.description,
        category: fields.category,
        price,
        brand: fields.brand,
        sku: fields.sku,
        specifications,
        tags,
        expected_version: fields.expected_version,
    })
}

fn parse_price(raw: &str) -> ServiceResult<Price> {
    Price::parse(raw).map_err(|e| ServiceError::Validation(e.to_string()))
}

fn parse_specs(specs: &[String]) -> ServiceResult<BTreeMap<String, String>> {
    specs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(ServiceError::Validation(format!(
                "Invalid specification {:?}, expected key=value",
                pair
            ))),
        })
        .collect()
}

/// Print a service result as pretty JSON, or the error with its exit code.
pub fn print_json<T: Serialize>(result: &ServiceResult<T>) -> Result<(), i32> {
    match result {
        Ok(value) => match serde_json::to_string_pretty(value) {
            Ok(json) => {
                println!("{}", json);
                Ok(())
            }
            Err(e) => {
                eprintln!("Error: failed to encode output: {}", e);
                Err(1)
            }
        },
        Err(e) => {
            eprintln!("Error ({}): {}", e.status_code(), e);
            Err(exit_code(e))
        }
    }
}

fn exit_code(error: &ServiceError) -> i32 {
    match error.status_code() {
        400 => 2,
        404 => 3,
        409 => 4,
        _ => 1,
    }
}

/// Drain the outbox once and print the pass report.
pub async fn run_relay_once(
    config: Config,
    paths: Paths,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = CatalogState::open(config, paths).await?;
    let publisher = build_publisher(
        &state.config.publisher,
        Duration::from_secs(state.config.outbox.publish_timeout_secs),
    )
    .await?;

    let relay = OutboxRelay::new(state.outbox_db.clone(), publisher, state.relay_config());
    let report = relay.run_once().await;
    state.close().await;

    let report = report?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Delete processed records older than the window and print the count.
pub async fn run_sweep(
    config: Config,
    paths: Paths,
    older_than_days: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = CatalogState::open(config, paths).await?;
    let sweeper = RetentionSweeper::new(state.outbox_db.clone(), &state.retention_config())?;

    let result = match older_than_days {
        Some(days) => {
            let window = ChronoDuration::days(i64::from(days));
            match retention_cutoff(Utc::now(), window) {
                Ok(cutoff) => sweeper.cleanup(cutoff).await,
                Err(e) => Err(e),
            }
        }
        None => sweeper.sweep(Utc::now()).await,
    };
    state.close().await;

    let deleted = result?;
    info!(deleted, "Manual retention sweep finished");
    println!("{}", serde_json::json!({ "deleted": deleted }));
    Ok(())
}

/// Print unprocessed records in relay order.
pub async fn list_pending(
    config: Config,
    paths: Paths,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = CatalogState::open(config, paths).await?;
    let records = state
        .outbox_db
        .call(move |conn| queries::find_unprocessed_ordered_by_created_at(conn, limit))
        .await;
    state.close().await;

    println!("{}", serde_json::to_string_pretty(&records?)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fields(sku: &str) -> ProductFields {
        ProductFields {
            name: Some("Desk Lamp".to_string()),
            sku: Some(sku.to_string()),
            price: Some("24.99".to_string()),
            tags: vec!["lighting".to_string()],
            specs: vec!["wattage=40".to_string(), " color = black ".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_create_request_parses_price_and_specs() {
        let request = create_request(fields("LAMP-1")).unwrap();

        assert_eq!(request.price.cents(), 2499);
        assert_eq!(request.specifications.get("wattage").map(String::as_str), Some("40"));
        assert_eq!(request.specifications.get("color").map(String::as_str), Some("black"));
        assert_eq!(request.tags, vec!["lighting".to_string()]);
    }

    #[test]
    fn test_create_request_rejects_bad_input() {
        let mut bad_price = fields("LAMP-1");
        bad_price.price = Some("12.345".to_string());
        assert!(matches!(create_request(bad_price), Err(ServiceError::Validation(_))));

        let mut missing_price = fields("LAMP-1");
        missing_price.price = None;
        assert!(matches!(create_request(missing_price), Err(ServiceError::Validation(_))));

        let mut bad_spec = fields("LAMP-1");
        bad_spec.specs = vec!["no-separator".to_string()];
        assert!(matches!(create_request(bad_spec), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_update_request_leaves_absent_fields_unset() {
        let request = update_request(ProductFields {
            price: Some("5".to_string()),
            expected_version: Some(3),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(request.price.map(|p| p.cents()), Some(500));
        assert!(request.name.is_none());
        assert!(request.tags.is_none());
        assert!(request.specifications.is_none());
        assert_eq!(request.expected_version, Some(3));
    }

    #[test]
    fn test_print_json_exit_codes() {
        assert_eq!(print_json(&Ok(serde_json::json!({"ok": true}))), Ok(()));
        assert_eq!(
            print_json::<()>(&Err(ServiceError::NotFound("p-1".to_string()))),
            Err(3)
        );
        assert_eq!(
            print_json::<()>(&Err(ServiceError::ConcurrentModification("stale".to_string()))),
            Err(4)
        );
        assert_eq!(
            print_json::<()>(&Err(ServiceError::Validation("name".to_string()))),
            Err(2)
        );
    }

    #[tokio::test]
    async fn test_relay_once_drains_pending_events() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let state = CatalogState::open(Config::default(), paths.clone()).await.unwrap();
        state
            .service
            .create(create_request(fields("LAMP-1")).unwrap())
            .await
            .unwrap();
        state.close().await;

        run_relay_once(Config::default(), paths.clone()).await.unwrap();

        let state = CatalogState::open(Config::default(), paths).await.unwrap();
        let pending = state
            .outbox_db
            .call(|conn| queries::count_outbox_records(conn, true))
            .await
            .unwrap();
        let total = state
            .outbox_db
            .call(|conn| queries::count_outbox_records(conn, false))
            .await
            .unwrap();
        assert_eq!(pending, 0);
        assert_eq!(total, 1);
        state.close().await;
    }

    #[tokio::test]
    async fn test_sweep_keeps_recent_records() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let state = CatalogState::open(Config::default(), paths.clone()).await.unwrap();
        state
            .service
            .create(create_request(fields("LAMP-1")).unwrap())
            .await
            .unwrap();
        state.close().await;

        run_relay_once(Config::default(), paths.clone()).await.unwrap();
        run_sweep(Config::default(), paths.clone(), None).await.unwrap();

        let state = CatalogState::open(Config::default(), paths).await.unwrap();
        let total = state
            .outbox_db
            .call(|conn| queries::count_outbox_records(conn, false))
            .await
            .unwrap();
        assert_eq!(total, 1);
        state.close().await;
    }

    #[tokio::test]
    async fn test_sweep_rejects_out_of_range_window() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let result = run_sweep(Config::default(), paths, Some(u32::MAX)).await;
        assert!(result.is_err());
    }
}
