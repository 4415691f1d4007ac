//! Request types accepted by the product service.

use crate::{ServiceError, ServiceResult};
use catalog_database::{Price, Product};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Input for `ProductService::create`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub brand: Option<String>,
    pub sku: String,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("sku", &self.sku)
    }
}

/// Input for `ProductService::update`.
///
/// Absent fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub specifications: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Version the caller last read. When set, a newer stored version is a conflict.
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> ServiceResult<()> {
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(sku) = &self.sku {
            require_non_blank("sku", sku)?;
        }
        Ok(())
    }

    /// Overlay the provided fields onto `product`.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(category) = &self.category {
            product.category = Some(category.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(brand) = &self.brand {
            product.brand = Some(brand.clone());
        }
        if let Some(sku) = &self.sku {
            product.sku = sku.clone();
        }
        if let Some(specifications) = &self.specifications {
            product.specifications = specifications.clone();
        }
        if let Some(tags) = &self.tags {
            product.tags = tags.clone();
        }
    }
}

fn require_non_blank(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} must not be blank", field)));
    }
    Ok(())
}
