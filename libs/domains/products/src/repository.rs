use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{
    CreateProduct, DeleteOutcome, Product, ProductFilter, UpdateOutcome, UpdateProduct,
};

/// Repository trait for Product persistence
///
/// Each method maps to exactly one store round-trip. Writes that target an
/// unknown id are not errors; they report zero counts in their outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product; a taken SKU yields `ProductError::DuplicateSku`
    async fn create(&self, input: CreateProduct) -> ProductResult<Product>;

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// List products in insertion order
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>>;

    /// Write only the fields present in `input` and refresh `updatedAt`
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<UpdateOutcome>;

    /// Overwrite the stock level
    async fn set_stock(&self, id: Uuid, stock: i64) -> ProductResult<UpdateOutcome>;

    async fn delete(&self, id: Uuid) -> ProductResult<DeleteOutcome>;
}
