//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    AdjustStock, CreateProduct, DeleteOutcome, ListProductsQuery, Product, ProductFilter,
    UpdateOutcome, UpdateProduct,
};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// Validates input, then issues exactly one repository call per operation.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.create(input).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// List products from the raw query string, rejecting malformed paging values
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ListProductsQuery) -> ProductResult<Vec<Product>> {
        let filter = ProductFilter::try_from(query)?;
        self.repository.list(filter).await
    }

    /// Apply a sparse update; an unknown id yields a zero-count outcome
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProduct,
    ) -> ProductResult<UpdateOutcome> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.update(id, input).await
    }

    /// Overwrite the stock level
    #[instrument(skip(self))]
    pub async fn adjust_stock(&self, id: Uuid, input: AdjustStock) -> ProductResult<UpdateOutcome> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        self.repository.set_stock(id, input.stock).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ProductResult<DeleteOutcome> {
        self.repository.delete(id).await
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
