//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{Document, doc, to_document},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    CreateProduct, DeleteOutcome, Product, ProductFilter, UpdateOutcome, UpdateProduct, timestamp,
};
use crate::repository::ProductRepository;

/// Collection holding product documents
pub const COLLECTION_NAME: &str = "products";

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB implementation of the ProductRepository
#[derive(Clone)]
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, COLLECTION_NAME)
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Create the unique SKU index and the listing sort index
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "sku": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_sku_unique".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "createdAt": 1, "_id": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_created_at".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Build a MongoDB filter document from ProductFilter
    fn build_filter(filter: &ProductFilter) -> Document {
        let mut doc = doc! {};

        if let Some(ref search) = filter.search {
            let pattern = regex::escape(search);
            doc.insert(
                "$or",
                vec![
                    doc! { "name": { "$regex": &pattern, "$options": "i" } },
                    doc! { "brand": { "$regex": &pattern, "$options": "i" } },
                    doc! { "category": { "$regex": &pattern, "$options": "i" } },
                ],
            );
        }

        if filter.low_stock_only {
            doc.insert("$expr", doc! { "$lte": ["$stock", "$minStock"] });
        }

        doc
    }

    fn build_find_options(filter: &ProductFilter) -> FindOptions {
        let mut options = FindOptions::default();
        options.limit = filter.limit.filter(|limit| *limit != 0);
        options.skip = filter.skip.filter(|skip| *skip != 0);
        options.sort = Some(doc! { "createdAt": 1, "_id": 1 });
        options
    }

    /// `$set` document for a sparse update; always refreshes `updatedAt`
    fn build_update(input: &UpdateProduct) -> ProductResult<Document> {
        let mut set = to_document(input).map_err(|e| ProductError::Database(e.to_string()))?;
        set.insert("updatedAt", timestamp::format(&timestamp::now()));
        Ok(doc! { "$set": set })
    }

    fn id_filter(id: Uuid) -> Document {
        doc! { "_id": id.to_string() }
    }
}

/// `true` when the server rejected a write because of a unique index
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_write_error(err: mongodb::error::Error, sku: Option<&str>) -> ProductError {
    match sku {
        Some(sku) if is_duplicate_key(&err) => ProductError::DuplicateSku(sku.to_string()),
        _ => err.into(),
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let product = Product::new(input);

        self.collection
            .insert_one(&product)
            .await
            .map_err(|e| map_write_error(e, Some(&product.sku)))?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let product = self.collection.find_one(Self::id_filter(id)).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let cursor = self
            .collection
            .find(Self::build_filter(&filter))
            .with_options(Self::build_find_options(&filter))
            .await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<UpdateOutcome> {
        let update = Self::build_update(&input)?;

        let result = self
            .collection
            .update_one(Self::id_filter(id), update)
            .await
            .map_err(|e| map_write_error(e, input.sku.as_deref()))?;

        tracing::info!(
            product_id = %id,
            matched = result.matched_count,
            modified = result.modified_count,
            "Product updated"
        );
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    #[instrument(skip(self))]
    async fn set_stock(&self, id: Uuid, stock: i64) -> ProductResult<UpdateOutcome> {
        let update = doc! {
            "$set": {
                "stock": stock,
                "updatedAt": timestamp::format(&timestamp::now()),
            }
        };

        let result = self
            .collection
            .update_one(Self::id_filter(id), update)
            .await?;

        tracing::info!(product_id = %id, stock, matched = result.matched_count, "Stock set");
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ProductResult<DeleteOutcome> {
        let result = self.collection.delete_one(Self::id_filter(id)).await?;

        if result.deleted_count > 0 {
            tracing::info!(product_id = %id, "Product deleted");
        }
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }
}
