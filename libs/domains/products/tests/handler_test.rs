use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use domain_products::{
    CreateProduct, DeleteOutcome, Product, ProductError, ProductFilter, ProductRepository,
    ProductResult, ProductService, UpdateOutcome, UpdateProduct, handlers, models::timestamp,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Case-insensitive substring match on name, brand or category, like the
/// store's `$regex` search
fn matches_search(product: &Product, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [Some(&product.name), product.brand.as_ref(), Some(&product.category)]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Overlay the serialized update onto the stored document, like `$set`
fn apply_update(product: &mut Product, update: &UpdateProduct) {
    let mut document = serde_json::to_value(&*product).unwrap();
    if let Value::Object(fields) = serde_json::to_value(update).unwrap() {
        for (key, value) in fields {
            document[key] = value;
        }
    }
    document["updatedAt"] = json!(timestamp::format(&timestamp::now()));
    *product = serde_json::from_value(document).unwrap();
}

/// Vec-backed repository mirroring the store's semantics
#[derive(Clone, Default)]
struct InMemoryProductRepository {
    products: Arc<Mutex<Vec<Product>>>,
}

impl InMemoryProductRepository {
    fn sku_taken(products: &[Product], sku: &str, except: Option<Uuid>) -> bool {
        products
            .iter()
            .any(|p| p.sku == sku && Some(p.id) != except)
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, input: CreateProduct) -> ProductResult<Product> {
        let mut products = self.products.lock().unwrap();
        if Self::sku_taken(&products, &input.sku, None) {
            return Err(ProductError::DuplicateSku(input.sku));
        }
        let product = Product::new(input);
        products.push(product.clone());
        Ok(product)
    }

    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let products = self.products.lock().unwrap();
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, filter: ProductFilter) -> ProductResult<Vec<Product>> {
        let products = self.products.lock().unwrap();
        let matching = products
            .iter()
            .filter(|p| filter.search.as_deref().is_none_or(|q| matches_search(p, q)))
            .filter(|p| !filter.low_stock_only || p.stock <= p.min_stock)
            .skip(filter.skip.unwrap_or(0) as usize);

        let limited: Vec<Product> = match filter.limit.filter(|l| *l != 0) {
            Some(limit) => matching.take(limit.unsigned_abs() as usize).cloned().collect(),
            None => matching.cloned().collect(),
        };
        Ok(limited)
    }

    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<UpdateOutcome> {
        let mut products = self.products.lock().unwrap();
        if let Some(ref sku) = input.sku {
            if Self::sku_taken(&products, sku, Some(id)) {
                return Err(ProductError::DuplicateSku(sku.clone()));
            }
        }
        let matched = match products.iter_mut().find(|p| p.id == id) {
            Some(product) => {
                apply_update(product, &input);
                1
            }
            None => 0,
        };
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: matched,
            modified_count: matched,
        })
    }

    async fn set_stock(&self, id: Uuid, stock: i64) -> ProductResult<UpdateOutcome> {
        self.update(
            id,
            UpdateProduct {
                stock: Some(stock),
                ..Default::default()
            },
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> ProductResult<DeleteOutcome> {
        let mut products = self.products.lock().unwrap();
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: (before - products.len()) as u64,
        })
    }
}

fn app() -> Router {
    let service = ProductService::new(InMemoryProductRepository::default());
    Router::new().nest("/api/products", handlers::router(service))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn product_payload(sku: &str, name: &str) -> Value {
    json!({
        "sku": sku,
        "name": name,
        "brand": "Acme",
        "category": "General",
        "unit": "pz",
        "price": 10.5,
        "stock": 20,
        "minStock": 5
    })
}

async fn create(app: &Router, payload: Value) -> Value {
    let (status, body) = send(app, "POST", "/api/products", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

fn names(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn create_returns_201_with_system_fields() {
    let app = app();
    let body = create(&app, product_payload("SKU-1", "Camiseta")).await;

    let id = body["_id"].as_str().unwrap();
    assert!(Uuid::parse_str(id).is_ok());
    assert!(body["createdAt"].is_string());
    assert!(body["updatedAt"].is_string());
    assert_eq!(body["active"], true);
    assert_eq!(body["minStock"], 5);
}

#[tokio::test]
async fn duplicate_sku_is_rejected() {
    let app = app();
    create(&app, product_payload("SKU-1", "First")).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/products",
        Some(product_payload("SKU-1", "Second")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("SKU-1"));
}

#[tokio::test]
async fn invalid_unit_is_rejected() {
    let app = app();
    let mut payload = product_payload("SKU-1", "Camiseta");
    payload["unit"] = json!("xyz");

    let (status, body) = send(&app, "POST", "/api/products", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn negative_price_is_rejected() {
    let app = app();
    let mut payload = product_payload("SKU-1", "Camiseta");
    payload["price"] = json!(-5);

    let (status, body) = send(&app, "POST", "/api/products", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("price"));
}

#[tokio::test]
async fn whole_number_stock_is_accepted() {
    let app = app();
    let mut payload = product_payload("SKU-1", "Camiseta");
    payload["stock"] = json!(5.0);

    let body = create(&app, payload).await;
    assert_eq!(body["stock"], 5);
}

#[tokio::test]
async fn missing_required_field_is_rejected() {
    let app = app();
    let mut payload = product_payload("SKU-1", "Camiseta");
    payload.as_object_mut().unwrap().remove("category");

    let (status, _) = send(&app, "POST", "/api/products", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filters_by_search_text() {
    let app = app();
    create(&app, product_payload("SKU-1", "Camiseta")).await;
    create(&app, product_payload("SKU-2", "Pantalon")).await;
    let mut scam = product_payload("SKU-3", "Gorra");
    scam["brand"] = json!("CAMPER");
    create(&app, scam).await;

    let (status, body) = send(&app, "GET", "/api/products?q=cam", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["Camiseta", "Gorra"]);
}

#[tokio::test]
async fn list_filters_low_stock() {
    let app = app();
    let mut low = product_payload("SKU-1", "Low");
    low["stock"] = json!(5);
    low["minStock"] = json!(10);
    create(&app, low).await;

    let mut fine = product_payload("SKU-2", "Fine");
    fine["stock"] = json!(10);
    fine["minStock"] = json!(5);
    create(&app, fine).await;

    let (_, body) = send(&app, "GET", "/api/products?minStockAlert=true", None).await;
    assert_eq!(names(&body), ["Low"]);

    let (_, body) = send(&app, "GET", "/api/products?minStockAlert=yes", None).await;
    assert_eq!(names(&body).len(), 2);
}

#[tokio::test]
async fn list_paginates_in_insertion_order() {
    let app = app();
    for i in 1..=4 {
        create(&app, product_payload(&format!("SKU-{i}"), &format!("P{i}"))).await;
    }

    let (_, body) = send(&app, "GET", "/api/products?limit=2&skip=1", None).await;
    assert_eq!(names(&body), ["P2", "P3"]);

    let (_, body) = send(&app, "GET", "/api/products?limit=0", None).await;
    assert_eq!(names(&body).len(), 4);
}

#[tokio::test]
async fn list_rejects_non_integer_limit() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/products?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "limit must be an integer");

    let (status, body) = send(&app, "GET", "/api/products?skip=1.5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "skip must be an integer");
}

#[tokio::test]
async fn list_rejects_repeated_limit_with_json_error() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/products?limit=1&limit=2", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_QUERY");
    assert!(body["message"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn get_unknown_id_is_404() {
    let app = app();
    let uri = format!("/api/products/{}", Uuid::now_v7());
    let (status, body) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
async fn malformed_id_is_400() {
    let app = app();
    let (status, _) = send(&app, "GET", "/api/products/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", "/api/products/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_update_changes_only_given_fields() {
    let app = app();
    let created = create(&app, product_payload("SKU-1", "Camiseta")).await;
    let uri = format!("/api/products/{}", created["_id"].as_str().unwrap());

    let (status, outcome) = send(&app, "PATCH", &uri, Some(json!({"price": 19.99}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        outcome,
        json!({"acknowledged": true, "matchedCount": 1, "modifiedCount": 1})
    );

    let (_, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(fetched["price"], 19.99);
    for field in ["sku", "name", "brand", "category", "unit", "stock", "minStock", "createdAt"] {
        assert_eq!(fetched[field], created[field], "{field} changed");
    }
}

#[tokio::test]
async fn partial_update_validates_present_fields() {
    let app = app();
    let created = create(&app, product_payload("SKU-1", "Camiseta")).await;
    create(&app, product_payload("SKU-2", "Other")).await;
    let uri = format!("/api/products/{}", created["_id"].as_str().unwrap());

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({"stock": -1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({"sku": "SKU-2"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn partial_update_of_unknown_id_matches_nothing() {
    let app = app();
    let uri = format!("/api/products/{}", Uuid::now_v7());
    let (status, outcome) = send(&app, "PATCH", &uri, Some(json!({"name": "X"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["matchedCount"], 0);
}

#[tokio::test]
async fn adjust_stock_to_zero_is_persisted() {
    let app = app();
    let created = create(&app, product_payload("SKU-1", "Camiseta")).await;
    let uri = format!("/api/products/{}", created["_id"].as_str().unwrap());

    let (status, outcome) = send(
        &app,
        "PATCH",
        &format!("{uri}/adjust-stock"),
        Some(json!({"stock": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["modifiedCount"], 1);

    let (_, fetched) = send(&app, "GET", &uri, None).await;
    assert_eq!(fetched["stock"], 0);
}

#[tokio::test]
async fn adjust_stock_rejects_negative_and_non_integer() {
    let app = app();
    let created = create(&app, product_payload("SKU-1", "Camiseta")).await;
    let uri = format!(
        "/api/products/{}/adjust-stock",
        created["_id"].as_str().unwrap()
    );

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({"stock": -2}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PATCH", &uri, Some(json!({"stock": 2.5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = app();
    let created = create(&app, product_payload("SKU-1", "Camiseta")).await;
    let uri = format!("/api/products/{}", created["_id"].as_str().unwrap());

    let (status, outcome) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome, json!({"acknowledged": true, "deletedCount": 1}));

    let (status, outcome) = send(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["deletedCount"], 0);

    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
