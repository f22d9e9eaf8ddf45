//! Products API routes

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use database::{DatabaseError, DatabaseResult, Readiness, mongodb::Database};
use domain_products::{MongoProductRepository, ProductError, ProductService, handlers};

use crate::state::AppState;

/// Create products router, guarded by the store readiness flag
pub fn router(state: &AppState) -> Router {
    let repository = MongoProductRepository::new(state.mongo.database());
    let service = ProductService::new(repository);
    require_store(handlers::router(service), state.mongo.readiness())
}

/// Reject every matched route until the store has connected
pub fn require_store(router: Router, readiness: Readiness) -> Router {
    router.route_layer(middleware::from_fn_with_state(readiness, store_guard))
}

async fn store_guard(
    State(readiness): State<Readiness>,
    request: Request,
    next: Next,
) -> Result<Response, ProductError> {
    readiness.ensure_ready()?;
    Ok(next.run(request).await)
}

/// Initialize products indexes; run once the connection is verified
pub async fn init_indexes(db: Database) -> DatabaseResult<()> {
    MongoProductRepository::new(&db)
        .init_indexes()
        .await
        .map_err(|e| DatabaseError::Generic(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn guarded(readiness: Readiness) -> Router {
        require_store(Router::new().route("/", get(|| async { "ok" })), readiness)
    }

    async fn call(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_guard_rejects_while_connecting() {
        let (status, body) = call(guarded(Readiness::new()), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Product store is not ready");
    }

    #[tokio::test]
    async fn test_guard_rejects_after_failure() {
        let readiness = Readiness::new();
        readiness.mark_failed();
        let (status, _) = call(guarded(readiness), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_guard_passes_when_connected() {
        let (status, body) = call(guarded(Readiness::connected()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }
}
