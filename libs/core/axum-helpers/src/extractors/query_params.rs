//! Query string extractor with JSON error responses.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

/// Drop-in replacement for [`axum::extract::Query`].
///
/// A query string that does not decode into `T` (e.g. a repeated key such as
/// `?limit=1&limit=2`) is rejected with a 400 `INVALID_QUERY`
/// [`ErrorResponse`](crate::errors::ErrorResponse) instead of axum's
/// plain-text body.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::QueryParams;
///
/// async fn list(QueryParams(query): QueryParams<ListProductsQuery>) -> String {
///     format!("{:?}", query.limit)
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(QueryParams(value))
    }
}
