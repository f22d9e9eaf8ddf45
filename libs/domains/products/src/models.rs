use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::ProductError;

/// Unit a product is sold in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Unit {
    /// Piece
    Pz,
    /// Box
    Caja,
    /// Metre
    M,
    /// Kilogram
    Kg,
    /// Litre
    Lt,
}

/// Free-form key/value attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Attribute {
    #[validate(length(min = 1))]
    #[schema(example = "color")]
    pub key: String,
    #[validate(length(min = 1))]
    #[schema(example = "rojo")]
    pub value: String,
}

/// Product entity as stored in the `products` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id", with = "uuid_string")]
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    /// Unique stock keeping unit
    #[schema(example = "ABC123")]
    pub sku: String,
    #[schema(example = "Camiseta")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[schema(example = "Ropa")]
    pub category: String,
    pub unit: Unit,
    #[schema(example = 29.99)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub stock: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Supplier reference, not checked against any collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    #[validate(length(min = 1))]
    #[schema(example = "ABC123")]
    pub sku: String,
    #[validate(length(min = 1))]
    #[schema(example = "Camiseta")]
    pub name: String,
    pub brand: Option<String>,
    #[validate(length(min = 1))]
    #[schema(example = "Ropa")]
    pub category: String,
    pub unit: Unit,
    #[validate(range(min = 0.0))]
    #[schema(example = 29.99)]
    pub price: f64,
    #[validate(range(min = 0.0))]
    pub cost: Option<f64>,
    #[validate(range(min = 0))]
    #[serde(deserialize_with = "whole_number::deserialize")]
    #[schema(example = 100)]
    pub stock: i64,
    #[validate(range(min = 0))]
    #[serde(default, deserialize_with = "whole_number::deserialize_option")]
    pub min_stock: Option<i64>,
    pub location: Option<String>,
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub active: Option<bool>,
    #[serde(default)]
    #[validate(nested)]
    pub attributes: Vec<Attribute>,
}

/// Sparse update: only fields present in the payload are written.
///
/// `null` is treated like an absent key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[validate(length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[validate(length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[validate(length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[validate(range(min = 0.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[validate(range(min = 0.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[validate(range(min = 0))]
    #[serde(
        default,
        deserialize_with = "whole_number::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub stock: Option<i64>,
    #[validate(range(min = 0))]
    #[serde(
        default,
        deserialize_with = "whole_number::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_stock: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[validate(nested)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Attribute>>,
}

/// Absolute stock overwrite
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema)]
pub struct AdjustStock {
    #[validate(range(min = 0))]
    #[serde(deserialize_with = "whole_number::deserialize")]
    #[schema(example = 42)]
    pub stock: i64,
}

/// Result of an update or stock adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Result of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Raw query string of `GET /products`, validated into a [`ProductFilter`]
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    /// Case-insensitive text matched against name, brand and category
    pub q: Option<String>,
    /// `true` keeps only products with `stock <= minStock`
    pub min_stock_alert: Option<String>,
    /// Maximum number of results; 0 means no limit
    pub limit: Option<String>,
    /// Number of results to skip
    pub skip: Option<String>,
}

/// Validated listing criteria
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub low_stock_only: bool,
    pub limit: Option<i64>,
    pub skip: Option<u64>,
}

impl TryFrom<ListProductsQuery> for ProductFilter {
    type Error = ProductError;

    fn try_from(query: ListProductsQuery) -> Result<Self, Self::Error> {
        let limit = query
            .limit
            .as_deref()
            .map(|raw| parse_integer(raw).ok_or_else(|| invalid_integer("limit")))
            .transpose()?;

        let skip = query
            .skip
            .as_deref()
            .map(|raw| match parse_integer(raw) {
                Some(n) if n >= 0 => Ok(n as u64),
                _ => Err(invalid_integer("skip")),
            })
            .transpose()?;

        Ok(Self {
            search: query.q.filter(|q| !q.is_empty()),
            low_stock_only: query.min_stock_alert.as_deref() == Some("true"),
            limit,
            skip,
        })
    }
}

fn invalid_integer(field: &str) -> ProductError {
    ProductError::Validation(format!("{field} must be an integer"))
}

/// Parse a query value the way a numeric coercion would: `"5"`, `"5.0"` and
/// `"1e2"` are integers, `"abc"` and `"2.5"` are not. Blank means zero.
fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }

    whole_number::from_f64(trimmed.parse::<f64>().ok()?)
}

fn default_active() -> bool {
    true
}

impl Product {
    /// Create a new product from CreateProduct DTO
    pub fn new(input: CreateProduct) -> Self {
        let now = timestamp::now();
        Self {
            id: Uuid::now_v7(),
            sku: input.sku,
            name: input.name,
            brand: input.brand,
            category: input.category,
            unit: input.unit,
            price: input.price,
            cost: input.cost,
            stock: input.stock,
            min_stock: input.min_stock.unwrap_or_default(),
            location: input.location,
            supplier_id: input.supplier_id,
            tags: input.tags,
            image_url: input.image_url,
            active: input.active.unwrap_or(true),
            attributes: input.attributes,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Integer fields that also accept integer-valued JSON numbers such as `5.0`
mod whole_number {
    use serde::Deserialize;
    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use std::fmt;

    pub fn from_f64(value: f64) -> Option<i64> {
        let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
        (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
    }

    struct WholeNumber;

    impl Visitor<'_> for WholeNumber {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value).map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
            from_f64(value).ok_or_else(|| E::invalid_value(Unexpected::Float(value), &self))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(WholeNumber)
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        #[derive(Deserialize)]
        struct Whole(#[serde(deserialize_with = "deserialize")] i64);

        Ok(Option::<Whole>::deserialize(deserializer)?.map(|Whole(n)| n))
    }
}

/// Stores ids as plain strings so documents read back the same way
/// regardless of the serializer's human-readable flag.
mod uuid_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(D::Error::custom)
    }
}

/// Fixed-width RFC 3339 timestamps with millisecond precision.
///
/// Fixed width keeps string order equal to chronological order, which the
/// listing sort relies on.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Current time truncated to what is persisted
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}
