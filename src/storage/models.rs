//! Database models for Bookstock
//!
//! This module contains the five entities of the publisher/book/shop/stock/sale
//! schema, the insert-record shapes, the tagged seed-record input format, and
//! the join metadata the query engine navigates by.
//!
//! # SQLite Adaptations
//! - ids are `INTEGER PRIMARY KEY AUTOINCREMENT` rowids; insert records carry
//!   `Option<i64>` ids so seed data may supply explicit ids (a missing id
//!   autoassigns)
//! - Dates stored as TEXT in ISO 8601 format
//! - Relationships are foreign keys navigated by explicit lookups in both
//!   directions, not in-memory back-references

use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::error::{Result, StoreError};

// ============================================================================
// ENTITIES
// ============================================================================

/// Publishing house. Owns zero or more books.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Publisher {
    pub id: i64,
    pub name: String,
}

/// A published title. Belongs to at most one publisher.
///
/// The publisher reference is nullable; a book without one never appears in
/// publisher reports.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    /// Unique across all books
    pub title: String,
    #[sqlx(default)]
    pub id_publisher: Option<i64>,
}

/// Book shop. Owns zero or more stock entries.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Shop {
    pub id: i64,
    /// Unique across all shops
    pub name: String,
}

/// Association of one book with one shop: copies on hand.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub id_book: i64,
    pub id_shop: i64,
    /// Quantity on hand, non-negative
    pub count: i64,
}

/// A sale transacted against a stock entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    /// Non-negative sale price
    pub price: f64,
    pub date_sale: NaiveDate,
    /// Quantity sold
    pub count: i64,
    pub id_stock: i64,
}

// ============================================================================
// NEW RECORD STRUCTS (for inserts)
// ============================================================================

/// New publisher record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPublisher {
    pub id: Option<i64>,
    pub name: String,
}

impl NewPublisher {
    pub fn new(name: String) -> Self {
        Self { id: None, name }
    }
}

/// New book record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub id: Option<i64>,
    pub title: String,
    pub id_publisher: Option<i64>,
}

impl NewBook {
    pub fn new(title: String, id_publisher: Option<i64>) -> Self {
        Self {
            id: None,
            title,
            id_publisher,
        }
    }
}

/// New shop record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShop {
    pub id: Option<i64>,
    pub name: String,
}

impl NewShop {
    pub fn new(name: String) -> Self {
        Self { id: None, name }
    }
}

/// New stock record for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStock {
    pub id: Option<i64>,
    pub id_book: i64,
    pub id_shop: i64,
    pub count: i64,
}

impl NewStock {
    pub fn new(id_book: i64, id_shop: i64, count: i64) -> Self {
        Self {
            id: None,
            id_book,
            id_shop,
            count,
        }
    }
}

/// New sale record for insertion
///
/// `date_sale` deserializes from either a plain ISO date (`YYYY-MM-DD`) or an
/// RFC 3339 timestamp, of which the date part is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub id: Option<i64>,
    pub price: f64,
    #[serde(deserialize_with = "de_date_sale")]
    pub date_sale: NaiveDate,
    pub count: i64,
    pub id_stock: i64,
}

impl NewSale {
    pub fn new(price: f64, date_sale: NaiveDate, count: i64, id_stock: i64) -> Self {
        Self {
            id: None,
            price,
            date_sale,
            count,
            id_stock,
        }
    }
}

fn de_date_sale<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date_sale(&raw).map_err(serde::de::Error::custom)
}

/// Parse a sale date from seed input.
///
/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date_sale(raw: &str) -> std::result::Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|e| format!("invalid date_sale '{raw}': {e}"))
}

// ============================================================================
// HETEROGENEOUS RECORDS
// ============================================================================

/// A record of any entity kind, for heterogeneous batch inserts.
#[derive(Debug, Clone)]
pub enum Record {
    Publisher(NewPublisher),
    Book(NewBook),
    Shop(NewShop),
    Stock(NewStock),
    Sale(NewSale),
}

impl Record {
    /// Entity-kind tag, as used in seed input. Case-sensitive.
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Publisher(_) => "publisher",
            Record::Book(_) => "book",
            Record::Shop(_) => "shop",
            Record::Stock(_) => "stock",
            Record::Sale(_) => "sale",
        }
    }

    fn with_default_id(mut self, fallback: Option<i64>) -> Self {
        let id = match &mut self {
            Record::Publisher(r) => &mut r.id,
            Record::Book(r) => &mut r.id,
            Record::Shop(r) => &mut r.id,
            Record::Stock(r) => &mut r.id,
            Record::Sale(r) => &mut r.id,
        };
        if id.is_none() {
            *id = fallback;
        }
        self
    }
}

// ============================================================================
// TAGGED SEED RECORDS
// ============================================================================

/// One item of the seed input format: an entity-kind tag plus a mapping of
/// field name to value matching that entity's attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRecord {
    /// One of `publisher`, `book`, `shop`, `stock`, `sale` (case-sensitive)
    pub model: String,
    /// Explicit id carried alongside the fields; used when `fields` has none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<i64>,
    pub fields: serde_json::Value,
}

impl SeedRecord {
    /// Resolve the tag to its entity shape and construct an insert record.
    ///
    /// Returns [`StoreError::UnknownRecordKind`] for a tag outside the five
    /// entities and [`StoreError::InvalidRecordFields`] when the field mapping
    /// does not match the entity shape.
    pub fn into_record(self) -> Result<Record> {
        fn fields<T: DeserializeOwned>(kind: &str, value: serde_json::Value) -> Result<T> {
            serde_json::from_value(value).map_err(|e| StoreError::invalid_fields(kind, e.to_string()))
        }

        let record = match self.model.as_str() {
            "publisher" => Record::Publisher(fields(&self.model, self.fields)?),
            "book" => Record::Book(fields(&self.model, self.fields)?),
            "shop" => Record::Shop(fields(&self.model, self.fields)?),
            "stock" => Record::Stock(fields(&self.model, self.fields)?),
            "sale" => Record::Sale(fields(&self.model, self.fields)?),
            other => return Err(StoreError::UnknownRecordKind(other.to_string())),
        };

        Ok(record.with_default_id(self.pk))
    }
}

// ============================================================================
// JOIN METADATA
// ============================================================================

/// The five entities, as join-chain elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Publisher,
    Book,
    Shop,
    Stock,
    Sale,
}

impl Entity {
    /// Backing table name
    pub fn table(self) -> &'static str {
        match self {
            Entity::Publisher => "Publishers",
            Entity::Book => "Books",
            Entity::Shop => "Shops",
            Entity::Stock => "Stocks",
            Entity::Sale => "Sales",
        }
    }

    /// Qualified column reference, for projections and predicates
    pub fn col(self, name: &'static str) -> Column {
        Column { entity: self, name }
    }
}

/// A column qualified by the entity it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub entity: Entity,
    pub name: &'static str,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity.table(), self.name)
    }
}

// Foreign-key edges between entity pairs. Lookup is order-insensitive.
const FK_EDGES: &[(Entity, Entity, &str)] = &[
    (
        Entity::Book,
        Entity::Publisher,
        "Books.id_publisher = Publishers.id",
    ),
    (Entity::Stock, Entity::Book, "Stocks.id_book = Books.id"),
    (Entity::Stock, Entity::Shop, "Stocks.id_shop = Shops.id"),
    (Entity::Sale, Entity::Stock, "Sales.id_stock = Stocks.id"),
];

/// ON condition joining `a` and `b`, if the pair shares a foreign key.
pub fn join_condition(a: Entity, b: Entity) -> Option<&'static str> {
    FK_EDGES
        .iter()
        .find_map(|&(x, y, condition)| ((x == a && y == b) || (x == b && y == a)).then_some(condition))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seed_record_resolves_tag() {
        let seed = SeedRecord {
            model: "publisher".to_string(),
            pk: None,
            fields: json!({"name": "O'Reilly Media"}),
        };

        let record = seed.into_record().expect("Failed to resolve record");
        match record {
            Record::Publisher(p) => {
                assert_eq!(p.name, "O'Reilly Media");
                assert_eq!(p.id, None);
            }
            other => panic!("Wrong record kind: {}", other.kind()),
        }
    }

    #[test]
    fn test_seed_record_pk_fills_missing_id() {
        let seed = SeedRecord {
            model: "shop".to_string(),
            pk: Some(7),
            fields: json!({"name": "Буквоед"}),
        };

        match seed.into_record().expect("Failed to resolve record") {
            Record::Shop(s) => assert_eq!(s.id, Some(7)),
            other => panic!("Wrong record kind: {}", other.kind()),
        }
    }

    #[test]
    fn test_seed_record_explicit_id_wins_over_pk() {
        let seed = SeedRecord {
            model: "shop".to_string(),
            pk: Some(7),
            fields: json!({"id": 3, "name": "Подписные Издания"}),
        };

        match seed.into_record().expect("Failed to resolve record") {
            Record::Shop(s) => assert_eq!(s.id, Some(3)),
            other => panic!("Wrong record kind: {}", other.kind()),
        }
    }

    #[test]
    fn test_unknown_kind_is_not_resolved() {
        let seed = SeedRecord {
            model: "Publisher".to_string(), // tags are case-sensitive
            pk: None,
            fields: json!({"name": "x"}),
        };

        let err = seed.into_record().unwrap_err();
        assert!(matches!(err, StoreError::UnknownRecordKind(kind) if kind == "Publisher"));
    }

    #[test]
    fn test_malformed_fields_are_rejected() {
        let seed = SeedRecord {
            model: "stock".to_string(),
            pk: None,
            fields: json!({"id_book": 1}), // id_shop and count missing
        };

        let err = seed.into_record().unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecordFields { kind, .. } if kind == "stock"));
    }

    #[test]
    fn test_sale_date_accepts_plain_date_and_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2022, 11, 9).unwrap();
        assert_eq!(parse_date_sale("2022-11-09").unwrap(), expected);
        assert_eq!(parse_date_sale("2022-11-09T17:22:13.746Z").unwrap(), expected);
        assert!(parse_date_sale("09.11.2022").is_err());
    }

    #[test]
    fn test_join_conditions_are_symmetric() {
        assert_eq!(
            join_condition(Entity::Sale, Entity::Stock),
            join_condition(Entity::Stock, Entity::Sale),
        );
        assert!(join_condition(Entity::Stock, Entity::Shop).is_some());
        // no direct edge: Publisher connects to Shop only through the chain
        assert!(join_condition(Entity::Publisher, Entity::Shop).is_none());
    }
}
