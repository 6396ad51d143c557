// Bookstock - Publisher/Book/Shop Sales Reporting
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! Database query functions
//!
//! Insert functions are generic over the executor so they run either directly
//! against the pool or inside a gateway transaction. Relationship navigation
//! is expressed as explicit foreign-key lookups in both directions for each
//! related pair. On top of those sits the generic `find` join/filter builder
//! and the publisher sales report built with it.

use crate::error::{Result, StoreError};
use crate::storage::models::*;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};

// ============================================================================
// INSERTS
// ============================================================================

/// Insert a new publisher. Returns the publisher id.
pub async fn insert_publisher(
    executor: impl Executor<'_, Database = Sqlite>,
    publisher: &NewPublisher,
) -> Result<i64> {
    let result = sqlx::query("INSERT INTO Publishers (id, name) VALUES (?, ?)")
        .bind(publisher.id)
        .bind(&publisher.name)
        .execute(executor)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a new book. Returns the book id.
pub async fn insert_book(executor: impl Executor<'_, Database = Sqlite>, book: &NewBook) -> Result<i64> {
    let result = sqlx::query("INSERT INTO Books (id, title, id_publisher) VALUES (?, ?, ?)")
        .bind(book.id)
        .bind(&book.title)
        .bind(book.id_publisher)
        .execute(executor)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a new shop. Returns the shop id.
pub async fn insert_shop(executor: impl Executor<'_, Database = Sqlite>, shop: &NewShop) -> Result<i64> {
    let result = sqlx::query("INSERT INTO Shops (id, name) VALUES (?, ?)")
        .bind(shop.id)
        .bind(&shop.name)
        .execute(executor)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a new stock entry. Returns the stock id.
pub async fn insert_stock(executor: impl Executor<'_, Database = Sqlite>, stock: &NewStock) -> Result<i64> {
    let result = sqlx::query("INSERT INTO Stocks (id, id_book, id_shop, count) VALUES (?, ?, ?, ?)")
        .bind(stock.id)
        .bind(stock.id_book)
        .bind(stock.id_shop)
        .bind(stock.count)
        .execute(executor)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a new sale. Returns the sale id.
pub async fn insert_sale(executor: impl Executor<'_, Database = Sqlite>, sale: &NewSale) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO Sales (id, price, date_sale, count, id_stock) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(sale.id)
    .bind(sale.price)
    .bind(sale.date_sale)
    .bind(sale.count)
    .bind(sale.id_stock)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a record of any entity kind. Returns the assigned id.
pub async fn insert_record(executor: impl Executor<'_, Database = Sqlite>, record: &Record) -> Result<i64> {
    match record {
        Record::Publisher(publisher) => insert_publisher(executor, publisher).await,
        Record::Book(book) => insert_book(executor, book).await,
        Record::Shop(shop) => insert_shop(executor, shop).await,
        Record::Stock(stock) => insert_stock(executor, stock).await,
        Record::Sale(sale) => insert_sale(executor, sale).await,
    }
}

// ============================================================================
// RELATIONSHIP NAVIGATION
// ============================================================================

/// Books owned by a publisher
pub async fn books_by_publisher(pool: &SqlitePool, publisher_id: i64) -> Result<Vec<Book>> {
    let books =
        sqlx::query_as::<_, Book>("SELECT * FROM Books WHERE id_publisher = ? ORDER BY title")
            .bind(publisher_id)
            .fetch_all(pool)
            .await?;

    Ok(books)
}

/// Publisher of a book, if the book has one
pub async fn publisher_of_book(pool: &SqlitePool, book_id: i64) -> Result<Option<Publisher>> {
    let publisher = sqlx::query_as::<_, Publisher>(
        r#"
        SELECT p.* FROM Publishers p
        INNER JOIN Books b ON b.id_publisher = p.id
        WHERE b.id = ?
        "#,
    )
    .bind(book_id)
    .fetch_optional(pool)
    .await?;

    Ok(publisher)
}

/// Stock entries holding a book
pub async fn stocks_by_book(pool: &SqlitePool, book_id: i64) -> Result<Vec<Stock>> {
    let stocks = sqlx::query_as::<_, Stock>("SELECT * FROM Stocks WHERE id_book = ?")
        .bind(book_id)
        .fetch_all(pool)
        .await?;

    Ok(stocks)
}

/// Stock entries held by a shop
pub async fn stocks_by_shop(pool: &SqlitePool, shop_id: i64) -> Result<Vec<Stock>> {
    let stocks = sqlx::query_as::<_, Stock>("SELECT * FROM Stocks WHERE id_shop = ?")
        .bind(shop_id)
        .fetch_all(pool)
        .await?;

    Ok(stocks)
}

/// The book a stock entry holds
pub async fn book_of_stock(pool: &SqlitePool, stock_id: i64) -> Result<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(
        r#"
        SELECT b.* FROM Books b
        INNER JOIN Stocks s ON s.id_book = b.id
        WHERE s.id = ?
        "#,
    )
    .bind(stock_id)
    .fetch_optional(pool)
    .await?;

    Ok(book)
}

/// The shop a stock entry belongs to
pub async fn shop_of_stock(pool: &SqlitePool, stock_id: i64) -> Result<Option<Shop>> {
    let shop = sqlx::query_as::<_, Shop>(
        r#"
        SELECT sh.* FROM Shops sh
        INNER JOIN Stocks s ON s.id_shop = sh.id
        WHERE s.id = ?
        "#,
    )
    .bind(stock_id)
    .fetch_optional(pool)
    .await?;

    Ok(shop)
}

/// Sales transacted against a stock entry
pub async fn sales_by_stock(pool: &SqlitePool, stock_id: i64) -> Result<Vec<Sale>> {
    let sales =
        sqlx::query_as::<_, Sale>("SELECT * FROM Sales WHERE id_stock = ? ORDER BY date_sale")
            .bind(stock_id)
            .fetch_all(pool)
            .await?;

    Ok(sales)
}

/// The stock entry a sale was transacted against
pub async fn stock_of_sale(pool: &SqlitePool, sale_id: i64) -> Result<Option<Stock>> {
    let stock = sqlx::query_as::<_, Stock>(
        r#"
        SELECT st.* FROM Stocks st
        INNER JOIN Sales sa ON sa.id_stock = st.id
        WHERE sa.id = ?
        "#,
    )
    .bind(sale_id)
    .fetch_optional(pool)
    .await?;

    Ok(stock)
}

// ============================================================================
// GENERIC JOIN/FILTER QUERIES
// ============================================================================

/// A bind value for a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }
}

/// An equality/comparison predicate against a qualified column.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub column: Column,
    pub op: Op,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: Column, op: Op, value: impl Into<Value>) -> Self {
        Self {
            column,
            op,
            value: value.into(),
        }
    }

    /// Equality predicate
    pub fn eq(column: Column, value: impl Into<Value>) -> Self {
        Self::new(column, Op::Eq, value)
    }
}

/// A projected output column, aliased to the field name the row type expects.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub column: Column,
    pub alias: &'static str,
}

impl Projection {
    pub fn new(column: Column, alias: &'static str) -> Self {
        Self { column, alias }
    }
}

/// Run a join query across `joins`, starting from `from`, and map the rows
/// into `T`.
///
/// Each entity in the chain is joined to the first already-joined entity it
/// shares a foreign-key edge with, so the chain [Stock, Book, Publisher,
/// Shop] starting from Sale resolves Shop against Stock. A chain element
/// with no edge to the joined set is an [`StoreError::InvalidJoinPath`]
/// error. An empty match is an empty vector, not an error.
pub async fn find<T>(
    pool: &SqlitePool,
    select: &[Projection],
    from: Entity,
    joins: &[Entity],
    predicates: &[Predicate],
    distinct: bool,
) -> Result<Vec<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let sql = build_query(select, from, joins, predicates, distinct)?;

    let mut query = sqlx::query_as::<_, T>(&sql);
    for predicate in predicates {
        query = match &predicate.value {
            Value::Int(value) => query.bind(*value),
            Value::Real(value) => query.bind(*value),
            Value::Text(value) => query.bind(value.clone()),
        };
    }

    Ok(query.fetch_all(pool).await?)
}

fn build_query(
    select: &[Projection],
    from: Entity,
    joins: &[Entity],
    predicates: &[Predicate],
    distinct: bool,
) -> Result<String> {
    let projections: Vec<String> = select
        .iter()
        .map(|p| format!("{} AS {}", p.column, p.alias))
        .collect();

    let mut sql = String::from("SELECT ");
    if distinct {
        sql.push_str("DISTINCT ");
    }
    sql.push_str(&projections.join(", "));
    sql.push_str(" FROM ");
    sql.push_str(from.table());

    let mut joined = vec![from];
    for &entity in joins {
        let condition = joined
            .iter()
            .find_map(|&already| join_condition(already, entity))
            .ok_or(StoreError::InvalidJoinPath(entity.table()))?;
        sql.push_str(&format!(" JOIN {} ON {}", entity.table(), condition));
        joined.push(entity);
    }

    if !predicates.is_empty() {
        let clauses: Vec<String> = predicates
            .iter()
            .map(|p| format!("{} {} ?", p.column, p.op.sql()))
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    Ok(sql)
}

// ============================================================================
// PUBLISHER SALES REPORT
// ============================================================================

/// One row of the publisher sales report.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SaleReportRow {
    pub title: String,
    pub shop: String,
    pub price: f64,
    pub date_sale: NaiveDate,
}

// Join chain connecting a sale to its publisher and the selling shop.
const SALE_REPORT_JOINS: [Entity; 4] = [Entity::Stock, Entity::Book, Entity::Publisher, Entity::Shop];

fn sale_report_projection() -> [Projection; 4] {
    [
        Projection::new(Entity::Book.col("title"), "title"),
        Projection::new(Entity::Shop.col("name"), "shop"),
        Projection::new(Entity::Sale.col("price"), "price"),
        Projection::new(Entity::Sale.col("date_sale"), "date_sale"),
    ]
}

/// Sales of a publisher's books across all shops.
///
/// A `publisher` made of ASCII digits resolves as the publisher id, anything
/// else as an exact name match. A publisher with no stock or sales yields an
/// empty vector.
pub async fn sales_by_publisher(pool: &SqlitePool, publisher: &str) -> Result<Vec<SaleReportRow>> {
    let predicate = publisher_predicate(publisher);
    find(
        pool,
        &sale_report_projection(),
        Entity::Sale,
        &SALE_REPORT_JOINS,
        &[predicate],
        false,
    )
    .await
}

/// Like [`sales_by_publisher`], but with lookup failures contained: errors
/// are logged and an empty result is returned rather than propagated.
pub async fn shops_selling_publisher(pool: &SqlitePool, publisher: &str) -> Vec<SaleReportRow> {
    match sales_by_publisher(pool, publisher).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, publisher, "publisher sales lookup failed");
            Vec::new()
        }
    }
}

fn publisher_predicate(publisher: &str) -> Predicate {
    let numeric = !publisher.is_empty() && publisher.bytes().all(|b| b.is_ascii_digit());
    match publisher.parse::<i64>() {
        Ok(id) if numeric => Predicate::eq(Entity::Publisher.col("id"), id),
        _ => Predicate::eq(Entity::Publisher.col("name"), publisher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::Database;

    /// Publisher with two books, each stocked and sold at the same shop.
    async fn seeded_db() -> (Database, i64) {
        let db = Database::new_in_memory().await.expect("Failed to create database");
        let pool = db.pool();

        let publisher_id = insert_publisher(pool, &NewPublisher::new("O'Reilly Media".to_string()))
            .await
            .expect("Failed to insert publisher");

        let book1 = insert_book(
            pool,
            &NewBook::new("Programming Rust".to_string(), Some(publisher_id)),
        )
        .await
        .expect("Failed to insert book");
        let book2 = insert_book(
            pool,
            &NewBook::new("Designing Data-Intensive Applications".to_string(), Some(publisher_id)),
        )
        .await
        .expect("Failed to insert book");

        let shop = insert_shop(pool, &NewShop::new("Буквоед".to_string()))
            .await
            .expect("Failed to insert shop");

        let stock1 = insert_stock(pool, &NewStock::new(book1, shop, 10))
            .await
            .expect("Failed to insert stock");
        let stock2 = insert_stock(pool, &NewStock::new(book2, shop, 5))
            .await
            .expect("Failed to insert stock");

        let date = NaiveDate::from_ymd_opt(2022, 11, 9).unwrap();
        insert_sale(pool, &NewSale::new(600.0, date, 2, stock1))
            .await
            .expect("Failed to insert sale");
        insert_sale(pool, &NewSale::new(950.0, date, 1, stock2))
            .await
            .expect("Failed to insert sale");

        (db, publisher_id)
    }

    #[tokio::test]
    async fn test_numeric_and_name_lookup_agree() {
        let (db, publisher_id) = seeded_db().await;

        let by_id = sales_by_publisher(db.pool(), &publisher_id.to_string())
            .await
            .expect("Failed to query by id");
        let by_name = sales_by_publisher(db.pool(), "O'Reilly Media")
            .await
            .expect("Failed to query by name");

        assert_eq!(by_id.len(), 2);
        assert_eq!(by_id, by_name);
    }

    #[tokio::test]
    async fn test_unmatched_publisher_yields_empty_result() {
        let (db, _) = seeded_db().await;

        let rows = sales_by_publisher(db.pool(), "No Such Publisher")
            .await
            .expect("Lookup must not fail");
        assert!(rows.is_empty());

        // publisher exists but has no stock or sales
        let lonely = insert_publisher(db.pool(), &NewPublisher::new("ПИТЕР".to_string()))
            .await
            .expect("Failed to insert publisher");
        let rows = sales_by_publisher(db.pool(), &lonely.to_string())
            .await
            .expect("Lookup must not fail");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_report_rows_carry_projected_fields() {
        let (db, _) = seeded_db().await;

        let mut rows = sales_by_publisher(db.pool(), "O'Reilly Media")
            .await
            .expect("Failed to query");
        rows.sort_by(|a, b| a.title.cmp(&b.title));

        assert_eq!(rows[1].title, "Programming Rust");
        assert_eq!(rows[1].shop, "Буквоед");
        assert_eq!(rows[1].price, 600.0);
        assert_eq!(rows[1].date_sale, NaiveDate::from_ymd_opt(2022, 11, 9).unwrap());
    }

    #[tokio::test]
    async fn test_distinct_deduplicates_shop_projection() {
        let (db, publisher_id) = seeded_db().await;

        #[derive(Debug, FromRow)]
        struct ShopRow {
            shop: String,
        }

        let select = [Projection::new(Entity::Shop.col("name"), "shop")];
        let predicate = [Predicate::eq(Entity::Publisher.col("id"), publisher_id)];

        // two books of the same publisher sold at the same shop: two paths
        let all: Vec<ShopRow> = find(db.pool(), &select, Entity::Sale, &SALE_REPORT_JOINS, &predicate, false)
            .await
            .expect("Failed to query");
        assert_eq!(all.len(), 2);

        let distinct: Vec<ShopRow> = find(db.pool(), &select, Entity::Sale, &SALE_REPORT_JOINS, &predicate, true)
            .await
            .expect("Failed to query");
        assert_eq!(distinct.len(), 1);
        assert_eq!(distinct[0].shop, "Буквоед");
    }

    #[tokio::test]
    async fn test_join_chain_without_edge_is_rejected() {
        let (db, _) = seeded_db().await;

        let select = [Projection::new(Entity::Publisher.col("name"), "name")];
        // Publisher shares no foreign key with Sale directly
        let result: Result<Vec<SaleReportRow>> =
            find(db.pool(), &select, Entity::Sale, &[Entity::Publisher], &[], false).await;

        assert!(matches!(result, Err(StoreError::InvalidJoinPath("Publishers"))));
    }

    #[tokio::test]
    async fn test_contained_lookup_returns_empty_on_error() {
        let db = Database::new_in_memory().await.expect("Failed to create database");

        // break the schema underneath the query
        sqlx::query("DROP TABLE Sales")
            .execute(db.pool())
            .await
            .expect("Failed to drop table");

        let rows = shops_selling_publisher(db.pool(), "1").await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_sale_back_to_publisher() {
        let (db, publisher_id) = seeded_db().await;

        #[derive(Debug, FromRow)]
        struct PublisherRow {
            id: i64,
            name: String,
        }

        let select = [
            Projection::new(Entity::Publisher.col("id"), "id"),
            Projection::new(Entity::Publisher.col("name"), "name"),
        ];
        let chain = [Entity::Stock, Entity::Book, Entity::Publisher];
        let rows: Vec<PublisherRow> =
            find(db.pool(), &select, Entity::Sale, &chain, &[], true).await.expect("Failed to query");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, publisher_id);
        assert_eq!(rows[0].name, "O'Reilly Media");
    }

    #[tokio::test]
    async fn test_navigation_both_directions() {
        let (db, publisher_id) = seeded_db().await;
        let pool = db.pool();

        let books = books_by_publisher(pool, publisher_id).await.expect("Failed to query books");
        assert_eq!(books.len(), 2);

        let publisher = publisher_of_book(pool, books[0].id)
            .await
            .expect("Failed to query publisher")
            .expect("Book lost its publisher");
        assert_eq!(publisher.id, publisher_id);

        let stocks = stocks_by_book(pool, books[0].id).await.expect("Failed to query stocks");
        assert_eq!(stocks.len(), 1);

        let shop = shop_of_stock(pool, stocks[0].id)
            .await
            .expect("Failed to query shop")
            .expect("Stock lost its shop");
        assert_eq!(shop.name, "Буквоед");
        assert_eq!(
            stocks_by_shop(pool, shop.id).await.expect("Failed to query stocks").len(),
            2
        );

        let sales = sales_by_stock(pool, stocks[0].id).await.expect("Failed to query sales");
        assert_eq!(sales.len(), 1);

        let stock = stock_of_sale(pool, sales[0].id)
            .await
            .expect("Failed to query stock")
            .expect("Sale lost its stock");
        assert_eq!(stock.id, stocks[0].id);
        assert_eq!(book_of_stock(pool, stock.id).await.unwrap().unwrap().id, books[0].id);
    }
}
