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


//! Database storage and models
//!
//! This module handles all database operations using SQLite via sqlx.
//!
//! # Database Schema
//! - Publishers: publishing houses
//! - Books: published titles, each owned by at most one publisher
//! - Shops: book shops
//! - Stocks: Book <-> Shop association with copies on hand
//! - Sales: transactions against stock entries
//!
//! # Usage Example
//! ```no_run
//! use bookstock::storage::{Database, NewPublisher, Record, queries};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Open the store and materialize the schema
//! let db = Database::connect("sqlite://bookstock.db").await?;
//! db.create_schema().await?;
//!
//! // Persist a batch atomically
//! let records = vec![Record::Publisher(NewPublisher::new("O'Reilly Media".to_string()))];
//! let ids = db.add_records(&records).await?;
//!
//! // Which shops sell this publisher's books?
//! let rows = queries::sales_by_publisher(db.pool(), "O'Reilly Media").await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

// Re-export commonly used types
pub use database::{Database, LoadReport};
pub use models::{
    Book, Column, Entity, NewBook, NewPublisher, NewSale, NewShop, NewStock, Publisher, Record,
    Sale, SeedRecord, Shop, Stock,
};
pub use queries::{Op, Predicate, Projection, SaleReportRow, Value};
