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


//! Database migrations
//!
//! This module handles database schema creation and migrations.
//!
//! # Migration Strategy
//! Migrations are runtime SQL execution tracked in the `_migrations` table.
//! Every statement is guarded by `IF NOT EXISTS`, so schema creation is
//! idempotent: running it against an already-initialized store neither fails
//! nor duplicates structures.

use crate::error::Result;
use sqlx::{Executor, SqlitePool};

/// Run all database migrations
///
/// This function creates the database schema and applies any pending
/// migrations. Migrations are tracked in the `_migrations` table.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Create migrations tracking table
    create_migrations_table(pool).await?;

    // Run all migrations in order
    run_migration(pool, 1, "initial_schema", create_initial_schema(pool)).await?;

    Ok(())
}

/// Create migrations tracking table
async fn create_migrations_table(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;

    Ok(())
}

/// Run a single migration if it hasn't been applied yet
async fn run_migration(
    pool: &SqlitePool,
    id: i32,
    name: &str,
    migration_fn: impl std::future::Future<Output = Result<()>>,
) -> Result<()> {
    // Check if migration has been applied
    let applied: Option<i32> = sqlx::query_scalar("SELECT id FROM _migrations WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    if applied.is_some() {
        // Migration already applied
        return Ok(());
    }

    // Run migration
    migration_fn.await?;

    // Record migration
    sqlx::query("INSERT INTO _migrations (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Create initial database schema
///
/// Creates the five entity tables with their relationships, constraints, and
/// indexes. Referential integrity cascades from Publisher down through
/// Book and Stock to Sale.
async fn create_initial_schema(pool: &SqlitePool) -> Result<()> {
    pool.execute(
        r#"
-- Publishers table: publishing houses
CREATE TABLE IF NOT EXISTS Publishers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

-- Books table: published titles, at most one publisher each
CREATE TABLE IF NOT EXISTS Books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE,
    id_publisher INTEGER,
    FOREIGN KEY (id_publisher) REFERENCES Publishers(id) ON DELETE CASCADE
);

-- Shops table: book shops
CREATE TABLE IF NOT EXISTS Shops (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

-- Stocks table: Book <-> Shop association, copies on hand
CREATE TABLE IF NOT EXISTS Stocks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_book INTEGER NOT NULL,
    id_shop INTEGER NOT NULL,
    count INTEGER NOT NULL CHECK (count >= 0),
    FOREIGN KEY (id_book) REFERENCES Books(id) ON DELETE CASCADE,
    FOREIGN KEY (id_shop) REFERENCES Shops(id) ON DELETE CASCADE
);

-- Sales table: transactions against stock entries
CREATE TABLE IF NOT EXISTS Sales (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    price REAL NOT NULL CHECK (price >= 0),
    date_sale TEXT NOT NULL,  -- ISO 8601 date (YYYY-MM-DD)
    count INTEGER NOT NULL CHECK (count >= 0),
    id_stock INTEGER NOT NULL,
    FOREIGN KEY (id_stock) REFERENCES Stocks(id) ON DELETE CASCADE
);

-- ============================================================================
-- INDEXES for the report join chain
-- ============================================================================

CREATE INDEX IF NOT EXISTS idx_books_publisher ON Books(id_publisher);
CREATE INDEX IF NOT EXISTS idx_stocks_book ON Stocks(id_book);
CREATE INDEX IF NOT EXISTS idx_stocks_shop ON Stocks(id_shop);
CREATE INDEX IF NOT EXISTS idx_sales_stock ON Sales(id_stock);
CREATE INDEX IF NOT EXISTS idx_sales_date ON Sales(date_sale);
        "#,
    )
    .await?;

    Ok(())
}
