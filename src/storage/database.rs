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


//! Database connection and the persistence gateway
//!
//! This module opens the pooled SQLite connection and carries the batch
//! operations: atomic heterogeneous inserts and tagged seed loading. Each
//! operation scopes a connection (and, for batches, one transaction) to the
//! call; the pool and transaction guards release it on every exit path.
//!
//! # SQLite Configuration
//! - WAL mode
//! - Foreign keys enabled
//! - Normal synchronous mode (balance safety/speed)

use crate::error::{Result, StoreError};
use crate::storage::migrations;
use crate::storage::models::{Record, SeedRecord};
use crate::storage::queries;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    ConnectOptions, Sqlite, Transaction,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Outcome of a seed load: records persisted and items skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub added: usize,
    pub skipped: usize,
}

/// Database gateway - handles the connection pool and batch persistence
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a database from a connection string
    ///
    /// # Arguments
    /// * `url` - sqlx SQLite URL, e.g. `sqlite://bookstock.db` (the file is
    ///   created if missing) or `sqlite::memory:`
    ///
    /// # Errors
    /// Returns error if the URL can't be parsed or the database can't be
    /// opened. The schema is not touched here; call [`Database::create_schema`].
    pub async fn connect(url: &str) -> Result<Self> {
        let connect_opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30))
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(connect_opts)
            .await?;

        Ok(Self { pool })
    }

    /// Open a database file by path, creating parent directories as needed
    pub async fn open<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let path = database_path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Self::connect(&format!("sqlite://{}?mode=rwc", path.display())).await
    }

    /// Create in-memory database for testing
    ///
    /// The schema is created up front, so the result is ready for inserts.
    pub async fn new_in_memory() -> Result<Self> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?
            .foreign_keys(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(1) // In-memory DB typically single-threaded
            .connect_with(connect_opts)
            .await?;

        let db = Self { pool };
        db.create_schema().await?;

        Ok(db)
    }

    /// Materialize all entity structures in the backing store
    ///
    /// Idempotent: invoking it against an already-initialized store neither
    /// fails nor duplicates structures.
    pub async fn create_schema(&self) -> Result<()> {
        migrations::run_migrations(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

        Ok(())
    }

    /// Get reference to the connection pool
    ///
    /// Use this to execute queries directly on the pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close database and release all connections
    pub async fn close(self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }

    /// Persist a heterogeneous batch of records in one transaction
    ///
    /// On success every record's durable id is returned in input order. On
    /// any failure the entire batch is rolled back - no partial writes - a
    /// diagnostic is logged, and the error is returned to the caller.
    pub async fn add_records(&self, records: &[Record]) -> Result<Vec<i64>> {
        let mut tx = self.pool.begin().await?;

        match stage_records(&mut tx, records).await {
            Ok(ids) => {
                tx.commit().await?;
                tracing::debug!(count = ids.len(), "record batch committed");
                Ok(ids)
            }
            Err(e) => {
                tracing::error!(error = %e, "record batch failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Load a sequence of tagged seed records in one transaction
    ///
    /// Each item's entity-kind tag is resolved to its shape and staged for
    /// insertion. Items of unknown kind are skipped with a diagnostic and
    /// counted; they never abort the load. Any other failure (malformed
    /// fields, constraint violation) rolls back everything. Commits once at
    /// the end.
    pub async fn load_from_source(&self, items: &[SeedRecord]) -> Result<LoadReport> {
        let mut tx = self.pool.begin().await?;

        match stage_seed(&mut tx, items).await {
            Ok(report) => {
                tx.commit().await?;
                tracing::debug!(added = report.added, skipped = report.skipped, "seed batch committed");
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "seed load failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Load seed records from a JSON file holding an array of tagged objects
    pub async fn load_from_json_file<P: AsRef<Path>>(&self, path: P) -> Result<LoadReport> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let items: Vec<SeedRecord> = serde_json::from_str(&raw)?;
        self.load_from_source(&items).await
    }
}

async fn stage_records(tx: &mut Transaction<'_, Sqlite>, records: &[Record]) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        ids.push(queries::insert_record(&mut **tx, record).await?);
    }
    Ok(ids)
}

async fn stage_seed(tx: &mut Transaction<'_, Sqlite>, items: &[SeedRecord]) -> Result<LoadReport> {
    let mut report = LoadReport::default();
    for item in items {
        match item.clone().into_record() {
            Ok(record) => {
                queries::insert_record(&mut **tx, &record).await?;
                report.added += 1;
            }
            Err(StoreError::UnknownRecordKind(kind)) => {
                tracing::warn!(kind = %kind, "skipping record of unknown kind");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}
