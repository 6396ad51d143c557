//! Bookstock: publisher/book/shop/stock/sale storage and sales reporting
//!
//! A small relational core over SQLite: five entities joined through two
//! association entities (Stock linking Book and Shop, Sale linking to Stock),
//! a transactional persistence gateway for heterogeneous record batches and
//! tagged seed data, and a generic join/filter query engine used to report
//! which shops sell a given publisher's books.
//!
//! - [`storage`] - entities, schema migrations, the [`storage::Database`]
//!   gateway, and the query engine
//! - [`report`] - fixed-width table rendering of report rows
//! - [`config`] - connection-string resolution from the environment
//! - [`error`] - the crate-wide [`StoreError`] taxonomy

pub mod config;
pub mod error;
pub mod report;
pub mod storage;

pub use error::{Result, StoreError};
pub use storage::{Database, LoadReport};
