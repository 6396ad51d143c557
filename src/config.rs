// Bookstock - Publisher/Book/Shop Sales Reporting
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Connection configuration
//!
//! The backing store is addressed by a single connection-string value taken
//! from the environment. A missing value is a fatal startup condition; the
//! CLI reports it and exits nonzero.

use crate::error::{Result, StoreError};

/// Environment variable holding the SQLite connection string,
/// e.g. `sqlite://bookstock.db` or `sqlite::memory:`.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Resolve the connection string from the environment.
pub fn database_url() -> Result<String> {
    database_url_from(DATABASE_URL_VAR)
}

fn database_url_from(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(url) if !url.trim().is_empty() => Ok(url),
        _ => Err(StoreError::configuration(format!(
            "{var} is not set; expected a SQLite connection string"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url_is_configuration_error() {
        let err = database_url_from("BOOKSTOCK_TEST_UNSET_URL").unwrap_err();
        assert!(matches!(err, StoreError::Configuration(_)));
    }

    #[test]
    fn test_url_read_from_environment() {
        std::env::set_var("BOOKSTOCK_TEST_SET_URL", "sqlite://test.db");
        let url = database_url_from("BOOKSTOCK_TEST_SET_URL").expect("Failed to read url");
        assert_eq!(url, "sqlite://test.db");
        std::env::remove_var("BOOKSTOCK_TEST_SET_URL");
    }
}
