//! The outcome of an exec expectation.

use sqlmock_core::{Error, Result};

/// What a matched exec call reports back.
///
/// Last-insert-id and rows-affected are independent: either may be set to
/// fail without affecting the other.
#[derive(Debug, Clone)]
pub struct MockResult {
    last_insert_id: Result<i64>,
    rows_affected: Result<u64>,
}

impl MockResult {
    pub fn new(last_insert_id: i64, rows_affected: u64) -> Self {
        Self {
            last_insert_id: Ok(last_insert_id),
            rows_affected: Ok(rows_affected),
        }
    }

    /// A result whose facets both fail with `err`.
    pub fn error(err: Error) -> Self {
        Self {
            last_insert_id: Err(err.clone()),
            rows_affected: Err(err),
        }
    }

    #[must_use]
    pub fn with_last_insert_id_error(mut self, err: Error) -> Self {
        self.last_insert_id = Err(err);
        self
    }

    #[must_use]
    pub fn with_rows_affected_error(mut self, err: Error) -> Self {
        self.rows_affected = Err(err);
        self
    }

    #[allow(clippy::result_large_err)]
    pub fn last_insert_id(&self) -> Result<i64> {
        self.last_insert_id.clone()
    }

    #[allow(clippy::result_large_err)]
    pub fn rows_affected(&self) -> Result<u64> {
        self.rows_affected.clone()
    }
}
