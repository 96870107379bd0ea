//! Pre-loaded result sets and the cursors that replay them.

use sqlmock_core::{ColumnInfo, Error, MockErrorKind, Result, Row, SqlType, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Declared metadata for one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub sql_type: SqlType,
    pub nullable: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            nullable: true,
        }
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// A result set a query expectation hands back.
///
/// Once attached to an expectation it is never modified; every consumer
/// gets its own [`RowsCursor`].
///
/// ```
/// use sqlmock::Rows;
///
/// let rows = Rows::new(["id", "name"])
///     .add_row([sqlmock::Value::from(1), "Ann".into()])
///     .add_row([sqlmock::Value::from(2), "Bob".into()]);
/// assert_eq!(rows.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Rows {
    columns: Arc<ColumnInfo>,
    definitions: Option<Vec<ColumnDefinition>>,
    rows: Vec<Vec<Value>>,
    row_errors: BTreeMap<usize, Error>,
    close_error: Option<Error>,
}

impl Rows {
    /// Start a result set with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = columns.into_iter().map(Into::into).collect();
        Self {
            columns: Arc::new(ColumnInfo::new(names)),
            definitions: None,
            rows: Vec::new(),
            row_errors: BTreeMap::new(),
            close_error: None,
        }
    }

    /// Start a result set whose columns carry declared types.
    pub fn with_column_definitions(definitions: Vec<ColumnDefinition>) -> Self {
        let mut rows = Self::new(definitions.iter().map(|d| d.name.clone()));
        rows.definitions = Some(definitions);
        rows
    }

    /// Append a row.
    ///
    /// # Panics
    ///
    /// Panics if the number of values differs from the number of columns.
    /// Use [`Rows::try_add_row`] to get an error instead.
    #[must_use]
    pub fn add_row<I>(self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        match self.try_add_row(values) {
            Ok(rows) => rows,
            Err(e) => panic!("{}", e),
        }
    }

    /// Append a row, failing on a column-count mismatch.
    #[allow(clippy::result_large_err)]
    pub fn try_add_row<I>(mut self, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() != self.columns.len() {
            return Err(Error::mock(
                MockErrorKind::Declaration,
                format!(
                    "expected {} values in row {}, got {}",
                    self.columns.len(),
                    self.rows.len(),
                    values.len()
                ),
            ));
        }
        self.rows.push(values);
        Ok(self)
    }

    /// Append several rows.
    ///
    /// # Panics
    ///
    /// Panics on the first row whose width differs from the column count.
    #[must_use]
    pub fn add_rows<R, I>(self, rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        rows.into_iter().fold(self, Rows::add_row)
    }

    /// Make the cursor yield `err` in place of row `index` and then stop.
    ///
    /// `index == len()` places the error after the last row.
    ///
    /// # Panics
    ///
    /// Panics if `index` is past `len()`. Use [`Rows::try_row_error`] to get
    /// an error instead.
    #[must_use]
    pub fn row_error(self, index: usize, err: Error) -> Self {
        match self.try_row_error(index, err) {
            Ok(rows) => rows,
            Err(e) => panic!("{}", e),
        }
    }

    /// Attach a row error, failing if `index` is past `len()`.
    #[allow(clippy::result_large_err)]
    pub fn try_row_error(mut self, index: usize, err: Error) -> Result<Self> {
        if index > self.rows.len() {
            return Err(Error::mock(
                MockErrorKind::Declaration,
                format!(
                    "row error index {} is out of range, rows has {} rows",
                    index,
                    self.rows.len()
                ),
            ));
        }
        self.row_errors.insert(index, err);
        Ok(self)
    }

    /// Make closing the cursor fail with `err`.
    #[must_use]
    pub fn close_error(mut self, err: Error) -> Self {
        self.close_error = Some(err);
        self
    }

    pub fn columns(&self) -> &[String] {
        self.columns.names()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A forward-only reader over a [`Rows`] snapshot.
///
/// Reading past the last row yields `None`. After a row error or the end
/// of data the cursor stays exhausted.
#[derive(Debug)]
pub struct RowsCursor {
    snapshot: Arc<Rows>,
    pos: usize,
    done: bool,
}

impl RowsCursor {
    pub(crate) fn new(snapshot: Arc<Rows>) -> Self {
        Self {
            snapshot,
            pos: 0,
            done: false,
        }
    }

    pub fn columns(&self) -> &[String] {
        self.snapshot.columns()
    }

    /// Declared column types, `None` where the rows were built without them.
    pub fn column_types(&self) -> Vec<Option<SqlType>> {
        match &self.snapshot.definitions {
            Some(defs) => defs.iter().map(|d| Some(d.sql_type.clone())).collect(),
            None => vec![None; self.snapshot.columns.len()],
        }
    }

    /// Declared column definitions, if any.
    pub fn column_definitions(&self) -> Option<&[ColumnDefinition]> {
        self.snapshot.definitions.as_deref()
    }

    /// Release the cursor, returning the configured close error if any.
    #[allow(clippy::result_large_err)]
    pub fn close(self) -> Result<()> {
        match &self.snapshot.close_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Iterator for RowsCursor {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(err) = self.snapshot.row_errors.get(&self.pos) {
            self.done = true;
            return Some(Err(err.clone()));
        }
        let Some(values) = self.snapshot.rows.get(self.pos) else {
            self.done = true;
            return None;
        };
        self.pos += 1;
        Some(Ok(Row::with_columns(
            Arc::clone(&self.snapshot.columns),
            values.clone(),
        )))
    }
}
