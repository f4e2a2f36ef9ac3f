//! # Query Template
//!
//! Purpose: Run one parameterized statement per call against a leased
//! connection and hand back plain Rust values.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: Callers never see the pool, the transaction or the
//!    driver's row type.
//! 2. **Acquire → Execute → Release**: Each operation is one linear lease. The
//!    lease guard is dropped before rows are mapped, so a mapping failure never
//!    pins a connection.
//! 3. **Mutations Are Atomic**: Updates and batches run in one transaction that
//!    commits once or rolls back entirely.
//! 4. **Empty Is Not An Error**: Zero rows is `Ok(vec![])` or `Ok(None)`.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use thiserror::Error;
use tracing::{debug, error, warn};

use sqltpl_common::{
    clamp_page_number, effective_page, row_offset, ColumnSelector, Dialect, FromRecord, FromValue,
    MappingError, MappingResult, Page, Record, Value,
};

use crate::pool::ConnectionSource;
use crate::row::{bind, read_count, read_records};

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors surfaced by the query template.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No connection became free within the pool's timeout. Nothing ran.
    #[error("connection pool exhausted: {0}")]
    PoolExhausted(#[source] r2d2::Error),

    /// The pool could not open its initial connections.
    #[error("failed to open connection pool: {0}")]
    Connect(#[source] r2d2::Error),

    /// The driver rejected or failed the statement.
    ///
    /// Mutating operations have already rolled back.
    #[error("failed to execute `{sql}`: {source}")]
    Execution {
        sql: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A row did not fit the requested shape. The connection is already released.
    #[error("row mapping failed: {0}")]
    Mapping(#[from] MappingError),

    /// Page sizes must be positive and representable in SQL.
    #[error("invalid page size {0} (expected 1..={})", i64::MAX)]
    InvalidPageSize(u64),
}

/// Blocking facade over a pooled connection source.
///
/// Holds no mutable state; share it across threads when `S` allows.
#[derive(Debug, Clone)]
pub struct QueryTemplate<S> {
    source: S,
    dialect: Dialect,
}

impl<S: ConnectionSource> QueryTemplate<S> {
    /// Creates a template using the SQLite paging syntax.
    pub fn new(source: S) -> Self {
        Self::with_dialect(source, Dialect::default())
    }

    pub fn with_dialect(source: S, dialect: Dialect) -> Self {
        QueryTemplate { source, dialect }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Runs one statement in its own transaction and returns the affected row count.
    pub fn execute(&self, sql: &str, params: &[Value]) -> TemplateResult<usize> {
        debug!(sql, params = params.len(), "execute");
        self.in_transaction(sql, |tx| tx.execute(sql, bind(params)))
    }

    /// Runs `sql` once per parameter row inside a single transaction.
    ///
    /// Returns the affected row count of each execution, in order. If any row
    /// fails, every row is rolled back. An empty batch does not lease a
    /// connection.
    pub fn execute_batch<P: AsRef<[Value]>>(
        &self,
        sql: &str,
        rows: &[P],
    ) -> TemplateResult<Vec<usize>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        debug!(sql, rows = rows.len(), "execute batch");
        self.in_transaction(sql, |tx| {
            let mut stmt = tx.prepare_cached(sql)?;
            let mut affected = Vec::with_capacity(rows.len());
            for row in rows {
                affected.push(stmt.execute(bind(row.as_ref()))?);
            }
            Ok(affected)
        })
    }

    /// Returns every row as a [`Record`].
    pub fn query_all(&self, sql: &str, params: &[Value]) -> TemplateResult<Vec<Record>> {
        self.fetch(sql, params, None)
    }

    /// Returns every row mapped by `mapper`.
    ///
    /// Use this when a one-off projection does not deserve a `FromRecord` impl.
    pub fn query_all_with<T, F>(&self, sql: &str, params: &[Value], mapper: F) -> TemplateResult<Vec<T>>
    where
        F: FnMut(Record) -> MappingResult<T>,
    {
        let records = self.fetch(sql, params, None)?;
        Ok(records.into_iter().map(mapper).collect::<MappingResult<Vec<T>>>()?)
    }

    /// Returns every row mapped onto `T`.
    pub fn query_all_as<T: FromRecord>(&self, sql: &str, params: &[Value]) -> TemplateResult<Vec<T>> {
        self.query_all_with(sql, params, T::from_record)
    }

    /// Returns the first row, or `None` when nothing matched.
    pub fn query_first(&self, sql: &str, params: &[Value]) -> TemplateResult<Option<Record>> {
        Ok(self.fetch(sql, params, Some(1))?.into_iter().next())
    }

    pub fn query_first_as<T: FromRecord>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> TemplateResult<Option<T>> {
        let first = self.query_first(sql, params)?;
        Ok(first.map(T::from_record).transpose()?)
    }

    /// Returns one column of the first row.
    ///
    /// `selector` is a column name or a 1-based column index. `Ok(None)` means
    /// no row matched; a NULL cell is `Some(Value::Null)`.
    pub fn query_scalar(
        &self,
        sql: &str,
        params: &[Value],
        selector: impl Into<ColumnSelector>,
    ) -> TemplateResult<Option<Value>> {
        let selector = selector.into();
        match self.query_first(sql, params)? {
            Some(record) => Ok(Some(record.column(&selector)?.clone())),
            None => Ok(None),
        }
    }

    pub fn query_scalar_as<T: FromValue>(
        &self,
        sql: &str,
        params: &[Value],
        selector: impl Into<ColumnSelector>,
    ) -> TemplateResult<Option<T>> {
        let selector = selector.into();
        match self.query_scalar(sql, params, selector.clone())? {
            Some(value) => {
                let typed = T::from_value(&value).map_err(|err| err.in_column(&selector.to_string()))?;
                Ok(Some(typed))
            }
            None => Ok(None),
        }
    }

    /// Counts the rows `sql` would return.
    pub fn count(&self, sql: &str, params: &[Value]) -> TemplateResult<u64> {
        let conn = self.source.acquire()?;
        self.count_on(&conn, sql, params)
    }

    /// Returns the rows of one page without counting the full result.
    ///
    /// Pages below 1 read the first page; pages past the end are empty.
    pub fn query_range<T: FromRecord>(
        &self,
        sql: &str,
        params: &[Value],
        page_number: i64,
        page_size: u64,
    ) -> TemplateResult<Vec<T>> {
        let page_size = checked_page_size(page_size)?;
        let offset = row_offset(clamp_page_number(page_number), page_size).min(i64::MAX as u64);
        let paged = self.dialect.paginate(sql, offset, page_size);
        self.query_all_as(&paged, params)
    }

    /// Returns one page of `sql` plus the total row count.
    ///
    /// **Logic**:
    /// 1. Count the full result through a wrapping subquery.
    /// 2. Resolve the requested page: below 1 reads page 1, past the end reads
    ///    the last page, an empty result is page 1.
    /// 3. Fetch that page with the dialect's offset/limit clause.
    ///
    /// Both statements run in one deferred read transaction on one leased
    /// connection, so `total_count` and `items` see the same snapshot.
    pub fn query_page<T: FromRecord>(
        &self,
        sql: &str,
        params: &[Value],
        page_number: i64,
        page_size: u64,
    ) -> TemplateResult<Page<T>> {
        let page_size = checked_page_size(page_size)?;

        let (records, page_number, total_count) = {
            let mut conn = self.source.acquire()?;
            // Dropping an unfinished read transaction rolls it back.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Deferred)
                .map_err(|source| execution_error(sql, source))?;
            let total_count = self.count_on(&tx, sql, params)?;
            let page_number = effective_page(page_number, page_size, total_count);
            let records = if total_count == 0 {
                Vec::new()
            } else {
                let paged = self
                    .dialect
                    .paginate(sql, row_offset(page_number, page_size), page_size);
                debug!(sql = %paged, page_number, total_count, "query page");
                read_records(&tx, &paged, params, None)
                    .map_err(|source| execution_error(&paged, source))?
            };
            tx.commit().map_err(|source| execution_error(sql, source))?;
            (records, page_number, total_count)
        };

        let items = records
            .into_iter()
            .map(T::from_record)
            .collect::<MappingResult<Vec<T>>>()?;
        Ok(Page {
            items,
            page_number,
            page_size,
            total_count,
        })
    }

    fn fetch(&self, sql: &str, params: &[Value], limit: Option<usize>) -> TemplateResult<Vec<Record>> {
        debug!(sql, params = params.len(), "query");
        let conn = self.source.acquire()?;
        read_records(&conn, sql, params, limit).map_err(|source| execution_error(sql, source))
    }

    fn count_on(&self, conn: &Connection, sql: &str, params: &[Value]) -> TemplateResult<u64> {
        let count_sql = self.dialect.count_query(sql);
        debug!(sql = %count_sql, "count");
        read_count(conn, &count_sql, params).map_err(|source| execution_error(&count_sql, source))
    }

    /// Leases a connection and runs `op` inside an immediate transaction.
    ///
    /// Commits on success. On failure the transaction is rolled back before
    /// the lease is dropped, then the driver error is returned.
    fn in_transaction<R, F>(&self, sql: &str, op: F) -> TemplateResult<R>
    where
        F: FnOnce(&Transaction<'_>) -> rusqlite::Result<R>,
    {
        let mut conn = self.source.acquire()?;
        // IMMEDIATE takes the write lock up front so concurrent writers wait
        // on the busy handler instead of failing a lock upgrade.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|source| execution_error(sql, source))?;

        match op(&tx) {
            Ok(value) => {
                tx.commit().map_err(|source| execution_error(sql, source))?;
                Ok(value)
            }
            Err(source) => {
                match tx.rollback() {
                    Ok(()) => warn!(sql, "transaction rolled back"),
                    Err(err) => warn!(sql, error = %err, "rollback failed"),
                }
                Err(execution_error(sql, source))
            }
        }
    }
}

fn execution_error(sql: &str, source: rusqlite::Error) -> TemplateError {
    error!(sql, error = %source, "statement failed");
    TemplateError::Execution {
        sql: sql.to_string(),
        source,
    }
}

fn checked_page_size(page_size: u64) -> TemplateResult<u64> {
    if page_size == 0 || page_size > i64::MAX as u64 {
        return Err(TemplateError::InvalidPageSize(page_size));
    }
    Ok(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_bounds() {
        assert!(matches!(checked_page_size(0), Err(TemplateError::InvalidPageSize(0))));
        assert!(checked_page_size(1).is_ok());
        assert!(checked_page_size(i64::MAX as u64).is_ok());
        assert!(checked_page_size(u64::MAX).is_err());
    }

    #[test]
    fn execution_error_keeps_statement() {
        let err = execution_error("SELECT nope", rusqlite::Error::InvalidQuery);
        let message = err.to_string();
        assert!(message.contains("SELECT nope"), "{message}");
    }
}
