//! # SQL Query Template
//!
//! Purpose: Provide a compact, blocking facade for running parameterized SQL
//! against connections leased from an externally owned pool.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `QueryTemplate` hides leasing, transactions and row
//!    mapping behind one call per operation.
//! 2. **Scoped Leases**: Every operation acquires one connection and returns it
//!    on drop, whatever the exit path.
//! 3. **Explicit Ownership**: The pool is constructed by the caller and handed
//!    in; there is no global datasource.
//! 4. **Typed Mapping**: Rows become `Record`s or any `FromRecord` type.

mod pool;
mod row;
mod template;

pub use pool::{ConnectionPool, ConnectionSource, Database, PoolConfig, PoolState};
pub use template::{QueryTemplate, TemplateError, TemplateResult};

pub use sqltpl_common::{
    params, ColumnSelector, Dialect, FromRecord, FromValue, MappingError, MappingResult, Page,
    Record, Value,
};
