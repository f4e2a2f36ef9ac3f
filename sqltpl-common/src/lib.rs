// sqltpl-common - Row, value and paging types shared by the query template
//
// Nothing here talks to a database; the client crate binds these types to a driver.

pub mod dialect;
pub mod error;
pub mod mapping;
pub mod page;
pub mod record;
pub mod value;

// Re-export for convenience
pub use dialect::*;
pub use error::*;
pub use mapping::*;
pub use page::*;
pub use record::*;
pub use value::*;
