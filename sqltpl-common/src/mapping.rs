//! # Row Mapping
//!
//! Purpose: Turn generic [`Record`]s into application types without runtime
//! introspection.
//!
//! ## Design Principles
//! 1. **Capability Traits**: A target shape opts in by implementing
//!    [`FromRecord`]; cells convert through [`FromValue`].
//! 2. **Name or Position**: Structs usually read by name with
//!    [`Record::get_as`]; tuples read by position.
//! 3. **Strict Conversions**: NULL never becomes a default value and integers
//!    never wrap. Both surface as [`MappingError`]s.
//!
//! ## Example
//!
//! ```rust
//! use sqltpl_common::{FromRecord, MappingResult, Record, Value};
//!
//! struct Item {
//!     id: i64,
//!     label: Option<String>,
//! }
//!
//! impl FromRecord for Item {
//!     fn from_record(record: Record) -> MappingResult<Self> {
//!         Ok(Item {
//!             id: record.get_as("id")?,
//!             label: record.get_as("label")?,
//!         })
//!     }
//! }
//!
//! let record: Record = [("id", Value::Integer(4)), ("label", Value::Null)]
//!     .into_iter()
//!     .collect();
//! let item = Item::from_record(record).unwrap();
//! assert_eq!(item.id, 4);
//! assert!(item.label.is_none());
//! ```

use crate::error::{MappingError, MappingResult};
use crate::record::Record;
use crate::value::Value;

/// Conversion from a single SQL value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> MappingResult<Self>;
}

/// Conversion from a whole row.
pub trait FromRecord: Sized {
    fn from_record(record: Record) -> MappingResult<Self>;
}

// The column label is filled in by `Record::get_as` / `get_index_as`.
fn unexpected_null(expected: &'static str) -> MappingError {
    MappingError::UnexpectedNull {
        column: String::new(),
        expected,
    }
}

fn mismatch(expected: &'static str, found: &Value) -> MappingError {
    MappingError::TypeMismatch {
        column: String::new(),
        expected,
        found: found.type_name(),
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> MappingResult<Self> {
        match value {
            Value::Integer(value) => Ok(*value),
            Value::Null => Err(unexpected_null("i64")),
            other => Err(mismatch("i64", other)),
        }
    }
}

macro_rules! impl_from_value_narrow {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> MappingResult<Self> {
                    match value {
                        Value::Integer(raw) => <$ty>::try_from(*raw).map_err(|_| MappingError::OutOfRange {
                            column: String::new(),
                            value: *raw,
                            expected: stringify!($ty),
                        }),
                        Value::Null => Err(unexpected_null(stringify!($ty))),
                        other => Err(mismatch(stringify!($ty), other)),
                    }
                }
            }
        )*
    };
}

impl_from_value_narrow!(i8, i16, i32, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> MappingResult<Self> {
        match value {
            Value::Real(value) => Ok(*value),
            Value::Integer(value) => Ok(*value as f64),
            Value::Null => Err(unexpected_null("f64")),
            other => Err(mismatch("f64", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> MappingResult<Self> {
        match value {
            Value::Integer(value) => Ok(*value != 0),
            Value::Null => Err(unexpected_null("bool")),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> MappingResult<Self> {
        match value {
            Value::Text(text) => Ok(text.clone()),
            Value::Null => Err(unexpected_null("String")),
            other => Err(mismatch("String", other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> MappingResult<Self> {
        match value {
            Value::Blob(data) => Ok(data.clone()),
            Value::Text(text) => Ok(text.as_bytes().to_vec()),
            Value::Null => Err(unexpected_null("Vec<u8>")),
            other => Err(mismatch("Vec<u8>", other)),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> MappingResult<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> MappingResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromRecord for Record {
    #[inline]
    fn from_record(record: Record) -> MappingResult<Self> {
        Ok(record)
    }
}

macro_rules! impl_from_record_tuple {
    ($($idx:tt => $ty:ident),+) => {
        /// Maps columns by position, after duplicate names have collapsed.
        ///
        /// A row built from `SELECT a.id, b.id, a.name` holds two columns
        /// (`id` from `b`, then `name`), so a three-element tuple does not
        /// line up with the select list. Alias duplicated columns apart.
        impl<$($ty: FromValue),+> FromRecord for ($($ty,)+) {
            fn from_record(record: Record) -> MappingResult<Self> {
                Ok(($(record.get_index_as::<$ty>($idx)?,)+))
            }
        }
    };
}

impl_from_record_tuple!(0 => A);
impl_from_record_tuple!(0 => A, 1 => B);
impl_from_record_tuple!(0 => A, 1 => B, 2 => C);
impl_from_record_tuple!(0 => A, 1 => B, 2 => C, 3 => D);
impl_from_record_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E);
impl_from_record_tuple!(0 => A, 1 => B, 2 => C, 3 => D, 4 => E, 5 => F);

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Record {
        [
            ("id", Value::Integer(300)),
            ("ratio", Value::Integer(2)),
            ("name", Value::Text("n".to_string())),
            ("note", Value::Null),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn narrow_integers_reject_overflow() {
        assert_eq!(u16::from_value(&Value::Integer(300)).unwrap(), 300);
        let err = row().get_as::<u8>("id").unwrap_err();
        assert_eq!(
            err,
            MappingError::OutOfRange {
                column: "id".to_string(),
                value: 300,
                expected: "u8"
            }
        );
        assert!(u64::from_value(&Value::Integer(-1)).is_err());
    }

    #[test]
    fn float_accepts_integer_storage() {
        assert_eq!(row().get_as::<f64>("ratio").unwrap(), 2.0);
    }

    #[test]
    fn mismatch_reports_storage_class() {
        let err = row().get_as::<i64>("name").unwrap_err();
        assert_eq!(
            err,
            MappingError::TypeMismatch {
                column: "name".to_string(),
                expected: "i64",
                found: "TEXT"
            }
        );
    }

    #[test]
    fn tuples_map_by_position() {
        let (id, ratio, name, note) =
            <(i64, f64, String, Option<String>)>::from_record(row()).unwrap();
        assert_eq!((id, ratio, name.as_str(), note), (300, 2.0, "n", None));
    }

    #[test]
    fn duplicate_names_shrink_the_tuple_width() {
        let joined: Record = [
            ("id", Value::Integer(1)),
            ("id", Value::Integer(2)),
        ]
        .into_iter()
        .collect();
        let (id,) = <(i64,)>::from_record(joined.clone()).unwrap();
        assert_eq!(id, 2);
        let err = <(i64, i64)>::from_record(joined).unwrap_err();
        assert_eq!(err, MappingError::IndexOutOfRange { index: 1, width: 1 });
    }

    #[test]
    fn tuple_wider_than_row_fails() {
        let narrow: Record = [("only", Value::Integer(1))].into_iter().collect();
        let err = <(i64, i64)>::from_record(narrow).unwrap_err();
        assert_eq!(err, MappingError::IndexOutOfRange { index: 1, width: 1 });
    }
}
