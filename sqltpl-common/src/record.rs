//! # Records
//!
//! One result row as an ordered column → value mapping.
//!
//! ## Usage Notes
//!
//! - Column order follows the result set.
//! - Names are unique: pushing a name that already exists replaces the value
//!   in its original position (the last duplicate of a join wins).
//! - Name lookups ignore ASCII case, since SQL identifiers do.
//! - [`ColumnSelector::Index`] is 1-based like SQL column ordinals, while
//!   [`Record::get_index`] is 0-based like slices.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{MappingError, MappingResult};
use crate::mapping::FromValue;
use crate::value::Value;

/// Picks one column of a row by name or by 1-based ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Name(String),
    Index(usize),
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        ColumnSelector::Name(name.to_string())
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        ColumnSelector::Name(name)
    }
}

impl From<usize> for ColumnSelector {
    fn from(index: usize) -> Self {
        ColumnSelector::Index(index)
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::Name(name) => write!(f, "{}", name),
            ColumnSelector::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// One mapped result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    // Parallel vectors keep names and values contiguous for positional access.
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Record {
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends a column, or overwrites the value of an existing one.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.values[idx] = value,
            None => {
                self.columns.push(name);
                self.values.push(value);
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column names in result-set order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the 0-based position of a column.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|idx| &self.values[idx])
    }

    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Resolves a selector against this row.
    ///
    /// # Errors
    /// `MissingColumn` for an unknown name, `IndexOutOfRange` for an ordinal
    /// of 0 or past the last column.
    pub fn column(&self, selector: &ColumnSelector) -> MappingResult<&Value> {
        match selector {
            ColumnSelector::Name(name) => self
                .get(name)
                .ok_or_else(|| MappingError::MissingColumn(name.clone())),
            ColumnSelector::Index(index) => index
                .checked_sub(1)
                .and_then(|idx| self.values.get(idx))
                .ok_or(MappingError::IndexOutOfRange {
                    index: *index,
                    width: self.len(),
                }),
        }
    }

    /// Reads a named column into `T`.
    pub fn get_as<T: FromValue>(&self, name: &str) -> MappingResult<T> {
        let idx = self
            .position(name)
            .ok_or_else(|| MappingError::MissingColumn(name.to_string()))?;
        T::from_value(&self.values[idx]).map_err(|err| err.in_column(&self.columns[idx]))
    }

    /// Reads a 0-based column position into `T`.
    pub fn get_index_as<T: FromValue>(&self, idx: usize) -> MappingResult<T> {
        let value = self.values.get(idx).ok_or(MappingError::IndexOutOfRange {
            index: idx,
            width: self.len(),
        })?;
        T::from_value(value).map_err(|err| err.in_column(&self.columns[idx]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl<N: Into<String>> FromIterator<(N, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut record = Record::with_capacity(iter.size_hint().0);
        for (name, value) in iter {
            record.push(name, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
