//! Row access over both historical wire shapes.
//!
//! A concrete operation declares its fields once as [`Column`]s and reads them
//! through a [`RowReader`]. The reader resolves a column by position when the
//! server delivered the row as an array and by name when it delivered an
//! object, so the same decode function serves both protocol generations.

use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value as Json};

use crate::error::ParseFault;
use crate::value::{decimal_from_literal, Value};

/// One declared field of a row shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Position within a positional (array) row.
    pub index: usize,
    /// Wire name within a named (object) row.
    pub name: &'static str,
}

impl Column {
    #[must_use]
    pub const fn new(index: usize, name: &'static str) -> Self {
        Self { index, name }
    }
}

/// Borrowed view of one row element from a response payload.
#[derive(Debug, Clone, Copy)]
pub enum RowReader<'a> {
    Positional {
        values: &'a [Json],
        /// Column names of the enclosing table, when the server sent them.
        columns: Option<&'a [String]>,
    },
    Named(&'a Map<String, Json>),
}

impl<'a> RowReader<'a> {
    /// Pick the reader matching the element's JSON shape.
    ///
    /// # Errors
    ///
    /// Returns `ParseFault::UnexpectedType` when the element is neither an
    /// array nor an object.
    pub fn from_element(element: &'a Json) -> Result<Self, ParseFault> {
        match element {
            Json::Array(values) => Ok(Self::Positional {
                values,
                columns: None,
            }),
            Json::Object(map) => Ok(Self::Named(map)),
            other => Err(ParseFault::unexpected("row", "array or object", other)),
        }
    }

    /// Attach the enclosing table's column names to a positional row.
    #[must_use]
    pub fn with_columns(self, names: Option<&'a [String]>) -> Self {
        match self {
            Self::Positional { values, .. } => Self::Positional {
                values,
                columns: names,
            },
            named @ Self::Named(_) => named,
        }
    }

    /// Number of fields present in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Positional { values, .. } => values.len(),
            Self::Named(map) => map.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw element for a column; `None` when out of range, absent, or null.
    #[must_use]
    pub fn raw(&self, column: &Column) -> Option<&'a Json> {
        let element = match self {
            Self::Positional { values, .. } => values.get(column.index),
            Self::Named(map) => map.get(column.name),
        };
        element.filter(|v| !v.is_null())
    }

    /// # Errors
    ///
    /// `ParseFault::UnexpectedType` if the field holds an array, object or boolean.
    pub fn string(&self, column: &Column) -> Result<Option<String>, ParseFault> {
        match self.raw(column) {
            None => Ok(None),
            Some(Json::String(s)) => Ok(Some(s.clone())),
            Some(Json::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(ParseFault::unexpected(column.name, "string", other)),
        }
    }

    /// # Errors
    ///
    /// `ParseFault::UnexpectedType` if the field is not an integer that fits in `i32`.
    pub fn int(&self, column: &Column) -> Result<Option<i32>, ParseFault> {
        let Some(wide) = self.long(column)? else {
            return Ok(None);
        };
        i32::try_from(wide)
            .map(Some)
            .map_err(|_| ParseFault::UnexpectedType {
                field: column.name.to_string(),
                expected: "32-bit integer",
                found: wide.to_string(),
            })
    }

    /// # Errors
    ///
    /// `ParseFault::UnexpectedType` if the field is not an integer.
    pub fn long(&self, column: &Column) -> Result<Option<i64>, ParseFault> {
        match self.raw(column) {
            None => Ok(None),
            Some(number @ Json::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| ParseFault::unexpected(column.name, "integer", number)),
            Some(Json::String(s)) if s.trim().is_empty() => Ok(None),
            Some(text @ Json::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ParseFault::unexpected(column.name, "integer", text)),
            Some(other) => Err(ParseFault::unexpected(column.name, "integer", other)),
        }
    }

    /// Decimal field, exact to the digits the server sent.
    ///
    /// # Errors
    ///
    /// `ParseFault::UnexpectedType` if the field is not numeric.
    pub fn decimal(&self, column: &Column) -> Result<Option<Decimal>, ParseFault> {
        match self.raw(column) {
            None => Ok(None),
            Some(Json::String(s)) if s.trim().is_empty() => Ok(None),
            Some(raw @ (Json::Number(_) | Json::String(_))) => {
                let text = match raw {
                    Json::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                };
                decimal_from_literal(&text)
                    .map(Some)
                    .ok_or_else(|| ParseFault::unexpected(column.name, "decimal", raw))
            }
            Some(other) => Err(ParseFault::unexpected(column.name, "decimal", other)),
        }
    }

    /// Boolean field. Accepts JSON booleans, `0`/`1`, and `"true"`/`"false"`.
    ///
    /// # Errors
    ///
    /// `ParseFault::UnexpectedType` for any other value.
    pub fn boolean(&self, column: &Column) -> Result<Option<bool>, ParseFault> {
        match self.raw(column) {
            None => Ok(None),
            Some(Json::Bool(b)) => Ok(Some(*b)),
            Some(Json::Number(n)) if n.as_i64() == Some(0) => Ok(Some(false)),
            Some(Json::Number(n)) if n.as_i64() == Some(1) => Ok(Some(true)),
            Some(Json::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(Json::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(other) => Err(ParseFault::unexpected(column.name, "boolean", other)),
        }
    }
}

/// Schema-less row: ordered `(column name, value)` pairs.
///
/// Produced for SOAP result sets and for operations described at runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericRow {
    fields: Vec<(String, Value)>,
}

impl GenericRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a row element. Positional rows take their names from the
    /// table's column list, falling back to `column_<n>` past its end.
    #[must_use]
    pub fn from_reader(reader: RowReader<'_>) -> Self {
        let fields = match reader {
            RowReader::Positional { values, columns } => values
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let name = columns
                        .and_then(|c| c.get(i))
                        .cloned()
                        .unwrap_or_else(|| format!("column_{i}"));
                    (name, Value::from_json(item))
                })
                .collect(),
            RowReader::Named(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), Value::from_json(v)))
                .collect(),
        };
        Self { fields }
    }

    /// Set a column, replacing an existing value of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in order of appearance.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|(n, _)| n.clone()).collect()
    }
}

impl Serialize for GenericRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
