//! Operations described at runtime rather than by a compiled shape.

use std::collections::BTreeMap;

use datasource_core::wire::json::{OutputDecoder, RowDecoder};
use datasource_core::{DataSourceKey, GenericRow, ParseFault, RowReader, Value};
use serde_json::{Map, Value as Json};

use super::Shape;

/// Any data source key, with inputs as a name/value map.
///
/// Outputs and rows come back as [`GenericRow`]s in wire order. Inputs are
/// serialized in name order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicShape {
    key: DataSourceKey,
}

impl DynamicShape {
    #[must_use]
    pub fn new(key: impl Into<DataSourceKey>) -> Self {
        Self { key: key.into() }
    }
}

impl Shape for DynamicShape {
    type Inputs = BTreeMap<String, Value>;
    type Output = GenericRow;
    type Row = GenericRow;

    fn key(&self) -> DataSourceKey {
        self.key
    }

    fn output_decoder() -> Option<OutputDecoder<GenericRow>> {
        Some(decode_outputs)
    }

    fn row_decoder() -> Option<RowDecoder<GenericRow>> {
        Some(decode_row)
    }
}

#[allow(clippy::unnecessary_wraps)]
fn decode_outputs(outputs: &Map<String, Json>) -> Result<GenericRow, ParseFault> {
    Ok(GenericRow::from_reader(RowReader::Named(outputs)))
}

#[allow(clippy::unnecessary_wraps)]
fn decode_row(reader: RowReader<'_>) -> Result<Option<GenericRow>, ParseFault> {
    if reader.is_empty() {
        return Ok(None);
    }
    Ok(Some(GenericRow::from_reader(reader)))
}
