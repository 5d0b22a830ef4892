//! Part master lookups.

use datasource_core::wire::json::{OutputDecoder, RowDecoder};
use datasource_core::{Column, DataSourceKey, ParseFault, RowReader};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::datasource::Shape;

// ---------------------------------------------------------------------------
// Part_Name_Output_Get
// ---------------------------------------------------------------------------

/// Resolve a part key to its name, returned as an output parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartNameOutputGet;

impl PartNameOutputGet {
    pub const KEY: DataSourceKey = DataSourceKey(721);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartKeyInputs {
    #[serde(rename = "Part_Key")]
    pub part_key: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartNameOutputs {
    pub name: Option<String>,
}

impl PartNameOutputs {
    const NAME: Column = Column::new(0, "Name");

    fn decode(outputs: &Map<String, Json>) -> Result<Self, ParseFault> {
        Ok(Self {
            name: RowReader::Named(outputs).string(&Self::NAME)?,
        })
    }
}

impl Shape for PartNameOutputGet {
    type Inputs = PartKeyInputs;
    type Output = PartNameOutputs;
    type Row = ();

    fn key(&self) -> DataSourceKey {
        Self::KEY
    }

    fn output_decoder() -> Option<OutputDecoder<PartNameOutputs>> {
        Some(PartNameOutputs::decode)
    }
}

// ---------------------------------------------------------------------------
// Parts_Picker_Get2
// ---------------------------------------------------------------------------

/// Search parts by part number.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartsPickerGet2;

impl PartsPickerGet2 {
    pub const KEY: DataSourceKey = DataSourceKey(1791);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartNoInputs {
    #[serde(rename = "Part_No")]
    pub part_no: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartPickerRow {
    pub part_key: Option<i32>,
    pub part_no_revision: Option<String>,
    pub name: Option<String>,
    pub part_status: Option<String>,
    pub old_part_no: Option<String>,
}

impl PartPickerRow {
    pub const PART_KEY: Column = Column::new(0, "Part_Key");
    pub const PART_NO_REVISION: Column = Column::new(1, "Part_No_Revision");
    pub const NAME: Column = Column::new(2, "Name");
    pub const PART_STATUS: Column = Column::new(3, "Part_Status");
    pub const OLD_PART_NO: Column = Column::new(4, "Old_Part_No");

    /// # Errors
    ///
    /// Returns `ParseFault` if a present field has the wrong type.
    pub fn decode(reader: RowReader<'_>) -> Result<Option<Self>, ParseFault> {
        if reader.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            part_key: reader.int(&Self::PART_KEY)?,
            part_no_revision: reader.string(&Self::PART_NO_REVISION)?,
            name: reader.string(&Self::NAME)?,
            part_status: reader.string(&Self::PART_STATUS)?,
            old_part_no: reader.string(&Self::OLD_PART_NO)?,
        }))
    }
}

impl Shape for PartsPickerGet2 {
    type Inputs = PartNoInputs;
    type Output = ();
    type Row = PartPickerRow;

    fn key(&self) -> DataSourceKey {
        Self::KEY
    }

    fn row_decoder() -> Option<RowDecoder<PartPickerRow>> {
        Some(PartPickerRow::decode)
    }
}

#[cfg(test)]
mod tests {
    use datasource_core::wire::json::{decode_success, encode_request};
    use datasource_core::WireFormat;

    use super::*;

    const PICKER_RESPONSE: &str = r#"{
        "outputs": {},
        "tables": [
            {
                "columns": ["Part_Key", "Part_No_Revision", "Name", "Part_Status", "Old_Part_No"],
                "rows": [
                    [1859416, "ABC", "ABC Name", "Production", ""],
                    [246334, "ABC-1-A", "Large Stamping", "Production", "OldPart No"]
                ],
                "rowLimitExceeded": false
            }
        ],
        "transactionNo": "3835453"
    }"#;

    #[test]
    fn keys() {
        assert_eq!(PartNameOutputGet.key(), DataSourceKey(721));
        assert_eq!(PartsPickerGet2.key(), DataSourceKey(1791));
    }

    #[test]
    fn part_key_input_json() {
        let inputs = PartKeyInputs { part_key: 1_859_416 };
        assert_eq!(encode_request(&inputs, WireFormat::Named).unwrap(), r#"{"Part_Key":1859416}"#);
        assert_eq!(
            encode_request(&PartNoInputs::default(), WireFormat::Tabular).unwrap(),
            r#"{"inputs":{"Part_No":""}}"#
        );
    }

    #[test]
    fn part_name_from_outputs() {
        let body = r#"{"outputs":{"Name":"Rear Suspension Arm"},"rows":[],"rowLimitExceeded":false,"transactionNo":"3836083"}"#;
        let success = decode_success(
            body,
            PartNameOutputGet::output_decoder(),
            PartNameOutputGet::row_decoder(),
        )
        .unwrap();
        assert_eq!(success.outputs.unwrap().name.as_deref(), Some("Rear Suspension Arm"));
        assert_eq!(success.transaction_no, "3836083");
        assert!(success.table.is_none());
    }

    #[test]
    fn picker_table_with_columns() {
        let success = decode_success(
            PICKER_RESPONSE,
            PartsPickerGet2::output_decoder(),
            PartsPickerGet2::row_decoder(),
        )
        .unwrap();
        assert_eq!(success.transaction_no, "3835453");

        let table = success.table.unwrap();
        assert!(!table.row_limit_exceeded);
        assert_eq!(table.columns.as_ref().map(Vec::len), Some(5));
        assert_eq!(table.columns.as_ref().unwrap()[3], "Part_Status");
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows[0],
            PartPickerRow {
                part_key: Some(1_859_416),
                part_no_revision: Some("ABC".to_string()),
                name: Some("ABC Name".to_string()),
                part_status: Some("Production".to_string()),
                old_part_no: Some(String::new()),
            }
        );
        assert_eq!(table.rows[1].old_part_no.as_deref(), Some("OldPart No"));
    }

    #[test]
    fn picker_named_rows() {
        let body = r#"{"rows":[{"Part_Key":1234}],"transactionNo":"1"}"#;
        let success =
            decode_success(body, None::<OutputDecoder<()>>, PartsPickerGet2::row_decoder())
                .unwrap();
        let table = success.table.unwrap();
        assert_eq!(table.rows[0].part_key, Some(1234));
        assert_eq!(table.rows[0].name, None);
        assert_eq!(success.transaction_no, "1");
    }
}
