//! Container lookups and moves.

use datasource_core::wire::json::{OutputDecoder, RowDecoder};
use datasource_core::{Column, DataSourceKey, ParseFault, RowReader};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::datasource::Shape;

// ---------------------------------------------------------------------------
// Container_Get1
// ---------------------------------------------------------------------------

/// Look up a container by serial number.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerGet1;

impl ContainerGet1 {
    pub const KEY: DataSourceKey = DataSourceKey(6455);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerGet1Inputs {
    #[serde(rename = "Serial_No")]
    pub serial_no: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerRow {
    pub part_no_revision: Option<String>,
    pub name: Option<String>,
    pub part_key: Option<i32>,
    pub operation_code: Option<String>,
    pub quantity: Option<Decimal>,
    pub container_status: Option<String>,
    pub location: Option<String>,
    pub note: Option<String>,
    pub operation_key: Option<i32>,
    pub rework_operation: Option<i32>,
    pub special_instructions: Option<String>,
    pub defect_type: Option<String>,
}

impl ContainerRow {
    pub const PART_NO_REVISION: Column = Column::new(0, "Part_No_Revision");
    pub const NAME: Column = Column::new(1, "Name");
    pub const PART_KEY: Column = Column::new(2, "Part_Key");
    pub const OPERATION_CODE: Column = Column::new(3, "Operation_Code");
    pub const QUANTITY: Column = Column::new(4, "Quantity");
    pub const CONTAINER_STATUS: Column = Column::new(5, "Container_Status");
    pub const LOCATION: Column = Column::new(6, "Location");
    pub const NOTE: Column = Column::new(7, "Note");
    pub const OPERATION_KEY: Column = Column::new(8, "Operation_Key");
    pub const REWORK_OPERATION: Column = Column::new(9, "Rework_Operation");
    pub const SPECIAL_INSTRUCTIONS: Column = Column::new(10, "Special_Instructions");
    pub const DEFECT_TYPE: Column = Column::new(11, "Defect_Type");

    /// An empty positional row carries no container and is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ParseFault` if a present field has the wrong type.
    pub fn decode(reader: RowReader<'_>) -> Result<Option<Self>, ParseFault> {
        if reader.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            part_no_revision: reader.string(&Self::PART_NO_REVISION)?,
            name: reader.string(&Self::NAME)?,
            part_key: reader.int(&Self::PART_KEY)?,
            operation_code: reader.string(&Self::OPERATION_CODE)?,
            quantity: reader.decimal(&Self::QUANTITY)?,
            container_status: reader.string(&Self::CONTAINER_STATUS)?,
            location: reader.string(&Self::LOCATION)?,
            note: reader.string(&Self::NOTE)?,
            operation_key: reader.int(&Self::OPERATION_KEY)?,
            rework_operation: reader.int(&Self::REWORK_OPERATION)?,
            special_instructions: reader.string(&Self::SPECIAL_INSTRUCTIONS)?,
            defect_type: reader.string(&Self::DEFECT_TYPE)?,
        }))
    }
}

impl Shape for ContainerGet1 {
    type Inputs = ContainerGet1Inputs;
    type Output = ();
    type Row = ContainerRow;

    fn key(&self) -> DataSourceKey {
        Self::KEY
    }

    fn row_decoder() -> Option<RowDecoder<ContainerRow>> {
        Some(ContainerRow::decode)
    }
}

// ---------------------------------------------------------------------------
// Container_Move_Simple
// ---------------------------------------------------------------------------

/// Move a container to a new location.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerMoveSimple;

impl ContainerMoveSimple {
    pub const KEY: DataSourceKey = DataSourceKey(17218);
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerMoveInputs {
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Serial_No")]
    pub serial_no: String,
    /// Employee key recorded as the mover.
    #[serde(rename = "Update_By")]
    pub update_by: i32,
    /// Have the server reject unknown locations.
    #[serde(rename = "ValidateLocation")]
    pub validate_location: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerMoveOutputs {
    pub ret_val: Option<i32>,
}

impl ContainerMoveOutputs {
    const RET_VAL: Column = Column::new(0, "RetVal");

    fn decode(outputs: &Map<String, Json>) -> Result<Self, ParseFault> {
        Ok(Self {
            ret_val: RowReader::Named(outputs).int(&Self::RET_VAL)?,
        })
    }
}

impl Shape for ContainerMoveSimple {
    type Inputs = ContainerMoveInputs;
    type Output = ContainerMoveOutputs;
    type Row = ();

    fn key(&self) -> DataSourceKey {
        Self::KEY
    }

    fn output_decoder() -> Option<OutputDecoder<ContainerMoveOutputs>> {
        Some(ContainerMoveOutputs::decode)
    }
}
