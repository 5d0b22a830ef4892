//! Catalogue of concrete data source operations.
//!
//! Each operation is a unit struct implementing [`Shape`](crate::datasource::Shape):
//! its key, a serde input record, and decoders for outputs and rows. Row
//! fields are `Option`s; a field the server did not send stays `None`.

pub mod inventory;
pub mod part;

pub use inventory::{ContainerGet1, ContainerMoveSimple};
pub use part::{PartNameOutputGet, PartsPickerGet2};
