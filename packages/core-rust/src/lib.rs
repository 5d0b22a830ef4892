//! Data source core: wire types, codecs, and the unified result model.
//!
//! Nothing in this crate performs I/O. The client crate drives the transports
//! and feeds raw bodies through [`wire::json`] and [`wire::soap`].

pub mod credentials;
pub mod error;
pub mod progress;
pub mod result;
pub mod row;
pub mod types;
pub mod value;
pub mod wire;

pub use credentials::Credentials;
pub use error::{ParseFault, SerializationError, TransportFault};
pub use progress::{Progress, ProgressLog};
pub use result::{DataSourceResult, ErrorEntry, Failure, Success, Table};
pub use row::{Column, GenericRow, RowReader};
pub use types::{DataSourceKey, Environment, WireFormat};
pub use value::Value;

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
