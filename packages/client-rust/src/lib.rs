//! Data source client: configuration, connectors, the operation pipeline and
//! the catalogue of concrete operations.

pub mod config;
pub mod connector;
pub mod datasource;
pub mod logging;
pub mod operations;
pub mod soap;

pub use config::{ClientConfig, ConfigError};
pub use connector::{
    build_connector, build_soap_connector, layer_connector, BoxConnector, BoxSoapConnector,
};
pub use datasource::{
    DataSource, DataSourceCallback, DynamicShape, ExecuteError, Invocation, Shape,
};
pub use soap::WebServiceCall;
