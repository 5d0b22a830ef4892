//! Tower middleware layers for connectors.
//!
//! - [`timeout`]: Per-exchange timeout enforcement
//! - [`trace`]: Exchange timing and outcome via `tracing` spans
//! - [`pipeline`]: Composes the layers around a connector

pub mod pipeline;
pub mod timeout;
pub mod trace;

pub use pipeline::{build_connector, build_soap_connector, layer_connector};
pub use timeout::TimeoutLayer;
pub use trace::InvocationTraceLayer;
