//! Error taxonomy shared by the wire codecs and the connectors.
//!
//! None of these cross the asynchronous boundary as faults: the operation
//! pipeline folds every one of them into a `Failure` on the delivered result.

/// Connection or I/O failure before a usable response was obtained.
///
/// Carries no payload. Messages are rendered from the underlying transport
/// error so the type stays `Clone` and comparable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFault {
    #[error("invalid endpoint {url}: {message}")]
    InvalidEndpoint { url: String, message: String },
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("sending request failed: {0}")]
    Send(String),
    #[error("reading response failed: {0}")]
    Receive(String),
    #[error("exchange timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("invocation cancelled")]
    Cancelled,
    #[error("invocation worker failed: {0}")]
    Worker(String),
}

/// A success status whose payload does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFault {
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("required field `{0}` missing from payload")]
    MissingField(&'static str),
    #[error("field `{field}` expected {expected}, found {found}")]
    UnexpectedType {
        field: String,
        expected: &'static str,
        found: String,
    },
    #[error("row {index}: {source}")]
    Row {
        index: usize,
        #[source]
        source: Box<ParseFault>,
    },
}

impl ParseFault {
    pub(crate) fn unexpected(
        field: impl Into<String>,
        expected: &'static str,
        found: &serde_json::Value,
    ) -> Self {
        Self::UnexpectedType {
            field: field.into(),
            expected,
            found: json_kind(found).to_string(),
        }
    }

    pub(crate) fn in_row(self, index: usize) -> Self {
        Self::Row {
            index,
            source: Box::new(self),
        }
    }
}

/// Input fields could not be converted to the wire format.
#[derive(Debug, thiserror::Error)]
#[error("failed to serialize inputs: {0}")]
pub struct SerializationError(#[from] pub serde_json::Error);

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn row_fault_wraps_source() {
        let fault = ParseFault::unexpected("Part_Key", "integer", &json!("abc")).in_row(3);
        assert_eq!(
            fault.to_string(),
            "row 3: field `Part_Key` expected integer, found string"
        );
    }

    #[test]
    fn transport_fault_messages() {
        assert_eq!(
            TransportFault::Timeout { after_ms: 250 }.to_string(),
            "exchange timed out after 250ms"
        );
        assert_eq!(TransportFault::Cancelled.to_string(), "invocation cancelled");
    }
}
