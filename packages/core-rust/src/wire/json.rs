//! JSON request/response codec for the data source execute endpoint.
//!
//! Request bodies are produced from a typed input struct; the only difference
//! between protocol generations is whether the object is nested under
//! `"inputs"`. Responses are read from a `serde_json::Value` tree so that both
//! the `tables` (positional rows) and top-level `rows` (named rows) layouts can
//! be accepted without a version marker.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::error::{ParseFault, SerializationError};
use crate::result::{ErrorEntry, Failure, Success, Table};
use crate::row::RowReader;
use crate::types::WireFormat;

/// Builds an operation's output object from the payload's `outputs` element.
pub type OutputDecoder<O> = fn(&Map<String, Json>) -> Result<O, ParseFault>;

/// Builds one row. Returning `Ok(None)` skips the element (e.g. an empty
/// positional array).
pub type RowDecoder<R> = fn(RowReader<'_>) -> Result<Option<R>, ParseFault>;

const TRANSACTION_NO: &str = "transactionNo";

#[derive(Serialize)]
struct WrappedInputs<'a, T> {
    inputs: &'a T,
}

#[derive(Deserialize)]
struct WrappedInputsOwned<T> {
    inputs: T,
}

/// Serialize an operation's inputs into the POST body.
///
/// # Errors
///
/// Returns `SerializationError` if the inputs cannot be represented as JSON.
pub fn encode_request<T: Serialize>(
    inputs: &T,
    format: WireFormat,
) -> Result<String, SerializationError> {
    let body = if format.wraps_inputs() {
        serde_json::to_string(&WrappedInputs { inputs })?
    } else {
        serde_json::to_string(inputs)?
    };
    Ok(body)
}

/// Inverse of [`encode_request`]; used by fake servers and tests.
///
/// # Errors
///
/// Returns `SerializationError` if the body does not hold the expected inputs.
pub fn decode_request<T: DeserializeOwned>(
    body: &str,
    format: WireFormat,
) -> Result<T, SerializationError> {
    if format.wraps_inputs() {
        let wrapped: WrappedInputsOwned<T> = serde_json::from_str(body)?;
        Ok(wrapped.inputs)
    } else {
        Ok(serde_json::from_str(body)?)
    }
}

/// Parse a success-status payload.
///
/// Outputs and rows are decoded only when the operation declares a decoder
/// for them. `transactionNo` is always required.
///
/// # Errors
///
/// Returns `ParseFault` if the body is not a JSON object, lacks
/// `transactionNo`, or a declared output/row does not decode.
pub fn decode_success<O, R>(
    body: &str,
    output_decoder: Option<OutputDecoder<O>>,
    row_decoder: Option<RowDecoder<R>>,
) -> Result<Success<O, R>, ParseFault> {
    let tree: Json = serde_json::from_str(body).map_err(|e| ParseFault::Malformed(e.to_string()))?;
    let root = match tree {
        Json::Object(root) => root,
        other => return Err(ParseFault::unexpected("payload", "object", &other)),
    };

    let outputs = match (output_decoder, root.get("outputs")) {
        (Some(decode), Some(Json::Object(map))) => Some(decode(map)?),
        _ => None,
    };

    let table = match row_decoder {
        Some(decode) => decode_table(&root, decode)?,
        None => None,
    };

    let transaction_no = match root.get(TRANSACTION_NO) {
        Some(Json::String(s)) => s.clone(),
        Some(Json::Number(n)) => n.to_string(),
        Some(Json::Null) | None => return Err(ParseFault::MissingField(TRANSACTION_NO)),
        Some(other) => return Err(ParseFault::unexpected(TRANSACTION_NO, "string", other)),
    };

    Ok(Success {
        outputs,
        table,
        transaction_no,
    })
}

fn decode_table<R>(
    root: &Map<String, Json>,
    decode: RowDecoder<R>,
) -> Result<Option<Table<R>>, ParseFault> {
    if let Some(tables) = root.get("tables") {
        let Json::Array(tables) = tables else {
            return Err(ParseFault::unexpected("tables", "array", tables));
        };
        // Only one result set is ever returned; extra entries are ignored.
        let Some(first) = tables.first() else {
            return Ok(None);
        };
        let Json::Object(table) = first else {
            return Err(ParseFault::unexpected("tables[0]", "object", first));
        };
        let columns = match table.get("columns") {
            None | Some(Json::Null) => None,
            Some(Json::Array(names)) => Some(
                names
                    .iter()
                    .map(|n| match n {
                        Json::String(s) => Ok(s.clone()),
                        other => Err(ParseFault::unexpected("columns", "string", other)),
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Some(other) => return Err(ParseFault::unexpected("columns", "array", other)),
        };
        let rows = decode_rows(table.get("rows"), columns.as_deref(), decode)?;
        return Ok(Some(Table {
            columns,
            rows,
            row_limit_exceeded: limit_flag(table)?,
        }));
    }

    if root.contains_key("rows") {
        let rows = decode_rows(root.get("rows"), None, decode)?;
        return Ok(Some(Table {
            columns: None,
            rows,
            row_limit_exceeded: limit_flag(root)?,
        }));
    }

    Ok(None)
}

fn decode_rows<R>(
    rows: Option<&Json>,
    columns: Option<&[String]>,
    decode: RowDecoder<R>,
) -> Result<Vec<R>, ParseFault> {
    let elements = match rows {
        None | Some(Json::Null) => return Ok(Vec::new()),
        Some(Json::Array(elements)) => elements,
        Some(other) => return Err(ParseFault::unexpected("rows", "array", other)),
    };
    let mut decoded = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let reader = RowReader::from_element(element)
            .map_err(|e| e.in_row(index))?
            .with_columns(columns);
        if let Some(row) = decode(reader).map_err(|e| e.in_row(index))? {
            decoded.push(row);
        }
    }
    Ok(decoded)
}

fn limit_flag(object: &Map<String, Json>) -> Result<bool, ParseFault> {
    match object.get("rowLimitExceeded") {
        None | Some(Json::Null) => Ok(false),
        Some(Json::Bool(b)) => Ok(*b),
        Some(other) => Err(ParseFault::unexpected("rowLimitExceeded", "boolean", other)),
    }
}

/// Parse a failure-status payload into a `Failure`.
///
/// Recognises an `errors` list of `{code, message}` entries, a single
/// top-level `{code, message}` object, and an `outputs` object carrying
/// `ErrorNo`/`ErrorCode` and `Message`/`ErrorMessage`. Anything else,
/// including a body that is not JSON, becomes `Failure::Unspecified`.
#[must_use]
pub fn decode_failure(status: u16, body: &str) -> Failure {
    let Ok(Json::Object(root)) = serde_json::from_str::<Json>(body) else {
        return Failure::Unspecified { status };
    };

    let mut errors: Vec<ErrorEntry> = match root.get("errors") {
        Some(Json::Array(entries)) => entries.iter().filter_map(error_entry).collect(),
        _ => Vec::new(),
    };

    if errors.is_empty() {
        errors.extend(error_entry_from(&root, &["code"], &["message"]));
    }
    if errors.is_empty() {
        if let Some(Json::Object(outputs)) = root.get("outputs") {
            errors.extend(error_entry_from(
                outputs,
                &["ErrorNo", "ErrorCode"],
                &["Message", "ErrorMessage"],
            ));
        }
    }

    if errors.is_empty() {
        Failure::Unspecified { status }
    } else {
        Failure::Server { status, errors }
    }
}

fn error_entry(element: &Json) -> Option<ErrorEntry> {
    match element {
        Json::Object(map) => error_entry_from(map, &["code"], &["message"]),
        Json::String(message) => Some(ErrorEntry::new(String::new(), message.clone())),
        _ => None,
    }
}

fn error_entry_from(
    map: &Map<String, Json>,
    code_keys: &[&str],
    message_keys: &[&str],
) -> Option<ErrorEntry> {
    let pick = |keys: &[&str]| {
        keys.iter().find_map(|k| match map.get(*k) {
            Some(Json::String(s)) => Some(s.clone()),
            Some(Json::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    };
    let code = pick(code_keys);
    let message = pick(message_keys);
    if code.is_none() && message.is_none() {
        return None;
    }
    Some(ErrorEntry::new(code.unwrap_or_default(), message.unwrap_or_default()))
}
