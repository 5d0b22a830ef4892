//! SOAP envelope codec for the legacy `ExecuteDataSource` web service.
//!
//! The service is operation-agnostic: every data source takes a flat list of
//! named string parameters and answers with generic result sets, so the whole
//! response can be decoded here without knowing the operation.

use std::collections::BTreeMap;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::trace;

use crate::error::ParseFault;
use crate::result::{DataSourceResult, ErrorEntry, Failure, Success, Table};
use crate::row::GenericRow;
use crate::types::DataSourceKey;
use crate::value::Value;

pub const NAMESPACE: &str = "http://www.plexus-online.com/DataSource";
pub const SOAP_ACTION: &str = "\"http://www.plexus-online.com/DataSource/ExecuteDataSource\"";
const ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
const RESULT_ELEMENT: &str = "executedatasourceresult";

/// Build the request envelope for one data source call.
///
/// Parameter names are sent with a leading `@`, added when missing.
#[must_use]
pub fn encode_envelope(key: DataSourceKey, params: &BTreeMap<String, Value>) -> String {
    let mut xml = String::with_capacity(512);
    xml.push_str(&format!(
        "<soap:Envelope xmlns:soap=\"{ENVELOPE_NS}\" xmlns:dat=\"{NAMESPACE}\">"
    ));
    xml.push_str("<soap:Header/><soap:Body><dat:ExecuteDataSource>");
    xml.push_str(&format!("<ExecuteDataSourceRequest xmlns=\"{NAMESPACE}\">"));
    xml.push_str(&format!("<DataSourceKey>{key}</DataSourceKey>"));
    xml.push_str("<InputParameters>");
    for (name, value) in params {
        let name = if name.starts_with('@') {
            name.clone()
        } else {
            format!("@{name}")
        };
        xml.push_str("<InputParameter><Value>");
        xml.push_str(&escape(value.to_string().as_str()));
        xml.push_str("</Value><Name>");
        xml.push_str(&escape(name.as_str()));
        xml.push_str("</Name></InputParameter>");
    }
    xml.push_str("</InputParameters>");
    xml.push_str("</ExecuteDataSourceRequest></dat:ExecuteDataSource></soap:Body></soap:Envelope>");
    xml
}

/// Status block of an `ExecuteDataSourceResult`.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoapStatus {
    pub status_no: i32,
    pub error: bool,
    pub error_no: i32,
    pub message: String,
    pub instance_no: i64,
}

/// Fully decoded web service response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoapResult {
    pub status: SoapStatus,
    pub result_sets: Vec<Table<GenericRow>>,
}

impl SoapResult {
    /// Columns of the first row of the first result set.
    #[must_use]
    pub fn first_row(&self) -> Option<&GenericRow> {
        self.result_sets.first().and_then(Table::first)
    }

    /// Fold into the unified result model.
    ///
    /// A service-reported error becomes `Failure::Server` carrying
    /// `ErrorNo`/`Message`; otherwise the first result set becomes the table
    /// and `InstanceNo` the transaction number.
    #[must_use]
    pub fn into_data_source_result(
        self,
        http_status: u16,
    ) -> DataSourceResult<SoapStatus, GenericRow> {
        if self.status.error {
            return DataSourceResult::Failure(Failure::Server {
                status: http_status,
                errors: vec![ErrorEntry::new(
                    self.status.error_no.to_string(),
                    self.status.message,
                )],
            });
        }
        let transaction_no = self.status.instance_no.to_string();
        DataSourceResult::Success(Success {
            table: self.result_sets.into_iter().next(),
            outputs: Some(self.status),
            transaction_no,
        })
    }
}

#[derive(Default)]
struct ColumnBuilder {
    name: Option<String>,
    value: Option<String>,
}

/// Decode a response envelope.
///
/// # Errors
///
/// Returns `ParseFault::Malformed` for invalid XML,
/// `ParseFault::MissingField` when no `ExecuteDataSourceResult` element is
/// present, and `ParseFault::UnexpectedType` for non-numeric status fields.
pub fn decode_response(xml: &str) -> Result<SoapResult, ParseFault> {
    // Column text is kept verbatim; only status fields are trimmed.
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut found = false;
    let mut result = SoapResult::default();
    let mut rows: Option<Vec<GenericRow>> = None;
    let mut row: Option<GenericRow> = None;
    let mut column: Option<ColumnBuilder> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ParseFault::Malformed(format!("at byte {}: {e}", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => {
                let name = local_name(start.local_name().as_ref());
                text.clear();
                if name == RESULT_ELEMENT {
                    found = true;
                }
                if in_result_sets(&stack) {
                    match name.as_str() {
                        "rows" => rows = Some(Vec::new()),
                        "columns" => row = Some(GenericRow::new()),
                        "column" => column = Some(ColumnBuilder::default()),
                        _ => {}
                    }
                }
                stack.push(name);
            }
            Event::Text(t) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| ParseFault::Malformed(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::Empty(empty) => {
                let name = local_name(empty.local_name().as_ref());
                if let Some(col) = column.as_mut() {
                    match name.as_str() {
                        "value" => col.value = Some(String::new()),
                        "name" => col.name = Some(String::new()),
                        _ => {}
                    }
                }
            }
            Event::End(_) => {
                let Some(name) = stack.pop() else {
                    continue;
                };
                let parent = stack.last().map(String::as_str);
                let content = std::mem::take(&mut text);
                if parent == Some(RESULT_ELEMENT) {
                    read_status_field(&mut result.status, &name, content.trim())?;
                } else if in_result_sets(&stack) || name == "resultsets" {
                    match name.as_str() {
                        "value" => {
                            if let Some(col) = column.as_mut() {
                                col.value = Some(content);
                            }
                        }
                        "name" => {
                            if let Some(col) = column.as_mut() {
                                col.name = Some(content);
                            }
                        }
                        "column" => {
                            if let (Some(col), Some(r)) = (column.take(), row.as_mut()) {
                                if col.name.is_none() {
                                    trace!("result set column without a name");
                                }
                                let value = col.value.map_or(Value::Null, Value::String);
                                r.insert(col.name.unwrap_or_default(), value);
                            }
                        }
                        "columns" => {
                            if let (Some(r), Some(list)) = (row.take(), rows.as_mut()) {
                                list.push(r);
                            }
                        }
                        "rows" => {
                            if let Some(list) = rows.take() {
                                let columns = list.first().map(GenericRow::names);
                                result.result_sets.push(Table {
                                    columns,
                                    rows: list,
                                    row_limit_exceeded: false,
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !found {
        return Err(ParseFault::MissingField("ExecuteDataSourceResult"));
    }
    Ok(result)
}

fn in_result_sets(stack: &[String]) -> bool {
    stack.iter().any(|s| s == "resultsets")
}

fn read_status_field(status: &mut SoapStatus, name: &str, content: &str) -> Result<(), ParseFault> {
    match name {
        "statusno" => status.status_no = parse_number(name, content)?,
        "error" => status.error = content.eq_ignore_ascii_case("true"),
        "errorno" => status.error_no = parse_number(name, content)?,
        "message" => status.message = content.to_string(),
        "instanceno" => status.instance_no = parse_number(name, content)?,
        _ => {}
    }
    Ok(())
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn parse_number<T: std::str::FromStr + Default>(
    field: &str,
    content: &str,
) -> Result<T, ParseFault> {
    if content.is_empty() {
        return Ok(T::default());
    }
    content.parse().map_err(|_| ParseFault::UnexpectedType {
        field: field.to_string(),
        expected: "integer",
        found: content.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Body>
    <ExecuteDataSourceResponse xmlns="http://www.plexus-online.com/DataSource">
      <ExecuteDataSourceResult>
        <StatusNo>1</StatusNo>
        <Error>false</Error>
        <ErrorNo>0</ErrorNo>
        <Message>Success</Message>
        <InstanceNo>5127</InstanceNo>
        <ResultSets>
          <ResultSet>
            <RowCount>2</RowCount>
            <Rows>
              <Row>
                <Columns>
                  <Column><Value>1859416</Value><Name>Part_Key</Name></Column>
                  <Column><Value>ABC &amp; Co</Value><Name>Name</Name></Column>
                </Columns>
              </Row>
              <Row>
                <Columns>
                  <Column><Value>246334</Value><Name>Part_Key</Name></Column>
                  <Column><Value/><Name>Name</Name></Column>
                </Columns>
              </Row>
            </Rows>
          </ResultSet>
        </ResultSets>
      </ExecuteDataSourceResult>
    </ExecuteDataSourceResponse>
  </soap:Body>
</soap:Envelope>"#;

    #[test]
    fn envelope_prefixes_parameter_names() {
        let mut params = BTreeMap::new();
        params.insert("Serial_No".to_string(), Value::from("S<1>"));
        params.insert("@Location".to_string(), Value::from("Dock"));
        let xml = encode_envelope(DataSourceKey(6455), &params);
        assert!(xml.contains("<DataSourceKey>6455</DataSourceKey>"));
        assert!(xml.contains("<InputParameter><Value>Dock</Value><Name>@Location</Name></InputParameter>"));
        assert!(xml.contains("<Value>S&lt;1&gt;</Value><Name>@Serial_No</Name>"));
        assert!(!xml.contains("@@"));
    }

    #[test]
    fn decodes_status_and_rows() {
        let result = decode_response(RESPONSE).unwrap();
        assert_eq!(result.status.status_no, 1);
        assert!(!result.status.error);
        assert_eq!(result.status.instance_no, 5127);
        assert_eq!(result.status.message, "Success");
        assert_eq!(result.result_sets.len(), 1);

        let table = &result.result_sets[0];
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.columns.as_deref(),
            Some(&["Part_Key".to_string(), "Name".to_string()][..])
        );
        assert_eq!(table.rows[0].get("Name"), Some(&Value::from("ABC & Co")));
        assert_eq!(table.rows[1].get("Name"), Some(&Value::from("")));
        assert_eq!(result.first_row().unwrap().get("Part_Key"), Some(&Value::from("1859416")));
    }

    #[test]
    fn column_text_keeps_its_whitespace() {
        let xml = "<Envelope><Body><ExecuteDataSourceResult>\
            <StatusNo> 1 </StatusNo><Error>false</Error><InstanceNo>\n  9\n</InstanceNo>\
            <ResultSets><ResultSet><Rows><Row><Columns>\
            <Column><Value>  Dock 4 </Value><Name>Location</Name></Column>\
            <Column><Value> </Value><Name>Note</Name></Column>\
            </Columns></Row></Rows></ResultSet></ResultSets>\
            </ExecuteDataSourceResult></Body></Envelope>";
        let result = decode_response(xml).unwrap();
        assert_eq!(result.status.status_no, 1);
        assert_eq!(result.status.instance_no, 9);
        let row = result.first_row().unwrap();
        assert_eq!(row.get("Location"), Some(&Value::from("  Dock 4 ")));
        assert_eq!(row.get("Note"), Some(&Value::from(" ")));
    }

    #[test]
    fn success_maps_to_unified_model() {
        let unified = decode_response(RESPONSE).unwrap().into_data_source_result(200);
        assert!(!unified.is_error());
        assert_eq!(unified.transaction_no(), Some("5127"));
        assert_eq!(unified.rows().len(), 2);
        assert_eq!(unified.outputs().unwrap().status_no, 1);
    }

    #[test]
    fn service_error_maps_to_server_failure() {
        let xml = "<Envelope><Body><ExecuteDataSourceResult><StatusNo>0</StatusNo><Error>true</Error>\
                   <ErrorNo>3012</ErrorNo><Message>Invalid serial</Message><InstanceNo>0</InstanceNo>\
                   </ExecuteDataSourceResult></Body></Envelope>";
        let unified = decode_response(xml).unwrap().into_data_source_result(200);
        assert!(unified.is_error());
        assert_eq!(unified.errors(), &[ErrorEntry::new("3012", "Invalid serial")]);
    }

    #[test]
    fn missing_result_element_is_a_fault() {
        assert_eq!(
            decode_response("<Envelope><Body/></Envelope>"),
            Err(ParseFault::MissingField("ExecuteDataSourceResult"))
        );
    }

    #[test]
    fn non_numeric_status_is_a_fault() {
        let xml = "<ExecuteDataSourceResult><StatusNo>abc</StatusNo></ExecuteDataSourceResult>";
        assert!(matches!(decode_response(xml), Err(ParseFault::UnexpectedType { .. })));
    }
}
