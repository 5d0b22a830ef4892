//! The unified outcome of one data source invocation.

use serde::{Deserialize, Serialize};

use crate::error::{ParseFault, TransportFault};

/// Tabular result: ordered rows plus column metadata.
///
/// `columns` is independent of `rows`: named-row responses carry no column
/// list, and a table may declare columns while holding zero rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table<R> {
    pub columns: Option<Vec<String>>,
    pub rows: Vec<R>,
    /// The server truncated the result set at its row-count limit.
    pub row_limit_exceeded: bool,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            columns: None,
            rows: Vec::new(),
            row_limit_exceeded: false,
        }
    }
}

impl<R> Table<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&R> {
        self.rows.first()
    }
}

impl<'a, R> IntoIterator for &'a Table<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// One structured error reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: String,
    pub message: String,
}

impl ErrorEntry {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Data carried by a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Success<O, R> {
    pub outputs: Option<O>,
    pub table: Option<Table<R>>,
    /// Server-assigned identifier of the completed invocation.
    pub transaction_no: String,
}

/// Why an invocation did not produce data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Failure {
    /// Failure status with a structured error list.
    #[error("server returned status {status}: {}", join_errors(.errors))]
    Server { status: u16, errors: Vec<ErrorEntry> },
    /// Failure status without anything parseable as an error list.
    #[error("server returned status {status} with no error details")]
    Unspecified { status: u16 },
    /// Success status, but the payload did not have the expected shape.
    #[error(transparent)]
    Parse(#[from] ParseFault),
    /// No response was obtained at all.
    #[error(transparent)]
    Transport(#[from] TransportFault),
}

impl Failure {
    /// Transport status, when the exchange got far enough to have one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Unspecified { status } => Some(*status),
            Self::Parse(_) | Self::Transport(_) => None,
        }
    }
}

fn join_errors(errors: &[ErrorEntry]) -> String {
    errors
        .iter()
        .map(|e| format!("[{}] {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of one invocation: either data or exactly one failure case.
///
/// `O` is the operation's output shape and `R` its row shape; operations
/// that declare neither use `()`.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSourceResult<O, R> {
    Success(Success<O, R>),
    Failure(Failure),
}

impl<O, R> DataSourceResult<O, R> {
    /// True whenever a structured error, parse fault or transport fault is present.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    #[must_use]
    pub fn outputs(&self) -> Option<&O> {
        match self {
            Self::Success(s) => s.outputs.as_ref(),
            Self::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn table(&self) -> Option<&Table<R>> {
        match self {
            Self::Success(s) => s.table.as_ref(),
            Self::Failure(_) => None,
        }
    }

    /// Rows of the table, empty when there is none.
    #[must_use]
    pub fn rows(&self) -> &[R] {
        self.table().map_or(&[], |t| t.rows.as_slice())
    }

    #[must_use]
    pub fn transaction_no(&self) -> Option<&str> {
        match self {
            Self::Success(s) => Some(&s.transaction_no),
            Self::Failure(_) => None,
        }
    }

    /// Structured server errors; empty for every other case.
    #[must_use]
    pub fn errors(&self) -> &[ErrorEntry] {
        match self {
            Self::Failure(Failure::Server { errors, .. }) => errors,
            _ => &[],
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(f) => Some(f),
            Self::Success(_) => None,
        }
    }

    /// # Errors
    ///
    /// Returns the `Failure` when the invocation did not succeed.
    pub fn into_result(self) -> Result<Success<O, R>, Failure> {
        match self {
            Self::Success(s) => Ok(s),
            Self::Failure(f) => Err(f),
        }
    }

    /// Map the output and row shapes, keeping the outcome.
    pub fn map<O2, R2>(
        self,
        map_outputs: impl FnOnce(O) -> O2,
        map_row: impl FnMut(R) -> R2,
    ) -> DataSourceResult<O2, R2> {
        match self {
            Self::Success(s) => DataSourceResult::Success(Success {
                outputs: s.outputs.map(map_outputs),
                table: s.table.map(|t| Table {
                    columns: t.columns,
                    rows: t.rows.into_iter().map(map_row).collect(),
                    row_limit_exceeded: t.row_limit_exceeded,
                }),
                transaction_no: s.transaction_no,
            }),
            Self::Failure(f) => DataSourceResult::Failure(f),
        }
    }
}

impl<O, R> From<Failure> for DataSourceResult<O, R> {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

impl<O, R> From<TransportFault> for DataSourceResult<O, R> {
    fn from(fault: TransportFault) -> Self {
        Self::Failure(Failure::Transport(fault))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success() -> DataSourceResult<(), u32> {
        DataSourceResult::Success(Success {
            outputs: None,
            table: Some(Table {
                columns: Some(vec!["Part_Key".into()]),
                rows: vec![1, 2],
                row_limit_exceeded: false,
            }),
            transaction_no: "3835453".into(),
        })
    }

    #[test]
    fn success_is_not_error() {
        let result = success();
        assert!(!result.is_error());
        assert_eq!(result.transaction_no(), Some("3835453"));
        assert_eq!(result.rows(), &[1, 2]);
        assert!(result.errors().is_empty());
    }

    #[test]
    fn every_failure_case_is_error() {
        let cases: Vec<DataSourceResult<(), u32>> = vec![
            Failure::Server {
                status: 400,
                errors: vec![ErrorEntry::new("E1", "bad input")],
            }
            .into(),
            Failure::Unspecified { status: 500 }.into(),
            Failure::Parse(ParseFault::MissingField("transactionNo")).into(),
            TransportFault::Connect("refused".into()).into(),
        ];
        for case in cases {
            assert!(case.is_error());
            assert!(case.transaction_no().is_none());
            assert!(case.rows().is_empty());
        }
    }

    #[test]
    fn server_failure_exposes_entries() {
        let result: DataSourceResult<(), ()> = Failure::Server {
            status: 400,
            errors: vec![ErrorEntry::new("E1", "bad input")],
        }
        .into();
        assert_eq!(result.errors(), &[ErrorEntry::new("E1", "bad input")]);
        assert_eq!(result.failure().and_then(Failure::status), Some(400));
        assert_eq!(
            result.failure().unwrap().to_string(),
            "server returned status 400: [E1] bad input"
        );
    }

    #[test]
    fn table_defaults() {
        let table: Table<()> = Table::default();
        assert!(table.columns.is_none());
        assert!(!table.row_limit_exceeded);
        assert!(table.is_empty());
    }

    #[test]
    fn map_preserves_metadata() {
        let mapped = success().map(|()| (), |r| r * 10);
        let table = mapped.table().unwrap();
        assert_eq!(table.rows, vec![10, 20]);
        assert_eq!(table.columns.as_deref(), Some(&["Part_Key".to_string()][..]));
    }
}
