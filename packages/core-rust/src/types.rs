use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-side identity of a data source within the catalogue.
///
/// Fixed per concrete operation; the server resolves the procedure to run
/// from this key alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSourceKey(pub u32);

impl DataSourceKey {
    /// The raw integer key.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DataSourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DataSourceKey {
    fn from(key: u32) -> Self {
        Self(key)
    }
}

/// Which server tier an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Live customer data.
    #[default]
    Production,
    /// The test tier (`test.` host prefix, separate SOAP host).
    Test,
}

impl Environment {
    /// Map the legacy `useTestServer` flag onto an environment.
    #[must_use]
    pub const fn from_test_flag(use_test_server: bool) -> Self {
        if use_test_server {
            Self::Test
        } else {
            Self::Production
        }
    }

    #[must_use]
    pub const fn is_test(self) -> bool {
        matches!(self, Self::Test)
    }
}

/// Protocol generation of the JSON data source API.
///
/// Selects how the request body is shaped. Response parsing accepts both
/// generations regardless of which one produced the request, since the
/// server does not negotiate a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// First generation: inputs wrapped under `"inputs"`, endpoint queried
    /// with `format=2`, rows delivered positionally inside `tables[0]`.
    Tabular,
    /// Second generation: bare input object, rows delivered as named
    /// objects under a top-level `rows` array.
    #[default]
    Named,
}

impl WireFormat {
    /// Whether the request body nests the inputs under an `"inputs"` key.
    #[must_use]
    pub const fn wraps_inputs(self) -> bool {
        matches!(self, Self::Tabular)
    }

    /// Query string appended to the execute endpoint, if any.
    #[must_use]
    pub const fn query(self) -> Option<&'static str> {
        match self {
            Self::Tabular => Some("format=2"),
            Self::Named => None,
        }
    }
}

impl std::str::FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tabular" | "tables" | "v1" => Ok(Self::Tabular),
            "named" | "rows" | "v2" => Ok(Self::Named),
            other => Err(format!("unknown wire format: {other}")),
        }
    }
}
