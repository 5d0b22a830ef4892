use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// User name and password used to authenticate data source calls.
///
/// Immutable once built; share it between concurrent invocations behind an
/// `Arc`. The only thing ever derived from it is the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user_name: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// HTTP basic authorization header value: `Basic base64(user:password)`.
    #[must_use]
    pub fn authorization(&self) -> String {
        let raw = format!("{}:{}", self.user_name, self.password);
        format!("Basic {}", STANDARD.encode(raw.as_bytes()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}
