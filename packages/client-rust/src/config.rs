//! Client configuration and endpoint resolution.

use std::sync::LazyLock;
use std::time::Duration;

use datasource_core::{DataSourceKey, Environment, WireFormat};
use regex::Regex;

/// A server name becomes a DNS label of the endpoint host.
static SERVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$")
        .expect("server name pattern compiles")
});

const SERVER_PLACEHOLDER: &str = "{server}";
const KEY_PLACEHOLDER: &str = "{key}";

/// Everything needed to turn an operation key into a request target.
///
/// Resolution is a pure function of this struct plus the key; nothing is
/// read from process-wide state.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Customer subdomain, e.g. `acme` in `acme.plex.com`.
    pub server_name: String,
    pub environment: Environment,
    pub wire_format: WireFormat,
    /// Upper bound on one invocation. `None` disables the timeout layer.
    pub request_timeout: Option<Duration>,
    /// JSON endpoint, with `{server}` and `{key}` placeholders.
    pub production_url_template: String,
    pub test_url_template: String,
    /// Legacy web-service endpoints. These do not vary by server name.
    pub soap_production_url: String,
    pub soap_test_url: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_name: String::new(),
            environment: Environment::Production,
            wire_format: WireFormat::Named,
            request_timeout: Some(Duration::from_secs(30)),
            production_url_template: "https://{server}.plex.com/api/datasources/{key}/execute"
                .to_string(),
            test_url_template: "https://test.{server}.plex.com/api/datasources/{key}/execute"
                .to_string(),
            soap_production_url: "https://mercury.plexonline.com/DataSource/Service.asmx"
                .to_string(),
            soap_test_url: "https://hermes.plexonline.com/DataSource/Service.asmx".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid server name {0:?}: expected a DNS label")]
    InvalidServerName(String),
    #[error("url template {0:?} has no {{key}} placeholder")]
    MissingKeyPlaceholder(String),
}

impl ClientConfig {
    #[must_use]
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the server name is not DNS-label safe or an
    /// endpoint template cannot carry the operation key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let uses_server = self.production_url_template.contains(SERVER_PLACEHOLDER)
            || self.test_url_template.contains(SERVER_PLACEHOLDER);
        if uses_server && !SERVER_NAME.is_match(&self.server_name) {
            return Err(ConfigError::InvalidServerName(self.server_name.clone()));
        }
        for template in [&self.production_url_template, &self.test_url_template] {
            if !template.contains(KEY_PLACEHOLDER) {
                return Err(ConfigError::MissingKeyPlaceholder(template.clone()));
            }
        }
        Ok(())
    }

    /// JSON endpoint for one operation.
    #[must_use]
    pub fn endpoint(&self, key: DataSourceKey) -> String {
        let template = if self.environment.is_test() {
            &self.test_url_template
        } else {
            &self.production_url_template
        };
        let mut url = template
            .replace(SERVER_PLACEHOLDER, &self.server_name)
            .replace(KEY_PLACEHOLDER, &key.to_string());
        if let Some(query) = self.wire_format.query() {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(query);
        }
        url
    }

    /// Web-service endpoint for the configured environment.
    #[must_use]
    pub fn soap_endpoint(&self) -> &str {
        if self.environment.is_test() {
            &self.soap_test_url
        } else {
            &self.soap_production_url
        }
    }

    /// Point both JSON templates at a single base URL, keeping the path.
    /// Used to aim the client at a local or proxied server.
    #[must_use]
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        let template = format!("{base}/api/datasources/{KEY_PLACEHOLDER}/execute");
        self.production_url_template.clone_from(&template);
        self.test_url_template = template;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.wire_format, WireFormat::Named);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.user_agent, "Mozilla/5.0");
    }

    #[test]
    fn production_named_endpoint() {
        let config = ClientConfig::new("acme");
        assert_eq!(
            config.endpoint(DataSourceKey(6455)),
            "https://acme.plex.com/api/datasources/6455/execute"
        );
    }

    #[test]
    fn test_tabular_endpoint() {
        let config = ClientConfig {
            environment: Environment::Test,
            wire_format: WireFormat::Tabular,
            ..ClientConfig::new("acme")
        };
        assert_eq!(
            config.endpoint(DataSourceKey(17218)),
            "https://test.acme.plex.com/api/datasources/17218/execute?format=2"
        );
    }

    #[test]
    fn endpoint_is_deterministic() {
        let config = ClientConfig::new("acme");
        assert_eq!(config.endpoint(DataSourceKey(721)), config.endpoint(DataSourceKey(721)));
    }

    #[test]
    fn soap_endpoint_follows_environment() {
        let mut config = ClientConfig::new("acme");
        assert!(config.soap_endpoint().starts_with("https://mercury."));
        config.environment = Environment::Test;
        assert!(config.soap_endpoint().starts_with("https://hermes."));
    }

    #[test]
    fn validate_rejects_bad_server_names() {
        assert!(ClientConfig::new("acme-01").validate().is_ok());
        for bad in ["", "-acme", "acme.evil.com", "a/b", "acme-"] {
            assert_eq!(
                ClientConfig::new(bad).validate(),
                Err(ConfigError::InvalidServerName(bad.to_string())),
                "{bad}"
            );
        }
    }

    #[test]
    fn base_url_override_ignores_server_name() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:8080/");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.endpoint(DataSourceKey(1791)),
            "http://127.0.0.1:8080/api/datasources/1791/execute"
        );
    }

    proptest::proptest! {
        #[test]
        fn valid_names_resolve_to_their_own_host(
            server in "[a-z0-9]([a-z0-9-]{0,20}[a-z0-9])?",
            key in 1u32..1_000_000,
        ) {
            let config = ClientConfig::new(server.clone());
            proptest::prop_assert!(config.validate().is_ok());
            let url = config.endpoint(DataSourceKey(key));
            let expected_prefix = format!("https://{server}.plex.com/");
            let expected_suffix = format!("/{key}/execute");
            proptest::prop_assert!(url.starts_with(&expected_prefix));
            proptest::prop_assert!(url.ends_with(&expected_suffix));
        }
    }
}
