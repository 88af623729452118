//! Pipeline configuration for the MySQL instrumentation.

/// Environment variable that disables `db.statement` recording when set to
/// exactly `false`.
pub const STATEMENT_ENABLED_ENV: &str = "OTEL_INSTRUMENTATION_MYSQL_STATEMENT_ENABLED";

/// Configuration of the span and metrics pipeline.
///
/// ## Default Values
///
/// - `system`: `mysql`
/// - `scope_name`: `dbtel.mysql`
/// - `scope_version`: this crate's version
/// - `metrics_namespace`: `sql.mysql`
/// - `placeholder`: `?`
/// - `record_statement`: `true`
///
/// ## Example
///
/// ```rust
/// use dbtel::config::InstrumentationConfig;
///
/// let config = InstrumentationConfig::builder()
///     .scope_name("shop.db")
///     .record_statement(false)
///     .build();
/// assert_eq!(config.system, "mysql");
/// assert!(!config.record_statement);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct InstrumentationConfig {
    /// Value of `db.system`.
    #[builder(into, default = "mysql".to_string())]
    pub system: String,

    /// Instrumentation scope name.
    #[builder(into, default = "dbtel.mysql".to_string())]
    pub scope_name: String,

    /// Instrumentation scope version.
    #[builder(into, default = env!("CARGO_PKG_VERSION").to_string())]
    pub scope_version: String,

    /// Prefix of the metric series.
    #[builder(into, default = "sql.mysql".to_string())]
    pub metrics_namespace: String,

    /// Positional placeholder substituted when reconstructing statements.
    #[builder(default = '?')]
    pub placeholder: char,

    /// Whether `db.statement` is recorded.
    #[builder(default = true)]
    pub record_statement: bool,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl InstrumentationConfig {
    /// Returns the defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Returns the defaults overlaid with values read through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let record_statement = lookup(STATEMENT_ENABLED_ENV).is_none_or(|value| value != "false");
        Self::builder().record_statement(record_statement).build()
    }

    /// Sets statement recording.
    #[must_use]
    pub fn with_record_statement(mut self, record_statement: bool) -> Self {
        self.record_statement = record_statement;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InstrumentationConfig::default();
        assert_eq!(config.system, "mysql");
        assert_eq!(config.scope_name, "dbtel.mysql");
        assert_eq!(config.scope_version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.metrics_namespace, "sql.mysql");
        assert_eq!(config.placeholder, '?');
        assert!(config.record_statement);
    }

    #[test]
    fn test_from_lookup_statement_toggle() {
        let off = InstrumentationConfig::from_lookup(|key| {
            (key == STATEMENT_ENABLED_ENV).then(|| "false".to_owned())
        });
        assert!(!off.record_statement);

        let on = InstrumentationConfig::from_lookup(|_| Some("no".to_owned()));
        assert!(on.record_statement);

        let unset = InstrumentationConfig::from_lookup(|_| None);
        assert_eq!(unset, InstrumentationConfig::default());
    }

    #[test]
    fn test_with_record_statement() {
        let config = InstrumentationConfig::default().with_record_statement(false);
        assert!(!config.record_statement);
    }
}
