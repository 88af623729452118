//! Database client semantic conventions: attribute keys, the getter trait
//! that reads them off a request, and the extractor that writes them onto
//! spans.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::Write as _;

use crate::{
    instrumenter::AttributesExtractor,
    request::{DbRequest, DbResponse, DbValue},
    telemetry::{ActiveSpan, TraceContext},
};

/// Attribute keys written on database client spans.
pub mod attribute_keys {
    /// Database system identifier (e.g. `mysql`).
    pub const DB_SYSTEM: &str = "db.system";
    /// Reconstructed statement text.
    pub const DB_STATEMENT: &str = "db.statement";
    /// Coarse operation verb.
    pub const DB_OPERATION: &str = "db.operation";
    /// Database (schema) name.
    pub const DB_NAMESPACE: &str = "db.namespace";
    /// Table or collection name.
    pub const DB_COLLECTION: &str = "db.collection";
    /// Bound parameter values, when recorded separately.
    pub const DB_PARAMETERS: &str = "db.parameters";
    /// Number of statements in a batch.
    pub const DB_BATCH_SIZE: &str = "db.batch_size";
    /// Rows changed by the statement.
    pub const DB_AFFECTED_ROWS: &str = "db.response.affected_rows";
    /// Rows returned by the statement.
    pub const DB_RETURNED_ROWS: &str = "db.response.returned_rows";
    /// Server endpoint as dialed.
    pub const SERVER_ADDRESS: &str = "server.address";
    /// Server port, when the endpoint carries one.
    pub const SERVER_PORT: &str = "server.port";
    /// Error category of a failed call.
    pub const ERROR_TYPE: &str = "error.type";
    /// Instrumentation scope name.
    pub const OTEL_SCOPE_NAME: &str = "otel.scope.name";
    /// Instrumentation scope version.
    pub const OTEL_SCOPE_VERSION: &str = "otel.scope.version";
}

use attribute_keys::*;

/// Reads database client attributes from a request type.
///
/// `collection`, `parameters` and `batch_size` are reserved and default to
/// empty values.
pub trait DbClientAttributesGetter<R>: Send + Sync + 'static {
    /// Database system identifier.
    fn system<'a>(&'a self, request: &'a R) -> &'a str;

    /// Server address (`host:port`).
    fn server_address<'a>(&'a self, request: &'a R) -> &'a str;

    /// Statement text with arguments substituted.
    fn statement<'a>(&'a self, request: &'a R) -> Cow<'a, str>;

    /// Classified operation verb, `None` when the request has none.
    fn operation<'a>(&'a self, request: &'a R) -> Option<&'a str>;

    /// Database namespace.
    fn namespace<'a>(&'a self, request: &'a R) -> &'a str;

    /// Table or collection targeted by the request.
    fn collection<'a>(&'a self, _request: &'a R) -> &'a str {
        ""
    }

    /// Bound parameters recorded separately from the statement.
    fn parameters(&self, _request: &R) -> Vec<String> {
        Vec::new()
    }

    /// Number of statements in a batch.
    fn batch_size(&self, _request: &R) -> usize {
        0
    }
}

/// Getter for MySQL-protocol requests using `?` positional placeholders.
#[derive(Debug, Clone)]
pub struct MySqlAttributesGetter {
    system: String,
    placeholder: char,
}

impl MySqlAttributesGetter {
    /// Creates a getter reporting `system` and substituting `placeholder`.
    pub fn new(system: impl Into<String>, placeholder: char) -> Self {
        Self { system: system.into(), placeholder }
    }
}

impl Default for MySqlAttributesGetter {
    fn default() -> Self {
        Self::new("mysql", '?')
    }
}

impl DbClientAttributesGetter<DbRequest> for MySqlAttributesGetter {
    fn system<'a>(&'a self, _request: &'a DbRequest) -> &'a str {
        &self.system
    }

    fn server_address<'a>(&'a self, request: &'a DbRequest) -> &'a str {
        request.endpoint()
    }

    fn statement<'a>(&'a self, request: &'a DbRequest) -> Cow<'a, str> {
        reconstruct_statement(request.command(), request.arguments(), self.placeholder)
    }

    fn operation<'a>(&'a self, request: &'a DbRequest) -> Option<&'a str> {
        request.operation()
    }

    fn namespace<'a>(&'a self, request: &'a DbRequest) -> &'a str {
        request.namespace()
    }
}

/// Splices `arguments` into the placeholders of `command`.
///
/// A single left-to-right scan replaces the next unconsumed `placeholder`
/// with the next argument's string form. Surplus arguments are ignored and
/// surplus placeholders stay literal. Substituted text is never rescanned.
///
/// The output is for diagnostics only and is not safe to execute.
///
/// ```rust
/// use dbtel::{semconv::reconstruct_statement, DbValue};
///
/// let args = [DbValue::from(7), DbValue::from("bob")];
/// assert_eq!(
///     reconstruct_statement("UPDATE u SET n = ? WHERE id = ? AND x = ?", &args, '?'),
///     "UPDATE u SET n = 7 WHERE id = bob AND x = ?",
/// );
/// ```
pub fn reconstruct_statement<'a>(
    command: &'a str,
    arguments: &[DbValue],
    placeholder: char,
) -> Cow<'a, str> {
    if arguments.is_empty() {
        return Cow::Borrowed(command);
    }

    let mut statement = String::with_capacity(command.len() + arguments.len() * 8);
    let mut rest = command;
    for argument in arguments {
        let Some(idx) = rest.find(placeholder) else {
            break;
        };
        statement.push_str(&rest[..idx]);
        // Writing into a String cannot fail.
        let _ = write!(statement, "{argument}");
        rest = &rest[idx + placeholder.len_utf8()..];
    }
    statement.push_str(rest);

    Cow::Owned(statement)
}

/// Parses the port of a `host:port` or `[ipv6]:port` endpoint.
///
/// A bare IPv6 address such as `::1` carries no port.
fn endpoint_port(endpoint: &str) -> Option<u16> {
    let (host, port) = match endpoint.rsplit_once("]:") {
        Some((host, port)) if host.starts_with('[') => (host, port),
        _ => endpoint.rsplit_once(':')?,
    };
    if !host.starts_with('[') && host.contains(':') {
        return None;
    }
    port.parse().ok()
}

/// Writes database client attributes onto spans.
#[derive(Debug, Clone)]
pub struct DbClientAttributesExtractor<G> {
    getter: G,
    record_statement: bool,
}

impl<G> DbClientAttributesExtractor<G> {
    /// Creates an extractor reading attributes through `getter`.
    pub fn new(getter: G) -> Self {
        Self { getter, record_statement: true }
    }

    /// Controls whether `db.statement` is recorded.
    #[must_use]
    pub fn with_record_statement(mut self, record_statement: bool) -> Self {
        self.record_statement = record_statement;
        self
    }

    /// Returns the getter.
    pub fn getter(&self) -> &G {
        &self.getter
    }
}

impl<G> AttributesExtractor<DbRequest, DbResponse> for DbClientAttributesExtractor<G>
where
    G: DbClientAttributesGetter<DbRequest>,
{
    fn on_start(&self, span: &mut ActiveSpan, _parent: Option<&TraceContext>, request: &DbRequest) {
        let getter = &self.getter;
        let address = getter.server_address(request);

        span.set_attribute(DB_SYSTEM, getter.system(request));
        span.set_attribute(SERVER_ADDRESS, address);
        if let Some(port) = endpoint_port(address) {
            span.set_attribute(SERVER_PORT, port);
        }
        if self.record_statement {
            span.set_attribute(DB_STATEMENT, getter.statement(request).into_owned());
        }
        span.set_attribute(DB_OPERATION, getter.operation(request).unwrap_or_default());
        span.set_attribute(DB_NAMESPACE, getter.namespace(request));
        span.set_attribute(DB_COLLECTION, getter.collection(request));
        span.set_attribute(DB_PARAMETERS, getter.parameters(request));
        span.set_attribute(DB_BATCH_SIZE, getter.batch_size(request));
    }

    fn on_end(
        &self,
        span: &mut ActiveSpan,
        request: &DbRequest,
        response: Option<&DbResponse>,
        error: Option<&(dyn StdError + 'static)>,
    ) {
        // The end view may resolve a namespace the start view lacked.
        let namespace = self.getter.namespace(request);
        if !namespace.is_empty() {
            span.set_attribute(DB_NAMESPACE, namespace);
        }

        if let Some(DbResponse::Executed(result)) = response {
            span.set_attribute(DB_AFFECTED_ROWS, result.affected_rows);
            if result.returned_rows > 0 {
                span.set_attribute(DB_RETURNED_ROWS, result.returned_rows);
            }
        }

        if let Some(error) = error {
            let error_type = error
                .downcast_ref::<crate::Error>()
                .map_or("_OTHER", |e| e.kind().as_error_type());
            span.set_attribute(ERROR_TYPE, error_type);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;
    use test_case::test_case;

    use super::*;
    use crate::{
        Error, ExecResult,
        telemetry::{SpanKind, SpanValue},
    };

    fn span() -> ActiveSpan {
        ActiveSpan::start("test", SpanKind::Client, TraceContext::new_root())
    }

    #[test_case("SELECT 1", &[], "SELECT 1" ; "no arguments is identity")]
    #[test_case("", &[], "" ; "empty command")]
    #[test_case("", &[DbValue::Int(1)], "" ; "empty command with arguments")]
    #[test_case("a = ?", &[DbValue::Int(1)], "a = 1" ; "one for one")]
    #[test_case("a = ? AND b = ?", &[DbValue::Int(1)], "a = 1 AND b = ?" ; "surplus placeholder stays literal")]
    #[test_case("a = ?", &[DbValue::Int(1), DbValue::Int(2)], "a = 1" ; "surplus argument ignored")]
    #[test_case("no placeholders", &[DbValue::Int(1)], "no placeholders" ; "no placeholder at all")]
    #[test_case("??", &[DbValue::Text("x".into()), DbValue::Null], "xNULL" ; "adjacent placeholders")]
    #[test_case("a = ? AND b = ?", &[DbValue::Text("?".into()), DbValue::Int(2)], "a = ? AND b = 2" ; "substituted text not rescanned")]
    #[test_case("名前 = ?", &[DbValue::Text("花子".into())], "名前 = 花子" ; "multibyte text")]
    fn test_reconstruct_statement(command: &str, args: &[DbValue], expected: &str) {
        assert_eq!(reconstruct_statement(command, args, '?'), expected);
    }

    #[test]
    fn test_reconstruct_custom_placeholder() {
        let args = [DbValue::Int(5)];
        assert_eq!(reconstruct_statement("id = $ AND q = '?'", &args, '$'), "id = 5 AND q = '?'");
    }

    #[test]
    fn test_zero_arguments_borrows() {
        assert!(matches!(reconstruct_statement("SELECT ?", &[], '?'), Cow::Borrowed(_)));
    }

    proptest! {
        #[test]
        fn prop_zero_arguments_is_identity(command in ".*") {
            prop_assert_eq!(reconstruct_statement(&command, &[], '?'), command.as_str());
        }

        #[test]
        fn prop_first_m_placeholders_replaced(
            segments in prop::collection::vec("[a-z =]{0,6}", 1..8),
            take in 0usize..8,
        ) {
            // `segments.len() - 1` placeholders separate the segments.
            let command = segments.join("?");
            let placeholders = segments.len() - 1;
            let m = take.min(placeholders);
            let args: Vec<DbValue> = (0..m).map(|i| DbValue::Int(1000 + i as i64)).collect();

            let mut expected = String::new();
            for (i, segment) in segments.iter().enumerate() {
                expected.push_str(segment);
                if i < placeholders {
                    if i < m {
                        expected.push_str(&(1000 + i).to_string());
                    } else {
                        expected.push('?');
                    }
                }
            }

            let statement = reconstruct_statement(&command, &args, '?');
            prop_assert_eq!(statement.as_ref(), expected.as_str());
            prop_assert_eq!(statement.matches('?').count(), placeholders - m);
        }
    }

    #[test_case("db.internal:3306", Some(3306) ; "host and port")]
    #[test_case("[::1]:3307", Some(3307) ; "ipv6")]
    #[test_case("::1", None ; "bare ipv6")]
    #[test_case("fe80::1:3306", None ; "bare ipv6 ending in digits")]
    #[test_case("[::1]", None ; "bracketed ipv6 without port")]
    #[test_case("/var/run/mysqld/mysqld.sock", None ; "unix socket")]
    #[test_case("host:notaport", None ; "bad port")]
    fn test_endpoint_port(endpoint: &str, expected: Option<u16>) {
        assert_eq!(endpoint_port(endpoint), expected);
    }

    #[test]
    fn test_extractor_on_start() {
        let extractor = DbClientAttributesExtractor::new(MySqlAttributesGetter::default());
        let request = DbRequest::builder()
            .endpoint("db:3306")
            .namespace("shop")
            .command("SELECT * FROM t WHERE id = ?")
            .operation("SELECT")
            .arguments(vec![DbValue::Int(9)])
            .build();

        let mut span = span();
        extractor.on_start(&mut span, None, &request);

        assert_eq!(span.attribute(DB_SYSTEM), Some(&SpanValue::from("mysql")));
        assert_eq!(span.attribute(SERVER_ADDRESS), Some(&SpanValue::from("db:3306")));
        assert_eq!(span.attribute(SERVER_PORT), Some(&SpanValue::Int(3306)));
        assert_eq!(
            span.attribute(DB_STATEMENT),
            Some(&SpanValue::from("SELECT * FROM t WHERE id = 9"))
        );
        assert_eq!(span.attribute(DB_OPERATION), Some(&SpanValue::from("SELECT")));
        assert_eq!(span.attribute(DB_NAMESPACE), Some(&SpanValue::from("shop")));
        assert_eq!(span.attribute(DB_COLLECTION), Some(&SpanValue::from("")));
        assert_eq!(span.attribute(DB_BATCH_SIZE), Some(&SpanValue::Int(0)));
    }

    #[test]
    fn test_extractor_tolerates_empty_request() {
        let extractor = DbClientAttributesExtractor::new(MySqlAttributesGetter::default());
        let request = DbRequest::builder().build();

        let mut span = span();
        extractor.on_start(&mut span, None, &request);
        extractor.on_end(&mut span, &request, None, None);

        assert_eq!(span.attribute(DB_STATEMENT), Some(&SpanValue::from("")));
        assert_eq!(span.attribute(DB_OPERATION), Some(&SpanValue::from("")));
        assert!(span.attribute(SERVER_PORT).is_none());
        assert!(span.attribute(ERROR_TYPE).is_none());
    }

    #[test]
    fn test_extractor_statement_recording_disabled() {
        let extractor = DbClientAttributesExtractor::new(MySqlAttributesGetter::default())
            .with_record_statement(false);
        let request = DbRequest::builder().command("SELECT secret FROM vault").build();

        let mut span = span();
        extractor.on_start(&mut span, None, &request);
        assert!(span.attribute(DB_STATEMENT).is_none());
    }

    #[test]
    fn test_extractor_on_end_records_outcome() {
        let extractor = DbClientAttributesExtractor::new(MySqlAttributesGetter::default());
        let request = DbRequest::builder().namespace("billing").build();
        let response = DbResponse::Executed(ExecResult { affected_rows: 2, ..Default::default() });

        let mut span = span();
        extractor.on_end(&mut span, &request, Some(&response), None);
        assert_eq!(span.attribute(DB_AFFECTED_ROWS), Some(&SpanValue::Int(2)));
        assert_eq!(span.attribute(DB_NAMESPACE), Some(&SpanValue::from("billing")));
        assert!(span.attribute(DB_RETURNED_ROWS).is_none());

        let err = Error::timeout("read timeout");
        let mut span = self::span();
        extractor.on_end(&mut span, &request, None, Some(&err));
        assert_eq!(span.attribute(ERROR_TYPE), Some(&SpanValue::from("timeout")));

        let foreign = std::io::Error::other("driver-specific");
        let mut span = self::span();
        extractor.on_end(&mut span, &request, None, Some(&foreign));
        assert_eq!(span.attribute(ERROR_TYPE), Some(&SpanValue::from("_OTHER")));
    }
}
