//! Content API client.
//!
//! Every page fetches its data through the [`ContentSource`] trait. The
//! production implementation is [`ContentClient`], which POSTs GraphQL
//! queries to a space/environment-scoped endpoint with a bearer token.
//!
//! The client performs exactly one HTTP request per [`ContentSource::execute`]
//! call and never retries; callers decide whether a failure skips an item,
//! fails a page, or aborts the build.
//!
//! ## Failure modes
//!
//! | Situation | Error |
//! |---|---|
//! | Missing space id or token | [`ContentError::Config`] at construction |
//! | Request exceeds `timeout_ms` | [`ContentError::Timeout`] naming the bound |
//! | Non-2xx status | [`ContentError::Query`] with status and first error message |
//! | `errors[]` in a 2xx response | [`ContentError::Query`] with the first message |
//! | Response not shaped as expected | [`ContentError::Decode`] |

use crate::config::{ConfigError, ContentfulConfig};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Contentful request timed out after {ms}ms")]
    Timeout { ms: u64 },
    #[error("{0}")]
    Query(String),
    #[error("Unexpected content shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A named query document plus its variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentQuery {
    pub name: &'static str,
    pub document: &'static str,
    pub variables: Map<String, Value>,
}

impl ContentQuery {
    pub fn new(name: &'static str, document: &'static str) -> Self {
        Self {
            name,
            document,
            variables: Map::new(),
        }
    }

    /// Add a variable (builder style).
    pub fn var(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.variables.insert(key.to_string(), value.into());
        self
    }
}

/// Anything that can answer content queries.
///
/// Returns the response's `data` object. Tests substitute a recording mock.
pub trait ContentSource {
    fn execute(&self, query: &ContentQuery) -> Result<Value, ContentError>;
}

/// Decode a record (or a sub-tree of a response) into a typed value.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ContentError> {
    Ok(serde_json::from_value(value)?)
}

#[derive(Debug, Default, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
}

impl GraphqlResponse {
    fn first_error(&self) -> Option<String> {
        self.errors.first().map(|e| {
            if e.message.is_empty() {
                "Contentful response contained errors".to_string()
            } else {
                e.message.clone()
            }
        })
    }
}

/// HTTP client for the Contentful GraphQL API.
pub struct ContentClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    bearer: String,
    timeout_ms: u64,
}

impl ContentClient {
    /// Build a client. Fails if either credential is missing.
    pub fn new(config: &ContentfulConfig) -> Result<Self, ContentError> {
        let credentials = config.credentials()?;
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContentError::Query(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.endpoint(&credentials.space_id),
            bearer: credentials.access_token,
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, err: reqwest::Error) -> ContentError {
        if err.is_timeout() {
            ContentError::Timeout {
                ms: self.timeout_ms,
            }
        } else {
            ContentError::Query(format!("Contentful request failed: {err}"))
        }
    }
}

impl ContentSource for ContentClient {
    fn execute(&self, query: &ContentQuery) -> Result<Value, ContentError> {
        log::debug!("content query {} {:?}", query.name, query.variables);
        let body = json!({
            "query": query.document,
            "variables": query.variables,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.bearer)
            .json(&body)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().map_err(|e| self.transport_error(e))?;
        let payload = serde_json::from_str::<GraphqlResponse>(&text);

        if !status.is_success() {
            let message = payload
                .ok()
                .and_then(|p| p.first_error())
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(ContentError::Query(format!(
                "Contentful request failed ({}): {message}",
                status.as_u16()
            )));
        }

        let payload = payload?;
        if let Some(message) = payload.first_error() {
            return Err(ContentError::Query(message));
        }
        Ok(payload.data.unwrap_or(Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Accept one connection, capture the request, reply after `delay`.
    fn serve_once(
        status_line: &'static str,
        body: &'static str,
        delay: Duration,
    ) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            thread::sleep(delay);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            request
        });
        (format!("http://{addr}/spaces"), handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn config_for(api_base: String, timeout_ms: u64) -> ContentfulConfig {
        ContentfulConfig {
            space_id: "space-1".into(),
            access_token: "secret-token".into(),
            timeout_ms,
            api_base,
            ..ContentfulConfig::default()
        }
    }

    fn list_query() -> ContentQuery {
        ContentQuery::new("EventList", crate::queries::EVENT_LIST_QUERY).var("limit", 20)
    }

    #[test]
    fn construction_fails_without_credentials() {
        let result = ContentClient::new(&ContentfulConfig::default());
        assert!(matches!(
            result,
            Err(ContentError::Config(ConfigError::MissingCredential(_)))
        ));
    }

    #[test]
    fn query_builder_collects_variables() {
        let q = ContentQuery::new("TeamByYear", crate::queries::TEAM_BY_YEAR_QUERY)
            .var("year", 2025)
            .var("limit", 400);
        assert_eq!(q.variables.get("year"), Some(&json!(2025)));
        assert_eq!(q.variables.get("limit"), Some(&json!(400)));
    }

    #[test]
    fn successful_query_returns_data_and_sends_auth() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"data":{"eventCollection":{"items":[]}}}"#,
            Duration::ZERO,
        );
        let client = ContentClient::new(&config_for(base, 5_000)).unwrap();
        let data = client.execute(&list_query()).unwrap();
        assert_eq!(data, json!({"eventCollection": {"items": []}}));

        let request = server.join().unwrap();
        let lower = request.to_lowercase();
        assert!(request.starts_with("POST /spaces/space-1/environments/master "));
        assert!(lower.contains("authorization: bearer secret-token"));
        assert!(request.contains(r#""limit":20"#));
    }

    #[test]
    fn graphql_errors_surface_first_message() {
        let (base, _server) = serve_once(
            "200 OK",
            r#"{"data":null,"errors":[{"message":"Query cannot be executed"},{"message":"second"}]}"#,
            Duration::ZERO,
        );
        let client = ContentClient::new(&config_for(base, 5_000)).unwrap();
        let err = client.execute(&list_query()).unwrap_err();
        assert!(matches!(&err, ContentError::Query(m) if m == "Query cannot be executed"));
    }

    #[test]
    fn http_failure_names_status() {
        let (base, _server) = serve_once(
            "401 Unauthorized",
            r#"{"errors":[{"message":"Access denied"}]}"#,
            Duration::ZERO,
        );
        let client = ContentClient::new(&config_for(base, 5_000)).unwrap();
        let err = client.execute(&list_query()).unwrap_err().to_string();
        assert_eq!(err, "Contentful request failed (401): Access denied");
    }

    #[test]
    fn slow_response_times_out_with_configured_bound() {
        let (base, _server) = serve_once("200 OK", r#"{"data":{}}"#, Duration::from_secs(3));
        let client = ContentClient::new(&config_for(base, 200)).unwrap();
        let err = client.execute(&list_query()).unwrap_err();
        assert!(matches!(err, ContentError::Timeout { ms: 200 }));
        assert_eq!(err.to_string(), "Contentful request timed out after 200ms");
    }
}
