// Response normalization
//
// Turns a completed exchange into the value callers see: the `items` list
// when the envelope carries one, the bare object otherwise, a marker for
// binary payloads, or `None` when the exchange has to go through error
// mapping. Two vendor quirks are recognised by named predicates so they can
// be replaced once the controller reports them properly.

use std::borrow::Cow;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use reqwest::{Method, StatusCode};
use serde_json::{Map, Value, json};
use url::Url;

use crate::error::Error;

/// Returned instead of a decoded body when the server sent binary data.
pub const BINARY_DATA_MESSAGE: &str = "Binary data returned. \
     Use 'savefile(path)' or read the raw body from 'response()'.";

const OCTET_STREAM: &str = "application/octet-stream";

/// One request/response pair, replaced as a whole by every call.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: Method,
    pub url: Url,
    /// Body as transmitted, `None` when nothing was sent.
    pub request_body: Option<String>,
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Raw response body. Empty for streamed responses.
    pub body: Bytes,
    /// Normalized result, `None` if the response was not normalizable.
    pub result: Option<Value>,
}

impl Exchange {
    /// Whether the response status was 2xx.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.headers)
    }

    /// Server-supplied `error.message` from a failed JSON response.
    pub fn error_message(&self) -> Option<String> {
        if self.is_ok() || self.body.is_empty() {
            return None;
        }
        let decoded: Value = serde_json::from_slice(&self.body).ok()?;
        decoded
            .get("error")?
            .get("message")?
            .as_str()
            .map(String::from)
    }

    /// Summary of the request that was sent.
    pub fn sent(&self) -> String {
        format!(
            "{}: {}\nData Sent: {}",
            self.method,
            self.url,
            self.request_body.as_deref().unwrap_or("None")
        )
    }

    /// Summary of the response that came back.
    pub fn received(&self) -> String {
        format!(
            "Status: {} - {}\nError: {}",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or(""),
            self.error_message().as_deref().unwrap_or("None")
        )
    }

    /// Full diagnostic used by every typed error.
    pub fn diagnostic(&self) -> String {
        format!("{}\n{}", self.received(), self.sent())
    }

    /// Typed error for this exchange's status code.
    pub fn to_error(&self) -> Error {
        Error::from_status(self.status.as_u16(), self.diagnostic())
    }
}

pub(crate) fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

/// Normalize a raw response into the value handed back to callers.
///
/// Returns `Ok(None)` when the response is not usable and must be mapped to
/// a typed error.
pub fn normalize(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Option<Value>, Error> {
    if !status.is_success() {
        if is_queued(body) {
            return decode(body).map(Some);
        }
        if let Some(value) = misreported_unauthorized(status, content_type, body) {
            return Ok(Some(value));
        }
        return Ok(None);
    }

    if content_type == Some(OCTET_STREAM) {
        return Ok(Some(json!({ "status": BINARY_DATA_MESSAGE })));
    }

    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Some(Value::Object(Map::new())));
    }

    let decoded = decode(body)?;
    if is_falsy(&decoded) {
        return Ok(Some(Value::Object(Map::new())));
    }
    match decoded {
        Value::Object(mut map) if map.contains_key("items") => {
            Ok(map.remove("items"))
        }
        other => Ok(Some(other)),
    }
}

/// The image-status endpoint reports an in-progress build as an error
/// status whose body mentions `Queued`.
pub fn is_queued(body: &[u8]) -> bool {
    String::from_utf8_lossy(body).contains("Queued")
}

/// The controller occasionally answers 401 with a valid JSON payload. Only
/// a JSON body without an `error` object is treated as a real result.
pub fn misreported_unauthorized(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> Option<Value> {
    if status != StatusCode::UNAUTHORIZED {
        return None;
    }
    if !content_type.is_some_and(|ct| ct.starts_with("application/json")) {
        return None;
    }
    let decoded: Value = serde_json::from_slice(body).ok()?;
    match &decoded {
        Value::Object(map) if map.contains_key("error") => None,
        _ => Some(decoded),
    }
}

fn decode(body: &[u8]) -> Result<Value, Error> {
    serde_json::from_slice(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

/// JSON values that count as "nothing returned".
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() < f64::EPSILON),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;

    use super::*;

    const JSON: Option<&str> = Some("application/json");

    fn run(status: u16, content_type: Option<&str>, body: &str) -> Option<Value> {
        let status = StatusCode::from_u16(status).unwrap();
        normalize(status, content_type, body.as_bytes()).unwrap()
    }

    #[test]
    fn items_envelope_is_unwrapped_in_order() {
        let body = r#"{"items":[{"id":"b"},{"id":"a"},{"id":"c"}]}"#;
        assert_eq!(
            run(200, JSON, body),
            Some(json!([{"id": "b"}, {"id": "a"}, {"id": "c"}]))
        );
    }

    #[test]
    fn bare_object_is_returned_unchanged() {
        let body = r#"{"id":"node-1","serial":"XN01","tags":[1,2.5,null,true]}"#;
        assert_eq!(
            run(201, JSON, body),
            Some(json!({"id": "node-1", "serial": "XN01", "tags": [1, 2.5, null, true]}))
        );
    }

    #[test]
    fn empty_and_falsy_bodies_become_empty_object() {
        for body in ["", "  ", "{}", "[]", "null", "false", "0", "\"\""] {
            assert_eq!(run(200, JSON, body), Some(json!({})), "body {body:?}");
        }
    }

    #[test]
    fn octet_stream_yields_binary_marker() {
        let marker = run(200, Some("application/octet-stream"), "\u{1}\u{2}");
        assert_eq!(marker, Some(json!({ "status": BINARY_DATA_MESSAGE })));
    }

    #[test]
    fn failures_are_not_normalizable() {
        assert_eq!(run(404, None, ""), None);
        assert_eq!(run(500, JSON, r#"{"error":{"message":"boom"}}"#), None);
        assert_eq!(run(400, JSON, r#"{"items":[1]}"#), None);
    }

    #[test]
    fn queued_failure_is_decoded_anyway() {
        let body = r#"{"error":{"message":"Queued","code":404}}"#;
        assert_eq!(
            run(404, JSON, body),
            Some(json!({"error": {"message": "Queued", "code": 404}}))
        );
    }

    #[test]
    fn misreported_401_only_without_error_object() {
        assert_eq!(run(401, JSON, r#"{"id":"org-1"}"#), Some(json!({"id": "org-1"})));
        assert_eq!(run(401, JSON, r#"{"error":{"message":"nope"}}"#), None);
        assert_eq!(run(401, Some("text/html"), r#"{"id":"org-1"}"#), None);
        assert_eq!(run(401, JSON, "not json"), None);
    }

    #[test]
    fn invalid_json_on_success_is_a_deserialization_error() {
        let err = normalize(StatusCode::OK, JSON, b"<html>").unwrap_err();
        match err {
            Error::Deserialization { body, .. } => assert_eq!(body, "<html>"),
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }

    fn exchange(status: u16, request_body: Option<&str>, body: &str) -> Exchange {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Exchange {
            method: Method::POST,
            url: Url::parse("https://realm.example.cc/api/scm.config/1.0/orgs").unwrap(),
            request_body: request_body.map(String::from),
            status: StatusCode::from_u16(status).unwrap(),
            headers,
            body: Bytes::from(body.to_owned()),
            result: None,
        }
    }

    #[test]
    fn diagnostic_carries_status_message_url_and_body() {
        let ex = exchange(
            400,
            Some(r#"{"name":"x"}"#),
            r#"{"error":{"message":"name taken"}}"#,
        );
        assert_eq!(
            ex.diagnostic(),
            "Status: 400 - Bad Request\nError: name taken\n\
             POST: https://realm.example.cc/api/scm.config/1.0/orgs\n\
             Data Sent: {\"name\":\"x\"}"
        );
        assert!(matches!(ex.to_error(), Error::BadRequest { .. }));
    }

    #[test]
    fn diagnostic_without_server_message() {
        let ex = exchange(502, None, "<html>bad gateway</html>");
        assert_eq!(ex.error_message(), None);
        assert!(ex.received().ends_with("Error: None"));
        assert!(ex.sent().ends_with("Data Sent: None"));
        assert!(matches!(ex.to_error(), Error::ApiNotEnabled { .. }));
    }
}
