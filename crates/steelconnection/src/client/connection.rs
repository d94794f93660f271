// SteelConnect Manager HTTP client
//
// Wraps `reqwest::Client` with realm-based URL construction, envelope
// normalization and the per-connection error policy. Bootstrap, system
// helpers, lookups and the image workflow live in sibling files as inherent
// methods to keep this module focused on transport mechanics.

use std::fmt;
use std::path::Path;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::auth::{CredentialStore, Credentials, NetrcStore};
use crate::client::bootstrap::Bootstrap;
use crate::error::Error;
use crate::policy::{ErrorPolicy, FailureHandler};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::response::{Exchange, normalize};
use crate::transport::TransportConfig;

/// Size of the chunks yielded by [`SConnect::stream`].
pub const CHUNK_SIZE: usize = 64 * 1024;

pub const DEFAULT_API_VERSION: &str = "1.0";

/// Query parameters as `(key, value)` pairs.
pub type Params<'a> = &'a [(&'a str, &'a str)];

/// A single-pass stream of byte chunks from a binary endpoint.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// API route prefix under `/api/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Managed-object configuration.
    Config,
    /// Read-only operational status.
    Reporting,
    /// Server information shared by every product.
    Common,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "scm.config",
            Self::Reporting => "scm.reporting",
            Self::Common => "common",
        }
    }
}

/// Request body for mutating calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    /// Encoded as JSON before transmission.
    Json(Value),
    /// Already serialized, sent verbatim.
    Raw(String),
}

impl Body {
    fn encode(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Json(value) => Some(value.to_string()),
            Self::Raw(text) => Some(text.clone()),
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Raw(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Raw(text.to_owned())
    }
}

impl From<Option<Value>> for Body {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Empty, Self::Json)
    }
}

/// Connection to one SteelConnect Manager realm.
///
/// Every call replaces the record of the last exchange, which stays
/// available through [`response`](Self::response), [`result`](Self::result),
/// [`sent`](Self::sent) and [`received`](Self::received). Methods take
/// `&mut self`, so one connection serves one request at a time.
#[derive(Debug)]
pub struct SConnect {
    http: reqwest::Client,
    pub(crate) realm: String,
    api_version: String,
    pub(crate) credentials: Option<Credentials>,
    policy: ErrorPolicy,
    pub(crate) on_error: FailureHandler,
    last: Option<Exchange>,
    pub(crate) scm_version: Option<String>,
}

impl SConnect {
    pub fn builder() -> SConnectBuilder {
        SConnectBuilder::default()
    }

    /// The controller's fully qualified domain name.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Username used for Basic auth, if any.
    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    /// The last exchange, if any call was made.
    pub fn response(&self) -> Option<&Exchange> {
        self.last.as_ref()
    }

    /// The normalized result of the last call.
    pub fn result(&self) -> Option<&Value> {
        self.last.as_ref().and_then(|ex| ex.result.as_ref())
    }

    /// Summary of the last request.
    pub fn sent(&self) -> Option<String> {
        self.last.as_ref().map(Exchange::sent)
    }

    /// Summary of the last response.
    pub fn received(&self) -> Option<String> {
        self.last.as_ref().map(Exchange::received)
    }

    /// Whether the last call succeeded.
    pub fn is_ok(&self) -> bool {
        self.last.as_ref().is_some_and(Exchange::is_ok)
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Scheme and authority. A realm that already names a scheme is used
    /// verbatim, anything else is reached over HTTPS.
    fn origin(&self) -> String {
        if self.realm.contains("://") {
            self.realm.trim_end_matches('/').to_owned()
        } else {
            format!("https://{}", self.realm)
        }
    }

    /// Build `{origin}/api/{namespace}/{version}/{resource}`.
    pub fn make_url(&self, namespace: Namespace, resource: &str) -> Result<Url, Error> {
        let resource = resource.strip_prefix('/').unwrap_or(resource);
        let full = format!(
            "{}/api/{}/{}/{resource}",
            self.origin(),
            namespace.as_str(),
            self.api_version
        );
        Ok(Url::parse(&full)?)
    }

    // ── Public verbs ─────────────────────────────────────────────────

    /// `GET` from the config namespace.
    pub async fn get(&mut self, resource: &str, params: Params<'_>) -> Result<Value, Error> {
        let outcome = self
            .call(Method::GET, Namespace::Config, resource, params, &Body::Empty)
            .await;
        self.apply_policy(outcome)
    }

    /// `GET` from the reporting namespace.
    pub async fn getstatus(&mut self, resource: &str, params: Params<'_>) -> Result<Value, Error> {
        let outcome = self
            .call(Method::GET, Namespace::Reporting, resource, params, &Body::Empty)
            .await;
        self.apply_policy(outcome)
    }

    pub async fn post(&mut self, resource: &str, data: impl Into<Body>) -> Result<Value, Error> {
        let body = data.into();
        let outcome = self
            .call(Method::POST, Namespace::Config, resource, &[], &body)
            .await;
        self.apply_policy(outcome)
    }

    pub async fn put(
        &mut self,
        resource: &str,
        data: impl Into<Body>,
        params: Params<'_>,
    ) -> Result<Value, Error> {
        let body = data.into();
        let outcome = self
            .call(Method::PUT, Namespace::Config, resource, params, &body)
            .await;
        self.apply_policy(outcome)
    }

    pub async fn delete(
        &mut self,
        resource: &str,
        data: impl Into<Body>,
        params: Params<'_>,
    ) -> Result<Value, Error> {
        let body = data.into();
        let outcome = self
            .call(Method::DELETE, Namespace::Config, resource, params, &body)
            .await;
        self.apply_policy(outcome)
    }

    /// `GET` a binary resource from the config namespace.
    ///
    /// The response status and headers are recorded before the body is read;
    /// the body arrives through the returned stream in [`CHUNK_SIZE`] pieces.
    pub async fn stream(&mut self, resource: &str, params: Params<'_>) -> Result<ByteStream, Error> {
        let url = self.make_url(Namespace::Config, resource)?;
        debug!("GET {url} (stream)");

        let resp = self
            .authorize(self.http.get(url).query(params))
            .send()
            .await?;

        info!(status = resp.status().as_u16(), url = %resp.url(), "streaming response");
        self.last = Some(Exchange {
            method: Method::GET,
            url: resp.url().clone(),
            request_body: None,
            status: resp.status(),
            headers: resp.headers().clone(),
            body: Bytes::new(),
            result: None,
        });

        Ok(rechunk(resp.bytes_stream()))
    }

    /// Write the last response body to `path`.
    pub async fn savefile(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let exchange = self
            .last
            .as_ref()
            .ok_or_else(|| Error::Validation("no response to save".into()))?;
        tokio::fs::write(path, &exchange.body).await?;
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(creds) => builder.basic_auth(&creds.username, Some(creds.password.expose_secret())),
            None => builder,
        }
    }

    pub(crate) fn apply_policy(&self, outcome: Result<Value, Error>) -> Result<Value, Error> {
        match outcome {
            Err(err) if err.is_api_error() => (self.on_error)(err),
            other => other,
        }
    }

    /// Send a request and normalize the response, always returning typed
    /// errors regardless of the configured policy.
    pub(crate) async fn call(
        &mut self,
        method: Method,
        namespace: Namespace,
        resource: &str,
        params: Params<'_>,
        body: &Body,
    ) -> Result<Value, Error> {
        let mut exchange = self.send(method, namespace, resource, params, body).await?;

        let outcome = match normalize(exchange.status, exchange.content_type(), &exchange.body) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(exchange.to_error()),
            Err(err) => Err(err),
        };
        exchange.result = outcome.as_ref().ok().cloned();
        if outcome.is_err() {
            info!("RECEIVED: {}", exchange.received().replace('\n', ", "));
        }

        self.last = Some(exchange);
        outcome
    }

    async fn send(
        &self,
        method: Method,
        namespace: Namespace,
        resource: &str,
        params: Params<'_>,
        body: &Body,
    ) -> Result<Exchange, Error> {
        let url = self.make_url(namespace, resource)?;
        let request_body = body.encode();

        let mut builder = self.authorize(self.http.request(method.clone(), url).query(params));
        if let Some(ref text) = request_body {
            builder = builder.body(text.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let url = resp.url().clone();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;

        info!("REQUEST: {method} {url}");
        debug!(body = ?request_body, "REQUEST.body");
        info!("RESPONSE: {} {}", status.as_u16(), status.canonical_reason().unwrap_or(""));
        debug!(headers = ?headers, "RESPONSE.headers");
        debug!(text = %String::from_utf8_lossy(&body), "RESPONSE.text");

        Ok(Exchange {
            method,
            url,
            request_body,
            status,
            headers,
            body,
            result: None,
        })
    }
}

/// Re-slice a body stream into fixed-size chunks; only the last may be
/// shorter.
fn rechunk<S>(inner: S) -> ByteStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut inner = Box::pin(inner);
        let mut buffer = BytesMut::with_capacity(CHUNK_SIZE);
        while let Some(piece) = inner.next().await {
            match piece {
                Ok(piece) => {
                    buffer.extend_from_slice(&piece);
                    while buffer.len() >= CHUNK_SIZE {
                        yield Ok(buffer.split_to(CHUNK_SIZE).freeze());
                    }
                }
                Err(err) => {
                    yield Err(Error::Transport(err));
                    return;
                }
            }
        }
        if !buffer.is_empty() {
            yield Ok(buffer.freeze());
        }
    })
}

impl fmt::Display for SConnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = vec![
            "SteelConnection:".to_owned(),
            format!("realm: '{}'", self.realm),
            format!(
                "scm version: '{}'",
                self.scm_version.as_deref().unwrap_or(crate::client::system::VERSION_UNAVAILABLE)
            ),
            format!("api version: '{}'", self.api_version),
            format!("package version: '{}'", env!("CARGO_PKG_VERSION")),
        ];
        if let Some(exchange) = &self.last {
            lines.extend(exchange.sent().lines().map(String::from));
            lines.extend(exchange.received().lines().map(String::from));
        }
        f.write_str(&lines.join("\n>> "))
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Collects connection options, then resolves realm and credentials in
/// [`connect`](Self::connect).
pub struct SConnectBuilder {
    realm: Option<String>,
    username: Option<String>,
    password: Option<SecretString>,
    use_netrc: bool,
    api_version: String,
    on_error: ErrorPolicy,
    connection_attempts: u32,
    transport: TransportConfig,
    http: Option<reqwest::Client>,
    store: Box<dyn CredentialStore>,
    prompter: Box<dyn Prompter>,
}

impl Default for SConnectBuilder {
    fn default() -> Self {
        Self {
            realm: None,
            username: None,
            password: None,
            use_netrc: false,
            api_version: DEFAULT_API_VERSION.into(),
            on_error: ErrorPolicy::Raise,
            connection_attempts: 3,
            transport: TransportConfig::default(),
            http: None,
            store: Box::new(NetrcStore::default()),
            prompter: Box::new(TerminalPrompter),
        }
    }
}

impl fmt::Debug for SConnectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SConnectBuilder")
            .field("realm", &self.realm)
            .field("username", &self.username)
            .field("use_netrc", &self.use_netrc)
            .field("api_version", &self.api_version)
            .field("on_error", &self.on_error)
            .field("connection_attempts", &self.connection_attempts)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl SConnectBuilder {
    /// Controller FQDN, or a full origin such as `http://127.0.0.1:8080`.
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Take credentials from the credential store only; never prompt.
    pub fn use_netrc(mut self, use_netrc: bool) -> Self {
        self.use_netrc = use_netrc;
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn on_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Number of interactive attempts for realm and login. `0` disables
    /// prompting entirely.
    pub fn connection_attempts(mut self, attempts: u32) -> Self {
        self.connection_attempts = attempts;
        self
    }

    /// Replace the whole transport configuration.
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn timeout(mut self, connect: std::time::Duration, read: std::time::Duration) -> Self {
        self.transport = self.transport.with_timeouts(connect, read);
        self
    }

    /// Use a pre-built client instead of building one from the transport
    /// configuration.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn credential_store(mut self, store: impl CredentialStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn prompter(mut self, prompter: impl Prompter + 'static) -> Self {
        self.prompter = Box::new(prompter);
        self
    }

    /// Resolve realm and credentials, then install the error policy.
    pub async fn connect(self) -> Result<SConnect, Error> {
        let http = match self.http {
            Some(http) => http,
            None => self.transport.build_client()?,
        };

        let mut conn = SConnect {
            http,
            realm: String::new(),
            api_version: self.api_version,
            credentials: None,
            policy: ErrorPolicy::Raise,
            on_error: ErrorPolicy::Raise.handler(),
            last: None,
            scm_version: None,
        };

        conn.bootstrap(Bootstrap {
            realm: self.realm,
            username: self.username,
            password: self.password,
            use_netrc: self.use_netrc,
            attempts: self.connection_attempts,
            store: self.store,
            prompter: self.prompter,
        })
        .await?;

        conn.policy = self.on_error;
        conn.on_error = self.on_error.handler();
        debug!(realm = %conn.realm, policy = %conn.policy, "connection ready");
        Ok(conn)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::stream;
    use serde_json::json;

    use super::*;

    fn conn(realm: &str) -> SConnect {
        SConnect {
            http: reqwest::Client::new(),
            realm: realm.into(),
            api_version: DEFAULT_API_VERSION.into(),
            credentials: None,
            policy: ErrorPolicy::Raise,
            on_error: ErrorPolicy::Raise.handler(),
            last: None,
            scm_version: None,
        }
    }

    #[test]
    fn url_uses_https_and_strips_leading_slash() {
        let sc = conn("realm.riverbed.cc");
        assert_eq!(
            sc.make_url(Namespace::Config, "/org/org-1/sites").unwrap().as_str(),
            "https://realm.riverbed.cc/api/scm.config/1.0/org/org-1/sites"
        );
        assert_eq!(
            sc.make_url(Namespace::Reporting, "node/node-1").unwrap().as_str(),
            "https://realm.riverbed.cc/api/scm.reporting/1.0/node/node-1"
        );
    }

    #[test]
    fn realm_with_scheme_is_used_as_origin() {
        let sc = conn("http://127.0.0.1:8080/");
        assert_eq!(
            sc.make_url(Namespace::Common, "info").unwrap().as_str(),
            "http://127.0.0.1:8080/api/common/1.0/info"
        );
    }

    #[test]
    fn bodies_encode_json_and_pass_raw_through() {
        assert_eq!(Body::from(json!({"a": 1})).encode().as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(Body::from("{\"raw\": true}").encode().as_deref(), Some("{\"raw\": true}"));
        assert_eq!(Body::from(None::<Value>).encode(), None);
    }

    #[test]
    fn display_without_exchange() {
        let text = conn("realm.riverbed.cc").to_string();
        assert!(text.starts_with("SteelConnection:\n>> realm: 'realm.riverbed.cc'"));
        assert!(text.contains("scm version: 'unavailable'"));
    }

    #[tokio::test]
    async fn rechunk_yields_fixed_size_pieces() {
        let pieces: Vec<reqwest::Result<Bytes>> = vec![
            Ok(Bytes::from(vec![1u8; CHUNK_SIZE - 10])),
            Ok(Bytes::from(vec![2u8; CHUNK_SIZE + 30])),
            Ok(Bytes::from(vec![3u8; 5])),
        ];
        let chunks: Vec<Bytes> = rechunk(stream::iter(pieces))
            .map(Result::unwrap)
            .collect()
            .await;

        let sizes: Vec<usize> = chunks.iter().map(Bytes::len).collect();
        assert_eq!(sizes, [CHUNK_SIZE, CHUNK_SIZE, 25]);
        assert_eq!(chunks[1][0], 2);
    }
}
