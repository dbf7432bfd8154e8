//! HTTP request value objects.
//!
//! [`RequestHead`] is what the header decoder produces off the wire, [`Request`]
//! is the head plus its body, a request-scoped metadata store and the shared
//! [`Collaborators`]. A `Request` is owned by one connection and handed by value
//! to the dispatcher; it is never shared.

use std::collections::HashMap;
use std::future::Future;

use bytes::Bytes;
use http::header::{AsHeaderName, CONNECTION};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Version};
use serde_json::Value;

use crate::protocol::{CollaboratorError, Collaborators, HandlerError, ParseError, Response};

/// The methods this server accepts, anything else is rejected while parsing.
pub const SUPPORTED_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::HEAD,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

/// Parses a request-line method, accepting only [`SUPPORTED_METHODS`].
pub fn parse_method(method: &str) -> Result<Method, ParseError> {
    SUPPORTED_METHODS.iter().find(|supported| supported.as_str() == method).cloned().ok_or(ParseError::InvalidMethod)
}

/// Request line and headers of one parsed message.
#[derive(Debug, Clone)]
pub struct RequestHead {
    method: Method,
    path: String,
    query: Option<String>,
    version: Version,
    headers: HeaderMap,
}

impl RequestHead {
    /// Builds a head from a raw request target; the query string, if any, is split off the path.
    ///
    /// The path is kept raw, no percent-decoding happens here or in routing.
    pub fn new(method: Method, target: &str, version: Version, headers: HeaderMap) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (target.to_owned(), None),
        };
        Self { method, path, query, version, headers }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Whether the connection may be reused after answering this request.
    ///
    /// HTTP/1.1 keeps the connection unless `Connection: close` is sent, HTTP/1.0
    /// closes it unless `Connection: keep-alive` is sent.
    pub fn is_keep_alive(&self) -> bool {
        let connection = self.headers.get(CONNECTION).and_then(|value| value.to_str().ok());
        match self.version {
            Version::HTTP_10 => connection.is_some_and(|value| has_token(value, "keep-alive")),
            _ => !connection.is_some_and(|value| has_token(value, "close")),
        }
    }
}

fn has_token(value: &str, token: &str) -> bool {
    value.split(',').any(|item| item.trim().eq_ignore_ascii_case(token))
}

/// A complete request as seen by handlers.
#[derive(Debug)]
pub struct Request {
    head: RequestHead,
    body: Bytes,
    metadata: HashMap<String, Value>,
    collaborators: Collaborators,
}

impl Request {
    /// Creates an HTTP/1.1 request without body or collaborators, mostly useful for tests.
    pub fn new(method: Method, path: &str, headers: HeaderMap) -> Self {
        Self::from_parts(RequestHead::new(method, path, Version::HTTP_11, headers), Bytes::new())
    }

    pub fn from_parts(head: RequestHead, body: Bytes) -> Self {
        Self { head, body, metadata: HashMap::new(), collaborators: Collaborators::default() }
    }

    #[must_use]
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn head(&self) -> &RequestHead {
        &self.head
    }

    pub fn method(&self) -> &Method {
        self.head.method()
    }

    pub fn path(&self) -> &str {
        self.head.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.head.query()
    }

    pub fn version(&self) -> Version {
        self.head.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.head.headers_mut()
    }

    /// Returns a header value if it is present and valid visible ASCII.
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.head.headers().get(name).and_then(|value| value.to_str().ok())
    }

    /// Sets a header, replacing every previous value of the same name.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.head.headers_mut().insert(name, value);
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the body as JSON, a malformed body is the client's fault.
    pub fn body_json(&self) -> Result<Value, HandlerError> {
        serde_json::from_slice(&self.body).map_err(|e| HandlerError::bad_request(format!("invalid json body: {e}")))
    }

    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn remove_metadata(&mut self, key: &str) -> Option<Value> {
        self.metadata.remove(key)
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Hands a background task to the injected task submitter.
    pub fn submit<F>(&self, task: F) -> Result<(), CollaboratorError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.collaborators.task_submitter()?.submit(Box::pin(task))
    }

    /// Renders a template with the injected engine into a response.
    pub fn render(&self, name: &str, context: &Value) -> Result<Response, CollaboratorError> {
        let rendered = self.collaborators.template_engine()?.render(name, context)?;
        Ok(Response::text(rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MockTemplateEngine;
    use crate::protocol::TokioTaskSubmitter;
    use serde_json::json;

    #[test]
    fn split_query() {
        let head = RequestHead::new(Method::GET, "/users/42?a=1&b=2", Version::HTTP_11, HeaderMap::new());
        assert_eq!(head.path(), "/users/42");
        assert_eq!(head.query(), Some("a=1&b=2"));

        let head = RequestHead::new(Method::GET, "/users", Version::HTTP_11, HeaderMap::new());
        assert_eq!(head.query(), None);
    }

    #[test]
    fn method_set() {
        assert_eq!(parse_method("GET").unwrap(), Method::GET);
        assert_eq!(parse_method("PATCH").unwrap(), Method::PATCH);
        assert!(matches!(parse_method("BREW"), Err(ParseError::InvalidMethod)));
        assert!(matches!(parse_method("get"), Err(ParseError::InvalidMethod)));
    }

    #[test]
    fn keep_alive_rules() {
        let mut headers = HeaderMap::new();
        assert!(RequestHead::new(Method::GET, "/", Version::HTTP_11, headers.clone()).is_keep_alive());
        assert!(!RequestHead::new(Method::GET, "/", Version::HTTP_10, headers.clone()).is_keep_alive());

        headers.insert(CONNECTION, HeaderValue::from_static("Close"));
        assert!(!RequestHead::new(Method::GET, "/", Version::HTTP_11, headers.clone()).is_keep_alive());

        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        assert!(RequestHead::new(Method::GET, "/", Version::HTTP_10, headers).is_keep_alive());
    }

    #[test]
    fn headers_and_metadata() {
        let mut request = Request::new(Method::GET, "/", HeaderMap::new());
        assert_eq!(request.header("x-trace"), None);

        request.set_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("abc"));
        assert_eq!(request.header("X-Trace"), Some("abc"));

        request.set_metadata("user", json!({"id": 7}));
        assert_eq!(request.metadata("user"), Some(&json!({"id": 7})));
        assert_eq!(request.remove_metadata("user"), Some(json!({"id": 7})));
        assert_eq!(request.metadata("user"), None);
    }

    #[test]
    fn body_json() {
        let request = Request::new(Method::POST, "/", HeaderMap::new()).with_body(r#"{"a":1}"#);
        assert_eq!(request.body_json().unwrap(), json!({"a": 1}));

        let request = Request::new(Method::POST, "/", HeaderMap::new()).with_body("{");
        assert_eq!(request.body_json().unwrap_err().status_code(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn render_without_engine() {
        let request = Request::new(Method::GET, "/", HeaderMap::new());
        let result = request.render("index.html", &json!({}));
        assert!(matches!(result, Err(CollaboratorError::NotInjected("template engine"))));

        let result = request.submit(async {});
        assert!(matches!(result, Err(CollaboratorError::NotInjected("task submitter"))));
    }

    #[test]
    fn render_with_engine() {
        let mut engine = MockTemplateEngine::new();
        engine
            .expect_render()
            .withf(|name, context| name == "hello.html" && context["name"] == "nimble")
            .times(1)
            .returning(|_, context| Ok(format!("<p>hello {}</p>", context["name"].as_str().unwrap_or_default())));

        let request = Request::new(Method::GET, "/", HeaderMap::new())
            .with_collaborators(Collaborators::new().with_template_engine(engine));

        let response = request.render("hello.html", &json!({"name": "nimble"})).unwrap();
        assert_eq!(response.content_type(), "text/html");
        assert_eq!(&response.body_bytes()[..], b"<p>hello nimble</p>");
    }

    #[tokio::test]
    async fn submit_with_submitter() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let request = Request::new(Method::GET, "/", HeaderMap::new())
            .with_collaborators(Collaborators::new().with_task_submitter(TokioTaskSubmitter));

        request
            .submit(async move {
                let _ = tx.send(42);
            })
            .unwrap();

        assert_eq!(rx.await.unwrap(), 42);
    }
}
