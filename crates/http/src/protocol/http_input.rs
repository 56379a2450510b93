//! HTTP request input.
//!
//! Wraps a bodyless `http::Request` the same way the request header type of a server would,
//! adding the environment map a CGI-style gateway hands to the process.

use std::collections::HashMap;

use http::{HeaderMap, Method, Request, Uri, Version};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::protocol::input::env_vars_lossy;
use crate::protocol::{Input, InputError, Params};

/// Input adapter for the HTTP transport.
#[derive(Debug)]
pub struct HttpInput {
    inner: Request<()>,
    path: String,
    root_uri: String,
    env: HashMap<String, String>,
    params: Params,
}

impl HttpInput {
    /// Creates an input from a bodyless request.
    pub fn new(request: Request<()>) -> Self {
        let path = normalize_path(request.uri().path(), "");
        Self { inner: request, path, root_uri: String::new(), env: HashMap::new(), params: Params::new() }
    }

    /// Builds the input from CGI meta-variables found in the process environment.
    pub fn from_cgi_env() -> Result<Self, InputError> {
        Self::from_cgi_vars(env_vars_lossy())
    }

    /// Builds the input from CGI meta-variables.
    ///
    /// `REQUEST_METHOD` selects the method (GET when absent). The URI comes from `REQUEST_URI`,
    /// or from `PATH_INFO` plus `QUERY_STRING` when the gateway does not provide it.
    pub fn from_cgi_vars<I, K, V>(vars: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect::<HashMap<_, _>>();

        let method = match env.get("REQUEST_METHOD") {
            Some(method) => Method::from_bytes(method.as_bytes()).map_err(|e| InputError::invalid_method(method, e))?,
            None => Method::GET,
        };

        let uri = match env.get("REQUEST_URI") {
            Some(uri) => uri.clone(),
            None => {
                let path_info = env.get("PATH_INFO").map_or("/", String::as_str);
                match env.get("QUERY_STRING").filter(|q| !q.is_empty()) {
                    Some(query) => format!("{path_info}?{query}"),
                    None => path_info.to_owned(),
                }
            }
        };
        let uri = uri.parse::<Uri>().map_err(InputError::invalid_uri)?;

        debug!(method = %method, uri = %uri, "building http input from cgi environment");
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .map_err(InputError::invalid_uri)?;

        let mut input = Self::new(request);
        input.env = env;
        Ok(input)
    }

    /// Mounts the application under `root_uri`; the prefix is stripped from the routing path.
    pub fn with_root_uri(mut self, root_uri: impl Into<String>) -> Self {
        self.root_uri = root_uri.into().trim_end_matches('/').to_owned();
        self.path = normalize_path(self.inner.uri().path(), &self.root_uri);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the HTTP version of the request
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Decodes the query string into `T`; a missing query string decodes as empty.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, InputError> {
        let query = self.inner.uri().query().unwrap_or_default();
        Ok(serde_urlencoded::from_str(query)?)
    }
}

impl From<Request<()>> for HttpInput {
    #[inline]
    fn from(request: Request<()>) -> Self {
        Self::new(request)
    }
}

impl Input for HttpInput {
    fn path(&self) -> &str {
        &self.path
    }

    fn method(&self) -> &Method {
        self.inner.method()
    }

    fn env(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    fn root_uri(&self) -> &str {
        &self.root_uri
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn set_params(&mut self, params: Params) {
        self.params = params;
    }
}

fn normalize_path(path: &str, root_uri: &str) -> String {
    let stripped = match path.strip_prefix(root_uri) {
        Some(rest) if !root_uri.is_empty() && (rest.is_empty() || rest.starts_with('/')) => rest,
        _ => path,
    };
    if stripped.starts_with('/') { stripped.to_owned() } else { format!("/{stripped}") }
}

#[cfg(test)]
mod tests {
    use super::HttpInput;
    use crate::protocol::{Input, InputError};
    use http::{Method, Request};
    use serde::Deserialize;

    fn request(method: Method, uri: &str) -> Request<()> {
        Request::builder().method(method).uri(uri).body(()).unwrap()
    }

    #[test]
    fn test_path_and_method() {
        let input = HttpInput::new(request(Method::POST, "http://example.com/users/42?x=1"));

        assert_eq!(input.path(), "/users/42");
        assert!(input.is_post());
        assert!(!input.is_get());
        assert_eq!(input.root_uri(), "");
    }

    #[test]
    fn test_root_uri_is_stripped() {
        let input = HttpInput::new(request(Method::GET, "/app/hello/bob")).with_root_uri("/app/");

        assert_eq!(input.root_uri(), "/app");
        assert_eq!(input.path(), "/hello/bob");

        let root = HttpInput::new(request(Method::GET, "/app")).with_root_uri("/app");
        assert_eq!(root.path(), "/");
    }

    #[test]
    fn test_from_cgi_vars() {
        let input = HttpInput::from_cgi_vars([
            ("REQUEST_METHOD", "DELETE"),
            ("PATH_INFO", "/posts/7"),
            ("QUERY_STRING", "force=1"),
            ("DOCUMENT_ROOT", "/var/www"),
        ])
        .unwrap();

        assert!(input.is_delete());
        assert_eq!(input.path(), "/posts/7");
        assert_eq!(input.uri().query(), Some("force=1"));
        assert_eq!(input.env("DOCUMENT_ROOT").as_deref(), Some("/var/www"));
        assert_eq!(input.env("MISSING"), None);
    }

    #[test]
    fn test_from_cgi_vars_rejects_bad_method() {
        let result = HttpInput::from_cgi_vars([("REQUEST_METHOD", "BAD METHOD")]);
        let Err(InputError::InvalidMethod { method, source }) = result else {
            panic!("expected an invalid method error");
        };
        assert_eq!(method, "BAD METHOD");
        assert!(!source.to_string().is_empty());
    }

    #[test]
    fn test_query_decoding() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Paging {
            page: u32,
            size: Option<u32>,
        }

        let input = HttpInput::new(request(Method::GET, "/list?page=3"));
        let paging: Paging = input.query().unwrap();

        assert_eq!(paging, Paging { page: 3, size: None });
    }
}
