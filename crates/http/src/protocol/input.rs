//! The request side of a transport.
//!
//! Every transport exposes the same [`Input`] surface to the framework: a request path,
//! an HTTP method (with convenience predicates), environment lookup and the mutable
//! parameter mapping filled in by the router when a route matches.

use http::Method;

/// Route captures attached to the current request.
///
/// Captures keep the order in which they were produced by the route pattern. Each capture
/// may carry a name; unnamed captures can only be reached by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(Option<String>, String)>,
}

impl Params {
    /// Creates an empty set of captures.
    #[inline]
    pub fn new() -> Self {
        Self { entries: vec![] }
    }

    pub fn push_named(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((Some(name.into()), value.into()));
    }

    pub fn push_unnamed(&mut self, value: impl Into<String>) {
        self.entries.push((None, value.into()));
    }

    /// Gets the value of a named capture.
    /// Returns None if no capture carries that name.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        self.entries
            .iter()
            .find(|(key, _)| key.as_deref() == Some(name))
            .map(|(_, value)| value.as_str())
    }

    /// Gets the value of the capture at `index`, named or not.
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(_, value)| value.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_deref(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.push_named(name, value);
        }
        params
    }
}

/// Request-side adapter consumed by the framework.
pub trait Input {
    /// The request path used for routing, always starting with `/` for the bundled transports.
    fn path(&self) -> &str;

    fn method(&self) -> &Method;

    /// Looks up a transport environment variable (CGI meta-variables, process environment).
    fn env(&self, key: &str) -> Option<String>;

    /// The URI prefix the application is mounted under, empty when mounted at the root.
    fn root_uri(&self) -> &str;

    fn params(&self) -> &Params;

    fn set_params(&mut self, params: Params);

    #[inline]
    fn is_get(&self) -> bool {
        *self.method() == Method::GET
    }

    #[inline]
    fn is_post(&self) -> bool {
        *self.method() == Method::POST
    }

    #[inline]
    fn is_put(&self) -> bool {
        *self.method() == Method::PUT
    }

    #[inline]
    fn is_delete(&self) -> bool {
        *self.method() == Method::DELETE
    }

    #[inline]
    fn is_options(&self) -> bool {
        *self.method() == Method::OPTIONS
    }

    #[inline]
    fn is_head(&self) -> bool {
        *self.method() == Method::HEAD
    }

    #[inline]
    fn is_patch(&self) -> bool {
        *self.method() == Method::PATCH
    }
}

/// The process environment; names or values that are not valid UTF-8 are converted lossily.
pub(crate) fn env_vars_lossy() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
}
