//! The ordered route table.
//!
//! Registration order is match priority: the dispatcher walks [`RouteTable::entries_in_order`]
//! and the first entry whose pattern matches runs, unless it passes. Registering a key again
//! replaces its handlers but keeps its position.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::Error;
use crate::handler::Handler;
use crate::pattern::{PatternError, RoutePattern};

/// Keys stored in the route table that never take part in path matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reserved {
    NotFound,
    Error,
    Crash,
}

impl Reserved {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "404" => Some(Reserved::NotFound),
            "error" => Some(Reserved::Error),
            "crash" => Some(Reserved::Crash),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Reserved::NotFound => "404",
            Reserved::Error => "error",
            Reserved::Crash => "crash",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Reserved::NotFound => StatusCode::NOT_FOUND,
            Reserved::Error | Reserved::Crash => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body presented when no handler is registered or the handler wrote nothing.
    pub fn fallback(self) -> &'static str {
        match self {
            Reserved::NotFound => "Path not found",
            Reserved::Error => "Error occurred",
            Reserved::Crash => "App is down",
        }
    }
}

/// A handler given directly, or by a name the factory resolves.
#[derive(Clone)]
pub enum HandlerRef {
    Invocable(Arc<dyn Handler>),
    QualifiedName(String),
}

impl HandlerRef {
    pub fn invocable<H: Handler + 'static>(handler: H) -> Self {
        HandlerRef::Invocable(Arc::new(handler))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            HandlerRef::QualifiedName(name) => Some(name),
            HandlerRef::Invocable(_) => None,
        }
    }
}

impl<H: Handler + 'static> From<H> for HandlerRef {
    fn from(handler: H) -> Self {
        Self::invocable(handler)
    }
}

impl From<Arc<dyn Handler>> for HandlerRef {
    fn from(handler: Arc<dyn Handler>) -> Self {
        HandlerRef::Invocable(handler)
    }
}

impl From<&str> for HandlerRef {
    fn from(name: &str) -> Self {
        HandlerRef::QualifiedName(name.to_owned())
    }
}

impl From<String> for HandlerRef {
    fn from(name: String) -> Self {
        HandlerRef::QualifiedName(name)
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Invocable(_) => f.write_str("Invocable(..)"),
            HandlerRef::QualifiedName(name) => f.debug_tuple("QualifiedName").field(name).finish(),
        }
    }
}

/// One registration: a route key and the handlers linked for it.
pub struct RouteEntry {
    key: String,
    handlers: Vec<HandlerRef>,
    pattern: OnceCell<Result<RoutePattern, PatternError>>,
}

impl RouteEntry {
    fn new(key: String, handlers: Vec<HandlerRef>) -> Self {
        Self { key, handlers, pattern: OnceCell::new() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn handlers(&self) -> &[HandlerRef] {
        &self.handlers
    }

    /// The compiled key, compiled on first use and cached for the life of the entry.
    pub fn pattern(&self) -> Result<&RoutePattern, PatternError> {
        self.pattern.get_or_init(|| RoutePattern::compile(&self.key)).as_ref().map_err(Clone::clone)
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("key", &self.key)
            .field("handlers", &self.handlers)
            .field("compiled", &self.pattern.get().is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    index: HashMap<String, usize>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handlers` under `key`, replacing any previous registration of that key.
    pub fn register(&mut self, key: impl Into<String>, handlers: Vec<HandlerRef>) -> Result<(), Error> {
        let key = key.into();
        if handlers.is_empty() {
            return Err(Error::EmptyRoute { key });
        }
        self.store(key, handlers);
        Ok(())
    }

    /// Registers a single handler under `key`, replacing any previous registration.
    pub fn register_one(&mut self, key: impl Into<String>, handler: HandlerRef) {
        self.store(key.into(), vec![handler]);
    }

    fn store(&mut self, key: String, handlers: Vec<HandlerRef>) {
        match self.index.get(&key) {
            Some(&position) => {
                debug!(key = %key, "route re-registered");
                self.entries[position] = RouteEntry::new(key, handlers);
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(RouteEntry::new(key, handlers));
            }
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&RouteEntry> {
        self.index.get(key).map(|&position| &self.entries[position])
    }

    pub fn lookup_reserved(&self, reserved: Reserved) -> Option<&RouteEntry> {
        self.lookup(reserved.key())
    }

    /// Entries that take part in path matching, in registration order.
    pub fn entries_in_order(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries
            .iter()
            .filter(|entry| !entry.key.is_empty() && Reserved::from_key(&entry.key).is_none())
    }

    /// Every registered key, reserved ones included, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(RouteEntry::key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
