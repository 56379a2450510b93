//! Named handler construction.
//!
//! Routes and middleware may refer to handlers by name (`"Users"` or `"Users::show"`)
//! instead of holding them directly. The [`Factory`] turns such a name into a fresh unit
//! each time it is resolved.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use crate::handler::Handler;
use crate::route::HandlerRef;

type Constructor = Arc<dyn Fn() -> Arc<dyn Handler> + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no handler registered as `{name}`")]
    Unknown { name: String },

    #[error("`{name}` is not a valid handler name")]
    Malformed { name: String },
}

#[derive(Default)]
pub struct Factory {
    constructors: HashMap<String, Constructor>,
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor under `name`, replacing any previous one.
    pub fn register<F, H>(&mut self, name: impl Into<String>, make: F) -> &mut Self
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: Handler + 'static,
    {
        let constructor: Constructor = Arc::new(move || Arc::new(make()) as Arc<dyn Handler>);
        self.constructors.insert(name.into(), constructor);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Turns a handler reference into an invocable unit.
    pub fn resolve(&self, handler: &HandlerRef) -> Result<Arc<dyn Handler>, ResolutionError> {
        match handler {
            HandlerRef::Invocable(handler) => Ok(Arc::clone(handler)),
            HandlerRef::QualifiedName(name) => self.construct(name),
        }
    }

    fn construct(&self, name: &str) -> Result<Arc<dyn Handler>, ResolutionError> {
        if !is_well_formed(name) {
            return Err(ResolutionError::Malformed { name: name.to_owned() });
        }

        let constructor = self.constructors.get(name).ok_or_else(|| ResolutionError::Unknown { name: name.to_owned() })?;
        trace!(name, "constructing named handler");
        Ok(constructor())
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.constructors.keys().collect::<Vec<_>>();
        names.sort();
        f.debug_struct("Factory").field("names", &names).finish()
    }
}

/// `Name` or `Class::action`, with no empty part.
fn is_well_formed(name: &str) -> bool {
    match name.split_once("::") {
        Some((class, action)) => !class.is_empty() && !action.is_empty() && !action.contains("::"),
        None => !name.is_empty(),
    }
}
