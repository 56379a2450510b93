use std::error::Error as StdError;

use omni_http::protocol::{InputError, SendError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::factory::ResolutionError;
use crate::lifecycle::Phase;
use crate::pattern::PatternError;

/// Failure type handlers use for their own errors.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Result of invoking a chain unit.
///
/// `Ok(())` means the unit finished normally. The [`Interrupt`] variants unwind through `?`
/// up to the layer that understands them.
pub type Outcome = Result<(), Interrupt>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid route pattern: {source}")]
    Pattern {
        #[from]
        source: PatternError,
    },

    #[error("route handler #{index} can not be resolved: {source}")]
    Resolution { index: usize, source: ResolutionError },

    #[error("bad middleware can not be added: `{name}`")]
    BadMiddleware { name: String },

    #[error("route `{key}` needs at least one handler")]
    EmptyRoute { key: String },

    #[error("illegal lifecycle transition from {from:?} to {to:?}")]
    Lifecycle { from: Phase, to: Phase },

    #[error("invalid input: {source}")]
    Input {
        #[from]
        source: InputError,
    },

    #[error("failed to send output: {source}")]
    Send {
        #[from]
        source: SendError,
    },

    #[error("invalid config: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("handler panicked: {message}")]
    Panic { message: String },

    #[error(transparent)]
    Handler(BoxError),
}

impl Error {
    /// Wraps an application-defined failure.
    pub fn handler<E: Into<BoxError>>(e: E) -> Self {
        Self::Handler(e.into())
    }

    pub fn bad_middleware<S: ToString>(name: S) -> Self {
        Self::BadMiddleware { name: name.to_string() }
    }
}

/// Non-local exits of a chain.
///
/// `Stop` and `Pass` are control signals, not errors: `Stop` ends the chain and keeps the
/// output written so far, `Pass` abandons the current route so the next matching one is tried.
#[derive(Error, Debug)]
pub enum Interrupt {
    #[error("chain stopped")]
    Stop,

    #[error("route passed")]
    Pass,

    #[error(transparent)]
    Failure(#[from] Error),
}

impl Interrupt {
    /// Shorthand for an application-defined failure.
    pub fn fail<E: Into<BoxError>>(e: E) -> Self {
        Self::Failure(Error::handler(e))
    }

    #[inline]
    pub fn is_signal(&self) -> bool {
        matches!(self, Interrupt::Stop | Interrupt::Pass)
    }
}

impl From<PatternError> for Interrupt {
    fn from(e: PatternError) -> Self {
        Self::Failure(e.into())
    }
}

impl From<SendError> for Interrupt {
    fn from(e: SendError) -> Self {
        Self::Failure(e.into())
    }
}

impl From<ConfigError> for Interrupt {
    fn from(e: ConfigError) -> Self {
        Self::Failure(e.into())
    }
}
