use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("invalid http method: {method}")]
    InvalidMethod {
        method: String,
        #[source]
        source: http::method::InvalidMethod,
    },

    #[error("invalid request uri: {reason}")]
    InvalidUri { reason: String },

    #[error("invalid query string: {source}")]
    InvalidQuery {
        #[from]
        source: serde_urlencoded::de::Error,
    },
}

impl InputError {
    pub fn invalid_method<S: ToString>(method: S, source: http::method::InvalidMethod) -> Self {
        Self::InvalidMethod { method: method.to_string(), source }
    }

    pub fn invalid_uri<S: ToString>(str: S) -> Self {
        Self::InvalidUri { reason: str.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
