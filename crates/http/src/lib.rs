//! Transport adapters for the omni web framework.
//!
//! An application built on `omni-web` is driven either by a CGI-style HTTP gateway or by a
//! command line. This crate hides the difference behind two types:
//!
//! - [`Input`](protocol::Input) exposes the request path, method, environment and the route
//!   parameters filled in by the router.
//! - [`Output`](protocol::Output) accumulates status, headers and body, and writes them to a
//!   sink once the application is done.
//!
//! # Example
//!
//! ```
//! use http::{Method, Request, StatusCode};
//! use omni_http::protocol::{HttpInput, Input, MemorySink, Output, Transport};
//!
//! let request = Request::builder().method(Method::GET).uri("/hello").body(()).unwrap();
//! let input = HttpInput::new(request);
//! assert_eq!(input.path(), "/hello");
//!
//! let sink = MemorySink::new();
//! let mut output = Output::new(Transport::Http, sink.clone());
//! output.set_status(StatusCode::OK).write(b"hello");
//! output.send().unwrap();
//!
//! assert!(sink.to_string_lossy().ends_with("\r\n\r\nhello"));
//! ```

pub mod codec;
pub mod protocol;
