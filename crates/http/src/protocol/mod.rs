//! Transport protocol abstractions.
//!
//! The framework never talks to a socket or a terminal directly. It reads the request
//! through an [`Input`] and builds the response in an [`Output`]:
//!
//! - **Request side** ([`input`]): the [`Input`] trait and route captures ([`Params`])
//!   - [`HttpInput`]: a bodyless `http::Request` or CGI meta-variables
//!   - [`CliInput`]: process arguments routed as a path
//!
//! - **Response side** ([`output`]): [`Output`], a fully buffered response flushed to a sink
//!
//! - **Error Handling** ([`error`]): [`InputError`] and [`SendError`]

mod transport;
pub use transport::Transport;

mod input;
pub use input::Input;
pub use input::Params;

mod http_input;
pub use http_input::HttpInput;

mod cli_input;
pub use cli_input::CliInput;

mod output;
pub use output::MemorySink;
pub use output::Output;

mod error;
pub use error::InputError;
pub use error::SendError;
