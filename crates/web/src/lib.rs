//! A minimal web and command-line dispatch framework.
//!
//! Requests are routed by pattern through an ordered route table. Around dispatch sits a
//! chain of middleware units, each deciding whether and when the rest of the chain runs.
//! Two control signals shape the flow:
//!
//! - **Stop** ends the chain and keeps what was written so far.
//! - **Pass** lets a route decline: its output is dropped and the next matching route runs.
//!
//! Both are variants of [`Interrupt`] and unwind through `?` like any failure, so a unit can
//! write `next.call(ctx)?` and let them through.
//!
//! # Example
//!
//! ```no_run
//! use omni_web::{App, Config, handler_fn};
//!
//! fn main() -> Result<(), omni_web::Error> {
//!     let mut app = App::new(Config::new())?;
//!
//!     app.on("/", handler_fn(|ctx, _next| {
//!         ctx.write("hello");
//!         Ok(())
//!     }));
//!     app.on("/users/:id", handler_fn(|ctx, _next| {
//!         match ctx.param("id").map(str::to_owned) {
//!             Some(id) if id == "me" => ctx.pass(),
//!             Some(id) => {
//!                 ctx.write(format!("user {id}"));
//!                 Ok(())
//!             }
//!             None => ctx.pass(),
//!         }
//!     }));
//!
//!     app.run()
//! }
//! ```
//!
//! Transport details (CGI-style HTTP or command line) live in the `omni-http` crate.

mod app;
mod buffer;
mod chain;
mod context;
mod dispatch;
mod emitter;
mod error;
mod factory;
mod handler;
mod lifecycle;
mod logging;

pub mod config;
pub mod middleware;
pub mod pattern;
pub mod route;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use app::DEFAULT_MODE;
pub use app::MODE_ENV;
pub use buffer::OutputBuffer;
pub use chain::MiddlewareStack;
pub use config::Config;
pub use config::ConfigError;
pub use context::Context;
pub use dispatch::Dispatcher;
pub use emitter::Emitter;
pub use emitter::Event;
pub use emitter::Listener;
pub use error::BoxError;
pub use error::Error;
pub use error::Interrupt;
pub use error::Outcome;
pub use factory::Factory;
pub use factory::ResolutionError;
pub use handler::FnHandler;
pub use handler::Handler;
pub use handler::Next;
pub use handler::handler_fn;
pub use lifecycle::Lifecycle;
pub use lifecycle::Phase;
pub use logging::init_logging;
pub use route::HandlerRef;
pub use route::Reserved;
pub use route::RouteTable;
