use std::fmt;

use omni_http::protocol::{Input, Output, Params};
use serde_json::{Map, Value};

use crate::buffer::OutputBuffer;
use crate::config::Config;
use crate::error::{Error, Interrupt, Outcome};

/// The per-run state handed to every chain unit.
///
/// A context borrows the application's input, output, buffer, config and locals for the
/// duration of one chain invocation.
pub struct Context<'a> {
    input: &'a mut dyn Input,
    output: &'a mut Output,
    buffer: &'a mut OutputBuffer,
    config: &'a Config,
    locals: &'a mut Map<String, Value>,
    failure: Option<&'a Error>,
}

impl<'a> Context<'a> {
    pub fn new(
        input: &'a mut dyn Input,
        output: &'a mut Output,
        buffer: &'a mut OutputBuffer,
        config: &'a Config,
        locals: &'a mut Map<String, Value>,
    ) -> Self {
        Self { input, output, buffer, config, locals, failure: None }
    }

    /// Attaches the failure an error or crash handler is presenting.
    pub fn with_failure(mut self, failure: &'a Error) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Writes to the innermost capture scope, or straight to the output body when no scope
    /// is open.
    pub fn write(&mut self, bytes: impl AsRef<[u8]>) {
        let bytes = bytes.as_ref();
        if !self.buffer.write(bytes) {
            self.output.write(bytes);
        }
    }

    pub fn input(&self) -> &dyn Input {
        self.input
    }

    pub fn input_mut(&mut self) -> &mut dyn Input {
        self.input
    }

    pub fn output(&self) -> &Output {
        self.output
    }

    pub fn output_mut(&mut self) -> &mut Output {
        self.output
    }

    pub fn buffer_mut(&mut self) -> &mut OutputBuffer {
        self.buffer
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn locals(&self) -> &Map<String, Value> {
        self.locals
    }

    pub fn locals_mut(&mut self) -> &mut Map<String, Value> {
        self.locals
    }

    /// Value of a named route capture.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.input.params().get(name)
    }

    pub fn params(&self) -> &Params {
        self.input.params()
    }

    /// The failure being presented, set only for error and crash handlers.
    pub fn failure(&self) -> Option<&Error> {
        self.failure
    }

    /// Ends the chain, keeping the output written so far.
    pub fn stop(&self) -> Outcome {
        Err(Interrupt::Stop)
    }

    /// Declines the current route: its captured output is dropped and the next matching
    /// route is tried.
    pub fn pass(&mut self) -> Outcome {
        self.buffer.clean();
        Err(Interrupt::Pass)
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("path", &self.input.path())
            .field("method", self.input.method())
            .field("params", self.input.params())
            .field("buffer_level", &self.buffer.level())
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Interrupt;
    use crate::test_support::Harness;
    use omni_http::protocol::Params;

    #[test]
    fn test_write_goes_to_innermost_scope() {
        let mut harness = Harness::cli(&[]);
        let mut ctx = harness.context();

        ctx.write("direct ");
        ctx.buffer_mut().start();
        ctx.write("captured");
        assert_eq!(ctx.output().body(), b"direct ");

        let captured = ctx.buffer_mut().end().unwrap();
        assert_eq!(&captured[..], b"captured");
    }

    #[test]
    fn test_params_come_from_input() {
        let mut harness = Harness::cli(&["users", "42"]);
        let mut ctx = harness.context();

        ctx.input_mut().set_params([("id", "42")].into_iter().collect::<Params>());
        assert_eq!(ctx.param("id"), Some("42"));
        assert_eq!(ctx.param("missing"), None);
        assert_eq!(ctx.params().len(), 1);
    }

    #[test]
    fn test_pass_cleans_innermost_scope() {
        let mut harness = Harness::cli(&[]);
        let mut ctx = harness.context();

        ctx.buffer_mut().start();
        ctx.write("kept");
        ctx.buffer_mut().start();
        ctx.write("dropped");

        assert!(matches!(ctx.pass(), Err(Interrupt::Pass)));
        assert!(ctx.buffer_mut().end().unwrap().is_empty());
        assert_eq!(&ctx.buffer_mut().end().unwrap()[..], b"kept");
        assert!(matches!(ctx.stop(), Err(Interrupt::Stop)));
    }

    #[test]
    fn test_locals_are_shared_state() {
        let mut harness = Harness::cli(&[]);
        {
            let mut ctx = harness.context();
            ctx.locals_mut().insert("user".into(), "bob".into());
        }
        assert_eq!(harness.locals.get("user").and_then(|v| v.as_str()), Some("bob"));
    }
}
