//! The application: configuration, routes, middleware and the run lifecycle.
//!
//! An [`App`] owns everything one invocation needs. Routes and middleware are registered
//! while it is configuring, then [`App::run`] resolves the mode, fires the lifecycle events,
//! links the middleware chain with the dispatcher at its end, runs it inside a capture scope
//! and sends the response.
//!
//! ```
//! use omni_http::protocol::{CliInput, MemorySink, Output, Transport};
//! use omni_web::{App, Config, handler_fn};
//!
//! let sink = MemorySink::new();
//! let input = CliInput::from_args(["hello", "world"]);
//! let output = Output::new(Transport::Cli, sink.clone());
//!
//! let mut app = App::with_io(Config::new(), Box::new(input), output).unwrap();
//! app.on("/hello/:name", handler_fn(|ctx, _next| {
//!     let name = ctx.param("name").unwrap_or("nobody").to_owned();
//!     ctx.write(format!("hello {name}"));
//!     Ok(())
//! }));
//! app.run().unwrap();
//!
//! assert_eq!(sink.to_string_lossy(), "hello world");
//! ```
//!
//! Failures escaping the chain are presented as the error page, or returned from `run` when
//! the `debug` config key is set. An application dropped while its thread panics in the
//! middle of a run sends the crash page.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use omni_http::protocol::{CliInput, HttpInput, Input, Output, Params, Transport};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::buffer::OutputBuffer;
use crate::chain::MiddlewareStack;
use crate::config::Config;
use crate::context::Context;
use crate::dispatch::Dispatcher;
use crate::emitter::{Emitter, Event};
use crate::error::{Error, Interrupt, Outcome};
use crate::factory::Factory;
use crate::handler::{Handler, Next};
use crate::lifecycle::{Lifecycle, PanicTranslator, Phase, panic_message};
use crate::middleware::DebugTrace;
use crate::route::{HandlerRef, Reserved, RouteEntry, RouteTable};

/// Environment variable read for the mode when none was set.
pub const MODE_ENV: &str = "OMNI_ENV";

pub const DEFAULT_MODE: &str = "development";

enum Mode {
    Named(String),
    Lazy(Box<dyn FnOnce() -> String + Send>),
}

pub struct App {
    input: Box<dyn Input>,
    output: Output,
    config: Config,
    locals: Map<String, Value>,
    emitter: Emitter<App>,
    routes: RouteTable,
    factory: Factory,
    middleware: MiddlewareStack,
    mode: Option<Mode>,
    lifecycle: Lifecycle,
    buffer: OutputBuffer,
    timezone: Option<String>,
    translator: Option<PanicTranslator>,
}

macro_rules! method_route {
    ($method:ident, $predicate:ident, $name:literal) => {
        #[doc = concat!("Registers a route only when serving an HTTP `", $name, "` request.")]
        pub fn $method(&mut self, key: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
            if !self.is_cli() && self.input.$predicate() {
                self.routes.register_one(key, handler.into());
            }
            self
        }
    };
}

impl App {
    /// Creates an application for the transport the process was started by, reading the
    /// request from the environment and answering on stdout.
    pub fn new(config: Config) -> Result<Self, Error> {
        let transport = Transport::detect();
        let input: Box<dyn Input> = match transport {
            Transport::Http => Box::new(HttpInput::from_cgi_env()?),
            Transport::Cli => Box::new(CliInput::from_env()),
        };
        Self::with_io(config, input, Output::stdout(transport))
    }

    pub fn with_io(config: Config, input: Box<dyn Input>, output: Output) -> Result<Self, Error> {
        let mut app = Self {
            input,
            output,
            config,
            locals: Map::new(),
            emitter: Emitter::new(),
            routes: RouteTable::new(),
            factory: Factory::new(),
            middleware: MiddlewareStack::new(),
            mode: None,
            lifecycle: Lifecycle::new(),
            buffer: OutputBuffer::new(),
            timezone: None,
            translator: None,
        };

        app.on_event("run", default_run_hook);
        app.emit("init", &[]);
        app.lifecycle.advance(Phase::Configuring)?;
        debug!(transport = ?app.output.transport(), path = app.input.path(), "app initialized");
        Ok(app)
    }

    pub fn is_cli(&self) -> bool {
        self.output.transport().is_cli()
    }

    pub fn is_win(&self) -> bool {
        cfg!(windows)
    }

    pub fn start_time(&self) -> SystemTime {
        self.lifecycle.started_at()
    }

    pub fn run_time(&self) -> Duration {
        self.lifecycle.elapsed()
    }

    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.config.set(key, value);
        self
    }

    pub fn enable(&mut self, key: &str) -> &mut Self {
        self.set(key, true)
    }

    pub fn disable(&mut self, key: &str) -> &mut Self {
        self.set(key, false)
    }

    pub fn enabled(&self, key: &str) -> bool {
        self.config.enabled(key)
    }

    pub fn disabled(&self, key: &str) -> bool {
        self.config.disabled(key)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn locals(&self) -> &Map<String, Value> {
        &self.locals
    }

    pub fn locals_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.locals
    }

    /// The timezone recorded from the `timezone` config key when the run started.
    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    /// Document root joined with the root URI, always ending with `/`.
    pub fn root(&self) -> String {
        let document_root = self.input.env("DOCUMENT_ROOT").unwrap_or_default();
        format!("{}{}/", document_root.trim_end_matches('/'), self.input.root_uri().trim_end_matches('/'))
    }

    pub fn input(&self) -> &dyn Input {
        self.input.as_ref()
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut Output {
        &mut self.output
    }

    /// Sets the mode used by the next run.
    pub fn mode(&mut self, mode: impl Into<String>) -> &mut Self {
        self.mode = Some(Mode::Named(mode.into()));
        self
    }

    /// Sets a mode computed when the run starts.
    pub fn mode_with<F>(&mut self, make: F) -> &mut Self
    where
        F: FnOnce() -> String + Send + 'static,
    {
        self.mode = Some(Mode::Lazy(Box::new(make)));
        self
    }

    /// The mode, once it is known: set by name or resolved by a run.
    pub fn current_mode(&self) -> Option<&str> {
        match &self.mode {
            Some(Mode::Named(name)) => Some(name),
            _ => None,
        }
    }

    /// Runs `setup` when the run resolves `mode`.
    pub fn configure<F>(&mut self, mode: &str, setup: F) -> &mut Self
    where
        F: Fn(&mut App) + Send + Sync + 'static,
    {
        self.on_event(format!("mode:{mode}"), move |app, _| setup(app))
    }

    /// Runs `setup` with whichever mode the run resolves.
    pub fn configure_any<F>(&mut self, setup: F) -> &mut Self
    where
        F: Fn(&mut App, &str) + Send + Sync + 'static,
    {
        self.on_event("mode", move |app, event| setup(app, event.first_str().unwrap_or_default()))
    }

    pub fn on_event<F>(&mut self, name: impl Into<String>, listener: F) -> &mut Self
    where
        F: Fn(&mut App, &Event<'_>) + Send + Sync + 'static,
    {
        self.emitter.on(name, listener);
        self
    }

    /// Calls the listeners of `name` with the application itself; returns how many ran.
    pub fn emit(&mut self, name: &str, args: &[Value]) -> usize {
        let listeners = self.emitter.snapshot(name);
        let event = Event::new(name, args);
        for listener in &listeners {
            listener(self, &event);
        }
        listeners.len()
    }

    /// Appends a middleware unit.
    pub fn add(&mut self, unit: impl Handler + 'static) -> &mut Self {
        self.middleware.push(Arc::new(unit));
        self
    }

    /// Appends the middleware registered in the factory under `name`.
    pub fn add_named(&mut self, name: &str) -> Result<&mut Self, Error> {
        match self.factory.resolve(&HandlerRef::from(name)) {
            Ok(unit) => {
                self.middleware.push(unit);
                Ok(self)
            }
            Err(e) => {
                warn!(name, cause = %e, "refusing middleware");
                Err(Error::bad_middleware(name))
            }
        }
    }

    /// Places the dispatcher at this point of the middleware stack instead of at its end.
    pub fn add_dispatcher(&mut self) -> &mut Self {
        self.middleware.push_dispatcher();
        self
    }

    pub fn factory_mut(&mut self) -> &mut Factory {
        &mut self.factory
    }

    /// Registers a named handler constructor for routes and middleware referring to `name`.
    pub fn register_handler<F, H>(&mut self, name: impl Into<String>, make: F) -> &mut Self
    where
        F: Fn() -> H + Send + Sync + 'static,
        H: Handler + 'static,
    {
        self.factory.register(name, make);
        self
    }

    /// Registers a route for any method and transport.
    pub fn on(&mut self, key: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
        self.routes.register_one(key, handler.into());
        self
    }

    /// Registers a route whose handlers are linked in order; each one decides whether the
    /// next runs.
    pub fn on_chain<I, H>(&mut self, key: impl Into<String>, handlers: I) -> Result<&mut Self, Error>
    where
        I: IntoIterator<Item = H>,
        H: Into<HandlerRef>,
    {
        self.routes.register(key, handlers.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    /// Same as [`on`](App::on).
    pub fn map(&mut self, key: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
        self.on(key, handler)
    }

    method_route!(get, is_get, "GET");
    method_route!(post, is_post, "POST");
    method_route!(put, is_put, "PUT");
    method_route!(delete, is_delete, "DELETE");
    method_route!(options, is_options, "OPTIONS");
    method_route!(head, is_head, "HEAD");

    /// Registers a route on the HTTP transport, dispatching a named handler without an
    /// action to the action named after the request method (`"Users"` on a `POST` becomes
    /// `"Users::post"`).
    pub fn rest(&mut self, key: impl Into<String>, handler: impl Into<HandlerRef>) -> &mut Self {
        if self.is_cli() {
            return self;
        }

        let handler = match handler.into() {
            HandlerRef::QualifiedName(name) if !name.contains("::") => {
                let action = self.input.method().as_str().to_lowercase();
                HandlerRef::QualifiedName(format!("{name}::{action}"))
            }
            other => other,
        };
        self.routes.register_one(key, handler);
        self
    }

    pub fn route(&self, key: &str) -> Option<&RouteEntry> {
        self.routes.lookup(key)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn on_not_found(&mut self, handler: impl Into<HandlerRef>) -> &mut Self {
        self.routes.register_one(Reserved::NotFound.key(), handler.into());
        self
    }

    pub fn on_error(&mut self, handler: impl Into<HandlerRef>) -> &mut Self {
        self.routes.register_one(Reserved::Error.key(), handler.into());
        self
    }

    pub fn on_crash(&mut self, handler: impl Into<HandlerRef>) -> &mut Self {
        self.routes.register_one(Reserved::Crash.key(), handler.into());
        self
    }

    /// Presents the not-found page and sends it.
    pub fn not_found(&mut self) -> Result<(), Error> {
        self.present(Reserved::NotFound, None)?;
        self.output.send()?;
        Ok(())
    }

    /// Presents the error page for `failure` and sends it.
    pub fn error(&mut self, failure: &Error) -> Result<(), Error> {
        self.present(Reserved::Error, Some(failure))?;
        self.output.send()?;
        Ok(())
    }

    /// Presents the crash page and sends it.
    pub fn crash(&mut self, failure: Option<&Error>) -> Result<(), Error> {
        self.present(Reserved::Crash, failure)?;
        self.output.send()?;
        Ok(())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.input.params().get(name)
    }

    pub fn params(&self) -> &Params {
        self.input.params()
    }

    pub fn set_params(&mut self, params: Params) -> &mut Self {
        self.input.set_params(params);
        self
    }

    /// Runs the application once and sends the response.
    ///
    /// Returns `Error::Lifecycle` when called twice. In debug mode a failure escaping the
    /// chain is returned as is and nothing is sent.
    pub fn run(&mut self) -> Result<(), Error> {
        let result = self.run_lifecycle();
        if let Some(mut translator) = self.translator.take() {
            translator.restore();
        }
        result
    }

    fn run_lifecycle(&mut self) -> Result<(), Error> {
        self.lifecycle.advance(Phase::Running)?;

        let mode = self.resolve_mode();
        info!(mode = %mode, path = self.input.path(), "app running");
        self.emit("mode", &[Value::from(mode.as_str())]);
        self.emit(&format!("mode:{mode}"), &[]);
        self.emit("run", &[]);

        if self.config.is_truthy("error") {
            self.translator = Some(PanicTranslator::install());
        }

        self.lifecycle.advance(Phase::Dispatching)?;
        match self.invoke_chain() {
            Ok(()) | Err(Interrupt::Stop | Interrupt::Pass) => {}
            Err(Interrupt::Failure(failure)) if self.config.debug() => return Err(failure),
            Err(Interrupt::Failure(failure)) => {
                error!(cause = %failure, "request failed");
                self.present(Reserved::Error, Some(&failure))?;
                self.emit("error", &[Value::from(failure.to_string())]);
            }
        }

        self.lifecycle.advance(Phase::Finalizing)?;
        self.emit("start", &[]);
        self.output.send_header()?;
        self.output.send_body()?;
        self.emit("end", &[]);
        debug!(elapsed = ?self.run_time(), "app finished");
        Ok(())
    }

    fn resolve_mode(&mut self) -> String {
        let mode = match self.mode.take() {
            Some(Mode::Named(name)) => name,
            Some(Mode::Lazy(make)) => make(),
            None => self.input.env(MODE_ENV).filter(|m| !m.is_empty()).unwrap_or_else(|| DEFAULT_MODE.to_owned()),
        };
        self.mode = Some(Mode::Named(mode.clone()));
        mode
    }

    /// Links the middleware with the dispatcher and runs the chain in a capture scope.
    fn invoke_chain(&mut self) -> Outcome {
        let translate = self.translator.is_some();
        let buffered = !self.config.is_truthy("disable_buffer");

        let dispatcher = Dispatcher::new(&self.routes, &self.factory);
        let chain = self.middleware.assemble(&dispatcher);
        let mut ctx = Context::new(&mut *self.input, &mut self.output, &mut self.buffer, &self.config, &mut self.locals);

        if buffered {
            ctx.buffer_mut().start();
        }

        let outcome = if translate {
            panic::catch_unwind(AssertUnwindSafe(|| Next::new(&chain).call(&mut ctx))).unwrap_or_else(|payload| {
                Err(Error::Panic { message: panic_message(payload.as_ref()) }.into())
            })
        } else {
            Next::new(&chain).call(&mut ctx)
        };

        let captured = ctx.buffer_mut().collapse();
        if !matches!(outcome, Err(Interrupt::Failure(_))) {
            ctx.write(captured);
        }
        outcome
    }

    fn present(&mut self, reserved: Reserved, failure: Option<&Error>) -> Result<(), Error> {
        let dispatcher = Dispatcher::new(&self.routes, &self.factory);
        let mut ctx = Context::new(&mut *self.input, &mut self.output, &mut self.buffer, &self.config, &mut self.locals);
        if let Some(failure) = failure {
            ctx = ctx.with_failure(failure);
        }

        match dispatcher.present(reserved, &mut ctx) {
            Ok(()) | Err(Interrupt::Stop | Interrupt::Pass) => Ok(()),
            Err(Interrupt::Failure(e)) => Err(e),
        }
    }

    /// Emits `shutdown` once. When the thread is panicking out of an unfinished run and
    /// debug mode is off, the crash page is sent.
    pub fn shutdown(&mut self) {
        let unfinished = self.lifecycle.is_unfinished();
        if !self.lifecycle.shut_down() {
            return;
        }

        self.emit("shutdown", &[]);

        if unfinished && thread::panicking() && !self.config.debug() {
            warn!("run aborted by a panic, presenting crash page");
            let aborted = Error::Panic { message: "run aborted".to_owned() };
            if let Err(e) = self.crash(Some(&aborted)) {
                error!(cause = %e, "failed to send crash page");
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("path", &self.input.path())
            .field("output", &self.output)
            .field("mode", &self.current_mode())
            .field("phase", &self.lifecycle.phase())
            .field("routes", &self.routes.len())
            .field("middleware", &self.middleware)
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}

/// Records the timezone and, in debug mode, traces requests.
fn default_run_hook(app: &mut App, _event: &Event<'_>) {
    if let Some(timezone) = app.config.get_str("timezone") {
        app.timezone = Some(timezone.to_owned());
    }
    if app.config.debug() {
        app.middleware.push(Arc::new(DebugTrace::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::App;
    use crate::config::Config;
    use crate::error::{Error, Interrupt};
    use crate::handler_fn;
    use crate::lifecycle::Phase;
    use http::{Method, Request, StatusCode};
    use omni_http::protocol::{CliInput, HttpInput, MemorySink, Output, Transport};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn cli_app(args: &[&str], config: Config) -> (App, MemorySink) {
        let sink = MemorySink::new();
        let input = CliInput::from_args(args.iter().copied());
        let app = App::with_io(config, Box::new(input), Output::new(Transport::Cli, sink.clone())).unwrap();
        (app, sink)
    }

    fn http_app(method: Method, uri: &str) -> (App, MemorySink) {
        let sink = MemorySink::new();
        let request = Request::builder().method(method).uri(uri).body(()).unwrap();
        let input = HttpInput::new(request);
        let app = App::with_io(Config::new(), Box::new(input), Output::new(Transport::Http, sink.clone())).unwrap();
        (app, sink)
    }

    fn writes(text: &'static str) -> impl crate::Handler {
        handler_fn(move |ctx, next| {
            ctx.write(text);
            next.call(ctx)
        })
    }

    #[test]
    fn test_lifecycle_events_in_order() {
        let (mut app, _sink) = cli_app(&[], Config::new());
        let log = Arc::new(Mutex::new(vec![]));

        for name in ["mode", "mode:staging", "run", "start", "end", "shutdown", "error"] {
            let log = Arc::clone(&log);
            app.on_event(name, move |_, event| log.lock().unwrap().push(event.name().to_owned()));
        }
        app.mode("staging");
        app.on("/", writes("home"));

        app.run().unwrap();
        app.shutdown();
        app.shutdown();

        let log = log.lock().unwrap().clone();
        assert_eq!(log, ["mode", "mode:staging", "run", "start", "end", "shutdown"]);
        assert_eq!(app.phase(), Phase::ShuttingDown);
    }

    #[test]
    fn test_mode_resolution() {
        let (mut app, _sink) = cli_app(&[], Config::new());
        app.mode_with(|| "lazy".to_owned());
        assert_eq!(app.current_mode(), None);
        app.run().unwrap();
        assert_eq!(app.current_mode(), Some("lazy"));

        let sink = MemorySink::new();
        let input = CliInput::from_args(Vec::<String>::new()).with_vars([("OMNI_ENV", "production")]);
        let mut app = App::with_io(Config::new(), Box::new(input), Output::new(Transport::Cli, sink)).unwrap();
        let seen = Arc::new(Mutex::new(String::new()));
        let seen_by_listener = Arc::clone(&seen);
        app.configure_any(move |_, mode| *seen_by_listener.lock().unwrap() = mode.to_owned());
        app.run().unwrap();
        assert_eq!(*seen.lock().unwrap(), "production");

        let (mut app, _sink) = cli_app(&[], Config::new());
        app.run().unwrap();
        assert_eq!(app.current_mode(), Some("development"));
    }

    #[test]
    fn test_mode_specific_configuration() {
        let (mut app, sink) = cli_app(&[], Config::new());
        app.mode("production");
        app.configure("production", |app| {
            app.on("/", writes("configured for production"));
        });
        app.configure("development", |app| {
            app.on("/", writes("wrong mode"));
        });

        app.run().unwrap();
        assert_eq!(sink.to_string_lossy(), "configured for production");
    }

    #[test]
    fn test_second_run_is_rejected() {
        let (mut app, _sink) = cli_app(&[], Config::new());
        app.run().unwrap();

        let result = app.run();
        assert!(matches!(result, Err(Error::Lifecycle { from: Phase::Finalizing, to: Phase::Running })));
    }

    #[test]
    fn test_failure_presents_error_page() {
        let (mut app, sink) = cli_app(&["boom"], Config::new());
        let errors = Arc::new(Mutex::new(vec![]));
        let seen = Arc::clone(&errors);
        app.on_event("error", move |_, event| seen.lock().unwrap().push(event.first_str().unwrap_or("").to_owned()));
        app.on("/boom", handler_fn(|ctx, _next| {
            ctx.write("half written");
            Err(Interrupt::fail("disk full"))
        }));

        app.run().unwrap();

        assert_eq!(sink.to_string_lossy(), "Error occurred");
        assert_eq!(app.output().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(*errors.lock().unwrap(), ["disk full"]);
    }

    #[test]
    fn test_error_handler_sees_the_failure() {
        let (mut app, sink) = cli_app(&["boom"], Config::new());
        app.on("/boom", handler_fn(|_ctx, _next| Err(Interrupt::fail("disk full"))));
        app.on_error(handler_fn(|ctx, _next| {
            let message = ctx.failure().map(ToString::to_string).unwrap_or_default();
            ctx.write(format!("sorry: {message}"));
            Ok(())
        }));

        app.run().unwrap();
        assert_eq!(sink.to_string_lossy(), "sorry: disk full");
    }

    #[test]
    fn test_debug_mode_returns_failure() {
        let (mut app, sink) = cli_app(&["boom"], Config::from_value(json!({ "debug": true })).unwrap());
        app.on("/boom", handler_fn(|_ctx, _next| Err(Interrupt::fail("disk full"))));

        let result = app.run();

        assert!(matches!(result, Err(Error::Handler(e)) if e.to_string() == "disk full"));
        assert_eq!(app.phase(), Phase::Dispatching);
        assert!(sink.contents().is_empty());
    }

    #[test]
    fn test_panic_translated_when_configured() {
        let (mut app, sink) = cli_app(&["explode"], Config::from_value(json!({ "error": true })).unwrap());
        app.on("/explode", handler_fn(|_ctx, _next| panic!("kaboom")));
        app.on_error(handler_fn(|ctx, _next| {
            let panicked = matches!(ctx.failure(), Some(Error::Panic { message }) if message == "kaboom");
            ctx.write(if panicked { "translated" } else { "other" });
            Ok(())
        }));

        app.run().unwrap();
        assert_eq!(sink.to_string_lossy(), "translated");
    }

    #[test]
    fn test_middleware_wraps_dispatch() {
        let (mut app, sink) = cli_app(&["page"], Config::new());
        app.add(handler_fn(|ctx, next| {
            ctx.write("<html>");
            next.call(ctx)?;
            ctx.write("</html>");
            Ok(())
        }));
        app.on("/page", writes("content"));

        app.run().unwrap();
        assert_eq!(sink.to_string_lossy(), "<html>content</html>");
    }

    #[test]
    fn test_stop_in_middleware_skips_dispatch() {
        let (mut app, sink) = cli_app(&["secret"], Config::new());
        app.add(handler_fn(|ctx, _next| {
            ctx.write("denied");
            ctx.stop()
        }));
        app.on("/secret", writes("treasure"));

        app.run().unwrap();
        assert_eq!(sink.to_string_lossy(), "denied");
    }

    #[test]
    fn test_named_middleware() {
        let (mut app, sink) = cli_app(&[], Config::new());
        app.register_handler("Banner", || writes("banner "));

        app.add_named("Banner").unwrap();
        assert!(matches!(app.add_named("Missing"), Err(Error::BadMiddleware { name }) if name == "Missing"));

        app.on("/", writes("home"));
        app.run().unwrap();
        assert_eq!(sink.to_string_lossy(), "banner home");
    }

    #[test]
    fn test_method_shorthands_follow_the_request() {
        let (mut app, sink) = http_app(Method::POST, "/items");
        app.get("/items", writes("listing"));
        app.post("/items", writes("created"));
        app.delete("/items", writes("deleted"));

        assert!(app.route("/items").is_some());
        app.run().unwrap();

        let sent = sink.to_string_lossy();
        assert!(sent.starts_with("Status: 200 OK\r\n"));
        assert!(sent.ends_with("\r\n\r\ncreated"));
    }

    #[test]
    fn test_method_shorthands_ignored_on_cli() {
        let (mut app, _sink) = cli_app(&["items"], Config::new());
        app.get("/items", writes("listing"));
        assert!(app.route("/items").is_none());
    }

    #[test]
    fn test_rest_appends_request_method() {
        let (mut app, sink) = http_app(Method::PUT, "/users/7");
        app.register_handler("Users::put", || writes("updated"));
        app.rest("/users/:id", "Users");

        let entry = app.route("/users/:id").unwrap();
        assert_eq!(entry.handlers()[0].name(), Some("Users::put"));

        app.run().unwrap();
        assert!(sink.to_string_lossy().ends_with("updated"));
    }

    #[test]
    fn test_not_found_sends_immediately() {
        let (mut app, sink) = http_app(Method::GET, "/");
        app.not_found().unwrap();

        let sent = sink.to_string_lossy();
        assert!(sent.starts_with("Status: 404 Not Found\r\n"));
        assert!(sent.ends_with("Path not found"));
    }

    #[test]
    fn test_default_run_hook() {
        let config = Config::from_value(json!({ "timezone": "Asia/Shanghai" })).unwrap();
        let (mut app, _sink) = cli_app(&[], config);
        assert_eq!(app.timezone(), None);

        app.run().unwrap();
        assert_eq!(app.timezone(), Some("Asia/Shanghai"));
    }

    #[test]
    fn test_config_shortcuts_and_root() {
        let sink = MemorySink::new();
        let request = Request::builder().uri("/blog/post").body(()).unwrap();
        let input = HttpInput::new(request).with_root_uri("/blog").with_env("DOCUMENT_ROOT", "/var/www/");
        let mut app = App::with_io(Config::new(), Box::new(input), Output::new(Transport::Http, sink)).unwrap();

        app.enable("cache").disable("debug").set("name", "blog");
        assert!(app.enabled("cache"));
        assert!(app.disabled("debug"));
        assert_eq!(app.config().get_str("name"), Some("blog"));
        assert_eq!(app.root(), "/var/www/blog/");
        assert!(!app.is_cli());
    }
}
