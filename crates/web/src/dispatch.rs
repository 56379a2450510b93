//! Path dispatch over the route table.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::context::Context;
use crate::error::{Error, Interrupt, Outcome};
use crate::factory::Factory;
use crate::handler::{Handler, Next};
use crate::pattern::is_safe_path;
use crate::route::{HandlerRef, Reserved, RouteTable};

/// Finds and runs the route for a path.
///
/// The dispatcher is also the terminal unit of the middleware chain: calling it as a
/// [`Handler`] dispatches the input path and presents the not-found page when nothing
/// matched.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'a> {
    routes: &'a RouteTable,
    factory: &'a Factory,
}

impl<'a> Dispatcher<'a> {
    pub fn new(routes: &'a RouteTable, factory: &'a Factory) -> Self {
        Self { routes, factory }
    }

    /// Runs the first route matching `path`.
    ///
    /// Returns `Ok(false)` when the path is unsafe or no route ran to completion. A route
    /// that passes has its output dropped and the next matching route is tried. `Stop` and
    /// failures end the dispatch and propagate, keeping what the route wrote.
    pub fn dispatch(&self, path: &str, ctx: &mut Context<'_>) -> Result<bool, Interrupt> {
        if !is_safe_path(path) {
            debug!(path, "rejecting unsafe path");
            return Ok(false);
        }

        for entry in self.routes.entries_in_order() {
            let Some(params) = entry.pattern()?.matches(path) else {
                continue;
            };

            trace!(path, route = entry.key(), params = params.len(), "route matched");
            ctx.input_mut().set_params(params);
            let level = ctx.buffer_mut().start();

            match self.run(entry.handlers(), ctx) {
                Ok(()) => {
                    close_scope(ctx, level);
                    return Ok(true);
                }
                Err(Interrupt::Pass) => {
                    debug!(path, route = entry.key(), "route passed");
                    ctx.buffer_mut().discard_to(level);
                }
                Err(interrupt) => {
                    close_scope(ctx, level);
                    return Err(interrupt);
                }
            }
        }

        Ok(false)
    }

    /// Resolves `handlers`, links them in order and calls the first one.
    ///
    /// Every reference is resolved before anything runs; one that can not be resolved
    /// fails the whole attempt.
    pub fn run(&self, handlers: &[HandlerRef], ctx: &mut Context<'_>) -> Outcome {
        let units = handlers
            .iter()
            .enumerate()
            .map(|(index, handler)| {
                self.factory.resolve(handler).map_err(|source| Error::Resolution { index, source })
            })
            .collect::<Result<Vec<Arc<dyn Handler>>, _>>()?;

        let links = units.iter().map(Arc::as_ref).collect::<Vec<&dyn Handler>>();
        Next::new(&links).call(ctx)
    }

    /// Runs the handler registered for `reserved`; `Ok(false)` when there is none.
    pub fn run_reserved(&self, reserved: Reserved, ctx: &mut Context<'_>) -> Result<bool, Interrupt> {
        match self.routes.lookup_reserved(reserved) {
            Some(entry) => self.run(entry.handlers(), ctx).map(|()| true),
            None => Ok(false),
        }
    }

    /// Replaces the response with the not-found, error or crash page.
    ///
    /// Pending captured output is cleaned, the reserved handler runs in a fresh scope, and
    /// its output (or the fixed plain-text fallback when it wrote nothing) becomes the body
    /// with the matching status. A failing not-found handler propagates its failure; failing error
    /// and crash handlers are logged and fall back.
    pub fn present(&self, reserved: Reserved, ctx: &mut Context<'_>) -> Outcome {
        ctx.buffer_mut().clean_all();
        let level = ctx.buffer_mut().start();
        let result = self.run_reserved(reserved, ctx);
        let captured = ctx.buffer_mut().end_to(level).unwrap_or_default();

        match result {
            Ok(_) | Err(Interrupt::Stop | Interrupt::Pass) => {}
            Err(Interrupt::Failure(e)) if reserved == Reserved::NotFound => return Err(e.into()),
            Err(Interrupt::Failure(e)) => {
                warn!(page = reserved.key(), cause = %e, "reserved handler failed, using fallback");
            }
        }

        let body = if captured.is_empty() {
            ctx.output_mut().set_content_type(&mime::TEXT_PLAIN_UTF_8);
            Bytes::from_static(reserved.fallback().as_bytes())
        } else {
            captured
        };
        debug!(page = reserved.key(), status = reserved.status().as_u16(), "presenting");
        ctx.output_mut().set_status(reserved.status()).set_body(body);
        Ok(())
    }
}

impl Handler for Dispatcher<'_> {
    /// Dispatches the input path. Units linked after the dispatcher are not invoked.
    fn call(&self, ctx: &mut Context<'_>, _next: Next<'_>) -> Outcome {
        let path = ctx.input().path().to_owned();
        let level = ctx.buffer_mut().start();

        let outcome = match self.dispatch(&path, ctx) {
            Ok(true) | Err(Interrupt::Stop | Interrupt::Pass) => Ok(()),
            Ok(false) => {
                debug!(path = %path, "no route matched");
                self.present(Reserved::NotFound, ctx)
            }
            Err(failure) => Err(failure),
        };

        close_scope(ctx, level);
        outcome
    }
}

/// Closes the scope opened at `level`, and any a handler left open inside it, writing the
/// contents to the enclosing scope.
fn close_scope(ctx: &mut Context<'_>, level: usize) {
    if let Some(captured) = ctx.buffer_mut().end_to(level) {
        ctx.write(captured);
    }
}
