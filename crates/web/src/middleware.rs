//! Bundled middleware.

use std::time::Instant;

use tracing::{debug, error, info};

use crate::context::Context;
use crate::error::{Interrupt, Outcome};
use crate::handler::{Handler, Next};

/// Logs every request passing through the chain: path, method, time spent and how the rest
/// of the chain ended. Failures are logged with their cause and propagated unchanged.
///
/// The application adds it in debug mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugTrace;

impl DebugTrace {
    pub fn new() -> Self {
        Self
    }
}

impl Handler for DebugTrace {
    fn call(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Outcome {
        let path = ctx.input().path().to_owned();
        let method = ctx.input().method().clone();
        let start = Instant::now();

        let outcome = next.call(ctx);
        let elapsed = start.elapsed();
        let status = ctx.output().status().as_u16();

        match &outcome {
            Ok(()) => info!(%method, path = %path, status, ?elapsed, "request handled"),
            Err(Interrupt::Stop) => info!(%method, path = %path, status, ?elapsed, "request stopped"),
            Err(Interrupt::Pass) => debug!(%method, path = %path, ?elapsed, "request passed"),
            Err(Interrupt::Failure(e)) => error!(%method, path = %path, ?elapsed, cause = %e, "request failed"),
        }

        outcome
    }
}
