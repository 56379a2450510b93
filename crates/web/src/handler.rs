//! The chain-of-responsibility protocol.
//!
//! Middleware, route controllers and the dispatcher itself are all [`Handler`]s. A handler
//! receives the request [`Context`] and the [`Next`] link of its chain, and decides whether
//! and when to continue:
//!
//! ```
//! use omni_web::handler_fn;
//!
//! let wrap = handler_fn(|ctx, next| {
//!     ctx.write("before ");
//!     next.call(ctx)?;
//!     ctx.write(" after");
//!     Ok(())
//! });
//! # let _ = wrap;
//! ```

use std::fmt;

use crate::context::Context;
use crate::error::Outcome;

pub trait Handler: Send + Sync {
    fn call(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Outcome;
}

/// The rest of a chain after the current unit.
///
/// `Next` is consumed by [`Next::call`], so a unit can continue its chain at most once.
/// Calling the next of the last unit does nothing.
pub struct Next<'a> {
    rest: &'a [&'a dyn Handler],
}

impl<'a> Next<'a> {
    /// Links `units` in order; calling the returned `Next` invokes the first unit.
    pub fn new(units: &'a [&'a dyn Handler]) -> Self {
        Self { rest: units }
    }

    pub fn call(self, ctx: &mut Context<'_>) -> Outcome {
        match self.rest.split_first() {
            Some((head, rest)) => head.call(ctx, Next { rest }),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.rest.is_empty()
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("remaining", &self.rest.len()).finish()
    }
}

/// a closure holder which represents any `Fn(&mut Context, Next) -> Outcome`
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&mut Context<'_>, Next<'_>) -> Outcome + Send + Sync,
{
    fn new(f: F) -> Self {
        Self { f }
    }
}

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut Context<'_>, Next<'_>) -> Outcome + Send + Sync,
{
    FnHandler::new(f)
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(&mut Context<'_>, Next<'_>) -> Outcome + Send + Sync,
{
    fn call(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Outcome {
        (self.f)(ctx, next)
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}
