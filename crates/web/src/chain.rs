//! Middleware registration and per-run chain assembly.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::handler::Handler;

enum Link {
    Unit(Arc<dyn Handler>),
    Dispatcher,
}

/// Middleware in registration order, with an optional explicit dispatcher position.
#[derive(Default)]
pub struct MiddlewareStack {
    links: Vec<Link>,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, unit: Arc<dyn Handler>) {
        self.links.push(Link::Unit(unit));
    }

    /// Places the dispatcher at the current end of the stack. Only the first placement counts.
    pub fn push_dispatcher(&mut self) {
        if self.has_dispatcher() {
            warn!("dispatcher already placed in the middleware stack, ignoring");
            return;
        }
        self.links.push(Link::Dispatcher);
    }

    pub fn has_dispatcher(&self) -> bool {
        self.links.iter().any(|link| matches!(link, Link::Dispatcher))
    }

    /// Number of middleware units, not counting the dispatcher.
    pub fn len(&self) -> usize {
        self.links.iter().filter(|link| matches!(link, Link::Unit(_))).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Links the stack for one run, ending with `dispatcher` unless it was placed explicitly.
    pub fn assemble<'a>(&'a self, dispatcher: &'a dyn Handler) -> Vec<&'a dyn Handler> {
        let mut chain = self
            .links
            .iter()
            .map(|link| match link {
                Link::Unit(unit) => unit.as_ref(),
                Link::Dispatcher => dispatcher,
            })
            .collect::<Vec<_>>();

        if !self.has_dispatcher() {
            chain.push(dispatcher);
        }
        chain
    }
}

impl fmt::Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let links = self
            .links
            .iter()
            .map(|link| match link {
                Link::Unit(_) => "unit",
                Link::Dispatcher => "dispatcher",
            })
            .collect::<Vec<_>>();
        f.debug_struct("MiddlewareStack").field("links", &links).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::MiddlewareStack;
    use crate::handler::{Handler, Next};
    use crate::test_support::Harness;
    use crate::{Context, Outcome, handler_fn};
    use std::sync::Arc;

    struct Tag(&'static str);

    impl Handler for Tag {
        fn call(&self, ctx: &mut Context<'_>, next: Next<'_>) -> Outcome {
            ctx.write(self.0);
            next.call(ctx)
        }
    }

    fn run(stack: &MiddlewareStack) -> Vec<u8> {
        let terminal = Tag("[route]");
        let chain = stack.assemble(&terminal);
        let mut harness = Harness::cli(&[]);
        Next::new(&chain).call(&mut harness.context()).unwrap();
        harness.output.body().to_vec()
    }

    #[test]
    fn test_dispatcher_is_appended() {
        let mut stack = MiddlewareStack::new();
        stack.push(Arc::new(Tag("a")));
        stack.push(Arc::new(Tag("b")));

        assert_eq!(run(&stack), b"ab[route]");
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_empty_stack_is_only_the_dispatcher() {
        let stack = MiddlewareStack::new();
        assert!(stack.is_empty());
        assert_eq!(run(&stack), b"[route]");
    }

    #[test]
    fn test_explicit_dispatcher_is_linked_once() {
        let mut stack = MiddlewareStack::new();
        stack.push(Arc::new(Tag("a")));
        stack.push_dispatcher();
        stack.push_dispatcher();
        stack.push(Arc::new(Tag("b")));

        assert!(stack.has_dispatcher());
        assert_eq!(run(&stack), b"a[route]b");
    }

    #[test]
    fn test_assembly_is_fresh_per_run() {
        let mut stack = MiddlewareStack::new();
        stack.push(Arc::new(handler_fn(|ctx, next| {
            ctx.write("m");
            next.call(ctx)
        })));

        assert_eq!(run(&stack), b"m[route]");
        assert_eq!(run(&stack), b"m[route]");
    }
}
