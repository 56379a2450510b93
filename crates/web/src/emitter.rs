//! Named lifecycle events.
//!
//! Listeners are registered per event name and called in registration order. An emitter is
//! generic over the target its listeners receive, so the application can hand itself to its
//! own listeners by emitting from a [`snapshot`](Emitter::snapshot).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

/// An emitted event: its name and the arguments the emitting call supplied.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    name: &'a str,
    args: &'a [Value],
}

impl<'a> Event<'a> {
    pub fn new(name: &'a str, args: &'a [Value]) -> Self {
        Self { name, args }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// The first argument as a string, when there is one.
    pub fn first_str(&self) -> Option<&'a str> {
        self.args.first().and_then(Value::as_str)
    }
}

pub type Listener<C> = Arc<dyn Fn(&mut C, &Event<'_>) + Send + Sync>;

pub struct Emitter<C> {
    listeners: HashMap<String, Vec<Listener<C>>>,
}

impl<C> Emitter<C> {
    pub fn new() -> Self {
        Self { listeners: HashMap::new() }
    }

    pub fn on<F>(&mut self, name: impl Into<String>, listener: F)
    where
        F: Fn(&mut C, &Event<'_>) + Send + Sync + 'static,
    {
        self.listeners.entry(name.into()).or_default().push(Arc::new(listener));
    }

    /// Removes every listener of `name`.
    pub fn off(&mut self, name: &str) {
        self.listeners.remove(name);
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, Vec::len)
    }

    /// Calls the listeners of `name` with `target` and returns how many were called.
    pub fn emit(&self, target: &mut C, name: &str, args: &[Value]) -> usize {
        let listeners = self.snapshot(name);
        let event = Event::new(name, args);
        trace!(event = name, listeners = listeners.len(), "emitting");
        for listener in &listeners {
            listener(target, &event);
        }
        listeners.len()
    }

    /// The listeners of `name` at this moment, detached from the emitter.
    pub fn snapshot(&self, name: &str) -> Vec<Listener<C>> {
        self.listeners.get(name).cloned().unwrap_or_default()
    }
}

impl<C> Default for Emitter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Emitter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.listeners.iter().map(|(name, list)| (name.as_str(), list.len())).collect::<HashMap<_, _>>();
        f.debug_struct("Emitter").field("listeners", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Emitter;
    use serde_json::json;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let mut emitter = Emitter::<Vec<String>>::new();
        emitter.on("run", |log, _| log.push("first".into()));
        emitter.on("run", |log, event| log.push(format!("second:{}", event.name())));

        let mut log = vec![];
        assert_eq!(emitter.emit(&mut log, "run", &[]), 2);
        assert_eq!(log, ["first", "second:run"]);
    }

    #[test]
    fn test_arguments_are_passed_through() {
        let mut emitter = Emitter::<Vec<String>>::new();
        emitter.on("mode", |log, event| log.push(event.first_str().unwrap_or("none").to_owned()));

        let mut log = vec![];
        emitter.emit(&mut log, "mode", &[json!("production")]);
        emitter.emit(&mut log, "mode", &[]);
        assert_eq!(log, ["production", "none"]);
    }

    #[test]
    fn test_unknown_event_and_off() {
        let mut emitter = Emitter::<u32>::new();
        emitter.on("tick", |count, _| *count += 1);

        let mut count = 0;
        assert_eq!(emitter.emit(&mut count, "tock", &[]), 0);
        assert_eq!(emitter.listener_count("tick"), 1);

        emitter.off("tick");
        assert_eq!(emitter.emit(&mut count, "tick", &[]), 0);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut emitter = Emitter::<u32>::new();
        emitter.on("tick", |count, _| *count += 1);

        let snapshot = emitter.snapshot("tick");
        emitter.off("tick");

        let mut count = 0;
        snapshot.iter().for_each(|listener| listener(&mut count, &super::Event::new("tick", &[])));
        assert_eq!(count, 1);
    }
}
