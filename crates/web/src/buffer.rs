//! Nested output capture.
//!
//! Route attempts write into their own scope so that a passed attempt can be thrown away
//! without touching what enclosing scopes captured.

use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Default)]
pub struct OutputBuffer {
    scopes: Vec<BytesMut>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a scope and returns the new nesting level.
    pub fn start(&mut self) -> usize {
        self.scopes.push(BytesMut::new());
        self.scopes.len()
    }

    #[inline]
    pub fn level(&self) -> usize {
        self.scopes.len()
    }

    /// Appends to the innermost scope. Returns false when no scope is open.
    pub fn write(&mut self, bytes: &[u8]) -> bool {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.put_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// Empties the innermost scope, keeping it open.
    pub fn clean(&mut self) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.clear();
        }
    }

    /// Empties every open scope, keeping them open.
    pub fn clean_all(&mut self) {
        self.scopes.iter_mut().for_each(BytesMut::clear);
    }

    /// Closes the innermost scope and returns what it captured.
    pub fn end(&mut self) -> Option<Bytes> {
        self.scopes.pop().map(BytesMut::freeze)
    }

    /// Closes the innermost scope, dropping what it captured.
    pub fn discard(&mut self) {
        self.scopes.pop();
    }

    /// Closes the scope opened at `level` together with any scope still open inside it, and
    /// returns their contents joined outermost first. `None` when that scope is not open.
    pub fn end_to(&mut self, level: usize) -> Option<Bytes> {
        if level == 0 || level > self.scopes.len() {
            return None;
        }
        let mut joined = BytesMut::new();
        for scope in self.scopes.drain(level - 1..) {
            joined.put(scope);
        }
        Some(joined.freeze())
    }

    /// Closes the scope opened at `level` together with any scope inside it, dropping what
    /// they captured.
    pub fn discard_to(&mut self, level: usize) {
        self.scopes.truncate(level.saturating_sub(1));
    }

    /// Closes every scope and returns their contents joined outermost first.
    pub fn collapse(&mut self) -> Bytes {
        let mut joined = BytesMut::new();
        for scope in self.scopes.drain(..) {
            joined.put(scope);
        }
        joined.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::OutputBuffer;

    #[test]
    fn test_write_without_scope_is_rejected() {
        let mut buffer = OutputBuffer::new();
        assert!(!buffer.write(b"lost"));
        assert_eq!(buffer.level(), 0);
    }

    #[test]
    fn test_nested_scopes() {
        let mut buffer = OutputBuffer::new();
        buffer.start();
        buffer.write(b"outer ");
        assert_eq!(buffer.start(), 2);
        buffer.write(b"inner");

        let inner = buffer.end().unwrap();
        assert_eq!(&inner[..], b"inner");
        assert_eq!(buffer.level(), 1);
        assert_eq!(&buffer.end().unwrap()[..], b"outer ");
        assert!(buffer.end().is_none());
    }

    #[test]
    fn test_discard_only_drops_innermost() {
        let mut buffer = OutputBuffer::new();
        buffer.start();
        buffer.write(b"kept");
        buffer.start();
        buffer.write(b"passed attempt");
        buffer.discard();

        assert_eq!(&buffer.collapse()[..], b"kept");
        assert_eq!(buffer.level(), 0);
    }

    #[test]
    fn test_closing_to_a_level_takes_inner_scopes_along() {
        let mut buffer = OutputBuffer::new();
        buffer.start();
        buffer.write(b"kept ");
        let attempt = buffer.start();
        buffer.write(b"draft ");
        buffer.start();
        buffer.write(b"left open");

        buffer.discard_to(attempt);
        assert_eq!(buffer.level(), 1);

        let attempt = buffer.start();
        buffer.write(b"route ");
        buffer.start();
        buffer.write(b"nested");
        assert_eq!(&buffer.end_to(attempt).unwrap()[..], b"route nested");
        assert_eq!(buffer.level(), 1);

        assert!(buffer.end_to(5).is_none());
        assert!(buffer.end_to(0).is_none());
        assert_eq!(&buffer.collapse()[..], b"kept ");
    }

    #[test]
    fn test_clean_keeps_scopes_open() {
        let mut buffer = OutputBuffer::new();
        buffer.start();
        buffer.write(b"a");
        buffer.start();
        buffer.write(b"b");

        buffer.clean();
        assert_eq!(buffer.level(), 2);
        buffer.write(b"c");
        assert_eq!(&buffer.collapse()[..], b"ac");

        buffer.start();
        buffer.write(b"x");
        buffer.start();
        buffer.write(b"y");
        buffer.clean_all();
        assert_eq!(buffer.level(), 2);
        assert!(buffer.collapse().is_empty());
    }
}
