//! In-memory destination for a capture's rendered text
//!
//! A sink is shared between the capturing owner and the render tasks. It
//! accepts appends until it is closed; appends after `close` are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct SinkState {
    buffer: String,
    closed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Sink {
    state: Arc<Mutex<SinkState>>,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append rendered text; returns `false` if the sink is closed
    pub fn append(&self, text: &str) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.buffer.push_str(text);
        true
    }

    /// Stop accepting appends
    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Copy of the buffered text
    pub fn contents(&self) -> String {
        self.lock().buffer.clone()
    }

    /// Move the buffered text out, leaving the sink empty
    pub fn take(&self) -> String {
        std::mem::take(&mut self.lock().buffer)
    }

    /// Consume this handle and return the buffered text
    pub fn into_text(self) -> String {
        self.take()
    }

    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two handles share the same buffer
    pub fn same_sink(&self, other: &Sink) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_append_and_take() {
        let sink = Sink::new();
        assert!(sink.append("a"));
        assert!(sink.append("b"));
        assert_eq!(sink.contents(), "ab");
        assert_eq!(sink.take(), "ab");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_append_after_close_is_dropped() {
        let sink = Sink::new();
        sink.append("kept");
        sink.close();

        assert!(!sink.append("dropped"));
        assert!(sink.is_closed());
        assert_eq!(sink.clone().into_text(), "kept");
        assert!(sink.is_empty());
    }

    #[test]
    fn test_clones_share_buffer() {
        let sink = Sink::new();
        let clone = sink.clone();
        clone.append("x");

        assert!(sink.same_sink(&clone));
        assert!(!sink.same_sink(&Sink::new()));
        assert_eq!(sink.contents(), "x");
    }

    #[test]
    fn test_concurrent_appends() {
        let sink = Sink::new();
        thread::scope(|s| {
            for _ in 0..4 {
                let sink = &sink;
                s.spawn(move || {
                    for _ in 0..100 {
                        sink.append("z");
                    }
                });
            }
        });
        assert_eq!(sink.len(), 400);
    }
}
