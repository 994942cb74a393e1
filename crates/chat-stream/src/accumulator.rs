use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::decoder::StreamEvent;

/// Immutable view of the reply text at one point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot(Arc<str>);

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot(Arc::from(""))
    }
}

impl Snapshot {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Snapshot {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for Snapshot {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// Owns the reply buffer for one session.
#[derive(Debug, Default)]
pub struct Accumulator {
    buffer: String,
    deltas: u64,
    snapshot: Snapshot,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event and returns the buffer as it stands afterwards.
    ///
    /// Only `Delta` changes the buffer.
    pub fn apply(&mut self, event: &StreamEvent) -> Snapshot {
        if let StreamEvent::Delta { text } = event {
            self.buffer.push_str(text);
            self.deltas = self.deltas.saturating_add(1);
            if !text.is_empty() {
                self.snapshot = Snapshot(Arc::from(self.buffer.as_str()));
            }
        }
        self.snapshot.clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.clone()
    }

    pub fn delta_count(&self) -> u64 {
        self.deltas
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Consumes the accumulator and hands the final text to the caller.
    pub fn into_text(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(text: &str) -> StreamEvent {
        StreamEvent::Delta { text: text.into() }
    }

    #[test]
    fn deltas_append_in_order() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.apply(&delta("Hel")), "Hel");
        assert_eq!(acc.apply(&delta("lo")), "Hello");
        assert_eq!(acc.delta_count(), 2);
        assert_eq!(acc.into_text(), "Hello");
    }

    #[test]
    fn non_delta_events_leave_buffer_and_counter_unchanged() {
        let mut acc = Accumulator::new();
        acc.apply(&delta("a"));
        assert_eq!(acc.apply(&StreamEvent::Keepalive), "a");
        assert_eq!(
            acc.apply(&StreamEvent::Malformed { raw: "{".into() }),
            "a"
        );
        assert_eq!(acc.delta_count(), 1);
    }

    #[test]
    fn empty_delta_counts_but_does_not_change_text() {
        let mut acc = Accumulator::new();
        acc.apply(&delta("a"));
        assert_eq!(acc.apply(&delta("")), "a");
        assert_eq!(acc.delta_count(), 2);
    }

    #[test]
    fn earlier_snapshots_are_unaffected_by_later_deltas() {
        let mut acc = Accumulator::new();
        let first = acc.apply(&delta("one"));
        acc.apply(&delta(" two"));
        assert_eq!(first, "one");
        assert_eq!(acc.snapshot(), "one two");
    }
}
