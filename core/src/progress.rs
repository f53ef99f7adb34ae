//! Progress reporting and cooperative cancellation.
//!
//! The sink is the only cancellation point: returning `false` from `emit`
//! stops the operation at the next chunk boundary with
//! `BackupError::Cancelled`. The core never observes anything else about
//! the callback's side effects.

/// Phase of an encode or decode, in the order a caller will see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Preparing,
    Database,
    Blobs,
    Finalizing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Preparing => "preparing",
            Phase::Database => "database",
            Phase::Blobs => "blobs",
            Phase::Finalizing => "finalizing",
        }
    }
}

/// One progress tick. `current`/`total` count chunks, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub current: usize,
    pub total: usize,
    /// Blob path during the blobs phase.
    pub current_item: Option<String>,
}

/// Receiver for progress events.
pub trait ProgressSink {
    /// Return `false` to request cancellation.
    fn emit(&mut self, event: ProgressEvent) -> bool;
}

/// Any `FnMut(ProgressEvent) -> bool` closure is a sink.
impl<F: FnMut(ProgressEvent) -> bool> ProgressSink for F {
    fn emit(&mut self, event: ProgressEvent) -> bool {
        self(event)
    }
}

/// Emit to an optional sink; `None` always continues.
pub(crate) fn emit(
    sink: &mut Option<&mut dyn ProgressSink>,
    phase: Phase,
    current: usize,
    total: usize,
    current_item: Option<&str>,
) -> bool {
    match sink {
        Some(sink) => sink.emit(ProgressEvent {
            phase,
            current,
            total,
            current_item: current_item.map(str::to_string),
        }),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_sinks() {
        let mut seen = Vec::new();
        let mut sink = |event: ProgressEvent| {
            seen.push(event.phase);
            true
        };
        let mut opt: Option<&mut dyn ProgressSink> = Some(&mut sink);
        assert!(emit(&mut opt, Phase::Preparing, 0, 2, None));
        assert!(emit(&mut opt, Phase::Finalizing, 2, 2, None));
        assert_eq!(seen, vec![Phase::Preparing, Phase::Finalizing]);
    }

    #[test]
    fn missing_sink_always_continues() {
        let mut opt: Option<&mut dyn ProgressSink> = None;
        assert!(emit(&mut opt, Phase::Database, 1, 1, None));
    }

    #[test]
    fn false_propagates_for_cancellation() {
        let mut sink = |_: ProgressEvent| false;
        let mut opt: Option<&mut dyn ProgressSink> = Some(&mut sink);
        assert!(!emit(&mut opt, Phase::Blobs, 1, 3, Some("a.bin")));
    }
}
