use crate::status::WaitState;
use cloudops_core::events::OperationEvent;
use std::time::{Duration, Instant};

/// Events emitted by the waiter.
#[derive(Debug, Clone)]
pub enum WaitEvent {
    /// A poll completed and the wait is still pending.
    Poll {
        pattern_name: String,
        timestamp: Instant,
        id: String,
        poll: usize,
        status: Option<String>,
    },
    /// The observed status changed between two polls.
    StatusChanged {
        pattern_name: String,
        timestamp: Instant,
        id: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// The wait ended.
    Finished {
        pattern_name: String,
        timestamp: Instant,
        id: String,
        state: WaitState,
        polls: usize,
        elapsed: Duration,
    },
}

impl OperationEvent for WaitEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WaitEvent::Poll { .. } => "Poll",
            WaitEvent::StatusChanged { .. } => "StatusChanged",
            WaitEvent::Finished { .. } => "Finished",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            WaitEvent::Poll { timestamp, .. }
            | WaitEvent::StatusChanged { timestamp, .. }
            | WaitEvent::Finished { timestamp, .. } => *timestamp,
        }
    }

    fn helper_name(&self) -> &str {
        match self {
            WaitEvent::Poll { pattern_name, .. }
            | WaitEvent::StatusChanged { pattern_name, .. }
            | WaitEvent::Finished { pattern_name, .. } => pattern_name,
        }
    }
}
