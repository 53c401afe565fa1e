use cloudops_core::events::OperationEvent;
use std::time::Instant;

/// Events emitted by the paginator.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// A page was fetched and filtered.
    Fetched {
        pattern_name: String,
        timestamp: Instant,
        page: usize,
        fetched: usize,
        kept: usize,
    },
    /// Enumeration finished.
    Completed {
        pattern_name: String,
        timestamp: Instant,
        pages: usize,
        items: usize,
    },
}

impl OperationEvent for PageEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PageEvent::Fetched { .. } => "Fetched",
            PageEvent::Completed { .. } => "Completed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PageEvent::Fetched { timestamp, .. } | PageEvent::Completed { timestamp, .. } => {
                *timestamp
            }
        }
    }

    fn helper_name(&self) -> &str {
        match self {
            PageEvent::Fetched { pattern_name, .. } | PageEvent::Completed { pattern_name, .. } => {
                pattern_name
            }
        }
    }
}
