//! Resource statuses and waiter states.

use std::fmt;

/// A closed set of statuses a resource's describe call can report.
///
/// [`parse`](ResourceStatus::parse) returns `None` for strings the type
/// does not know, which the waiter reports as
/// [`OperationError::UnknownState`](cloudops_core::OperationError::UnknownState)
/// instead of treating them as still pending.
///
/// ```
/// use cloudops_waiter::ResourceStatus;
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum ListenerStatus {
///     Starting,
///     Running,
///     Stopped,
/// }
///
/// impl ResourceStatus for ListenerStatus {
///     fn parse(raw: &str) -> Option<Self> {
///         match raw {
///             "starting" => Some(Self::Starting),
///             "running" => Some(Self::Running),
///             "stopped" => Some(Self::Stopped),
///             _ => None,
///         }
///     }
///
///     fn as_str(&self) -> &str {
///         match self {
///             Self::Starting => "starting",
///             Self::Running => "running",
///             Self::Stopped => "stopped",
///         }
///     }
/// }
///
/// assert_eq!(ListenerStatus::parse("running"), Some(ListenerStatus::Running));
/// assert_eq!(ListenerStatus::parse("configuring"), None);
/// ```
pub trait ResourceStatus: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Parses the raw status reported by the API.
    fn parse(raw: &str) -> Option<Self>;

    /// The wire form of this status.
    fn as_str(&self) -> &str;
}

/// Statuses most cloud resources report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommonStatus {
    /// Accepted but not yet provisioning.
    Pending,
    /// Being provisioned.
    Creating,
    /// Booting or resuming.
    Starting,
    /// Started and serving.
    Running,
    /// Ready for use.
    Available,
    /// Enabled and in effect.
    Active,
    /// Attached to another resource.
    InUse,
    /// Healthy steady state.
    Normal,
    /// Applying a configuration change.
    Modifying,
    /// Shutting down.
    Stopping,
    /// Shut down but retained.
    Stopped,
    /// Disabled but retained.
    Inactive,
    /// Being released.
    Deleting,
    /// Released; may still be listed briefly.
    Deleted,
    /// Ended in an error state.
    Failed,
    /// Provisioning did not complete.
    CreateFailed,
    /// Temporarily unusable.
    Unavailable,
}

impl CommonStatus {
    /// Every variant.
    pub const ALL: [CommonStatus; 17] = [
        CommonStatus::Pending,
        CommonStatus::Creating,
        CommonStatus::Starting,
        CommonStatus::Running,
        CommonStatus::Available,
        CommonStatus::Active,
        CommonStatus::InUse,
        CommonStatus::Normal,
        CommonStatus::Modifying,
        CommonStatus::Stopping,
        CommonStatus::Stopped,
        CommonStatus::Inactive,
        CommonStatus::Deleting,
        CommonStatus::Deleted,
        CommonStatus::Failed,
        CommonStatus::CreateFailed,
        CommonStatus::Unavailable,
    ];

    const fn wire(&self) -> &'static str {
        match self {
            CommonStatus::Pending => "Pending",
            CommonStatus::Creating => "Creating",
            CommonStatus::Starting => "Starting",
            CommonStatus::Running => "Running",
            CommonStatus::Available => "Available",
            CommonStatus::Active => "Active",
            CommonStatus::InUse => "InUse",
            CommonStatus::Normal => "Normal",
            CommonStatus::Modifying => "Modifying",
            CommonStatus::Stopping => "Stopping",
            CommonStatus::Stopped => "Stopped",
            CommonStatus::Inactive => "Inactive",
            CommonStatus::Deleting => "Deleting",
            CommonStatus::Deleted => "Deleted",
            CommonStatus::Failed => "Failed",
            CommonStatus::CreateFailed => "CreateFailed",
            CommonStatus::Unavailable => "Unavailable",
        }
    }
}

impl ResourceStatus for CommonStatus {
    // APIs disagree on case ("Available", "available", "AVAILABLE").
    fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.wire().eq_ignore_ascii_case(raw))
    }

    fn as_str(&self) -> &str {
        self.wire()
    }
}

impl fmt::Display for CommonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire())
    }
}

/// Where a wait stands after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitState {
    /// Not settled yet; poll again.
    Pending,
    /// A target status was observed.
    Target,
    /// A failure status was observed.
    Failed,
    /// The resource is gone.
    NotFound,
    /// The time budget ran out.
    TimedOut,
}

impl WaitState {
    /// Returns `true` for every state but [`WaitState::Pending`].
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WaitState::Pending)
    }

    /// Stable label used in events and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitState::Pending => "pending",
            WaitState::Target => "target",
            WaitState::Failed => "failed",
            WaitState::NotFound => "not_found",
            WaitState::TimedOut => "timeout",
        }
    }
}

impl fmt::Display for WaitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
