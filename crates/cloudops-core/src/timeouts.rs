//! Per-operation time budgets.

use std::time::Duration;

/// Time budgets for the four CRUD operations of a resource.
///
/// Defaults follow the plugin framework: 10 minutes for create, update and
/// delete, 5 minutes for read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Timeouts {
    /// Budget for create, including waiting for the resource to settle.
    #[cfg_attr(feature = "serde", serde(with = "secs"))]
    pub create: Duration,
    /// Budget for read.
    #[cfg_attr(feature = "serde", serde(with = "secs"))]
    pub read: Duration,
    /// Budget for update.
    #[cfg_attr(feature = "serde", serde(with = "secs"))]
    pub update: Duration,
    /// Budget for delete.
    #[cfg_attr(feature = "serde", serde(with = "secs"))]
    pub delete: Duration,
}

/// Default budget for mutating operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Default budget for reads.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
            update: DEFAULT_TIMEOUT,
            delete: DEFAULT_TIMEOUT,
        }
    }
}

impl Timeouts {
    /// Sets every budget to `timeout`.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            read: timeout,
            update: timeout,
            delete: timeout,
        }
    }
}

#[cfg(feature = "serde")]
mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
