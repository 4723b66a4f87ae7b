//! Active version tracking
//!
//! Every rule change notification carries a version key and a version; the
//! oracle answers what version is currently active for that key. Changes
//! below the active version were superseded before delivery and are
//! discarded by the reconcilers.

use dashmap::DashMap;

/// Source of active configuration versions.
///
/// Implementations answer version lookups only; how the backing store keeps
/// its versions consistent is its own concern.
pub trait VersionOracle: Send + Sync {
    /// Highest active version for a version key. Unknown keys are 0.
    fn active_version(&self, version_key: &str) -> u64;
}

/// In-memory version oracle for testing and standalone deployments.
#[derive(Debug, Default)]
pub struct MemoryVersionOracle {
    versions: DashMap<String, u64>,
}

impl MemoryVersionOracle {
    /// Create an empty oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the active version for a key.
    pub fn set_active(&self, version_key: &str, version: u64) {
        self.versions.insert(version_key.to_string(), version);
    }

    /// Forget a key, reverting it to version 0.
    pub fn clear(&self, version_key: &str) {
        self.versions.remove(version_key);
    }
}

impl VersionOracle for MemoryVersionOracle {
    fn active_version(&self, version_key: &str) -> u64 {
        self.versions.get(version_key).map(|v| *v).unwrap_or(0)
    }
}
