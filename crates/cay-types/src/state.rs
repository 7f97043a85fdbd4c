use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a persistent object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceState {
    /// Not registered with any context.
    Transient,
    /// Registered, not yet committed.
    New,
    /// Committed object with uncommitted changes.
    Modified,
    /// Committed and in sync with the backing store.
    Committed,
    /// Scheduled for deletion.
    Deleted,
    /// Registered, but values not loaded yet. Reading any property
    /// triggers a fetch.
    Hollow,
}

impl PersistenceState {
    /// Returns `true` if the object's properties have not been loaded.
    pub fn is_hollow(&self) -> bool {
        matches!(self, Self::Hollow)
    }

    /// Returns `true` if the object belongs to a context.
    pub fn is_registered(&self) -> bool {
        !matches!(self, Self::Transient)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::New => "new",
            Self::Modified => "modified",
            Self::Committed => "committed",
            Self::Deleted => "deleted",
            Self::Hollow => "hollow",
        }
    }
}

impl fmt::Display for PersistenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
