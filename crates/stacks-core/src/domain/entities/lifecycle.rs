use std::fmt;

use serde::Serialize;

/// Lifecycle of a record instance.
///
/// ```text
/// Transient ──save──▶ Persisted ◀──save/update/refresh── Dirty
///                        │  ▲                              ▲
///                        │  └──────────── fill ────────────┘
///                        └──delete──▶ Deleted (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    /// Never persisted; no identity.
    Transient,
    /// Has identity and matches storage as last observed.
    Persisted,
    /// Has identity and carries local changes not yet written.
    Dirty,
    /// Removed from storage; every further operation fails.
    Deleted,
}

impl RecordState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Persisted => "persisted",
            Self::Dirty => "dirty",
            Self::Deleted => "deleted",
        }
    }

    pub const fn has_identity(self) -> bool {
        matches!(self, Self::Persisted | Self::Dirty)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
