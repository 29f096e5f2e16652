//! Lifecycle state of an atomic file.

use std::fmt;

/// State of an [`AtomicFile`](crate::AtomicFile).
///
/// Transitions are one-way: `Open → Committed` or `Open → Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Writes go to the staging file; commit or abort is still pending.
    Open,
    /// The staging file has been renamed onto the destination.
    Committed,
    /// The staging file has been discarded.
    Aborted,
}

impl FileState {
    /// Returns true once the handle reached a terminal state.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_open_is_unfinished() {
        assert!(!FileState::Open.is_finished());
        assert!(FileState::Committed.is_finished());
        assert!(FileState::Aborted.is_finished());
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(FileState::Open.to_string(), "open");
        assert_eq!(FileState::Committed.to_string(), "committed");
        assert_eq!(FileState::Aborted.to_string(), "aborted");
    }
}
