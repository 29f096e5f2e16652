//! Options for creating an atomic file.

/// Permission bits applied to the staging file when none are requested.
pub const DEFAULT_MODE: u32 = 0o666;

/// Suffix appended to staging file names by default.
pub const DEFAULT_STAGING_SUFFIX: &str = ".tmp";

/// Configuration for creating an [`AtomicFile`](crate::AtomicFile).
///
/// # Example
///
/// ```rust
/// use atomicfile_core::Options;
///
/// let options = Options::new().mode(0o600).create_dirs(true);
/// assert_eq!(options.mode, 0o600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Permission bits of the committed file.
    ///
    /// Applied explicitly after creation, so the process umask does not
    /// narrow them. On Windows only the owner write bit is honoured: without
    /// it the file is marked read-only.
    pub mode: u32,

    /// Whether to create missing parent directories of the destination.
    pub create_dirs: bool,

    /// Suffix of the staging file name.
    pub staging_suffix: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: DEFAULT_MODE,
            create_dirs: false,
            staging_suffix: DEFAULT_STAGING_SUFFIX.to_string(),
        }
    }
}

impl Options {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the permission bits.
    #[must_use]
    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Sets whether missing parent directories are created.
    #[must_use]
    pub fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Sets the staging file suffix.
    #[must_use]
    pub fn staging_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.staging_suffix = suffix.into();
        self
    }
}
