/// Crate-level error types for vtkref diagnostics.
use std::path::PathBuf;

/// All errors in vtkref carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, target, or reason for failure.
///
/// Unknown classes and members are not errors: they resolve to a best-effort
/// link and are surfaced as warnings by the diagnostics reporter.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The project config file named by `--config` does not exist.
    #[error("config not found: {}", path.display())]
    ConfigNotFound {
        /// Path to the missing config file.
        path: PathBuf,
    },

    /// The anchor index exists but its content is unusable.
    #[error("anchor index corrupt: {}: {reason}", path.display())]
    IndexCorrupt {
        /// Index file that failed validation.
        path: PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The anchor index file does not exist on disk.
    #[error("anchor index not found: {}", path.display())]
    IndexNotFound {
        /// Path to the missing index file.
        path: PathBuf,
    },

    /// The configured role name cannot be turned into a scan pattern.
    #[error("invalid role name `{role}`: {reason}")]
    InvalidRoleName {
        /// Role name from the config.
        reason: String,
        /// The offending role name.
        role: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A role target cannot be parsed into a class name.
    #[error("malformed VTK reference `{raw}`: {reason}")]
    MalformedReference {
        /// The literal role target text.
        raw: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The worker pool for parallel resolution could not be started.
    #[error("thread pool: {0}")]
    ThreadPool(
        /// The wrapped rayon error.
        #[from]
        rayon::ThreadPoolBuildError,
    ),

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The filesystem watcher could not be set up.
    #[error("watch: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}
