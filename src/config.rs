use std::path::{Path, PathBuf};

use crate::error::Error;

/// Name of the project config file looked up in the project root.
pub const CONFIG_FILE: &str = ".vtkref.toml";

/// Project configuration loaded from `.vtkref.toml`.
/// Include/exclude entries are leading path components of documentation files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Paths to skip.
    exclude: Vec<String>,
    /// File extensions (without the dot) that are scanned for roles.
    pub extensions: Vec<String>,
    /// Paths to scan; empty means everything.
    include: Vec<String>,
    /// Anchor index file, relative to the project root.
    pub index: PathBuf,
    /// Role name to look for, without colons.
    pub role: String,
    /// Treat unresolved references as errors.
    pub strict: bool,
}

/// Raw TOML structure for `.vtkref.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct VtkrefTomlConfig {
    /// See [`Config::exclude`].
    #[serde(default)]
    exclude: Vec<String>,
    /// See [`Config::extensions`].
    extensions: Option<Vec<String>>,
    /// See [`Config::include`].
    #[serde(default)]
    include: Vec<String>,
    /// See [`Config::index`].
    index: Option<PathBuf>,
    /// See [`Config::role`].
    role: Option<String>,
    /// See [`Config::strict`].
    #[serde(default)]
    strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            exclude: Vec::new(),
            extensions: default_extensions(),
            include: Vec::new(),
            index: PathBuf::from(".vtkref-index.toml"),
            role: "vtk".to_string(),
            strict: false,
        };
    }
}

impl Config {
    /// Load config from `.vtkref.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config the
    /// user wrote never silently falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Load config from an explicit file, which must exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigNotFound` if the file is missing,
    /// `Error::Io` for other read failures, or `Error::TomlDe` if malformed.
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Directories that hold every scannable file: the include paths, or
    /// the whole root when nothing is included explicitly.
    pub fn scan_roots(&self, root: &Path) -> Vec<PathBuf> {
        if self.include.is_empty() {
            return vec![root.to_path_buf()];
        }
        return self.include.iter().map(|p| return root.join(p)).collect();
    }

    /// Parse config TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: VtkrefTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        return Ok(Self {
            exclude: raw.exclude,
            extensions: raw.extensions.unwrap_or(defaults.extensions),
            include: raw.include,
            index: raw.index.unwrap_or(defaults.index),
            role: raw.role.unwrap_or(defaults.role),
            strict: raw.strict,
        });
    }

    /// Check whether a documentation file should be scanned.
    ///
    /// A path must carry one of the configured extensions. It is included if
    /// no include patterns are set, or if it lies under at least one include
    /// path. An included path is then excluded if it lies under any exclude
    /// path. Matching is by whole path components, so `docs` does not
    /// cover `docsextra/`.
    pub fn should_scan(&self, relative_path: &Path) -> bool {
        let has_extension = relative_path
            .extension()
            .and_then(|ext| return ext.to_str())
            .is_some_and(|ext| return self.extensions.iter().any(|e| return e == ext));
        if !has_extension {
            return false;
        }

        return self.covers(relative_path);
    }

    /// Check include/exclude only, ignoring the extension. Also answers for
    /// directories.
    pub fn covers(&self, relative_path: &Path) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p));
    }
}

/// Documentation source types scanned when `extensions` is not set.
fn default_extensions() -> Vec<String> {
    return ["rst", "md", "py", "txt"].into_iter().map(String::from).collect();
}
