//! File watcher: runs `check` on startup, then re-runs on documentation
//! or anchor index changes.

use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands::{self, CheckOptions, EXIT_RUNTIME_ERROR, Project};
use crate::config::Config;
use crate::diagnostics;
use crate::error;

/// Debounce delay between filesystem events and re-check.
const DEBOUNCE_MS: u64 = 100;

/// Decides which filesystem events should trigger a re-check.
struct ChangeFilter {
    /// Include/exclude and extension rules of the scanner.
    config: Config,
    /// Anchor index file, absolute.
    index_path: PathBuf,
    /// Project root, absolute.
    root: PathBuf,
}

impl ChangeFilter {
    fn new(project: &Project) -> Self {
        return Self {
            config: project.config.clone(),
            index_path: absolute(&project.index_path),
            root: absolute(&project.root),
        };
    }

    /// True for the index file, for documentation files the scanner would
    /// read, and for directories that may hold them.
    fn is_relevant(&self, path: &Path) -> bool {
        if path == self.index_path {
            return true;
        }
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        if relative.components().any(|c| return is_hidden(&c)) {
            return false;
        }
        if self.config.should_scan(relative) {
            return true;
        }
        // Directory created, removed, or renamed as a whole.
        return relative.extension().is_none() && self.config.covers(relative);
    }
}

/// Canonical form of a path, so it compares equal to the paths notify
/// reports. A missing file is resolved through its parent directory.
fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
        if let Ok(parent) = std::fs::canonicalize(parent) {
            return parent.join(name);
        }
    }
    return std::path::absolute(path).unwrap_or_else(|_err| return path.to_path_buf());
}

/// Create a filesystem watcher that sends relevant events on the given channel.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    filter: ChangeFilter,
    tx: crossbeam_channel::Sender<()>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        let Ok(event) = res else { return };
        if matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
        ) && event.paths.iter().any(|p| return filter.is_relevant(p))
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::Watch {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

fn is_hidden(component: &Component<'_>) -> bool {
    return matches!(component, Component::Normal(name) if name.to_string_lossy().starts_with('.'));
}

/// Entry point for the watch command.
///
/// Runs an initial check, then watches relevant directories and re-checks
/// on changes. The index is reloaded on every run.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be set up.
pub fn run(project: &Project, options: CheckOptions) -> Result<ExitCode, error::Error> {
    eprintln!("watch: initial check");
    let mut last_code = run_check(project, options);

    let targets = watch_targets(project);
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(ChangeFilter::new(project), tx)?;

    let mut watched = 0_usize;
    for (dir, mode) in &targets {
        match watcher.watch(dir, *mode) {
            Ok(()) => watched = watched.saturating_add(1),
            Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "cannot watch directory"),
        }
    }

    eprintln!("watch: monitoring {watched} directories, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-checking...");
        last_code = run_check(project, options);
    }

    return Ok(last_code);
}

/// Run check once and print the result. Returns the exit code from check.
fn run_check(project: &Project, options: CheckOptions) -> ExitCode {
    return match commands::check(project, options) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        },
    };
}

/// Scan roots recursively, so files in new or role-free subdirectories are
/// seen, plus the index file's directory on its own.
fn watch_targets(project: &Project) -> Vec<(PathBuf, RecursiveMode)> {
    let mut targets: Vec<(PathBuf, RecursiveMode)> = project
        .config
        .scan_roots(&project.root)
        .into_iter()
        .filter(|dir| return dir.is_dir())
        .map(|dir| return (absolute(&dir), RecursiveMode::Recursive))
        .collect();

    let index_dir = absolute(&project.index_path)
        .parent()
        .map_or_else(|| return absolute(&project.root), Path::to_path_buf);
    if !targets.iter().any(|(dir, _)| return index_dir.starts_with(dir)) {
        targets.push((index_dir, RecursiveMode::NonRecursive));
    }
    return targets;
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use notify::RecursiveMode;

    use super::{ChangeFilter, absolute, watch_targets};
    use crate::commands::Project;

    fn project_with(config: &str) -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/api")).unwrap();
        std::fs::write(dir.path().join(".vtkref.toml"), config).unwrap();
        let project = Project::load(dir.path(), None, None).unwrap();
        return (dir, project);
    }

    #[test]
    fn new_file_in_role_free_subdirectory_is_relevant() {
        let (dir, project) = project_with("include = [\"docs\"]\nexclude = [\"docs/_build\"]\n");
        let filter = ChangeFilter::new(&project);
        let root = absolute(dir.path());

        assert!(filter.is_relevant(&root.join("docs/api/new.rst")));
        assert!(filter.is_relevant(&root.join("docs/api/fresh")));
        assert!(filter.is_relevant(&root.join(".vtkref-index.toml")));
        assert!(!filter.is_relevant(&root.join("docs/_build/index.rst")));
        assert!(!filter.is_relevant(&root.join("docs/logo.png")));
        assert!(!filter.is_relevant(&root.join("src/notes.rst")));
    }

    #[test]
    fn hidden_directories_are_ignored() {
        let (dir, project) = project_with("");
        let filter = ChangeFilter::new(&project);
        let root = absolute(dir.path());

        assert!(filter.is_relevant(&root.join("README.md")));
        assert!(!filter.is_relevant(&root.join(".git/index")));
        assert!(!filter.is_relevant(&root.join(".venv/lib/site.py")));
        assert!(!filter.is_relevant(Path::new("/elsewhere/index.rst")));
    }

    #[test]
    fn include_roots_watched_recursively() {
        let (dir, project) = project_with("include = [\"docs\"]\n");
        let root = absolute(dir.path());
        let targets = watch_targets(&project);

        assert!(targets.contains(&(root.join("docs"), RecursiveMode::Recursive)));
        assert!(targets.contains(&(root, RecursiveMode::NonRecursive)));
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn whole_root_covers_index_directory() {
        let (dir, project) = project_with("");
        let targets = watch_targets(&project);
        assert_eq!(targets, [(absolute(dir.path()), RecursiveMode::Recursive)]);
    }
}
