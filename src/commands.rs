//! Core CLI commands for vtkref: resolve, check, members.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::{CONFIG_FILE, Config};
use crate::diagnostics::{self, Reporter};
use crate::error::Error;
use crate::index::AnchorIndex;
use crate::resolver;
use crate::scanner;
use crate::types::{ParsedReference, ResolvedLink, RoleOccurrence};

/// Exit code when malformed references were found.
const EXIT_MALFORMED: u8 = 2;
/// Exit code when warnings were promoted to errors.
const EXIT_WARNINGS: u8 = 1;
/// Exit code for runtime errors (bad config, missing index, I/O).
pub const EXIT_RUNTIME_ERROR: u8 = 3;

/// Result of parsing and resolving one role occurrence.
type Outcome = Result<(ParsedReference, ResolvedLink), Error>;

/// Options shared by `check` and `watch`.
#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    /// Worker threads for resolution; 0 picks one per core.
    pub jobs: usize,
    /// Emit machine-readable JSON on stdout.
    pub json: bool,
    /// Treat unresolved references as errors.
    pub strict: bool,
}

/// Everything a command needs about the project, loaded once per run.
pub struct Project {
    /// Project configuration.
    pub config: Config,
    /// Config file that was read, or `None` when running on defaults.
    pub config_path: Option<PathBuf>,
    /// Anchor index path as loaded.
    pub index_path: PathBuf,
    /// Project root; documentation paths are relative to it.
    pub root: PathBuf,
}

impl Project {
    /// Load the project config. An explicit config file must exist; otherwise
    /// `.vtkref.toml` in `root` is optional. `index` overrides the configured
    /// index path.
    ///
    /// # Errors
    ///
    /// Returns config loading errors.
    pub fn load(root: &Path, config_path: Option<&Path>, index: Option<&Path>) -> Result<Self, Error> {
        let (config, config_path) = match config_path {
            Some(path) => (Config::load_file(path)?, Some(path.to_path_buf())),
            None => {
                let default_path = root.join(CONFIG_FILE);
                let found = default_path.is_file().then_some(default_path);
                (Config::load(root)?, found)
            },
        };
        let index_path = index.map_or_else(|| return root.join(&config.index), Path::to_path_buf);
        return Ok(Self {
            config,
            config_path,
            index_path,
            root: root.to_path_buf(),
        });
    }

    /// Load the anchor index named by the config.
    ///
    /// # Errors
    ///
    /// Returns index loading errors.
    pub fn load_index(&self) -> Result<AnchorIndex, Error> {
        return AnchorIndex::load(&self.index_path);
    }
}

/// One resolved role in `check --json` output.
#[derive(Serialize)]
struct LinkRecord<'a> {
    /// One-based column of the role.
    column: u32,
    /// Rendered link text.
    display_text: &'a str,
    /// Documentation file, relative to the project root.
    file: String,
    /// One-based line of the role.
    line: u32,
    /// Role target as written.
    raw: &'a str,
    /// Best-effort link target.
    url: &'a str,
    /// Whether the target was found in the index.
    valid: bool,
}

/// One role whose target could not be parsed, in `check --json` output.
#[derive(Serialize)]
struct MalformedRecord<'a> {
    /// Parse failure description.
    error: String,
    /// Documentation file, relative to the project root.
    file: String,
    /// One-based line of the role.
    line: u32,
    /// Role target as written.
    raw: &'a str,
}

/// Totals for `check`.
#[derive(Serialize)]
struct CheckSummary {
    /// Roles whose target could not be parsed.
    malformed: usize,
    /// All roles found.
    references: usize,
    /// Repeated warnings not written again.
    suppressed_warnings: usize,
    /// Roles that resolved to an unverified link.
    unresolved: usize,
}

/// Full `check --json` document.
#[derive(Serialize)]
struct CheckJson<'a> {
    /// Every parsed role with its link.
    links: Vec<LinkRecord<'a>>,
    /// Every role that failed to parse.
    malformed: Vec<MalformedRecord<'a>>,
    /// Totals.
    summary: CheckSummary,
}

/// `resolve --json` output.
#[derive(Serialize)]
struct ResolveJson<'a> {
    /// Class name from the target.
    class: &'a str,
    /// Rendered link text.
    display_text: &'a str,
    /// Member name from the target, if any.
    member: Option<&'a str>,
    /// Best-effort link target.
    url: &'a str,
    /// Whether the target was found in the index.
    valid: bool,
}

/// Scan documentation, resolve every role, report unresolved ones.
///
/// Reporting happens in source order after resolution finishes, so the
/// output does not depend on the number of workers.
///
/// # Errors
///
/// Returns errors from index loading, scanning, or the worker pool.
/// Malformed targets are counted, not propagated.
pub fn check(project: &Project, options: CheckOptions) -> Result<ExitCode, Error> {
    let index = project.load_index()?;
    let occurrences = scanner::scan(&project.root, &project.config)?;
    let outcomes = resolve_all(&occurrences, &index, options.jobs)?;

    let stderr = std::io::stderr();
    let mut reporter = Reporter::new(stderr.lock(), options.strict);
    let mut links = Vec::new();
    let mut malformed = Vec::new();

    for (occurrence, outcome) in occurrences.iter().zip(&outcomes) {
        let file = occurrence.source.file.display().to_string();
        match outcome {
            Err(e) => {
                eprintln!("{}: ERROR: {e}", occurrence.source.location());
                malformed.push(MalformedRecord {
                    error: e.to_string(),
                    file,
                    line: occurrence.source.line,
                    raw: &occurrence.raw,
                });
            },
            Ok((parsed, link)) => {
                reporter.report(parsed, link, Some(&occurrence.source))?;
                links.push(LinkRecord {
                    column: occurrence.source.column,
                    display_text: &link.display_text,
                    file,
                    line: occurrence.source.line,
                    raw: &occurrence.raw,
                    url: &link.url,
                    valid: link.is_valid(),
                });
            },
        }
    }

    let warnings = reporter.finish()?;
    let has_malformed = !malformed.is_empty();
    let summary = CheckSummary {
        malformed: malformed.len(),
        references: occurrences.len(),
        suppressed_warnings: warnings.suppressed,
        unresolved: links.iter().filter(|l| return !l.valid).count(),
    };

    if options.json {
        let doc = CheckJson { links, malformed, summary };
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        print_check_summary(&summary);
    }

    if has_malformed {
        return Ok(ExitCode::from(EXIT_MALFORMED));
    }
    if warnings.failed {
        return Ok(ExitCode::from(EXIT_WARNINGS));
    }
    return Ok(ExitCode::SUCCESS);
}

/// List the members the index knows for a class.
///
/// # Errors
///
/// Returns index loading errors.
pub fn members(project: &Project, class: &str) -> Result<ExitCode, Error> {
    let index = project.load_index()?;
    let Some(class_url) = index.class_url(class) else {
        eprintln!("class `{class}` is not in the anchor index");
        eprintln!("  guessed page: {}", index.guess_class_url(class));
        return Ok(ExitCode::from(EXIT_WARNINGS));
    };

    let members = index.members_of(class);
    if members.is_empty() {
        eprintln!("No member anchors recorded for `{class}`.");
    }
    println!("{class} -> {class_url}");
    for (member, anchor) in members {
        println!("{class}.{member} -> {class_url}#{anchor}");
    }
    return Ok(ExitCode::SUCCESS);
}

/// Print the text summary line for `check`.
fn print_check_summary(summary: &CheckSummary) {
    let mut line = format!(
        "{} VTK references, {} unresolved",
        summary.references, summary.unresolved
    );
    if summary.malformed > 0 {
        let _ = write!(line, ", {} malformed", summary.malformed);
    }
    if summary.suppressed_warnings > 0 {
        let _ = write!(line, " ({} repeated warnings suppressed)", summary.suppressed_warnings);
    }
    println!("{line}");
}

/// Parse and resolve one target, print the link, report it if unresolved.
///
/// # Errors
///
/// Returns index loading or JSON errors. A malformed target is rendered
/// and mapped to its exit code.
pub fn resolve(project: &Project, raw: &str, json: bool, strict: bool) -> Result<ExitCode, Error> {
    let index = project.load_index()?;
    let (parsed, link) = match resolver::resolve_raw(raw, &index) {
        Err(e @ Error::MalformedReference { .. }) => {
            diagnostics::print_error(&e);
            return Ok(ExitCode::from(EXIT_MALFORMED));
        },
        Err(e) => return Err(e),
        Ok(resolved) => resolved,
    };

    if json {
        let out = ResolveJson {
            class: parsed.class_name(),
            display_text: &link.display_text,
            member: parsed.member_name(),
            url: &link.url,
            valid: link.is_valid(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{} -> {}", link.display_text, link.url);
    }

    let stderr = std::io::stderr();
    let mut reporter = Reporter::new(stderr.lock(), strict);
    reporter.report(&parsed, &link, None)?;
    if reporter.finish()?.failed {
        return Ok(ExitCode::from(EXIT_WARNINGS));
    }
    return Ok(ExitCode::SUCCESS);
}

/// Resolve every occurrence, in parallel unless `jobs` is 1.
/// Results keep the order of `occurrences`.
///
/// # Errors
///
/// Returns `Error::ThreadPool` if the worker pool cannot be built.
fn resolve_all(occurrences: &[RoleOccurrence], index: &AnchorIndex, jobs: usize) -> Result<Vec<Outcome>, Error> {
    if jobs == 1 {
        return Ok(occurrences
            .iter()
            .map(|o| return resolver::resolve_raw(&o.raw, index))
            .collect::<Vec<Outcome>>());
    }

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    tracing::debug!(threads = pool.current_num_threads(), "resolving in parallel");
    return Ok(pool.install(|| {
        return occurrences
            .par_iter()
            .map(|o| return resolver::resolve_raw(&o.raw, index))
            .collect::<Vec<Outcome>>();
    }));
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::Project;

    #[test]
    fn default_config_path_recorded_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::load(dir.path(), None, None).unwrap();
        assert_eq!(project.config_path, None);

        std::fs::write(dir.path().join(".vtkref.toml"), "strict = true\n").unwrap();
        let project = Project::load(dir.path(), None, None).unwrap();
        assert_eq!(project.config_path, Some(dir.path().join(".vtkref.toml")));
        assert!(project.config.strict);
    }

    #[test]
    fn explicit_config_path_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("custom.toml");
        std::fs::write(&custom, "index = \"anchors.toml\"\n").unwrap();

        let project = Project::load(dir.path(), Some(&custom), None).unwrap();
        assert_eq!(project.config_path, Some(custom));
        assert_eq!(project.index_path, dir.path().join("anchors.toml"));
    }

    #[test]
    fn index_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let index = PathBuf::from("elsewhere/index.toml");
        let project = Project::load(dir.path(), None, Some(&index)).unwrap();
        assert_eq!(project.index_path, index);
    }
}
