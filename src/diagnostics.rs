use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{self, Write};

use crate::error::Error;
use crate::types::{ParsedReference, ResolvedLink, SourceRef, Unresolved};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Collects unresolved-reference warnings for one run and applies the
/// severity policy. Reporting never changes a link and never stops the run.
pub struct Reporter<W: Write> {
    /// Warnings written so far, in output order.
    emitted: Vec<Emitted>,
    /// Destination for warning lines.
    out: W,
    /// Message to its position in `emitted`.
    seen: HashMap<String, usize>,
    /// Treat warnings as errors.
    strict: bool,
}

/// A warning that was written, plus the repeats folded into it.
struct Emitted {
    /// Where it was first reported, if a location was given.
    location: Option<String>,
    /// Locations of later identical warnings.
    repeat_locations: Vec<String>,
    /// Number of later identical warnings.
    repeats: usize,
}

/// Totals at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Distinct warnings written.
    pub emitted: usize,
    /// True when warnings must fail the run.
    pub failed: bool,
    /// Repeated warnings not written again.
    pub suppressed: usize,
}

impl<W: Write> Reporter<W> {
    /// Finish the run: note where suppressed repeats occurred and return
    /// the totals.
    ///
    /// # Errors
    ///
    /// Returns write errors from the output sink.
    pub fn finish(mut self) -> io::Result<Summary> {
        for warning in &self.emitted {
            if warning.repeat_locations.is_empty() {
                continue;
            }
            let first = warning.location.as_deref().unwrap_or("<input>");
            writeln!(
                self.out,
                "{first}: note: same warning repeated at {}",
                warning.repeat_locations.join(", ")
            )?;
        }

        let suppressed = self.emitted.iter().map(|w| return w.repeats).sum();
        return Ok(Summary {
            emitted: self.emitted.len(),
            failed: self.strict && !self.emitted.is_empty(),
            suppressed,
        });
    }

    /// Create a reporter writing to `out`.
    pub fn new(out: W, strict: bool) -> Self {
        return Self {
            emitted: Vec::new(),
            out,
            seen: HashMap::new(),
            strict,
        };
    }

    /// Report an unresolved reference. Valid links are ignored.
    /// The same message is written once per run; later locations are kept
    /// for [`Reporter::finish`].
    ///
    /// # Errors
    ///
    /// Returns write errors from the output sink.
    pub fn report(
        &mut self,
        reference: &ParsedReference,
        link: &ResolvedLink,
        origin: Option<&SourceRef>,
    ) -> io::Result<()> {
        let Some(message) = warning_message(reference, link) else {
            return Ok(());
        };
        let location = origin.map(SourceRef::location);

        if let Some(&position) = self.seen.get(&message)
            && let Some(first) = self.emitted.get_mut(position)
        {
            tracing::debug!(%message, location = location.as_deref().unwrap_or("-"), "suppressed repeated warning");
            first.repeats = first.repeats.saturating_add(1);
            first.repeat_locations.extend(location);
            return Ok(());
        }

        let label = if self.strict { "ERROR" } else { "WARNING" };
        let prefix = location.as_ref().map(|l| return format!("{l}: ")).unwrap_or_default();
        writeln!(self.out, "{prefix}{label}: {message}")?;
        if let Some(hint) = suggestion_hint(link) {
            writeln!(self.out, "  hint: {hint}")?;
        }

        self.seen.insert(message, self.emitted.len());
        self.emitted.push(Emitted {
            location,
            repeat_locations: Vec::new(),
            repeats: 0,
        });
        return Ok(());
    }
}

/// The warning text for an unresolved link, or `None` for a valid one.
pub fn warning_message(reference: &ParsedReference, link: &ResolvedLink) -> Option<String> {
    let problem = link.unresolved.as_ref()?;
    let message = match problem {
        Unresolved::Class { class, guessed_url } => {
            format!("Invalid VTK class reference: '{class}' → {guessed_url}")
        },
        Unresolved::Member { class_url, nested: true, .. } => format!(
            "Too many nested members in VTK reference: '{}'. \
             Nested members are not resolved, the class URL is used instead: {class_url}",
            reference.target.display_name()
        ),
        Unresolved::Member { class_url, member, nested: false, .. } => format!(
            "VTK method anchor not found for: '{}.{member}' → {class_url}#<anchor>, \
             the class URL is used instead.",
            reference.class_name()
        ),
    };
    return Some(message);
}

/// "Did you mean" line for member problems with a close match.
fn suggestion_hint(link: &ResolvedLink) -> Option<String> {
    let Some(Unresolved::Member { suggestion: Some(suggestion), .. }) = &link.unresolved else {
        return None;
    };
    return Some(format!("did you mean `{suggestion}`?"));
}

// ── Fatal errors ──────────────────────────────────────────────────────

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::MalformedReference { raw, reason } => render_malformed_reference(raw, reason),
        Error::IndexNotFound { path } => render_index_not_found(path),
        Error::IndexCorrupt { path, reason } => format!("\
# Error: Anchor Index Corrupt

`{}`: {reason}

## Fix

Regenerate the index, or remove the offending entry.
", path.display()),
        Error::ConfigNotFound { path } => format!("\
# Error: Config Not Found

`{}` does not exist.
", path.display()),
        Error::InvalidRoleName { role, reason } => format!("\
# Error: Invalid Role Name

`{role}` cannot be used as a role name: {reason}

## Fix

Set `role` in `.vtkref.toml` to a plain name such as `vtk`.
"),
        Error::TomlDe(err) => format!("\
# Error: Invalid TOML

{err}
"),
        _ => format!("\
# Error

{e}
"),
    };
}

fn render_index_not_found(path: &std::path::Path) -> String {
    return format!("\
# Error: Anchor Index Not Found

`{}` does not exist.

## Fix

Point `index` in `.vtkref.toml` at the anchor index file, or pass it directly:

    vtkref --index path/to/index.toml check
", path.display());
}

fn render_malformed_reference(raw: &str, reason: &str) -> String {
    let mut out = format!("\
# Error: Malformed VTK Reference

`{raw}` is not a valid target: {reason}.

## Accepted forms

");
    for form in ["ClassName", "ClassName.Member", "~ClassName.Member", "Custom Title <ClassName.Member>"] {
        let _ = writeln!(out, "- `{form}`");
    }
    return out;
}
