//! Role target grammar.
//!
//! ```text
//! target   := title? reference
//! title    := TEXT WS* "<" reference ">"
//! reference:= "~"? CLASS ("." MEMBER)?
//! ```
//!
//! Only the first dot separates class from member. Anything after it,
//! further dots included, is the member name.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;
use crate::types::{ParsedReference, RoleTarget};

/// `Title <target>`, the same explicit-title form reStructuredText roles use.
#[allow(clippy::expect_used, reason = "hardcoded pattern, covered by tests")]
static EXPLICIT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"(?s)^(.+?)\s*<(.*?)>$").expect("valid regex"));

/// Build the error for a target that names no class.
fn malformed(raw: &str, reason: &'static str) -> Error {
    return Error::MalformedReference {
        raw: raw.to_string(),
        reason,
    };
}

/// Parse a raw role target into a structured reference.
///
/// # Errors
///
/// Returns `Error::MalformedReference` if no class name remains after
/// stripping the title and `~` marker.
pub fn parse(raw: &str) -> Result<ParsedReference, Error> {
    let raw = raw.trim();
    let (explicit_title, target) = split_explicit_title(raw);

    let (shorten, target) = match target.strip_prefix('~') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, target),
    };

    let target = parse_role_target(raw, target)?;
    return Ok(ParsedReference {
        explicit_title,
        raw: raw.to_string(),
        shorten,
        target,
    });
}

/// Split the class from the member on the first dot.
///
/// # Errors
///
/// Returns `Error::MalformedReference` for an empty class segment. An empty
/// member is kept; it misses the index like any unknown member.
fn parse_role_target(raw: &str, target: &str) -> Result<RoleTarget, Error> {
    let Some((class, member)) = target.split_once('.') else {
        if target.is_empty() {
            return Err(malformed(raw, "empty class name"));
        }
        return Ok(RoleTarget::Class { class: target.to_string() });
    };

    if class.is_empty() {
        return Err(malformed(raw, "empty class name"));
    }

    return Ok(RoleTarget::Member {
        class: class.to_string(),
        member: member.to_string(),
    });
}

/// Separate `Title <target>` into its parts. Targets without the
/// angle-bracket form are returned whole with no title.
fn split_explicit_title(raw: &str) -> (Option<String>, &str) {
    let Some(caps) = EXPLICIT_TITLE.captures(raw) else {
        return (None, raw);
    };
    let (Some(title), Some(target)) = (caps.get(1), caps.get(2)) else {
        return (None, raw);
    };

    let title = title.as_str().trim();
    if title.is_empty() {
        return (None, raw);
    }
    return (Some(title.to_string()), target.as_str().trim());
}
