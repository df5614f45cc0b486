/// Core domain types for vtkref references and links.
use std::path::PathBuf;

/// Parsed from a `:vtk:` role target by the reference parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    /// Custom link text from the `Title <target>` form.
    pub explicit_title: Option<String>,
    /// The literal role target text, kept for diagnostics.
    pub raw: String,
    /// Set by a leading `~`: display only the member name.
    pub shorten: bool,
    /// Class and optional member named by the target.
    pub target: RoleTarget,
}

impl ParsedReference {
    /// The referenced class name. Never empty.
    pub fn class_name(&self) -> &str {
        return match &self.target {
            RoleTarget::Class { class } | RoleTarget::Member { class, .. } => class,
        };
    }

    /// The referenced member name, verbatim (may still contain dots).
    pub fn member_name(&self) -> Option<&str> {
        return match &self.target {
            RoleTarget::Class { .. } => None,
            RoleTarget::Member { member, .. } => Some(member),
        };
    }
}

/// The class/member part of a role target. Either a whole class
/// (`vtkImageData`) or one member of it (`vtkImageData.GetSpacing`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleTarget {
    /// Class-level reference.
    Class {
        /// Class name.
        class: String,
    },
    /// Member reference. `member` is everything after the first dot.
    Member {
        /// Enclosing class name.
        class: String,
        /// Member name; nested segments are not split off. Empty for a
        /// trailing dot.
        member: String,
    },
}

impl RoleTarget {
    /// The dotted name used in link text and diagnostics.
    pub fn display_name(&self) -> String {
        return match self {
            RoleTarget::Class { class } => class.clone(),
            RoleTarget::Member { class, member } => format!("{class}.{member}"),
        };
    }
}

/// Output of resolution. The URL is always usable, even when the
/// target could not be validated against the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Text for the rendered hyperlink.
    pub display_text: String,
    /// Why the link could not be validated, if it could not.
    pub unresolved: Option<Unresolved>,
    /// Best-effort link target.
    pub url: String,
}

impl ResolvedLink {
    /// True when both the class and the member (if any) were found in the index.
    pub const fn is_valid(&self) -> bool {
        return self.unresolved.is_none();
    }
}

/// Location in a documentation file that uses a role.
/// Used in warnings to show where an unresolved reference originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// One-based column (in characters) of the role marker.
    pub column: u32,
    /// Documentation file containing the role.
    pub file: PathBuf,
    /// One-based line number in the documentation file.
    pub line: u32,
}

impl Ord for SourceRef {
    /// Compare by (file, line, column) for reading order.
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        return (&self.file, self.line, self.column).cmp(&(&other.file, other.line, other.column));
    }
}

impl PartialOrd for SourceRef {
    /// Delegate to `Ord` implementation.
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        return Some(self.cmp(other));
    }
}

impl SourceRef {
    /// `file:line` prefix used in warnings.
    pub fn location(&self) -> String {
        return format!("{}:{}", self.file.display(), self.line);
    }
}

/// A single role found in a documentation file.
#[derive(Debug, Clone)]
pub struct RoleOccurrence {
    /// The text between the role's backticks.
    pub raw: String,
    /// Where the role was found.
    pub source: SourceRef,
}

/// Classification of a reference that resolved to an unverified link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// The class is not in the index; the URL was guessed from the naming convention.
    Class {
        /// Class name that was not found.
        class: String,
        /// Conventional page URL used instead.
        guessed_url: String,
    },
    /// The class is known but the member has no anchor; the class page is used.
    Member {
        /// Class page URL used instead.
        class_url: String,
        /// Member name as written (nested segments included).
        member: String,
        /// True when the member has more than one dotted segment.
        nested: bool,
        /// A known member of the class the writer may have meant.
        suggestion: Option<String>,
    },
}
