//! Anchor index: the read-only lookup table of class pages and member anchors.
//!
//! The index is built once per run (from a file or a builder) and shared by
//! reference. Nothing mutates it after construction, so it can be read from
//! any number of worker threads.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

/// Root of the VTK nightly Doxygen documentation.
pub const DEFAULT_BASE_URL: &str = "https://vtk.org/doc/nightly/html/";

/// Class page URLs and member anchor fragments for one documentation site.
#[derive(Debug, Clone)]
pub struct AnchorIndex {
    /// Site root, always ending in `/`.
    base_url: String,
    /// Class name to documentation page URL.
    class_urls: HashMap<String, String>,
    /// Class name to (member name to anchor fragment).
    member_anchors: HashMap<String, HashMap<String, String>>,
}

impl AnchorIndex {
    /// Start an empty index for the given site root.
    pub fn builder(base_url: &str) -> AnchorIndexBuilder {
        return AnchorIndexBuilder {
            index: Self {
                base_url: normalize_base_url(base_url),
                class_urls: HashMap::new(),
                member_anchors: HashMap::new(),
            },
        };
    }

    /// The site root used for guessed URLs.
    pub fn base_url(&self) -> &str {
        return &self.base_url;
    }

    /// Documentation page URL for a known class.
    pub fn class_url(&self, class: &str) -> Option<&str> {
        return self.class_urls.get(class).map(String::as_str);
    }

    /// Number of classes in the index.
    pub fn class_count(&self) -> usize {
        return self.class_urls.len();
    }

    /// A member of `class` whose name equals `member` ignoring ASCII case.
    /// Diagnostics only: lookups stay exact.
    pub fn closest_member(&self, class: &str, member: &str) -> Option<&str> {
        let anchors = self.member_anchors.get(class)?;
        return anchors
            .keys()
            .filter(|known| return known.eq_ignore_ascii_case(member))
            .min()
            .map(String::as_str);
    }

    /// Conventional page URL for a class: `<base>class<Name>.html`.
    pub fn guess_class_url(&self, class: &str) -> String {
        return format!("{}class{class}.html", self.base_url);
    }

    /// Load an index from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexNotFound` if the file doesn't exist,
    /// `Error::Io` for other read failures, `Error::TomlDe` if the
    /// content is not valid TOML, or `Error::IndexCorrupt` if a class,
    /// member, or anchor is empty.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::IndexNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        let index = Self::parse(&content).map_err(|e| {
            return match e {
                Error::IndexCorrupt { reason, .. } => Error::IndexCorrupt {
                    path: path.to_path_buf(),
                    reason,
                },
                other => other,
            };
        })?;
        tracing::debug!(
            path = %path.display(),
            classes = index.class_count(),
            members = index.member_count(),
            "loaded anchor index"
        );
        return Ok(index);
    }

    /// Exact anchor fragment for a member of a class.
    pub fn member_anchor(&self, class: &str, member: &str) -> Option<&str> {
        return self
            .member_anchors
            .get(class)
            .and_then(|anchors| return anchors.get(member))
            .map(String::as_str);
    }

    /// Number of (class, member) anchors in the index.
    pub fn member_count(&self) -> usize {
        return self.member_anchors.values().map(HashMap::len).sum();
    }

    /// Known members of a class with their anchors, sorted by name.
    pub fn members_of(&self, class: &str) -> Vec<(&str, &str)> {
        let Some(anchors) = self.member_anchors.get(class) else {
            return Vec::new();
        };
        let mut members: Vec<(&str, &str)> = anchors
            .iter()
            .map(|(name, anchor)| return (name.as_str(), anchor.as_str()))
            .collect();
        members.sort_unstable();
        return members;
    }

    /// Parse an index from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the content is not valid TOML,
    /// or `Error::IndexCorrupt` if a class, member, or anchor is empty, or a
    /// member name is dotted.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: IndexFile = toml::from_str(content)?;
        let mut builder = Self::builder(raw.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL));

        for (class, entry) in raw.classes {
            if class.is_empty() {
                return Err(corrupt("class with an empty name"));
            }
            builder = match entry.url {
                Some(url) if url.is_empty() => {
                    return Err(corrupt(&format!("class `{class}` has an empty url")));
                },
                Some(url) => builder.class(&class, &url),
                None => builder.conventional_class(&class),
            };
            for (member, anchor) in entry.members {
                if member.is_empty() || anchor.is_empty() {
                    return Err(corrupt(&format!(
                        "class `{class}` has an empty member name or anchor"
                    )));
                }
                if member.contains('.') {
                    return Err(corrupt(&format!(
                        "class `{class}` has a nested member `{member}`; members cannot contain `.`"
                    )));
                }
                builder = builder.member(&class, &member, &anchor);
            }
        }

        return Ok(builder.build());
    }
}

/// Assembles an [`AnchorIndex`]. The finished index has no mutating methods.
#[derive(Debug)]
pub struct AnchorIndexBuilder {
    /// Index under construction.
    index: AnchorIndex,
}

impl AnchorIndexBuilder {
    /// Finish building.
    pub fn build(self) -> AnchorIndex {
        return self.index;
    }

    /// Register a class page at an explicit URL.
    #[must_use]
    pub fn class(mut self, class: &str, url: &str) -> Self {
        self.index.class_urls.insert(class.to_string(), url.to_string());
        return self;
    }

    /// Register a class page at the conventional URL.
    #[must_use]
    pub fn conventional_class(self, class: &str) -> Self {
        let url = self.index.guess_class_url(class);
        return self.class(class, &url);
    }

    /// Register a member anchor. Does not register the class page itself.
    #[must_use]
    pub fn member(mut self, class: &str, member: &str, anchor: &str) -> Self {
        self.index
            .member_anchors
            .entry(class.to_string())
            .or_default()
            .insert(member.to_string(), anchor.to_string());
        return self;
    }
}

/// One `[classes.<Name>]` table in the index file.
#[derive(Deserialize)]
struct ClassEntry {
    /// Member name to anchor fragment.
    #[serde(default)]
    members: BTreeMap<String, String>,
    /// Page URL; the naming convention applies when absent.
    url: Option<String>,
}

/// Raw TOML structure of an anchor index file.
#[derive(Deserialize)]
struct IndexFile {
    /// Site root for guessed URLs.
    base_url: Option<String>,
    /// Classes keyed by name.
    #[serde(default)]
    classes: BTreeMap<String, ClassEntry>,
}

/// Validation failure without a path; `AnchorIndex::load` fills it in.
fn corrupt(reason: &str) -> Error {
    return Error::IndexCorrupt {
        path: std::path::PathBuf::new(),
        reason: reason.to_string(),
    };
}

/// Make sure the site root ends in exactly one `/`.
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    return format!("{trimmed}/");
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{AnchorIndex, DEFAULT_BASE_URL};
    use crate::error::Error;

    const SAMPLE: &str = r#"
base_url = "https://vtk.org/doc/nightly/html"

[classes.vtkImageData.members]
GetSpacing = "ae6ebee83577b2d58c393a0df2f15b67d"
SetOrigin = "ad18d146c5e2471876e5d9c6242ac1544"

[classes.vtkCommand]
url = "https://mirror.example/vtkCommand.html"
members = { EventIds = "a59a8690330ebcb1af6b66b0f3121f8fe" }
"#;

    #[test]
    fn parse_sample() {
        let index = AnchorIndex::parse(SAMPLE).unwrap();
        assert_eq!(index.class_count(), 2);
        assert_eq!(index.member_count(), 3);
        assert_eq!(
            index.class_url("vtkImageData"),
            Some("https://vtk.org/doc/nightly/html/classvtkImageData.html")
        );
        assert_eq!(
            index.class_url("vtkCommand"),
            Some("https://mirror.example/vtkCommand.html")
        );
        assert_eq!(
            index.member_anchor("vtkImageData", "GetSpacing"),
            Some("ae6ebee83577b2d58c393a0df2f15b67d")
        );
    }

    #[test]
    fn default_base_url() {
        let index = AnchorIndex::parse("").unwrap();
        assert_eq!(index.base_url(), DEFAULT_BASE_URL);
        assert_eq!(
            index.guess_class_url("vtkFooBar"),
            "https://vtk.org/doc/nightly/html/classvtkFooBar.html"
        );
    }

    #[test]
    fn base_url_gets_single_trailing_slash() {
        let index = AnchorIndex::builder("https://example.org/docs//").build();
        assert_eq!(index.base_url(), "https://example.org/docs/");
    }

    #[test]
    fn member_lookup_is_case_sensitive() {
        let index = AnchorIndex::parse(SAMPLE).unwrap();
        assert_eq!(index.member_anchor("vtkImageData", "getspacing"), None);
        assert_eq!(index.member_anchor("vtkimagedata", "GetSpacing"), None);
        assert_eq!(
            index.closest_member("vtkImageData", "getspacing"),
            Some("GetSpacing")
        );
    }

    #[test]
    fn members_sorted() {
        let index = AnchorIndex::parse(SAMPLE).unwrap();
        let names: Vec<&str> = index
            .members_of("vtkImageData")
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, ["GetSpacing", "SetOrigin"]);
        assert!(index.members_of("vtkPolyData").is_empty());
    }

    #[test]
    fn empty_anchor_is_corrupt() {
        let content = "[classes.vtkImageData.members]\nGetSpacing = \"\"\n";
        assert!(matches!(
            AnchorIndex::parse(content),
            Err(Error::IndexCorrupt { .. })
        ));
    }

    #[test]
    fn dotted_member_is_corrupt() {
        let content = "[classes.vtkCommand.members]\n\"EventIds.PickEvent\" = \"abc\"\n";
        let err = AnchorIndex::parse(content).unwrap_err();
        assert!(
            matches!(&err, Error::IndexCorrupt { reason, .. } if reason.contains("EventIds.PickEvent")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn empty_url_is_corrupt() {
        let content = "[classes.vtkImageData]\nurl = \"\"\n";
        assert!(matches!(
            AnchorIndex::parse(content),
            Err(Error::IndexCorrupt { .. })
        ));
    }

    #[test]
    fn invalid_toml() {
        assert!(matches!(
            AnchorIndex::parse("classes = 3"),
            Err(Error::TomlDe(_))
        ));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(matches!(
            AnchorIndex::load(&path),
            Err(Error::IndexNotFound { .. })
        ));
    }

    #[test]
    fn load_reports_path_on_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"[classes.vtkImageData.members]\nGetSpacing = \"\"\n")
            .unwrap();

        let err = AnchorIndex::load(&path).unwrap_err();
        match err {
            Error::IndexCorrupt { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn index_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AnchorIndex>();
    }
}
