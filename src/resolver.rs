use crate::error::Error;
use crate::index::AnchorIndex;
use crate::reference;
use crate::types::{ParsedReference, ResolvedLink, RoleTarget, Unresolved};

/// Resolve a parsed reference against the index.
///
/// Never fails: an unknown class gets the conventional page URL, an unknown
/// member gets the class page without a fragment, and the link records why
/// it could not be validated.
pub fn resolve(reference: &ParsedReference, index: &AnchorIndex) -> ResolvedLink {
    let (class_url, class_known) = match index.class_url(reference.class_name()) {
        Some(url) => (url.to_string(), true),
        None => (index.guess_class_url(reference.class_name()), false),
    };
    let class_problem = (!class_known).then(|| {
        return Unresolved::Class {
            class: reference.class_name().to_string(),
            guessed_url: class_url.clone(),
        };
    });

    let RoleTarget::Member { class, member } = &reference.target else {
        return ResolvedLink {
            display_text: display_text(reference),
            unresolved: class_problem,
            url: class_url,
        };
    };

    // Nested members are never looked up, whatever the index holds.
    let nested = member.contains('.');
    if !nested && let Some(anchor) = index.member_anchor(class, member) {
        return ResolvedLink {
            display_text: display_text(reference),
            unresolved: class_problem,
            url: format!("{class_url}#{anchor}"),
        };
    }

    // Class problems take precedence: an unknown class has no members to report.
    let unresolved = class_problem.unwrap_or_else(|| {
        return Unresolved::Member {
            class_url: class_url.clone(),
            member: member.clone(),
            nested,
            suggestion: suggest_member(index, class, member),
        };
    });

    return ResolvedLink {
        display_text: display_text(reference),
        unresolved: Some(unresolved),
        url: class_url,
    };
}

/// Parse and resolve a raw role target in one step.
///
/// # Errors
///
/// Returns `Error::MalformedReference` if the target names no class.
pub fn resolve_raw(raw: &str, index: &AnchorIndex) -> Result<(ParsedReference, ResolvedLink), Error> {
    let parsed = reference::parse(raw)?;
    let link = resolve(&parsed, index);
    tracing::trace!(raw, url = %link.url, valid = link.is_valid(), "resolved");
    return Ok((parsed, link));
}

/// Link text: explicit title, then the member alone when shortened,
/// then the full dotted name. An empty member never yields empty text.
fn display_text(reference: &ParsedReference) -> String {
    if let Some(title) = &reference.explicit_title {
        return title.clone();
    }
    return match (&reference.target, reference.shorten) {
        (RoleTarget::Member { member, .. }, true) if !member.is_empty() => member.clone(),
        (target, _) => target.display_name(),
    };
}

/// A known member the writer probably meant. Nested targets suggest their
/// first segment when it exists; otherwise a case-insensitive match.
fn suggest_member(index: &AnchorIndex, class: &str, member: &str) -> Option<String> {
    if let Some((head, _)) = member.split_once('.')
        && index.member_anchor(class, head).is_some()
    {
        return Some(head.to_string());
    }
    return index.closest_member(class, member).map(String::from);
}

#[cfg(test)]
mod tests {
    use super::{resolve, resolve_raw};
    use crate::index::AnchorIndex;
    use crate::reference::parse;
    use crate::types::Unresolved;

    const BASE: &str = "https://vtk.org/doc/nightly/html/";
    const IMAGE_DATA_URL: &str = "https://vtk.org/doc/nightly/html/classvtkImageData.html";
    const COMMAND_URL: &str = "https://vtk.org/doc/nightly/html/classvtkCommand.html";
    const GET_SPACING: &str = "ae6ebee83577b2d58c393a0df2f15b67d";

    fn index() -> AnchorIndex {
        return AnchorIndex::builder(BASE)
            .conventional_class("vtkImageData")
            .conventional_class("vtkCommand")
            .member("vtkImageData", "GetSpacing", GET_SPACING)
            .member("vtkImageData", "SetOrigin", "ad18d146c5e2471876e5d9c6242ac1544")
            .member("vtkCommand", "EventIds", "a59a8690330ebcb1af6b66b0f3121f8fe")
            .build();
    }

    #[test]
    fn class_only() {
        let (_, link) = resolve_raw("vtkImageData", &index()).unwrap();
        assert_eq!(link.url, IMAGE_DATA_URL);
        assert_eq!(link.display_text, "vtkImageData");
        assert!(link.is_valid());
    }

    #[test]
    fn class_and_member() {
        let (_, link) = resolve_raw("vtkImageData.GetSpacing", &index()).unwrap();
        assert_eq!(link.url, format!("{IMAGE_DATA_URL}#{GET_SPACING}"));
        assert_eq!(link.display_text, "vtkImageData.GetSpacing");
        assert!(link.is_valid());
    }

    #[test]
    fn tilde_only_changes_text() {
        let (_, full) = resolve_raw("vtkImageData.GetSpacing", &index()).unwrap();
        let (_, short) = resolve_raw("~vtkImageData.GetSpacing", &index()).unwrap();
        assert_eq!(short.url, full.url);
        assert_eq!(short.display_text, "GetSpacing");
        assert!(short.is_valid());
    }

    #[test]
    fn tilde_on_class_keeps_class_name() {
        let (_, link) = resolve_raw("~vtkImageData", &index()).unwrap();
        assert_eq!(link.display_text, "vtkImageData");
    }

    #[test]
    fn explicit_title_wins() {
        let (_, link) = resolve_raw("Get Image Spacing <vtkImageData.GetSpacing>", &index()).unwrap();
        assert_eq!(link.url, format!("{IMAGE_DATA_URL}#{GET_SPACING}"));
        assert_eq!(link.display_text, "Get Image Spacing");

        let (_, shortened) = resolve_raw("Spacing <~vtkImageData.GetSpacing>", &index()).unwrap();
        assert_eq!(shortened.display_text, "Spacing");
    }

    #[test]
    fn explicit_title_on_unknown_class() {
        let (_, link) = resolve_raw("Foo <vtkFooBar>", &index()).unwrap();
        assert_eq!(link.display_text, "Foo");
        assert!(!link.is_valid());
    }

    #[test]
    fn unknown_member_falls_back_to_class_page() {
        let (_, link) = resolve_raw("vtkImageData.FakeMethod", &index()).unwrap();
        assert_eq!(link.url, IMAGE_DATA_URL);
        assert_eq!(link.display_text, "vtkImageData.FakeMethod");
        assert_eq!(
            link.unresolved,
            Some(Unresolved::Member {
                class_url: IMAGE_DATA_URL.to_string(),
                member: "FakeMethod".to_string(),
                nested: false,
                suggestion: None,
            })
        );
    }

    #[test]
    fn nested_member_falls_back_to_class_page() {
        let (_, link) = resolve_raw("vtkCommand.EventIds.PickEvent", &index()).unwrap();
        assert_eq!(link.url, COMMAND_URL);
        assert_eq!(link.display_text, "vtkCommand.EventIds.PickEvent");
        assert_eq!(
            link.unresolved,
            Some(Unresolved::Member {
                class_url: COMMAND_URL.to_string(),
                member: "EventIds.PickEvent".to_string(),
                nested: true,
                suggestion: Some("EventIds".to_string()),
            })
        );
    }

    #[test]
    fn trailing_dot_falls_back_to_class_page() {
        let (_, link) = resolve_raw("vtkImageData.", &index()).unwrap();
        assert_eq!(link.url, IMAGE_DATA_URL);
        assert_eq!(link.display_text, "vtkImageData.");
        assert!(matches!(
            link.unresolved,
            Some(Unresolved::Member { ref member, nested: false, .. }) if member.is_empty()
        ));

        let (_, shortened) = resolve_raw("~vtkImageData.", &index()).unwrap();
        assert_eq!(shortened.display_text, "vtkImageData.");
    }

    #[test]
    fn nested_member_in_index_is_still_unresolved() {
        let index = AnchorIndex::builder(BASE)
            .conventional_class("vtkCommand")
            .member("vtkCommand", "EventIds", "a59a8690330ebcb1af6b66b0f3121f8fe")
            .member("vtkCommand", "EventIds.PickEvent", "abc")
            .build();
        let (_, link) = resolve_raw("vtkCommand.EventIds.PickEvent", &index).unwrap();
        assert_eq!(link.url, COMMAND_URL);
        assert!(!link.is_valid());
        assert!(matches!(link.unresolved, Some(Unresolved::Member { nested: true, .. })));
    }

    #[test]
    fn explicit_title_with_shortened_class_only_target() {
        let (parsed, link) = resolve_raw("T <~vtkImageData>", &index()).unwrap();
        assert!(parsed.shorten);
        assert_eq!(link.display_text, "T");
        assert_eq!(link.url, IMAGE_DATA_URL);
        assert!(link.is_valid());
    }

    #[test]
    fn unknown_class_gets_guessed_url() {
        let (_, link) = resolve_raw("UnknownClass", &index()).unwrap();
        let guessed = format!("{BASE}classUnknownClass.html");
        assert_eq!(link.url, guessed);
        assert_eq!(link.display_text, "UnknownClass");
        assert_eq!(
            link.unresolved,
            Some(Unresolved::Class {
                class: "UnknownClass".to_string(),
                guessed_url: guessed,
            })
        );
    }

    #[test]
    fn unknown_class_with_member_reports_class() {
        let (_, link) = resolve_raw("vtkFooBar.Baz", &index()).unwrap();
        assert_eq!(link.url, format!("{BASE}classvtkFooBar.html"));
        assert!(matches!(link.unresolved, Some(Unresolved::Class { .. })));
    }

    #[test]
    fn member_anchor_without_class_page_is_invalid() {
        let index = AnchorIndex::builder(BASE)
            .member("vtkOrphan", "Run", "abc123")
            .build();
        let (_, link) = resolve_raw("vtkOrphan.Run", &index).unwrap();
        assert_eq!(link.url, format!("{BASE}classvtkOrphan.html#abc123"));
        assert!(!link.is_valid());
    }

    #[test]
    fn wrong_case_member_is_unresolved_with_suggestion() {
        let (_, link) = resolve_raw("vtkImageData.getSpacing", &index()).unwrap();
        assert_eq!(link.url, IMAGE_DATA_URL);
        let Some(Unresolved::Member { suggestion, .. }) = link.unresolved else {
            panic!("expected member problem");
        };
        assert_eq!(suggestion.as_deref(), Some("GetSpacing"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let index = index();
        let parsed = parse("~vtkImageData.SetOrigin").unwrap();
        assert_eq!(resolve(&parsed, &index), resolve(&parsed, &index));
    }

    #[test]
    fn malformed_target_propagates() {
        assert!(resolve_raw("~", &index()).is_err());
    }
}
