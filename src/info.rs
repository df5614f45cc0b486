use std::path::Path;

use serde::Serialize;

use crate::commands::Project;
use crate::config::CONFIG_FILE;

/// Output the vtkref reference document.
pub fn run(project: &Project, json: bool) {
    let state = gather_state(project);

    if json {
        print_json(&state);
    } else {
        print_markdown(&state);
    }
}

// ── State gathering ───────────────────────────────────────────────────

/// What is on disk right now.
struct CurrentState {
    /// Config file that was read, if any.
    config_path: Option<String>,
    /// Anchor index totals, or `None` if it could not be loaded.
    index: Option<IndexState>,
    /// Anchor index location.
    index_path: String,
    /// Scanned role name.
    role: String,
    /// Whether warnings are errors by default.
    strict: bool,
}

/// Counts from a loaded anchor index.
#[derive(Serialize)]
struct IndexState {
    /// Site root used for guessed URLs.
    base_url: String,
    /// Number of classes.
    classes: usize,
    /// Number of member anchors.
    members: usize,
}

fn gather_state(project: &Project) -> CurrentState {
    let index = project.load_index().ok().map(|index| {
        return IndexState {
            base_url: index.base_url().to_string(),
            classes: index.class_count(),
            members: index.member_count(),
        };
    });

    return CurrentState {
        config_path: project.config_path.as_deref().map(display_path),
        index,
        index_path: display_path(&project.index_path),
        role: project.config.role.clone(),
        strict: project.config.strict,
    };
}

fn display_path(path: &Path) -> String {
    return path.display().to_string();
}

// ── Markdown output ───────────────────────────────────────────────────

fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_state(state);
    println!();
    print_markdown_exit_codes();
}

fn print_markdown_header(version: &str) {
    print!(
        "\
# vtkref {version}

Resolve `:vtk:` cross-references in documentation into links to the VTK
API documentation, and warn about references the anchor index cannot confirm.

## Reference Syntax

    :vtk:`vtkImageData`                                   class page
    :vtk:`vtkImageData.GetSpacing`                        member anchor
    :vtk:`~vtkImageData.GetSpacing`                       link text `GetSpacing`
    :vtk:`Get Image Spacing <vtkImageData.GetSpacing>`    custom link text

Unknown classes link to the conventional `class<Name>.html` page and unknown
members link to the class page. Both are reported as warnings.

## Workflow

    vtkref check                      Resolve every role in the docs (exit 0/1/2)
    vtkref check --strict             Treat unresolved references as errors
    vtkref check --jobs 8             Resolve on 8 worker threads
    vtkref resolve <target>           Resolve a single role target
    vtkref members <class>            List known member anchors of a class
    vtkref watch                      Re-check when docs or the index change

## Configuration (.vtkref.toml)

    include = [\"docs/\"]                   # only scan these paths
    exclude = [\"docs/_build/\"]            # skip these paths
    extensions = [\"rst\", \"md\", \"py\", \"txt\"]
    index = \".vtkref-index.toml\"          # anchor index file
    role = \"vtk\"                          # role name to scan for
    strict = false                        # warnings are errors

## Anchor Index

    base_url = \"https://vtk.org/doc/nightly/html/\"

    [classes.vtkImageData.members]
    GetSpacing = \"ae6ebee83577b2d58c393a0df2f15b67d\"

## Current State

"
    );
}

fn print_markdown_state(state: &CurrentState) {
    match &state.config_path {
        Some(path) => println!("Config:     {path} (found)"),
        None => println!("Config:     {CONFIG_FILE} (not found, using defaults)"),
    }

    match &state.index {
        Some(index) => println!(
            "Index:      {} ({} classes, {} member anchors, base {})",
            state.index_path, index.classes, index.members, index.base_url
        ),
        None => println!("Index:      {} (not loaded)", state.index_path),
    }

    println!("Role:       :{}:", state.role);
    println!("Strict:     {}", state.strict);
}

fn print_markdown_exit_codes() {
    print!(
        "\
## Exit Codes

| Code | Meaning |
|------|---------|
| 0    | Success (warnings allowed unless strict) |
| 1    | Unresolved references in strict mode |
| 2    | Malformed references found |
| 3    | Runtime error |
"
    );
}

// ── JSON output ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct InfoJson<'a> {
    current_state: StateJson<'a>,
    exit_codes: Vec<ExitCodeInfo>,
    syntax: Vec<&'static str>,
    version: &'static str,
}

#[derive(Serialize)]
struct ExitCodeInfo {
    code: u8,
    meaning: &'static str,
}

#[derive(Serialize)]
struct StateJson<'a> {
    config_found: bool,
    config_path: Option<&'a str>,
    index: Option<&'a IndexState>,
    index_path: &'a str,
    role: &'a str,
    strict: bool,
}

fn print_json(state: &CurrentState) {
    let info = InfoJson {
        current_state: StateJson {
            config_found: state.config_path.is_some(),
            config_path: state.config_path.as_deref(),
            index: state.index.as_ref(),
            index_path: &state.index_path,
            role: &state.role,
            strict: state.strict,
        },
        exit_codes: vec![
            ExitCodeInfo { code: 0, meaning: "Success (warnings allowed unless strict)" },
            ExitCodeInfo { code: 1, meaning: "Unresolved references in strict mode" },
            ExitCodeInfo { code: 2, meaning: "Malformed references found" },
            ExitCodeInfo { code: 3, meaning: "Runtime error" },
        ],
        syntax: vec![
            "ClassName",
            "ClassName.Member",
            "~ClassName.Member",
            "Custom Title <ClassName.Member>",
        ],
        version: env!("CARGO_PKG_VERSION"),
    };

    // serde_json::to_string_pretty won't fail on this structure.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
}
