//! Core domain types for LaTeX project assembly.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extension shared by every fragment the tool reads or writes.
pub const TEX_EXTENSION: &str = "tex";

/// Required preamble at the project root.
pub const PREAMBLE_FILE: &str = "preamble.tex";

/// Optional macros file, both at the root and inside each section.
pub const MACROS_FILE: &str = "macros.tex";

/// The defining fragment of a section folder.
pub const CONTENT_FILE: &str = "content.tex";

/// Name of the assembled document written to the project root.
pub const COMPILED_FILE: &str = "compiled.tex";

/// Stem suffix appended to wrapped files (`content` -> `content-compiled.tex`).
pub const COMPILED_SUFFIX: &str = "-compiled";

/// File name prefix that marks a subsection fragment.
pub const SUBSECTION_PREFIX: &str = "subsection_";

// ---------------------------------------------------------------------------
// PrefixStyle
// ---------------------------------------------------------------------------

/// How include directives for section fragments are prefixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrefixStyle {
    /// Bare basenames, resolved relative to the including document.
    None,
    /// `<sections_dir>/<section>/` so the root document can resolve them.
    #[default]
    Relative,
}

impl fmt::Display for PrefixStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Relative => f.write_str("relative"),
        }
    }
}

impl std::str::FromStr for PrefixStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "relative" => Ok(Self::Relative),
            other => Err(format!(
                "unknown prefix style '{other}': expected 'none' or 'relative'"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// IncludeDirective
// ---------------------------------------------------------------------------

/// A `\input{...}` line pointing at a fragment, without its extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IncludeDirective {
    target: String,
}

impl IncludeDirective {
    /// Build a directive for an already-resolved target (`sections/intro/content`).
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// The path inside the braces.
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Display for IncludeDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\input{{{}}}", self.target)
    }
}

/// Format the include directive for `path` under `prefix`.
///
/// Only the file stem of `path` is used; its directories are expressed
/// through `prefix`, which may be empty.
pub fn to_include_directive(prefix: &str, path: &Path) -> IncludeDirective {
    IncludeDirective::new(format!("{prefix}{}", display_name(path)))
}

/// File name without extension, lossily converted to UTF-8.
pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Append `.tex` unless the name already ends with it.
pub fn normalize_tex_name(name: &str) -> String {
    let suffix = format!(".{TEX_EXTENSION}");
    if name.ends_with(&suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

// ---------------------------------------------------------------------------
// FragmentRef
// ---------------------------------------------------------------------------

/// A fragment on disk together with the prefix used to include it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentRef {
    /// Location of the fragment, as seen by the filesystem capability.
    pub path: PathBuf,
    /// Directory context emitted in front of the basename.
    pub prefix: String,
}

impl FragmentRef {
    pub fn new(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prefix: prefix.into(),
        }
    }

    /// File name without extension.
    pub fn name(&self) -> String {
        display_name(&self.path)
    }

    pub fn directive(&self) -> IncludeDirective {
        to_include_directive(&self.prefix, &self.path)
    }
}

// ---------------------------------------------------------------------------
// AssembleWarning
// ---------------------------------------------------------------------------

/// A skipped optional resource. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleWarning {
    /// A section folder without `content.tex`.
    MissingSectionContent { section: String },
    /// An additional input that does not exist; `file` carries the extension.
    MissingAdditionalInput { file: String },
}

impl fmt::Display for AssembleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSectionContent { section } => {
                write!(f, "Skip {section}, can not find {CONTENT_FILE}")
            }
            Self::MissingAdditionalInput { file } => {
                write!(f, "Can't find additional file {file}")
            }
        }
    }
}
