//! Project assembler.
//!
//! Walks a LaTeX project tree, wraps every section with its macros and
//! subsections, and writes a single `compiled.tex` at the project root
//! that pulls everything together with `\input` directives.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use texbuilder_shared::{
    AssembleWarning, Bibliography, COMPILED_FILE, CONTENT_FILE, FragmentRef, IncludeDirective,
    MACROS_FILE, PREAMBLE_FILE, PrefixStyle, ProjectConfig, Result, SUBSECTION_PREFIX, TEX_EXTENSION,
    TexBuilderError, normalize_tex_name, to_include_directive,
};

use crate::fs::ProjectFs;
use crate::wrapper::{self, WrapRequest};

/// Output from a successful assembly.
#[derive(Debug, Clone)]
pub struct AssembleReport {
    /// Path of the written `compiled.tex`.
    pub output_path: PathBuf,
    /// Skipped optional resources: sections first, then inputs before and
    /// after the bibliography.
    pub warnings: Vec<AssembleWarning>,
    /// Names of the sections that made it into the document, in order.
    pub sections: Vec<String>,
    /// SHA-256 of the written document, lowercase hex.
    pub sha256: String,
}

/// Progress callback for reporting assembly status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a section has been wrapped (or skipped).
    fn section_built(&self, name: &str, current: usize, total: usize);
    /// Called when the document has been written.
    fn done(&self, report: &AssembleReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn section_built(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &AssembleReport) {}
}

/// Directives collected by one resolution step plus what it skipped.
#[derive(Debug, Default)]
struct Resolved {
    directives: Vec<IncludeDirective>,
    names: Vec<String>,
    warnings: Vec<AssembleWarning>,
}

/// Assemble the project described by `config`.
///
/// 1. Preamble (required), merged with the customization file if present
/// 2. Root `macros.tex` (optional, silent)
/// 3. Sections, each wrapped into `content-compiled.tex`
/// 4. Additional inputs before and after the bibliography
/// 5. Compose and write `<root>/compiled.tex`
#[instrument(skip_all, fields(root = %config.root.display()))]
pub fn assemble(
    fs: &dyn ProjectFs,
    config: &ProjectConfig,
    progress: &dyn ProgressReporter,
) -> Result<AssembleReport> {
    let root = config.root.as_path();

    progress.phase("Resolving preamble");
    let preamble = resolve_preamble(fs, root, &config.preamble_customization)?;
    let macros = fs
        .exists(&root.join(MACROS_FILE))
        .then(|| to_include_directive("", Path::new(MACROS_FILE)));

    progress.phase("Discovering sections");
    let sections = build_sections(fs, config, progress)?;

    progress.phase("Resolving inputs");
    let before = resolve_inputs(fs, root, &config.inputs_before);
    let after = resolve_inputs(fs, root, &config.inputs_after);

    let document = compose_document(&DocumentParts {
        preamble: &preamble,
        macros: macros.as_ref(),
        inputs_before: &before.directives,
        sections: &sections.directives,
        bibliography: config.bibliography.as_ref(),
        inputs_after: &after.directives,
    });

    progress.phase("Writing document");
    let output_path = root.join(COMPILED_FILE);
    fs.write_text(&output_path, &document)
        .map_err(|source| TexBuilderError::ResultWriteFailed {
            path: output_path.clone(),
            source,
        })?;

    let mut hasher = Sha256::new();
    hasher.update(document.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    let warnings: Vec<AssembleWarning> = sections
        .warnings
        .into_iter()
        .chain(before.warnings)
        .chain(after.warnings)
        .collect();

    info!(
        path = %output_path.display(),
        sections = sections.names.len(),
        warnings = warnings.len(),
        "document assembled"
    );

    let report = AssembleReport {
        output_path,
        warnings,
        sections: sections.names,
        sha256,
    };
    progress.done(&report);

    Ok(report)
}

// ---------------------------------------------------------------------------
// Preamble
// ---------------------------------------------------------------------------

/// Include directive for the preamble, wrapping it with the customization
/// file when one exists.
fn resolve_preamble(
    fs: &dyn ProjectFs,
    root: &Path,
    customization: &str,
) -> Result<IncludeDirective> {
    let preamble = root.join(PREAMBLE_FILE);
    if !fs.exists(&preamble) {
        return Err(TexBuilderError::PreambleNotFound { path: preamble });
    }

    let customization_path = root.join(customization);
    if !fs.exists(&customization_path) {
        debug!(path = %customization_path.display(), "no preamble customization");
        return Ok(to_include_directive("", &preamble));
    }

    let request = WrapRequest {
        postface: vec![FragmentRef::new(
            customization_path,
            directory_prefix(Path::new(customization)),
        )],
        ..WrapRequest::new(&preamble)
    };
    let compiled = wrapper::build(fs, &request)?;
    Ok(to_include_directive("", &compiled))
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// True for `subsection_*.tex` file names (case-sensitive).
pub fn is_subsection_file(file_name: &str) -> bool {
    file_name.starts_with(SUBSECTION_PREFIX)
        && file_name.ends_with(&format!(".{TEX_EXTENSION}"))
}

/// `a/b/` for a root-relative `a/b/file.tex`; empty for a file at the root.
fn directory_prefix(relative: &Path) -> String {
    relative
        .parent()
        .map(|dir| {
            dir.components()
                .map(|c| format!("{}/", c.as_os_str().to_string_lossy()))
                .collect()
        })
        .unwrap_or_default()
}

/// Location of the section folder `name` as seen from the project root.
pub fn section_path_prefix(sections_dir: &str, name: &str) -> String {
    let dir = sections_dir.trim_matches('/');
    if dir.is_empty() {
        format!("{name}/")
    } else {
        format!("{dir}/{name}/")
    }
}

/// Directive prefix for the fragments included inside a compiled section.
pub fn section_prefix(style: PrefixStyle, sections_dir: &str, name: &str) -> String {
    match style {
        PrefixStyle::None => String::new(),
        PrefixStyle::Relative => section_path_prefix(sections_dir, name),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn build_sections(
    fs: &dyn ProjectFs,
    config: &ProjectConfig,
    progress: &dyn ProgressReporter,
) -> Result<Resolved> {
    let sections_path = config.root.join(&config.sections_dir);
    if !fs.is_dir(&sections_path) {
        return Err(TexBuilderError::SectionsFolderMissing {
            path: sections_path,
        });
    }

    let folders: Vec<PathBuf> = fs
        .list_dir(&sections_path)
        .map_err(|e| TexBuilderError::io(&sections_path, e))?
        .into_iter()
        .filter(|p| fs.is_dir(p))
        .collect();

    let mut resolved = Resolved::default();
    let total = folders.len();

    for (index, folder) in folders.iter().enumerate() {
        let name = file_name(folder);

        match build_section(fs, config, folder, &name)? {
            Some(directive) => {
                resolved.directives.push(directive);
                resolved.names.push(name.clone());
            }
            None => {
                warn!(section = %name, "skipping section without content.tex");
                resolved
                    .warnings
                    .push(AssembleWarning::MissingSectionContent {
                        section: name.clone(),
                    });
            }
        }

        progress.section_built(&name, index + 1, total);
    }

    Ok(resolved)
}

/// Wrap one section folder. `None` means the folder has no `content.tex`.
fn build_section(
    fs: &dyn ProjectFs,
    config: &ProjectConfig,
    folder: &Path,
    name: &str,
) -> Result<Option<IncludeDirective>> {
    let content = folder.join(CONTENT_FILE);
    if !fs.exists(&content) {
        return Ok(None);
    }

    let prefix = section_prefix(config.prefix_style, &config.sections_dir, name);

    let macros = folder.join(MACROS_FILE);
    let preface = if fs.exists(&macros) {
        vec![FragmentRef::new(macros, prefix.as_str())]
    } else {
        Vec::new()
    };

    let subsections: Vec<PathBuf> = fs
        .list_dir(folder)
        .map_err(|e| TexBuilderError::io(folder, e))?
        .into_iter()
        .filter(|p| !fs.is_dir(p) && is_subsection_file(&file_name(p)))
        .collect();
    let postface = wrapper::fragments(&prefix, subsections);

    debug!(
        section = %name,
        macros = !preface.is_empty(),
        subsections = postface.len(),
        "building section"
    );

    let request = WrapRequest {
        base: content,
        preface,
        postface,
        relax_preface: config.relax_preface,
        relax_postface: config.relax_postface,
    };
    let compiled = wrapper::build(fs, &request)?;

    // The root document always needs the folder path, whatever the style.
    let location = section_path_prefix(&config.sections_dir, name);
    Ok(Some(to_include_directive(&location, &compiled)))
}

// ---------------------------------------------------------------------------
// Additional inputs
// ---------------------------------------------------------------------------

/// Resolve root-level inputs by name, recording a warning for each one that
/// does not exist.
fn resolve_inputs(fs: &dyn ProjectFs, root: &Path, names: &[String]) -> Resolved {
    let mut resolved = Resolved::default();

    for name in names {
        let file = normalize_tex_name(name);

        if fs.exists(&root.join(&file)) {
            let target = file
                .strip_suffix(&format!(".{TEX_EXTENSION}"))
                .unwrap_or(&file);
            resolved.directives.push(IncludeDirective::new(target));
        } else {
            warn!(file = %file, "additional input not found");
            resolved
                .warnings
                .push(AssembleWarning::MissingAdditionalInput { file });
        }
    }

    resolved
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Everything that ends up in `compiled.tex`, in document order.
#[derive(Debug, Clone, Copy)]
pub struct DocumentParts<'a> {
    pub preamble: &'a IncludeDirective,
    pub macros: Option<&'a IncludeDirective>,
    pub inputs_before: &'a [IncludeDirective],
    pub sections: &'a [IncludeDirective],
    pub bibliography: Option<&'a Bibliography>,
    pub inputs_after: &'a [IncludeDirective],
}

/// Render the bibliography block.
pub fn bibliography_block(bibliography: &Bibliography) -> String {
    let Bibliography { file, title } = bibliography;
    format!(
        "\\renewcommand{{\\bibname}}{{{title}}}\n\
         \\phantomsection\n\
         \\addcontentsline{{toc}}{{chapter}}{{{title}}}\n\
         \\nocite{{*}}\n\
         \\bibliography{{{file}}}\n\
         \\clearpage\n"
    )
}

/// Concatenate the document parts. The macros slot is always present as a
/// line, empty when there is no root `macros.tex`.
pub fn compose_document(parts: &DocumentParts<'_>) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("{}\n", parts.preamble));
    if let Some(macros) = parts.macros {
        doc.push_str(&macros.to_string());
    }
    doc.push('\n');
    doc.push_str("\\begin{document}\n");

    for directive in parts.inputs_before.iter().chain(parts.sections) {
        doc.push_str(&format!("{directive}\n"));
    }

    if let Some(bibliography) = parts.bibliography {
        doc.push_str(&bibliography_block(bibliography));
    }

    for directive in parts.inputs_after {
        doc.push_str(&format!("{directive}\n"));
    }

    doc.push_str("\\end{document}\n");
    doc
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
