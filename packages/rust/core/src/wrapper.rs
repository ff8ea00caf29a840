//! Fragment wrapper.
//!
//! Embeds preface and postface fragments around a base file as `\input`
//! directives and writes the result next to the base file as
//! `<stem>-compiled.tex`.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use texbuilder_shared::{
    COMPILED_SUFFIX, FragmentRef, IncludeDirective, Result, TEX_EXTENSION, TexBuilderError,
    display_name,
};

use crate::fs::ProjectFs;

/// Opens a group in which `\clearpage` does nothing.
pub const RELAX_BEGIN: &str = "\\begingroup\\let\\clearpage\\relax";

/// Closes the group opened by [`RELAX_BEGIN`].
pub const RELAX_END: &str = "\\endgroup";

/// Input for a single [`build`] call.
#[derive(Debug, Clone, Default)]
pub struct WrapRequest {
    /// The file whose content sits between preface and postface.
    pub base: PathBuf,
    /// Fragments included before the base content, in order.
    pub preface: Vec<FragmentRef>,
    /// Fragments included after the base content, in order.
    pub postface: Vec<FragmentRef>,
    /// Wrap the preface block in a page-break-suppressing group.
    pub relax_preface: bool,
    /// Wrap the postface block in a page-break-suppressing group.
    pub relax_postface: bool,
}

impl WrapRequest {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }
}

/// Fragment refs for `paths`, all included under the same `prefix`.
pub fn fragments<I, P>(prefix: &str, paths: I) -> Vec<FragmentRef>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    paths
        .into_iter()
        .map(|path| FragmentRef::new(path, prefix))
        .collect()
}

/// Path of the file [`build`] writes for `base`.
pub fn compiled_path(base: &Path) -> PathBuf {
    let file_name = format!("{}{COMPILED_SUFFIX}.{TEX_EXTENSION}", display_name(base));
    match base.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Wrap `request.base` with its fragments and persist the result.
///
/// Every file is checked before anything is written, so a missing fragment
/// leaves the filesystem untouched. Returns the path of the written file.
#[instrument(skip_all, fields(base = %request.base.display()))]
pub fn build(fs: &dyn ProjectFs, request: &WrapRequest) -> Result<PathBuf> {
    if !fs.exists(&request.base) {
        return Err(TexBuilderError::SourceNotFound {
            path: request.base.clone(),
        });
    }

    let preface = directives(fs, &request.preface)?;
    let postface = directives(fs, &request.postface)?;

    let original = fs
        .read_text(&request.base)
        .map_err(|e| TexBuilderError::read_failed(&request.base, e))?;

    let content = compose(
        &render_block(&preface, request.relax_preface),
        &original,
        &render_block(&postface, request.relax_postface),
    );

    let target = compiled_path(&request.base);
    fs.write_text(&target, &content)
        .map_err(|e| TexBuilderError::write_failed(&target, e))?;

    debug!(
        target = %target.display(),
        preface = preface.len(),
        postface = postface.len(),
        "wrote compiled fragment"
    );

    Ok(target)
}

/// Resolve fragments to directives, failing on the first missing one.
fn directives(fs: &dyn ProjectFs, fragments: &[FragmentRef]) -> Result<Vec<IncludeDirective>> {
    fragments
        .iter()
        .map(|fragment| {
            if fs.exists(&fragment.path) {
                Ok(fragment.directive())
            } else {
                Err(TexBuilderError::FragmentNotFound {
                    path: fragment.path.clone(),
                })
            }
        })
        .collect()
}

/// One directive per line, optionally wrapped in a relax group.
pub fn render_block(directives: &[IncludeDirective], relax: bool) -> String {
    let block: String = directives.iter().map(|d| format!("{d}\n")).collect();

    if relax && !block.is_empty() {
        format!("{RELAX_BEGIN}\n{block}{RELAX_END}\n")
    } else {
        block
    }
}

fn compose(preface: &str, original: &str, postface: &str) -> String {
    format!("{preface}\n{original}\n{postface}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    fn section_fs() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.add_file("tex/sections/intro/content.tex", "Intro body")
            .add_file("tex/sections/intro/macros.tex", "\\newcommand{\\x}{x}")
            .add_file("tex/sections/intro/subsection_a.tex", "A")
            .add_file("tex/sections/intro/subsection_b.tex", "B");
        fs
    }

    #[test]
    fn compiled_path_sits_next_to_base() {
        assert_eq!(
            compiled_path(Path::new("tex/sections/intro/content.tex")),
            PathBuf::from("tex/sections/intro/content-compiled.tex")
        );
        assert_eq!(
            compiled_path(Path::new("preamble.tex")),
            PathBuf::from("preamble-compiled.tex")
        );
    }

    #[test]
    fn build_without_fragments_keeps_content() {
        let fs = section_fs();
        let out = build(&fs, &WrapRequest::new("tex/sections/intro/content.tex")).unwrap();

        assert_eq!(out, PathBuf::from("tex/sections/intro/content-compiled.tex"));
        assert_eq!(fs.file(&out).unwrap(), "\nIntro body\n");
    }

    #[test]
    fn build_orders_preface_and_postface() {
        let fs = section_fs();
        let request = WrapRequest {
            preface: fragments("sections/intro/", ["tex/sections/intro/macros.tex"]),
            postface: fragments(
                "sections/intro/",
                [
                    "tex/sections/intro/subsection_b.tex",
                    "tex/sections/intro/subsection_a.tex",
                ],
            ),
            ..WrapRequest::new("tex/sections/intro/content.tex")
        };

        let out = build(&fs, &request).unwrap();
        let expected = "\\input{sections/intro/macros}\n\
                        \n\
                        Intro body\n\
                        \\input{sections/intro/subsection_b}\n\
                        \\input{sections/intro/subsection_a}\n";
        assert_eq!(fs.file(&out).unwrap(), expected);
    }

    #[test]
    fn relax_wraps_only_the_requested_block() {
        let fs = section_fs();
        let request = WrapRequest {
            preface: fragments("sections/intro/", ["tex/sections/intro/macros.tex"]),
            postface: fragments("sections/intro/", ["tex/sections/intro/subsection_a.tex"]),
            relax_preface: false,
            relax_postface: true,
            ..WrapRequest::new("tex/sections/intro/content.tex")
        };

        let out = build(&fs, &request).unwrap();
        let content = fs.file(&out).unwrap();
        assert!(content.starts_with("\\input{sections/intro/macros}\n\nIntro body\n"));
        assert!(content.ends_with(
            "\\begingroup\\let\\clearpage\\relax\n\\input{sections/intro/subsection_a}\n\\endgroup\n"
        ));
        assert_eq!(content.matches(RELAX_BEGIN).count(), 1);
    }

    #[test]
    fn relax_on_empty_block_emits_nothing() {
        assert_eq!(render_block(&[], true), "");

        let fs = section_fs();
        let request = WrapRequest {
            relax_preface: true,
            relax_postface: true,
            ..WrapRequest::new("tex/sections/intro/content.tex")
        };
        let out = build(&fs, &request).unwrap();
        assert_eq!(fs.file(&out).unwrap(), "\nIntro body\n");
    }

    #[test]
    fn missing_base_is_source_not_found() {
        let fs = MemoryFs::new();
        let err = build(&fs, &WrapRequest::new("tex/preamble.tex")).unwrap_err();
        assert!(matches!(err, TexBuilderError::SourceNotFound { .. }));
    }

    #[test]
    fn missing_fragment_fails_without_writing() {
        let fs = section_fs();
        let files_before = fs.file_count();
        let request = WrapRequest {
            preface: fragments("", ["tex/sections/intro/macros.tex"]),
            postface: fragments(
                "",
                [
                    "tex/sections/intro/subsection_a.tex",
                    "tex/sections/intro/subsection_missing.tex",
                ],
            ),
            ..WrapRequest::new("tex/sections/intro/content.tex")
        };

        let err = build(&fs, &request).unwrap_err();
        match err {
            TexBuilderError::FragmentNotFound { path } => {
                assert_eq!(path, PathBuf::from("tex/sections/intro/subsection_missing.tex"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs.file_count(), files_before);
        assert!(fs.file("tex/sections/intro/content-compiled.tex").is_none());
    }

    #[test]
    fn write_failure_is_reported() {
        let fs = section_fs();
        fs.deny_writes("tex/sections/intro/content-compiled.tex");
        let err = build(&fs, &WrapRequest::new("tex/sections/intro/content.tex")).unwrap_err();
        assert!(matches!(err, TexBuilderError::WriteFailed { .. }));
    }

    #[test]
    fn each_fragment_keeps_its_own_prefix() {
        let fs = section_fs();
        fs.add_file("tex/shared/common.tex", "");
        let request = WrapRequest {
            preface: vec![
                FragmentRef::new("tex/shared/common.tex", "shared/"),
                FragmentRef::new("tex/sections/intro/macros.tex", "sections/intro/"),
            ],
            ..WrapRequest::new("tex/sections/intro/content.tex")
        };

        let out = build(&fs, &request).unwrap();
        assert!(fs.file(&out).unwrap().starts_with(
            "\\input{shared/common}\n\\input{sections/intro/macros}\n\nIntro body\n"
        ));
    }

    #[test]
    fn unreadable_base_is_read_failed_and_writes_nothing() {
        let fs = section_fs();
        fs.deny_reads("tex/sections/intro/content.tex");
        let request = WrapRequest {
            postface: fragments("sections/intro/", ["tex/sections/intro/subsection_a.tex"]),
            ..WrapRequest::new("tex/sections/intro/content.tex")
        };

        let err = build(&fs, &request).unwrap_err();
        match err {
            TexBuilderError::ReadFailed { path, source } => {
                assert_eq!(path, PathBuf::from("tex/sections/intro/content.tex"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fs.file("tex/sections/intro/content-compiled.tex").is_none());
    }
}
