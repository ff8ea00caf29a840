//! Shared types, error model, and configuration for texbuilder.
//!
//! This crate is the foundation depended on by the other texbuilder crates.
//! It provides:
//! - [`TexBuilderError`] — the unified error type
//! - Domain types ([`FragmentRef`], [`IncludeDirective`], [`AssembleWarning`])
//! - Configuration ([`AppConfig`], [`ProjectConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, Bibliography, BibliographyDefaults, LayoutConfig, ProjectConfig, ProjectDefaults,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, TexBuilderError};
pub use types::{
    AssembleWarning, COMPILED_FILE, COMPILED_SUFFIX, CONTENT_FILE, FragmentRef, IncludeDirective,
    MACROS_FILE, PREAMBLE_FILE, PrefixStyle, SUBSECTION_PREFIX, TEX_EXTENSION, display_name,
    normalize_tex_name, to_include_directive,
};
