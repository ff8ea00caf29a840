//! Application configuration for texbuilder.
//!
//! User config lives at `~/.texbuilder/texbuilder.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TexBuilderError};
use crate::types::PrefixStyle;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "texbuilder.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".texbuilder";

// ---------------------------------------------------------------------------
// Config structs (matching texbuilder.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Project layout defaults.
    #[serde(default)]
    pub project: ProjectDefaults,

    /// Bibliography block settings.
    #[serde(default)]
    pub bibliography: BibliographyDefaults,

    /// Fragment wrapping settings.
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// `[project]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDefaults {
    /// Root directory holding `preamble.tex` and the sections folder.
    #[serde(default = "default_root")]
    pub root: String,

    /// Sections directory, relative to the root.
    #[serde(default = "default_sections_dir")]
    pub sections_dir: String,

    /// Preamble customization file, relative to the root.
    #[serde(default = "default_preamble_customization")]
    pub preamble_customization: String,

    /// Inputs placed after `\begin{document}`, before the sections.
    #[serde(default = "default_inputs_before")]
    pub inputs_before: Vec<String>,

    /// Inputs placed after the bibliography.
    #[serde(default = "default_inputs_after")]
    pub inputs_after: Vec<String>,
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            root: default_root(),
            sections_dir: default_sections_dir(),
            preamble_customization: default_preamble_customization(),
            inputs_before: default_inputs_before(),
            inputs_after: default_inputs_after(),
        }
    }
}

fn default_root() -> String {
    "tex".into()
}
fn default_sections_dir() -> String {
    "sections".into()
}
fn default_preamble_customization() -> String {
    "preamble-customization.tex".into()
}
fn default_inputs_before() -> Vec<String> {
    ["title", "abstract", "table_of_contents", "abbreviations"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_inputs_after() -> Vec<String> {
    vec!["appendices".into()]
}

/// `[bibliography]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibliographyDefaults {
    /// Whether the bibliography block is emitted at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// BibTeX database base name, passed to `\bibliography{}`.
    #[serde(default = "default_bibliography_file")]
    pub file: String,

    /// Heading used for the bibliography and its TOC entry.
    #[serde(default = "default_bibliography_title")]
    pub title: String,
}

impl Default for BibliographyDefaults {
    fn default() -> Self {
        Self {
            enabled: true,
            file: default_bibliography_file(),
            title: default_bibliography_title(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_bibliography_file() -> String {
    "bibliography_database".into()
}
fn default_bibliography_title() -> String {
    "Список использованных источников".into()
}

/// `[layout]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Prefix scheme for section fragment directives.
    #[serde(default)]
    pub prefix_style: PrefixStyle,

    /// Suppress page breaks inside a section's preface (its `macros.tex`).
    #[serde(default)]
    pub relax_section_preface: bool,

    /// Suppress page breaks inside a section's subsections.
    #[serde(default = "default_true")]
    pub relax_section_postface: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            prefix_style: PrefixStyle::default(),
            relax_section_preface: false,
            relax_section_postface: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Project config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Bibliography settings for one assembly run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bibliography {
    /// Base name of the bibliography database.
    pub file: String,
    /// Localized heading.
    pub title: String,
}

/// Runtime project configuration, built once and passed into the assembler.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Project root directory.
    pub root: PathBuf,
    /// Sections directory name, relative to `root`.
    pub sections_dir: String,
    /// Preamble customization file name, relative to `root`.
    pub preamble_customization: String,
    /// Additional inputs before the sections.
    pub inputs_before: Vec<String>,
    /// Additional inputs after the bibliography.
    pub inputs_after: Vec<String>,
    /// `None` omits the bibliography block.
    pub bibliography: Option<Bibliography>,
    /// Prefix scheme for section fragments.
    pub prefix_style: PrefixStyle,
    /// Relax page breaks around section prefaces.
    pub relax_preface: bool,
    /// Relax page breaks around section postfaces.
    pub relax_postface: bool,
}

impl From<&AppConfig> for ProjectConfig {
    fn from(config: &AppConfig) -> Self {
        let bibliography = config.bibliography.enabled.then(|| Bibliography {
            file: config.bibliography.file.clone(),
            title: config.bibliography.title.clone(),
        });

        Self {
            root: PathBuf::from(&config.project.root),
            sections_dir: config.project.sections_dir.clone(),
            preamble_customization: config.project.preamble_customization.clone(),
            inputs_before: config.project.inputs_before.clone(),
            inputs_after: config.project.inputs_after.clone(),
            bibliography,
            prefix_style: config.layout.prefix_style,
            relax_preface: config.layout.relax_section_preface,
            relax_postface: config.layout.relax_section_postface,
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.texbuilder/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TexBuilderError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.texbuilder/texbuilder.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TexBuilderError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TexBuilderError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TexBuilderError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TexBuilderError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TexBuilderError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
