//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use texbuilder_core::{AssembleReport, ProgressReporter, StdFs};
use texbuilder_shared::{
    AppConfig, Bibliography, PrefixStyle, ProjectConfig, init_config, load_config,
    load_config_from,
};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// texbuilder — stitch a multi-file LaTeX project into one document.
#[derive(Parser)]
#[command(
    name = "texbuilder",
    version,
    about = "Assemble a LaTeX project of section folders into a single compiled.tex.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.texbuilder/texbuilder.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Assemble the project into <root>/compiled.tex.
    Build(BuildArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `build`. Anything left unset falls back to the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct BuildArgs {
    /// Root tex files directory (tex by default).
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Sections directory inside the root directory (sections by default).
    #[arg(short, long)]
    pub sections: Option<String>,

    /// Preamble customization file inside the root directory.
    #[arg(short, long)]
    pub preamble_customization: Option<String>,

    /// Inputs placed before the sections (comma-separated; empty to disable).
    #[arg(short, long, num_args = 0.., value_delimiter = ',')]
    pub inputs: Option<Vec<String>>,

    /// Inputs placed after the bibliography (comma-separated; empty to disable).
    #[arg(short = 'a', long, num_args = 0.., value_delimiter = ',')]
    pub inputs_after: Option<Vec<String>>,

    /// Bibliography database base name.
    #[arg(short, long, conflicts_with = "no_bibliography")]
    pub bibliography: Option<String>,

    /// Heading of the bibliography section.
    #[arg(long)]
    pub bibliography_title: Option<String>,

    /// Omit the bibliography block.
    #[arg(long)]
    pub no_bibliography: bool,

    /// Directive prefix for section fragments: none or relative.
    #[arg(long)]
    pub prefix_style: Option<PrefixStyle>,

    /// Print the result as JSON instead of plain text.
    #[arg(long)]
    pub json: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout only
/// carries results.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "texbuilder=info",
        1 => "texbuilder=debug",
        _ => "texbuilder=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Build(args) => cmd_build(config_path, &args),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn resolve_app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// Merge CLI flags over the loaded config.
pub(crate) fn project_config(app: &AppConfig, args: &BuildArgs) -> ProjectConfig {
    let mut project = ProjectConfig::from(app);

    if let Some(root) = &args.root {
        project.root = root.clone();
    }
    if let Some(sections) = &args.sections {
        project.sections_dir = sections.clone();
    }
    if let Some(customization) = &args.preamble_customization {
        project.preamble_customization = customization.clone();
    }
    if let Some(inputs) = &args.inputs {
        project.inputs_before = non_empty(inputs);
    }
    if let Some(inputs) = &args.inputs_after {
        project.inputs_after = non_empty(inputs);
    }
    if let Some(style) = args.prefix_style {
        project.prefix_style = style;
    }

    if args.no_bibliography {
        project.bibliography = None;
    } else if args.bibliography.is_some() || args.bibliography_title.is_some() {
        let base = Bibliography {
            file: app.bibliography.file.clone(),
            title: app.bibliography.title.clone(),
        };
        project.bibliography = Some(Bibliography {
            file: args.bibliography.clone().unwrap_or(base.file),
            title: args.bibliography_title.clone().unwrap_or(base.title),
        });
    }

    project
}

fn non_empty(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

fn cmd_build(config_path: Option<&Path>, args: &BuildArgs) -> Result<()> {
    let app = resolve_app_config(config_path)?;
    let project = project_config(&app, args);

    info!(
        root = %project.root.display(),
        sections = %project.sections_dir,
        bibliography = project.bibliography.as_ref().map(|b| b.file.as_str()).unwrap_or("none"),
        "building project"
    );

    let report = if args.json {
        texbuilder_core::assemble(&StdFs, &project, &texbuilder_core::SilentProgress)?
    } else {
        let reporter = CliProgress::new();
        texbuilder_core::assemble(&StdFs, &project, &reporter)?
    };

    if args.json {
        let json = serde_json::json!({
            "output": report.output_path,
            "sections": report.sections,
            "warnings": report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "sha256": report.sha256,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    println!("{}", report.output_path.display());

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn section_built(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Section [{current}/{total}] {name}"));
    }

    fn done(&self, report: &AssembleReport) {
        self.spinner.finish_and_clear();
        if !report.warnings.is_empty() {
            warn!(count = report.warnings.len(), "some optional files were skipped");
        }
    }
}

// A failed assembly never reaches `done`; the spinner must not outlive it.
impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_app_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_args(argv: &[&str]) -> BuildArgs {
        let cli = Cli::try_parse_from(argv).expect("parse");
        match cli.command {
            Command::Build(args) => args,
            Command::Config { .. } => panic!("expected build"),
        }
    }

    #[test]
    fn defaults_come_from_config() {
        let args = build_args(&["texbuilder", "build"]);
        let project = project_config(&AppConfig::default(), &args);

        assert_eq!(project.root, PathBuf::from("tex"));
        assert_eq!(project.sections_dir, "sections");
        assert_eq!(project.preamble_customization, "preamble-customization.tex");
        assert_eq!(
            project.inputs_before,
            vec!["title", "abstract", "table_of_contents", "abbreviations"]
        );
        assert_eq!(project.inputs_after, vec!["appendices"]);
        assert_eq!(
            project.bibliography.map(|b| b.file),
            Some("bibliography_database".to_string())
        );
    }

    #[test]
    fn flags_override_config() {
        let args = build_args(&[
            "texbuilder",
            "build",
            "-r",
            "thesis",
            "--sections",
            "chapters",
            "-i",
            "title,abstract",
            "--bibliography",
            "refs",
            "--prefix-style",
            "none",
        ]);
        let project = project_config(&AppConfig::default(), &args);

        assert_eq!(project.root, PathBuf::from("thesis"));
        assert_eq!(project.sections_dir, "chapters");
        assert_eq!(project.inputs_before, vec!["title", "abstract"]);
        assert_eq!(project.prefix_style, PrefixStyle::None);
        let bibliography = project.bibliography.expect("bibliography");
        assert_eq!(bibliography.file, "refs");
        assert_eq!(bibliography.title, "Список использованных источников");
    }

    #[test]
    fn empty_input_list_disables_inputs() {
        let args = build_args(&["texbuilder", "build", "--inputs", "--inputs-after="]);
        let project = project_config(&AppConfig::default(), &args);
        assert!(project.inputs_before.is_empty());
        assert!(project.inputs_after.is_empty());
    }

    #[test]
    fn no_bibliography_flag() {
        let args = build_args(&["texbuilder", "build", "--no-bibliography"]);
        let project = project_config(&AppConfig::default(), &args);
        assert!(project.bibliography.is_none());
    }

    #[test]
    fn bibliography_conflicts_with_no_bibliography() {
        let result =
            Cli::try_parse_from(["texbuilder", "build", "-b", "refs", "--no-bibliography"]);
        assert!(result.is_err());
    }

    #[test]
    fn progress_spinner_is_cleared_when_dropped_early() {
        let progress = CliProgress::new();
        let spinner = progress.spinner.clone();
        progress.phase("Sections");
        assert!(!spinner.is_finished());

        drop(progress);
        assert!(spinner.is_finished());
    }
}
