//! Ember Editor - asset import front end
//!
//! Imports shaders, models and textures into a project and inspects shader
//! files from the command line.

mod project;
mod registry;
mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ember_import::{parse_shader, Diagnostics};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use project::{ImportSummary, Project};
use settings::EditorSettings;

#[derive(Parser)]
#[command(name = "ember-editor", version, about = "Import source assets into an Ember project")]
struct Cli {
    /// Log debug output regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import files or directories into a project
    Import {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Project root; defaults to the current directory
        #[arg(long)]
        project: Option<PathBuf>,
    },
    /// Parse a shader file and print the result as JSON
    Shader { path: PathBuf },
    /// Print the effective settings as TOML
    Settings {
        /// Also write them to the settings file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => EditorSettings::load_from(path),
        None => EditorSettings::load(),
    };

    let level = if cli.verbose { Level::DEBUG } else { settings.logging.max_level() };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(settings.logging.show_target)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    match cli.command {
        Command::Import { paths, project } => run_import(&paths, project, &settings),
        Command::Shader { path } => run_shader(&path),
        Command::Settings { write } => run_settings(&settings, cli.settings.as_deref(), write),
    }
}

fn run_import(paths: &[PathBuf], project: Option<PathBuf>, settings: &EditorSettings) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let root = project.map_or_else(|| cwd.clone(), |dir| cwd.join(dir));
    let mut project = Project::open(root, settings);
    info!("Importing into project {}", project.root().display());

    let mut imported = 0;
    let mut failed = 0;
    let mut anomalies = 0;
    for path in paths {
        let path = cwd.join(path);
        if path.is_dir() {
            let result = project.import_directory(&path)?;
            result.imported.iter().for_each(print_summary);
            imported += result.imported.len();
            failed += result.failed.len();
            anomalies += result.anomaly_count();
        } else {
            match project.import_file(&path) {
                Ok(summary) => {
                    print_summary(&summary);
                    imported += 1;
                    anomalies += summary.anomalies.len();
                }
                Err(e) => {
                    error!("{:#}", e);
                    failed += 1;
                }
            }
        }
    }

    info!("{} assets registered", project.server().registered_count());
    println!("{imported} imported, {failed} failed, {anomalies} anomalies");
    if failed > 0 {
        bail!("{failed} file(s) failed to import");
    }
    Ok(())
}

fn print_summary(summary: &ImportSummary) {
    println!(
        "{} -> {} [{} {}] {} sub-objects, {} anomalies",
        summary.path.display(),
        summary.asset_id,
        summary.importer,
        summary.main_type.unwrap_or("nothing"),
        summary.sub_objects,
        summary.anomalies.len()
    );
}

fn run_shader(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let source_dir = path.parent().unwrap_or(Path::new("."));
    let mut diagnostics = Diagnostics::new();
    let shader = parse_shader(&text, source_dir, &mut diagnostics)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let json = serde_json::to_string_pretty(&shader).context("Failed to serialize shader")?;
    println!("{json}");
    Ok(())
}

fn run_settings(settings: &EditorSettings, path: Option<&Path>, write: bool) -> Result<()> {
    print!("{}", toml::to_string_pretty(settings).context("Failed to serialize settings")?);
    if write {
        match path {
            Some(path) => settings.save_to(path)?,
            None => settings.save()?,
        }
    }
    Ok(())
}
