use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod actions;
mod analysis;
mod cli_output;
mod config;
mod discovery;
mod document;
mod error;
mod fields;
mod matcher;
mod models;
mod naming;
mod report;
mod translate;
mod triggers;

use actions::ActionOperationAnalyzer;
use analysis::{DefinitionAnalyzer, FlowScanner};
use cli_output::{format_duration_ms, CommandResult, OutputMode, OutputWriter};
use config::Settings;
use error::AnalysisError;
use fields::{AnalysisScope, FieldDependencyAnalyzer};
use report::{print_matches, ReportRow};
use triggers::TriggerEventAnalyzer;

#[derive(Parser)]
#[command(name = "flowdeps")]
#[command(about = "Find which cloud flows in an unpacked solution depend on an entity, message or column", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Unpacked solution directory (default: solution_dir from config)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Output format (default: format from config)
    #[arg(short, long, global = true, value_parser = ["table", "json", "plain"])]
    format: Option<String>,

    /// Analyze files one at a time
    #[arg(long, global = true)]
    sequential: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Flows whose Dataverse trigger fires on an entity message
    TriggeredBy {
        /// Entity logical name (e.g. contact)
        #[arg(short, long)]
        entity: String,

        /// Message: Create, Update, Delete, ...
        #[arg(short, long)]
        message: String,
    },

    /// Actions that create, update, delete, list or get rows of an entity
    TriggersAction {
        /// Entity logical name (e.g. account)
        #[arg(short, long)]
        entity: String,

        /// Operation verb: create, update, delete, list or get
        #[arg(short, long)]
        action: String,
    },

    /// Triggers and actions that reference a column
    ColumnDependency {
        /// Entity logical name (e.g. account)
        #[arg(short, long)]
        entity: String,

        /// Column logical name (e.g. emailaddress1)
        #[arg(short, long)]
        column: String,

        /// Only evaluate actions of this type (e.g. OpenApiConnection)
        #[arg(short, long)]
        action: Option<String>,

        /// Search actions only
        #[arg(long, conflicts_with = "triggers_only")]
        actions_only: bool,

        /// Search triggers only
        #[arg(long)]
        triggers_only: bool,
    },

    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the current settings
    Show,
    /// Change one setting
    Set { key: String, value: String },
    /// Print the settings file location
    Path,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (settings, settings_warning) = Settings::load_or_default();
    let format = cli.format.clone().unwrap_or_else(|| settings.format.clone());
    let writer = OutputWriter::new(OutputMode::from_format(&format));

    // `config set` reloads the file itself and fails on a corrupt one.
    let updating = matches!(
        cli.command,
        Commands::Config {
            action: ConfigAction::Set { .. }
        }
    );
    if let Some(warning) = settings_warning.filter(|_| !updating) {
        warn!("{}", warning);
        writer.warning(&warning);
    }

    if let Err(e) = run(cli, settings, &writer) {
        writer.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Logs go to stderr; stdout carries results only.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli, settings: Settings, writer: &OutputWriter) -> Result<()> {
    let scanner = FlowScanner::new()
        .with_parallel(settings.parallel && !cli.sequential)
        .with_workflows_subdir(settings.workflows_subdir.clone());
    let solution_dir = cli.dir.clone().or_else(|| settings.solution_dir.clone());

    match cli.command {
        Commands::TriggeredBy { entity, message } => {
            let ctx = Request::new("triggered-by", solution_dir, &scanner, writer);
            ctx.run(|| TriggerEventAnalyzer::new(&entity, &message))
        }

        Commands::TriggersAction { entity, action } => {
            let ctx = Request::new("triggers-action", solution_dir, &scanner, writer);
            ctx.run(|| ActionOperationAnalyzer::new(&entity, &action))
        }

        Commands::ColumnDependency {
            entity,
            column,
            action,
            actions_only,
            triggers_only,
        } => {
            let ctx = Request::new("column-dependency", solution_dir, &scanner, writer);
            ctx.run(|| {
                let scope = AnalysisScope::from_flags(actions_only, triggers_only)?;
                Ok(FieldDependencyAnalyzer::new(&entity, &column)?
                    .with_action_type(action)
                    .with_scope(scope))
            })
        }

        Commands::Config { action } => run_config(action, settings, writer),
    }
}

fn run_config(action: ConfigAction, settings: Settings, writer: &OutputWriter) -> Result<()> {
    match action {
        ConfigAction::Show => {
            writer.section("flowdeps settings");
            writer.table(&settings.rows());
            writer.emit_result(&command_result("config show", 0, json!(settings), vec![], vec![]));
        }
        ConfigAction::Set { key, value } => {
            Settings::update(&key, &value)?;
            writer.success(&format!("Set {} = {}", key, value));
        }
        ConfigAction::Path => {
            let path = Settings::config_file_path()?;
            writer.info(&path.display().to_string());
            writer.emit_result(&command_result(
                "config path",
                0,
                json!({ "path": path }),
                vec![],
                vec![],
            ));
        }
    }
    Ok(())
}

/// One analysis command: where to look and how to report.
struct Request<'a> {
    command: &'static str,
    solution_dir: Option<PathBuf>,
    scanner: &'a FlowScanner,
    writer: &'a OutputWriter,
}

impl<'a> Request<'a> {
    fn new(
        command: &'static str,
        solution_dir: Option<PathBuf>,
        scanner: &'a FlowScanner,
        writer: &'a OutputWriter,
    ) -> Self {
        Self {
            command,
            solution_dir,
            scanner,
            writer,
        }
    }

    fn run<A, F>(&self, build: F) -> Result<()>
    where
        A: DefinitionAnalyzer,
        A::Match: ReportRow + Serialize,
        F: FnOnce() -> Result<A, AnalysisError>,
    {
        let start = Instant::now();
        let outcome = self.analyze(build);
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok((description, analysis)) => {
                for warning in &analysis.warnings {
                    self.writer.warning(warning);
                }

                if analysis.matches.is_empty() {
                    self.writer.warning(&format!("No {} found.", description));
                } else {
                    print_matches(self.writer, &analysis.matches);
                    self.writer.success(&format!(
                        "Found {} {} in {} file(s) ({})",
                        analysis.matches.len(),
                        description,
                        analysis.files_scanned,
                        format_duration_ms(duration_ms)
                    ));
                }

                let output = json!({
                    "request": description,
                    "files_scanned": analysis.files_scanned,
                    "files_skipped": analysis.files_skipped,
                    "matches": serde_json::to_value(&analysis.matches)?,
                });
                self.writer.emit_result(&command_result(
                    self.command,
                    duration_ms,
                    output,
                    vec![],
                    analysis.warnings,
                ));
                Ok(())
            }
            Err(e) => {
                self.writer.emit_result(&command_result(
                    self.command,
                    duration_ms,
                    serde_json::Value::Null,
                    vec![format!("{:#}", e)],
                    vec![],
                ));
                Err(e)
            }
        }
    }

    fn analyze<A, F>(&self, build: F) -> Result<(String, analysis::Analysis<A::Match>)>
    where
        A: DefinitionAnalyzer,
        F: FnOnce() -> Result<A, AnalysisError>,
    {
        let analyzer = build()?;
        let solution_dir = self.solution_dir.as_ref().ok_or_else(|| {
            anyhow!("No solution directory given. Pass --dir or run `flowdeps config set solution_dir <path>`")
        })?;

        let description = analyzer.describe();
        self.writer.info(&format!(
            "Searching {} in {}",
            description,
            solution_dir.display()
        ));
        debug!("Using solution directory {}", solution_dir.display());

        let analysis = self.scanner.scan_solution(&analyzer, solution_dir)?;
        Ok((description, analysis))
    }
}

fn command_result(
    command: &str,
    duration_ms: u64,
    output: serde_json::Value,
    errors: Vec<String>,
    warnings: Vec<String>,
) -> CommandResult {
    CommandResult {
        success: errors.is_empty(),
        command: command.to_string(),
        duration_ms,
        generated_at: chrono::Utc::now(),
        output,
        errors,
        warnings,
    }
}
