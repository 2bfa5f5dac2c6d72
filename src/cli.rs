use crate::{
    config::Config,
    document::to_document,
    file::FileRecord,
    report::Report,
    section::{Scalar, Section},
    util::ensure_dir,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "job-report")]
#[command(about = "Inspect persisted job execution reports")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./job-report.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the report, or one step of it, as a generic document.
    Show {
        #[arg(long)]
        report: PathBuf,
        #[arg(long)]
        step: Option<String>,
    },
    /// Print the output files recorded in the report.
    Files {
        #[arg(long)]
        report: PathBuf,
        #[arg(long)]
        step: Option<String>,
        #[arg(long, requires = "step")]
        module: Option<String>,
    },
    /// Print per-step status, modules, errors and skips.
    Summary {
        #[arg(long)]
        report: PathBuf,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let _guard = init_logging(&args, &cfg)?;

    match &args.cmd {
        Command::Show { report, step } => show(&cfg, report, step.as_deref()),
        Command::Files {
            report,
            step,
            module,
        } => files(&cfg, report, step.as_deref(), module.as_deref()),
        Command::Summary { report } => summary(&cfg, report),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["job-report.toml", "job-report.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let filter = log_filter(args.log_level.as_deref(), &cfg.logging.level);

    // stdout carries command output, so log lines go to stderr
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if cfg.logging.write_to_file && !cfg.logging.file_path.is_empty() {
        let path = Path::new(&cfg.logging.file_path);
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

/// `--log-level` wins over `RUST_LOG`, which wins over the config file.
fn log_filter(cli_level: Option<&str>, cfg_level: &str) -> EnvFilter {
    match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg_level)),
    }
}

fn print_json<T: Serialize>(cfg: &Config, value: &T) -> Result<()> {
    let out = if cfg.output.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}

fn show(cfg: &Config, path: &Path, step: Option<&str>) -> Result<()> {
    let report = Report::load_from(path)?;
    let doc = match step {
        Some(name) => {
            let section = report
                .retrieve_step(name)
                .ok_or_else(|| anyhow!("no step {name} in {}", path.display()))?;
            to_document(section)?
        }
        None => report.json()?,
    };
    print_json(cfg, &doc)
}

fn files(cfg: &Config, path: &Path, step: Option<&str>, module: Option<&str>) -> Result<()> {
    let report = Report::load_from(path)?;
    let found: Option<Vec<FileRecord>> = match (step, module) {
        (Some(step), Some(module)) => report.get_files_from_output_module(step, module),
        (Some(step), None) => report.get_all_files_from_step(step),
        _ => report.get_all_files(),
    };
    let found = found.ok_or_else(|| {
        anyhow!(
            "could not reconstruct output files from {}",
            path.display()
        )
    })?;
    info!("reconstructed {} files from {}", found.len(), path.display());
    print_json(cfg, &found)
}

#[derive(Debug, Serialize)]
struct StepSummary {
    step: String,
    status: i64,
    output_modules: Vec<String>,
    errors: Vec<ErrorGroupSummary>,
    skipped_files: i64,
    skipped_event_runs: usize,
}

#[derive(Debug, Serialize)]
struct ErrorGroupSummary {
    error_type: String,
    count: i64,
}

fn summary(cfg: &Config, path: &Path) -> Result<()> {
    let report = Report::load_from(path)?;
    let steps = report
        .step_names()
        .into_iter()
        .filter_map(|name| report.retrieve_step(name).map(|s| summarize_step(name, s)))
        .collect::<Vec<_>>();
    print_json(cfg, &steps)
}

fn summarize_step(name: &str, step: &Section) -> StepSummary {
    let output_modules: Vec<String> = step
        .list("outputModules")
        .unwrap_or_default()
        .iter()
        .filter_map(Scalar::as_str)
        .map(str::to_string)
        .collect();

    let errors: Vec<ErrorGroupSummary> = step
        .section("errors")
        .map(|errors| {
            errors
                .section_names()
                .map(|error_type| ErrorGroupSummary {
                    error_type: error_type.to_string(),
                    count: errors
                        .section(error_type)
                        .and_then(|g| g.int("errorCount"))
                        .unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    let skipped = step.section("skipped");
    StepSummary {
        step: name.to_string(),
        status: step.int("status").unwrap_or(0),
        output_modules,
        errors,
        skipped_files: skipped
            .and_then(|s| s.section("files"))
            .and_then(|f| f.int("fileCount"))
            .unwrap_or(0),
        skipped_event_runs: skipped
            .and_then(|s| s.section("events"))
            .map(|e| e.section_names().count())
            .unwrap_or(0),
    }
}
