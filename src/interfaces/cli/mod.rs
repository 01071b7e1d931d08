pub mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::application::{ExportUseCase, InspectUseCase, WorkbenchUseCase};
use crate::domain::client_config::{ClientConfig, CsvMode};
use crate::domain::error::{AppError, Result};
use crate::domain::report::{AnalysisReport, CleanReport};
use crate::domain::session::{HistoryEntry, SessionState};
use crate::infrastructure::api_client::{CleanForgeApi, HttpApiClient};
use crate::infrastructure::config::{ConfigOverrides, ConfigService};

#[derive(Parser, Debug)]
#[command(
    name = "cleanforge",
    version,
    about = "Analyze, clean and export CSV datasets with a CleanForge service",
    long_about = "Uploads a CSV file to a CleanForge service and shows the quality report.\n\n\
                  CONFIGURATION:\n  \
                  cleanforge.toml, then CLEANFORGE_* environment variables (a .env file is read),\n  \
                  then command-line flags.\n\n\
                  EXAMPLES:\n  \
                  cleanforge analyze data.csv\n  \
                  cleanforge run data.csv --out exports/\n  \
                  cleanforge clean data.csv --escape --json"
)]
pub struct Cli {
    /// Base URL of the CleanForge service
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score a dataset and list semantic issues
    Analyze { file: PathBuf },
    /// Clean a dataset and save the cleaned preview as CSV
    Clean {
        file: PathBuf,
        #[command(flatten)]
        export: ExportArgs,
        /// Show the result without writing the CSV
        #[arg(long)]
        no_export: bool,
    },
    /// Analyze, clean and export in one session
    Run {
        file: PathBuf,
        #[command(flatten)]
        export: ExportArgs,
    },
    /// Row and column counts as seen by the service
    Upload { file: PathBuf },
    /// Column profile and quality score
    Profile { file: PathBuf },
    /// Semantic analysis only
    Semantic { file: PathBuf },
    /// Check that the service is up
    Health,
}

#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Directory the cleaned CSV is saved in
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Quote fields containing commas, quotes or line breaks
    #[arg(long)]
    pub escape: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let export = match &self.command {
            Command::Clean { export, .. } | Command::Run { export, .. } => Some(export),
            _ => None,
        };
        ConfigOverrides {
            api_url: self.api_url.clone(),
            request_timeout_secs: self.timeout,
            download_dir: export.and_then(|e| e.out.clone()),
            csv_mode: export.filter(|e| e.escape).map(|_| CsvMode::Escaped),
        }
    }

    pub fn load_config(&self) -> Result<ClientConfig> {
        let service = match &self.config {
            Some(path) => {
                if !path.is_file() {
                    return Err(AppError::ConfigError(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                ConfigService::with_file(path)
            }
            None => ConfigService::new(),
        };
        service.with_overrides(&self.overrides()).load()
    }
}

/// Parse arguments, run the command, map the outcome to an exit code
pub async fn run() -> ExitCode {
    ConfigService::load_dotenv();
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::from(2);
        }
    };
    tracing::debug!(api_url = %config.api_url, "Configuration loaded");

    let api: Arc<dyn CleanForgeApi + Send + Sync> = match HttpApiClient::new(config.clone()) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match execute(&cli, &config, api).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when the session ended with a visible failure.
pub async fn execute(
    cli: &Cli,
    config: &ClientConfig,
    api: Arc<dyn CleanForgeApi + Send + Sync>,
) -> Result<bool> {
    let mut out = String::new();
    let ok = match &cli.command {
        Command::Analyze { file } => analyze(&mut out, cli.json, api, file).await?,
        Command::Clean {
            file, no_export, ..
        } => {
            let export = (!no_export).then(|| ExportUseCase::from_config(config));
            clean(&mut out, cli.json, api, file, export.as_ref()).await?
        }
        Command::Run { file, .. } => {
            let export = ExportUseCase::from_config(config);
            run_session(&mut out, cli.json, api, file, &export).await?
        }
        Command::Upload { file } => {
            let summary = InspectUseCase::new(api).summary(file).await?;
            emit(&mut out, cli.json, &summary, render::render_upload_summary)?;
            true
        }
        Command::Profile { file } => {
            let report = InspectUseCase::new(api).profile(file).await?;
            emit(&mut out, cli.json, &report, render::render_profile)?;
            true
        }
        Command::Semantic { file } => {
            let analysis = InspectUseCase::new(api).semantic(file).await?;
            emit(&mut out, cli.json, &analysis, render::render_semantic)?;
            true
        }
        Command::Health => {
            let status = InspectUseCase::new(api).status().await?;
            emit(&mut out, cli.json, &status, |s| format!("{}\n", s.message))?;
            true
        }
    };
    print!("{}", out);
    Ok(ok)
}

fn emit<T: Serialize>(
    out: &mut String,
    as_json: bool,
    value: &T,
    render: impl Fn(&T) -> String,
) -> Result<()> {
    if as_json {
        out.push_str(&to_json(value)?);
        out.push('\n');
    } else {
        out.push_str(&render(value));
    }
    Ok(())
}

/// `--json` payload of `clean`
#[derive(Serialize)]
struct CleanOutput<'a> {
    clean: &'a CleanReport,
    export_path: Option<String>,
}

/// `--json` payload of `run`
#[derive(Serialize)]
struct RunOutput<'a> {
    analysis: Option<&'a AnalysisReport>,
    clean: Option<&'a CleanReport>,
    export_path: Option<String>,
    history: &'a [HistoryEntry],
}

/// Paths are printed lossily; a non-UTF-8 directory name is still valid.
fn display_path(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.display().to_string())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize output: {}", e)))
}

fn report_failure(state: &SessionState) -> bool {
    match state.error_message() {
        Some(message) => {
            eprintln!("{}", message);
            false
        }
        None => true,
    }
}

async fn analyze(
    out: &mut String,
    as_json: bool,
    api: Arc<dyn CleanForgeApi + Send + Sync>,
    file: &Path,
) -> Result<bool> {
    let mut bench = WorkbenchUseCase::new(api);
    bench.select_file(file)?;
    let state = bench.analyze().await?;
    if let Some(report) = state.analysis() {
        emit(out, as_json, report, render::render_analysis)?;
    }
    Ok(report_failure(state))
}

async fn clean(
    out: &mut String,
    as_json: bool,
    api: Arc<dyn CleanForgeApi + Send + Sync>,
    file: &Path,
    export: Option<&ExportUseCase>,
) -> Result<bool> {
    let mut bench = WorkbenchUseCase::new(api);
    bench.select_file(file)?;
    bench.clean().await?;
    if !report_failure(bench.state()) {
        return Ok(false);
    }

    let saved = match export {
        Some(export) => bench.export(export)?,
        None => None,
    };

    if let Some(cleaned) = bench.state().cleaned() {
        if as_json {
            let output = CleanOutput {
                clean: cleaned,
                export_path: display_path(saved.as_deref()),
            };
            out.push_str(&to_json(&output)?);
            out.push('\n');
        } else {
            out.push_str(&render::render_clean(None, cleaned));
            push_saved(out, saved.as_deref());
        }
    }
    Ok(true)
}

async fn run_session(
    out: &mut String,
    as_json: bool,
    api: Arc<dyn CleanForgeApi + Send + Sync>,
    file: &Path,
    export: &ExportUseCase,
) -> Result<bool> {
    let mut bench = WorkbenchUseCase::new(api);
    bench.select_file(file)?;

    bench.analyze().await?;
    if !report_failure(bench.state()) {
        return Ok(false);
    }
    let analysis = bench.state().analysis().cloned();

    bench.clean().await?;
    let cleaned_ok = report_failure(bench.state());
    let saved = if cleaned_ok { bench.export(export)? } else { None };

    let cleaned = bench.state().cleaned();
    if as_json {
        let output = RunOutput {
            analysis: analysis.as_ref(),
            clean: cleaned,
            export_path: display_path(saved.as_deref()),
            history: bench.history(),
        };
        out.push_str(&to_json(&output)?);
        out.push('\n');
    } else {
        if let Some(report) = &analysis {
            out.push_str(&render::render_analysis(report));
        }
        if let Some(cleaned) = cleaned {
            out.push('\n');
            out.push_str(&render::render_clean(
                analysis.as_ref().map(|a| a.quality_score),
                cleaned,
            ));
            push_saved(out, saved.as_deref());
        }
        let history = render::render_history(bench.history());
        if !history.is_empty() {
            out.push('\n');
            out.push_str(&history);
        }
    }
    Ok(cleaned_ok)
}

fn push_saved(out: &mut String, saved: Option<&Path>) {
    if let Some(path) = saved {
        out.push_str(&format!("\nSaved {}\n", path.display()));
    }
}
