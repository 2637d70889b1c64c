use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gait_report::config::job::JobFile;
use gait_report::config::merged::MergedConfig;
use gait_report::config::settings::Settings;
use gait_report::config::{self, load_layout, resolve_path};
use gait_report::pipeline::job_runner::JobConfig;
use gait_report::pipeline::orchestrator::run_all_jobs;
use gait_report::record::PatientRecord;
use gait_report::store::RecordSink;
use gait_report::store::sqlite::SqliteStore;

/// Extract clinical gait parameters from gait-analysis PDF reports.
#[derive(Parser, Debug)]
#[command(name = "gait_report", version, arg_required_else_help = true)]
struct Cli {
    /// Job files (YAML) listing `input` PDFs and their `subject_id`.
    #[arg(value_name = "JOBS_YAML")]
    job_files: Vec<PathBuf>,

    /// Process a single report instead of job files.
    #[arg(long, value_name = "PATH", requires = "subject", conflicts_with = "job_files")]
    pdf: Option<PathBuf>,

    /// Subject identifier for `--pdf`.
    #[arg(long, value_name = "ID", requires = "pdf")]
    subject: Option<String>,

    /// Settings file. Defaults to `settings.yaml` next to each job file.
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Print the assembled records as JSON instead of storing them.
    #[arg(long)]
    dry_run: bool,
}

/// One group of jobs sharing the same settings (and therefore the same database).
struct Batch {
    settings: Settings,
    jobs: Vec<JobConfig>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gait_report=info")),
        )
        .with_writer(io::stderr)
        .init();

    let batches = match collect_batches(&cli) {
        Ok(b) => b,
        Err(msg) => {
            eprintln!("ERROR: {msg}");
            return ExitCode::FAILURE;
        }
    };

    let mut has_error = false;
    let mut dry_run_records: Vec<PatientRecord> = Vec::new();

    for batch in &batches {
        let mut store;
        let sink: &mut dyn RecordSink = if cli.dry_run {
            &mut dry_run_records
        } else {
            store = match SqliteStore::open(&batch.settings.database) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!(
                        "ERROR: Failed to open database {}: {e}",
                        batch.settings.database.display()
                    );
                    has_error = true;
                    continue;
                }
            };
            &mut store
        };

        let results = match run_all_jobs(&batch.jobs, sink, batch.settings.parallel_workers) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("ERROR: {e}");
                has_error = true;
                continue;
            }
        };

        for (job, result) in batch.jobs.iter().zip(&results) {
            match result {
                Ok(job_result) => eprintln!(
                    "OK: {} -> {}{}",
                    job_result.input_path.display(),
                    job_result.record.subject_id,
                    if job_result.from_cache { " (cached)" } else { "" }
                ),
                Err(e) => {
                    eprintln!("ERROR: {} ({}): {e}", job.input_path.display(), job.subject_id);
                    has_error = true;
                }
            }
        }
    }

    if cli.dry_run {
        match serde_json::to_string_pretty(&dry_run_records) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("ERROR: Failed to serialize records: {e}");
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn load_settings(explicit: Option<&Path>, job_file: Option<&Path>) -> Result<Settings, String> {
    match (explicit, job_file) {
        (Some(path), _) => Settings::from_file(path)
            .map_err(|e| format!("Failed to load settings {}: {e}", path.display())),
        (None, Some(job_file)) => config::load_settings_for_job(job_file)
            .map_err(|e| format!("Failed to load settings for {}: {e}", job_file.display())),
        (None, None) => Ok(Settings::default()),
    }
}

/// Turn the command line into batches of ready-to-run jobs.
fn collect_batches(cli: &Cli) -> Result<Vec<Batch>, String> {
    if let (Some(pdf), Some(subject)) = (&cli.pdf, &cli.subject) {
        let settings = load_settings(cli.settings.as_deref(), None)?;
        let layout = load_layout(settings.layout.as_deref())
            .map_err(|e| format!("Failed to load layout: {e}"))?;
        let job = JobConfig {
            input_path: pdf.clone(),
            subject_id: subject.clone(),
            layout,
            cache_dir: settings.cache_dir.clone(),
        };
        return Ok(vec![Batch {
            settings,
            jobs: vec![job],
        }]);
    }

    if cli.job_files.is_empty() {
        return Err("no job files given (use JOBS_YAML... or --pdf with --subject)".to_string());
    }

    let mut batches = Vec::new();
    for job_file_path in &cli.job_files {
        let settings = load_settings(cli.settings.as_deref(), Some(job_file_path))?;
        let job_file = JobFile::from_file(job_file_path).map_err(|e| {
            format!("Failed to read job file {}: {e}", job_file_path.display())
        })?;

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        // The layout comes from settings, so every job of the file shares it.
        let layout = load_layout(settings.layout.as_deref())
            .map_err(|e| format!("Failed to load layout: {e}"))?;

        let jobs = job_file
            .jobs
            .iter()
            .map(|job| {
                let merged = MergedConfig::new(&settings, job);
                JobConfig {
                    input_path: resolve_path(&job_dir, &job.input),
                    subject_id: job.subject_id.clone(),
                    layout: Arc::clone(&layout),
                    cache_dir: merged.cache_dir,
                }
            })
            .collect();

        batches.push(Batch { settings, jobs });
    }
    Ok(batches)
}
