//! CLI binary for cloudconvert-pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConverterConfig`, loads the credential, and reports progress.

use anyhow::{Context, Result};
use clap::Parser;
use cloudconvert_pdf::{
    convert_directory, ApiKey, ConversionProgressCallback, ConvertedFile, ConverterConfig,
    Endpoint, HttpClient, ProgressCallback, RunSummary, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── Progress reporting ───────────────────────────────────────────────────────

/// Terminal progress: one bar over the matched files, a spinner message for
/// the current stage, and a log line per converted file.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for BarProgress {
    fn on_run_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:32.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_files} files to convert"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, path: &Path) {
        self.bar.set_message(short_name(path));
    }

    fn on_stage(&self, path: &Path, stage: Stage) {
        self.bar
            .set_message(format!("{}  {}", short_name(path), dim(&stage.to_string())));
    }

    fn on_file_complete(&self, index: usize, total: usize, file: &ConvertedFile) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            file.output.display(),
            dim(&format!("{} bytes", file.bytes)),
        ));
        self.bar.inc(1);
    }

    fn on_file_skipped(&self, _index: usize, _total: usize, _path: &Path) {
        self.bar.inc(1);
    }

    fn on_run_complete(&self, _total: usize, _converted: usize) {
        self.bar.finish_and_clear();
    }
}

/// Plain status lines on stderr, used with `--no-progress`.
struct PlainProgress;

impl ConversionProgressCallback for PlainProgress {
    fn on_file_start(&self, index: usize, total: usize, path: &Path) {
        eprintln!("[{index}/{total}] {}", path.display());
    }

    fn on_stage(&self, _path: &Path, stage: Stage) {
        if stage != Stage::Uploading {
            eprintln!("{stage}");
        }
    }

    fn on_file_complete(&self, _index: usize, _total: usize, file: &ConvertedFile) {
        eprintln!("Converted and downloaded: {}", file.output.display());
    }
}

fn short_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Re-convert every .pdf under docs/ in place
  ccpdf docs/

  # Wait at most 5 minutes per file, machine-readable summary
  ccpdf --wait-timeout 300 --json docs/ > summary.json

ENVIRONMENT VARIABLES:
  CLOUDCONVERT_API_KEY    CloudConvert API key (required; may live in ./.env)
  CLOUDCONVERT_SANDBOX    Set to 1 to use the sandbox API
  CLOUDCONVERT_API_URL    Override the API base URL
  RUST_LOG                Override the log filter

NOTE:
  A file that already ends in .pdf is converted onto itself. The original is
  only replaced once the converted file has been downloaded completely.
"#;

/// Convert every .pdf file in a directory to .pdf format using CloudConvert.
#[derive(Parser, Debug)]
#[command(
    name = "ccpdf",
    version,
    about = "Convert every .pdf file in a directory to .pdf format using CloudConvert",
    long_about = "Recursively finds every .pdf file under DIRECTORY, sends each through a \
CloudConvert job (upload, convert to PDF, export), waits for it to finish and downloads the \
result next to the source file. Files are processed one at a time; the first failure stops \
the run.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory to walk.
    directory: PathBuf,

    /// Give up waiting for a conversion after this many seconds (0 = never).
    #[arg(long, env = "CCPDF_WAIT_TIMEOUT", default_value_t = 900)]
    wait_timeout: u64,

    /// Initial delay between status polls, in milliseconds.
    #[arg(long, env = "CCPDF_POLL_INTERVAL", default_value_t = 1000,
          value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "CCPDF_REQUEST_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    request_timeout: u64,

    /// Print the run summary as JSON on stdout.
    #[arg(long, env = "CCPDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "CCPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CCPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CCPDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar provides the per-file feedback, so library INFO logs
    // are muted while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Credential (before anything touches the directory) ───────────────
    let api_key = ApiKey::from_env().context("Cannot start without an API key")?;
    let endpoint = Endpoint::from_env();

    // ── Build config ─────────────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(BarProgress::new() as ProgressCallback)
    } else if !cli.quiet {
        Some(Arc::new(PlainProgress) as ProgressCallback)
    } else {
        None
    };
    let config = build_config(&cli, progress)?;

    let client =
        HttpClient::new(api_key, &endpoint, &config).context("Failed to build HTTP client")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = convert_directory(&client, &cli.directory, &config)
        .await
        .with_context(|| format!("Conversion of '{}' failed", cli.directory.display()))?;

    report(&cli, &summary)
}

/// Map CLI args to `ConverterConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConverterConfig> {
    let mut builder = ConverterConfig::builder()
        .wait_timeout_secs(cli.wait_timeout)
        .poll_interval_ms(cli.poll_interval)
        .request_timeout_secs(cli.request_timeout);

    // Keep the cap at least as long as the starting interval.
    let default_cap = cloudconvert_pdf::WaitPolicy::default().max_poll_interval;
    builder = builder.max_poll_interval_ms((default_cap.as_millis() as u64).max(cli.poll_interval));

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn report(cli: &Cli, summary: &RunSummary) -> Result<()> {
    if cli.json {
        let json =
            serde_json::to_string_pretty(summary).context("Failed to serialise summary")?;
        println!("{json}");
        return Ok(());
    }

    if !cli.quiet {
        eprintln!(
            "{} {}/{} files converted  {}  {}",
            green("✔"),
            bold(&summary.converted.len().to_string()),
            summary.matched,
            dim(&format!("{} bytes", summary.total_bytes())),
            dim(&format!("{}ms", summary.duration_ms)),
        );
    }
    Ok(())
}
