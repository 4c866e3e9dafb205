//! CLI binary for artmerge.
//!
//! A thin shim over the library crate that maps CLI flags to `MergeConfig`,
//! writes the artifacts, and renders progress.

use anyhow::{Context, Result};
use artmerge::{
    process_bytes, produce_image_bundle, save_artifact, ImageExtraction, MergeConfig,
    MergeProgressCallback, ProgressCallback, QuoteMode, Stage, ValidityGate, BUNDLE_ARCHIVE_NAME,
    OUTPUT_CSV_NAME,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: stage lines during processing, a live bar during the
/// sequential image-download loop.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// The bar starts as a spinner; the first per-fetch event resizes it to
    /// the actual reference count.
    fn new() -> std::sync::Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Processing");
        bar.enable_steady_tick(Duration::from_millis(80));

        std::sync::Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        if self.bar.length() == Some(total as u64) {
            return;
        }
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Downloading");
    }
}

impl MergeProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: Stage) {
        self.bar.set_message(stage.to_string());
        if stage == Stage::Complete {
            self.bar.println(format!("{} {}", cyan("◆"), dim(&stage.to_string())));
        }
    }

    fn on_fetch_start(&self, index: usize, total: usize) {
        self.activate_bar(total);
        self.bar.set_message(format!("image {index} of {total}"));
    }

    fn on_fetch_complete(&self, index: usize, total: usize, bytes: usize) {
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{:>7} bytes", bytes)),
        ));
        self.bar.inc(1);
    }

    fn on_fetch_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_bundle_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} images downloaded",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} images downloaded  ({} failed)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Produce indesign-ready.csv from an Airtable export
  artmerge export.csv --base-path "/Volumes/Drive/Appraisals/NY/BLAK202501"

  # Also download the referenced images into thumbs.zip
  artmerge export.csv --base-path "$BASE" --images

  # Project-code fallback for rows without a Project ID column
  artmerge export.csv --base-path "$BASE" --project-code KOZL202501

  # Per-project folder layout: {base}/{project}/thumbs/{file}
  artmerge export.csv --base-path "$BASE" --project-folders --images

  # Layout template that requires every field quoted
  artmerge export.csv --base-path "$BASE" --quote-all

  # Machine-readable run summary
  artmerge export.csv --base-path "$BASE" --json

OUTPUT LAYOUT:
  indesign-ready.csv   fixed display columns + @imageFilePath, UTF-8, no BOM
  thumbs.zip           one thumbs/{Artist}_{Title}[_N].jpg entry per fetched
                       image; extract it at the --base-path location

The @imageFilePath column points at {base}/thumbs/{file} (or
{base}/{project}/thumbs/{file} with --project-folders), so InDesign finds
the images once the zip is extracted in place.
"#;

/// Prepare collections-management CSV exports for InDesign data merge.
#[derive(Parser, Debug)]
#[command(
    name = "artmerge",
    version,
    about = "Reshape artwork CSV exports for InDesign data merge and bundle their images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// The exported CSV file.
    input: PathBuf,

    /// Base storage path the image file paths are rooted at. Required.
    #[arg(short, long, env = "ARTMERGE_BASE_PATH")]
    base_path: String,

    /// Fallback project code for rows without a project column.
    #[arg(short, long, env = "ARTMERGE_PROJECT_CODE")]
    project_code: Option<String>,

    /// Write the table here instead of ./indesign-ready.csv.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also fetch the referenced images and write the zip bundle.
    #[arg(long)]
    images: bool,

    /// Write the image bundle here instead of ./thumbs.zip.
    #[arg(long, requires = "images")]
    bundle_output: Option<PathBuf>,

    /// Insert a {project}/ segment between the base path and thumbs/.
    #[arg(long)]
    project_folders: bool,

    /// Legacy validity gate: keep rows with Artist OR Title (default: AND).
    #[arg(long)]
    legacy_validity: bool,

    /// Legacy extraction: only the first image URL per row (default: all).
    #[arg(long)]
    first_image_only: bool,

    /// Quote every output field (some layout templates require this).
    #[arg(long)]
    quote_all: bool,

    /// Disable the doubled-quote repair pre-pass.
    #[arg(long)]
    no_repair_quotes: bool,

    /// Per-image download timeout in seconds.
    #[arg(long, env = "ARTMERGE_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Print the run summary as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };

    let mut builder = MergeConfig::builder()
        .base_path(&cli.base_path)
        .project_folders(cli.project_folders)
        .repair_quotes(!cli.no_repair_quotes)
        .download_timeout_secs(cli.download_timeout);
    if let Some(ref code) = cli.project_code {
        builder = builder.project_code(code.clone());
    }
    if cli.legacy_validity {
        builder = builder.validity(ValidityGate::RequireEither);
    }
    if cli.first_image_only {
        builder = builder.extraction(ImageExtraction::FirstOnly);
    }
    if cli.quote_all {
        builder = builder.quoting(QuoteMode::Always);
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Process ──────────────────────────────────────────────────────────
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let output = process_bytes(&bytes, &config).context("Processing failed")?;

    let csv_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(OUTPUT_CSV_NAME));
    save_artifact(output.csv.as_bytes(), &csv_path)
        .await
        .context("Failed to write output table")?;

    // ── Optional image bundle ────────────────────────────────────────────
    let bundle = if cli.images && !output.images.is_empty() {
        let bundle = produce_image_bundle(&output.images, &config)
            .await
            .context("Image bundle failed")?;
        let zip_path = cli
            .bundle_output
            .clone()
            .unwrap_or_else(|| PathBuf::from(BUNDLE_ARCHIVE_NAME));
        save_artifact(&bundle.archive, &zip_path)
            .await
            .context("Failed to write image bundle")?;
        Some((bundle, zip_path))
    } else {
        if cli.images && !cli.quiet {
            eprintln!("{} No image URLs found; skipping bundle", cyan("◆"));
        }
        None
    };

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        let summary = serde_json::json!({
            "stats": output.stats,
            "csv": csv_path,
            "bundle": bundle.as_ref().map(|(b, path)| serde_json::json!({
                "path": path,
                "succeeded": b.succeeded,
                "failed": b.failed,
            })),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !cli.quiet {
        eprintln!(
            "{} {} rows processed, {} valid, {} images  →  {}",
            green("✔"),
            output.stats.total_rows,
            bold(&output.stats.valid_rows.to_string()),
            output.stats.images_found,
            bold(&csv_path.display().to_string()),
        );
        eprintln!("   projects: {}", dim(&output.stats.projects.join(", ")));
        if let Some((bundle, zip_path)) = bundle {
            eprintln!("   bundle: {}", bold(&zip_path.display().to_string()));
            eprintln!("{}", bundle.status);
        }
    }

    Ok(())
}
