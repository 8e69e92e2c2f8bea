//! CLI binary for cards2docx.
//!
//! A thin shim over the library crate that loads a card manifest, maps CLI
//! flags to `ExportConfig` and prints results.

use anyhow::{Context, Result};
use cards2docx::pipeline::validate::invalid_card_count;
use cards2docx::{
    ExportConfig, ExportError, ExportProgressCallback, IngestOutcome,
    InspectionSession, Orientation, PageMargins, PageSize, ProgressCallback, DEFAULT_FILENAME,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Busy indicator using indicatif ───────────────────────────────────────────

/// Terminal busy indicator: a spinner that turns into a card counter once
/// the export starts, and disappears when it ends.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        Arc::new(Self { bar })
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_busy_start(&self, total_cards: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:30.green/238}] {pos:>3}/{len} cards  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_length(total_cards as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Exporting");
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn on_card_assembled(&self, _position: usize, _total: usize) {
        self.bar.inc(1);
    }

    fn on_image_skipped(&self, position: usize, error: &str) {
        self.bar.println(format!(
            "  {} Card {:>3}  photo left out: {}",
            yellow("⚠"),
            position,
            dim(error)
        ));
    }

    fn on_packed(&self, bytes: usize) {
        self.bar.set_message(format!("packed {} KiB, saving…", bytes / 1024));
    }

    fn on_busy_end(&self, _success: bool) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"MANIFEST FORMAT:
  {
    "cards": [
      { "serial_number": "A1", "location": "Room 1",
        "comments": "ok", "image": "photos/a1.jpg" }
    ]
  }
  Image paths are relative to the manifest file.

EXAMPLES:
  # Export to ./site_inspection.docx
  cards2docx cards.json

  # Custom output path
  cards2docx cards.json -o reports/inspection_report.docx

  # Check the cards without writing anything
  cards2docx --check cards.json

  # Three cards per column, no separator rule, 11 pt text
  cards2docx --cards-per-column 3 --cards-per-page 6 --no-separator --font-size 11 cards.json

  # Machine-readable report
  cards2docx --json cards.json > report.json
"#;

/// Export site-inspection cards to a Word document.
#[derive(Parser, Debug)]
#[command(
    name = "cards2docx",
    version,
    about = "Export site-inspection cards (photo, S/N, location, comments) to a Word document",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// JSON card manifest.
    manifest: PathBuf,

    /// Output .docx path. Default: ./site_inspection.docx
    #[arg(short, long, env = "CARDS2DOCX_OUTPUT")]
    output: Option<PathBuf>,

    /// Number of text columns per page.
    #[arg(long, env = "CARDS2DOCX_COLUMNS", default_value_t = 2,
          value_parser = clap::value_parser!(u16).range(1..=8))]
    columns: u16,

    /// Gap between columns in twips (1/1440 inch).
    #[arg(long, env = "CARDS2DOCX_COLUMN_SPACE", default_value_t = 708)]
    column_space: u32,

    /// Do not draw a rule between columns.
    #[arg(long, env = "CARDS2DOCX_NO_SEPARATOR")]
    no_separator: bool,

    /// Page margin on every side, in twips.
    #[arg(long, env = "CARDS2DOCX_MARGIN", default_value_t = 1440)]
    margin: i32,

    /// Paper size.
    #[arg(long, env = "CARDS2DOCX_PAPER", value_enum, default_value = "a4")]
    paper: PaperArg,

    /// Landscape pages.
    #[arg(long, env = "CARDS2DOCX_LANDSCAPE")]
    landscape: bool,

    /// Card text size in points.
    #[arg(long, env = "CARDS2DOCX_FONT_SIZE", default_value_t = 12)]
    font_size: usize,

    /// Photo display width in pixels.
    #[arg(long, env = "CARDS2DOCX_IMAGE_WIDTH", default_value_t = 280)]
    image_width: u32,

    /// Photo display height in pixels.
    #[arg(long, env = "CARDS2DOCX_IMAGE_HEIGHT", default_value_t = 210)]
    image_height: u32,

    /// Longest edge of embedded photo data; larger photos are downscaled.
    #[arg(long, env = "CARDS2DOCX_MAX_IMAGE_PIXELS", default_value_t = 1600)]
    max_image_pixels: u32,

    /// Cards per page before a page break.
    #[arg(long, env = "CARDS2DOCX_CARDS_PER_PAGE", default_value_t = 4)]
    cards_per_page: usize,

    /// Cards per column before a column break.
    #[arg(long, env = "CARDS2DOCX_CARDS_PER_COLUMN", default_value_t = 2)]
    cards_per_column: usize,

    /// Photos read concurrently while loading the manifest.
    #[arg(short, long, env = "CARDS2DOCX_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Validate the cards and report missing fields; write nothing.
    #[arg(long)]
    check: bool,

    /// Print a JSON export report on stdout.
    #[arg(long, env = "CARDS2DOCX_JSON")]
    json: bool,

    /// Disable the busy indicator.
    #[arg(long, env = "CARDS2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CARDS2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CARDS2DOCX_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PaperArg {
    A4,
    Letter,
}

impl From<PaperArg> for PageSize {
    fn from(v: PaperArg) -> Self {
        match v {
            PaperArg::A4 => PageSize::A4,
            PaperArg::Letter => PageSize::Letter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the spinner active, INFO logs would tear through it; keep them
    // for --no-progress runs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.check;
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
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExportProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Load cards ───────────────────────────────────────────────────────
    let loaded = InspectionSession::load_manifest(&cli.manifest, config.ingest_concurrency)
        .await
        .with_context(|| format!("Failed to load {}", cli.manifest.display()))?;
    let mut session = loaded.session;

    if !cli.quiet {
        for (id, outcome) in &loaded.images {
            if let IngestOutcome::Rejected(e) = outcome {
                let pos = session.position(*id).map(|p| p + 1).unwrap_or(0);
                eprintln!("  {} Card {:>3}  {}", yellow("⚠"), pos, e);
            }
        }
    }

    // ── Check-only mode ──────────────────────────────────────────────────
    if cli.check {
        let ok = session.validate();
        print_issues(&session);
        if !ok {
            anyhow::bail!("{} card(s) incomplete", invalid_card_count(session.cards()));
        }
        if !cli.quiet {
            eprintln!("{} {} cards complete", green("✔"), bold(&session.len().to_string()));
        }
        return Ok(());
    }

    // ── Run export ───────────────────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILENAME));

    let output = match session.export_to_file(&output_path, &config).await {
        Ok(output) => output,
        Err(e @ ExportError::ValidationFailed { .. }) => {
            print_issues(&session);
            return Err(e).context("Export refused");
        }
        Err(e) => return Err(e).context("Export failed"),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        let shown = output
            .location
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| output.filename.clone());
        eprintln!(
            "{}  {} cards  {} page(s)  {}ms  →  {}",
            if output.stats.images_skipped == 0 {
                green("✔")
            } else {
                yellow("⚠")
            },
            output.stats.total_cards,
            output.stats.pages,
            output.stats.total_duration_ms,
            bold(&shown),
        );
        if output.stats.images_skipped > 0 {
            eprintln!(
                "   {} photo(s) could not be embedded",
                red(&output.stats.images_skipped.to_string())
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExportConfig> {
    let filename = cli
        .output
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    let mut builder = ExportConfig::builder()
        .columns(cli.columns)
        .column_space(cli.column_space)
        .column_separator(!cli.no_separator)
        .margins(PageMargins::uniform(cli.margin.max(0)))
        .page_size(cli.paper.clone().into())
        .orientation(if cli.landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        })
        .font_size_pt(cli.font_size)
        .image_size(cli.image_width, cli.image_height)
        .max_image_pixels(cli.max_image_pixels)
        .cards_per_page(cli.cards_per_page)
        .cards_per_column(cli.cards_per_column)
        .ingest_concurrency(cli.concurrency)
        .filename(filename);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Render the validation marks, one line per missing field.
fn print_issues(session: &InspectionSession) {
    for issue in session.issues() {
        let card = &session.cards()[issue.position - 1];
        let sn = if card.serial_number.trim().is_empty() {
            String::new()
        } else {
            format!(" ({})", card.serial_number.trim())
        };
        eprintln!(
            "  {} Card {:>3}{}  {}: {}",
            red("✗"),
            issue.position,
            dim(&sn),
            issue.field.label(),
            issue.message
        );
    }
}

