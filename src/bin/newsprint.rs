//! CLI binary for vintage-newsprint.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `NewspaperSurface` and `CaptureOptions`, captures once, and saves the PNG.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vintage_newsprint::{
    prepare_photo, resolve_upload, CaptureError, CaptureObserver, CaptureOptions, Capturer, Color,
    CrossOriginMode, DateMode, DirectoryDownloads, FontBook, Geometry, NewspaperSurface,
    ObserverRef, SavedArtifact, Surface,
};

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

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner while the capture runs, then a one-line
/// result. The failure notice is always printed, with or without spinner.
struct CliObserver {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl CliObserver {
    fn new(show_spinner: bool, quiet: bool) -> Arc<Self> {
        let bar = show_spinner.then(|| {
            let bar = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Preparing");
            bar
        });
        Arc::new(Self { bar, quiet })
    }

    fn set_message(&self, msg: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(msg.to_string());
        }
    }

    fn println(&self, line: String) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl CaptureObserver for CliObserver {
    fn on_capture_start(&self) {
        if let Some(bar) = &self.bar {
            bar.set_prefix("Capturing");
            bar.set_message("rasterising front page…");
            bar.enable_steady_tick(Duration::from_millis(80));
        }
    }

    fn on_capture_complete(&self, saved: &SavedArtifact) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        if self.quiet {
            return;
        }
        eprintln!(
            "{} {}  {}  {}",
            green("✔"),
            bold(&saved.file_name),
            dim(&format!("{}x{} px, {} bytes", saved.width, saved.height, saved.bytes)),
            dim(&format!("{:.1}s", saved.duration_ms as f64 / 1000.0)),
        );
    }

    fn on_capture_failed(&self, notice: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
        eprintln!("{} {}", red("✘"), notice);
    }
}

const AFTER_HELP: &str = r##"EXAMPLES:
  # Default front page, saved to the current directory
  newsprint

  # Headline, reporter and a photo
  newsprint --headline "ঢাকায় বিজয়ের উল্লাস" --reporter "রহিম" --photo crowd.jpg

  # Today's date instead of 16 December 1971, into ./out
  newsprint --date current --out-dir out

  # Photo from a URL; accept it even without a CORS header
  newsprint --photo https://example.com/p.jpg --cross-origin trust

  # Options from a JSON file, result as JSON
  newsprint --options capture.json --json

  # Bengali text with a specific font file
  newsprint --font NotoSerifBengali-Regular.ttf --font NotoSerifBengali-Bold.ttf

OPTIONS FILE (all fields optional):
  {
    "scale": 3.0,
    "background": "#f0f0eb",
    "cross_origin": "cors",
    "file_prefix": "BijoyBarta",
    "default_name": "71"
  }

CROSS-ORIGIN PHOTOS:
  deny    refuse every downloaded photo
  cors    accept downloaded photos only when the server sent
          Access-Control-Allow-Origin (default)
  trust   accept every photo

  A refused photo fails the capture; the page is not saved.

FONTS:
  Noto Sans is built in. An installed Bengali family (Noto Serif Bengali,
  Noto Sans Bengali, Kalpurush, SolaimanLipi, ...) is picked up
  automatically; --font files go in front of it, first flag first.
  Characters no font covers are drawn as boxes showing their code point.
  --no-system-fonts makes the output identical on every machine.

ENVIRONMENT VARIABLES:
  Every flag reads NEWSPRINT_<FLAG> (e.g. NEWSPRINT_SCALE, NEWSPRINT_OUT_DIR).
  RUST_LOG overrides the log filter.
"##;

/// Compose a vintage Bengali front page and save it as a PNG.
#[derive(Parser, Debug)]
#[command(
    name = "newsprint",
    version,
    about = "Compose a vintage Bengali front page and save it as a PNG",
    long_about = "Lay out a 1971-style Bengali newspaper front page with your headline, \
reporter name, location and an optional photo (grayscale + sepia), then capture it at a \
fixed 550 px layout width as a high-resolution PNG.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Headline text (at most 30 characters are kept).
    #[arg(long, env = "NEWSPRINT_HEADLINE")]
    headline: Option<String>,

    /// Reporter name; also names the output file.
    #[arg(short, long, env = "NEWSPRINT_REPORTER")]
    reporter: Option<String>,

    /// Location shown in the dateline.
    #[arg(short, long, env = "NEWSPRINT_LOCATION")]
    location: Option<String>,

    /// Dateline: historical (16 December 1971) or current (today).
    #[arg(long, env = "NEWSPRINT_DATE", value_enum, default_value = "historical")]
    date: DateArg,

    /// Photo file path or HTTP/HTTPS URL.
    #[arg(short, long, env = "NEWSPRINT_PHOTO")]
    photo: Option<String>,

    /// Output pixel density multiplier (0 < scale ≤ 8).
    #[arg(long, env = "NEWSPRINT_SCALE")]
    scale: Option<f32>,

    /// Paper colour behind the page, as #rrggbb.
    #[arg(long, env = "NEWSPRINT_BACKGROUND")]
    background: Option<String>,

    /// Treatment of downloaded photos: deny, cors, trust.
    #[arg(long, env = "NEWSPRINT_CROSS_ORIGIN", value_enum)]
    cross_origin: Option<CrossOriginArg>,

    /// File name prefix.
    #[arg(long, env = "NEWSPRINT_PREFIX")]
    prefix: Option<String>,

    /// Directory the PNG is saved into.
    #[arg(short, long, env = "NEWSPRINT_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// JSON file with capture options; flags override its fields.
    #[arg(long, env = "NEWSPRINT_OPTIONS")]
    options: Option<PathBuf>,

    /// Font file (TTF, OTF or collection) to draw text with. Repeatable.
    #[arg(long = "font", value_name = "PATH", env = "NEWSPRINT_FONT", value_delimiter = ',')]
    fonts: Vec<PathBuf>,

    /// Skip installed fonts; use only the built-in and --font faces.
    #[arg(long, env = "NEWSPRINT_NO_SYSTEM_FONTS")]
    no_system_fonts: bool,

    /// Viewport width in px; picks the responsive breakpoint.
    #[arg(long, env = "NEWSPRINT_VIEWPORT_WIDTH", default_value_t = 1280.0)]
    viewport_width: f32,

    /// On-screen zoom of the page before capture. Does not affect the PNG.
    #[arg(long, env = "NEWSPRINT_DISPLAY_SCALE")]
    display_scale: Option<f32>,

    /// HTTP photo download timeout in seconds.
    #[arg(long, env = "NEWSPRINT_DOWNLOAD_TIMEOUT", default_value_t = 30)]
    download_timeout: u64,

    /// Print the saved artifact as JSON on stdout.
    #[arg(long, env = "NEWSPRINT_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "NEWSPRINT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "NEWSPRINT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "NEWSPRINT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum DateArg {
    Historical,
    Current,
}

impl From<DateArg> for DateMode {
    fn from(v: DateArg) -> Self {
        match v {
            DateArg::Historical => DateMode::Historical,
            DateArg::Current => DateMode::Current,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CrossOriginArg {
    Deny,
    Cors,
    Trust,
}

impl From<CrossOriginArg> for CrossOriginMode {
    fn from(v: CrossOriginArg) -> Self {
        match v {
            CrossOriginArg::Deny => CrossOriginMode::Deny,
            CrossOriginArg::Cors => CrossOriginMode::Cors,
            CrossOriginArg::Trust => CrossOriginMode::Trust,
        }
    }
}

/// Built-in faces, installed Bengali faces, then `--font` files in front.
fn build_fonts(cli: &Cli) -> Result<FontBook> {
    let mut book = if cli.no_system_fonts {
        FontBook::bundled()
    } else {
        FontBook::discover()
    };
    for path in cli.fonts.iter().rev() {
        book = book
            .with_file(path)
            .with_context(|| format!("Cannot use --font {}", path.display()))?;
    }
    Ok(book)
}

/// Whether a failed download was already reported by the observer's notice.
/// Such failures end the process with a plain non-zero exit code.
fn reported_by_notice(err: &CaptureError) -> bool {
    !matches!(err, CaptureError::CaptureInProgress)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep INFO logs out of
    // its way unless asked for.
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
        .with_writer(io::stderr)
        .init();

    let options = build_options(&cli).await?;

    // ── Compose the page ─────────────────────────────────────────────────
    let observer = CliObserver::new(show_progress, cli.quiet);
    let fonts = build_fonts(&cli)?;
    let mut page = NewspaperSurface::new()
        .with_viewport(cli.viewport_width)
        .with_fonts(fonts);
    if let Some(ref headline) = cli.headline {
        page.set_headline(headline);
    }
    page.set_reporter(cli.reporter.as_deref());
    page.set_location(cli.location.as_deref());
    page.set_date_mode(cli.date.into());

    if let Some(ref source) = cli.photo {
        observer.set_message("loading photo…");
        match resolve_upload(source, cli.download_timeout).await {
            Ok(upload) => {
                let photo = prepare_photo(Some(&upload));
                if photo.is_none() && !cli.quiet {
                    observer.println(format!(
                        "{} photo could not be decoded, using placeholder",
                        cyan("⚠")
                    ));
                }
                page.set_photo(photo);
            }
            Err(e) => {
                if !cli.quiet {
                    observer.println(format!("{} {}  {}", cyan("⚠"), e, dim("(placeholder used)")));
                }
            }
        }
    }

    if let Some(s) = cli.display_scale {
        page.set_geometry(Geometry::scaled(s));
    }

    // ── Capture and save ─────────────────────────────────────────────────
    let capturer = Capturer::new().with_observer(observer.clone() as ObserverRef);
    let trigger = DirectoryDownloads::new(&cli.out_dir);

    let saved = match capturer.download(&mut page, &options, &trigger).await {
        Ok(saved) => saved,
        Err(e) if reported_by_notice(&e) => return Ok(ExitCode::FAILURE),
        Err(e) => return Err(e).context("Capture failed"),
    };
    tracing::debug!(geometry = ?page.geometry(), "Display geometry after capture");

    if cli.json {
        let json = serde_json::to_string_pretty(&saved).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!("   →  {}", bold(&saved.location));
    }

    Ok(ExitCode::SUCCESS)
}

/// Map CLI args (and the optional options file) to `CaptureOptions`.
async fn build_options(cli: &Cli) -> Result<CaptureOptions> {
    let mut options = if let Some(ref path) = cli.options {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read options from {:?}", path))?;
        CaptureOptions::from_json(&json).context("Invalid options file")?
    } else {
        CaptureOptions::default()
    };

    if let Some(scale) = cli.scale {
        options.scale = scale;
    }
    if let Some(ref bg) = cli.background {
        options.background = bg
            .parse::<Color>()
            .map_err(anyhow::Error::msg)
            .context("Invalid --background")?;
    }
    if let Some(mode) = cli.cross_origin {
        options.cross_origin = mode.into();
    }
    if let Some(ref prefix) = cli.prefix {
        options.file_prefix = prefix.clone();
    }

    options.validate().context("Invalid configuration")?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_failures_exit_without_a_second_message() {
        let save = CaptureError::SaveFailed {
            file_name: "BijoyBarta-71.png".into(),
            reason: "Not a directory".into(),
        };
        assert!(reported_by_notice(&save));
        assert!(reported_by_notice(&CaptureError::TaintedImage {
            url: "https://x.test/p.jpg".into()
        }));
        assert!(!reported_by_notice(&CaptureError::CaptureInProgress));
    }

    #[test]
    fn after_help_lists_the_options_file() {
        assert!(AFTER_HELP.contains(r##""background": "#f0f0eb""##));
        assert!(AFTER_HELP.trim_end().ends_with("RUST_LOG overrides the log filter."));
    }

    #[test]
    fn font_flags_are_collected_in_order() {
        let cli = Cli::try_parse_from([
            "newsprint",
            "--font",
            "a.ttf",
            "--font",
            "b.otf",
            "--no-system-fonts",
        ])
        .unwrap();
        assert_eq!(cli.fonts, vec![PathBuf::from("a.ttf"), PathBuf::from("b.otf")]);
        assert!(cli.no_system_fonts);
    }

    #[test]
    fn unreadable_font_stops_before_capture() {
        let cli = Cli::try_parse_from([
            "newsprint",
            "--no-system-fonts",
            "--font",
            "/definitely/not/here.ttf",
        ])
        .unwrap();
        let err = build_fonts(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("here.ttf"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
