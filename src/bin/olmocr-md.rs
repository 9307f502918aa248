//! CLI binary for olmocr-md.
//!
//! A thin shim over the library crate: validate the input path, ask before
//! replacing an existing `.md`, map flags to `ConversionConfig`, convert.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use olmocr_md::config::{
    DEFAULT_API_KEY, DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_TARGET_LONGEST_IMAGE_DIM,
};
use olmocr_md::{
    convert_to_file, decide_output, markdown_output_path, validate_input, AssumeYes,
    ConversionConfig, ConversionProgressCallback, OutputDecision, Pdf2MdError, ProgressCallback,
    PromptConfirm,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a bar anchored at the bottom plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the page currently in flight.
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
        })
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
        self.bar
            .suspend(|| println!("Processing {total_pages} pages..."));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        let secs = self.page_elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let secs = self.page_elapsed_secs();
        let msg = match error.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_conversion_complete(&self, _total_pages: usize) {
        self.bar.finish_and_clear();
    }
}

/// Line-oriented progress for `--no-progress`: no bar, just the page count
/// and one line per finished page.
struct PlainProgressCallback<W> {
    out: Mutex<W>,
}

impl<W: Write> PlainProgressCallback<W> {
    fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn line(&self, text: std::fmt::Arguments<'_>) {
        if let Ok(mut out) = self.out.lock() {
            let _ = writeln!(out, "{text}");
            let _ = out.flush();
        }
    }
}

impl<W: Write + Send> ConversionProgressCallback for PlainProgressCallback<W> {
    fn on_conversion_start(&self, total_pages: usize) {
        self.line(format_args!("Processing {total_pages} pages..."));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        self.line(format_args!("Page {page_num}/{total} done ({text_len} chars)"));
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.line(format_args!("Page {page_num}/{total} failed: {error}"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert next to the input (writes paper.md)
  olmocr-md paper.pdf

  # Replace an existing paper.md without asking
  olmocr-md --yes paper.pdf

  # Another OpenAI-compatible server
  olmocr-md --endpoint http://gpu-box:8000/v1 --model allenai/olmOCR-2-7B-1025-FP8 paper.pdf

  # A hosted provider through edgequake-llm
  olmocr-md --provider openai --model gpt-4.1-mini --prompt-file prompt.txt paper.pdf

ENVIRONMENT VARIABLES:
  OLMOCR_ENDPOINT       Chat-completions base URL
  OLMOCR_API_KEY        Bearer credential for the endpoint
  OLMOCR_MODEL          Model identifier
  OLMOCR_PROVIDER       edgequake-llm provider name
  PDFIUM_LIB_PATH       Path to libpdfium
  RUST_LOG              Log filter (overrides --verbose/--quiet)
"#;

/// Convert a PDF to Markdown with an olmOCR vision model.
#[derive(Parser, Debug)]
#[command(
    name = "olmocr-md",
    version,
    about = "Convert a PDF to Markdown with an olmOCR vision model",
    long_about = "Render every page of a PDF, send it to an olmOCR model behind an \
OpenAI-compatible chat-completions endpoint (LM Studio by default), and write the \
recognised text to <input>.md.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the input PDF.
    input: Option<PathBuf>,

    /// Write Markdown here instead of next to the input.
    #[arg(short, long, env = "OLMOCR_OUTPUT")]
    output: Option<PathBuf>,

    /// Overwrite an existing output file without asking.
    #[arg(short, long)]
    yes: bool,

    /// Chat-completions base URL.
    #[arg(long, env = "OLMOCR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Bearer credential for the endpoint.
    #[arg(long, env = "OLMOCR_API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    api_key: String,

    /// Model identifier.
    #[arg(long, env = "OLMOCR_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Use an edgequake-llm provider (openai, anthropic, gemini, ollama, lmstudio)
    /// instead of --endpoint.
    #[arg(long, env = "OLMOCR_PROVIDER")]
    provider: Option<String>,

    /// Longest edge of the rendered page image in pixels (64–4096).
    #[arg(long, env = "OLMOCR_TARGET_DIM", default_value_t = DEFAULT_TARGET_LONGEST_IMAGE_DIM,
          value_parser = clap::value_parser!(u32).range(64..=4096))]
    target_dim: u32,

    /// Max model output tokens per page.
    #[arg(long, env = "OLMOCR_MAX_TOKENS", default_value_t = 8000)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "OLMOCR_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Per-page inference timeout in seconds.
    #[arg(long, env = "OLMOCR_TIMEOUT", default_value_t = 600)]
    timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "OLMOCR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Text file with a replacement page prompt.
    #[arg(long, env = "OLMOCR_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long, env = "OLMOCR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose brings everything back.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    // ── Validate input ───────────────────────────────────────────────────
    let input = match validate_input(cli.input.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{} {}", red("Error:"), e);
            if matches!(e, Pdf2MdError::MissingInput) {
                eprintln!("Usage: olmocr-md /path/to/input.pdf");
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    // ── Overwrite guard ──────────────────────────────────────────────────
    let target = cli
        .output
        .clone()
        .unwrap_or_else(|| markdown_output_path(&input));
    let decision = if cli.yes {
        decide_output(&target, &mut AssumeYes)
    } else {
        decide_output(&target, &mut PromptConfirm::stdio())
    }
    .context("Failed to read overwrite confirmation")?;

    let output_path = match decision {
        OutputDecision::Write(path) => path,
        OutputDecision::Cancelled => {
            println!("Conversion cancelled.");
            return Ok(ExitCode::SUCCESS);
        }
    };

    if !cli.quiet {
        println!("Input PDF: {}", input.display());
        println!("Output Markdown: {}", output_path.display());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else if !cli.quiet {
        Some(
            Arc::new(PlainProgressCallback::new(io::stdout()))
                as Arc<dyn ConversionProgressCallback>,
        )
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run conversion ───────────────────────────────────────────────────
    let stats = convert_to_file(&input, &output_path, &config)
        .await
        .context("Conversion failed")?;

    if !cli.quiet {
        println!(
            "\nConversion complete! File saved at: {}",
            bold(&output_path.display().to_string())
        );
        eprintln!(
            "{}  {} pages  {}ms  {} tokens in / {} tokens out",
            green("✔"),
            stats.total_pages,
            stats.total_duration_ms,
            dim(&stats.total_input_tokens.to_string()),
            dim(&stats.total_output_tokens.to_string()),
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .endpoint(&cli.endpoint)
        .api_key(&cli.api_key)
        .model(&cli.model)
        .target_longest_image_dim(cli.target_dim)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .request_timeout_secs(cli.timeout);

    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref path) = cli.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?;
        builder = builder.prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed(cb: &PlainProgressCallback<Vec<u8>>) -> String {
        String::from_utf8(cb.out.lock().unwrap().clone()).unwrap()
    }

    #[test]
    fn plain_progress_reports_page_count() {
        let cb = PlainProgressCallback::new(Vec::new());
        cb.on_conversion_start(3);
        cb.on_page_start(1, 3);
        cb.on_page_complete(1, 3, 42);
        cb.on_conversion_complete(3);

        assert_eq!(
            printed(&cb),
            "Processing 3 pages...\nPage 1/3 done (42 chars)\n"
        );
    }

    #[test]
    fn plain_progress_reports_failure() {
        let cb = PlainProgressCallback::new(Vec::new());
        cb.on_conversion_start(2);
        cb.on_page_error(2, 2, "HTTP 500");

        assert!(printed(&cb).ends_with("Page 2/2 failed: HTTP 500\n"));
    }
}
