//! Eager (full-document) conversion entry points.
//!
//! [`convert`] walks the document page by page, waits for every page, then
//! assembles the Markdown. Nothing is written until all pages are done, so a
//! failure on the last page loses the earlier ones; use
//! [`crate::stream::convert_stream`] to persist pages as they arrive.
//!
//! [`convert_to_file`] writes through a temporary file in the destination
//! directory and renames it into place, so the target is either the complete
//! new document or whatever was there before.

use crate::config::ConversionConfig;
use crate::error::Pdf2MdError;
use crate::output::{assemble_markdown, ConversionOutput, ConversionStats, PageOutput};
use crate::pipeline::extract::{self, ExtractionKind};
use crate::pipeline::llm::{InferenceBackend, InferenceClient};
use crate::pipeline::query;
use crate::pipeline::render::{PageSource, PdfiumPageSource};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every page of `source` with `client`, in page order.
///
/// This is the core of the library; [`convert_pdf`] and [`convert_to_file`]
/// wire in pdfium and the configured backend.
///
/// # Errors
/// The first page that fails to render, encode or come back from the model
/// aborts the run with that page's error.
pub async fn convert<S, C>(
    source: &S,
    client: &C,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdError>
where
    S: PageSource,
    C: InferenceClient,
{
    let total_start = Instant::now();
    let total_pages = source.page_count();
    info!("Processing {} pages", total_pages);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    let mut pages = Vec::with_capacity(total_pages);
    for page_num in 1..=total_pages {
        pages.push(process_page(source, client, page_num, total_pages, config).await?);
    }

    let markdown = assemble_markdown(&pages);
    let stats = ConversionStats {
        total_pages,
        total_input_tokens: pages.iter().map(|p| p.input_tokens as u64).sum(),
        total_output_tokens: pages.iter().map(|p| p.output_tokens as u64).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms: pages.iter().map(|p| p.render_duration_ms).sum(),
        inference_duration_ms: pages.iter().map(|p| p.inference_duration_ms).sum(),
    };

    info!(
        "Conversion complete: {} pages, {}ms total",
        total_pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total_pages);
    }

    Ok(ConversionOutput {
        markdown,
        pages,
        stats,
    })
}

/// Open the PDF at `input` with pdfium and convert it with the backend
/// selected by `config`.
pub async fn convert_pdf(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdError> {
    let input = input.as_ref();
    info!("Starting conversion: {}", input.display());

    let source = PdfiumPageSource::open(input, config.password.as_deref()).await?;
    let client = InferenceBackend::from_config(config)?;
    convert(&source, &client, config).await
}

/// Convert a PDF and write the Markdown to `output_path`.
pub async fn convert_to_file(
    input: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2MdError> {
    let output = convert_pdf(input, config).await?;
    write_markdown(output_path.as_ref(), &output.markdown)?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_pdf(input, config))
}

/// Write `markdown` as UTF-8 to `path`, replacing any existing file.
///
/// Atomic: the content lands in a temp file beside `path` first, which is
/// then persisted over it. An existing file keeps its permissions; a new one
/// gets the same mode `std::fs::write` would give it.
pub fn write_markdown(path: &Path, markdown: &str) -> Result<(), Pdf2MdError> {
    let write_err = |source: std::io::Error| Pdf2MdError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(".olmocr-md");
    // 0o666 goes through open(2), so the process umask still applies.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(parent).map_err(write_err)?;
    if let Ok(existing) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(write_err)?;
    }
    tmp.write_all(markdown.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    debug!("Wrote {} bytes to {}", markdown.len(), path.display());
    Ok(())
}

// ── Per-page processing ──────────────────────────────────────────────────

/// Render, query and extract one page, reporting to the progress callback.
pub(crate) async fn process_page<S, C>(
    source: &S,
    client: &C,
    page_num: usize,
    total_pages: usize,
    config: &ConversionConfig,
) -> Result<PageOutput, Pdf2MdError>
where
    S: PageSource,
    C: InferenceClient,
{
    if let Some(ref cb) = config.progress_callback {
        cb.on_page_start(page_num, total_pages);
    }

    let result = run_page(source, client, page_num, config).await;

    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(page) => cb.on_page_complete(page_num, total_pages, page.text.len()),
            Err(e) => cb.on_page_error(page_num, total_pages, &e.to_string()),
        }
    }
    result
}

async fn run_page<S, C>(
    source: &S,
    client: &C,
    page_num: usize,
    config: &ConversionConfig,
) -> Result<PageOutput, Pdf2MdError>
where
    S: PageSource,
    C: InferenceClient,
{
    let render_start = Instant::now();
    let image = source
        .render_page(page_num, config.target_longest_image_dim)
        .await?;
    let page_query = query::build_page_query(&image, page_num, config)?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let llm_start = Instant::now();
    let completion = client.complete(&page_query).await?;
    let inference_duration_ms = llm_start.elapsed().as_millis() as u64;

    let extraction = extract::extract_text(&completion.content);
    let kind = extraction.kind();
    match kind {
        ExtractionKind::JsonRendered => warn!(
            "Page {}: JSON response without '{}', using its text rendering",
            page_num,
            extract::NATURAL_TEXT_KEY
        ),
        ExtractionKind::Raw => warn!(
            "Page {}: response is neither JSON nor front matter, using it verbatim",
            page_num
        ),
        ExtractionKind::NaturalText | ExtractionKind::FrontMatterBody => {}
    }
    debug!(
        "Page {}: {:?}, {} input tokens, {} output tokens, {}ms",
        page_num,
        kind,
        completion.prompt_tokens,
        completion.completion_tokens,
        inference_duration_ms
    );

    Ok(PageOutput {
        page_num,
        text: extraction.into_text(),
        kind,
        input_tokens: completion.prompt_tokens,
        output_tokens: completion.completion_tokens,
        render_duration_ms,
        inference_duration_ms,
    })
}
