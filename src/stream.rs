//! Streaming conversion API: emit pages as they complete.
//!
//! [`convert_stream`] yields one [`PageOutput`] per page, in page order, as
//! soon as that page's text is extracted. The stream ends after the first
//! error, so a caller that writes each item as it arrives keeps every page
//! finished before the failure.

use crate::config::ConversionConfig;
use crate::convert::process_page;
use crate::error::Pdf2MdError;
use crate::output::PageOutput;
use crate::pipeline::llm::InferenceClient;
use crate::pipeline::render::PageSource;
use futures::stream;
use tokio_stream::Stream;
use tracing::info;

/// Convert `source` page by page, yielding each page's output.
///
/// Page N+1 is not started until page N has been yielded and polled past.
/// After an `Err` item the stream terminates.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use olmocr_md::{convert_stream, ConversionConfig, InferenceBackend, PdfiumPageSource};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::default();
/// let source = PdfiumPageSource::open("paper.pdf", None).await?;
/// let client = InferenceBackend::from_config(&config)?;
///
/// let pages = convert_stream(&source, &client, &config);
/// futures::pin_mut!(pages);
/// while let Some(page) = pages.next().await {
///     let page = page?;
///     println!("page {}: {} chars", page.page_num, page.text.len());
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert_stream<'a, S, C>(
    source: &'a S,
    client: &'a C,
    config: &'a ConversionConfig,
) -> impl Stream<Item = Result<PageOutput, Pdf2MdError>> + 'a
where
    S: PageSource,
    C: InferenceClient,
{
    let total_pages = source.page_count();
    info!("Starting streaming conversion of {} pages", total_pages);
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    stream::unfold(Some(1usize), move |next| async move {
        let page_num = next?;
        if page_num > total_pages {
            if let Some(ref cb) = config.progress_callback {
                cb.on_conversion_complete(total_pages);
            }
            return None;
        }
        let result = process_page(source, client, page_num, total_pages, config).await;
        let next = result.is_ok().then_some(page_num + 1);
        Some((result, next))
    })
}
