//! PDF loading and rasterisation via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which keeps
//! thread-local state and blocks for the whole render. Every pdfium call runs
//! on Tokio's blocking pool so the runtime stays responsive while a page is
//! being drawn.
//!
//! ## One page at a time
//!
//! Pages are rendered on demand, one per call, so page N+1 is never drawn
//! before page N has been answered by the model. Each call binds pdfium,
//! reopens the document and renders a single page; reopening is cheap next
//! to a VLM round-trip.

use crate::error::Pdf2MdError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::future::Future;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A paginated document that can render its pages to images.
///
/// [`PdfiumPageSource`] is the production implementation; tests substitute
/// in-memory sources.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Render 1-indexed `page_num` so that its longest edge is
    /// `target_longest_dim` pixels.
    fn render_page(
        &self,
        page_num: usize,
        target_longest_dim: u32,
    ) -> impl Future<Output = Result<DynamicImage, Pdf2MdError>> + Send;
}

/// A PDF on disk, rendered through pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumPageSource {
    path: PathBuf,
    password: Option<String>,
    page_count: usize,
}

impl PdfiumPageSource {
    /// Open `path`, check the `%PDF` magic bytes and count its pages.
    pub async fn open(path: impl AsRef<Path>, password: Option<&str>) -> Result<Self, Pdf2MdError> {
        let path = path.as_ref().to_path_buf();
        check_pdf_header(&path)?;

        let pwd = password.map(str::to_string);
        let (path, pwd, page_count) = tokio::task::spawn_blocking(move || {
            let count = count_pages_blocking(&path, pwd.as_deref())?;
            Ok::<_, Pdf2MdError>((path, pwd, count))
        })
        .await
        .map_err(|e| Pdf2MdError::Internal(format!("Page count task panicked: {}", e)))??;

        info!("PDF loaded: {} pages", page_count);
        Ok(Self {
            path,
            password: pwd,
            page_count,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageSource for PdfiumPageSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    async fn render_page(
        &self,
        page_num: usize,
        target_longest_dim: u32,
    ) -> Result<DynamicImage, Pdf2MdError> {
        if page_num == 0 || page_num > self.page_count {
            return Err(Pdf2MdError::PageOutOfRange {
                page: page_num,
                total: self.page_count,
            });
        }

        let path = self.path.clone();
        let password = self.password.clone();
        tokio::task::spawn_blocking(move || {
            render_page_blocking(&path, password.as_deref(), page_num, target_longest_dim)
        })
        .await
        .map_err(|e| Pdf2MdError::Internal(format!("Render task panicked: {}", e)))?
    }
}

/// Bind to the pdfium shared library.
///
/// Lookup order: `PDFIUM_LIB_PATH`, then the current directory, then the
/// system library search path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2MdError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(lib) if !lib.is_empty() => Pdfium::bind_to_library(&lib)
            .map_err(|e| Pdf2MdError::PdfiumBindingFailed(format!("{lib}: {e:?}")))?,
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Pdf2MdError::PdfiumBindingFailed(format!("{e:?}")))?,
    };
    Ok(Pdfium::new(bindings))
}

/// Reject files that are not PDFs before handing them to pdfium.
fn check_pdf_header(path: &Path) -> Result<(), Pdf2MdError> {
    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf2MdError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf2MdError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) if &magic == b"%PDF" => Ok(()),
        Ok(()) => Err(Pdf2MdError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("missing %PDF header (first bytes: {magic:?})"),
        }),
        Err(_) => Err(Pdf2MdError::CorruptPdf {
            path: path.to_path_buf(),
            detail: "file is shorter than a PDF header".to_string(),
        }),
    }
}

fn load_error(pdf_path: &Path, password: Option<&str>, e: PdfiumError) -> Pdf2MdError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Pdf2MdError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            Pdf2MdError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        Pdf2MdError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}

fn count_pages_blocking(pdf_path: &Path, password: Option<&str>) -> Result<usize, Pdf2MdError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(pdf_path, password, e))?;
    Ok(document.pages().len() as usize)
}

fn render_page_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    page_num: usize,
    target_longest_dim: u32,
) -> Result<DynamicImage, Pdf2MdError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(pdf_path, password, e))?;

    let pages = document.pages();
    let total = pages.len() as usize;
    if page_num == 0 || page_num > total {
        return Err(Pdf2MdError::PageOutOfRange {
            page: page_num,
            total,
        });
    }

    // Width target plus a height cap of the same size: portrait pages are
    // scaled down by the cap, so either way the longest edge lands on the
    // target.
    let render_config = PdfRenderConfig::new()
        .set_target_width(target_longest_dim as i32)
        .set_maximum_height(target_longest_dim as i32);

    let page = pages
        .get((page_num - 1) as u16)
        .map_err(|e| Pdf2MdError::RasterisationFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| Pdf2MdError::RasterisationFailed {
            page: page_num,
            detail: format!("{:?}", e),
        })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );
    Ok(image)
}
