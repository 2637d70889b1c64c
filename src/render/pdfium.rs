// Phase 4: pdfium-render wrapper: page -> RgbImage (in-memory only)

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use image::RgbImage;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::GaitError;

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
///
/// `Ok(None)` means neither is present and the system library should be used.
fn resolve_pdfium_lib_path() -> crate::error::Result<Option<PathBuf>> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(Some(p));
        }
        return Err(GaitError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{path}' but the path does not exist"
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(Some(vendor_path));
        }
    }

    Ok(None)
}

/// Resolution every chart page is rendered at. The layout's crop rectangles
/// and calibration scales are expressed in pixels of a bitmap at this DPI.
pub const RENDER_DPI: u32 = 300;

/// pdfium is not thread-safe: library init/teardown and every document call
/// happen while this lock is held.
static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

fn lock_pdfium() -> crate::error::Result<MutexGuard<'static, ()>> {
    PDFIUM_LOCK
        .lock()
        .map_err(|_| GaitError::render("pdfium lock poisoned by a panicked render"))
}

/// Creates a new Pdfium instance by dynamically loading the shared library.
fn create_pdfium() -> crate::error::Result<Pdfium> {
    let bindings = match resolve_pdfium_lib_path()? {
        Some(lib_path) => {
            let lib_path_str = lib_path.to_str().ok_or_else(|| {
                GaitError::render("pdfium library path contains non-UTF-8 characters")
            })?;
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| {
        GaitError::render(format!(
            "pdfium library not found ({e}): set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium in vendor/pdfium/lib/"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Render one page of an already opened document to an RGB bitmap.
fn render_document_page(
    document: &PdfDocument<'_>,
    page_index: u32,
    dpi: u32,
) -> crate::error::Result<RgbImage> {
    let total = u32::from(document.pages().len());
    if page_index >= total {
        return Err(GaitError::PageOutOfRange {
            page: page_index,
            total,
        });
    }
    let page_index_u16 = u16::try_from(page_index)
        .map_err(|_| GaitError::render("page index exceeds u16 range"))?;

    let page = document.pages().get(page_index_u16)?;

    // PDF default user unit: 1 point = 1/72 inch
    let width_px = (page.width().value * dpi as f32 / 72.0).round() as i32;
    let height_px = (page.height().value * dpi as f32 / 72.0).round() as i32;

    let config = PdfRenderConfig::new()
        .set_target_width(width_px)
        .set_target_height(height_px);

    let bitmap = page.render_with_config(&config)?;
    debug!(page = page_index, width_px, height_px, dpi, "rendered page");

    // alpha is discarded
    Ok(bitmap.as_image().to_rgb8())
}

fn check_dpi(dpi: u32) -> crate::error::Result<()> {
    if dpi == 0 {
        return Err(GaitError::render("dpi must be greater than zero"));
    }
    Ok(())
}

/// Renders a PDF page at the specified DPI.
///
/// # Arguments
/// * `pdf_path` - Path to the PDF file
/// * `page_index` - 0-indexed page number
/// * `dpi` - Resolution in dots per inch (72 DPI = 1 point per pixel)
///
/// # Errors
/// - `GaitError::PageOutOfRange` if the document has no such page
/// - `GaitError::RenderError` if pdfium cannot be initialized, the file cannot
///   be opened, or rendering fails
pub fn render_page(pdf_path: &Path, page_index: u32, dpi: u32) -> crate::error::Result<RgbImage> {
    check_dpi(dpi)?;
    let _guard = lock_pdfium()?;
    let pdfium = create_pdfium()?;
    let document = pdfium.load_pdf_from_file(pdf_path, None)?;
    render_document_page(&document, page_index, dpi)
}

/// Renders each page in `page_indices` from an in-memory PDF and hands every
/// bitmap to `on_page`, in order.
///
/// Rendering happens under the process-wide pdfium lock; `on_page` runs after
/// the lock is released, so callers may do heavy work per bitmap. Each bitmap
/// is dropped once `on_page` returns. The first error (from pdfium or from
/// `on_page`) stops the iteration.
pub fn render_pages<F>(
    pdf_bytes: &[u8],
    page_indices: &[u32],
    dpi: u32,
    mut on_page: F,
) -> crate::error::Result<()>
where
    F: FnMut(u32, RgbImage) -> crate::error::Result<()>,
{
    check_dpi(dpi)?;

    let bitmaps = {
        let _guard = lock_pdfium()?;
        let pdfium = create_pdfium()?;
        let document = pdfium.load_pdf_from_byte_slice(pdf_bytes, None)?;
        page_indices
            .iter()
            .map(|&idx| render_document_page(&document, idx, dpi).map(|bitmap| (idx, bitmap)))
            .collect::<crate::error::Result<Vec<_>>>()?
    };

    for (page_index, bitmap) in bitmaps {
        on_page(page_index, bitmap)?;
    }
    Ok(())
}
