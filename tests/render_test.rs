// Phase 4: Render integration tests
//
// Tests for rendering PDF pages to RgbImage using pdfium-render.
// Test PDFs are dynamically generated with lopdf to avoid fixture files.
// Tests that need the pdfium library are skipped unless
// PDFIUM_DYNAMIC_LIB_PATH is set.

use std::path::PathBuf;

use gait_report::chart::segmenter::{CurveColor, segment};
use gait_report::error::GaitError;
use gait_report::render::pdfium::{render_page, render_pages};
use lopdf::{Document, Object, Stream, dictionary};

fn pdfium_available() -> bool {
    std::env::var("PDFIUM_DYNAMIC_LIB_PATH").is_ok()
}

/// Build a landscape Letter PDF (792x612 pt). `contents[i]` is the raw
/// content stream of page i.
fn create_landscape_pdf(contents: &[&[u8]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(792),
                Object::Integer(612),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {},
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("failed to serialize test PDF");
    bytes
}

fn write_pdf(dir: &tempfile::TempDir, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join("test.pdf");
    std::fs::write(&path, bytes).expect("failed to write test PDF");
    path
}

// ---- Test 1: Dimensions match DPI ----

/// At 300 DPI a landscape Letter page renders to 3300x2550 pixels.
#[test]
fn test_render_page_dimensions_at_300_dpi() {
    if !pdfium_available() {
        eprintln!("skipping: PDFIUM_DYNAMIC_LIB_PATH not set");
        return;
    }
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let pdf_path = write_pdf(&dir, &create_landscape_pdf(&[b""]));

    let image = render_page(&pdf_path, 0, 300).expect("render_page should succeed");
    assert_eq!(image.width(), 3300);
    assert_eq!(image.height(), 2550);
}

/// Rendering at 144 DPI should produce an image twice the size of 72 DPI.
#[test]
fn test_render_page_scales_with_dpi() {
    if !pdfium_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let pdf_path = write_pdf(&dir, &create_landscape_pdf(&[b""]));

    let image_72 = render_page(&pdf_path, 0, 72).expect("render at 72 DPI should succeed");
    let image_144 = render_page(&pdf_path, 0, 144).expect("render at 144 DPI should succeed");

    assert_eq!(image_72.dimensions(), (792, 612));
    assert_eq!(image_144.width(), image_72.width() * 2);
    assert_eq!(image_144.height(), image_72.height() * 2);
}

// ---- Test 2: Colors survive rendering ----

/// A red stroke drawn in the PDF is found again by the red segmenter.
#[test]
fn test_rendered_red_stroke_is_segmented() {
    if !pdfium_available() {
        return;
    }
    let pdf = create_landscape_pdf(&[b"1 0 0 RG 3 w 100 442 m 100 394 l S"]);

    let mut seen = Vec::new();
    render_pages(&pdf, &[0], 300, |page_index, bitmap| {
        let red = segment(&bitmap, CurveColor::Red);
        let blue = segment(&bitmap, CurveColor::Blue);
        seen.push((page_index, red.row_extent(), blue.is_empty()));
        Ok(())
    })
    .expect("render_pages should succeed");

    assert_eq!(seen.len(), 1);
    let (page_index, extent, no_blue) = seen[0];
    assert_eq!(page_index, 0);
    assert!(no_blue, "no blue pixels expected");
    let (top, bottom) = extent.expect("red stroke should be visible");
    // 442pt -> row 708, 394pt -> row 908 at 300 DPI
    assert!((705..=712).contains(&top), "top row {top}");
    assert!((904..=911).contains(&bottom), "bottom row {bottom}");
}

// ---- Test 3: Page order and errors ----

#[test]
fn test_render_pages_visits_requested_pages_in_order() {
    if !pdfium_available() {
        return;
    }
    let pdf = create_landscape_pdf(&[b"", b"", b""]);

    let mut visited = Vec::new();
    render_pages(&pdf, &[2, 0], 72, |page_index, _| {
        visited.push(page_index);
        Ok(())
    })
    .unwrap();
    assert_eq!(visited, vec![2, 0]);
}

#[test]
fn test_render_pages_stops_on_callback_error() {
    if !pdfium_available() {
        return;
    }
    let pdf = create_landscape_pdf(&[b"", b""]);

    let mut calls = 0;
    let result = render_pages(&pdf, &[0, 1], 72, |_, _| {
        calls += 1;
        Err(GaitError::render("stop"))
    });
    assert!(result.is_err());
    assert_eq!(calls, 1);
}

/// Rendering a page index beyond the document's page count should return an error.
#[test]
fn test_render_invalid_page_index() {
    if !pdfium_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let pdf_path = write_pdf(&dir, &create_landscape_pdf(&[b""]));

    let err = render_page(&pdf_path, 99, 72).unwrap_err();
    assert!(
        matches!(err, GaitError::PageOutOfRange { page: 99, total: 1 }),
        "got {err}"
    );
}

/// Rendering a nonexistent file should return an error.
#[test]
fn test_render_nonexistent_file() {
    if !pdfium_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let result = render_page(&dir.path().join("nonexistent_file.pdf"), 0, 72);
    assert!(result.is_err());
}

/// Rendering with dpi=0 fails before pdfium is touched.
#[test]
fn test_render_zero_dpi() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let pdf_path = write_pdf(&dir, &create_landscape_pdf(&[b""]));

    let result = render_page(&pdf_path, 0, 0);
    assert!(
        matches!(result, Err(GaitError::RenderError(_))),
        "render_page should fail when dpi is 0"
    );
}
