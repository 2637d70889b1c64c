// Phase 9: ジョブ単位: PDF読込 -> テキスト抽出 -> ページ描画・グラフ解析 -> レコード組立

use std::path::PathBuf;
use std::sync::Arc;

use image::RgbImage;
use tracing::{info, warn};

use crate::cache::hash::{CacheSettings, compute_cache_key};
use crate::cache::store::CacheStore;
use crate::config::layout::LayoutTable;
use crate::error::GaitError;
use crate::extract::TextFields;
use crate::pdf::reader::PdfReader;
use crate::pipeline::page_processor::process_page;
use crate::record::assembler::{assemble, build_extraction};
use crate::record::{ChartValues, Extraction, PatientRecord};
use crate::render::pdfium::{RENDER_DPI, render_pages};
use crate::store::RecordSink;

/// Configuration for a single job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input_path: PathBuf,
    pub subject_id: String,
    pub layout: Arc<LayoutTable>,
    pub cache_dir: Option<PathBuf>,
}

/// Result of processing a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub record: PatientRecord,
    pub from_cache: bool,
}

/// Build an extraction from a text corpus and pages rendered at
/// [`RENDER_DPI`].
///
/// Each page is processed and dropped before the next one is consumed.
pub fn extract_measurements<I>(corpus: &str, pages: I, layout: &LayoutTable) -> Extraction
where
    I: IntoIterator<Item = (u32, RgbImage)>,
{
    let text = TextFields::from_corpus(corpus);
    let mut charts = ChartValues::default();
    for (page_index, bitmap) in pages {
        process_page(page_index, &bitmap, layout, &mut charts);
    }
    build_extraction(text, charts)
}

/// Extract everything the layout describes from an opened document.
///
/// # Errors
/// - `GaitError::PageOutOfRange` if a chart page is missing from the document
/// - `GaitError::RenderError` if pdfium fails
pub fn extract_document(
    reader: &PdfReader,
    layout: &LayoutTable,
) -> crate::error::Result<Extraction> {
    let corpus = reader.text_corpus(&layout.text_pages);

    let total = reader.page_count();
    let pages: Vec<u32> = layout.render_pages().into_iter().collect();
    if let Some(&page) = pages.iter().find(|&&p| p >= total) {
        return Err(GaitError::PageOutOfRange { page, total });
    }

    let mut bitmaps = Vec::with_capacity(pages.len());
    render_pages(reader.bytes(), &pages, RENDER_DPI, |page_index, bitmap| {
        bitmaps.push((page_index, bitmap));
        Ok(())
    })?;

    Ok(extract_measurements(&corpus, bitmaps, layout))
}

/// Run the extraction half of a job: cache lookup, extraction, cache store.
///
/// Cache failures never fail the job; they are logged and the document is
/// extracted again.
pub fn extract_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    if config.subject_id.trim().is_empty() {
        return Err(GaitError::config("subject id cannot be empty"));
    }

    info!(input = %config.input_path.display(), subject = %config.subject_id, "starting job");
    let reader = PdfReader::open(&config.input_path)?;

    let cache = match &config.cache_dir {
        Some(dir) => {
            let settings = CacheSettings { layout: &config.layout };
            Some((CacheStore::new(dir), compute_cache_key(reader.bytes(), &settings)?))
        }
        None => None,
    };

    if let Some((store, key)) = &cache {
        match store.retrieve(key) {
            Ok(Some(extraction)) => {
                info!(input = %config.input_path.display(), "cache hit");
                return Ok(JobResult {
                    input_path: config.input_path.clone(),
                    record: assemble(&config.subject_id, extraction),
                    from_cache: true,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, "ignoring unreadable cache entry: {e}"),
        }
    }

    let extraction = extract_document(&reader, &config.layout)?;

    if let Some((store, key)) = &cache
        && let Err(e) = store.store(key, &extraction, Some(&config.input_path))
    {
        warn!(key = %key, "failed to write cache entry: {e}");
    }

    info!(input = %config.input_path.display(), subject = %config.subject_id, "extraction finished");
    Ok(JobResult {
        input_path: config.input_path.clone(),
        record: assemble(&config.subject_id, extraction),
        from_cache: false,
    })
}

/// Run a single job end to end and hand its record to `sink`.
///
/// Nothing reaches the sink unless extraction succeeded.
pub fn run_job(config: &JobConfig, sink: &mut dyn RecordSink) -> crate::error::Result<JobResult> {
    let result = extract_job(config)?;
    sink.insert_record(&result.record)?;
    info!(subject = %result.record.subject_id, "record stored");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layout::{KinematicVariable, builtin_layout};
    use crate::record::Sex;
    use image::Rgb;

    #[test]
    fn test_extract_measurements_from_synthetic_page() {
        let layout = builtin_layout();
        let mut page = RgbImage::from_pixel(3300, 2550, Rgb([255, 255, 255]));
        for y in 700..=900 {
            page.put_pixel(300, y, Rgb([255, 0, 0]));
        }

        let corpus = "Height : 1.70m\nWeight : 65Kg\nSex : Female\n";
        let extraction = extract_measurements(corpus, [(4, page)], &layout);

        assert_eq!(extraction.demographics.height, Some(1.70));
        assert_eq!(extraction.demographics.weight, Some(65.0));
        assert_eq!(extraction.demographics.sex, Some(Sex::F));
        assert_eq!(
            extraction.charts.kinematics.get(KinematicVariable::HipLeft),
            Some(100.0)
        );
    }

    #[test]
    fn test_empty_subject_id_is_rejected_before_reading() {
        let config = JobConfig {
            input_path: PathBuf::from("/nonexistent/report.pdf"),
            subject_id: "  ".to_string(),
            layout: builtin_layout(),
            cache_dir: None,
        };
        let err = extract_job(&config).unwrap_err();
        assert!(matches!(err, GaitError::ConfigError(_)), "got {err}");
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let config = JobConfig {
            input_path: PathBuf::from("/nonexistent/report.pdf"),
            subject_id: "S1".to_string(),
            layout: builtin_layout(),
            cache_dir: None,
        };
        let mut sink: Vec<PatientRecord> = Vec::new();
        assert!(matches!(run_job(&config, &mut sink), Err(GaitError::IoError(_))));
        assert!(sink.is_empty());
    }
}
