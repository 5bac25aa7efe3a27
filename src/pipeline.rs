//! Deck building pipeline module
//!
//! Orchestrates the conversion of one report PDF into one slide deck, and
//! the batch surface over an explicit list of inputs.
//!
//! ## Processing steps
//!
//! 1. Open the document and read the page count
//! 2. Per page: extract text metadata, rasterize, detect and crop the
//!    content band, compute slide placement
//! 3. Write the assembled slides as one `.pptx` per input document
//!
//! Pages are processed sequentially within a document so only one high-DPI
//! raster is held at a time; the batch map runs documents in parallel, each
//! worker owning its raster buffers.

use image::DynamicImage;
use rayon::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

use crate::boundary::{BoundaryOptions, ContentBandDetector};
use crate::deck::{DeckWriteError, PptxWriter, SlideSpec};
use crate::layout::{LayoutCompositor, SlideCanvas};
use crate::metadata::MetadataExtractor;
use crate::pdf_source::{PopplerRasterizer, RasterOptions, ReportDocument, SourceError};

/// Pipeline processing error
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Document processing failed: {0}")]
    Source(#[from] SourceError),

    #[error("Image encoding failed: {0}")]
    ImageEncode(String),

    #[error("Deck writing failed: {0}")]
    DeckWrite(#[from] DeckWriteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// ============================================================
// Progress callback
// ============================================================

/// Progress callback for pipeline steps
pub trait ProgressCallback: Send + Sync {
    /// Called when a new step starts
    fn on_step_start(&self, step: &str);
    /// Called to report progress within a step
    fn on_step_progress(&self, current: usize, total: usize);
    /// Called when a step completes
    fn on_step_complete(&self, step: &str, message: &str);
    /// Called for debug/verbose messages
    fn on_debug(&self, message: &str);
}

/// No-op progress callback (silent mode)
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_step_start(&self, _step: &str) {}
    fn on_step_progress(&self, _current: usize, _total: usize) {}
    fn on_step_complete(&self, _step: &str, _message: &str) {}
    fn on_debug(&self, _message: &str) {}
}

// ============================================================
// Configuration
// ============================================================

/// Deck pipeline configuration
#[derive(Debug, Clone)]
pub struct DeckConfig {
    /// Rasterization DPI
    pub dpi: u32,
    /// Darkness threshold for the content band scan (0-255)
    pub darkness_threshold: u8,
    /// Separator row dark fraction (0.0-1.0)
    pub row_dark_fraction: f32,
    /// Fixed template trim from the top of each page
    pub top_trim_percent: f32,
    /// Fixed template trim from the bottom of each page
    pub bottom_trim_percent: f32,
    /// Field marker preceding the test item label
    pub label_keyword: String,
    /// Slide canvas the cropped image is placed on
    pub canvas: SlideCanvas,
    /// Thread count for the batch map (None = all CPUs)
    pub threads: Option<usize>,
    /// Debug limit on pages per document
    pub max_pages: Option<usize>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        let boundary = BoundaryOptions::default();
        Self {
            dpi: 300,
            darkness_threshold: boundary.darkness_threshold,
            row_dark_fraction: boundary.row_dark_fraction,
            top_trim_percent: boundary.top_trim_percent,
            bottom_trim_percent: boundary.bottom_trim_percent,
            label_keyword: "检验项目".to_string(),
            canvas: SlideCanvas::default(),
            threads: None,
            max_pages: None,
        }
    }
}

impl DeckConfig {
    /// Builder pattern: set DPI
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Builder pattern: set darkness threshold
    pub fn with_darkness_threshold(mut self, threshold: u8) -> Self {
        self.darkness_threshold = threshold;
        self
    }

    /// Builder pattern: set template trim percentages
    pub fn with_template_trim(mut self, top: f32, bottom: f32) -> Self {
        self.top_trim_percent = top.clamp(0.0, 1.0);
        self.bottom_trim_percent = bottom.clamp(0.0, 1.0);
        self
    }

    /// Builder pattern: set the label field keyword
    pub fn with_label_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.label_keyword = keyword.into();
        self
    }

    /// Builder pattern: set batch thread count
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Builder pattern: set max pages
    pub fn with_max_pages(mut self, max: Option<usize>) -> Self {
        self.max_pages = max;
        self
    }

    /// Boundary detection options derived from this configuration
    pub fn boundary_options(&self) -> BoundaryOptions {
        BoundaryOptions::builder()
            .darkness_threshold(self.darkness_threshold)
            .row_dark_fraction(self.row_dark_fraction)
            .top_trim_percent(self.top_trim_percent)
            .bottom_trim_percent(self.bottom_trim_percent)
            .build()
    }

    /// Rasterization options derived from this configuration
    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions::with_dpi(self.dpi)
    }
}

// ============================================================
// Slide assembly
// ============================================================

/// Per-page slide assembler
///
/// Stateless across pages: each call consumes one page's text and raster and
/// produces one slide request for the deck writer.
pub struct SlideAssembler {
    extractor: MetadataExtractor,
    boundary: BoundaryOptions,
    canvas: SlideCanvas,
}

impl SlideAssembler {
    /// Create an assembler for the given configuration
    pub fn new(config: &DeckConfig) -> Self {
        Self {
            extractor: MetadataExtractor::new(&config.label_keyword),
            boundary: config.boundary_options(),
            canvas: config.canvas,
        }
    }

    /// Assemble one slide from a page's text and raster image
    ///
    /// Metadata misses resolve to sentinels and boundary misses to a no-crop
    /// band; only PNG encoding can fail here.
    pub fn assemble(&self, page_text: &str, page_image: &DynamicImage) -> Result<SlideSpec> {
        let metadata = self.extractor.extract(page_text);
        let cropped = ContentBandDetector::crop_page(page_image, &self.boundary);
        let geometry = LayoutCompositor::place(cropped.width(), cropped.height(), &self.canvas);

        let mut png = Cursor::new(Vec::new());
        cropped
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| PipelineError::ImageEncode(e.to_string()))?;

        Ok(SlideSpec {
            title: metadata.title(),
            image_png: png.into_inner(),
            geometry,
        })
    }
}

// ============================================================
// Deck pipeline
// ============================================================

/// Result of building one deck
#[derive(Debug, Clone)]
pub struct DeckResult {
    /// Number of pages read from the source document
    pub page_count: usize,
    /// Number of slides written
    pub slide_count: usize,
    /// Processing time in seconds
    pub elapsed_seconds: f64,
    /// Output file path
    pub output_path: PathBuf,
    /// Output file size in bytes
    pub output_size: u64,
}

/// One entry of a batch run
#[derive(Debug)]
pub struct BatchItem {
    /// Input document path
    pub input: PathBuf,
    /// Outcome for this document
    pub result: Result<DeckResult>,
}

/// Report-to-deck conversion pipeline
pub struct DeckPipeline {
    config: DeckConfig,
}

impl DeckPipeline {
    /// Create a pipeline with the given configuration
    pub fn new(config: DeckConfig) -> Self {
        Self { config }
    }

    /// Access the active configuration
    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// Output path for an input document (extension substituted)
    pub fn get_output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        output_dir.join(format!("{stem}.pptx"))
    }

    /// Convert one document, silently
    pub fn process(&self, input: &Path, output_dir: &Path) -> Result<DeckResult> {
        self.process_with_progress(input, output_dir, &SilentProgress)
    }

    /// Convert one document with progress reporting
    ///
    /// Load and rasterization failures are fatal for this document; a
    /// document with zero pages produces a valid empty deck.
    pub fn process_with_progress(
        &self,
        input: &Path,
        output_dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<DeckResult> {
        let start = Instant::now();

        if !input.exists() {
            return Err(PipelineError::InputNotFound(input.to_path_buf()));
        }

        progress.on_step_start("Reading document");
        let document = ReportDocument::open(input)?;
        let total_pages = document.page_count;
        let page_count = match self.config.max_pages {
            Some(max) => total_pages.min(max),
            None => total_pages,
        };
        progress.on_step_complete("Reading document", &format!("{page_count} pages"));

        let work_dir = tempfile::tempdir()?;
        let assembler = SlideAssembler::new(&self.config);
        let raster_options = self.config.raster_options();

        progress.on_step_start("Assembling slides");
        let mut slides = Vec::with_capacity(page_count);
        for page_index in 0..page_count {
            progress.on_step_progress(page_index + 1, page_count);

            let page_text = document.page_text(page_index)?;
            let page_image = PopplerRasterizer::rasterize_page(
                input,
                page_index,
                &raster_options,
                work_dir.path(),
            )?;

            let slide = assembler.assemble(&page_text, &page_image)?;
            tracing::debug!(page = page_index, title = %slide.title, "assembled slide");
            progress.on_debug(&format!("page {}: {}", page_index + 1, slide.title));
            slides.push(slide);
        }
        progress.on_step_complete("Assembling slides", &format!("{} slides", slides.len()));

        progress.on_step_start("Writing deck");
        std::fs::create_dir_all(output_dir)?;
        let output_path = self.get_output_path(input, output_dir);
        PptxWriter::write(&slides, &output_path)?;
        let output_size = std::fs::metadata(&output_path)?.len();
        progress.on_step_complete("Writing deck", &output_path.display().to_string());

        tracing::info!(
            input = %input.display(),
            output = %output_path.display(),
            slides = slides.len(),
            "deck written"
        );

        Ok(DeckResult {
            page_count: total_pages,
            slide_count: slides.len(),
            elapsed_seconds: start.elapsed().as_secs_f64(),
            output_path,
            output_size,
        })
    }

    /// Convert an explicit list of documents, in parallel across documents
    ///
    /// Per-document failures are captured in the returned items; one failing
    /// input never aborts the rest of the batch. Results keep input order.
    pub fn process_batch(&self, inputs: &[PathBuf], output_dir: &Path) -> Vec<BatchItem> {
        let threads = self.config.threads.unwrap_or_else(num_cpus::get).max(1);

        let run = || {
            inputs
                .par_iter()
                .map(|input| BatchItem {
                    input: input.clone(),
                    result: self.process(input, output_dir),
                })
                .collect()
        };

        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(run),
            Err(_) => run(),
        }
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// Page raster with a framed gray content block between two separators
    fn report_page(width: u32, height: u32, upper: u32, lower: u32) -> DynamicImage {
        let mut gray = GrayImage::from_pixel(width, height, Luma([255]));
        for band in [upper, lower] {
            for y in band..band + 3 {
                for x in 0..width {
                    gray.put_pixel(x, y, Luma([0]));
                }
            }
        }
        for y in upper + 20..lower - 10 {
            for x in 10..width - 10 {
                gray.put_pixel(x, y, Luma([190]));
            }
        }
        DynamicImage::ImageLuma8(gray)
    }

    fn untrimmed_config() -> DeckConfig {
        DeckConfig::default().with_template_trim(0.0, 0.0)
    }

    #[test]
    fn test_default_config() {
        let config = DeckConfig::default();

        assert_eq!(config.dpi, 300);
        assert_eq!(config.darkness_threshold, 153);
        assert_eq!(config.row_dark_fraction, 0.6);
        assert_eq!(config.top_trim_percent, 0.16);
        assert_eq!(config.bottom_trim_percent, 0.05);
        assert_eq!(config.label_keyword, "检验项目");
        assert!(config.threads.is_none());
        assert!(config.max_pages.is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = DeckConfig::default()
            .with_dpi(600)
            .with_darkness_threshold(128)
            .with_template_trim(0.1, 0.02)
            .with_label_keyword("Test item")
            .with_threads(Some(2))
            .with_max_pages(Some(5));

        assert_eq!(config.dpi, 600);
        assert_eq!(config.darkness_threshold, 128);
        assert_eq!(config.top_trim_percent, 0.1);
        assert_eq!(config.label_keyword, "Test item");
        assert_eq!(config.threads, Some(2));
        assert_eq!(config.max_pages, Some(5));
    }

    #[test]
    fn test_config_trim_clamped() {
        let config = DeckConfig::default().with_template_trim(2.0, -1.0);
        assert_eq!(config.top_trim_percent, 1.0);
        assert_eq!(config.bottom_trim_percent, 0.0);
    }

    #[test]
    fn test_boundary_options_derivation() {
        let config = DeckConfig::default().with_darkness_threshold(100);
        let options = config.boundary_options();

        assert_eq!(options.darkness_threshold, 100);
        assert_eq!(options.top_trim_percent, 0.16);
    }

    #[test]
    fn test_get_output_path_extension_substitution() {
        let pipeline = DeckPipeline::new(DeckConfig::default());
        let output = pipeline.get_output_path(Path::new("/in/report.pdf"), Path::new("/out"));
        assert_eq!(output, PathBuf::from("/out/report.pptx"));
    }

    #[test]
    fn test_process_missing_input() {
        let pipeline = DeckPipeline::new(DeckConfig::default());
        let out = tempfile::tempdir().unwrap();

        let result = pipeline.process(Path::new("/nonexistent/doc.pdf"), out.path());
        assert!(matches!(result, Err(PipelineError::InputNotFound(_))));
    }

    #[test]
    fn test_assemble_slide_with_metadata() {
        let assembler = SlideAssembler::new(&untrimmed_config());
        let page = report_page(400, 600, 50, 500);

        let slide = assembler
            .assemble("采集时间: 2024-03-15 08:30 检验项目：血常规\n", &page)
            .unwrap();

        assert_eq!(slide.title, "血常规 2024-03-15");
        assert!(!slide.image_png.is_empty());
        // PNG magic
        assert_eq!(&slide.image_png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_assemble_slide_without_metadata() {
        let assembler = SlideAssembler::new(&untrimmed_config());
        let page = report_page(400, 600, 50, 500);

        let slide = assembler.assemble("nothing recognizable", &page).unwrap();
        assert_eq!(slide.title, "item-not-found date-not-found");
    }

    #[test]
    fn test_assemble_preserves_crop_aspect_ratio() {
        let assembler = SlideAssembler::new(&untrimmed_config());
        let page = report_page(400, 600, 50, 500);
        let cropped =
            ContentBandDetector::crop_page(&page, &untrimmed_config().boundary_options());

        let slide = assembler.assemble("", &page).unwrap();

        let crop_ratio = cropped.width() as f64 / cropped.height() as f64;
        let placed_ratio = slide.geometry.width / slide.geometry.height;
        assert!(((placed_ratio - crop_ratio) / crop_ratio).abs() < 1e-6);
    }

    #[test]
    fn test_assemble_all_white_page() {
        let assembler = SlideAssembler::new(&untrimmed_config());
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 300, Luma([255])));

        let slide = assembler.assemble("", &page).unwrap();

        // No crop: placed geometry keeps the full page ratio.
        let ratio = slide.geometry.width / slide.geometry.height;
        assert!((ratio - 200.0 / 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_page_deck_assembly() {
        // End-to-end at the assembler + writer seam: page 1 carries a content
        // band, page 2 has no extractable metadata.
        let config = untrimmed_config();
        let assembler = SlideAssembler::new(&config);

        let page1 = report_page(400, 600, 50, 500);
        let page2 = DynamicImage::ImageLuma8(GrayImage::from_pixel(400, 600, Luma([255])));

        let slide1 = assembler
            .assemble("采集时间: 2024-03-15 08:30 检验项目：血常规\n", &page1)
            .unwrap();
        let slide2 = assembler.assemble("no fields", &page2).unwrap();

        assert_eq!(slide1.title, "血常规 2024-03-15");
        assert_eq!(slide2.title, "item-not-found date-not-found");

        let mut sink = std::io::Cursor::new(Vec::new());
        PptxWriter::write_to(&[slide1, slide2], "two-pages", &mut sink).unwrap();
        assert!(!sink.into_inner().is_empty());
    }

    #[test]
    fn test_process_batch_reports_failures_and_continues() {
        let pipeline = DeckPipeline::new(DeckConfig::default().with_threads(Some(2)));
        let out = tempfile::tempdir().unwrap();
        let inputs = vec![
            PathBuf::from("/nonexistent/a.pdf"),
            PathBuf::from("/nonexistent/b.pdf"),
        ];

        let items = pipeline.process_batch(&inputs, out.path());

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].input, inputs[0]);
        assert!(items.iter().all(|item| item.result.is_err()));
    }
}
