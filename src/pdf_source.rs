//! Report document source module
//!
//! Provides the input side of the pipeline: opening a scanned report PDF,
//! reading per-page plain text with `lopdf`, and rasterizing single pages at
//! a chosen DPI through the Poppler `pdftoppm` tool.
//!
//! Failures here are fatal for the affected document; the batch surface
//! reports them and moves on to the next input.

use image::DynamicImage;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Document source error types
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid PDF format: {0}")]
    InvalidFormat(String),

    #[error("Encrypted PDF not supported: {0}")]
    EncryptedPdf(PathBuf),

    #[error("PDF parse error: {0}")]
    ParseError(String),

    #[error("Page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("Text extraction failed for page {page}: {reason}")]
    TextExtraction { page: usize, reason: String },

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Rasterization failed for page {page}: {reason}")]
    RasterizeFailed { page: usize, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SourceError>;

// ============================================================
// Document reader
// ============================================================

/// One opened report PDF
///
/// Wraps the parsed `lopdf` document and caches the page count. Page
/// indices in this API are 0-based.
pub struct ReportDocument {
    document: Document,
    /// Source path the document was opened from
    pub path: PathBuf,
    /// Number of pages in the document
    pub page_count: usize,
}

impl ReportDocument {
    /// Open a report PDF
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SourceError::FileNotFound(path.to_path_buf()));
        }

        let document = Document::load(path).map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("header") || err_str.contains("PDF") {
                SourceError::InvalidFormat(err_str)
            } else {
                SourceError::ParseError(err_str)
            }
        })?;

        if document.is_encrypted() {
            return Err(SourceError::EncryptedPdf(path.to_path_buf()));
        }

        let page_count = document.get_pages().len();

        Ok(Self {
            document,
            path: path.to_path_buf(),
            page_count,
        })
    }

    /// Plain text of one page (0-based index)
    ///
    /// An image-only page with an empty text layer yields an empty string;
    /// a page that cannot be decoded at all is an error.
    pub fn page_text(&self, page_index: usize) -> Result<String> {
        if page_index >= self.page_count {
            return Err(SourceError::PageOutOfRange {
                page: page_index,
                count: self.page_count,
            });
        }

        // lopdf numbers pages from 1.
        self.document
            .extract_text(&[page_index as u32 + 1])
            .map_err(|e| SourceError::TextExtraction {
                page: page_index,
                reason: e.to_string(),
            })
    }
}

// ============================================================
// Rasterizer
// ============================================================

/// Rasterization options
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// Render resolution in DPI
    pub dpi: u32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self { dpi: 300 }
    }
}

impl RasterOptions {
    /// Create options with the given DPI (clamped to 72-1200)
    pub fn with_dpi(dpi: u32) -> Self {
        Self {
            dpi: dpi.clamp(72, 1200),
        }
    }
}

/// Poppler `pdftoppm` based page rasterizer
pub struct PopplerRasterizer;

impl PopplerRasterizer {
    /// Name of the external tool this rasterizer shells out to
    pub const TOOL: &'static str = "pdftoppm";

    /// Whether the rasterization tool is on PATH
    pub fn is_available() -> bool {
        which::which(Self::TOOL).is_ok()
    }

    /// Rasterize one page (0-based index) into `work_dir`, returning the
    /// decoded image
    ///
    /// The caller owns `work_dir`; a fresh temp dir per document keeps
    /// intermediate files out of the output tree.
    pub fn rasterize_page(
        pdf_path: &Path,
        page_index: usize,
        options: &RasterOptions,
        work_dir: &Path,
    ) -> Result<DynamicImage> {
        if !pdf_path.exists() {
            return Err(SourceError::FileNotFound(pdf_path.to_path_buf()));
        }
        if which::which(Self::TOOL).is_err() {
            return Err(SourceError::ToolNotFound(Self::TOOL.to_string()));
        }

        let page_number = page_index + 1;
        let prefix = work_dir.join(format!("page_{page_number}"));

        let output = Command::new(Self::TOOL)
            .arg("-png")
            .arg("-r")
            .arg(options.dpi.to_string())
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg("-singlefile")
            .arg(pdf_path)
            .arg(&prefix)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::RasterizeFailed {
                page: page_index,
                reason: stderr.trim().to_string(),
            });
        }

        let png_path = prefix.with_extension("png");
        image::open(&png_path).map_err(|e| SourceError::RasterizeFailed {
            page: page_index,
            reason: e.to_string(),
        })
    }
}

// ============================================================
// Tests
// ============================================================
