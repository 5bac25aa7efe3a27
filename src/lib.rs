//! reportdeck - Convert scanned lab report PDFs into PowerPoint decks
//!
//! A complete Rust implementation for turning multi-page scanned lab report
//! PDFs (one report per page) into slide decks: one slide per page, showing
//! the cropped data region of that page plus a title extracted from its text.
//!
//! # Features
//!
//! - **Document Source** ([`pdf_source`]) - Read report PDFs and rasterize pages
//! - **Metadata Extraction** ([`metadata`]) - Pull timestamp and test item from page text
//! - **Content Band Detection** ([`boundary`]) - Locate the data region by row scanning
//! - **Slide Layout** ([`layout`]) - Aspect-preserving placement on the slide canvas
//! - **Deck Writing** ([`deck`]) - Serialize PPTX (OOXML) decks
//! - **Pipeline** ([`pipeline`]) - Per-document orchestration and the batch surface
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use reportdeck::{DeckConfig, DeckPipeline};
//! use std::path::Path;
//!
//! let pipeline = DeckPipeline::new(DeckConfig::default());
//! let result = pipeline
//!     .process(Path::new("reports.pdf"), Path::new("./output"))
//!     .unwrap();
//! println!("{} slides written to {}", result.slide_count, result.output_path.display());
//! ```
//!
//! # Architecture
//!
//! The library is organized into independent modules that can be used
//! separately:
//!
//! ```text
//! PDF Input -> Page Text -> Metadata Extraction ----\
//!          \-> Rasterization -> Band Detection -> Layout -> PPTX Output
//! ```
//!
//! Detection and extraction degrade instead of failing: a page without a
//! recognizable content band is placed uncropped, and missing metadata
//! fields resolve to fixed sentinel strings.
//!
//! # License
//!
//! AGPL-3.0

pub mod boundary;
pub mod cli;
pub mod config;
pub mod deck;
pub mod layout;
pub mod metadata;
pub mod pdf_source;
pub mod pipeline;
pub mod progress;

// Re-exports for convenience
pub use boundary::{BandBounds, BoundaryOptions, BoundaryOptionsBuilder, ContentBandDetector};
pub use cli::{
    create_page_progress_bar, create_progress_bar, create_spinner, Cli, Commands, ConvertArgs,
    ExitCode,
};
pub use config::{CliOverrides, Config, ConfigError};
pub use deck::{DeckWriteError, PptxWriter, SlideSpec};
pub use layout::{LayoutCompositor, SlideCanvas, SlideGeometry, EMU_PER_INCH};
pub use metadata::{
    MetadataExtractor, PageMetadata, LABEL_SENTINEL, TIMESTAMP_SENTINEL,
};
pub use pdf_source::{
    PopplerRasterizer, RasterOptions, ReportDocument, SourceError,
};
pub use pipeline::{
    BatchItem, DeckConfig, DeckPipeline, DeckResult, PipelineError, ProgressCallback,
    SilentProgress, SlideAssembler,
};
pub use progress::{build_progress_bar, OutputMode, ProcessingStage, ProgressTracker};
