//! Slide deck writer module
//!
//! Serializes one PowerPoint (`.pptx`) file per input document. A PPTX file
//! is a ZIP package of OOXML parts; this writer emits the minimal part set a
//! viewer needs — content types, package relationships, the presentation
//! part, one blank master/layout/theme, document properties, and per slide a
//! title text box plus the cropped report image at its computed placement.
//!
//! Part paths and relationship types mirror what PowerPoint itself writes,
//! so decks round-trip through OOXML tooling.

use chrono::Utc;
use quick_xml::escape::escape;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::layout::SlideGeometry;

/// Deck writing error types
#[derive(Debug, Error)]
pub enum DeckWriteError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeckWriteError>;

// ============================================================
// Constants
// ============================================================

/// Slide surface width (10 in)
const SLIDE_WIDTH_EMU: i64 = 9_144_000;

/// Slide surface height (7.5 in)
const SLIDE_HEIGHT_EMU: i64 = 6_858_000;

/// Title box left edge (0.4 in)
const TITLE_LEFT_EMU: i64 = 365_760;

/// Title box top edge (0.1 in)
const TITLE_TOP_EMU: i64 = 91_440;

/// Title box width (8 in)
const TITLE_WIDTH_EMU: i64 = 7_315_200;

/// Title box height (0.8 in)
const TITLE_HEIGHT_EMU: i64 = 731_520;

/// Title font size in hundredths of a point (18 pt)
const TITLE_FONT_SIZE: u32 = 1800;

/// Title typeface
const TITLE_TYPEFACE: &str = "Arial";

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PRESENTATION_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const OFFICE_REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

// ============================================================
// Types
// ============================================================

/// One slide request: title text plus the cropped page image and its
/// placement rectangle
#[derive(Debug, Clone)]
pub struct SlideSpec {
    /// Title line rendered bold near the top-left of the slide
    pub title: String,
    /// PNG-encoded cropped page image
    pub image_png: Vec<u8>,
    /// Placement of the image on the slide, in EMU
    pub geometry: SlideGeometry,
}

/// PPTX deck writer
pub struct PptxWriter;

impl PptxWriter {
    /// Write a deck to a file, one slide per request
    ///
    /// A deck with zero slides is a valid (empty) presentation.
    pub fn write(slides: &[SlideSpec], output_path: &Path) -> Result<()> {
        let deck_title = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "deck".to_string());
        let file = File::create(output_path)?;
        Self::write_to(slides, &deck_title, file)
    }

    /// Write a deck to any seekable sink
    pub fn write_to<W: Write + Seek>(slides: &[SlideSpec], deck_title: &str, sink: W) -> Result<()> {
        let mut zip = ZipWriter::new(sink);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut part = |zip: &mut ZipWriter<W>, name: &str, body: String| -> Result<()> {
            zip.start_file(name, options)?;
            zip.write_all(body.as_bytes())?;
            Ok(())
        };

        part(&mut zip, "[Content_Types].xml", content_types_xml(slides.len()))?;
        part(&mut zip, "_rels/.rels", package_rels_xml())?;
        part(&mut zip, "docProps/core.xml", core_props_xml(deck_title))?;
        part(&mut zip, "docProps/app.xml", app_props_xml(slides.len()))?;
        part(&mut zip, "ppt/presentation.xml", presentation_xml(slides.len()))?;
        part(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            presentation_rels_xml(slides.len()),
        )?;
        part(
            &mut zip,
            "ppt/slideMasters/slideMaster1.xml",
            slide_master_xml(),
        )?;
        part(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            slide_master_rels_xml(),
        )?;
        part(
            &mut zip,
            "ppt/slideLayouts/slideLayout1.xml",
            slide_layout_xml(),
        )?;
        part(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            slide_layout_rels_xml(),
        )?;
        part(&mut zip, "ppt/theme/theme1.xml", theme_xml())?;

        for (index, slide) in slides.iter().enumerate() {
            let number = index + 1;
            part(
                &mut zip,
                &format!("ppt/slides/slide{number}.xml"),
                slide_xml(slide),
            )?;
            part(
                &mut zip,
                &format!("ppt/slides/_rels/slide{number}.xml.rels"),
                slide_rels_xml(number),
            )?;

            zip.start_file(format!("ppt/media/image{number}.png"), options)?;
            zip.write_all(&slide.image_png)?;
        }

        zip.finish()?;
        Ok(())
    }
}

// ============================================================
// Part templates
// ============================================================

fn content_types_xml(slide_count: usize) -> String {
    let mut overrides = String::new();
    for number in 1..=slide_count {
        overrides.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{number}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>{overrides}</Types>"#
    )
}

fn package_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{OFFICE_REL_NS}/officeDocument" Target="ppt/presentation.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{OFFICE_REL_NS}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

fn core_props_xml(deck_title: &str) -> String {
    let stamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let title = escape(deck_title);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{title}</dc:title><dc:creator>reportdeck</dc:creator><cp:lastModifiedBy>reportdeck</cp:lastModifiedBy><dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified></cp:coreProperties>"#
    )
}

fn app_props_xml(slide_count: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>reportdeck</Application><Slides>{slide_count}</Slides></Properties>"#
    )
}

fn presentation_xml(slide_count: usize) -> String {
    let mut slide_ids = String::new();
    for index in 0..slide_count {
        let id = 256 + index;
        let rid = index + 2;
        slide_ids.push_str(&format!(r#"<p:sldId id="{id}" r:id="rId{rid}"/>"#));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="{DRAWING_NS}" xmlns:r="{OFFICE_REL_NS}" xmlns:p="{PRESENTATION_NS}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="{SLIDE_WIDTH_EMU}" cy="{SLIDE_HEIGHT_EMU}"/><p:notesSz cx="{SLIDE_HEIGHT_EMU}" cy="{SLIDE_WIDTH_EMU}"/></p:presentation>"#
    )
}

fn presentation_rels_xml(slide_count: usize) -> String {
    let mut rels = format!(
        r#"<Relationship Id="rId1" Type="{OFFICE_REL_NS}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#
    );
    for index in 0..slide_count {
        let number = index + 1;
        let rid = index + 2;
        rels.push_str(&format!(
            r#"<Relationship Id="rId{rid}" Type="{OFFICE_REL_NS}/slide" Target="slides/slide{number}.xml"/>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}">{rels}</Relationships>"#
    )
}

fn empty_sp_tree() -> &'static str {
    r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:spTree>"#
}

fn slide_master_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="{DRAWING_NS}" xmlns:r="{OFFICE_REL_NS}" xmlns:p="{PRESENTATION_NS}"><p:cSld>{tree}</p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
        tree = empty_sp_tree()
    )
}

fn slide_master_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{OFFICE_REL_NS}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{OFFICE_REL_NS}/theme" Target="../theme/theme1.xml"/></Relationships>"#
    )
}

fn slide_layout_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="{DRAWING_NS}" xmlns:r="{OFFICE_REL_NS}" xmlns:p="{PRESENTATION_NS}" type="blank" preserve="1"><p:cSld name="Blank">{tree}</p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        tree = empty_sp_tree()
    )
}

fn slide_layout_rels_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{OFFICE_REL_NS}/slideMaster" Target="../slideMasters/slideMaster1.xml"/></Relationships>"#
    )
}

fn theme_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="{DRAWING_NS}" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst><a:lnStyleLst><a:ln><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#
    )
}

fn slide_xml(slide: &SlideSpec) -> String {
    let title = escape(slide.title.as_str());
    let x = slide.geometry.offset_x.round() as i64;
    let y = slide.geometry.offset_y.round() as i64;
    let cx = slide.geometry.width.round() as i64;
    let cy = slide.geometry.height.round() as i64;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{DRAWING_NS}" xmlns:r="{OFFICE_REL_NS}" xmlns:p="{PRESENTATION_NS}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Title Box"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="{TITLE_LEFT_EMU}" y="{TITLE_TOP_EMU}"/><a:ext cx="{TITLE_WIDTH_EMU}" cy="{TITLE_HEIGHT_EMU}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr><p:txBody><a:bodyPr wrap="square"/><a:lstStyle/><a:p><a:r><a:rPr lang="zh-CN" sz="{TITLE_FONT_SIZE}" b="1"><a:latin typeface="{TITLE_TYPEFACE}"/></a:rPr><a:t>{title}</a:t></a:r></a:p></p:txBody></p:sp><p:pic><p:nvPicPr><p:cNvPr id="3" name="Report Region"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

fn slide_rels_xml(number: usize) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{OFFICE_REL_NS}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{OFFICE_REL_NS}/image" Target="../media/image{number}.png"/></Relationships>"#
    )
}

// ============================================================
// Tests
// ============================================================
