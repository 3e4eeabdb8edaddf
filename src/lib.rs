pub mod blocks;
pub mod config;
mod error;
pub mod fonts;
pub mod footer;
pub mod history;
pub mod identify;
pub mod layout;
pub mod model;
mod pdf;
pub mod source_image;
pub mod summary;

pub use config::ReportConfig;
pub use error::Error;
pub use model::AttributeRecord;
pub use source_image::SourceImage;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use config::MeasureModel;
use fonts::{FixedWidthMeasure, FontBook, TextMeasure};
use layout::PageLayoutEngine;
use model::{LayoutPage, ResolvedImage};

/// A finished PDF report.
#[derive(Clone, Debug)]
pub struct Report {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// File name for a report on the plant called `common_name`.
///
/// Whitespace runs become a single `_`, characters that are unsafe in file
/// names become `_`, and an empty name falls back to `plant`.
pub fn report_file_name(common_name: &str) -> String {
    let mut stem = String::with_capacity(common_name.len());
    let mut in_space = false;
    for ch in common_name.trim().chars() {
        if ch.is_whitespace() {
            if !in_space {
                stem.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        let unsafe_char =
            matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || ch.is_control();
        stem.push(if unsafe_char { '_' } else { ch });
    }
    if stem.is_empty() {
        stem.push_str("plant");
    }
    format!("{stem}_report.pdf")
}

/// The pure half of an export: build blocks, paginate, stamp the footer.
///
/// `image` must already be resolved; nothing here blocks or touches the file system.
pub fn compose(
    record: &AttributeRecord,
    image: Arc<ResolvedImage>,
    config: &ReportConfig,
    fonts: &FontBook,
) -> Vec<LayoutPage> {
    let fixed;
    let measure: &dyn TextMeasure = match config.layout.measure {
        MeasureModel::Measured => fonts,
        MeasureModel::FixedWidth { em_fraction } => {
            fixed = FixedWidthMeasure { em_fraction };
            &fixed
        }
    };

    let blocks = blocks::build_blocks(record, image);
    let engine = PageLayoutEngine::new(&config.page, &config.layout, measure);
    let mut pages = engine.paginate(&blocks);
    footer::stamp_footer(
        &mut pages,
        &config.page,
        &config.footer,
        config.layout.palette.accent,
        fonts,
    );
    pages
}

fn load_fonts(config: &ReportConfig) -> Result<FontBook, Error> {
    match &config.body_font {
        Some(path) => FontBook::with_body_font(path),
        None => Ok(FontBook::standard()),
    }
}

/// Produce the PDF report for `record` and its photo.
///
/// Fails with [`Error::MissingInput`] before doing any work when either input
/// is absent, and with [`Error::ImageDecode`] when the photo cannot be decoded;
/// in both cases no document is produced.
pub fn export_report(
    record: Option<&AttributeRecord>,
    image: Option<&SourceImage>,
    config: &ReportConfig,
) -> Result<Report, Error> {
    let t0 = Instant::now();
    let record = record.ok_or(Error::MissingInput("attribute record"))?;
    let image = image
        .filter(|img| !img.is_empty())
        .ok_or(Error::MissingInput("image"))?;
    config.validate()?;

    // Phase 1: decode the photo while fonts load
    let pending = source_image::prefetch(image.clone());
    let fonts = load_fonts(config)?;
    let t_fonts = t0.elapsed();
    let resolved = Arc::new(pending.wait()?);
    let t_image = t0.elapsed();

    // Phase 2: pure layout
    let pages = compose(record, resolved, config, &fonts);
    let t_layout = t0.elapsed();

    let title = record.common_name.trim();
    let bytes = pdf::render(&pages, &config.page, &fonts, Some(title))?;
    let t_render = t0.elapsed();

    log::info!(
        "Timing: fonts={:.1}ms, image={:.1}ms, layout={:.1}ms, render={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_image - t_fonts).as_secs_f64() * 1000.0,
        (t_layout - t_image).as_secs_f64() * 1000.0,
        (t_render - t_layout).as_secs_f64() * 1000.0,
        t_render.as_secs_f64() * 1000.0,
        pages.len(),
        bytes.len(),
    );

    Ok(Report {
        file_name: report_file_name(&record.common_name),
        bytes,
        page_count: pages.len(),
    })
}

/// [`export_report`], then write the result into `dir`. Returns the written path.
pub fn export_report_to_dir(
    record: Option<&AttributeRecord>,
    image: Option<&SourceImage>,
    config: &ReportConfig,
    dir: &Path,
) -> Result<PathBuf, Error> {
    let report = export_report(record, image, config)?;
    let path = dir.join(&report.file_name);
    std::fs::write(&path, &report.bytes).map_err(Error::Io)?;
    log::info!("Wrote {} ({} pages)", path.display(), report.page_count);
    Ok(path)
}
