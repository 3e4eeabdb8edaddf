use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::PageGeometry;

/// Report colours, RGB.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Title, headings and the table header fill.
    pub primary: [u8; 3],
    /// Scientific name and footer caption.
    pub accent: [u8; 3],
    pub text: [u8; 3],
    pub header_text: [u8; 3],
    pub border: [u8; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: [0x38, 0x8E, 0x3C],
            accent: [0x79, 0x55, 0x48],
            text: [0, 0, 0],
            header_text: [0xFF, 0xFF, 0xFF],
            border: [0xBD, 0xBD, 0xBD],
        }
    }
}

/// How text widths are obtained for word wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureModel {
    /// Advance widths of the fonts the renderer draws with.
    Measured,
    /// Every character is `em_fraction` of the font size wide.
    FixedWidth { em_fraction: f32 },
}

/// Tunable constants of the height estimates. Font sizes are in points,
/// every other length is in page units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub title_size: f32,
    pub scientific_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
    pub table_size: f32,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f32,
    pub image_width: f32,
    pub block_gap: f32,
    /// Space between a section heading and its first body line.
    pub heading_gap: f32,
    pub table_label_width: f32,
    pub cell_padding: f32,
    pub table_border_width: f32, // points
    /// Body lines that must follow a heading on the same page.
    pub min_lines_with_heading: usize,
    /// Multiplier applied to every measured width; values above 1.0 wrap earlier.
    pub width_safety: f32,
    pub measure: MeasureModel,
    pub palette: Palette,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            title_size: 22.0,
            scientific_size: 14.0,
            heading_size: 14.0,
            body_size: 10.0,
            table_size: 10.0,
            line_height_factor: 1.4,
            image_width: 80.0,
            block_gap: 6.0,
            heading_gap: 1.5,
            table_label_width: 50.0,
            cell_padding: 1.5,
            table_border_width: 0.5,
            min_lines_with_heading: 1,
            width_safety: 1.0,
            measure: MeasureModel::Measured,
            palette: Palette::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterConfig {
    pub caption: String,
    pub size: f32, // points
    /// Distance from the bottom page edge to the caption baseline.
    pub bottom_offset: f32,
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            caption: "Built with LeafWise".to_string(),
            size: 9.0,
            bottom_offset: 10.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub page: PageGeometry,
    pub layout: LayoutMetrics,
    pub footer: FooterConfig,
    /// TrueType/OpenType file drawn in place of Helvetica for body text.
    pub body_font: Option<PathBuf>,
}

impl ReportConfig {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        let config: ReportConfig = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let p = &self.page;
        let l = &self.layout;
        let positive = [
            ("page.width", p.width),
            ("page.height", p.height),
            ("page.points_per_unit", p.points_per_unit),
            ("layout.title_size", l.title_size),
            ("layout.scientific_size", l.scientific_size),
            ("layout.heading_size", l.heading_size),
            ("layout.body_size", l.body_size),
            ("layout.table_size", l.table_size),
            ("layout.image_width", l.image_width),
            ("footer.size", self.footer.size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!("{name} must be positive, got {value}")));
            }
        }
        let non_negative = [
            ("page.margin", p.margin),
            ("layout.block_gap", l.block_gap),
            ("layout.heading_gap", l.heading_gap),
            ("layout.cell_padding", l.cell_padding),
            ("layout.table_border_width", l.table_border_width),
            ("footer.bottom_offset", self.footer.bottom_offset),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::Config(format!("{name} must not be negative, got {value}")));
            }
        }
        if p.usable_width() <= 0.0 || p.usable_height() <= 0.0 {
            return Err(Error::Config(format!(
                "margin {} leaves no content area on a {}x{} page",
                p.margin, p.width, p.height
            )));
        }
        if l.line_height_factor < 1.0 {
            return Err(Error::Config("layout.line_height_factor must be at least 1.0".into()));
        }
        if l.width_safety < 1.0 {
            return Err(Error::Config("layout.width_safety must be at least 1.0".into()));
        }
        if l.table_label_width + 4.0 * l.cell_padding >= p.usable_width() {
            return Err(Error::Config(
                "layout.table_label_width leaves no room for the value column".into(),
            ));
        }
        if let MeasureModel::FixedWidth { em_fraction } = l.measure
            && !(em_fraction.is_finite() && em_fraction > 0.0)
        {
            return Err(Error::Config("measure.fixed_width.em_fraction must be positive".into()));
        }
        Ok(())
    }
}
