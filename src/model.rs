use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::fonts::FontFace;

/// Finished identification result for one plant photo.
///
/// Only `common_name` and `scientific_name` are required when deserialising;
/// every other field may be missing or empty and is then left out of the report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRecord {
    pub common_name: String,
    pub scientific_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub growth_habit: String,
    #[serde(default)]
    pub ideal_climate: String,
    #[serde(default)]
    pub light_requirement: String,
    #[serde(default)]
    pub water_needs: String,
    #[serde(default)]
    pub toxicity_to_pets: String,
    #[serde(default)]
    pub native_region: String,
    #[serde(default)]
    pub maintenance_level: String,
    #[serde(default)]
    pub care_tips: String,
}

impl AttributeRecord {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::InvalidRecord(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| Error::InvalidRecord(format!("{}: {e}", path.display())))
    }

    /// The seven tabular attributes, labelled, in report order.
    pub fn attributes(&self) -> [(&'static str, &str); 7] {
        [
            ("Growth Habit", self.growth_habit.as_str()),
            ("Ideal Climate", self.ideal_climate.as_str()),
            ("Light Requirement", self.light_requirement.as_str()),
            ("Water Needs", self.water_needs.as_str()),
            ("Toxicity to Pets", self.toxicity_to_pets.as_str()),
            ("Native Region", self.native_region.as_str()),
            ("Maintenance Level", self.maintenance_level.as_str()),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
}

/// Pixel data in the form the PDF writer consumes it.
#[derive(Clone, Debug, PartialEq)]
pub enum ImagePixels {
    /// JPEG bytes passed through untouched (DCTDecode).
    Dct { data: Vec<u8>, components: u8 },
    /// Decoded 8-bit RGB samples, with a separate alpha channel when any pixel is translucent.
    Rgb { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// An image whose dimensions and pixels are fully known.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedImage {
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub pixels: ImagePixels,
}

impl ResolvedImage {
    pub fn aspect_ratio(&self) -> f32 {
        self.pixel_width as f32 / self.pixel_height.max(1) as f32
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRow {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    Title {
        name: String,
        scientific_name: String,
    },
    Image {
        image: Arc<ResolvedImage>,
        aspect_ratio: f32,
    },
    Table {
        rows: Vec<TableRow>,
    },
    Section {
        heading: String,
        body: String,
    },
}

/// Page size and margins, all in the same length unit (millimetres by default).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    /// PDF points per layout unit.
    pub points_per_unit: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 14.0,
            points_per_unit: 72.0 / 25.4,
        }
    }
}

impl PageGeometry {
    pub fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn usable_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    pub fn content_top(&self) -> f32 {
        self.margin
    }

    /// Offset from the page top at which the bottom margin begins.
    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32, // points
    pub color: [u8; 3],
}

/// What a draw instruction stands for in the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Title,
    ScientificName,
    Image,
    Table,
    Heading,
    Body,
    Footer,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedRow {
    pub label: Vec<String>,
    pub value: Vec<String>,
    pub height: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableLayout {
    pub header: [String; 2],
    pub header_height: f32,
    pub label_width: f32,
    pub padding: f32,
    pub line_height: f32,
    pub font_size: f32,
    pub rows: Vec<PlacedRow>,
    pub header_fill: [u8; 3],
    pub header_text: [u8; 3],
    pub text_color: [u8; 3],
    pub border_color: [u8; 3],
    pub border_width: f32, // points
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawKind {
    TextLine {
        text: String,
        style: TextStyle,
        alignment: Alignment,
    },
    Image {
        image: Arc<ResolvedImage>,
    },
    Table(TableLayout),
}

/// A positioned drawing operation. `y` is measured downward from the page top.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawInstruction {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub role: Role,
    pub kind: DrawKind,
}

impl DrawInstruction {
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutPage {
    pub instructions: Vec<DrawInstruction>,
}

impl LayoutPage {
    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.instructions.iter().map(|i| i.role)
    }

    /// Text of every text-line instruction with the given role, in order.
    pub fn texts(&self, role: Role) -> Vec<&str> {
        self.instructions
            .iter()
            .filter(|i| i.role == role)
            .filter_map(|i| match &i.kind {
                DrawKind::TextLine { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
