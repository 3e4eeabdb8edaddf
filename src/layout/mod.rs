//! Page layout engine.
//!
//! A single greedy pass over the content blocks. Each block's height is
//! estimated up front; a block that would cross the bottom margin starts a
//! new page. Title, image and table blocks always move whole. Sections may
//! continue on the next page line by line, but a heading never ends a page
//! without at least `min_lines_with_heading` of its body under it.

mod wrap;

use std::sync::Arc;

use crate::config::LayoutMetrics;
use crate::fonts::{FontFace, TextMeasure};
use crate::model::{
    Alignment, ContentBlock, DrawInstruction, DrawKind, LayoutPage, PageGeometry, PlacedRow,
    ResolvedImage, Role, TableLayout, TableRow, TextStyle,
};

pub(crate) use wrap::wrap_text;

/// Converts point-based text measurements into page units.
pub struct Typesetter<'a> {
    measure: &'a dyn TextMeasure,
    points_per_unit: f32,
    width_safety: f32,
    line_height_factor: f32,
}

impl<'a> Typesetter<'a> {
    pub fn new(
        measure: &'a dyn TextMeasure,
        geometry: &PageGeometry,
        metrics: &LayoutMetrics,
    ) -> Self {
        Self {
            measure,
            points_per_unit: geometry.points_per_unit,
            width_safety: metrics.width_safety,
            line_height_factor: metrics.line_height_factor,
        }
    }

    pub fn text_width(&self, text: &str, face: FontFace, size: f32) -> f32 {
        self.measure.text_width(text, face, size) * self.width_safety / self.points_per_unit
    }

    pub fn line_height(&self, size: f32) -> f32 {
        size * self.line_height_factor / self.points_per_unit
    }

    pub fn wrap(&self, text: &str, face: FontFace, size: f32, max_width: f32) -> Vec<String> {
        wrap_text(text, max_width, |s| self.text_width(s, face, size))
    }
}

/// Vertical position from the page top while one page is being filled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    pub y: f32,
}

impl Cursor {
    pub fn top(geometry: &PageGeometry) -> Self {
        Self {
            y: geometry.content_top(),
        }
    }

    pub fn advance(self, by: f32) -> Self {
        Self { y: self.y + by }
    }

    pub fn is_at_top(self, geometry: &PageGeometry) -> bool {
        self.y <= geometry.content_top()
    }
}

/// Pages of one layout run.
struct PageSink {
    done: Vec<LayoutPage>,
    current: LayoutPage,
}

impl PageSink {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: LayoutPage::default(),
        }
    }

    fn page_number(&self) -> usize {
        self.done.len() + 1
    }

    fn new_page(&mut self, geometry: &PageGeometry) -> Cursor {
        self.done.push(std::mem::take(&mut self.current));
        Cursor::top(geometry)
    }

    fn push(&mut self, instruction: DrawInstruction) {
        self.current.instructions.push(instruction);
    }

    fn finish(mut self) -> Vec<LayoutPage> {
        self.done.push(self.current);
        self.done
    }
}

/// A block measured and laid out relative to its own top edge.
struct Prepared {
    extent: f32,
    instructions: Vec<DrawInstruction>,
}

pub struct PageLayoutEngine<'a> {
    geometry: PageGeometry,
    metrics: LayoutMetrics,
    typesetter: Typesetter<'a>,
}

impl<'a> PageLayoutEngine<'a> {
    pub fn new(
        geometry: &PageGeometry,
        metrics: &LayoutMetrics,
        measure: &'a dyn TextMeasure,
    ) -> Self {
        Self {
            geometry: *geometry,
            metrics: *metrics,
            typesetter: Typesetter::new(measure, geometry, metrics),
        }
    }

    /// Lay `blocks` out across as many pages as they need. Always returns at least one page.
    pub fn paginate(&self, blocks: &[ContentBlock]) -> Vec<LayoutPage> {
        let mut sink = PageSink::new();
        let mut cursor = Cursor::top(&self.geometry);

        for (idx, block) in blocks.iter().enumerate() {
            cursor = match block {
                ContentBlock::Title {
                    name,
                    scientific_name,
                } => {
                    let prepared = self.prepare_title(name, scientific_name);
                    self.place_whole(&mut sink, cursor, idx, prepared)
                }
                ContentBlock::Image {
                    image,
                    aspect_ratio,
                } => {
                    let prepared = self.prepare_image(image, *aspect_ratio);
                    self.place_whole(&mut sink, cursor, idx, prepared)
                }
                ContentBlock::Table { rows } => {
                    self.place_whole(&mut sink, cursor, idx, self.prepare_table(rows))
                }
                ContentBlock::Section { heading, body } => {
                    self.place_section(&mut sink, cursor, heading, body)
                }
            };
            cursor = cursor.advance(self.metrics.block_gap);
        }

        let pages = sink.finish();
        log::debug!("LAYOUT {} blocks -> {} pages", blocks.len(), pages.len());
        pages
    }

    fn fits(&self, cursor: Cursor, extent: f32) -> bool {
        cursor.y + extent <= self.geometry.content_bottom()
    }

    fn place_whole(
        &self,
        sink: &mut PageSink,
        mut cursor: Cursor,
        block_idx: usize,
        prepared: Prepared,
    ) -> Cursor {
        if !self.fits(cursor, prepared.extent) && !cursor.is_at_top(&self.geometry) {
            cursor = sink.new_page(&self.geometry);
            log::debug!(
                "LAYOUT block={} extent={:.2} overflows, moved to page {}",
                block_idx,
                prepared.extent,
                sink.page_number()
            );
        }
        if prepared.extent > self.geometry.usable_height() {
            log::warn!(
                "block {} is {:.1} tall but a page only holds {:.1}; placing it at the top of page {}",
                block_idx,
                prepared.extent,
                self.geometry.usable_height(),
                sink.page_number()
            );
        }
        log::debug!(
            "LAYOUT block={} page={} y={:.2} extent={:.2}",
            block_idx,
            sink.page_number(),
            cursor.y,
            prepared.extent
        );
        for mut instruction in prepared.instructions {
            instruction.y += cursor.y;
            sink.push(instruction);
        }
        cursor.advance(prepared.extent)
    }

    fn text_line(
        &self,
        text: String,
        y: f32,
        height: f32,
        role: Role,
        style: TextStyle,
        alignment: Alignment,
    ) -> DrawInstruction {
        DrawInstruction {
            x: self.geometry.margin,
            y,
            width: self.geometry.usable_width(),
            height,
            role,
            kind: DrawKind::TextLine {
                text,
                style,
                alignment,
            },
        }
    }

    fn prepare_title(&self, name: &str, scientific_name: &str) -> Prepared {
        let m = &self.metrics;
        let width = self.geometry.usable_width();
        let mut instructions = Vec::new();
        let mut y = 0.0;

        let lines = [
            (name, Role::Title, FontFace::SerifBold, m.title_size, m.palette.primary),
            (
                scientific_name,
                Role::ScientificName,
                FontFace::SansItalic,
                m.scientific_size,
                m.palette.accent,
            ),
        ];
        for (text, role, face, size, color) in lines {
            let line_h = self.typesetter.line_height(size);
            let style = TextStyle { face, size, color };
            for line in self.typesetter.wrap(text, face, size, width) {
                instructions.push(self.text_line(line, y, line_h, role, style, Alignment::Center));
                y += line_h;
            }
        }

        Prepared {
            extent: y,
            instructions,
        }
    }

    fn prepare_image(&self, image: &Arc<ResolvedImage>, aspect_ratio: f32) -> Prepared {
        let width = self.metrics.image_width.min(self.geometry.usable_width());
        let height = width / aspect_ratio.max(f32::EPSILON);
        Prepared {
            extent: height,
            instructions: vec![DrawInstruction {
                x: (self.geometry.width - width) / 2.0,
                y: 0.0,
                width,
                height,
                role: Role::Image,
                kind: DrawKind::Image {
                    image: Arc::clone(image),
                },
            }],
        }
    }

    fn prepare_table(&self, rows: &[TableRow]) -> Prepared {
        let m = &self.metrics;
        let pad = m.cell_padding;
        let size = m.table_size;
        let line_h = self.typesetter.line_height(size);
        let width = self.geometry.usable_width();
        let label_w = m.table_label_width;
        let value_w = width - label_w;
        let (label_text_w, value_text_w) = (label_w - 2.0 * pad, value_w - 2.0 * pad);

        let header_height = line_h + 2.0 * pad;
        let placed: Vec<PlacedRow> = rows
            .iter()
            .map(|row| {
                let ts = &self.typesetter;
                let label = ts.wrap(&row.label, FontFace::SansBold, size, label_text_w);
                let value = ts.wrap(&row.value, FontFace::Sans, size, value_text_w);
                let height = label.len().max(value.len()) as f32 * line_h + 2.0 * pad;
                PlacedRow {
                    label,
                    value,
                    height,
                }
            })
            .collect();
        let extent = header_height + placed.iter().map(|r| r.height).sum::<f32>();

        Prepared {
            extent,
            instructions: vec![DrawInstruction {
                x: self.geometry.margin,
                y: 0.0,
                width,
                height: extent,
                role: Role::Table,
                kind: DrawKind::Table(TableLayout {
                    header: ["Attribute".to_string(), "Value".to_string()],
                    header_height,
                    label_width: label_w,
                    padding: pad,
                    line_height: line_h,
                    font_size: size,
                    rows: placed,
                    header_fill: m.palette.primary,
                    header_text: m.palette.header_text,
                    text_color: m.palette.text,
                    border_color: m.palette.border,
                    border_width: m.table_border_width,
                }),
            }],
        }
    }

    fn place_section(
        &self,
        sink: &mut PageSink,
        mut cursor: Cursor,
        heading: &str,
        body: &str,
    ) -> Cursor {
        let m = &self.metrics;
        let heading_h = self.typesetter.line_height(m.heading_size);
        let line_h = self.typesetter.line_height(m.body_size);
        let lines = self
            .typesetter
            .wrap(body, FontFace::Sans, m.body_size, self.geometry.usable_width());
        let lead = heading_h + m.heading_gap;
        let extent = lead + lines.len() as f32 * line_h;

        if !self.fits(cursor, extent) && !cursor.is_at_top(&self.geometry) {
            let keep = m.min_lines_with_heading.clamp(1, lines.len());
            let room = self.geometry.content_bottom() - cursor.y - lead;
            let lines_here = if room > 0.0 { (room / line_h).floor() as usize } else { 0 };
            if lines_here < keep {
                cursor = sink.new_page(&self.geometry);
                log::debug!(
                    "LAYOUT section {heading:?} keeps heading with body, moved to page {}",
                    sink.page_number()
                );
            }
        }

        let heading_style = TextStyle {
            face: FontFace::SerifBold,
            size: m.heading_size,
            color: m.palette.primary,
        };
        let body_style = TextStyle {
            face: FontFace::Sans,
            size: m.body_size,
            color: m.palette.text,
        };

        let heading_at_top = cursor.is_at_top(&self.geometry);
        sink.push(self.text_line(
            heading.to_string(),
            cursor.y,
            heading_h,
            Role::Heading,
            heading_style,
            Alignment::Left,
        ));
        cursor = cursor.advance(lead);

        let mut placed_on_page = 0usize;
        for line in lines {
            // The first line under a heading that opened a fresh page stays
            // put even if it overflows.
            let pinned = heading_at_top && placed_on_page == 0;
            if !self.fits(cursor, line_h) && !cursor.is_at_top(&self.geometry) && !pinned {
                cursor = sink.new_page(&self.geometry);
                log::debug!(
                    "LAYOUT section {heading:?} continues on page {}",
                    sink.page_number()
                );
            }
            sink.push(self.text_line(
                line,
                cursor.y,
                line_h,
                Role::Body,
                body_style,
                Alignment::Left,
            ));
            cursor = cursor.advance(line_h);
            placed_on_page += 1;
        }
        cursor
    }
}
