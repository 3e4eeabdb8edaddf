mod table;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::fonts::{FontBook, FontEntry, FontFace, TextMeasure, register_fonts};
use crate::model::{
    Alignment, DrawKind, ImagePixels, LayoutPage, PageGeometry, ResolvedImage, TextStyle,
};

use table::draw_table;

fn rgb([r, g, b]: [u8; 3]) -> (f32, f32, f32) {
    (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

/// Coordinate conversion and text drawing for one page size.
pub(super) struct Frame<'a> {
    page_height: f32,
    ppu: f32,
    fonts: &'a HashMap<FontFace, FontEntry>,
    book: &'a FontBook,
}

impl Frame<'_> {
    pub(super) fn pt(&self, v: f32) -> f32 {
        v * self.ppu
    }

    /// Layout y (down from the page top) to PDF y (up from the page bottom).
    pub(super) fn pdf_y(&self, y: f32) -> f32 {
        (self.page_height - y) * self.ppu
    }

    /// Draw one line of text vertically centred in the box starting at `top`.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn text(
        &self,
        content: &mut Content,
        text: &str,
        style: &TextStyle,
        x: f32,
        top: f32,
        box_height: f32,
        width: f32,
        alignment: Alignment,
    ) {
        let Some(entry) = self.fonts.get(&style.face) else {
            return;
        };
        let bytes = entry.encode(text);
        if bytes.is_empty() {
            return;
        }
        let em = style.size / self.ppu;
        let ascender = self.book.ascender_ratio(style.face);
        let baseline = top + (box_height - em) / 2.0 + ascender * em;
        let x = match alignment {
            Alignment::Left => x,
            Alignment::Center => {
                let text_w = self.book.text_width(text, style.face, style.size) / self.ppu;
                x + ((width - text_w) / 2.0).max(0.0)
            }
        };

        let (r, g, b) = rgb(style.color);
        content.save_state();
        content.set_fill_rgb(r, g, b);
        content.begin_text();
        content.set_font(Name(entry.pdf_name.as_bytes()), style.size);
        content.next_line(self.pt(x), self.pdf_y(baseline));
        content.show(Str(&bytes));
        content.end_text();
        content.restore_state();
    }
}

/// Characters drawn with the body face, for subsetting an embedded font.
fn collect_body_chars(pages: &[LayoutPage]) -> HashSet<char> {
    let mut chars = HashSet::new();
    for instruction in pages.iter().flat_map(|p| p.instructions.iter()) {
        match &instruction.kind {
            DrawKind::TextLine { text, style, .. } if style.face == FontFace::Sans => {
                chars.extend(text.chars());
            }
            DrawKind::Table(table) => {
                for row in &table.rows {
                    chars.extend(row.value.iter().flat_map(|l| l.chars()));
                }
            }
            _ => {}
        }
    }
    chars
}

fn embed_image(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref, img: &ResolvedImage) -> Ref {
    let xobj_ref = alloc();
    let (w, h) = (img.pixel_width as i32, img.pixel_height as i32);

    match &img.pixels {
        ImagePixels::Dct { data, components } => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            if *components == 1 {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        ImagePixels::Rgb { rgb, alpha } => {
            let smask_ref = alpha.as_ref().map(|alpha| {
                let compressed = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(rgb, 6);
            let mut xobj = pdf.image_xobject(xobj_ref, &compressed);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    xobj_ref
}

/// Serialise laid-out pages into a PDF document.
pub(crate) fn render(
    pages: &[LayoutPage],
    geometry: &PageGeometry,
    book: &FontBook,
    title: Option<&str>,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    // Phase 1: fonts
    let body_chars = collect_body_chars(pages);
    let fonts = register_fonts(&mut pdf, &mut alloc, book, &body_chars)?;
    let t_fonts = t0.elapsed();

    // Phase 2: images, each distinct one embedded once
    let mut images: Vec<(Arc<ResolvedImage>, String, Ref)> = Vec::new();
    for instruction in pages.iter().flat_map(|p| p.instructions.iter()) {
        if let DrawKind::Image { image } = &instruction.kind
            && !images.iter().any(|(seen, _, _)| Arc::ptr_eq(seen, image))
        {
            let xobj_ref = embed_image(&mut pdf, &mut alloc, image);
            let name = format!("Im{}", images.len() + 1);
            images.push((Arc::clone(image), name, xobj_ref));
        }
    }
    let t_images = t0.elapsed();

    // Phase 3: page content
    let frame = Frame {
        page_height: geometry.height,
        ppu: geometry.points_per_unit,
        fonts: &fonts,
        book,
    };
    let mut all_contents: Vec<Content> = Vec::with_capacity(pages.len());
    for (pi, page) in pages.iter().enumerate() {
        let mut content = Content::new();
        for instruction in &page.instructions {
            match &instruction.kind {
                DrawKind::TextLine {
                    text,
                    style,
                    alignment,
                } => frame.text(
                    &mut content,
                    text,
                    style,
                    instruction.x,
                    instruction.y,
                    instruction.height,
                    instruction.width,
                    *alignment,
                ),
                DrawKind::Image { image } => {
                    let Some((_, name, _)) =
                        images.iter().find(|(seen, _, _)| Arc::ptr_eq(seen, image))
                    else {
                        continue;
                    };
                    content.save_state();
                    content.transform([
                        frame.pt(instruction.width),
                        0.0,
                        0.0,
                        frame.pt(instruction.height),
                        frame.pt(instruction.x),
                        frame.pdf_y(instruction.bottom()),
                    ]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                }
                DrawKind::Table(table) => draw_table(
                    &mut content,
                    &frame,
                    instruction.x,
                    instruction.y,
                    instruction.width,
                    table,
                ),
            }
        }
        log::debug!("RENDER page={} instructions={}", pi + 1, page.instructions.len());
        all_contents.push(content);
    }
    let t_content = t0.elapsed();

    // Phase 4: assembly
    let n = all_contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in all_contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let media_box = Rect::new(
        0.0,
        0.0,
        geometry.width * geometry.points_per_unit,
        geometry.height * geometry.points_per_unit,
    );
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(media_box)
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for face in FontFace::ALL {
                if let Some(entry) = fonts.get(&face) {
                    font_dict.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
                }
            }
        }
        if !images.is_empty() {
            let mut xobjects = resources.x_objects();
            for (_, name, xobj_ref) in &images {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    let info_id = alloc();
    let mut info = pdf.document_info(info_id);
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        info.title(TextStr(title));
    }
    info.producer(TextStr("LeafWise"));
    drop(info);

    let t_assembly = t0.elapsed();
    log::info!(
        "Render phases: font_embed={:.1}ms, images={:.1}ms, content={:.1}ms, assembly={:.1}ms",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_content - t_images).as_secs_f64() * 1000.0,
        (t_assembly - t_content).as_secs_f64() * 1000.0,
    );

    Ok(pdf.finish())
}
