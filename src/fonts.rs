use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use serde::{Deserialize, Serialize};
use ttf_parser::Face;

use crate::error::Error;

/// The four faces a report is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    SerifBold,
    Sans,
    SansBold,
    SansItalic,
}

impl FontFace {
    pub const ALL: [FontFace; 4] = [
        FontFace::SerifBold,
        FontFace::Sans,
        FontFace::SansBold,
        FontFace::SansItalic,
    ];

    fn index(self) -> usize {
        match self {
            FontFace::SerifBold => 0,
            FontFace::Sans => 1,
            FontFace::SansBold => 2,
            FontFace::SansItalic => 3,
        }
    }

    pub(crate) fn base_font(self) -> &'static str {
        match self {
            FontFace::SerifBold => "Times-Bold",
            FontFace::Sans => "Helvetica",
            FontFace::SansBold => "Helvetica-Bold",
            FontFace::SansItalic => "Helvetica-Oblique",
        }
    }

    pub(crate) fn pdf_name(self) -> &'static str {
        match self {
            FontFace::SerifBold => "F1",
            FontFace::Sans => "F2",
            FontFace::SansBold => "F3",
            FontFace::SansItalic => "F4",
        }
    }
}

/// Text measuring primitive used by the layout engine.
pub trait TextMeasure {
    /// Advance width of `text` in points.
    fn text_width(&self, text: &str, face: FontFace, size: f32) -> f32;
    /// Ascent above the baseline as a fraction of the font size.
    fn ascender_ratio(&self, face: FontFace) -> f32;
}

/// Every character counts as the same fraction of an em.
#[derive(Clone, Copy, Debug)]
pub struct FixedWidthMeasure {
    pub em_fraction: f32,
}

impl TextMeasure for FixedWidthMeasure {
    fn text_width(&self, text: &str, _face: FontFace, size: f32) -> f32 {
        text.chars().count() as f32 * self.em_fraction * size
    }

    fn ascender_ratio(&self, _face: FontFace) -> f32 {
        0.8
    }
}

// Advance widths at 1000 units/em for ASCII 32..=126, from the standard AFM files.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_BOLD_ASCII: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

/// Widths for WinAnsi bytes 32..=255. Bytes above ASCII get a conservative
/// upper bound rather than their exact advance.
fn standard_widths(ascii: &[u16; 95], upper: f32) -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32..=126 => ascii[(b - 32) as usize] as f32,
            // ellipsis, per mille, OE, em dash, trade mark, oe, AE, ae
            0x85 | 0x89 | 0x8C | 0x97 | 0x99 | 0x9C | 0xC6 | 0xE6 => 1000.0,
            _ => upper,
        })
        .collect()
}

pub(crate) struct FaceMetrics {
    widths_1000: Vec<f32>,
    char_widths_1000: Option<HashMap<char, f32>>,
    ascender_ratio: f32,
}

impl FaceMetrics {
    fn standard(face: FontFace) -> Self {
        let (widths_1000, ascender_ratio) = match face {
            FontFace::SerifBold => (standard_widths(&TIMES_BOLD_ASCII, 778.0), 0.683),
            FontFace::SansBold => (standard_widths(&HELVETICA_BOLD_ASCII, 778.0), 0.718),
            FontFace::Sans | FontFace::SansItalic => {
                (standard_widths(&HELVETICA_ASCII, 722.0), 0.718)
            }
        };
        Self {
            widths_1000,
            char_widths_1000: None,
            ascender_ratio,
        }
    }

    /// Width of a single character in 1000-units. Characters the face cannot
    /// show count as a full em so wrapping never under-estimates.
    fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000 {
            return map.get(&ch).copied().unwrap_or(1000.0);
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            1000.0
        }
    }

    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }
}

/// A TrueType/OpenType font file that replaces Helvetica for body text.
pub(crate) struct BodyFont {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) face_index: u32,
    data: Mmap,
    metrics: FaceMetrics,
}

/// Font metrics for every face of a report, and the body font file when one is configured.
pub struct FontBook {
    standard: Vec<FaceMetrics>,
    body: Option<BodyFont>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::standard()
    }
}

impl FontBook {
    /// Metrics of the built-in PDF fonts only.
    pub fn standard() -> Self {
        Self {
            standard: FontFace::ALL.iter().map(|&f| FaceMetrics::standard(f)).collect(),
            body: None,
        }
    }

    /// Use the font at `path` for body text, measured from its own advance widths.
    pub fn with_body_font(path: &Path) -> Result<Self, Error> {
        let t0 = std::time::Instant::now();
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;
        let data = unsafe { Mmap::map(&file) }
            .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;
        let face_index = 0;
        let (name, metrics) = {
            let face = Face::parse(&data, face_index)
                .map_err(|e| Error::Font(format!("{}: {e}", path.display())))?;
            let name = font_family_name(&face).unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "BodyFont".to_string())
            });
            (name, truetype_metrics(&face))
        };

        log::info!(
            "Body font {name} loaded from {} ({} glyph widths) in {:.1}ms",
            path.display(),
            metrics.char_widths_1000.as_ref().map_or(0, |m| m.len()),
            t0.elapsed().as_secs_f64() * 1000.0,
        );

        let mut book = Self::standard();
        book.body = Some(BodyFont {
            name,
            path: path.to_path_buf(),
            face_index,
            data,
            metrics,
        });
        Ok(book)
    }

    pub(crate) fn body_font(&self) -> Option<&BodyFont> {
        self.body.as_ref()
    }

    fn metrics(&self, face: FontFace) -> &FaceMetrics {
        match (&self.body, face) {
            (Some(body), FontFace::Sans) => &body.metrics,
            _ => &self.standard[face.index()],
        }
    }
}

impl TextMeasure for FontBook {
    fn text_width(&self, text: &str, face: FontFace, size: f32) -> f32 {
        self.metrics(face).text_width(text, size)
    }

    fn ascender_ratio(&self, face: FontFace) -> f32 {
        self.metrics(face).ascender_ratio
    }
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn truetype_metrics(face: &Face) -> FaceMetrics {
    let units = face.units_per_em() as f32;
    let advance_1000 = |ch: char| {
        face.glyph_index(ch)
            .and_then(|gid| face.glyph_hor_advance(gid))
            .map(|adv| adv as f32 / units * 1000.0)
    };

    let widths_1000: Vec<f32> = (32u8..=255u8)
        .map(|byte| advance_1000(winansi_to_char(byte)).unwrap_or(1000.0))
        .collect();

    let mut char_widths_1000 = HashMap::new();
    if let Some(cmap) = face.tables().cmap {
        for subtable in cmap.subtables {
            if !subtable.is_unicode() {
                continue;
            }
            subtable.codepoints(|cp| {
                if let Some(ch) = char::from_u32(cp)
                    && let Some(w) = advance_1000(ch)
                {
                    char_widths_1000.insert(ch, w);
                }
            });
        }
    }

    FaceMetrics {
        widths_1000,
        char_widths_1000: Some(char_widths_1000),
        ascender_ratio: face.ascender() as f32 / units,
    }
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}', // bullet
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

fn note_missing(missing: &mut Vec<char>, ch: char) {
    if !missing.contains(&ch) {
        missing.push(ch);
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Characters without a WinAnsi code point become `?` and are returned
/// alongside the bytes.
fn to_winansi_bytes(s: &str) -> (Vec<u8>, Vec<char>) {
    let mut missing = Vec::new();
    let bytes = s
        .chars()
        .map(|ch| match char_to_winansi(ch) {
            0 => {
                note_missing(&mut missing, ch);
                b'?'
            }
            b => b,
        })
        .collect();
    (bytes, missing)
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
/// Characters the subset has no glyph for fall back to `.notdef`.
fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> (Vec<u8>, Vec<char>) {
    let mut missing = Vec::new();
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or_else(|| {
            note_missing(&mut missing, ch);
            0
        });
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    (out, missing)
}

pub(crate) struct FontEntry {
    pub(crate) face: FontFace,
    pub(crate) pdf_name: &'static str,
    pub(crate) font_ref: Ref,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
}

impl FontEntry {
    /// Bytes for a `Tj` operand. Warns once per run about characters the font cannot show.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        let (bytes, missing) = match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        };
        if !missing.is_empty() {
            log::warn!(
                "{:?} ({}) cannot encode {:?} in {text:?}; substituted",
                self.face,
                self.pdf_name,
                missing.iter().collect::<String>(),
            );
        }
        bytes
    }
}

/// Write a font object for every face. The body font, when present, is subset
/// to `body_chars` and embedded in place of Helvetica.
pub(crate) fn register_fonts(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    book: &FontBook,
    body_chars: &HashSet<char>,
) -> Result<HashMap<FontFace, FontEntry>, Error> {
    let mut entries = HashMap::new();
    for face in FontFace::ALL {
        let font_ref = alloc();
        let char_to_gid = match (face, book.body_font()) {
            (FontFace::Sans, Some(body)) => {
                let t0 = std::time::Instant::now();
                let map = embed_truetype(
                    pdf,
                    font_ref,
                    &body.name,
                    &body.data,
                    body.face_index,
                    body_chars,
                    alloc,
                )
                .ok_or_else(|| {
                    Error::Font(format!("cannot embed {} from {}", body.name, body.path.display()))
                })?;
                log::debug!(
                    "embedded body font {} ({} glyphs) in {:.1}ms",
                    body.name,
                    map.len(),
                    t0.elapsed().as_secs_f64() * 1000.0,
                );
                Some(map)
            }
            _ => {
                pdf.type1_font(font_ref)
                    .base_font(Name(face.base_font().as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
                None
            }
        };
        entries.insert(
            face,
            FontEntry {
                face,
                pdf_name: face.pdf_name(),
                font_ref,
                char_to_gid,
            },
        );
    }
    Ok(entries)
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<HashMap<char, u16>> {
    let face = Face::parse(font_data, face_index).ok()?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            char_to_gid.insert(ch, remapper.remap(gid.0));
        }
    }

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}; embedding full font");
        font_data.to_vec()
    });

    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .filter_map(|(&ch, &new_gid)| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| (new_gid, adv as f32 / units * 1000.0))
            })
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(char_to_gid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winansi_substitutes_unmappable_chars() {
        let (bytes, missing) = to_winansi_bytes("Café – 東");
        assert_eq!(bytes, b"Caf\xE9 \x96 ?".to_vec());
        assert_eq!(missing, ['東']);

        let (bytes, missing) = to_winansi_bytes("\u{2BB}\u{14C}hi\u{2BB}a lehua");
        assert_eq!(bytes, b"??hi?a lehua".to_vec());
        assert_eq!(missing, ['\u{2BB}', '\u{14C}']);
    }

    #[test]
    fn standard_entry_keeps_every_character_position() {
        let entry = FontEntry {
            face: FontFace::SerifBold,
            pdf_name: FontFace::SerifBold.pdf_name(),
            font_ref: Ref::new(1),
            char_to_gid: None,
        };
        let text = "\u{2BB}\u{14C}hi\u{2BB}a lehua";
        assert_eq!(entry.encode(text).len(), text.chars().count());
    }

    #[test]
    fn gids_fall_back_to_notdef() {
        let map = HashMap::from([('a', 3u16), ('b', 4)]);
        let (bytes, missing) = encode_as_gids("ab\u{14C}a", &map);
        assert_eq!(bytes, [0u8, 3, 0, 4, 0, 0, 0, 3]);
        assert_eq!(missing, ['\u{14C}']);
    }

    #[test]
    fn unknown_chars_measure_wide() {
        let book = FontBook::standard();
        let narrow = book.text_width("i", FontFace::Sans, 10.0);
        let unknown = book.text_width("東", FontFace::Sans, 10.0);
        assert!((narrow - 2.22).abs() < 0.01);
        assert!((unknown - 10.0).abs() < 0.01);
    }

    #[test]
    fn bold_serif_and_sans_differ() {
        let book = FontBook::standard();
        let serif = book.text_width("Monstera", FontFace::SerifBold, 22.0);
        let sans = book.text_width("Monstera", FontFace::Sans, 22.0);
        assert!(serif > 0.0 && sans > 0.0);
        assert!((serif - sans).abs() > 0.1);
    }
}
