#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use leafwise_report::AttributeRecord;
use leafwise_report::model::{ImageFormat, ImagePixels, LayoutPage, ResolvedImage, Role};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A record with every field populated and short enough for one page.
pub fn sample_record() -> AttributeRecord {
    AttributeRecord {
        common_name: "Monstera".into(),
        scientific_name: "Monstera deliciosa".into(),
        description: "A climbing evergreen with large, glossy, split leaves.".into(),
        growth_habit: "Climbing vine".into(),
        ideal_climate: "Tropical".into(),
        light_requirement: "Bright, indirect light".into(),
        water_needs: "Moderate".into(),
        toxicity_to_pets: "Toxic to cats and dogs".into(),
        native_region: "Southern Mexico to Panama".into(),
        maintenance_level: "Low".into(),
        care_tips: "Water when the top few centimetres of soil are dry.".into(),
    }
}

/// Care tips long enough to push the report onto a second page, but well
/// short of filling it.
pub fn long_care_tips() -> String {
    "Water when the top two centimetres of soil feel dry and keep the pot away from cold draughts. "
        .repeat(35)
}

/// Layout-only image: pixel data is never decoded.
pub fn fake_image(width: u32, height: u32) -> Arc<ResolvedImage> {
    Arc::new(ResolvedImage {
        format: ImageFormat::Png,
        pixel_width: width,
        pixel_height: height,
        pixels: ImagePixels::Rgb {
            rgb: vec![0x80; (width * height * 3) as usize],
            alpha: None,
        },
    })
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 7) as u8, (y * 5) as u8, 120])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    buf.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([60, (x * 3) as u8, (y * 3) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    buf.into_inner()
}

/// Number of page objects in a PDF (`/Type /Page`, not `/Type /Pages`).
pub fn count_pdf_pages(pdf: &[u8]) -> usize {
    let needle = b"/Type /Page";
    pdf.windows(needle.len() + 1)
        .filter(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
        .count()
}

/// Index of the page holding the first text line of `role` equal to `text`.
pub fn page_of(pages: &[LayoutPage], role: Role, text: &str) -> Option<usize> {
    pages
        .iter()
        .position(|p| p.texts(role).contains(&text))
}

/// First parseable TrueType file in the usual system font directories.
pub fn find_truetype_font() -> Option<PathBuf> {
    let mut dirs: Vec<PathBuf> = vec![
        "/usr/share/fonts".into(),
        "/usr/local/share/fonts".into(),
        "/Library/Fonts".into(),
        "/System/Library/Fonts/Supplemental".into(),
    ];
    if let Ok(windir) = std::env::var("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }

    let mut candidates = Vec::new();
    while let Some(dir) = dirs.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                dirs.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"))
            {
                candidates.push(path);
            }
        }
    }
    candidates.sort();
    candidates.into_iter().find(|path| {
        std::fs::read(path).is_ok_and(|data| {
            ttf_parser::Face::parse(&data, 0)
                .is_ok_and(|face| "Monstera".chars().all(|ch| face.glyph_index(ch).is_some()))
        })
    })
}

/// Decompressed contents of every Flate stream in a PDF that inflates cleanly.
pub fn inflated_streams(pdf: &[u8]) -> Vec<Vec<u8>> {
    let start = b"stream\n";
    let end = b"\nendstream";
    let mut streams = Vec::new();
    let mut pos = 0;
    while let Some(off) = find(&pdf[pos..], start) {
        let at = pos + off;
        pos = at + start.len();
        if at >= 3 && &pdf[at - 3..at] == b"end" {
            continue;
        }
        let Some(len) = find(&pdf[pos..], end) else {
            break;
        };
        if let Ok(data) = miniz_oxide::inflate::decompress_to_vec_zlib(&pdf[pos..pos + len]) {
            streams.push(data);
        }
        pos += len + end.len();
    }
    streams
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
