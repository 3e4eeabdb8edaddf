//! Source photo handling: the first phase of an export.
//!
//! A photo arrives either as raw file bytes or as a self-describing data URI.
//! [`resolve`] decodes it completely so that its dimensions and pixel data are
//! plain values before layout starts; [`prefetch`] does the same on a
//! background thread and hands back a [`PendingImage`] to wait on.

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use std::thread::JoinHandle;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::Error;
use crate::model::{ImageFormat, ImagePixels, ResolvedImage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceImage {
    Bytes(Vec<u8>),
    /// `data:<mime>;base64,<payload>`
    DataUri(String),
}

impl SourceImage {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let data = std::fs::read(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        Ok(SourceImage::Bytes(data))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SourceImage::Bytes(data) => data.is_empty(),
            SourceImage::DataUri(uri) => uri.trim().is_empty(),
        }
    }

    /// The encoded image file bytes.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>, Error> {
        match self {
            SourceImage::Bytes(data) => Ok(Cow::Borrowed(data)),
            SourceImage::DataUri(uri) => parse_data_uri(uri).map(Cow::Owned),
        }
    }

    /// Embedded form used by the history store.
    pub fn to_data_uri(&self) -> Result<String, Error> {
        match self {
            SourceImage::DataUri(uri) => Ok(uri.clone()),
            SourceImage::Bytes(data) => {
                let format = sniff_format(data)?;
                Ok(format!("data:{};base64,{}", mime_type(format), STANDARD.encode(data)))
            }
        }
    }
}

fn parse_data_uri(uri: &str) -> Result<Vec<u8>, Error> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| Error::ImageDecode("not a data URI".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::ImageDecode("data URI has no payload".into()))?;
    if !header.ends_with(";base64") {
        return Err(Error::ImageDecode(format!(
            "data URI is not base64-encoded ({header})"
        )));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::ImageDecode(format!("bad base64 payload: {e}")))
}

fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Png => "image/png",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
    }
}

fn sniff_format(data: &[u8]) -> Result<ImageFormat, Error> {
    match image::guess_format(data) {
        Ok(image::ImageFormat::Jpeg) => Ok(ImageFormat::Jpeg),
        Ok(image::ImageFormat::Png) => Ok(ImageFormat::Png),
        Ok(image::ImageFormat::Gif) => Ok(ImageFormat::Gif),
        Ok(image::ImageFormat::WebP) => Ok(ImageFormat::WebP),
        Ok(other) => Err(Error::ImageDecode(format!("unsupported image format {other:?}"))),
        Err(e) => Err(Error::ImageDecode(format!("unrecognised image data: {e}"))),
    }
}

fn codec_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Gif => image::ImageFormat::Gif,
        ImageFormat::WebP => image::ImageFormat::WebP,
    }
}

/// Number of colour components declared in a JPEG's start-of-frame segment.
fn jpeg_components(data: &[u8]) -> Option<u8> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }
    let mut i = 2;
    while i + 4 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        if marker == 0xD9 || marker == 0xDA {
            break;
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if matches!(marker, 0xC0 | 0xC1 | 0xC2) && i + 9 < data.len() {
            return Some(data[i + 9]);
        }
        i += 2 + len;
    }
    None
}

/// Decode the photo and measure it. Every failure is an [`Error::ImageDecode`].
pub fn resolve(source: &SourceImage) -> Result<ResolvedImage, Error> {
    let t0 = std::time::Instant::now();
    let data = source.bytes()?;
    if data.is_empty() {
        return Err(Error::ImageDecode("empty image payload".into()));
    }
    let format = sniff_format(&data)?;
    let reader = || image::ImageReader::with_format(Cursor::new(&data[..]), codec_format(format));

    let components = match format {
        ImageFormat::Jpeg => jpeg_components(&data),
        _ => None,
    };

    let resolved = if let Some(components @ (1 | 3)) = components {
        let (w, h) = reader()
            .into_dimensions()
            .map_err(|e| Error::ImageDecode(e.to_string()))?;
        ResolvedImage {
            format,
            pixel_width: w,
            pixel_height: h,
            pixels: ImagePixels::Dct {
                data: data.into_owned(),
                components,
            },
        }
    } else {
        let decoded = reader()
            .decode()
            .map_err(|e| Error::ImageDecode(e.to_string()))?;
        let rgba: image::RgbaImage = decoded.to_rgba8();
        let (w, h) = (rgba.width(), rgba.height());
        let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
        let rgb: Vec<u8> = rgba
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());
        ResolvedImage {
            format,
            pixel_width: w,
            pixel_height: h,
            pixels: ImagePixels::Rgb { rgb, alpha },
        }
    };

    if resolved.pixel_width == 0 || resolved.pixel_height == 0 {
        return Err(Error::ImageDecode("image has zero width or height".into()));
    }

    log::debug!(
        "resolved {:?} image {}x{} in {:.1}ms",
        resolved.format,
        resolved.pixel_width,
        resolved.pixel_height,
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(resolved)
}

/// A decode running on a background thread.
pub struct PendingImage {
    handle: Result<JoinHandle<Result<ResolvedImage, Error>>, Error>,
}

impl PendingImage {
    /// Block until the decode finishes. Not cancellable once started.
    pub fn wait(self) -> Result<ResolvedImage, Error> {
        let handle = self.handle?;
        handle
            .join()
            .map_err(|_| Error::ImageDecode("decoder thread panicked".into()))?
    }
}

/// Start resolving `source` without blocking the caller.
pub fn prefetch(source: SourceImage) -> PendingImage {
    let handle = std::thread::Builder::new()
        .name("image-decode".into())
        .spawn(move || resolve(&source))
        .map_err(Error::Io);
    PendingImage { handle }
}
