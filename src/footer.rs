use crate::config::FooterConfig;
use crate::fonts::{FontFace, TextMeasure};
use crate::model::{Alignment, DrawInstruction, DrawKind, LayoutPage, PageGeometry, Role, TextStyle};

/// Append the caption, centred near the bottom edge, to every page.
///
/// The caption sits inside the bottom margin, so it never collides with
/// content the layout engine placed. Calling this on an empty slice is a no-op.
pub fn stamp_footer(
    pages: &mut [LayoutPage],
    geometry: &PageGeometry,
    footer: &FooterConfig,
    color: [u8; 3],
    measure: &dyn TextMeasure,
) {
    let face = FontFace::Sans;
    let em = footer.size / geometry.points_per_unit;
    let baseline = geometry.height - footer.bottom_offset;
    let y = baseline - measure.ascender_ratio(face) * em;

    for page in pages.iter_mut() {
        page.instructions.push(DrawInstruction {
            x: 0.0,
            y,
            width: geometry.width,
            height: em,
            role: Role::Footer,
            kind: DrawKind::TextLine {
                text: footer.caption.clone(),
                style: TextStyle {
                    face,
                    size: footer.size,
                    color,
                },
                alignment: Alignment::Center,
            },
        });
    }
    log::debug!("FOOTER stamped {} pages", pages.len());
}
