use pdf_writer::Content;

use crate::fonts::FontFace;
use crate::model::{Alignment, TableLayout, TextStyle};

use super::{Frame, rgb};

/// Stroke the outline of one cell. Coordinates are layout units.
fn draw_cell_border(
    content: &mut Content,
    frame: &Frame,
    table: &TableLayout,
    x: f32,
    top: f32,
    width: f32,
    height: f32,
) {
    if table.border_width <= 0.0 {
        return;
    }
    let (r, g, b) = rgb(table.border_color);
    content.save_state();
    content.set_line_width(table.border_width);
    content.set_stroke_rgb(r, g, b);
    content.rect(
        frame.pt(x),
        frame.pdf_y(top + height),
        frame.pt(width),
        frame.pt(height),
    );
    content.stroke();
    content.restore_state();
}

#[allow(clippy::too_many_arguments)]
fn draw_cell_lines(
    content: &mut Content,
    frame: &Frame,
    table: &TableLayout,
    lines: &[String],
    style: &TextStyle,
    x: f32,
    top: f32,
    width: f32,
) {
    let mut line_top = top + table.padding;
    for line in lines {
        frame.text(
            content,
            line,
            style,
            x + table.padding,
            line_top,
            table.line_height,
            width - 2.0 * table.padding,
            Alignment::Left,
        );
        line_top += table.line_height;
    }
}

/// Draw the two-column attribute table with its top-left corner at (`x`, `y`).
pub(super) fn draw_table(
    content: &mut Content,
    frame: &Frame,
    x: f32,
    y: f32,
    width: f32,
    table: &TableLayout,
) {
    let label_w = table.label_width;
    let value_w = width - label_w;
    let size = table.font_size;

    // Header row
    let (r, g, b) = rgb(table.header_fill);
    content.save_state();
    content.set_fill_rgb(r, g, b);
    content.rect(
        frame.pt(x),
        frame.pdf_y(y + table.header_height),
        frame.pt(width),
        frame.pt(table.header_height),
    );
    content.fill_nonzero();
    content.restore_state();

    let header_style = TextStyle {
        face: FontFace::SansBold,
        size,
        color: table.header_text,
    };
    for (text, cell_x, cell_w) in [
        (&table.header[0], x, label_w),
        (&table.header[1], x + label_w, value_w),
    ] {
        draw_cell_lines(
            content,
            frame,
            table,
            std::slice::from_ref(text),
            &header_style,
            cell_x,
            y,
            cell_w,
        );
        draw_cell_border(content, frame, table, cell_x, y, cell_w, table.header_height);
    }

    let label_style = TextStyle {
        face: FontFace::SansBold,
        size,
        color: table.text_color,
    };
    let value_style = TextStyle {
        face: FontFace::Sans,
        size,
        color: table.text_color,
    };

    let mut row_top = y + table.header_height;
    for (ri, row) in table.rows.iter().enumerate() {
        log::debug!(
            "TABLE row={} row_h={:.2} lines={}/{} row_top={:.2}",
            ri,
            row.height,
            row.label.len(),
            row.value.len(),
            row_top
        );
        draw_cell_lines(content, frame, table, &row.label, &label_style, x, row_top, label_w);
        draw_cell_lines(
            content,
            frame,
            table,
            &row.value,
            &value_style,
            x + label_w,
            row_top,
            value_w,
        );
        draw_cell_border(content, frame, table, x, row_top, label_w, row.height);
        draw_cell_border(content, frame, table, x + label_w, row_top, value_w, row.height);
        row_top += row.height;
    }
}
