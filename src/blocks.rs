use std::sync::Arc;

use crate::model::{AttributeRecord, ContentBlock, ResolvedImage, TableRow};

/// Turn a record and its resolved photo into the fixed-order report blocks:
/// title, image, attribute table, description, care tips.
///
/// Attributes and sections with empty text are left out; the table is left
/// out entirely when none of its attributes has a value.
pub fn build_blocks(record: &AttributeRecord, image: Arc<ResolvedImage>) -> Vec<ContentBlock> {
    let mut blocks = Vec::with_capacity(5);

    blocks.push(ContentBlock::Title {
        name: record.common_name.trim().to_string(),
        scientific_name: record.scientific_name.trim().to_string(),
    });

    let aspect_ratio = image.aspect_ratio();
    blocks.push(ContentBlock::Image {
        image,
        aspect_ratio,
    });

    let rows: Vec<TableRow> = record
        .attributes()
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| TableRow {
            label: label.to_string(),
            value: value.trim().to_string(),
        })
        .collect();
    if !rows.is_empty() {
        blocks.push(ContentBlock::Table { rows });
    }

    for (heading, body) in [
        ("Description", &record.description),
        ("Care Tips", &record.care_tips),
    ] {
        if !body.trim().is_empty() {
            blocks.push(ContentBlock::Section {
                heading: heading.to_string(),
                body: body.trim().to_string(),
            });
        }
    }

    blocks
}
