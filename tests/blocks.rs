mod common;

use leafwise_report::AttributeRecord;
use leafwise_report::blocks::build_blocks;
use leafwise_report::model::{ContentBlock, TableRow};

fn table_rows(blocks: &[ContentBlock]) -> Option<&[TableRow]> {
    blocks.iter().find_map(|b| match b {
        ContentBlock::Table { rows } => Some(rows.as_slice()),
        _ => None,
    })
}

fn kind(block: &ContentBlock) -> &'static str {
    match block {
        ContentBlock::Title { .. } => "title",
        ContentBlock::Image { .. } => "image",
        ContentBlock::Table { .. } => "table",
        ContentBlock::Section { .. } => "section",
    }
}

#[test]
fn full_record_yields_fixed_block_order() {
    let blocks = build_blocks(&common::sample_record(), common::fake_image(400, 200));
    let kinds: Vec<&str> = blocks.iter().map(kind).collect();
    assert_eq!(kinds, ["title", "image", "table", "section", "section"]);

    let headings: Vec<&str> = blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Section { heading, .. } => Some(heading.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(headings, ["Description", "Care Tips"]);

    match &blocks[1] {
        ContentBlock::Image { aspect_ratio, .. } => assert!((aspect_ratio - 2.0).abs() < 1e-6),
        other => panic!("expected image block, got {other:?}"),
    }
}

#[test]
fn table_rows_follow_attribute_order() {
    let blocks = build_blocks(&common::sample_record(), common::fake_image(10, 10));
    let labels: Vec<&str> = table_rows(&blocks)
        .expect("table block")
        .iter()
        .map(|r| r.label.as_str())
        .collect();
    assert_eq!(
        labels,
        [
            "Growth Habit",
            "Ideal Climate",
            "Light Requirement",
            "Water Needs",
            "Toxicity to Pets",
            "Native Region",
            "Maintenance Level",
        ]
    );
}

#[test]
fn empty_toxicity_leaves_six_rows() {
    let record = AttributeRecord {
        toxicity_to_pets: String::new(),
        ..common::sample_record()
    };
    let blocks = build_blocks(&record, common::fake_image(10, 10));
    let rows = table_rows(&blocks).expect("table block");
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|r| r.label != "Toxicity to Pets"));
    assert!(rows.iter().all(|r| !r.value.is_empty()));
}

#[test]
fn whitespace_only_values_count_as_empty() {
    let record = AttributeRecord {
        water_needs: "   ".into(),
        native_region: "\n".into(),
        ..common::sample_record()
    };
    let blocks = build_blocks(&record, common::fake_image(10, 10));
    let rows = table_rows(&blocks).expect("table block");
    assert_eq!(rows.len(), 5);
}

#[test]
fn no_attributes_means_no_table() {
    let record = AttributeRecord {
        common_name: "Mystery fern".into(),
        scientific_name: "Polypodiopsida".into(),
        description: "A fern.".into(),
        ..Default::default()
    };
    let blocks = build_blocks(&record, common::fake_image(10, 10));
    assert!(table_rows(&blocks).is_none());
    let kinds: Vec<&str> = blocks.iter().map(kind).collect();
    assert_eq!(kinds, ["title", "image", "section"]);
}

#[test]
fn minimal_record_keeps_title_and_image() {
    let record = AttributeRecord {
        common_name: " Pothos ".into(),
        scientific_name: "Epipremnum aureum".into(),
        ..Default::default()
    };
    let blocks = build_blocks(&record, common::fake_image(10, 10));
    assert_eq!(blocks.len(), 2);
    assert_eq!(
        blocks[0],
        ContentBlock::Title {
            name: "Pothos".into(),
            scientific_name: "Epipremnum aureum".into(),
        }
    );
}

#[test]
fn building_is_deterministic() {
    let image = common::fake_image(30, 20);
    let record = common::sample_record();
    assert_eq!(
        build_blocks(&record, image.clone()),
        build_blocks(&record, image)
    );
}

#[test]
fn record_json_uses_camel_case_and_optional_fields() {
    let record = AttributeRecord::from_json(
        r#"{"commonName": "Aloe", "scientificName": "Aloe vera", "toxicityToPets": "Mildly toxic"}"#,
    )
    .expect("parse record");
    assert_eq!(record.common_name, "Aloe");
    assert_eq!(record.toxicity_to_pets, "Mildly toxic");
    assert!(record.care_tips.is_empty());

    let missing_name = AttributeRecord::from_json(r#"{"scientificName": "Aloe vera"}"#);
    assert!(matches!(missing_name, Err(leafwise_report::Error::InvalidRecord(_))));
}
