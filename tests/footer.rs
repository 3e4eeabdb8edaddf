mod common;

use leafwise_report::blocks::build_blocks;
use leafwise_report::config::FooterConfig;
use leafwise_report::fonts::FontBook;
use leafwise_report::footer::stamp_footer;
use leafwise_report::layout::PageLayoutEngine;
use leafwise_report::model::{Alignment, DrawKind, Role};
use leafwise_report::{AttributeRecord, ReportConfig, compose};

#[test]
fn every_page_gets_exactly_one_footer() {
    let config = ReportConfig::default();
    let fonts = FontBook::standard();
    let record = AttributeRecord {
        description: common::long_care_tips().repeat(2),
        care_tips: common::long_care_tips().repeat(2),
        ..common::sample_record()
    };
    let pages = compose(&record, common::fake_image(300, 200), &config, &fonts);
    assert!(pages.len() >= 2);

    for (pi, page) in pages.iter().enumerate() {
        let footers: Vec<_> = page
            .instructions
            .iter()
            .filter(|i| i.role == Role::Footer)
            .collect();
        assert_eq!(footers.len(), 1, "page {pi} has {} footers", footers.len());
        let footer = footers[0];
        assert_eq!(page.instructions.last().map(|i| i.role), Some(Role::Footer));
        assert!(footer.y >= config.page.content_bottom(), "footer intrudes on content");
        assert!(footer.bottom() <= config.page.height);
        match &footer.kind {
            DrawKind::TextLine {
                text, alignment, ..
            } => {
                assert_eq!(text, "Built with LeafWise");
                assert_eq!(*alignment, Alignment::Center);
            }
            other => panic!("footer is not a text line: {other:?}"),
        }
    }
}

#[test]
fn stamping_leaves_content_untouched() {
    let config = ReportConfig::default();
    let fonts = FontBook::standard();
    let blocks = build_blocks(&common::sample_record(), common::fake_image(300, 200));
    let laid_out =
        PageLayoutEngine::new(&config.page, &config.layout, &fonts).paginate(&blocks);

    let mut stamped = laid_out.clone();
    stamp_footer(&mut stamped, &config.page, &config.footer, [0, 0, 0], &fonts);

    assert_eq!(stamped.len(), laid_out.len());
    for (before, after) in laid_out.iter().zip(&stamped) {
        assert_eq!(after.instructions.len(), before.instructions.len() + 1);
        assert_eq!(&after.instructions[..before.instructions.len()], &before.instructions[..]);
    }
}

#[test]
fn compose_matches_layout_plus_footer() {
    let config = ReportConfig::default();
    let fonts = FontBook::standard();
    let image = common::fake_image(300, 200);
    let record = common::sample_record();

    let mut expected = PageLayoutEngine::new(&config.page, &config.layout, &fonts)
        .paginate(&build_blocks(&record, image.clone()));
    stamp_footer(
        &mut expected,
        &config.page,
        &config.footer,
        config.layout.palette.accent,
        &fonts,
    );
    assert_eq!(compose(&record, image, &config, &fonts), expected);
}

#[test]
fn custom_caption_and_offset() {
    let mut config = ReportConfig::default();
    config.footer = FooterConfig {
        caption: "Printed from the greenhouse log".into(),
        size: 8.0,
        bottom_offset: 6.0,
    };
    let fonts = FontBook::standard();
    let pages = compose(&common::sample_record(), common::fake_image(10, 10), &config, &fonts);
    let footer = pages[0].instructions.last().expect("footer");
    assert_eq!(pages[0].texts(Role::Footer), ["Printed from the greenhouse log"]);
    assert!(footer.y < config.page.height - 6.0);
    assert!(footer.y > config.page.height - 6.0 - 8.0 / config.page.points_per_unit);
}
