//! Plain-text renderings of a record for text-to-speech and the clipboard.

use crate::model::AttributeRecord;

/// One sentence per line; trailing full stops in the fields collapse into one.
pub fn speech_text(record: &AttributeRecord) -> String {
    let sentence = |s: &str| s.trim().trim_end_matches('.').to_string();
    format!(
        "Plant: {}. Scientific Name: {}.\nDescription: {}.\nCare Tips: {}.",
        sentence(&record.common_name),
        sentence(&record.scientific_name),
        sentence(&record.description),
        sentence(&record.care_tips),
    )
}

pub fn clipboard_text(record: &AttributeRecord) -> String {
    format!(
        "Plant: {} ({})\nDescription: {}\nCare: {}",
        record.common_name.trim(),
        record.scientific_name.trim(),
        record.description.trim(),
        record.care_tips.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AttributeRecord {
        AttributeRecord {
            common_name: "Snake Plant".into(),
            scientific_name: "Dracaena trifasciata".into(),
            description: "Stiff upright leaves.".into(),
            care_tips: "Water sparingly".into(),
            ..Default::default()
        }
    }

    #[test]
    fn speech_reads_name_description_and_care() {
        assert_eq!(
            speech_text(&record()),
            "Plant: Snake Plant. Scientific Name: Dracaena trifasciata.\n\
             Description: Stiff upright leaves.\n\
             Care Tips: Water sparingly."
        );
    }

    #[test]
    fn clipboard_puts_scientific_name_in_parentheses() {
        let text = clipboard_text(&record());
        assert_eq!(text.lines().next(), Some("Plant: Snake Plant (Dracaena trifasciata)"));
        assert_eq!(text.lines().last(), Some("Care: Water sparingly"));
    }
}
