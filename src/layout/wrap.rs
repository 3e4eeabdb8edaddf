/// Greedily pack words into lines no wider than `max_width`.
///
/// Runs of whitespace collapse to a single space. Explicit line breaks in the
/// source start a new line, and a blank source line is kept as an empty line.
/// A word wider than a whole line is broken between characters.
pub(crate) fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let space_w = measure(" ");
    let mut lines: Vec<String> = Vec::new();

    for source_line in text.lines() {
        let mut current = String::new();
        let mut current_w: f32 = 0.0;

        for word in source_line.split_whitespace() {
            for piece in split_oversized(word, max_width, &measure) {
                let piece_w = measure(&piece);
                if current.is_empty() {
                    current_w = piece_w;
                    current = piece;
                } else if current_w + space_w + piece_w <= max_width {
                    current.push(' ');
                    current.push_str(&piece);
                    current_w += space_w + piece_w;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current_w = piece_w;
                    current = piece;
                }
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Break a word into pieces that each fit `max_width`; every piece holds at least one char.
fn split_oversized(word: &str, max_width: f32, measure: &impl Fn(&str) -> f32) -> Vec<String> {
    if measure(word) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && measure(&current) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(s: &str) -> f32 {
        s.chars().count() as f32
    }

    #[test]
    fn packs_words_greedily() {
        let lines = wrap_text("the quick brown fox jumps", 10.0, mono);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn no_line_exceeds_width() {
        let text = "Water thoroughly when the top inch of soil is dry and feed monthly in spring";
        for width in [6.0, 11.0, 17.0, 40.0] {
            for line in wrap_text(text, width, mono) {
                assert!(mono(&line) <= width, "{line:?} wider than {width}");
            }
        }
    }

    #[test]
    fn keeps_explicit_breaks_and_blank_lines() {
        let lines = wrap_text("Soil: loamy\n\nLight: bright", 40.0, mono);
        assert_eq!(lines, vec!["Soil: loamy", "", "Light: bright"]);
    }

    #[test]
    fn breaks_oversized_words() {
        let lines = wrap_text("Pseudotsuga menziesii", 5.0, mono);
        assert_eq!(lines, vec!["Pseud", "otsug", "a", "menzi", "esii"]);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        assert_eq!(wrap_text("", 10.0, mono), vec![String::new()]);
    }
}
