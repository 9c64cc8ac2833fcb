use crate::font::{FontRegistry, FontStyle};
use crate::types::Pt;

/// The result of wrapping one run of text at a fixed width. The sinks render
/// these lines verbatim; they never re-wrap.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    pub line_height: Pt,
}

impl WrappedText {
    pub fn height(&self) -> Pt {
        self.line_height * self.lines.len() as i32
    }
}

/// Greedy word wrap. Words accumulate while the measured line stays within
/// `max_width`; the offending word starts the next line. A single word wider
/// than `max_width` occupies its own line, unhyphenated. Hard newlines are
/// respected, so wrapping the joined output again yields the same lines.
pub fn wrap(
    text: &str,
    max_width: Pt,
    font_size: Pt,
    style: FontStyle,
    fonts: &FontRegistry,
) -> WrappedText {
    let line_height = fonts.line_height(style, font_size);
    if text.trim().is_empty() {
        return WrappedText {
            lines: Vec::new(),
            line_height,
        };
    }

    let mut lines = Vec::new();
    for segment in text.split('\n') {
        let mut current = String::new();
        for word in segment.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate_width =
                fonts.measure_text_width(style, font_size, &format!("{} {}", current, word));
            if candidate_width <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            }
        }
        // blank segments keep their vertical slot so paragraph breaks survive
        lines.push(current);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    WrappedText { lines, line_height }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_default(text: &str, max_width: f32) -> WrappedText {
        wrap(
            text,
            Pt::from_f32(max_width),
            Pt::from_i32(11),
            FontStyle::Regular,
            &FontRegistry::new(),
        )
    }

    #[test]
    fn short_text_stays_on_one_line() {
        let wrapped = wrap_default("patrol completed without incident", 400.0);
        assert_eq!(wrapped.lines.len(), 1);
        assert_eq!(wrapped.lines[0], "patrol completed without incident");
    }

    #[test]
    fn lines_respect_max_width() {
        let fonts = FontRegistry::new();
        let max = Pt::from_f32(120.0);
        let wrapped = wrap(
            "the perimeter gate was checked at every hour during the night shift",
            max,
            Pt::from_i32(11),
            FontStyle::Regular,
            &fonts,
        );
        assert!(wrapped.lines.len() > 1);
        for line in &wrapped.lines {
            let width = fonts.measure_text_width(FontStyle::Regular, Pt::from_i32(11), line);
            assert!(width <= max, "line {:?} measures {}pt", line, width.to_f32());
        }
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let wrapped = wrap_default("see https://evidence.example.com/a/very/long/url/path now", 80.0);
        assert!(
            wrapped
                .lines
                .iter()
                .any(|line| line == "https://evidence.example.com/a/very/long/url/path")
        );
    }

    #[test]
    fn hard_newlines_are_preserved() {
        let wrapped = wrap_default("first entry\n\nsecond entry", 400.0);
        assert_eq!(wrapped.lines, vec!["first entry", "", "second entry"]);
    }

    #[test]
    fn wrap_is_idempotent() {
        let text = "guard observed a vehicle idling near the loading dock and \
                    reported the plate to dispatch before resuming the patrol route";
        for width in [90.0, 140.0, 230.0, 400.0] {
            let first = wrap_default(text, width);
            let rejoined = first.lines.join("\n");
            let second = wrap_default(&rejoined, width);
            assert_eq!(first.lines, second.lines, "not idempotent at {}pt", width);
        }
    }

    #[test]
    fn height_is_lines_times_line_height() {
        let wrapped = wrap_default("alpha beta gamma delta epsilon zeta eta theta", 100.0);
        assert_eq!(
            wrapped.height().to_milli_i64(),
            wrapped.line_height.to_milli_i64() * wrapped.lines.len() as i64
        );
    }

    #[test]
    fn empty_text_has_no_lines() {
        let wrapped = wrap_default("   ", 100.0);
        assert!(wrapped.lines.is_empty());
        assert_eq!(wrapped.height(), Pt::ZERO);
    }
}
