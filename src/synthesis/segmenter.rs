/*!
 * Text segmentation for engine-safe synthesis requests.
 *
 * The engine silently drops word timing for long inputs, so text is split
 * into segments below a character budget. Splits happen only at sentence
 * boundaries; a single sentence longer than the budget is kept whole rather
 * than cutting through words.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

// @const: Whitespace following a sentence-terminal mark
static SENTENCE_BREAK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[.?!]\s+").unwrap()
});

/// A bounded chunk of input text synthesized in one engine call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub text: String,
}

/// Split text into sentence-like units, whitespace-normalized
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BREAK_REGEX.find_iter(text) {
        // the terminal mark is a single ASCII byte
        let end = m.start() + 1;
        push_normalized(&mut units, &text[start..end]);
        start = m.end();
    }
    push_normalized(&mut units, &text[start..]);

    units
}

fn push_normalized(units: &mut Vec<String>, raw: &str) {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !normalized.is_empty() {
        units.push(normalized);
    }
}

/// Greedily pack sentences into segments of fewer than `max_chars` characters.
///
/// Joining the returned texts with single spaces reproduces the
/// whitespace-normalized input.
pub fn segment_text(text: &str, max_chars: usize) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut buffer = String::new();
    let mut buffer_chars = 0;

    for unit in split_sentences(text) {
        let unit_chars = unit.chars().count();

        if buffer.is_empty() {
            buffer = unit;
            buffer_chars = unit_chars;
        } else if buffer_chars + 1 + unit_chars < max_chars {
            buffer.push(' ');
            buffer.push_str(&unit);
            buffer_chars += 1 + unit_chars;
        } else {
            close_segment(&mut segments, std::mem::take(&mut buffer), buffer_chars, max_chars);
            buffer = unit;
            buffer_chars = unit_chars;
        }
    }

    if !buffer.is_empty() {
        close_segment(&mut segments, buffer, buffer_chars, max_chars);
    }

    segments
}

fn close_segment(segments: &mut Vec<Segment>, text: String, chars: usize, max_chars: usize) {
    if chars >= max_chars {
        debug!("Segment {} exceeds budget ({} >= {} chars), keeping it whole", segments.len(), chars, max_chars);
    }
    segments.push(Segment {
        index: segments.len(),
        text,
    });
}
