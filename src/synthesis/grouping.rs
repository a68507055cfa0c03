/*!
 * Folding word events into multi-word captions.
 */

use crate::subtitle_processor::Caption;
use super::timeline::WordEvent;

/// Marks that let a caption close early once it is long enough
const SENTENCE_TERMINALS: [char; 4] = ['.', '?', '!', ':'];

/// Caption size limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupingRules {
    /// A caption never holds more words than this
    pub max_words: usize,
    /// Sentence punctuation closes a caption only from this many words on
    pub min_words_before_break: usize,
}

impl Default for GroupingRules {
    fn default() -> Self {
        Self {
            max_words: 6,
            min_words_before_break: 3,
        }
    }
}

fn ends_sentence(word: &str) -> bool {
    word.trim().ends_with(SENTENCE_TERMINALS)
}

/// Group ordered word events into captions.
///
/// A group closes when it reaches `max_words`, or when it has at least
/// `min_words_before_break` words and the latest word ends a sentence.
/// Whatever is left at the end becomes the last caption. Events without
/// text are skipped.
pub fn group_captions(events: &[WordEvent], rules: GroupingRules) -> Vec<Caption> {
    let max_words = rules.max_words.max(1);
    let mut captions = Vec::new();
    let mut group: Vec<&WordEvent> = Vec::with_capacity(max_words);

    for event in events.iter().filter(|e| !e.text.trim().is_empty()) {
        group.push(event);

        let full = group.len() >= max_words;
        let sentence_break = group.len() >= rules.min_words_before_break && ends_sentence(&event.text);
        if full || sentence_break {
            captions.push(close_group(&group));
            group.clear();
        }
    }

    if !group.is_empty() {
        captions.push(close_group(&group));
    }

    captions
}

fn close_group(group: &[&WordEvent]) -> Caption {
    let start = group.first().map_or(0, |e| e.offset);
    let end = group.last().map_or(start, |e| e.end());
    let text = group
        .iter()
        .map(|e| e.text.trim())
        .collect::<Vec<_>>()
        .join(" ");
    Caption::new(start, end, text)
}
