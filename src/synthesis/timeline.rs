/*!
 * Word timing events and the global timeline accumulator.
 *
 * Engine timing arrives relative to each segment's own synthesis call. The
 * `GlobalTimeline` rebases those events onto one continuous timeline, and
 * covers segments without timing with a proportional estimate.
 */

use bytes::{Bytes, BytesMut};
use log::debug;

/// 100-nanosecond unit used by engine timing events
pub type Ticks = u64;

pub const TICKS_PER_MILLISECOND: Ticks = 10_000;
pub const TICKS_PER_SECOND: Ticks = 10_000_000;

/// One spoken word with its start offset and duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEvent {
    pub offset: Ticks,
    pub duration: Ticks,
    pub text: String,
}

impl WordEvent {
    pub fn new(offset: Ticks, duration: Ticks, text: impl Into<String>) -> Self {
        Self {
            offset,
            duration,
            text: text.into(),
        }
    }

    /// End of the word on its timeline
    pub fn end(&self) -> Ticks {
        self.offset.saturating_add(self.duration)
    }

    /// Copy of this event moved forward by `base`
    pub fn rebased(&self, base: Ticks) -> Self {
        Self {
            offset: self.offset.saturating_add(base),
            duration: self.duration,
            text: self.text.clone(),
        }
    }
}

/// Estimated speaking time of a text: its character count times the rate
pub fn estimate_duration(text: &str, ticks_per_char: Ticks) -> Ticks {
    (text.trim().chars().count() as Ticks).saturating_mul(ticks_per_char)
}

/// Spread `total` across the words of `text`, starting at `start`.
///
/// Each word gets a share proportional to its character count. Integer
/// arithmetic keeps the split deterministic; the rounding remainder goes to
/// the last word so the durations always add up to `total`.
pub fn distribute_words(text: &str, total: Ticks, start: Ticks) -> Vec<WordEvent> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let total_chars: u128 = words.iter().map(|w| w.chars().count() as u128).sum();
    if words.is_empty() || total_chars == 0 {
        return Vec::new();
    }

    let mut events = Vec::with_capacity(words.len());
    let mut allotted: Ticks = 0;
    for (i, word) in words.iter().enumerate() {
        let duration = if i == words.len() - 1 {
            total - allotted
        } else {
            (total as u128 * word.chars().count() as u128 / total_chars) as Ticks
        };
        events.push(WordEvent::new(start.saturating_add(allotted), duration, *word));
        allotted += duration;
    }
    events
}

/// Running state of one synthesis run: offset, rebased events and audio.
///
/// Owned by a single stitching loop and never shared.
#[derive(Debug, Default)]
pub struct GlobalTimeline {
    offset: Ticks,
    events: Vec<WordEvent>,
    audio: BytesMut,
    segments: usize,
    fallback_segments: usize,
}

impl GlobalTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the next segment starts
    pub fn offset(&self) -> Ticks {
        self.offset
    }

    pub fn events(&self) -> &[WordEvent] {
        &self.events
    }

    pub fn audio_len(&self) -> usize {
        self.audio.len()
    }

    /// Number of segments appended so far
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// Number of segments covered by estimated timing
    pub fn fallback_segments(&self) -> usize {
        self.fallback_segments
    }

    pub fn append_audio(&mut self, audio: &[u8]) {
        self.audio.extend_from_slice(audio);
    }

    /// Append engine-reported events of one segment, rebased to the current
    /// offset, then move the offset past the segment plus `gap`.
    ///
    /// Offsets never move backwards: an event reported earlier than its
    /// predecessor is pinned to the predecessor's offset.
    pub fn append_engine_events(&mut self, segment_events: &[WordEvent], gap: Ticks) {
        if segment_events.is_empty() {
            return;
        }

        let base = self.offset;
        let mut floor = self.events.last().map_or(base, |e| e.offset.max(base));
        let mut segment_end = base;

        for event in segment_events {
            let mut rebased = event.rebased(base);
            if rebased.offset < floor {
                debug!(
                    "Pinning out-of-order word '{}' from {} to {}",
                    rebased.text, rebased.offset, floor
                );
                rebased.offset = floor;
            }
            floor = rebased.offset;
            segment_end = segment_end.max(rebased.end());
            self.events.push(rebased);
        }

        self.offset = segment_end.saturating_add(gap);
        self.segments += 1;
    }

    /// Cover a segment that came back without timing with estimated events
    /// and move the offset past the estimate plus `gap`.
    pub fn append_estimated_segment(&mut self, text: &str, ticks_per_char: Ticks, gap: Ticks) {
        let total = estimate_duration(text, ticks_per_char);
        let events = distribute_words(text, total, self.offset);
        self.events.extend(events);
        self.offset = self.offset.saturating_add(total).saturating_add(gap);
        self.segments += 1;
        self.fallback_segments += 1;
    }

    /// Split into the audio and the ordered global events
    pub fn into_parts(self) -> (Bytes, Vec<WordEvent>) {
        (self.audio.freeze(), self.events)
    }
}
