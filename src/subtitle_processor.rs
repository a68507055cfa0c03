use std::fs::File;
use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use std::io::Write;
use std::path::Path;
use log::warn;

use crate::synthesis::timeline::{Ticks, TICKS_PER_MILLISECOND};

// @module: Caption model and SRT reading/writing

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2,}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

// @struct: One subtitle cue spanning one or more words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    // @field: Start on the global timeline
    pub start: Ticks,

    // @field: End on the global timeline, never before start
    pub end: Ticks,

    // @field: Space-joined words
    pub text: String,
}

impl Caption {
    pub fn new(start: Ticks, end: Ticks, text: impl Into<String>) -> Self {
        Caption {
            start,
            end: end.max(start),
            text: text.into(),
        }
    }

    /// Stand-in cue for a run that produced audio but no caption at all.
    ///
    /// Holds the first `max_words` words of `text` and spans `duration` from zero.
    pub fn placeholder(text: &str, max_words: usize, duration: Ticks) -> Self {
        let words: Vec<&str> = text.split_whitespace().take(max_words.max(1)).collect();
        Caption::new(0, duration, words.join(" "))
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        format_timestamp(self.start)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        format_timestamp(self.end)
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)
    }
}

/// Format ticks as an SRT timestamp (HH:MM:SS,mmm).
///
/// Sub-millisecond remainders are truncated, never rounded.
pub fn format_timestamp(ticks: Ticks) -> String {
    let ms = ticks / TICKS_PER_MILLISECOND;
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Parse an SRT timestamp (HH:MM:SS,mmm) into ticks
pub fn parse_timestamp(timestamp: &str) -> Result<Ticks> {
    let parts: Vec<&str> = timestamp.split(&[':', ',', '.'][..]).collect();

    if parts.len() != 4 {
        return Err(anyhow!("Invalid timestamp format: {}", timestamp));
    }

    let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
    let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
    let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
    let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

    if minutes >= 60 || seconds >= 60 || millis >= 1000 {
        return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
    }

    let ms = hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis;
    Ok(ms * TICKS_PER_MILLISECOND)
}

/// Render captions as a numbered SRT cue list.
///
/// Every cue ends with a blank line. No captions yields an empty string.
pub fn serialize_srt(captions: &[Caption]) -> String {
    let mut output = String::new();
    for (i, caption) in captions.iter().enumerate() {
        output.push_str(&format!("{}\n{}\n", i + 1, caption));
    }
    output
}

/// Write captions to an SRT file
pub fn write_to_srt<P: AsRef<Path>>(captions: &[Caption], path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;
    file.write_all(serialize_srt(captions).as_bytes())
        .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;

    Ok(())
}

/// Parse SRT content back into captions, in file order
pub fn parse_srt_string(content: &str) -> Result<Vec<Caption>> {
    let mut captions = Vec::new();

    let mut current_seq_num: Option<usize> = None;
    let mut current_times: Option<(Ticks, Ticks)> = None;
    let mut current_text = String::new();

    let mut finish_entry = |seq_num: Option<usize>, times: Option<(Ticks, Ticks)>, text: &mut String| {
        if let (Some(seq_num), Some((start, end))) = (seq_num, times) {
            if text.trim().is_empty() {
                warn!("Skipping empty subtitle entry {}", seq_num);
            } else {
                captions.push(Caption::new(start, end, text.trim()));
            }
        }
        text.clear();
    };

    for (line_number, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if current_times.is_some() {
                finish_entry(current_seq_num.take(), current_times.take(), &mut current_text);
            }
            continue;
        }

        if current_seq_num.is_none() {
            match trimmed.parse::<usize>() {
                Ok(num) => current_seq_num = Some(num),
                Err(_) => warn!("Unexpected text at line {} before sequence number: {}", line_number + 1, trimmed),
            }
            continue;
        }

        if current_times.is_none() {
            let caps = TIMESTAMP_REGEX.captures(trimmed)
                .ok_or_else(|| anyhow!("Invalid timestamp line {}: {}", line_number + 1, trimmed))?;
            let start = parse_timestamp(&format!("{}:{}:{},{}", &caps[1], &caps[2], &caps[3], &caps[4]))?;
            let end = parse_timestamp(&format!("{}:{}:{},{}", &caps[5], &caps[6], &caps[7], &caps[8]))?;
            current_times = Some((start, end));
            continue;
        }

        if !current_text.is_empty() {
            current_text.push('\n');
        }
        current_text.push_str(trimmed);
    }

    finish_entry(current_seq_num, current_times, &mut current_text);

    Ok(captions)
}
