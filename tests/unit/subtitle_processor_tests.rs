/*!
 * Tests for SRT formatting, serialization and parsing
 */

use speechsub::subtitle_processor::{
    Caption, format_timestamp, parse_srt_string, parse_timestamp, serialize_srt, write_to_srt,
};
use crate::common;

#[test]
fn test_format_timestamp_shouldBeFixedWidth() {
    for ticks in [0u64, 1, 9_999_999, 10_000_000, 599_990_000, 36_015_000_000, 3_599_999_990_000] {
        let formatted = format_timestamp(ticks);
        assert_eq!(formatted.len(), 12, "{}", formatted);
        assert_eq!(&formatted[2..3], ":");
        assert_eq!(&formatted[5..6], ":");
        assert_eq!(&formatted[8..9], ",");
    }
}

#[test]
fn test_format_timestamp_withHundredHours_shouldWidenHours() {
    assert_eq!(format_timestamp(3_600_000_000_000), "100:00:00,000");
}

#[test]
fn test_format_timestamp_shouldNeverDecreaseWithTicks() {
    let mut previous = format_timestamp(0);
    for ticks in (0..50_000_000u64).step_by(37_777) {
        let current = format_timestamp(ticks);
        assert!(parse_timestamp(&current).unwrap() >= parse_timestamp(&previous).unwrap());
        previous = current;
    }
}

#[test]
fn test_parse_timestamp_shouldInvertFormatAtMillisecondPrecision() {
    for ticks in [0u64, 10_000, 12_340_000, 36_015_000_000] {
        assert_eq!(parse_timestamp(&format_timestamp(ticks)).unwrap(), ticks);
    }
    assert_eq!(parse_timestamp(&format_timestamp(12_345)).unwrap(), 10_000);
}

#[test]
fn test_parse_timestamp_withInvalidInput_shouldFail() {
    assert!(parse_timestamp("00:00").is_err());
    assert!(parse_timestamp("00:61:00,000").is_err());
    assert!(parse_timestamp("aa:00:00,000").is_err());
}

#[test]
fn test_caption_placeholder_shouldKeepFirstWords() {
    let caption = Caption::placeholder("one two three four five six seven", 6, 10_000_000);
    assert_eq!(caption.start, 0);
    assert_eq!(caption.end, 10_000_000);
    assert_eq!(caption.text, "one two three four five six");
}

#[test]
fn test_parse_srt_string_shouldReadSerializedCaptions() {
    let captions = vec![
        Caption::new(0, 11_500_000, "Hello world. This is"),
        Caption::new(13_000_000, 20_000_000, "a test."),
    ];

    let parsed = parse_srt_string(&serialize_srt(&captions)).unwrap();
    assert_eq!(parsed, captions);
}

#[test]
fn test_parse_srt_string_withMultilineText_shouldJoinLines() {
    let content = "1\n00:00:01,000 --> 00:00:02,500\nfirst line\nsecond line\n\n2\n00:00:03,000 --> 00:00:04,000\nlast";
    let parsed = parse_srt_string(content).unwrap();

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].text, "first line\nsecond line");
    assert_eq!(parsed[0].start, 10_000_000);
    assert_eq!(parsed[1].end, 40_000_000);
}

#[test]
fn test_parse_srt_string_withBrokenTimestamp_shouldFail() {
    let content = "1\n00:00:01 -> 00:00:02\ntext\n";
    assert!(parse_srt_string(content).is_err());
}

#[test]
fn test_write_to_srt_shouldWriteSerializedText() {
    let temp_dir = common::create_temp_dir().unwrap();
    let path = temp_dir.path().join("out").join("captions.srt");
    let captions = vec![Caption::new(0, 10_000_000, "Olá mundo")];

    write_to_srt(&captions, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, "1\n00:00:00,000 --> 00:00:01,000\nOlá mundo\n\n");
}
