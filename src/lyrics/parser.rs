//! LRC format parser
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [offset:-250]
//! [00:12.34] Hello world
//! [00:15.00][01:02.5] Another line
//!
//! Every call owns its own state; the parser never fails, it only skips
//! what it does not understand.

use std::time::Duration;

/// A single line of lyrics with timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    /// Position from the start of the track, offset already applied
    pub timestamp: Duration,
    /// The lyrics text, empty for instrumental gaps
    pub text: String,
}

impl LyricLine {
    fn new(time_ms: i64, text: String) -> Self {
        Self {
            timestamp: Duration::from_millis(time_ms.max(0) as u64),
            text,
        }
    }
}

/// Parse LRC formatted lyrics into lines sorted by timestamp.
pub fn parse(content: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    let mut offset_ms: i64 = 0;

    for line in content.split(['\r', '\n']) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(directive) = parse_offset(line) {
            if let Some(ms) = directive {
                offset_ms = ms;
            }
            continue;
        }

        if let Some((stamps, text)) = parse_timed_line(line) {
            lines.extend(
                stamps
                    .into_iter()
                    .map(|ms| LyricLine::new(ms.saturating_add(offset_ms), text.to_string())),
            );
        }
    }

    // Vec::sort_by_key is stable; duet lines sharing a timestamp keep file order.
    lines.sort_by_key(|l| l.timestamp);
    lines
}

/// Recognize `[offset:<signed int>]`.
///
/// Returns `None` when the line is not an offset directive at all,
/// `Some(None)` when it is one with an unusable value.
fn parse_offset(line: &str) -> Option<Option<i64>> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?;
    let (tag, value) = inner.split_once(':')?;
    if !tag.trim().eq_ignore_ascii_case("offset") {
        return None;
    }
    Some(value.trim().parse::<i64>().ok())
}

/// Parse a timed line like `[00:12.34]Lyrics` or `[00:12.34][00:15.00]Lyrics`.
fn parse_timed_line(line: &str) -> Option<(Vec<i64>, &str)> {
    let mut timestamps = Vec::new();
    let mut rest = line;

    // Extract all timestamps at the beginning
    while let Some(after_open) = rest.strip_prefix('[') {
        let Some(end) = after_open.find(']') else {
            break;
        };
        let Some(ms) = parse_timestamp(&after_open[..end]) else {
            break;
        };
        timestamps.push(ms);
        rest = &after_open[end + 1..];
    }

    if timestamps.is_empty() {
        return None;
    }

    Some((timestamps, rest.trim()))
}

/// Parse a timestamp body like "00:12", "0:12.5" or "00:12.3456" to milliseconds.
fn parse_timestamp(s: &str) -> Option<i64> {
    let (min, rest) = s.split_once(':')?;
    let (sec, frac) = match rest.split_once('.') {
        Some((sec, frac)) => (sec, Some(frac)),
        None => (rest, None),
    };

    let min = parse_digits(min, 1, 2)?;
    let sec = parse_digits(sec, 1, 2)?;
    let ms = match frac {
        None => 0,
        Some(frac) => {
            if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // Anything past milliseconds is truncated, never rounded.
            let digits = &frac[..frac.len().min(3)];
            let value: i64 = digits.parse().ok()?;
            match digits.len() {
                1 => value * 100,
                2 => value * 10,
                _ => value,
            }
        }
    };

    Some(min * 60_000 + sec * 1000 + ms)
}

fn parse_digits(s: &str, min_len: usize, max_len: usize) -> Option<i64> {
    if s.len() < min_len || s.len() > max_len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(line: &LyricLine) -> u128 {
        line.timestamp.as_millis()
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("00:12"), Some(12000));
        assert_eq!(parse_timestamp("01:30"), Some(90000));
        assert_eq!(parse_timestamp("1:02"), Some(62000));
        assert_eq!(parse_timestamp("00:12.34"), Some(12340));
        assert_eq!(parse_timestamp("00:12.340"), Some(12340));
        assert_eq!(parse_timestamp("00:12.3"), Some(12300));
        assert_eq!(parse_timestamp("00:12.3459"), Some(12345));
        assert_eq!(parse_timestamp("ti:Song"), None);
        assert_eq!(parse_timestamp("100:00"), None);
        assert_eq!(parse_timestamp("00:12."), None);
    }

    #[test]
    fn test_fraction_normalization() {
        for lrc in ["[01:02.5]x", "[01:02.50]x", "[01:02.500]x"] {
            let parsed = parse(lrc);
            assert_eq!(parsed.len(), 1);
            assert_eq!(ms(&parsed[0]), 62_500, "{lrc}");
        }
    }

    #[test]
    fn test_parse_lrc() {
        let lrc = r#"
[ti:Test Song]
[ar:Test Artist]
[00:12.34]First line
[00:15.00]Second line
"#;
        let parsed = parse(lrc);
        assert_eq!(parsed.len(), 2);
        assert_eq!(ms(&parsed[0]), 12340);
        assert_eq!(parsed[0].text, "First line");
        assert_eq!(parsed[1].text, "Second line");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("  \r\n\t \n").is_empty());
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse("not lrc at all\n[offset:abc]\n").is_empty());
        assert!(parse("[00:1x]broken\n[:]\n[").is_empty());
    }

    #[test]
    fn test_multiple_timestamps_share_text() {
        let parsed = parse("[00:20.00][00:05.00] chorus \n[00:10.00]verse");
        let got: Vec<_> = parsed.iter().map(|l| (ms(l), l.text.as_str())).collect();
        assert_eq!(
            got,
            vec![(5000, "chorus"), (10000, "verse"), (20000, "chorus")]
        );
    }

    #[test]
    fn test_empty_text_kept() {
        let parsed = parse("[00:01.00]\n[00:02.00]   ");
        assert_eq!(parsed.len(), 2);
        assert!(parsed.iter().all(|l| l.text.is_empty()));
    }

    #[test]
    fn test_line_separators() {
        let parsed = parse("[00:01]a\r[00:02]b\r\n[00:03]c\n\n[00:04]d");
        let texts: Vec<_> = parsed.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_stable_order_for_equal_timestamps() {
        let parsed = parse("[00:03.00]first voice\n[00:01.00]intro\n[00:03.00]second voice");
        let texts: Vec<_> = parsed.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["intro", "first voice", "second voice"]);
    }

    #[test]
    fn test_offset_scoping() {
        let lrc = "[00:01.00]before\n[OFFSET: 500 ]\n[00:02.00]after\n[offset:-1500]\n[00:10.00]later";
        let parsed = parse(lrc);
        let got: Vec<_> = parsed.iter().map(|l| (ms(l), l.text.as_str())).collect();
        assert_eq!(
            got,
            vec![(1000, "before"), (2500, "after"), (8500, "later")]
        );
    }

    #[test]
    fn test_offset_overwrites() {
        let parsed = parse("[offset:100]\n[offset:200]\n[00:01.00]x");
        assert_eq!(ms(&parsed[0]), 1200);
    }

    #[test]
    fn test_malformed_offset_keeps_previous() {
        let parsed = parse("[offset:300]\n[offset:abc]\n[00:01.00]x");
        assert_eq!(ms(&parsed[0]), 1300);
    }

    #[test]
    fn test_negative_offset_saturates() {
        let parsed = parse("[offset:-5000]\n[00:01.00]x");
        assert_eq!(ms(&parsed[0]), 0);
    }

    #[test]
    fn test_text_after_last_leading_tag() {
        let parsed = parse("[00:01.00][00:02.00]  hello [world]  ");
        assert_eq!(parsed.len(), 2);
        assert!(parsed.iter().all(|l| l.text == "hello [world]"));
    }

    #[test]
    fn test_deterministic_and_sorted() {
        let lrc = "[00:09]c\n[offset:250]\n[00:01]a\n[00:05.5][00:00.1]b\n[ar:x]";
        let a = parse(lrc);
        let b = parse(lrc);
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
