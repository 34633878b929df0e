//! Text cleanup and rating normalization

use regex::Regex;
use std::sync::OnceLock;

/// Collapses whitespace and keeps only printable ASCII and CJK characters
///
/// Control characters are dropped; any whitespace run becomes one space.
pub fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;

    for c in raw.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if !is_kept(c) {
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }

    out
}

fn is_kept(c: char) -> bool {
    matches!(c,
        '\u{21}'..='\u{7e}'
        | '\u{3000}'..='\u{303f}'   // CJK symbols and punctuation
        | '\u{3040}'..='\u{30ff}'   // Hiragana, Katakana
        | '\u{3400}'..='\u{4dbf}'   // CJK extension A
        | '\u{4e00}'..='\u{9fff}'   // CJK unified ideographs
        | '\u{ac00}'..='\u{d7af}'   // Hangul syllables
        | '\u{ff00}'..='\u{ffef}'   // Halfwidth and fullwidth forms
    )
}

/// Keeps at most `max_chars` characters; 0 means no limit
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return text.to_string();
    }
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].trim_end().to_string(),
        None => text.to_string(),
    }
}

fn rating_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*(%|/\s*(\d+(?:[.,]\d+)?))?").ok())
        .as_ref()
}

/// Normalizes a rating to the 0-10 scale
///
/// Understands `4.5/5`, `8.1/10`, `92%` and bare numbers. A number with an
/// explicit scale (`x/y` or `%`) anywhere in the text wins over a bare one.
/// A bare number is read as 5-star when ≤ 5, as x/10 when ≤ 10 and as a
/// percentage when ≤ 100. Counts written with thousands separators
/// (`1,234 votes`) are never taken for a rating.
pub fn normalize_rating(text: &str) -> Option<f64> {
    let mut bare = None;

    for caps in rating_pattern()?.captures_iter(text) {
        let Some(number) = caps.get(1) else {
            continue;
        };
        if is_grouped_count(text, number.start(), number.end()) {
            continue;
        }
        let value = parse_decimal(number.as_str())?;

        match (caps.get(2).map(|m| m.as_str()), caps.get(3)) {
            (Some("%"), _) => return Some(round_tenth((value / 10.0).clamp(0.0, 10.0))),
            (_, Some(best)) => return scale_rating(value, Some(parse_decimal(best.as_str())?)),
            _ if bare.is_none() => bare = Some(value),
            _ => {}
        }
    }

    scale_rating(bare?, None)
}

fn parse_decimal(raw: &str) -> Option<f64> {
    raw.replace(',', ".").parse().ok()
}

/// True for `1,234`-style digit groups and the pieces around them
fn is_grouped_count(text: &str, start: usize, end: usize) -> bool {
    let token = &text[start..end];
    if let Some((_, fraction)) = token.split_once(',') {
        if fraction.len() == 3 {
            return true;
        }
    }

    let before = text[..start].chars().next_back();
    let mut after = text[end..].chars();
    let joined_before = matches!(before, Some(',' | '.'))
        && text[..start].chars().rev().nth(1).is_some_and(|c| c.is_ascii_digit());
    let joined_after = matches!(after.next(), Some(','))
        && after.next().is_some_and(|c| c.is_ascii_digit());

    joined_before || joined_after
}

/// Scales a rating given together with its best possible value
pub fn scale_rating(value: f64, best: Option<f64>) -> Option<f64> {
    let scaled = match best {
        Some(best) if best > 0.0 => value / best * 10.0,
        Some(_) => return None,
        None => bare_rating(value)?,
    };
    Some(round_tenth(scaled.clamp(0.0, 10.0)))
}

fn bare_rating(value: f64) -> Option<f64> {
    if value <= 5.0 {
        Some(value * 2.0)
    } else if value <= 10.0 {
        Some(value)
    } else if value <= 100.0 {
        Some(value / 10.0)
    } else {
        None
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
