//! Quality scoring of parsed content

use crate::extract::types::ParsedGameContent;

/// Score multiplier of the generic parser
pub const GENERIC_SCORE_FACTOR: f64 = 0.9;

/// Extra confidence multiplier of the generic parser
pub const GENERIC_CONFIDENCE_FACTOR: f64 = 0.8;

/// Completeness score in `0..=100`
///
/// | Field | Points |
/// |-------|--------|
/// | title | 10 if present, +10 if 5-100 chars |
/// | description | 10 / 20 / 30 at 20 / 100 / 200 chars |
/// | instructions | 8 if present, 15 at 50 chars |
/// | features | 2 each, max 10 |
/// | tags | 2 each, max 10 |
/// | category, thumbnail, rating | 5 each |
pub fn quality_score(content: &ParsedGameContent) -> u32 {
    let mut score = 0u32;

    let title_len = content.title.chars().count();
    if title_len > 0 {
        score += 10;
        if (5..=100).contains(&title_len) {
            score += 10;
        }
    }

    score += match content.description.chars().count() {
        n if n >= 200 => 30,
        n if n >= 100 => 20,
        n if n >= 20 => 10,
        _ => 0,
    };

    if let Some(instructions) = &content.instructions {
        score += if instructions.chars().count() >= 50 { 15 } else { 8 };
    }

    score += (content.features.len() as u32 * 2).min(10);
    score += (content.tags.len() as u32 * 2).min(10);

    if content.category.is_some() {
        score += 5;
    }
    if content.thumbnail.is_some() {
        score += 5;
    }
    if content.rating.is_some() {
        score += 5;
    }

    score.min(100)
}

/// `(quality_score, confidence)` of a site-specific or generic parse
pub fn score_content(content: &ParsedGameContent, generic: bool) -> (u32, f64) {
    let base = quality_score(content);
    if generic {
        let score = (base as f64 * GENERIC_SCORE_FACTOR).round() as u32;
        let confidence = score as f64 / 100.0 * GENERIC_CONFIDENCE_FACTOR;
        (score, confidence.clamp(0.0, 1.0))
    } else {
        (base, (base as f64 / 100.0).clamp(0.0, 1.0))
    }
}
