//! Best-effort extraction from a prose analysis, used when the model ignores the
//! JSON contract. Matching depends on the model's wording, so every field may
//! come back empty.

use std::sync::LazyLock;

use regex::Regex;

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Compatibility Score[:\s]*(\d{1,3})").expect("score pattern is valid")
});

static STRENGTHS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Strengths|Top Strengths|Strength):([\s\S]*?)(?:Gaps|Improvements|Areas to Improve|$)")
        .expect("strengths pattern is valid")
});

static GAPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Gaps|Improvements|Areas to Improve):([\s\S]*)").expect("gaps pattern is valid")
});

/// Characters trimmed from both ends of a bullet line.
const BULLET_TRIM: &[char] = &[' ', '-', '•', '\n', '\r', '\t'];

/// The first 1–3 digit number after "Compatibility Score" (case-insensitive),
/// separated from it only by colons and whitespace.
pub fn extract_score(text: &str) -> Option<u16> {
    SCORE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Lines of the strengths section and of the gaps section, in that order.
pub fn extract_sections(text: &str) -> (Vec<String>, Vec<String>) {
    let strengths = section_lines(&STRENGTHS_RE, text);
    let gaps = section_lines(&GAPS_RE, text);
    (strengths, gaps)
}

fn section_lines(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| split_points(m.as_str()))
        .unwrap_or_default()
}

fn split_points(section: &str) -> Vec<String> {
    section
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(clean_point)
        .filter(|point| is_meaningful(point))
        .collect()
}

/// Strips bullet glyphs and surrounding whitespace from a single point.
pub fn clean_point(point: &str) -> String {
    point.trim_matches(BULLET_TRIM).replace('•', "").trim().to_string()
}

/// Drops blank points, bare bold markers and echoes of the prompt's "Top 3-5" headings.
pub fn is_meaningful(point: &str) -> bool {
    let point = point.trim();
    !point.is_empty() && point != "**" && !point.contains("Top 3")
}
