//! Console rendering of query results.

use std::io::{self, Write};

use super::QueryHit;

/// Page furniture stamped on every page of the journal PDFs the collections were built from.
const BOILERPLATE: [&str; 2] = [
    "Downloaded From: https://perspectives.pubs.asha.org/ by a University College London  User  on 06/19/2018",
    "Terms of Use: https://pubs.asha.org/ss/rights_and_permissions.aspx",
];

/// Sections this short are usually page numbers or stray headings.
const MIN_SECTION_CHARS: usize = 20;

const RULE_WIDTH: usize = 80;
const SEPARATOR_WIDTH: usize = 40;

/// Splits a stored document into readable sections.
///
/// Blank lines are dropped. A new section starts at a numbered item (a line
/// beginning with a digit and containing `". "`), an all-caps line, or a
/// line ending in `:`. Sections of [`MIN_SECTION_CHARS`] or fewer are skipped.
pub fn segment_document(document: &str) -> Vec<String> {
    let mut content = document.trim().to_string();
    for line in BOILERPLATE {
        content = content.replace(line, "");
    }

    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if starts_section(line) && !current.is_empty() {
            sections.push(current.join("\n"));
            current.clear();
        }
        current.push(line);
    }
    if !current.is_empty() {
        sections.push(current.join("\n"));
    }

    sections
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| s.chars().count() > MIN_SECTION_CHARS)
        .collect()
}

fn starts_section(line: &str) -> bool {
    let numbered = line.chars().next().is_some_and(|c| c.is_ascii_digit()) && line.contains(". ");
    numbered || is_all_caps(line) || line.ends_with(':')
}

/// At least one cased letter and no lowercase ones.
fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}

/// Prints the query header followed by each hit and its sections.
pub fn write_hits(
    out: &mut impl Write,
    query: &str,
    collection: &str,
    n_results: usize,
    hits: &[QueryHit],
) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    let separator = "-".repeat(SEPARATOR_WIDTH);

    writeln!(out, "\n{rule}")?;
    writeln!(out, "Query: {query}")?;
    writeln!(out, "Collection: {collection}")?;
    writeln!(out, "Number of results: {n_results}")?;
    writeln!(out, "{rule}\n")?;

    if hits.is_empty() {
        writeln!(out, "No results found.")?;
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        writeln!(out, "\nResult {}:", i + 1)?;
        writeln!(out, "Document: {}", hit.id)?;
        writeln!(out, "Relevance Score: {:.4}", hit.relevance())?;
        writeln!(out, "{separator}")?;

        for section in segment_document(&hit.document) {
            writeln!(out, "\n{section}")?;
            writeln!(out, "{separator}")?;
        }

        writeln!(out, "\n{rule}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_splits_on_numbered_caps_and_colon_lines() {
        let doc = "INTRODUCTION TO THE STUDY\n\
                   This paragraph describes the background in detail.\n\
                   1. First numbered item that is long enough\n\
                   Methods used in the work:\n\
                   We recruited forty participants for the trial.";
        let sections = segment_document(doc);
        assert_eq!(
            sections,
            vec![
                "INTRODUCTION TO THE STUDY\nThis paragraph describes the background in detail.",
                "1. First numbered item that is long enough",
                "Methods used in the work:\nWe recruited forty participants for the trial.",
            ]
        );
    }

    #[test]
    fn test_segment_drops_short_sections_and_blank_lines() {
        let doc = "SHORT\n\n\nABSTRACT:\nA body line long enough to keep around.";
        assert_eq!(
            segment_document(doc),
            vec!["ABSTRACT:\nA body line long enough to keep around."]
        );
    }

    #[test]
    fn test_segment_removes_boilerplate() {
        let doc = format!(
            "Results showed a clear improvement overall.\n{}\n{}",
            BOILERPLATE[0], BOILERPLATE[1]
        );
        let sections = segment_document(&doc);
        assert_eq!(sections, vec!["Results showed a clear improvement overall."]);
    }

    #[test]
    fn test_digit_without_period_space_does_not_split() {
        let doc = "Participants were assessed over time\n2024 follow-up visits were scheduled";
        assert_eq!(segment_document(doc).len(), 1);
    }

    #[test]
    fn test_write_hits_formats_relevance() {
        let hits = vec![QueryHit {
            id: "paper.pdf".to_string(),
            document: "Findings suggest strong transfer effects.".to_string(),
            distance: 0.25,
        }];
        let mut out = Vec::new();
        write_hits(&mut out, "transfer", "papers", 3, &hits).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Query: transfer"));
        assert!(text.contains("Collection: papers"));
        assert!(text.contains("Number of results: 3"));
        assert!(text.contains("Result 1:\nDocument: paper.pdf\nRelevance Score: 0.7500"));
        assert!(text.contains("\nFindings suggest strong transfer effects.\n"));
        assert!(!text.contains("No results found."));
    }

    #[test]
    fn test_write_hits_empty() {
        let mut out = Vec::new();
        write_hits(&mut out, "q", "papers", 3, &[]).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("No results found.\n"));
    }
}
