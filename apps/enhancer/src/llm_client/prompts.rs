// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction appended to system prompts whose answer is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Substitutes `{key}` placeholders in a single pass, so text inserted for one
/// placeholder is never scanned for another.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substituted = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_known_keys() {
        let filled = fill_template(
            "Resume:\n{resume_text}\nJD:\n{jd_text}",
            &[("resume_text", "Rust dev"), ("jd_text", "Rust role")],
        );
        assert_eq!(filled, "Resume:\nRust dev\nJD:\nRust role");
    }

    #[test]
    fn test_fill_template_does_not_rescan_inserted_text() {
        let filled = fill_template(
            "{resume_text} / {jd_text}",
            &[("resume_text", "{jd_text}"), ("jd_text", "JD")],
        );
        assert_eq!(filled, "{jd_text} / JD");
    }

    #[test]
    fn test_fill_template_keeps_unknown_braces() {
        let filled = fill_template(r#"{"score": 0} {x}"#, &[("y", "1")]);
        assert_eq!(filled, r#"{"score": 0} {x}"#);
    }
}
