//! Compatibility analysis — scores a resume against a job description and lists
//! strengths and gaps.
//!
//! The model is asked for a fixed JSON schema. Prose answers are still accepted
//! through the best-effort extractor in [`extract`], flagged as `free_text`.

pub mod extract;
pub mod prompts;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::extract::{clean_point, extract_score, extract_sections, is_meaningful};
use crate::analysis::prompts::{ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM};
use crate::llm_client::prompts::{fill_template, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{complete_json, LlmError, TextModel};

/// Shown in place of the score when the model did not provide one.
pub const SCORE_SENTINEL: &str = "N/A";

pub const MAX_SCORE: u8 = 100;

/// How the report was obtained from the model's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSource {
    Structured,
    FreeText,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub compatibility_score: Option<u8>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub summary: String,
    pub source: ReportSource,
    /// The model's unmodified answer, for the "full analysis" view.
    pub raw: String,
}

impl AnalysisReport {
    /// `"78/100"`, or `"N/A/100"` when no score was found.
    pub fn score_display(&self) -> String {
        match self.compatibility_score {
            Some(score) => format!("{score}/{MAX_SCORE}"),
            None => format!("{SCORE_SENTINEL}/{MAX_SCORE}"),
        }
    }
}

/// The JSON contract requested from the model. Fields are loose on purpose;
/// [`from_verdict`] validates them.
#[derive(Debug, Serialize, Deserialize)]
struct Verdict {
    compatibility_score: Option<Value>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    gaps: Vec<String>,
    #[serde(default)]
    summary: String,
}

/// Sends resume and job description to the analysis model and validates its answer.
pub async fn analyze(
    resume_text: &str,
    jd_text: &str,
    model: &dyn TextModel,
) -> Result<AnalysisReport, LlmError> {
    let prompt = fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[("resume_text", resume_text), ("jd_text", jd_text)],
    );
    let system = format!("{ANALYSIS_SYSTEM} {JSON_ONLY_INSTRUCTION}");

    info!(
        "Requesting compatibility analysis from {} ({} resume chars, {} JD chars)",
        model.model_name(),
        resume_text.len(),
        jd_text.len()
    );
    let report = match complete_json::<Verdict>(model, &system, &prompt).await {
        Ok(verdict) => from_verdict(verdict),
        Err(LlmError::Parse { source, raw }) => {
            warn!("Analysis response is not valid JSON ({source}); falling back to free-text extraction");
            from_prose(raw)
        }
        Err(e) => return Err(e),
    };

    info!(
        "Analysis complete: score={}, strengths={}, gaps={}, source={:?}",
        report.score_display(),
        report.strengths.len(),
        report.gaps.len(),
        report.source
    );
    Ok(report)
}

fn from_verdict(verdict: Verdict) -> AnalysisReport {
    // Re-serialized so the "full analysis" view still has the model's JSON.
    let raw = serde_json::to_string_pretty(&verdict).unwrap_or_default();
    AnalysisReport {
        compatibility_score: verdict.compatibility_score.as_ref().and_then(coerce_score),
        strengths: clean_points(verdict.strengths),
        gaps: clean_points(verdict.gaps),
        summary: verdict.summary.trim().to_string(),
        source: ReportSource::Structured,
        raw,
    }
}

fn from_prose(raw: String) -> AnalysisReport {
    let (strengths, gaps) = extract_sections(&raw);
    AnalysisReport {
        compatibility_score: extract_score(&raw).map(clamp_score),
        strengths,
        gaps,
        summary: String::new(),
        source: ReportSource::FreeText,
        raw,
    }
}

/// Accepts `72`, `72.4`, `"72"` or `"72/100"`; anything else is treated as missing.
fn coerce_score(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .map(|v| clamp_score(u16::try_from(v).unwrap_or(u16::MAX))),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(char::is_ascii_digit)
                .take(3)
                .collect();
            digits.parse::<u16>().ok().map(clamp_score)
        }
        _ => None,
    }
}

fn clamp_score(score: u16) -> u8 {
    u8::try_from(score.min(u16::from(MAX_SCORE))).unwrap_or(MAX_SCORE)
}

fn clean_points(points: Vec<String>) -> Vec<String> {
    points
        .iter()
        .map(|p| clean_point(p))
        .filter(|p| is_meaningful(p))
        .collect()
}
