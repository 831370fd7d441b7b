//! Resume rewriting — asks the generation model for a full, JD-aligned resume
//! and packages the result as a Word document.

pub mod docx;
pub mod prompts;

use tracing::info;

use crate::enhance::prompts::{ENHANCE_PROMPT_TEMPLATE, ENHANCE_SYSTEM, NO_REFERENCE};
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{strip_code_fences, LlmError, ResponseFormat, TextModel};

/// Rewrites the resume against the job description. Blank reference material is sent as `N/A`.
pub async fn enhance_resume(
    resume_text: &str,
    jd_text: &str,
    reference_text: Option<&str>,
    model: &dyn TextModel,
) -> Result<String, LlmError> {
    let reference_text = reference_text
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(NO_REFERENCE);

    let prompt = fill_template(
        ENHANCE_PROMPT_TEMPLATE,
        &[
            ("resume_text", resume_text),
            ("jd_text", jd_text),
            ("reference_text", reference_text),
        ],
    );

    info!("Requesting resume rewrite from {}", model.model_name());
    let raw = model.complete(ENHANCE_SYSTEM, &prompt, ResponseFormat::Text).await?;

    let enhanced = strip_code_fences(&raw);
    if enhanced.is_empty() {
        return Err(LlmError::EmptyContent);
    }

    info!("Resume rewrite complete: {} chars", enhanced.len());
    Ok(enhanced.to_string())
}
