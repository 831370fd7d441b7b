// Resume rewriting prompt templates.

pub const ENHANCE_SYSTEM: &str = "\
You are a professional resume writer and career coach specialized in ATS optimization. \
You rewrite resumes so they align with a target job description without inventing experience.";

/// Rewrite prompt template. Fill `{resume_text}`, `{jd_text}` and `{reference_text}`.
pub const ENHANCE_PROMPT_TEMPLATE: &str = r#"Given a candidate's resume, a job description, and some additional material:
- Rewrite and enhance the resume to maximize compatibility with the job description.
- Incorporate missing important skills, tools, certifications, and responsibilities the candidate demonstrably has.
- Improve phrasing to be professional, quantifiable, and impact-driven.
- Ensure ATS-friendliness: plain section headings, no tables, no columns.

Resume:
{resume_text}

Job Description:
{jd_text}

Reference Material:
{reference_text}

Return ONLY the enhanced full resume as plain text, no extra explanations."#;

/// Used when the caller supplies no reference material.
pub const NO_REFERENCE: &str = "N/A";
