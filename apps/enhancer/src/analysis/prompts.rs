// Compatibility analysis prompt templates.

pub const ANALYSIS_SYSTEM: &str = "\
You are an expert recruiter and career consultant analyzing resumes. \
Judge how well a candidate's resume aligns with a job description. \
Be specific and professional; back every point with a resume or JD reference.";

/// Analysis prompt template. Fill `{resume_text}` and `{jd_text}` before sending.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Given a candidate's resume and a job description (JD):
- Assess how well the resume aligns with the JD.
- Give a Compatibility Score out of 100.
- Highlight the top 3-5 strengths where the resume matches the JD.
- Point out the top 3-5 gaps or improvements needed to better align with the JD.
- Focus on skills, experiences, certifications, technical expertise, and ATS keywords.
- Avoid generic statements.

Return a JSON object with this EXACT schema (no extra fields):
{
  "compatibility_score": 72,
  "strengths": ["Five years of production Rust matches the core requirement"],
  "gaps": ["No Kubernetes experience, which the JD lists as required"],
  "summary": "Two or three sentences on overall fit."
}

Resume:
{resume_text}

Job Description:
{jd_text}
"#;
