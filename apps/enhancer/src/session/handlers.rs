//! Axum route handlers for the resume enhancement flow.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::{analyze, AnalysisReport};
use crate::documents::{extract_text, DocumentKind, PageJoin};
use crate::enhance::docx::{export_docx, render_docx, DOCX_MIME, DOWNLOAD_FILE_NAME};
use crate::enhance::enhance_resume;
use crate::errors::AppError;
use crate::session::{EnhancedResume, Session};
use crate::state::AppState;

pub const RESUME_FIELD: &str = "resume";
pub const JD_FIELD: &str = "job_description";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub resume_chars: usize,
    pub jd_chars: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub resume_chars: usize,
    pub jd_chars: usize,
    pub analysis: Option<AnalysisResponse>,
    pub enhanced_resume: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    /// e.g. `"78/100"` or `"N/A/100"`.
    pub score_display: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EnhanceRequest {
    pub reference_text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnhanceResponse {
    pub session_id: Uuid,
    pub enhanced_resume: String,
    pub download_url: String,
}

impl From<AnalysisReport> for AnalysisResponse {
    fn from(report: AnalysisReport) -> Self {
        Self {
            score_display: report.score_display(),
            report,
        }
    }
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            created_at: session.created_at,
            resume_chars: session.resume_text.chars().count(),
            jd_chars: session.jd_text.chars().count(),
            analysis: session.analysis.clone().map(AnalysisResponse::from),
            enhanced_resume: session.enhanced.as_ref().map(|e| e.text.clone()),
        }
    }
}

pub fn download_url(session_id: Uuid) -> String {
    format!("/api/v1/sessions/{session_id}/enhanced.docx")
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Multipart upload with `resume` and `job_description` file fields (PDF or plain text).
/// Extracts both documents and opens a session holding their text.
pub async fn handle_create_session(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let mut resume_text = None;
    let mut jd_text = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Malformed multipart body", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != RESUME_FIELD && name != JD_FIELD {
            continue;
        }

        let kind = DocumentKind::detect(field.file_name(), field.content_type())?;
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(&format!("Failed to read '{name}'"), e))?;

        let text = extract_upload(kind, data).await?;
        if text.trim().is_empty() {
            return Err(AppError::UnprocessableEntity(format!(
                "No text could be extracted from '{name}'"
            )));
        }

        if name == RESUME_FIELD {
            resume_text = Some(text);
        } else {
            jd_text = Some(text);
        }
    }

    let resume_text = resume_text
        .ok_or_else(|| AppError::Validation(format!("Missing '{RESUME_FIELD}' file")))?;
    let jd_text = jd_text.ok_or_else(|| AppError::Validation(format!("Missing '{JD_FIELD}' file")))?;

    let session = state.sessions.create(resume_text, jd_text).await;
    info!("Created session {}", session.id);
    debug!("{} sessions live", state.sessions.count().await);

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id,
            resume_chars: session.resume_text.chars().count(),
            jd_chars: session.jd_text.chars().count(),
        }),
    ))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let session = load_session(&state, session_id).await?;
    Ok(Json(SessionSummary::from(&session)))
}

/// POST /api/v1/sessions/:id/analysis
///
/// Scores the session's resume against its job description.
pub async fn handle_analysis(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let session = load_session(&state, session_id).await?;

    let report = analyze(&session.resume_text, &session.jd_text, state.analyst.as_ref()).await?;

    let stored = report.clone();
    state
        .sessions
        .update(session_id, |s| s.analysis = Some(stored))
        .await
        .ok_or_else(|| session_not_found(session_id))?;

    Ok(Json(AnalysisResponse::from(report)))
}

/// POST /api/v1/sessions/:id/enhance
///
/// Rewrites the resume, renders it as `.docx` and exports it to the session's
/// directory under the configured export root.
pub async fn handle_enhance(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    request: Option<Json<EnhanceRequest>>,
) -> Result<Json<EnhanceResponse>, AppError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let session = load_session(&state, session_id).await?;

    let text = enhance_resume(
        &session.resume_text,
        &session.jd_text,
        request.reference_text.as_deref(),
        state.writer.as_ref(),
    )
    .await?;

    let docx = Bytes::from(render_docx(&text)?);
    let export_dir = state.config.export_dir.join(session_id.to_string());
    let export_path = export_docx(&export_dir, &docx).await?;
    info!("Exported enhanced resume to {}", export_path.display());

    let enhanced = EnhancedResume {
        text: text.clone(),
        docx,
        export_path,
    };
    state
        .sessions
        .update(session_id, |s| s.enhanced = Some(enhanced))
        .await
        .ok_or_else(|| session_not_found(session_id))?;

    Ok(Json(EnhanceResponse {
        session_id,
        enhanced_resume: text,
        download_url: download_url(session_id),
    }))
}

/// GET /api/v1/sessions/:id/enhanced.docx
pub async fn handle_download(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = load_session(&state, session_id).await?;
    let enhanced = session.enhanced.ok_or_else(|| {
        AppError::NotFound(format!("Session {session_id} has no enhanced resume yet"))
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        enhanced.docx,
    ))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn load_session(state: &AppState, session_id: Uuid) -> Result<Session, AppError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| session_not_found(session_id))
}

fn session_not_found(session_id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {session_id} not found"))
}

/// Uploads over the body limit surface as multipart errors carrying 413.
fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{context}: upload exceeds the size limit"))
    } else {
        AppError::Validation(format!("{context}: {e}"))
    }
}

/// PDF parsing is CPU-bound, so it runs off the async workers.
async fn extract_upload(kind: DocumentKind, data: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || extract_text(kind, &data, PageJoin::Concatenate))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))??;
    Ok(text)
}
