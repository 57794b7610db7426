//! Axum route handlers for the interview session API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::document::extract_text;
use crate::errors::AppError;
use crate::interview::evaluator::evaluate_answer;
use crate::interview::generator::{generate_questions, OutcomeKind};
use crate::interview::session::{Annotation, QuestionStatus, SessionState};
use crate::interview::store::SharedSession;
use crate::interview::tagger::{detect_tags, tag_resume, Tag};
use crate::models::question::{OptionLetter, Question, RoundType};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub resume_text: String,
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub tags: String,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct RoundInfo {
    pub round_type: RoundType,
    pub label: &'static str,
    pub multiple_choice: bool,
}

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub resume_text: String,
    pub tags: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub round_type: RoundType,
    #[serde(default)]
    pub jd_text: String,
    /// Overrides (and replaces) the résumé uploaded to the session.
    pub resume_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub outcome: OutcomeKind,
    pub message: String,
    pub session: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Option text chosen for a multiple-choice question.
    pub selected: Option<String>,
    /// Free-text answer for an open-ended question.
    pub answer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub index: usize,
    pub status: QuestionStatus,
    pub message: String,
    pub result: Option<Annotation>,
    pub score: u32,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct UsageView {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub letter: OptionLetter,
    pub text: String,
}

/// A question as shown to the candidate. MCQ answer keys only appear in `result`
/// once the question is locked.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub kind: &'static str,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<OptionView>>,
    pub status: QuestionStatus,
    pub result: Option<Annotation>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub round: Option<RoundType>,
    pub round_label: Option<&'static str>,
    pub has_resume: bool,
    pub questions: Vec<QuestionView>,
    pub score: u32,
    pub total: usize,
    pub usage: UsageView,
}

impl SessionView {
    fn from_state(session: &SessionState) -> Self {
        let questions = session
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| question_view(session, index, question))
            .collect();
        let usage = session.usage();

        SessionView {
            session_id: session.id,
            created_at: session.created_at,
            round: session.round(),
            round_label: session.round().map(|r| r.label()),
            has_resume: session.resume_text().is_some(),
            questions,
            score: session.score(),
            total: session.mcq_count(),
            usage: UsageView {
                used: usage.count(),
                limit: usage.limit(),
                remaining: usage.remaining(),
            },
        }
    }
}

fn question_view(session: &SessionState, index: usize, question: &Question) -> QuestionView {
    let (kind, options) = match question {
        Question::Mcq(mcq) => (
            "mcq",
            Some(
                mcq.options
                    .iter()
                    .map(|(letter, text)| OptionView {
                        letter: *letter,
                        text: text.clone(),
                    })
                    .collect(),
            ),
        ),
        Question::OpenEnded(_) => ("open_ended", None),
    };

    QuestionView {
        index,
        kind,
        question: question.text().to_string(),
        options,
        status: session.status(index),
        result: session.annotation(index).cloned(),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn load_session(state: &AppState, id: Uuid) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/rounds
pub async fn handle_list_rounds() -> Json<Vec<RoundInfo>> {
    Json(
        RoundType::ALL
            .iter()
            .map(|round| RoundInfo {
                round_type: *round,
                label: round.label(),
                multiple_choice: round.is_mcq(),
            })
            .collect(),
    )
}

/// POST /api/v1/tags
pub async fn handle_tag(Json(request): Json<TagRequest>) -> Json<TagResponse> {
    Json(TagResponse {
        tags: tag_resume(&request.resume_text),
        labels: detect_tags(&request.resume_text)
            .iter()
            .map(Tag::label)
            .collect(),
    })
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let (_, session) = state.sessions.create().await;
    let session = session.lock().await;
    (StatusCode::CREATED, Json(SessionView::from_state(&session)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = load_session(&state, id).await?;
    let mut session = session.lock().await;
    session.usage_for(today());
    Ok(Json(SessionView::from_state(&session)))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

/// POST /api/v1/sessions/:id/resume
///
/// Multipart upload; the PDF goes in the `resume` field (or the first file field).
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ResumeUploadResponse>, AppError> {
    let session = load_session(&state, id).await?;

    let mut pdf = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("resume") || field.file_name().is_some() {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
            pdf = Some(data);
            break;
        }
    }
    let pdf = pdf.ok_or_else(|| AppError::Validation("Missing 'resume' file field".to_string()))?;

    let resume_text = extract_text(pdf).await?;
    let tags = tag_resume(&resume_text);
    session.lock().await.set_resume_text(resume_text.clone());
    info!("Session {id}: résumé uploaded (tags: {tags})");

    Ok(Json(ResumeUploadResponse { resume_text, tags }))
}

/// POST /api/v1/sessions/:id/generate
///
/// Replaces the session's batch with freshly generated questions. Quota, parse and
/// provider failures still answer 200 with an empty batch and the outcome.
pub async fn handle_generate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let session = load_session(&state, id).await?;
    let mut session = session.lock().await;

    if let Some(text) = request.resume_text.filter(|t| !t.trim().is_empty()) {
        session.set_resume_text(text);
    }
    let resume_text = session
        .resume_text()
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Validation("Upload a résumé before generating questions".to_string())
        })?;

    let outcome = generate_questions(
        state.llm.as_ref(),
        session.usage_for(today()),
        &resume_text,
        &request.jd_text,
        request.round_type,
    )
    .await;

    let kind = outcome.kind();
    let message = outcome.message();
    session.start_batch(request.round_type, outcome.into_questions());
    info!("Session {id}: {message}");

    Ok(Json(GenerateResponse {
        outcome: kind,
        message,
        session: SessionView::from_state(&session),
    }))
}

/// POST /api/v1/sessions/:id/questions/:index/submit
pub async fn handle_submit(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let session = load_session(&state, id).await?;
    let mut session = session.lock().await;

    let (round, question) = session.open_question(index)?;
    let question = question.clone();
    let message = match question {
        Question::Mcq(_) => {
            let selected = request.selected.ok_or_else(|| {
                AppError::Validation("'selected' is required for multiple-choice questions".to_string())
            })?;
            match session.submit_choice(index, &selected)? {
                Annotation::AnswerKey {
                    correct: true, ..
                } => "Correct!".to_string(),
                Annotation::AnswerKey {
                    correct_option,
                    correct_text,
                    ..
                } => format!("Incorrect. Answer: {correct_option}. {correct_text}"),
                Annotation::Feedback { feedback, .. } => feedback.clone(),
            }
        }
        Question::OpenEnded(open) => {
            let answer = request.answer.unwrap_or_default();
            let evaluation = evaluate_answer(state.llm.as_ref(), &open.question, &answer, round).await;
            let message = evaluation.message();
            if evaluation.is_final() {
                session.submit_feedback(index, &answer, message.clone())?;
            }
            message
        }
    };

    Ok(Json(SubmitResponse {
        index,
        status: session.status(index),
        message,
        result: session.annotation(index).cloned(),
        score: session.score(),
        total: session.mcq_count(),
    }))
}
