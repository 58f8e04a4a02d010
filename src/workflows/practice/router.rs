use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::checklist::EvaluationCatalog;
use super::domain::{
    ChecklistAnswer, Contract, Matricula, Practice, PracticeId, VoteRound,
};
use super::repository::PracticeStore;
use super::routing::ResponsibleDirectory;
use super::service::{PracticeDraft, PracticeWorkflowService, TransitionReceipt, WorkflowError};

/// Identity resolved by the session collaborator and forwarded as headers.
#[derive(Debug, Clone)]
pub struct Caller {
    pub matricula: Matricula,
    pub contract: Contract,
    pub role: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let matricula = header("x-matricula");
        let contract = header("x-contract");
        match (matricula, contract) {
            (Some(matricula), Some(contract)) => Ok(Caller {
                matricula: Matricula(matricula),
                contract: Contract(contract),
                role: header("x-role"),
            }),
            _ => {
                let payload = json!({
                    "error": "missing session identity (x-matricula and x-contract headers)",
                });
                Err((StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response())
            }
        }
    }
}

/// Sanitized representation of a practice's exposed state.
#[derive(Debug, Clone, Serialize)]
pub struct PracticeView {
    pub practice_id: PracticeId,
    pub title: String,
    pub contract: Contract,
    pub status: &'static str,
    pub eliminated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<u8>,
    pub current_owner: Option<Matricula>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl PracticeView {
    pub fn from_practice(practice: Practice) -> Self {
        // A stage that awaits action with nobody assigned is the stalled
        // configuration-gap state; keep it visible on every read.
        let warning = (practice.status.awaits_action() && practice.current_owner.is_none()).then(
            || {
                format!(
                    "practice is unassigned; no reviewer mapping configured for contract {}",
                    practice.contract
                )
            },
        );
        Self {
            practice_id: practice.id,
            title: practice.title,
            contract: practice.contract,
            status: practice.status.label(),
            eliminated: practice.eliminated,
            validated: practice.validated,
            relevance: practice.relevance,
            current_owner: practice.current_owner,
            validation_comment: practice.validation_comment,
            warning,
        }
    }

    pub fn from_receipt(receipt: TransitionReceipt) -> Self {
        let warning = receipt.warning.as_ref().map(|gap| gap.message());
        let mut view = Self::from_practice(receipt.practice);
        if warning.is_some() {
            view.warning = warning;
        }
        view
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePracticeRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub objective: String,
    pub contract: Contract,
}

#[derive(Debug, Deserialize)]
pub struct ChecklistRequest {
    pub responses: Vec<ChecklistAnswer>,
}

#[derive(Debug, Deserialize)]
pub struct ManagementChecklistRequest {
    pub responses: Vec<ChecklistAnswer>,
    #[serde(default)]
    pub relevance: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct ValidationRequest {
    pub approve: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub practice_id: PracticeId,
    pub round_type: VoteRound,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub contract: Option<String>,
}

/// Router builder exposing the workflow endpoints.
pub fn practice_router<S, D, C>(service: Arc<PracticeWorkflowService<S, D, C>>) -> Router
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    Router::new()
        .route("/api/v1/practices", post(create_handler::<S, D, C>))
        .route("/api/v1/practices/stats", get(stats_handler::<S, D, C>))
        .route(
            "/api/v1/practices/:practice_id",
            get(status_handler::<S, D, C>),
        )
        .route(
            "/api/v1/practices/:practice_id/evaluations/sesmt",
            post(sesmt_evaluation_handler::<S, D, C>),
        )
        .route(
            "/api/v1/practices/:practice_id/evaluations/management",
            post(management_evaluation_handler::<S, D, C>),
        )
        .route(
            "/api/v1/practices/:practice_id/validation",
            post(validation_handler::<S, D, C>),
        )
        .route(
            "/api/v1/votes/:round/queue",
            get(vote_queue_handler::<S, D, C>),
        )
        .route("/api/v1/votes", post(cast_vote_handler::<S, D, C>))
        .with_state(service)
}

fn error_response(error: WorkflowError) -> Response {
    let status = match &error {
        WorkflowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::NotOwner(_) | WorkflowError::IneligibleVoter(_) => StatusCode::FORBIDDEN,
        WorkflowError::StaleStatus { .. } | WorkflowError::DuplicateVote => StatusCode::CONFLICT,
        WorkflowError::NotFound => StatusCode::NOT_FOUND,
        WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn create_handler<S, D, C>(
    State(service): State<Arc<PracticeWorkflowService<S, D, C>>>,
    caller: Caller,
    axum::Json(request): axum::Json<CreatePracticeRequest>,
) -> Response
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    let draft = PracticeDraft {
        title: request.title,
        description: request.description,
        objective: request.objective,
        contract: request.contract,
    };
    match service.create(draft, &caller.matricula) {
        Ok(receipt) => {
            let view = PracticeView::from_receipt(receipt);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<S, D, C>(
    State(service): State<Arc<PracticeWorkflowService<S, D, C>>>,
    _caller: Caller,
    Path(practice_id): Path<String>,
) -> Response
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    match service.get(&PracticeId(practice_id)) {
        Ok(practice) => {
            let view = PracticeView::from_practice(practice);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sesmt_evaluation_handler<S, D, C>(
    State(service): State<Arc<PracticeWorkflowService<S, D, C>>>,
    caller: Caller,
    Path(practice_id): Path<String>,
    axum::Json(request): axum::Json<ChecklistRequest>,
) -> Response
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    let id = PracticeId(practice_id);
    match service.submit_sesmt_evaluation(&id, &caller.matricula, &request.responses) {
        Ok(receipt) => {
            let view = PracticeView::from_receipt(receipt);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn management_evaluation_handler<S, D, C>(
    State(service): State<Arc<PracticeWorkflowService<S, D, C>>>,
    caller: Caller,
    Path(practice_id): Path<String>,
    axum::Json(request): axum::Json<ManagementChecklistRequest>,
) -> Response
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    let id = PracticeId(practice_id);
    match service.submit_management_evaluation(
        &id,
        &caller.matricula,
        &request.responses,
        request.relevance,
    ) {
        Ok(receipt) => {
            let view = PracticeView::from_receipt(receipt);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn validation_handler<S, D, C>(
    State(service): State<Arc<PracticeWorkflowService<S, D, C>>>,
    caller: Caller,
    Path(practice_id): Path<String>,
    axum::Json(request): axum::Json<ValidationRequest>,
) -> Response
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    let id = PracticeId(practice_id);
    match service.validate(
        &id,
        &caller.matricula,
        request.approve,
        request.comment.as_deref(),
    ) {
        Ok(receipt) => {
            let view = PracticeView::from_receipt(receipt);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn vote_queue_handler<S, D, C>(
    State(service): State<Arc<PracticeWorkflowService<S, D, C>>>,
    caller: Caller,
    Path(round): Path<VoteRound>,
) -> Response
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    match service.vote_queue(&caller.matricula, &caller.contract, round) {
        Ok(queue) => {
            let views: Vec<PracticeView> =
                queue.into_iter().map(PracticeView::from_practice).collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cast_vote_handler<S, D, C>(
    State(service): State<Arc<PracticeWorkflowService<S, D, C>>>,
    caller: Caller,
    axum::Json(request): axum::Json<CastVoteRequest>,
) -> Response
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    match service.cast_vote(
        &request.practice_id,
        &caller.matricula,
        &caller.contract,
        request.round_type,
    ) {
        Ok(vote) => (StatusCode::CREATED, axum::Json(vote)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stats_handler<S, D, C>(
    State(service): State<Arc<PracticeWorkflowService<S, D, C>>>,
    _caller: Caller,
    Query(query): Query<StatsQuery>,
) -> Response
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    let scope = query.contract.map(Contract);
    match service.stats(scope.as_ref()) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}
