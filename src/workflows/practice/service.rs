use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::checklist::{self, ChecklistError, EvaluationCatalog};
use super::domain::{
    ChecklistAnswer, Contract, EvaluationResponse, EvaluationStage, Matricula, Practice,
    PracticeId, PracticeStatus, Vote, VoteRound,
};
use super::repository::{PracticeStats, PracticeStore, StageResponses, StoreError, TransitionPlan};
use super::routing::{ResponsibilityRouter, ResponsibleDirectory, RoutingWarning};

/// Draft fields supplied when a practice is submitted.
#[derive(Debug, Clone)]
pub struct PracticeDraft {
    pub title: String,
    pub description: String,
    pub objective: String,
    pub contract: Contract,
}

/// Result of a successful transition, carrying any routing gap surfaced
/// along the way.
#[derive(Debug, Clone)]
pub struct TransitionReceipt {
    pub practice: Practice,
    pub warning: Option<RoutingWarning>,
}

/// Input errors rejected before any read or write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Checklist(#[from] ChecklistError),
    #[error("relevance is required at the management stage")]
    MissingRelevance,
    #[error("relevance must be between 1 and 5 (got {0})")]
    RelevanceOutOfRange(u8),
    #[error("a rejection requires a non-empty comment")]
    MissingRejectionComment,
    #[error("practice title must not be empty")]
    EmptyTitle,
}

/// Error raised by the workflow service, split so callers can tell bad
/// input, the wrong actor, and stale state apart.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("caller {0} is not authorized to act on this practice")]
    NotOwner(Matricula),
    #[error(
        "practice already advanced past {} (currently {})",
        .expected.label(),
        .found.label()
    )]
    StaleStatus {
        expected: PracticeStatus,
        found: PracticeStatus,
    },
    #[error("a vote for this practice and round was already recorded")]
    DuplicateVote,
    #[error("voter is outside contract {0} and cannot vote in the quarterly round")]
    IneligibleVoter(Contract),
    #[error("practice not found")]
    NotFound,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => WorkflowError::NotFound,
            StoreError::StaleStatus { expected, found } => {
                WorkflowError::StaleStatus { expected, found }
            }
            StoreError::NotOwner { caller } => WorkflowError::NotOwner(caller),
            StoreError::DuplicateVote => WorkflowError::DuplicateVote,
            other => WorkflowError::Store(other),
        }
    }
}

static PRACTICE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_practice_id() -> PracticeId {
    let id = PRACTICE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PracticeId(format!("bp-{id:06}"))
}

/// Service composing the checklist engine, responsibility router, and
/// validation gate over the practice store.
pub struct PracticeWorkflowService<S, D, C> {
    store: Arc<S>,
    router: ResponsibilityRouter<D>,
    catalog: Arc<C>,
    validator: Matricula,
}

impl<S, D, C> PracticeWorkflowService<S, D, C>
where
    S: PracticeStore + 'static,
    D: ResponsibleDirectory + 'static,
    C: EvaluationCatalog + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>, catalog: Arc<C>, validator: Matricula) -> Self {
        Self {
            store,
            router: ResponsibilityRouter::new(directory),
            catalog,
            validator,
        }
    }

    /// Register a new practice awaiting its SESMT evaluation.
    ///
    /// The initial owner comes from the contract's SESMT reviewer; a missing
    /// mapping leaves the practice unassigned and is reported as a warning.
    pub fn create(
        &self,
        draft: PracticeDraft,
        creator: &Matricula,
    ) -> Result<TransitionReceipt, WorkflowError> {
        if draft.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let owner = self.router.sesmt_reviewer(&draft.contract);
        let warning = self.warn_on_gap(owner.is_none(), &draft.contract);

        let now = Utc::now();
        let practice = Practice {
            id: next_practice_id(),
            title: draft.title,
            description: draft.description,
            objective: draft.objective,
            contract: draft.contract,
            status: PracticeStatus::AwaitingSesmtEval,
            eliminated: false,
            validated: None,
            relevance: None,
            current_owner: owner,
            validation_comment: None,
            created_by: creator.clone(),
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.insert(practice)?;
        info!(practice = %stored.id.0, contract = %stored.contract.0, "practice registered");
        Ok(TransitionReceipt {
            practice: stored,
            warning,
        })
    }

    pub fn get(&self, id: &PracticeId) -> Result<Practice, WorkflowError> {
        self.store.fetch(id)?.ok_or(WorkflowError::NotFound)
    }

    /// Score the SESMT checklist pass and advance (or eliminate) the practice.
    pub fn submit_sesmt_evaluation(
        &self,
        id: &PracticeId,
        caller: &Matricula,
        answers: &[ChecklistAnswer],
    ) -> Result<TransitionReceipt, WorkflowError> {
        let items = self.catalog.active_items();
        let by_item = checklist::collect_answers(answers, &items).map_err(ValidationError::from)?;
        let outcome = checklist::evaluate(&by_item, &items);

        let practice = self.get(id)?;
        let rows = response_rows(id, EvaluationStage::Sesmt, caller, answers);

        let (plan, warning) = if outcome.eliminated {
            (eliminated_plan(EvaluationStage::Sesmt, rows), None)
        } else {
            let next = self.router.management_reviewer(&practice.contract);
            let warning = self.warn_on_gap(next.is_none(), &practice.contract);
            let plan = TransitionPlan {
                status: PracticeStatus::AwaitingMgmtEval,
                eliminated: false,
                validated: None,
                relevance: None,
                next_owner: next,
                validation_comment: None,
                responses: Some(StageResponses {
                    stage: EvaluationStage::Sesmt,
                    rows,
                }),
            };
            (plan, warning)
        };

        let updated = self
            .store
            .transition(id, caller, PracticeStatus::AwaitingSesmtEval, plan)?;
        info!(
            practice = %updated.id.0,
            status = updated.status.label(),
            eliminated = updated.eliminated,
            "sesmt evaluation recorded"
        );
        Ok(TransitionReceipt {
            practice: updated,
            warning,
        })
    }

    /// Score the management checklist pass, record relevance, and hand the
    /// practice to the fixed validator.
    pub fn submit_management_evaluation(
        &self,
        id: &PracticeId,
        caller: &Matricula,
        answers: &[ChecklistAnswer],
        relevance: Option<u8>,
    ) -> Result<TransitionReceipt, WorkflowError> {
        let relevance = relevance.ok_or(ValidationError::MissingRelevance)?;
        if !(1..=5).contains(&relevance) {
            return Err(ValidationError::RelevanceOutOfRange(relevance).into());
        }

        let items = self.catalog.active_items();
        let by_item = checklist::collect_answers(answers, &items).map_err(ValidationError::from)?;
        let outcome = checklist::evaluate(&by_item, &items);

        let rows = response_rows(id, EvaluationStage::Management, caller, answers);

        // Elimination at this stage clears relevance alongside the other
        // terminal fields.
        let plan = if outcome.eliminated {
            eliminated_plan(EvaluationStage::Management, rows)
        } else {
            TransitionPlan {
                status: PracticeStatus::AwaitingValidation,
                eliminated: false,
                validated: None,
                relevance: Some(relevance),
                next_owner: Some(self.validator.clone()),
                validation_comment: None,
                responses: Some(StageResponses {
                    stage: EvaluationStage::Management,
                    rows,
                }),
            }
        };

        let updated = self
            .store
            .transition(id, caller, PracticeStatus::AwaitingMgmtEval, plan)?;
        info!(
            practice = %updated.id.0,
            status = updated.status.label(),
            eliminated = updated.eliminated,
            "management evaluation recorded"
        );
        Ok(TransitionReceipt {
            practice: updated,
            warning: None,
        })
    }

    /// Final accept/reject gate, performed by the configured validator.
    pub fn validate(
        &self,
        id: &PracticeId,
        caller: &Matricula,
        approve: bool,
        comment: Option<&str>,
    ) -> Result<TransitionReceipt, WorkflowError> {
        let comment = comment.map(str::trim).filter(|text| !text.is_empty());
        if !approve && comment.is_none() {
            return Err(ValidationError::MissingRejectionComment.into());
        }

        let practice = self.get(id)?;
        let plan = if approve {
            TransitionPlan {
                status: PracticeStatus::AwaitingQuarterlyVote,
                eliminated: false,
                validated: Some(true),
                relevance: practice.relevance,
                next_owner: None,
                validation_comment: None,
                responses: None,
            }
        } else {
            TransitionPlan {
                status: PracticeStatus::Concluded,
                eliminated: false,
                validated: Some(false),
                relevance: practice.relevance,
                next_owner: None,
                validation_comment: comment.map(str::to_string),
                responses: None,
            }
        };

        let updated = self
            .store
            .transition(id, caller, PracticeStatus::AwaitingValidation, plan)?;
        info!(
            practice = %updated.id.0,
            validated = approve,
            "validation decision recorded"
        );
        Ok(TransitionReceipt {
            practice: updated,
            warning: None,
        })
    }

    /// Practices the voter may still vote on in the given round.
    pub fn vote_queue(
        &self,
        voter: &Matricula,
        voter_contract: &Contract,
        round: VoteRound,
    ) -> Result<Vec<Practice>, WorkflowError> {
        let scope = match round {
            VoteRound::Quarterly => Some(voter_contract),
            VoteRound::Annual => None,
        };
        Ok(self.store.vote_queue(voter, round, scope)?)
    }

    /// Cast one ballot; duplicates surface as conflicts, never overwrites.
    pub fn cast_vote(
        &self,
        practice_id: &PracticeId,
        voter: &Matricula,
        voter_contract: &Contract,
        round: VoteRound,
    ) -> Result<Vote, WorkflowError> {
        if round == VoteRound::Quarterly {
            let practice = self.get(practice_id)?;
            if practice.contract != *voter_contract {
                return Err(WorkflowError::IneligibleVoter(practice.contract));
            }
        }

        let vote = self.store.record_vote(Vote {
            practice_id: practice_id.clone(),
            voter: voter.clone(),
            round,
            cast_at: Utc::now(),
        })?;
        info!(practice = %vote.practice_id.0, round = round.label(), "vote recorded");
        Ok(vote)
    }

    /// Ballots recorded against a practice; consumed by a future tally job.
    pub fn votes_for_practice(&self, id: &PracticeId) -> Result<Vec<Vote>, WorkflowError> {
        Ok(self.store.votes_for_practice(id)?)
    }

    /// Stored responses for one stage, for audit display.
    pub fn stage_responses(
        &self,
        id: &PracticeId,
        stage: EvaluationStage,
    ) -> Result<Vec<EvaluationResponse>, WorkflowError> {
        Ok(self.store.stage_responses(id, stage)?)
    }

    /// Read-only counts over one consistent snapshot.
    pub fn stats(&self, contract: Option<&Contract>) -> Result<PracticeStats, WorkflowError> {
        Ok(self.store.stats(contract)?)
    }

    fn warn_on_gap(&self, gap: bool, contract: &Contract) -> Option<RoutingWarning> {
        if !gap {
            return None;
        }
        let warning = RoutingWarning::UnassignedContract {
            contract: contract.clone(),
        };
        warn!(contract = %contract.0, "{}", warning.message());
        Some(warning)
    }
}

fn response_rows(
    id: &PracticeId,
    stage: EvaluationStage,
    evaluator: &Matricula,
    answers: &[ChecklistAnswer],
) -> Vec<EvaluationResponse> {
    let now = Utc::now();
    answers
        .iter()
        .map(|answer| EvaluationResponse {
            practice_id: id.clone(),
            item_id: answer.item_id,
            stage,
            answer: answer.answer,
            evaluator: evaluator.clone(),
            recorded_at: now,
        })
        .collect()
}

fn eliminated_plan(stage: EvaluationStage, rows: Vec<EvaluationResponse>) -> TransitionPlan {
    TransitionPlan {
        status: PracticeStatus::Concluded,
        eliminated: true,
        validated: None,
        relevance: None,
        next_owner: None,
        validation_comment: None,
        responses: Some(StageResponses { stage, rows }),
    }
}
