use serde::Serialize;

use super::domain::{
    Contract, EvaluationResponse, EvaluationStage, Matricula, Practice, PracticeId,
    PracticeStatus, Vote, VoteRound,
};

/// Complete prescription for one state transition.
///
/// The plan carries every workflow-owned field, so the store can apply it
/// verbatim after re-checking the guard. A plan computed from a stale read
/// is harmless: the status re-check inside the store fails before anything
/// is written.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub status: PracticeStatus,
    pub eliminated: bool,
    pub validated: Option<bool>,
    pub relevance: Option<u8>,
    pub next_owner: Option<Matricula>,
    pub validation_comment: Option<String>,
    /// When present, the stage's response rows are replaced wholesale.
    pub responses: Option<StageResponses>,
}

/// Response rows that supersede a stage's previous scoring pass.
#[derive(Debug, Clone)]
pub struct StageResponses {
    pub stage: EvaluationStage,
    pub rows: Vec<EvaluationResponse>,
}

/// Consistent snapshot of practice counts for the stats projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PracticeStats {
    pub total: u64,
    pub in_review: u64,
    pub rejected_or_eliminated: u64,
}

/// Storage failures, including the guard violations detected inside the
/// store's critical section.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("practice not found")]
    NotFound,
    #[error("practice already exists")]
    AlreadyExists,
    #[error(
        "practice already advanced past {} (currently {})",
        .expected.label(),
        .found.label()
    )]
    StaleStatus {
        expected: PracticeStatus,
        found: PracticeStatus,
    },
    #[error("caller {caller} is not the current owner of the practice")]
    NotOwner { caller: Matricula },
    #[error("a vote for this practice and round was already recorded")]
    DuplicateVote,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction so the workflow service can be exercised in isolation.
///
/// `transition` and `record_vote` must each run as one atomic unit: guard
/// re-check and writes inside a single critical section (or transaction, for
/// a database-backed implementation). `stats` must compute its three counts
/// against one snapshot.
pub trait PracticeStore: Send + Sync {
    fn insert(&self, practice: Practice) -> Result<Practice, StoreError>;

    fn fetch(&self, id: &PracticeId) -> Result<Option<Practice>, StoreError>;

    /// Apply `plan` iff the stored status equals `expected` and `caller` is
    /// the current owner. Exactly one of two concurrent attempts succeeds.
    fn transition(
        &self,
        id: &PracticeId,
        caller: &Matricula,
        expected: PracticeStatus,
        plan: TransitionPlan,
    ) -> Result<Practice, StoreError>;

    /// Append-only ballot insert. Fails with [`StoreError::DuplicateVote`]
    /// when the (practice, voter, round) triple already exists, and with
    /// [`StoreError::StaleStatus`] when the practice is not in the round's
    /// awaiting state. Both checks happen inside the critical section.
    fn record_vote(&self, vote: Vote) -> Result<Vote, StoreError>;

    /// Practices awaiting the round's vote, optionally contract-scoped,
    /// excluding those the voter has already voted on in that round.
    fn vote_queue(
        &self,
        voter: &Matricula,
        round: VoteRound,
        contract: Option<&Contract>,
    ) -> Result<Vec<Practice>, StoreError>;

    /// All ballots cast on a practice; the seam a future tally job reads.
    fn votes_for_practice(&self, id: &PracticeId) -> Result<Vec<Vote>, StoreError>;

    /// Response rows currently stored for one stage of a practice.
    fn stage_responses(
        &self,
        id: &PracticeId,
        stage: EvaluationStage,
    ) -> Result<Vec<EvaluationResponse>, StoreError>;

    fn stats(&self, contract: Option<&Contract>) -> Result<PracticeStats, StoreError>;
}
