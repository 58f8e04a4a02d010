use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Employee identifier used for every actor, reviewer, and voter key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Matricula(pub String);

impl Matricula {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Matricula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for submitted practices.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PracticeId(pub String);

impl fmt::Display for PracticeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Organizational scope partitioning reviewer assignment and quarterly voting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Contract(pub String);

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for a checklist question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Lifecycle of a practice from submission to conclusion. Forward-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeStatus {
    AwaitingSesmtEval,
    AwaitingMgmtEval,
    AwaitingValidation,
    AwaitingQuarterlyVote,
    AwaitingAnnualVote,
    Concluded,
}

impl PracticeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PracticeStatus::AwaitingSesmtEval => "awaiting_sesmt_eval",
            PracticeStatus::AwaitingMgmtEval => "awaiting_mgmt_eval",
            PracticeStatus::AwaitingValidation => "awaiting_validation",
            PracticeStatus::AwaitingQuarterlyVote => "awaiting_quarterly_vote",
            PracticeStatus::AwaitingAnnualVote => "awaiting_annual_vote",
            PracticeStatus::Concluded => "concluded",
        }
    }

    /// True for the stages where a single reviewer must act next.
    pub const fn awaits_action(self) -> bool {
        matches!(
            self,
            PracticeStatus::AwaitingSesmtEval
                | PracticeStatus::AwaitingMgmtEval
                | PracticeStatus::AwaitingValidation
        )
    }
}

/// Which review pass produced a set of checklist responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStage {
    Sesmt,
    Management,
}

impl EvaluationStage {
    pub const fn label(self) -> &'static str {
        match self {
            EvaluationStage::Sesmt => "sesmt",
            EvaluationStage::Management => "management",
        }
    }
}

/// The two independent voting windows a published practice passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteRound {
    Quarterly,
    Annual,
}

impl VoteRound {
    pub const fn label(self) -> &'static str {
        match self {
            VoteRound::Quarterly => "quarterly",
            VoteRound::Annual => "annual",
        }
    }

    /// Practice status in which this round accepts ballots.
    pub const fn awaiting_status(self) -> PracticeStatus {
        match self {
            VoteRound::Quarterly => PracticeStatus::AwaitingQuarterlyVote,
            VoteRound::Annual => PracticeStatus::AwaitingAnnualVote,
        }
    }
}

/// Checklist question shared by both evaluation stages. Immutable once referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationItem {
    pub id: ItemId,
    pub text: String,
    pub is_eliminatory: bool,
}

/// One boolean answer submitted against a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistAnswer {
    pub item_id: ItemId,
    pub answer: bool,
}

/// Persisted response row, scoped by the stage that wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub practice_id: PracticeId,
    pub item_id: ItemId,
    pub stage: EvaluationStage,
    pub answer: bool,
    pub evaluator: Matricula,
    pub recorded_at: DateTime<Utc>,
}

/// Per-contract reviewer assignment consumed by the responsibility router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractResponsible {
    pub contract: Contract,
    pub sesmt_reviewer: Matricula,
    pub management_reviewer: Matricula,
}

/// Append-only ballot; at most one per (practice, voter, round).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub practice_id: PracticeId,
    pub voter: Matricula,
    pub round: VoteRound,
    pub cast_at: DateTime<Utc>,
}

/// The central long-lived record moving through the review workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practice {
    pub id: PracticeId,
    pub title: String,
    pub description: String,
    pub objective: String,
    pub contract: Contract,
    pub status: PracticeStatus,
    pub eliminated: bool,
    pub validated: Option<bool>,
    pub relevance: Option<u8>,
    pub current_owner: Option<Matricula>,
    pub validation_comment: Option<String>,
    pub created_by: Matricula,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Practice {
    /// Hand the pending action to the next reviewer, or to nobody.
    ///
    /// Ownership is never assigned inline elsewhere; the store invokes this
    /// exactly once per transition so the single-owner invariant stays
    /// checkable in one place.
    pub(crate) fn transfer_ownership(&mut self, next: Option<Matricula>) {
        self.current_owner = next;
    }

    /// Structural invariants every reachable practice must satisfy.
    ///
    /// An owner only exists while a stage awaits action, and an eliminated
    /// practice is always concluded and ownerless. An awaiting practice with
    /// no owner is legal: it is the stalled state left by a missing contract
    /// mapping.
    pub fn holds_invariants(&self) -> bool {
        let owner_only_while_awaiting =
            self.current_owner.is_none() || self.status.awaits_action();
        let eliminated_is_terminal = !self.eliminated
            || (self.status == PracticeStatus::Concluded && self.current_owner.is_none());
        owner_only_while_awaiting && eliminated_is_terminal
    }
}
