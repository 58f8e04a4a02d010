//! Good-practice review workflow: sequential expert evaluations with an
//! elimination rule, a fixed-validator gate, and two peer-voting rounds.
//!
//! Each component owns one decision over the shared practice record: the
//! checklist engine scores a stage, the responsibility router picks the next
//! reviewer, the validation gate settles publication, and the voting ledger
//! deduplicates ballots. Every transition is applied atomically by the store
//! after re-checking the stage and owner guards.

pub mod checklist;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod routing;
pub mod service;

#[cfg(test)]
mod tests;

pub use checklist::{ChecklistError, ChecklistOutcome, EvaluationCatalog};
pub use domain::{
    ChecklistAnswer, Contract, ContractResponsible, EvaluationItem, EvaluationResponse,
    EvaluationStage, ItemId, Matricula, Practice, PracticeId, PracticeStatus, Vote, VoteRound,
};
pub use memory::{MemoryCatalog, MemoryDirectory, MemoryPracticeStore};
pub use repository::{PracticeStats, PracticeStore, StageResponses, StoreError, TransitionPlan};
pub use router::{practice_router, Caller, PracticeView};
pub use routing::{ResponsibilityRouter, ResponsibleDirectory, RoutingWarning};
pub use service::{
    PracticeDraft, PracticeWorkflowService, TransitionReceipt, ValidationError, WorkflowError,
};
