use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use chrono::Utc;

use super::checklist::EvaluationCatalog;
use super::domain::{
    Contract, ContractResponsible, EvaluationItem, EvaluationResponse, EvaluationStage, Matricula,
    Practice, PracticeId, PracticeStatus, Vote, VoteRound,
};
use super::repository::{PracticeStats, PracticeStore, StoreError, TransitionPlan};
use super::routing::ResponsibleDirectory;

/// In-memory store keeping all workflow tables under a single mutex.
///
/// One lock acquisition per operation gives the atomicity the trait
/// requires: guard re-checks and writes share a critical section, and stats
/// counts come from one snapshot. A database-backed store would use a
/// transaction for the same effect.
#[derive(Default)]
pub struct MemoryPracticeStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    practices: HashMap<PracticeId, Practice>,
    responses: HashMap<(PracticeId, EvaluationStage), Vec<EvaluationResponse>>,
    votes: Vec<Vote>,
    cast: BTreeSet<(PracticeId, Matricula, VoteRound)>,
}

impl MemoryPracticeStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl PracticeStore for MemoryPracticeStore {
    fn insert(&self, practice: Practice) -> Result<Practice, StoreError> {
        let mut inner = self.lock()?;
        if inner.practices.contains_key(&practice.id) {
            return Err(StoreError::AlreadyExists);
        }
        inner.practices.insert(practice.id.clone(), practice.clone());
        Ok(practice)
    }

    fn fetch(&self, id: &PracticeId) -> Result<Option<Practice>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.practices.get(id).cloned())
    }

    fn transition(
        &self,
        id: &PracticeId,
        caller: &Matricula,
        expected: PracticeStatus,
        plan: TransitionPlan,
    ) -> Result<Practice, StoreError> {
        let mut inner = self.lock()?;

        let current = inner.practices.get(id).ok_or(StoreError::NotFound)?;
        if current.status != expected {
            return Err(StoreError::StaleStatus {
                expected,
                found: current.status,
            });
        }
        if current.current_owner.as_ref() != Some(caller) {
            return Err(StoreError::NotOwner {
                caller: caller.clone(),
            });
        }

        if let Some(stage_responses) = plan.responses {
            inner
                .responses
                .insert((id.clone(), stage_responses.stage), stage_responses.rows);
        }

        let practice = inner.practices.get_mut(id).ok_or(StoreError::NotFound)?;
        practice.status = plan.status;
        practice.eliminated = plan.eliminated;
        practice.validated = plan.validated;
        practice.relevance = plan.relevance;
        practice.validation_comment = plan.validation_comment;
        practice.transfer_ownership(plan.next_owner);
        practice.updated_at = Utc::now();

        Ok(practice.clone())
    }

    fn record_vote(&self, vote: Vote) -> Result<Vote, StoreError> {
        let mut inner = self.lock()?;

        let practice = inner
            .practices
            .get(&vote.practice_id)
            .ok_or(StoreError::NotFound)?;
        let expected = vote.round.awaiting_status();
        if practice.status != expected {
            return Err(StoreError::StaleStatus {
                expected,
                found: practice.status,
            });
        }

        let key = (vote.practice_id.clone(), vote.voter.clone(), vote.round);
        if !inner.cast.insert(key) {
            return Err(StoreError::DuplicateVote);
        }
        inner.votes.push(vote.clone());
        Ok(vote)
    }

    fn vote_queue(
        &self,
        voter: &Matricula,
        round: VoteRound,
        contract: Option<&Contract>,
    ) -> Result<Vec<Practice>, StoreError> {
        let inner = self.lock()?;
        let mut queue: Vec<Practice> = inner
            .practices
            .values()
            .filter(|practice| practice.status == round.awaiting_status())
            .filter(|practice| contract.map_or(true, |scope| practice.contract == *scope))
            .filter(|practice| {
                !inner
                    .cast
                    .contains(&(practice.id.clone(), voter.clone(), round))
            })
            .cloned()
            .collect();
        queue.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(queue)
    }

    fn votes_for_practice(&self, id: &PracticeId) -> Result<Vec<Vote>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .votes
            .iter()
            .filter(|vote| vote.practice_id == *id)
            .cloned()
            .collect())
    }

    fn stage_responses(
        &self,
        id: &PracticeId,
        stage: EvaluationStage,
    ) -> Result<Vec<EvaluationResponse>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .responses
            .get(&(id.clone(), stage))
            .cloned()
            .unwrap_or_default())
    }

    fn stats(&self, contract: Option<&Contract>) -> Result<PracticeStats, StoreError> {
        let inner = self.lock()?;
        let mut stats = PracticeStats {
            total: 0,
            in_review: 0,
            rejected_or_eliminated: 0,
        };
        for practice in inner.practices.values() {
            if let Some(scope) = contract {
                if practice.contract != *scope {
                    continue;
                }
            }
            stats.total += 1;
            if practice.status != PracticeStatus::Concluded {
                stats.in_review += 1;
            }
            if practice.eliminated || practice.validated == Some(false) {
                stats.rejected_or_eliminated += 1;
            }
        }
        Ok(stats)
    }
}

/// Static contract-to-reviewer directory for demos and tests.
#[derive(Default)]
pub struct MemoryDirectory {
    entries: HashMap<Contract, ContractResponsible>,
}

impl MemoryDirectory {
    pub fn new(entries: Vec<ContractResponsible>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.contract.clone(), entry))
                .collect(),
        }
    }
}

impl ResponsibleDirectory for MemoryDirectory {
    fn lookup(&self, contract: &Contract) -> Option<ContractResponsible> {
        self.entries.get(contract).cloned()
    }
}

/// Fixed checklist catalog for demos and tests.
#[derive(Default)]
pub struct MemoryCatalog {
    items: Vec<EvaluationItem>,
}

impl MemoryCatalog {
    pub fn new(items: Vec<EvaluationItem>) -> Self {
        Self { items }
    }
}

impl EvaluationCatalog for MemoryCatalog {
    fn active_items(&self) -> Vec<EvaluationItem> {
        self.items.clone()
    }
}
