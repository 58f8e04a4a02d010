use std::collections::BTreeMap;

use super::domain::{ChecklistAnswer, EvaluationItem, ItemId};

/// Read-only catalog of active checklist questions.
///
/// Item CRUD lives in the configuration layer of the portal; the workflow
/// only ever reads the active set and treats it as immutable for the
/// duration of a scoring pass.
pub trait EvaluationCatalog: Send + Sync {
    fn active_items(&self) -> Vec<EvaluationItem>;
}

/// Validation errors raised before any response row is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChecklistError {
    #[error("checklist omits answers for {0} active item(s)")]
    MissingAnswers(usize),
    #[error("checklist references unknown item(s)")]
    UnknownItems(Vec<ItemId>),
    #[error("checklist answers item {} more than once", .0 .0)]
    DuplicateAnswer(ItemId),
    #[error("no active checklist items are configured")]
    EmptyCatalog,
}

/// Result of the elimination predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistOutcome {
    pub eliminated: bool,
    /// Eliminatory items that were answered affirmatively.
    pub triggered: Vec<ItemId>,
}

/// Validate a submitted answer set against the active catalog.
///
/// The answered item-id set must exactly equal the active set: no partial
/// checklists, no stray ids, no repeats.
pub fn collect_answers(
    answers: &[ChecklistAnswer],
    items: &[EvaluationItem],
) -> Result<BTreeMap<ItemId, bool>, ChecklistError> {
    if items.is_empty() {
        return Err(ChecklistError::EmptyCatalog);
    }

    let mut by_item = BTreeMap::new();
    let mut unknown = Vec::new();
    for answer in answers {
        if !items.iter().any(|item| item.id == answer.item_id) {
            unknown.push(answer.item_id);
            continue;
        }
        if by_item.insert(answer.item_id, answer.answer).is_some() {
            return Err(ChecklistError::DuplicateAnswer(answer.item_id));
        }
    }

    if !unknown.is_empty() {
        return Err(ChecklistError::UnknownItems(unknown));
    }

    let missing = items
        .iter()
        .filter(|item| !by_item.contains_key(&item.id))
        .count();
    if missing > 0 {
        return Err(ChecklistError::MissingAnswers(missing));
    }

    Ok(by_item)
}

/// Pure elimination predicate: an affirmative answer to any eliminatory
/// item disqualifies the practice.
pub fn evaluate(answers: &BTreeMap<ItemId, bool>, items: &[EvaluationItem]) -> ChecklistOutcome {
    let triggered: Vec<ItemId> = items
        .iter()
        .filter(|item| item.is_eliminatory)
        .filter(|item| answers.get(&item.id).copied() == Some(true))
        .map(|item| item.id)
        .collect();

    ChecklistOutcome {
        eliminated: !triggered.is_empty(),
        triggered,
    }
}
