use std::sync::Arc;

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::practice::domain::{
    ChecklistAnswer, Contract, ContractResponsible, EvaluationItem, ItemId, Matricula, Practice,
    PracticeId, PracticeStatus,
};
use crate::workflows::practice::memory::{MemoryCatalog, MemoryDirectory, MemoryPracticeStore};
use crate::workflows::practice::repository::PracticeStore;
use crate::workflows::practice::router::practice_router;
use crate::workflows::practice::service::{PracticeDraft, PracticeWorkflowService};

pub(super) type TestService =
    PracticeWorkflowService<MemoryPracticeStore, MemoryDirectory, MemoryCatalog>;

pub(super) fn sesmt_reviewer() -> Matricula {
    Matricula("100001".to_string())
}

pub(super) fn management_reviewer() -> Matricula {
    Matricula("200001".to_string())
}

pub(super) fn validator() -> Matricula {
    Matricula("900001".to_string())
}

pub(super) fn author() -> Matricula {
    Matricula("333444".to_string())
}

pub(super) fn voter() -> Matricula {
    Matricula("555666".to_string())
}

pub(super) fn contract() -> Contract {
    Contract("CT-100".to_string())
}

/// Contract with no directory entry, for routing-gap tests.
pub(super) fn unmapped_contract() -> Contract {
    Contract("CT-999".to_string())
}

pub(super) fn items() -> Vec<EvaluationItem> {
    vec![
        EvaluationItem {
            id: ItemId(1),
            text: "Does the practice introduce a new safety risk?".to_string(),
            is_eliminatory: true,
        },
        EvaluationItem {
            id: ItemId(2),
            text: "Is the described gain measurable?".to_string(),
            is_eliminatory: false,
        },
    ]
}

pub(super) fn all_clear_answers() -> Vec<ChecklistAnswer> {
    vec![
        ChecklistAnswer {
            item_id: ItemId(1),
            answer: false,
        },
        ChecklistAnswer {
            item_id: ItemId(2),
            answer: true,
        },
    ]
}

pub(super) fn eliminatory_answers() -> Vec<ChecklistAnswer> {
    vec![
        ChecklistAnswer {
            item_id: ItemId(1),
            answer: true,
        },
        ChecklistAnswer {
            item_id: ItemId(2),
            answer: false,
        },
    ]
}

pub(super) fn draft(contract: Contract) -> PracticeDraft {
    PracticeDraft {
        title: "Pre-shift harness inspection".to_string(),
        description: "Checklist posted at the locker room exit".to_string(),
        objective: "Cut fall-protection incidents at height work".to_string(),
        contract,
    }
}

pub(super) fn build_service() -> (Arc<TestService>, Arc<MemoryPracticeStore>) {
    let store = Arc::new(MemoryPracticeStore::default());
    let directory = Arc::new(MemoryDirectory::new(vec![ContractResponsible {
        contract: contract(),
        sesmt_reviewer: sesmt_reviewer(),
        management_reviewer: management_reviewer(),
    }]));
    let catalog = Arc::new(MemoryCatalog::new(items()));
    let service = Arc::new(PracticeWorkflowService::new(
        store.clone(),
        directory,
        catalog,
        validator(),
    ));
    (service, store)
}

/// Create a practice and walk it to the requested stage with all-clear
/// checklists.
pub(super) fn practice_at(service: &TestService, target: PracticeStatus) -> PracticeId {
    let receipt = service
        .create(draft(contract()), &author())
        .expect("practice creates");
    let id = receipt.practice.id;
    if target == PracticeStatus::AwaitingSesmtEval {
        return id;
    }

    service
        .submit_sesmt_evaluation(&id, &sesmt_reviewer(), &all_clear_answers())
        .expect("sesmt pass succeeds");
    if target == PracticeStatus::AwaitingMgmtEval {
        return id;
    }

    service
        .submit_management_evaluation(&id, &management_reviewer(), &all_clear_answers(), Some(4))
        .expect("management pass succeeds");
    if target == PracticeStatus::AwaitingValidation {
        return id;
    }

    service
        .validate(&id, &validator(), true, None)
        .expect("validation approves");
    assert_eq!(target, PracticeStatus::AwaitingQuarterlyVote);
    id
}

/// Insert a practice directly in a given state, bypassing the workflow.
/// Used for states the service cannot reach yet (annual voting has no
/// tallying path).
pub(super) fn seed_practice(
    store: &MemoryPracticeStore,
    id: &str,
    contract: Contract,
    status: PracticeStatus,
    owner: Option<Matricula>,
) -> PracticeId {
    let now = Utc::now();
    let practice = Practice {
        id: PracticeId(id.to_string()),
        title: format!("seeded {id}"),
        description: String::new(),
        objective: String::new(),
        contract,
        status,
        eliminated: false,
        validated: status_validated(status),
        relevance: None,
        current_owner: owner,
        validation_comment: None,
        created_by: author(),
        created_at: now,
        updated_at: now,
    };
    store.insert(practice).expect("seed inserts");
    PracticeId(id.to_string())
}

fn status_validated(status: PracticeStatus) -> Option<bool> {
    match status {
        PracticeStatus::AwaitingQuarterlyVote | PracticeStatus::AwaitingAnnualVote => Some(true),
        _ => None,
    }
}

pub(super) fn router_with_service(service: Arc<TestService>) -> axum::Router {
    practice_router(service)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
