use super::common::*;
use crate::workflows::practice::checklist::{collect_answers, evaluate, ChecklistError};
use crate::workflows::practice::domain::{ChecklistAnswer, ItemId};

#[test]
fn affirmative_eliminatory_answer_eliminates() {
    let items = items();
    let answers = collect_answers(&eliminatory_answers(), &items).expect("complete checklist");

    let outcome = evaluate(&answers, &items);

    assert!(outcome.eliminated);
    assert_eq!(outcome.triggered, vec![ItemId(1)]);
}

#[test]
fn affirmative_non_eliminatory_answer_passes() {
    let items = items();
    let answers = collect_answers(&all_clear_answers(), &items).expect("complete checklist");

    let outcome = evaluate(&answers, &items);

    assert!(!outcome.eliminated);
    assert!(outcome.triggered.is_empty());
}

#[test]
fn omitted_item_is_rejected() {
    let items = items();
    let partial = vec![ChecklistAnswer {
        item_id: ItemId(1),
        answer: false,
    }];

    match collect_answers(&partial, &items) {
        Err(ChecklistError::MissingAnswers(1)) => {}
        other => panic!("expected missing-answer error, got {other:?}"),
    }
}

#[test]
fn unknown_item_is_rejected() {
    let items = items();
    let mut answers = all_clear_answers();
    answers.push(ChecklistAnswer {
        item_id: ItemId(42),
        answer: false,
    });

    match collect_answers(&answers, &items) {
        Err(ChecklistError::UnknownItems(unknown)) => assert_eq!(unknown, vec![ItemId(42)]),
        other => panic!("expected unknown-item error, got {other:?}"),
    }
}

#[test]
fn repeated_item_is_rejected() {
    let items = items();
    let mut answers = all_clear_answers();
    answers.push(ChecklistAnswer {
        item_id: ItemId(2),
        answer: false,
    });

    match collect_answers(&answers, &items) {
        Err(ChecklistError::DuplicateAnswer(ItemId(2))) => {}
        other => panic!("expected duplicate-answer error, got {other:?}"),
    }
}

#[test]
fn empty_catalog_is_rejected() {
    match collect_answers(&[], &[]) {
        Err(ChecklistError::EmptyCatalog) => {}
        other => panic!("expected empty-catalog error, got {other:?}"),
    }
}
