use super::common::*;
use crate::workflows::practice::domain::{Matricula, PracticeStatus, VoteRound};
use crate::workflows::practice::service::WorkflowError;

#[test]
fn quarterly_queue_lists_practices_for_the_voter_contract() {
    let (service, store) = build_service();
    let id = practice_at(&service, PracticeStatus::AwaitingQuarterlyVote);
    seed_practice(
        &store,
        "bp-other-contract",
        unmapped_contract(),
        PracticeStatus::AwaitingQuarterlyVote,
        None,
    );

    let queue = service
        .vote_queue(&voter(), &contract(), VoteRound::Quarterly)
        .expect("queue readable");

    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, id);
}

#[test]
fn annual_queue_ignores_contract_scope() {
    let (service, store) = build_service();
    seed_practice(
        &store,
        "bp-annual-1",
        contract(),
        PracticeStatus::AwaitingAnnualVote,
        None,
    );
    seed_practice(
        &store,
        "bp-annual-2",
        unmapped_contract(),
        PracticeStatus::AwaitingAnnualVote,
        None,
    );

    let queue = service
        .vote_queue(&voter(), &contract(), VoteRound::Annual)
        .expect("queue readable");

    assert_eq!(queue.len(), 2);
}

#[test]
fn queue_excludes_practices_the_voter_already_voted_on() {
    let (service, _) = build_service();
    let id = practice_at(&service, PracticeStatus::AwaitingQuarterlyVote);

    service
        .cast_vote(&id, &voter(), &contract(), VoteRound::Quarterly)
        .expect("first vote succeeds");

    let queue = service
        .vote_queue(&voter(), &contract(), VoteRound::Quarterly)
        .expect("queue readable");
    assert!(queue.is_empty());

    let other_voter = Matricula("777888".to_string());
    let queue = service
        .vote_queue(&other_voter, &contract(), VoteRound::Quarterly)
        .expect("queue readable");
    assert_eq!(queue.len(), 1, "other voters still see the practice");
}

#[test]
fn duplicate_vote_is_a_conflict_and_keeps_one_row() {
    let (service, _) = build_service();
    let id = practice_at(&service, PracticeStatus::AwaitingQuarterlyVote);

    service
        .cast_vote(&id, &voter(), &contract(), VoteRound::Quarterly)
        .expect("first vote succeeds");

    match service.cast_vote(&id, &voter(), &contract(), VoteRound::Quarterly) {
        Err(WorkflowError::DuplicateVote) => {}
        other => panic!("expected duplicate-vote conflict, got {other:?}"),
    }

    let votes = service.votes_for_practice(&id).expect("votes readable");
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].voter, voter());
    assert_eq!(votes[0].round, VoteRound::Quarterly);
}

#[test]
fn quarterly_vote_from_another_contract_is_ineligible() {
    let (service, store) = build_service();
    let id = seed_practice(
        &store,
        "bp-scoped",
        unmapped_contract(),
        PracticeStatus::AwaitingQuarterlyVote,
        None,
    );

    match service.cast_vote(&id, &voter(), &contract(), VoteRound::Quarterly) {
        Err(WorkflowError::IneligibleVoter(scope)) => assert_eq!(scope, unmapped_contract()),
        other => panic!("expected ineligibility failure, got {other:?}"),
    }
}

#[test]
fn annual_vote_crosses_contract_boundaries() {
    let (service, store) = build_service();
    let id = seed_practice(
        &store,
        "bp-annual-open",
        unmapped_contract(),
        PracticeStatus::AwaitingAnnualVote,
        None,
    );

    let vote = service
        .cast_vote(&id, &voter(), &contract(), VoteRound::Annual)
        .expect("annual votes are open to every contract");
    assert_eq!(vote.round, VoteRound::Annual);
}

#[test]
fn voting_on_a_practice_outside_the_round_state_is_a_conflict() {
    let (service, _) = build_service();
    let id = practice_at(&service, PracticeStatus::AwaitingValidation);

    match service.cast_vote(&id, &voter(), &contract(), VoteRound::Quarterly) {
        Err(WorkflowError::StaleStatus { expected, found }) => {
            assert_eq!(expected, PracticeStatus::AwaitingQuarterlyVote);
            assert_eq!(found, PracticeStatus::AwaitingValidation);
        }
        other => panic!("expected stale-status conflict, got {other:?}"),
    }
}

#[test]
fn same_voter_may_vote_once_per_round_type() {
    let (service, store) = build_service();
    let id = seed_practice(
        &store,
        "bp-both-rounds",
        contract(),
        PracticeStatus::AwaitingQuarterlyVote,
        None,
    );

    service
        .cast_vote(&id, &voter(), &contract(), VoteRound::Quarterly)
        .expect("quarterly vote succeeds");

    // The annual round is a distinct ledger entry, but the practice must be
    // in the annual state first.
    match service.cast_vote(&id, &voter(), &contract(), VoteRound::Annual) {
        Err(WorkflowError::StaleStatus { .. }) => {}
        other => panic!("expected stale-status conflict, got {other:?}"),
    }
}
