//! Integration tests for request submission and status transitions.

mod helpers;

use std::sync::atomic::Ordering;

use quartermaster_core::ErrorKind;
use quartermaster_core::types::id::{IssuedItemId, ItemId, RequestId, UserId};
use quartermaster_entity::request::{NewRequest, RequestPriority, RequestStatus, RequestType};
use quartermaster_entity::user::UserRole;

use helpers::{LEADER, TestSession, admin, leader, officer, request, session, stock_item};

const RADIO: u64 = 7;

fn id(value: u64) -> RequestId {
    RequestId::from(value)
}

#[tokio::test]
async fn test_issue_fails_when_stock_dropped_after_approval() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 5)]);
    test.backend.insert(request(1, RequestType::New, RADIO, 5));
    let lifecycle = &test.session.lifecycle;

    let approved = lifecycle.approve(&admin(), &id(1), None).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);

    test.stock.set_quantity(RADIO, 3);
    let err = lifecycle.issue(&officer(), &id(1)).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::StockInsufficient);
    assert_eq!(test.backend.status(RequestType::New, 1), RequestStatus::Approved);
    assert_eq!(test.stock.quantity(RADIO), 3);
    assert!(test.stock.assignments.lock().unwrap().is_empty());
    assert_eq!(
        test.session.requests.get(RequestType::New, &id(1)).unwrap().status,
        RequestStatus::Approved
    );
}

#[tokio::test]
async fn test_issue_decrements_stock_and_assigns_requester() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 10)]);
    let mut approved = request(1, RequestType::New, RADIO, 4);
    approved.status = RequestStatus::Approved;
    test.backend.insert(approved);

    let issued = test
        .session
        .lifecycle
        .issue(&officer(), &id(1))
        .await
        .unwrap();

    assert_eq!(issued.status, RequestStatus::Issued);
    assert_eq!(issued.issued_by, Some(UserId::from(helpers::OFFICER)));
    assert!(issued.issued_at.is_some());
    assert_eq!(test.stock.quantity(RADIO), 6);
    assert_eq!(
        *test.stock.assignments.lock().unwrap(),
        vec![(ItemId::from(RADIO), UserId::from(LEADER))]
    );

    let completed = test
        .session
        .lifecycle
        .complete(&officer(), &id(1))
        .await
        .unwrap();
    assert_eq!(completed.status, RequestStatus::Completed);
    assert!(completed.status.is_terminal());
}

#[tokio::test]
async fn test_issue_retry_after_failed_commit_decrements_once() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 10)]);
    let mut approved = request(1, RequestType::New, RADIO, 4);
    approved.status = RequestStatus::Approved;
    test.backend.insert(approved);
    let lifecycle = &test.session.lifecycle;

    test.backend.fail_commits(true);
    let err = lifecycle.issue(&officer(), &id(1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(test.backend.status(RequestType::New, 1), RequestStatus::Approved);
    assert_eq!(test.stock.quantity(RADIO), 10);
    assert!(test.stock.assignments.lock().unwrap().is_empty());

    test.backend.fail_commits(false);
    let issued = lifecycle.issue(&officer(), &id(1)).await.unwrap();

    assert_eq!(issued.status, RequestStatus::Issued);
    assert_eq!(test.stock.quantity(RADIO), 6);
    assert_eq!(test.stock.assignments.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stock_failure_after_issue_is_not_repeated() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 10)]);
    let mut approved = request(1, RequestType::New, RADIO, 4);
    approved.status = RequestStatus::Approved;
    test.backend.insert(approved);
    let lifecycle = &test.session.lifecycle;

    test.stock.fail_updates(true);
    let err = lifecycle.issue(&officer(), &id(1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
    assert!(err.message.contains("is issued"), "{}", err.message);
    assert_eq!(test.backend.status(RequestType::New, 1), RequestStatus::Issued);
    assert_eq!(
        test.session.requests.get(RequestType::New, &id(1)).unwrap().status,
        RequestStatus::Issued
    );

    test.stock.fail_updates(false);
    let err = lifecycle.issue(&officer(), &id(1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTransition);
    assert_eq!(test.stock.quantity(RADIO), 10);
    assert_eq!(test.backend.commits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_approve_without_stock_leaves_request_pending() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 2)]);
    test.backend.insert(request(1, RequestType::New, RADIO, 5));

    let err = test
        .session
        .lifecycle
        .approve(&admin(), &id(1), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::StockInsufficient);
    assert_eq!(test.backend.status(RequestType::New, 1), RequestStatus::Pending);
    assert_eq!(test.backend.commits.load(Ordering::SeqCst), 0);
    assert!(test.session.requests.is_empty());
}

#[tokio::test]
async fn test_approve_with_reduced_quantity() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 2)]);
    test.backend.insert(request(1, RequestType::New, RADIO, 5));

    let approved = test
        .session
        .lifecycle
        .approve(&admin(), &id(1), Some(2))
        .await
        .unwrap();

    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.quantity, 2);
    assert_eq!(approved.approved_by, Some(UserId::from(helpers::ADMIN)));
    // Approval reserves nothing
    assert_eq!(test.stock.quantity(RADIO), 2);
}

#[tokio::test]
async fn test_pending_request_only_accepts_approve_or_deny() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 10)]);
    test.backend.insert(request(1, RequestType::New, RADIO, 1));
    let lifecycle = &test.session.lifecycle;

    let err = lifecycle.issue(&officer(), &id(1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTransition);
    let err = lifecycle.complete(&officer(), &id(1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTransition);
    assert_eq!(test.backend.status(RequestType::New, 1), RequestStatus::Pending);

    let denied = lifecycle
        .deny(&admin(), &id(1), "Not in budget")
        .await
        .unwrap();
    assert_eq!(denied.status, RequestStatus::Denied);
    assert_eq!(denied.reason.as_deref(), Some("Not in budget"));

    // Terminal
    let err = lifecycle.approve(&admin(), &id(1), None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTransition);
}

#[tokio::test]
async fn test_transitions_are_gated_by_role() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 10)]);
    test.backend.insert(request(1, RequestType::New, RADIO, 1));
    let lifecycle = &test.session.lifecycle;

    for ctx in [
        leader(),
        officer(),
        session(UserRole::SystemAdmin, 4),
    ] {
        let err = lifecycle.approve(&ctx, &id(1), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization, "{:?}", ctx.role);
    }
    assert_eq!(test.backend.fetches.load(Ordering::SeqCst), 0);

    lifecycle.approve(&admin(), &id(1), None).await.unwrap();
    let err = lifecycle.issue(&admin(), &id(1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(test.backend.status(RequestType::New, 1), RequestStatus::Approved);
}

#[tokio::test]
async fn test_repair_sequence() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 1)]);
    let submitted = test
        .session
        .lifecycle
        .submit(
            &leader(),
            NewRequest {
                request_type: RequestType::Repair,
                item: ItemId::from(RADIO),
                quantity: 1,
                priority: RequestPriority::High,
                purpose: None,
                description: Some("Antenna snapped".to_string()),
                issued_item: Some(IssuedItemId::from(12)),
            },
        )
        .await
        .unwrap();
    assert_eq!(submitted.status, RequestStatus::Pending);
    let lifecycle = &test.session.lifecycle;

    let err = lifecycle
        .mark_repaired(&officer(), &submitted.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidTransition);

    let in_process = lifecycle
        .mark_in_process(&officer(), &submitted.id)
        .await
        .unwrap();
    assert_eq!(in_process.status, RequestStatus::RepairInProcess);

    let repaired = lifecycle
        .mark_repaired(&officer(), &submitted.id)
        .await
        .unwrap();
    assert_eq!(repaired.status, RequestStatus::Repaired);
    assert_eq!(
        test.session
            .requests
            .get(RequestType::Repair, &submitted.id)
            .unwrap()
            .status,
        RequestStatus::Repaired
    );
    assert!(test.stock.damages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_damaged_records_damage() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 1)]);
    let mut repair = request(5, RequestType::Repair, RADIO, 1);
    repair.issued_item = Some(IssuedItemId::from(12));
    test.backend.insert(repair);

    let lifecycle = &test.session.lifecycle;
    let err = lifecycle
        .mark_damaged(&officer(), &id(5), "  ")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let damaged = lifecycle
        .mark_damaged(&officer(), &id(5), "Water damage")
        .await
        .unwrap();

    assert_eq!(damaged.status, RequestStatus::Damaged);
    let damages = test.stock.damages.lock().unwrap();
    assert_eq!(damages.len(), 1);
    assert_eq!(damages[0].repair_request, id(5));
    assert_eq!(damages[0].issued_item, Some(IssuedItemId::from(12)));
    assert_eq!(damages[0].damage_description, "Water damage");
}

#[tokio::test]
async fn test_mark_damaged_retry_records_once() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 1)]);
    let mut repair = request(5, RequestType::Repair, RADIO, 1);
    repair.issued_item = Some(IssuedItemId::from(12));
    test.backend.insert(repair);
    let lifecycle = &test.session.lifecycle;

    test.backend.fail_commits(true);
    let err = lifecycle
        .mark_damaged(&officer(), &id(5), "Water damage")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
    assert_eq!(test.backend.status(RequestType::Repair, 5), RequestStatus::Pending);

    test.backend.fail_commits(false);
    let damaged = lifecycle
        .mark_damaged(&officer(), &id(5), "Water damage")
        .await
        .unwrap();

    assert_eq!(damaged.status, RequestStatus::Damaged);
    assert_eq!(test.stock.damages.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_commit_leaves_cache_unchanged() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 10)]);
    test.backend.insert(request(1, RequestType::New, RADIO, 1));
    test.session
        .lifecycle
        .refresh(&admin(), RequestType::New)
        .await
        .unwrap();

    test.backend.fail_commits(true);
    let err = test
        .session
        .lifecycle
        .approve(&admin(), &id(1), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Network);
    assert!(err.is_recoverable());
    assert_eq!(
        test.session.requests.get(RequestType::New, &id(1)).unwrap().status,
        RequestStatus::Pending
    );

    test.backend.fail_commits(false);
    test.session
        .lifecycle
        .approve(&admin(), &id(1), None)
        .await
        .unwrap();
    assert!(test.session.requests.pending().is_empty());
}

#[tokio::test]
async fn test_submit_validates_before_sending() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 10)]);
    let lifecycle = &test.session.lifecycle;
    let new_item = |quantity| NewRequest {
        request_type: RequestType::New,
        item: ItemId::from(RADIO),
        quantity,
        priority: RequestPriority::Normal,
        purpose: Some("Field exercise".to_string()),
        description: None,
        issued_item: None,
    };

    let err = lifecycle.submit(&leader(), new_item(0)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = lifecycle.submit(&officer(), new_item(1)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(test.backend.creates.load(Ordering::SeqCst), 0);

    let created = lifecycle.submit(&leader(), new_item(3)).await.unwrap();
    assert_eq!(created.status, RequestStatus::Pending);
    assert_eq!(created.requested_by, UserId::from(LEADER));
    assert_eq!(
        test.session.requests.requested_by(&UserId::from(LEADER)).len(),
        1
    );
}

#[tokio::test]
async fn test_deny_requires_reason() {
    let test = TestSession::new(leader(), vec![stock_item(RADIO, 10)]);
    test.backend.insert(request(1, RequestType::New, RADIO, 1));

    let err = test
        .session
        .lifecycle
        .deny(&admin(), &id(1), "   ")
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(test.backend.status(RequestType::New, 1), RequestStatus::Pending);
    assert_eq!(test.backend.commits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_request_is_not_found() {
    let test = TestSession::new(leader(), Vec::new());
    let err = test
        .session
        .lifecycle
        .approve(&admin(), &id(404), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
