//! Add-comment target isolation: two simultaneously open comment forms, on
//! different status entries, must never show each other's spinner or error.

use crux_core::testing::AppTester;
use crux_http::protocol::HttpRequest;
use crux_http::testing::ResponseBuilder;

use gatewatch_core::duration::parse_iso_ms;
use gatewatch_core::{
    App, Collection, CollectionId, CollectionStatus, CommentTarget, Effect, Event, Model,
    RequestPhase, StatusEntry, UserId,
};

const T0: &str = "2024-05-01T08:00:00+00:00";
const T1: &str = "2024-05-01T08:30:00+00:00";
const T2: &str = "2024-05-01T09:00:00+00:00";

fn operator() -> UserId {
    UserId::new("op-7")
}

fn entry(status: CollectionStatus, timestamp: &str) -> StatusEntry {
    StatusEntry {
        status,
        timestamp: timestamp.to_string(),
        updated_by_user_id: operator(),
        comments: Vec::new(),
    }
}

/// A collection that revisited LOADING, so two entries share the status and
/// only the timestamp tells them apart.
fn with_two_loading_entries() -> Collection {
    Collection {
        id: CollectionId::new("col-1"),
        material_name: "Ballast".into(),
        customer_name: "Acme Aggregates".into(),
        collection_ref_num: "REF-001".into(),
        lorry_reg_num: None,
        current_status: CollectionStatus::Loading,
        checked_in_at: Some(T0.to_string()),
        started_loading_at: Some(T1.to_string()),
        finished_loading_at: None,
        checked_out_at: None,
        status_history: vec![
            entry(CollectionStatus::CheckedIn, T0),
            entry(CollectionStatus::Loading, T1),
            entry(CollectionStatus::Loading, T2),
        ],
    }
}

fn target(timestamp: &str) -> CommentTarget {
    CommentTarget {
        collection_id: CollectionId::new("col-1"),
        status: CollectionStatus::Loading,
        status_timestamp: timestamp.to_string(),
    }
}

fn http_requests(effects: &[Effect]) -> Vec<&HttpRequest> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(&request.operation),
            _ => None,
        })
        .collect()
}

fn add_comment_event(timestamp: &str, text: &str) -> Event {
    Event::AddComment {
        collection_id: CollectionId::new("col-1"),
        status: CollectionStatus::Loading,
        status_timestamp: timestamp.to_string(),
        user_id: operator(),
        text: text.to_string(),
    }
}

#[test]
fn blank_comment_is_rejected_without_a_transport_call() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    model.collections.push(with_two_loading_entries());

    let update = app.update(add_comment_event(T1, "   "), &mut model);

    assert!(http_requests(&update.effects).is_empty());
    assert_eq!(model.requests.add_comment.state().phase(), RequestPhase::Idle);
    assert_eq!(model.requests.add_comment.target(), None);
}

#[test]
fn comment_lands_on_the_entry_matched_by_status_and_timestamp() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    model.collections.push(with_two_loading_entries());
    app.update(
        Event::Tick {
            now_ms: parse_iso_ms(T2).unwrap() + 60_000,
        },
        &mut model,
    );

    let update = app.update(add_comment_event(T2, "  second visit  "), &mut model);

    let requests = http_requests(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "PUT");
    let sent: Collection = serde_json::from_slice(&requests[0].body).unwrap();

    let first = sent
        .status_entry(CollectionStatus::Loading, T1)
        .expect("first loading entry");
    let second = sent
        .status_entry(CollectionStatus::Loading, T2)
        .expect("second loading entry");
    assert!(first.comments.is_empty());
    assert_eq!(second.comments.len(), 1);
    assert_eq!(second.comments[0].text, "second visit");

    // the pending store is untouched until the server confirms
    let stored = &model.collections[0];
    assert!(stored
        .status_entry(CollectionStatus::Loading, T2)
        .unwrap()
        .comments
        .is_empty());
}

#[test]
fn feedback_stays_on_the_dispatched_target() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    model.collections.push(with_two_loading_entries());

    app.update(add_comment_event(T1, "first bay"), &mut model);

    let requests = &model.requests.add_comment;
    assert!(requests.is_loading_for(&target(T1)));
    assert!(!requests.is_loading_for(&target(T2)));

    // the attempt fails: only T1's form owns the error
    app.update(
        Event::CommentSaved {
            target: target(T1),
            result: Box::new(Err(crux_http::HttpError::Io("timeout".to_string()))),
        },
        &mut model,
    );

    let requests = &model.requests.add_comment;
    let error = requests.error_for(&target(T1)).expect("error owned by T1");
    assert!(error.contains("timeout"));
    assert_eq!(requests.error_for(&target(T2)), None);
    assert!(!requests.is_loading_for(&target(T1)));
}

#[test]
fn stale_completion_updates_the_store_but_not_the_feedback() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    model.collections.push(with_two_loading_entries());

    app.update(add_comment_event(T1, "first"), &mut model);
    // the user moved on to another entry before the first attempt resolved
    app.update(add_comment_event(T2, "second"), &mut model);
    assert!(model.requests.add_comment.is_loading_for(&target(T2)));

    let mut updated = with_two_loading_entries();
    updated
        .status_entry_mut(CollectionStatus::Loading, T1)
        .unwrap()
        .comments
        .push(gatewatch_core::Comment {
            id: gatewatch_core::CommentId::new("c-1"),
            user_id: operator(),
            text: "first".into(),
            timestamp: T2.into(),
        });
    let response = ResponseBuilder::ok().body(updated.clone()).build();
    app.update(
        Event::CommentSaved {
            target: target(T1),
            result: Box::new(Ok(response)),
        },
        &mut model,
    );

    // store took the server's aggregate
    assert_eq!(model.collections[0], updated);
    // but the tracked dispatch (T2) is still loading
    assert!(model.requests.add_comment.is_loading_for(&target(T2)));
    assert_eq!(model.requests.add_comment.state().phase(), RequestPhase::Loading);
}

#[test]
fn successful_comment_replaces_the_store_entry() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    model.collections.push(with_two_loading_entries());

    app.update(add_comment_event(T2, "tyres checked"), &mut model);

    let mut updated = with_two_loading_entries();
    updated
        .status_entry_mut(CollectionStatus::Loading, T2)
        .unwrap()
        .comments
        .push(gatewatch_core::Comment {
            id: gatewatch_core::CommentId::new("c-9"),
            user_id: operator(),
            text: "tyres checked".into(),
            timestamp: T2.into(),
        });
    let response = ResponseBuilder::ok().body(updated.clone()).build();
    app.update(
        Event::CommentSaved {
            target: target(T2),
            result: Box::new(Ok(response)),
        },
        &mut model,
    );

    assert!(model.requests.add_comment.state().has_succeeded());
    assert_eq!(
        model.collections[0]
            .status_entry(CollectionStatus::Loading, T2)
            .unwrap()
            .comments
            .len(),
        1
    );
}

#[test]
fn comment_for_an_unknown_entry_is_rejected_locally() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    model.collections.push(with_two_loading_entries());

    let update = app.update(
        add_comment_event("2024-05-01T23:00:00+00:00", "lost"),
        &mut model,
    );

    assert!(http_requests(&update.effects).is_empty());
    assert_eq!(model.requests.add_comment.state().phase(), RequestPhase::Idle);
}

#[test]
fn comment_target_is_visible_to_the_shell() {
    let app = AppTester::<App, _>::default();
    let mut model = Model::default();
    model.collections.push(with_two_loading_entries());

    app.update(add_comment_event(T1, "first bay"), &mut model);

    let view = {
        use crux_core::App as _;
        App::default().view(&model)
    };
    assert_eq!(view.comment_target, Some(target(T1)));
    assert!(view.add_comment.is_loading());
}
