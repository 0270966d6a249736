use serde_json::json;

use crate::{
    action::{ActionError, Confirmation, Dialog},
    session::SessionError,
    transport::Method,
};

use super::{mounted_session, wait_until};

const VIEW: usize = 0;
const EDIT: usize = 1;
const TOGGLE: usize = 2;
const DELETE: usize = 3;

#[tokio::test]
async fn test_view_fetches_detail_and_unwraps_data() {
    let (session, transport) = mounted_session().await;
    transport.route(
        Method::Get,
        "/videos/v-0",
        json!({"data": {"id": "v-0", "title": "Video 0", "script": "full text"}}),
    );
    session.run_row_action(VIEW, 0).await.unwrap();
    let Dialog::Viewing { row, .. } = session.dispatcher().dialog().get() else {
        panic!("expected viewing dialog");
    };
    assert_eq!(row.get("script"), Some(&json!("full text")));
    session.cancel();
    assert!(session.dispatcher().dialog().get().is_idle());
}

#[tokio::test]
async fn test_toggle_confirms_with_new_status_then_patches_and_reloads() {
    let (session, transport) = mounted_session().await;
    transport.route(Method::Patch, "/videos/v-0/status", json!(null));

    session.run_row_action(TOGGLE, 0).await.unwrap();
    let Dialog::ConfirmingStatus { current, next, .. } = session.dispatcher().dialog().get() else {
        panic!("expected status confirmation");
    };
    // The row is active; the confirmation shows the new status
    // "Inactive".
    assert!(current);
    assert!(!next);

    let lists_before = transport.requests_for("/videos").len();
    let confirmed = session.confirm().await.unwrap();
    assert_eq!(confirmed, Confirmation::Mutated);
    assert!(session.dispatcher().dialog().get().is_idle());

    let patch = transport.requests_for("/videos/v-0/status").pop().unwrap();
    assert_eq!(patch.method, Method::Patch);
    assert_eq!(patch.body, Some(json!({"isActive": false})));
    // The table reflects the mutation via a reload of the current page.
    assert_eq!(transport.requests_for("/videos").len(), lists_before + 1);
}

#[tokio::test]
async fn test_delete_issues_request_only_after_confirmation() {
    let (session, transport) = mounted_session().await;
    transport.route(Method::Delete, "/videos/v-1", json!(null));

    session.run_row_action(DELETE, 1).await.unwrap();
    assert!(transport.requests_for("/videos/v-1").is_empty());
    session.cancel();
    assert!(transport.requests_for("/videos/v-1").is_empty());

    session.run_row_action(DELETE, 1).await.unwrap();
    let confirmed = session.confirm().await.unwrap();
    assert_eq!(confirmed, Confirmation::Mutated);
    let delete = transport.requests_for("/videos/v-1").pop().unwrap();
    assert_eq!(delete.method, Method::Delete);
}

#[tokio::test]
async fn test_edit_popup_hydrates_form_and_submits_transformed_payload() {
    let (session, transport) = mounted_session().await;
    transport.route(
        Method::Get,
        "/videos/v-0",
        json!({
            "id": "v-0",
            "title": "Video 0",
            "batches": [{"batchId": "b-1", "startDate": "2024-06-01"}]
        }),
    );
    transport.route(Method::Put, "/videos/v-0", json!(null));

    session.run_row_action(EDIT, 0).await.unwrap();
    let Dialog::Editing { form, row_id, .. } = session.dispatcher().dialog().get() else {
        panic!("expected edit dialog");
    };
    assert_eq!(row_id.as_deref(), Some("v-0"));
    assert_eq!(form.get("videoTitle"), Some(&json!("Video 0")));
    assert_eq!(form.get("batchId"), Some(&json!("b-1")));
    assert_eq!(form.get("batchStart"), Some(&json!("2024-06-01")));

    session.dispatcher().set_form_value("videoTitle", json!("Renamed"));
    let confirmed = session.confirm().await.unwrap();
    assert_eq!(confirmed, Confirmation::Mutated);

    let submit = transport.requests_for("/videos/v-0").pop().unwrap();
    assert_eq!(submit.method, Method::Put);
    assert_eq!(
        submit.body,
        Some(json!({
            "title": "Renamed",
            "batches": [{"batchId": "b-1", "startDate": "2024-06-01"}]
        }))
    );
}

#[tokio::test]
async fn test_create_popup_validates_required_before_posting() {
    let (session, transport) = mounted_session().await;
    transport.route(Method::Post, "/videos", json!(null));

    session.run_button(0).await.unwrap();
    let Dialog::Editing { form, row_id, .. } = session.dispatcher().dialog().get() else {
        panic!("expected create dialog");
    };
    assert_eq!(row_id, None);
    assert_eq!(form.get("status"), Some(&json!("DRAFT")));

    // Required title is empty: rejected locally, no request goes out.
    let rejected = session.confirm().await;
    match rejected {
        Err(SessionError::Action(ActionError::MissingRequired(labels))) => {
            assert_eq!(labels, vec!["Title".to_owned()]);
        }
        other => panic!("expected missing-required, got {other:?}"),
    }
    assert!(transport.requests_for("/videos").iter().all(|request| request.method == Method::Get));

    session.dispatcher().set_form_value("videoTitle", json!("Fresh"));
    session.confirm().await.unwrap();
    let post = transport
        .requests_for("/videos")
        .into_iter()
        .find(|request| request.method == Method::Post)
        .unwrap();
    assert_eq!(post.body, Some(json!({"title": "Fresh", "status": "DRAFT"})));
}

#[tokio::test]
async fn test_failed_submit_keeps_dialog_and_form_intact() {
    let (session, transport) = mounted_session().await;
    transport.route(Method::Get, "/videos/v-0", json!({"id": "v-0", "title": "Video 0"}));
    transport.fail(Method::Put, "/videos/v-0", "500 internal");

    session.run_row_action(EDIT, 0).await.unwrap();
    session.dispatcher().set_form_value("videoTitle", json!("Unsaved work"));
    let result = session.confirm().await;
    assert!(result.is_err());

    // Nothing is lost: still editing, entered value retained.
    let Dialog::Editing { form, .. } = session.dispatcher().dialog().get() else {
        panic!("dialog should stay open on failure");
    };
    assert_eq!(form.get("videoTitle"), Some(&json!("Unsaved work")));
}

#[tokio::test]
async fn test_in_flight_mutation_rejects_duplicate_confirm() {
    let (session, transport) = mounted_session().await;
    let gate = transport.gate_once(Method::Patch, "/videos/v-0/status");

    session.run_row_action(TOGGLE, 0).await.unwrap();
    let dispatcher = session.dispatcher().clone();
    let in_flight = tokio::spawn(async move { dispatcher.confirm().await });
    {
        let transport = transport.clone();
        wait_until(move || !transport.requests_for("/videos/v-0/status").is_empty()).await;
    }

    // The triggering control is disabled while the call runs; a second
    // confirm is rejected instead of double-submitting.
    let duplicate = session.confirm().await;
    assert!(matches!(
        duplicate,
        Err(SessionError::Action(ActionError::Busy))
    ));

    gate.send(json!(null)).await.unwrap();
    let confirmed = in_flight.await.unwrap().unwrap();
    assert_eq!(confirmed, Confirmation::Mutated);
    assert_eq!(transport.requests_for("/videos/v-0/status").len(), 1);
}

#[tokio::test]
async fn test_action_on_missing_row_is_an_error() {
    let (session, _) = mounted_session().await;
    let result = session.run_row_action(VIEW, 99).await;
    assert!(matches!(result, Err(SessionError::RowIndex(99))));
}
