//! Poll loop behavior: cadence, counters, completion and transient errors.

mod common;

use acctbatch_controller::CancelControl;
use acctbatch_core::progress::ProgressView;
use acctbatch_core::session::SessionPhase;
use acctbatch_core::types::Workers;

use common::{
    complete, fail_record, harness, running, settle, spreadsheet, success_record, FakeApi, Harness,
    POLL,
};

async fn started(api: FakeApi) -> Harness {
    let h = harness(api);
    h.controller
        .submit_job(Some(spreadsheet("accounts.xlsx")), Workers::default())
        .await
        .unwrap();
    h
}

// ---------------------------------------------------------------------------
// Test: first check is immediate, then one per period
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn polls_immediately_then_every_period() {
    let h = started(FakeApi::new()).await;

    settle().await;
    assert_eq!(FakeApi::count(&h.api.polls), 1);

    tokio::time::sleep(POLL).await;
    assert_eq!(FakeApi::count(&h.api.polls), 2);

    tokio::time::sleep(POLL * 2).await;
    assert_eq!(FakeApi::count(&h.api.polls), 4);
    assert_eq!(h.controller.live_poll_loops(), 1);
}

#[tokio::test(start_paused = true)]
async fn restarting_polling_keeps_a_single_loop() {
    let h = started(FakeApi::new()).await;
    settle().await;

    assert!(h.controller.start_polling());
    assert!(h.controller.start_polling());
    settle().await;
    assert_eq!(h.controller.live_poll_loops(), 1);

    let before = FakeApi::count(&h.api.polls);
    tokio::time::sleep(POLL).await;
    assert_eq!(FakeApi::count(&h.api.polls), before + 1);
}

#[tokio::test(start_paused = true)]
async fn start_polling_without_job_is_a_no_op() {
    let h = harness(FakeApi::new());

    assert!(!h.controller.start_polling());
    settle().await;
    assert_eq!(h.controller.live_poll_loops(), 0);
    assert_eq!(FakeApi::count(&h.api.polls), 0);
}

// ---------------------------------------------------------------------------
// Test: incomplete snapshots only update counters
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn incomplete_snapshot_updates_counters() {
    let api = FakeApi::new();
    api.script([running(37.5, 2, 1, 5)]);
    let h = started(api).await;

    settle().await;

    let state = h.view.state();
    assert_eq!(
        state.progress,
        ProgressView {
            percent: 38,
            success: 2,
            failed: 1,
            processing: 5,
            total: Some(8),
        }
    );
    assert_eq!(state.progress.percent_label(), "38%");
    assert!(state.results.is_none());
    assert!(state.spinner);
    assert_eq!(h.controller.phase(), SessionPhase::Processing);
}

// ---------------------------------------------------------------------------
// Test: completion stops polling and renders once
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn completion_stops_polling_and_renders_once() {
    let api = FakeApi::new();
    api.script([
        running(50.0, 1, 0, 1),
        complete(
            vec![success_record("u1", 1000.0)],
            vec![fail_record("u2", "locked")],
        ),
    ]);
    let h = started(api).await;

    settle().await;
    tokio::time::sleep(POLL).await;

    assert_eq!(h.controller.phase(), SessionPhase::Complete);
    assert!(!h.controller.is_processing());
    assert_eq!(h.controller.live_poll_loops(), 0);

    tokio::time::sleep(POLL * 3).await;
    assert_eq!(FakeApi::count(&h.api.polls), 2);
    assert_eq!(h.view.results_rendered(), 1);

    let state = h.view.state();
    assert_eq!(state.progress.percent, 100);
    assert!(!state.spinner);
    assert_eq!(state.cancel_control, CancelControl::NewSession);
    assert_eq!(state.cancel_control.label(), "New session");

    let results = state.results.unwrap();
    assert_eq!(results.success.rows.len(), 1);
    assert_eq!(results.fail.rows.len(), 1);
    assert_eq!(Some(results), h.controller.results());
}

// ---------------------------------------------------------------------------
// Test: transient errors never stop the loop
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn transient_errors_keep_polling() {
    let api = FakeApi::new();
    api.script_error(500, "database unavailable");
    api.script_error(502, "");
    api.script([complete(vec![success_record("u1", 5.0)], vec![])]);
    let h = started(api).await;

    settle().await;
    assert_eq!(h.controller.phase(), SessionPhase::Processing);
    assert_eq!(h.controller.live_poll_loops(), 1);

    tokio::time::sleep(POLL).await;
    assert_eq!(h.controller.phase(), SessionPhase::Processing);

    tokio::time::sleep(POLL).await;
    assert_eq!(FakeApi::count(&h.api.polls), 3);
    assert_eq!(h.controller.phase(), SessionPhase::Complete);

    // Poll failures are logged, not shown.
    assert!(h.view.notification_log().is_empty());
}

// ---------------------------------------------------------------------------
// Test: a new job after completion polls again
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn new_submission_after_completion_polls_again() {
    let api = FakeApi::new();
    api.script([complete(vec![], vec![fail_record("u1", "bad password")])]);
    let h = started(api).await;
    settle().await;
    assert_eq!(h.controller.phase(), SessionPhase::Complete);

    *h.api.process_id.lock().unwrap() = "process_2".to_string();
    let second = h
        .controller
        .submit_job(Some(spreadsheet("more.xlsx")), Workers::default())
        .await
        .unwrap();

    assert_eq!(second.as_str(), "process_2");
    assert!(h.controller.results().is_none());

    let state = h.view.state();
    assert!(state.results.is_none());
    assert_eq!(state.cancel_control, CancelControl::Cancel);

    settle().await;
    assert_eq!(h.controller.live_poll_loops(), 1);
    assert_eq!(FakeApi::count(&h.api.polls), 2);
}
