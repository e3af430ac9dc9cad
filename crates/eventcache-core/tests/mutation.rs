use std::sync::Arc;
use std::time::Duration;

use eventcache_core::api::TransportError;
use eventcache_core::query::{Mutation, MutationStatus};
use parking_lot::Mutex;

fn doubling(log: &Arc<Mutex<Vec<String>>>) -> Mutation<u32, u32> {
    let success_log = Arc::clone(log);
    let error_log = Arc::clone(log);
    let settled_log = Arc::clone(log);
    Mutation::new("double", |n: u32| async move {
        // Larger inputs take longer to write
        tokio::time::sleep(Duration::from_millis(u64::from(n) * 10)).await;
        if n == 0 {
            Err(TransportError::from_status(422, r#"{"message":"Zero is not allowed."}"#))
        } else {
            Ok(n * 2)
        }
    })
    .on_success(move |out, input| success_log.lock().push(format!("success {} -> {}", input, out)))
    .on_error(move |error, input| error_log.lock().push(format!("error {}: {}", input, error.user_message("?"))))
    .on_settled(move |result, input| {
        settled_log
            .lock()
            .push(format!("settled {} ok={}", input, result.is_ok()))
    })
}

#[tokio::test(start_paused = true)]
async fn successful_mutation_runs_success_then_settled() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mutation = doubling(&log);
    assert!(mutation.state().is_idle());

    let record = mutation.mutate(3).await;

    assert!(record.is_success());
    assert_eq!(record.data, Some(6));
    assert!(record.submitted_at.is_some());
    assert_eq!(mutation.state().data, Some(6));
    assert_eq!(*log.lock(), vec!["success 3 -> 6", "settled 3 ok=true"]);
}

#[tokio::test(start_paused = true)]
async fn failed_mutation_records_error_and_runs_error_callbacks() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mutation = doubling(&log);

    let record = mutation.mutate(0).await;

    assert_eq!(record.status, MutationStatus::Error);
    assert!(record.data.is_none());
    assert_eq!(
        record.error.unwrap().user_message("Failed to create event. Check your inputs!"),
        "Zero is not allowed."
    );
    assert_eq!(*log.lock(), vec!["error 0: Zero is not allowed.", "settled 0 ok=false"]);
}

#[tokio::test(start_paused = true)]
async fn record_shows_pending_while_writing() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mutation = doubling(&log);

    let running = {
        let mutation = mutation.clone();
        tokio::spawn(async move { mutation.mutate(5).await })
    };
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(mutation.state().is_pending());

    running.await.unwrap();
    assert!(mutation.state().is_success());
}

#[tokio::test(start_paused = true)]
async fn latest_invocation_owns_the_record() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mutation = doubling(&log);

    // The first write is slower and settles after the second one
    let (slow, fast) = futures::join!(mutation.mutate(10), mutation.mutate(1));

    assert_eq!(slow.data, Some(20));
    assert_eq!(fast.data, Some(2));
    assert_eq!(mutation.state().data, Some(2));
    // Callbacks run for both invocations
    assert_eq!(log.lock().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn reset_returns_to_idle() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mutation = doubling(&log);
    mutation.mutate(0).await;
    assert!(mutation.state().is_error());

    mutation.reset();
    let state = mutation.state();
    assert!(state.is_idle());
    assert!(state.error.is_none());
}
