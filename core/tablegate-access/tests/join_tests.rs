use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tablegate_access::join_all_or_first_error;

async fn after(ms: u64, outcome: Result<u32, &'static str>) -> Result<u32, &'static str> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    outcome
}

#[test]
fn empty_input_is_empty_success() {
    let futures: Vec<std::future::Ready<Result<u32, ()>>> = Vec::new();
    let joined = tokio_test::block_on(join_all_or_first_error(futures));
    assert_eq!(joined, Ok(vec![]));
}

#[tokio::test(start_paused = true)]
async fn outputs_keep_input_order() {
    let joined = join_all_or_first_error([after(30, Ok(1)), after(10, Ok(2)), after(20, Ok(3))]).await;
    assert_eq!(joined, Ok(vec![1, 2, 3]));
}

#[tokio::test(start_paused = true)]
async fn first_failure_to_complete_wins() {
    let joined = join_all_or_first_error([
        after(10, Ok(1)),
        after(30, Err("late")),
        after(20, Err("early")),
    ])
    .await;
    assert_eq!(joined, Err("early"));
}

#[tokio::test(start_paused = true)]
async fn every_future_runs_after_a_failure() {
    let finished = Arc::new(AtomicUsize::new(0));
    let tasks = (0..4u64).map(|i| {
        let finished = finished.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(10 * (i + 1))).await;
            finished.fetch_add(1, Ordering::SeqCst);
            if i == 0 { Err("first") } else { Ok(i) }
        }
    });

    let joined = join_all_or_first_error(tasks).await;
    assert_eq!(joined, Err("first"));
    assert_eq!(finished.load(Ordering::SeqCst), 4);
}
