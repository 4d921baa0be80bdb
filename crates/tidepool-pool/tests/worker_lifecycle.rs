//! Worker lifecycle tests on tokio's paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tidepool_core::WorkItem;
use tidepool_pool::*;

const RETRY: Duration = Duration::from_millis(100);

fn recording_processor(log: Arc<Mutex<Vec<String>>>, unit: Duration) -> ProcessFn {
    processor_fn(move |item: WorkItem| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(format!("start {}", item.magnitude()));
            tokio::time::sleep(item.cost(unit)).await;
            log.lock().unwrap().push(format!("end {}", item.magnitude()));
            Ok(())
        }
    })
}

#[tokio::test(start_paused = true)]
async fn worker_drains_queue_in_order_then_exits_on_grant() {
    let handles = PoolHandles::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    for m in [5u64, 10, 15] {
        handles.queue.push(m);
    }

    let worker = Worker::new(1, handles.clone(), RETRY, recording_processor(log.clone(), Duration::from_millis(1)));
    let handle = worker.spawn();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(handles.pool.value(), 1);
    assert!(handles.queue.is_empty());
    assert_eq!(
        *log.lock().unwrap(),
        vec!["start 5", "end 5", "start 10", "end 10", "start 15", "end 15"]
    );

    handles.tokens.set_pending(1);
    let exit = handle.await.unwrap();
    assert_eq!(exit, WorkerExit::Terminated);
    assert_eq!(handles.pool.value(), 0);
    assert_eq!(handles.tokens.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn in_flight_item_finishes_and_no_new_item_starts() {
    let handles = PoolHandles::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    handles.queue.push(500u64);
    handles.queue.push(500u64);

    let handle = Worker::new(7, handles.clone(), RETRY, recording_processor(log.clone(), Duration::from_millis(1)))
        .spawn();

    // Mid-way through the first item.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*log.lock().unwrap(), vec!["start 500"]);
    handles.tokens.set_pending(1);

    assert_eq!(handle.await.unwrap(), WorkerExit::Terminated);
    assert_eq!(*log.lock().unwrap(), vec!["start 500", "end 500"]);
    assert_eq!(handles.queue.len(), 1);
    assert_eq!(handles.pool.value(), 0);
}

#[tokio::test(start_paused = true)]
async fn processing_error_deregisters_worker() {
    let handles = PoolHandles::new();
    handles.queue.push(13u64);
    handles.queue.push(1u64);

    let process = processor_fn(|item: WorkItem| async move {
        if item.magnitude() == 13 {
            anyhow::bail!("unlucky item");
        }
        Ok(())
    });

    let exit = Worker::new(2, handles.clone(), RETRY, process).spawn().await.unwrap();
    assert_eq!(exit, WorkerExit::Faulted);
    assert_eq!(handles.pool.value(), 0);
    assert_eq!(handles.pool.exited_total(), 1);
    // The faulted worker never touched the next item.
    assert_eq!(handles.queue.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn panic_during_processing_deregisters_worker() {
    let handles = PoolHandles::new();
    handles.queue.push(3u64);

    let process = processor_fn(|item: WorkItem| async move {
        if item.magnitude() == 3 {
            panic!("processor panicked");
        }
        Ok(())
    });

    let result = Worker::new(3, handles.clone(), RETRY, process).spawn().await;
    assert!(result.unwrap_err().is_panic());
    assert_eq!(handles.pool.value(), 0);
    assert_eq!(handles.pool.started_total(), 1);
    assert_eq!(handles.pool.exited_total(), 1);
}

#[tokio::test(start_paused = true)]
async fn deposit_of_k_tokens_stops_exactly_k_idle_workers() {
    let handles = PoolHandles::new();
    let workers: Vec<_> = (0..10)
        .map(|id| Worker::new(id, handles.clone(), RETRY, simulated_processor(Duration::from_millis(1))).spawn())
        .collect();

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handles.pool.value(), 10);

    handles.tokens.set_pending(3);
    tokio::time::sleep(RETRY * 3).await;

    assert_eq!(handles.pool.value(), 7);
    assert_eq!(handles.tokens.pending(), 0);
    assert_eq!(workers.iter().filter(|h| h.is_finished()).count(), 3);

    // Nothing else leaves without another deposit.
    tokio::time::sleep(RETRY * 10).await;
    assert_eq!(handles.pool.value(), 7);

    handles.tokens.set_pending(7);
    tokio::time::sleep(RETRY * 3).await;
    assert_eq!(handles.pool.value(), 0);
    for w in workers {
        assert_eq!(w.await.unwrap(), WorkerExit::Terminated);
    }
}
