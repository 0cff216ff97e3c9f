use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::Notify;

use super::*;

type Seen = Arc<Mutex<Vec<(Option<u32>, bool, Option<String>)>>>;

/// Producer returning 1, 2, 3, ... on successive calls.
fn counter() -> Resource<u32> {
    let n = Arc::new(AtomicU32::new(0));
    Resource::new("counter", move || {
        let n = Arc::clone(&n);
        async move { Ok::<_, CoreError>(n.fetch_add(1, Ordering::SeqCst) + 1) }
    })
}

fn record(resource: &Resource<u32>) -> (Seen, Subscription) {
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    let sub = resource.subscribe(move |snap| {
        sink.lock().unwrap().push((
            snap.data.as_deref().copied(),
            snap.loading,
            snap.error.as_ref().map(ToString::to_string),
        ));
    });
    (seen, sub)
}

#[test]
fn idle_before_first_refresh() {
    let resource = counter();
    let snap = resource.snapshot();

    assert!(snap.data.is_none());
    assert!(!snap.loading);
    assert!(snap.error.is_none());
    assert!(matches!(resource.state(), ResourceState::Idle));
    assert!(!resource.is_loaded());
    assert_eq!(resource.refresh_count(), 0);
}

#[tokio::test]
async fn stale_while_revalidate_keeps_previous_value() {
    let resource = counter();
    let (seen, _sub) = record(&resource);

    resource.refresh().await.unwrap();
    resource.refresh().await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (None, false, None),
            (None, true, None),
            (Some(1), false, None),
            (Some(1), true, None),
            (Some(2), false, None),
        ]
    );
    assert_eq!(resource.refresh_count(), 2);
    assert!(resource.last_updated().is_some());
}

#[tokio::test]
async fn failure_keeps_last_good_value() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let resource = Resource::new("flaky", move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Ok(7_u32)
            } else {
                Err(CoreError::Request {
                    message: "boom".into(),
                })
            }
        }
    });

    resource.refresh().await.unwrap();
    let err = resource.refresh().await.unwrap_err();
    assert_eq!(err.to_string(), "Request failed: boom");

    let snap = resource.snapshot();
    assert_eq!(snap.data.as_deref(), Some(&7));
    assert!(!snap.loading);
    assert_eq!(snap.error, Some(err));
    assert!(matches!(resource.state(), ResourceState::Failed(_)));
    assert_eq!(resource.value().as_deref(), Some(&7));
}

#[tokio::test]
async fn new_subscriber_gets_current_snapshot() {
    let resource = counter();
    resource.refresh().await.unwrap();

    let (seen, _sub) = record(&resource);
    assert_eq!(*seen.lock().unwrap(), vec![(Some(1), false, None)]);
}

#[tokio::test]
async fn unsubscribe_is_idempotent_and_targeted() {
    let resource = counter();
    let (first, first_sub) = record(&resource);
    let (second, _second_sub) = record(&resource);

    first_sub.unsubscribe();
    first_sub.unsubscribe();
    assert!(!first_sub.is_active());
    assert_eq!(resource.subscriber_count(), 1);

    resource.refresh().await.unwrap();

    assert_eq!(first.lock().unwrap().len(), 1);
    assert_eq!(second.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn fire_and_forget_failures_are_stored() {
    let resource: Resource<u32> = Resource::new("always-fails", || async {
        Err(CoreError::Internal("nope".into()))
    });

    for _ in 0..100 {
        drop(resource.refresh());
        tokio::task::yield_now().await;
    }
    // Let the last spawned refresh finish.
    resource.refresh().await.unwrap_err();

    let snap = resource.snapshot();
    assert!(snap.data.is_none());
    assert!(!snap.loading);
    assert_eq!(snap.error, Some(CoreError::Internal("nope".into())));
}

#[tokio::test]
async fn overlapping_refreshes_share_one_producer_call() {
    let gate = Arc::new(Notify::new());
    let release = Arc::clone(&gate);
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let resource = Resource::new("gated", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let gate = Arc::clone(&gate);
        async move {
            gate.notified().await;
            Ok::<_, CoreError>(42_u32)
        }
    });

    let a = resource.refresh();
    let b = resource.refresh();
    assert!(resource.is_loading());

    // notify_one stores a permit, so this cannot be missed.
    release.notify_one();
    let (ra, rb) = tokio::join!(a, b);
    ra.unwrap();
    rb.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(resource.refresh_count(), 1);
    assert_eq!(resource.value().as_deref(), Some(&42));
}

#[tokio::test]
async fn ensure_loaded_only_fetches_once() {
    let resource = counter();

    resource.ensure_loaded().await.unwrap();
    resource.ensure_loaded().await.unwrap();

    assert_eq!(resource.refresh_count(), 1);
    assert_eq!(resource.value().as_deref(), Some(&1));
}

#[tokio::test]
async fn producer_panic_becomes_internal_error() {
    let fuse = 0_u32;
    let resource = Resource::new("panicky", move || async move {
        assert_eq!(fuse, 1, "producer exploded");
        Ok::<_, CoreError>(fuse)
    });

    let err = resource.refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::Internal(_)));
    assert!(!resource.snapshot().loading);
}

#[test]
fn refresh_without_runtime_fails_the_cell() {
    let resource = counter();
    let handle = resource.refresh();

    let result = futures_util::FutureExt::now_or_never(handle).unwrap();
    assert!(matches!(result, Err(CoreError::Internal(_))));
    assert!(resource.snapshot().error.is_some());
    assert_eq!(resource.refresh_count(), 0);
}

#[tokio::test]
async fn callback_may_reenter_the_cell() {
    let resource = counter();
    let inner = resource.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let _sub = resource.subscribe(move |snap| {
        // Reading back from inside a callback must not deadlock.
        let now = inner.snapshot();
        sink.lock().unwrap().push((snap.loading, now.loading));
    });

    resource.refresh().await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn panicking_callback_does_not_starve_later_subscribers() {
    let resource = counter();
    let _bad = resource.subscribe(|snap: &Snapshot<u32>| {
        assert!(snap.data.is_none(), "subscriber bug");
    });
    let (seen, _sub) = record(&resource);

    resource.refresh().await.unwrap();
    assert_eq!(seen.lock().unwrap().last(), Some(&(Some(1), false, None)));

    // Delivery is not wedged: the next refresh reaches the recorder too.
    resource.refresh().await.unwrap();
    assert_eq!(seen.lock().unwrap().last(), Some(&(Some(2), false, None)));
    assert_eq!(seen.lock().unwrap().len(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribe_waits_for_a_busy_deliverer_on_another_thread() {
    let gate = Arc::new(Notify::new());
    let release = Arc::clone(&gate);
    let resource = Resource::new("gated", move || {
        let gate = Arc::clone(&gate);
        async move {
            gate.notified().await;
            Ok::<_, CoreError>(5_u32)
        }
    });

    let (entered_tx, entered_rx) = std::sync::mpsc::channel();
    let _slow = resource.subscribe(move |snap| {
        if snap.loading {
            entered_tx.send(()).unwrap();
            std::thread::sleep(Duration::from_millis(200));
        }
    });

    // The Loading broadcast is delivered synchronously on this thread,
    // which then sits in the slow callback.
    let runtime = tokio::runtime::Handle::current();
    let cell = resource.clone();
    let deliverer = std::thread::spawn(move || {
        let _guard = runtime.enter();
        cell.refresh()
    });
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let (seen, _sub) = record(&resource);
    assert_eq!(*seen.lock().unwrap(), vec![(None, true, None)]);

    let pending = deliverer.join().unwrap();
    release.notify_one();
    pending.await.unwrap();
    assert_eq!(seen.lock().unwrap().last(), Some(&(Some(5), false, None)));
}

#[tokio::test]
async fn dropping_the_subscription_unsubscribes() {
    let resource = counter();
    let (kept, _kept_sub) = record(&resource);
    let (dropped, dropped_sub) = record(&resource);
    assert_eq!(resource.subscriber_count(), 2);

    drop(dropped_sub);
    assert_eq!(resource.subscriber_count(), 1);

    resource.refresh().await.unwrap();
    assert_eq!(dropped.lock().unwrap().len(), 1);
    assert_eq!(kept.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn watch_stream_observes_transitions() {
    let resource = counter();
    let mut stream = resource.watch();
    assert!(stream.current().data.is_none());

    let refresh = resource.refresh();
    let snap = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let snap = stream.changed().await.unwrap();
            if !snap.loading {
                break snap;
            }
        }
    })
    .await
    .unwrap();

    refresh.await.unwrap();
    assert_eq!(snap.data.as_deref(), Some(&1));
    assert_eq!(stream.latest().data.as_deref(), Some(&1));
}
