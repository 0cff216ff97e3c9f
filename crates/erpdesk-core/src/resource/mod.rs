// ── Async resource cell ──
//
// A single cached value produced by an async function, with ordered
// push notification to callbacks and a `watch` channel for streams.

mod stream;

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};
use std::thread::{self, ThreadId};

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::error::CoreError;

pub use stream::{ResourceStream, ResourceWatchStream};

type Producer<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, CoreError>> + Send + Sync>;
type Callback<T> = Arc<dyn Fn(&Snapshot<T>) + Send + Sync>;

// ── Snapshot & state ─────────────────────────────────────────────────

/// What subscribers see: the last good value, whether a refresh is in
/// flight, and the error from the most recent refresh (if it failed).
///
/// Snapshots are immutable; every transition produces a new one.
pub struct Snapshot<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    pub error: Option<CoreError>,
}

impl<T> Snapshot<T> {
    fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("data", &self.data)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

/// Lifecycle of a resource cell.
pub enum ResourceState<T> {
    /// Never refreshed.
    Idle,
    /// A producer call is in flight.
    Loading,
    /// The last refresh succeeded with this value.
    Ready(Arc<T>),
    /// The last refresh failed. The previous value, if any, is still served.
    Failed(CoreError),
}

impl<T> Clone for ResourceState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading => Self::Loading,
            Self::Ready(v) => Self::Ready(Arc::clone(v)),
            Self::Failed(e) => Self::Failed(e.clone()),
        }
    }
}

impl<T> fmt::Debug for ResourceState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Loading => f.write_str("Loading"),
            Self::Ready(_) => f.write_str("Ready(..)"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

// ── Refresh handle ───────────────────────────────────────────────────

/// Completion handle for a refresh.
///
/// The refresh itself runs on a spawned task, so dropping this handle
/// does not cancel it: that is the fire-and-forget mode, and any error
/// is only observable through the cell's snapshot. Awaiting it yields the
/// outcome; every caller that joined the same in-flight refresh gets the
/// same result.
#[derive(Clone)]
pub struct Refresh {
    inner: Shared<BoxFuture<'static, Result<(), CoreError>>>,
}

impl Refresh {
    /// A handle that is already complete.
    pub fn ready(result: Result<(), CoreError>) -> Self {
        Self {
            inner: futures_util::future::ready(result).boxed().shared(),
        }
    }
}

impl Future for Refresh {
    type Output = Result<(), CoreError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

impl fmt::Debug for Refresh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refresh")
            .field("complete", &self.inner.peek().is_some())
            .finish()
    }
}

// ── Subscription handle ──────────────────────────────────────────────

trait SubscriberSet: Send + Sync {
    fn remove(&self, id: u64);
}

/// Returned by [`Resource::subscribe`]. The callback stays registered
/// until [`unsubscribe`](Self::unsubscribe) is called or the handle is
/// dropped, whichever comes first.
#[must_use = "dropping a Subscription unsubscribes its callback"]
pub struct Subscription {
    id: u64,
    set: Weak<dyn SubscriberSet>,
    done: AtomicBool,
}

impl Subscription {
    /// Stop receiving snapshots. Repeated calls are no-ops.
    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(set) = self.set.upgrade() {
            set.remove(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        !self.done.load(Ordering::Acquire) && self.set.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ── Cell internals ───────────────────────────────────────────────────

enum Delivery<T> {
    /// A state transition, for everyone subscribed at the time.
    Broadcast { snapshot: Snapshot<T>, targets: Vec<u64> },
    /// The initial snapshot for one new subscriber.
    Direct { snapshot: Snapshot<T>, target: u64 },
}

struct CellState<T> {
    phase: ResourceState<T>,
    last_value: Option<Arc<T>>,
    last_updated: Option<DateTime<Utc>>,
    in_flight: Option<Refresh>,
    subscribers: Vec<(u64, Callback<T>)>,
    queue: VecDeque<Delivery<T>>,
    /// Thread currently running callbacks, if any.
    deliverer: Option<ThreadId>,
    /// Deliveries ever queued / ever completed. The queue is FIFO, so a
    /// delivery with sequence `n` is done once `delivered >= n`.
    enqueued: u64,
    delivered: u64,
}

impl<T> CellState<T> {
    fn push(&mut self, delivery: Delivery<T>) -> u64 {
        self.queue.push_back(delivery);
        self.enqueued += 1;
        self.enqueued
    }

    fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            data: self.last_value.clone(),
            loading: matches!(self.phase, ResourceState::Loading),
            error: match &self.phase {
                ResourceState::Failed(e) => Some(e.clone()),
                _ => None,
            },
        }
    }
}

struct Inner<T> {
    name: String,
    producer: Producer<T>,
    state: Mutex<CellState<T>>,
    watch: watch::Sender<Snapshot<T>>,
    progress: Condvar,
    next_subscriber: AtomicU64,
    refresh_count: AtomicU64,
}

impl<T: Send + Sync + 'static> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, CellState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the current snapshot for every subscriber and publish it on
    /// the watch channel. Must be called with the state lock held so
    /// queue order matches transition order.
    fn enqueue_broadcast(&self, state: &mut CellState<T>) {
        let snapshot = state.snapshot();
        let targets = state.subscribers.iter().map(|(id, _)| *id).collect();
        self.watch.send_replace(snapshot.clone());
        state.push(Delivery::Broadcast { snapshot, targets });
    }

    /// Deliver queued snapshots in order.
    ///
    /// Only one thread delivers at a time; anyone else (including a
    /// callback re-entering the cell) just leaves its items in the queue
    /// for the active deliverer. Callbacks run without the lock held, and
    /// a panicking callback is logged and skipped.
    fn drain(&self) {
        {
            let mut state = self.lock();
            if state.deliverer.is_some() {
                return;
            }
            state.deliverer = Some(thread::current().id());
        }

        loop {
            let (snapshot, callbacks) = {
                let mut state = self.lock();
                let Some(delivery) = state.queue.pop_front() else {
                    state.deliverer = None;
                    break;
                };
                let (snapshot, targets) = match delivery {
                    Delivery::Broadcast { snapshot, targets } => (snapshot, targets),
                    Delivery::Direct { snapshot, target } => (snapshot, vec![target]),
                };
                // Resolve against the live list so unsubscribed callbacks are skipped.
                let callbacks: Vec<Callback<T>> = targets
                    .iter()
                    .filter_map(|id| {
                        state
                            .subscribers
                            .iter()
                            .find(|(sid, _)| sid == id)
                            .map(|(_, cb)| Arc::clone(cb))
                    })
                    .collect();
                (snapshot, callbacks)
            };

            for callback in callbacks {
                if panic::catch_unwind(AssertUnwindSafe(|| callback(&snapshot))).is_err() {
                    warn!(resource = %self.name, "subscriber callback panicked");
                }
            }

            self.lock().delivered += 1;
            self.progress.notify_all();
        }
    }

    /// Block until delivery `seq` has run.
    ///
    /// Returns at once when called from the active deliverer (a callback
    /// re-entering the cell).
    fn wait_delivered(&self, seq: u64) {
        let me = thread::current().id();
        let mut state = self.lock();
        loop {
            if state.delivered >= seq || state.deliverer == Some(me) {
                return;
            }
            if state.deliverer.is_none() {
                drop(state);
                self.drain();
                state = self.lock();
                continue;
            }
            state = self
                .progress
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    async fn run_refresh(self: Arc<Self>) -> Result<(), CoreError> {
        self.refresh_count.fetch_add(1, Ordering::Relaxed);
        let started = std::time::Instant::now();

        let outcome = AssertUnwindSafe(async { (self.producer)().await })
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(CoreError::Internal(format!(
                    "producer for '{}' panicked",
                    self.name
                )))
            });

        let result = {
            let mut state = self.lock();
            state.in_flight = None;
            let result = match outcome {
                Ok(value) => {
                    let value = Arc::new(value);
                    state.last_value = Some(Arc::clone(&value));
                    state.last_updated = Some(Utc::now());
                    state.phase = ResourceState::Ready(value);
                    debug!(
                        resource = %self.name,
                        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "refresh complete"
                    );
                    Ok(())
                }
                Err(err) => {
                    warn!(resource = %self.name, error = %err, "refresh failed");
                    state.phase = ResourceState::Failed(err.clone());
                    Err(err)
                }
            };
            self.enqueue_broadcast(&mut state);
            result
        };

        self.drain();
        result
    }
}

impl<T: Send + Sync + 'static> SubscriberSet for Inner<T> {
    fn remove(&self, id: u64) {
        let mut state = self.lock();
        state.subscribers.retain(|(sid, _)| *sid != id);
        trace!(resource = %self.name, id, "unsubscribed");
    }
}

// ── Resource ─────────────────────────────────────────────────────────

/// A single-value async cache cell.
///
/// Cheaply cloneable; clones share the same cell. Starts [`Idle`]
/// with no data and never fetches on its own.
///
/// At most one producer call runs at a time: calling [`refresh`] while a
/// refresh is in flight returns a handle to that same refresh.
///
/// [`Idle`]: ResourceState::Idle
/// [`refresh`]: Self::refresh
pub struct Resource<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl<T: Send + Sync + 'static> Resource<T> {
    /// Wrap `producer`. Nothing runs until the first [`refresh`](Self::refresh).
    pub fn new<F, Fut, E>(name: impl Into<String>, producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<CoreError> + 'static,
    {
        let producer: Producer<T> =
            Arc::new(move || producer().map(|r| r.map_err(Into::into)).boxed());
        let (watch, _) = watch::channel(Snapshot::idle());

        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                producer,
                state: Mutex::new(CellState {
                    phase: ResourceState::Idle,
                    last_value: None,
                    last_updated: None,
                    in_flight: None,
                    subscribers: Vec::new(),
                    queue: VecDeque::new(),
                    deliverer: None,
                    enqueued: 0,
                    delivered: 0,
                }),
                watch,
                progress: Condvar::new(),
                next_subscriber: AtomicU64::new(1),
                refresh_count: AtomicU64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Re-run the producer.
    ///
    /// Synchronously moves the cell to `Loading` (keeping the last value)
    /// and notifies subscribers, then runs the producer on a spawned task.
    /// The returned [`Refresh`] may be awaited for the outcome or dropped.
    ///
    /// Must be called from within a tokio runtime; otherwise the cell is
    /// moved to `Failed` and the returned handle resolves to that error.
    pub fn refresh(&self) -> Refresh {
        let (refresh, handle, task) = {
            let mut state = self.inner.lock();
            if let Some(ref in_flight) = state.in_flight {
                trace!(resource = %self.inner.name, "joining in-flight refresh");
                return in_flight.clone();
            }

            let Ok(handle) = Handle::try_current() else {
                let err = CoreError::Internal(format!(
                    "refreshing '{}' requires a running tokio runtime",
                    self.inner.name
                ));
                state.phase = ResourceState::Failed(err.clone());
                self.inner.enqueue_broadcast(&mut state);
                drop(state);
                self.inner.drain();
                return Refresh::ready(Err(err));
            };

            trace!(resource = %self.inner.name, "refresh started");
            state.phase = ResourceState::Loading;
            let task = Arc::clone(&self.inner).run_refresh().boxed().shared();
            let refresh = Refresh {
                inner: task.clone(),
            };
            state.in_flight = Some(refresh.clone());
            self.inner.enqueue_broadcast(&mut state);
            (refresh, handle, task)
        };

        handle.spawn(task);
        self.inner.drain();
        refresh
    }

    /// Refresh only if the cell holds no successful value yet.
    ///
    /// Joins an in-flight refresh; retries after a failure.
    pub fn ensure_loaded(&self) -> Refresh {
        {
            let state = self.inner.lock();
            if let Some(in_flight) = &state.in_flight {
                return in_flight.clone();
            }
            if matches!(state.phase, ResourceState::Ready(_)) {
                return Refresh::ready(Ok(()));
            }
        }
        self.refresh()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register `callback` and deliver the current snapshot to it at once.
    ///
    /// Callbacks are invoked in subscription order on every transition.
    /// If another thread is mid-delivery, this waits for it to reach the
    /// new subscriber, so the initial snapshot has always been seen by the
    /// time `subscribe` returns. The one exception is a callback subscribing
    /// to the cell it is being notified by: nested notifications are queued
    /// and delivered after the current callback returns.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Snapshot<T>) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let seq = {
            let mut state = self.inner.lock();
            state.subscribers.push((id, Arc::new(callback)));
            let snapshot = state.snapshot();
            state.push(Delivery::Direct {
                snapshot,
                target: id,
            })
        };
        trace!(resource = %self.inner.name, id, "subscribed");
        self.inner.drain();
        self.inner.wait_delivered(seq);

        let inner = Arc::clone(&self.inner);
        let set: Arc<dyn SubscriberSet> = inner;
        Subscription {
            id,
            set: Arc::downgrade(&set),
            done: AtomicBool::new(false),
        }
    }

    /// Stream of snapshots backed by a `watch` channel.
    ///
    /// Unlike callbacks, a slow stream consumer only ever sees the latest
    /// snapshot; intermediate transitions may be skipped.
    pub fn watch(&self) -> ResourceStream<T> {
        ResourceStream::new(self.inner.watch.subscribe())
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Snapshot<T> {
        self.inner.lock().snapshot()
    }

    pub fn state(&self) -> ResourceState<T> {
        self.inner.lock().phase.clone()
    }

    /// The last successfully produced value.
    pub fn value(&self) -> Option<Arc<T>> {
        self.inner.lock().last_value.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().in_flight.is_some()
    }

    /// When the last successful refresh completed.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_updated
    }

    /// Whether any refresh has ever succeeded.
    pub fn is_loaded(&self) -> bool {
        self.inner.lock().last_value.is_some()
    }

    /// How many times the producer has been invoked.
    pub fn refresh_count(&self) -> u64 {
        self.inner.refresh_count.load(Ordering::Relaxed)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests;
