//! Push-based data streams
//!
//! ## Overview
//!
//! Sensor readings arrive when the peripheral decides, on whatever thread the
//! transport delivers them. The link layer therefore exposes push streams:
//! a [`Subject`] is the producing end, an [`Observable`] the consuming end,
//! and [`Observable::subscribe`] attaches a callback for as long as the
//! returned [`Subscription`] lives.
//!
//! ```text
//! transport callback ─▶ Subject<RawFrame> ─▶ filter_map(decode) ─▶ sample ─▶ distinct ─▶ consumers
//! ```
//!
//! ## Ownership
//!
//! Every operator returns a new observable that holds its upstream
//! subscription. Operator callbacks hold only a weak reference downstream, so
//! a chain lives exactly as long as someone holds its tail (an `Observable`
//! or a `Subscription`). Dropping the tail detaches the whole chain.
//!
//! ## Threading
//!
//! Observers run synchronously on the emitting thread. Deliveries on one
//! stream are serialized; different streams deliver concurrently when their
//! sources emit from different threads. Operator state (latest sample, last
//! distinct value, combine slots) sits behind its own mutex.
//! [`Observable::sample`] runs its interval on a Tokio task and never blocks
//! the emitting thread.
//!
//! ## Completion
//!
//! Closing a stream drops its observers and upstream subscriptions; later
//! emissions are discarded and later subscriptions are inert. Closing waits
//! for a delivery in progress on another thread, so once `close` returns no
//! observer of that stream is running or will run. An observer may close its
//! own stream.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use sensortag_core::{Distinct, LatestPair, SameValue, SampleSlot};
use tokio::time::{self, Instant, MissedTickBehavior};

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Shared<T> {
    observers: Mutex<Vec<(u64, Observer<T>)>>,
    next_id: AtomicU64,
    closed: AtomicBool,
    /// Held for the whole of a delivery and while closing
    delivery: ReentrantMutex<()>,
    upstream: Mutex<Vec<Subscription>>,
}

impl<T> Shared<T> {
    fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            delivery: ReentrantMutex::new(()),
            upstream: Mutex::new(Vec::new()),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn emit(&self, value: &T) {
        let _delivering = self.delivery.lock();
        if self.is_closed() {
            return;
        }

        let observers: Vec<Observer<T>> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();

        for observer in observers {
            if self.is_closed() {
                return;
            }
            observer(value);
        }
    }

    fn attach(&self, observer: Observer<T>) -> Option<u64> {
        let mut observers = self.observers.lock();
        if self.is_closed() {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        observers.push((id, observer));
        Some(id)
    }

    fn close(&self) {
        let delivering = self.delivery.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let observers = std::mem::take(&mut *self.observers.lock());
        let upstream = std::mem::take(&mut *self.upstream.lock());
        drop(delivering);
        drop(observers);
        drop(upstream);
    }
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<T> Detach for Shared<T> {
    fn detach(&self, id: u64) {
        self.observers.lock().retain(|(i, _)| *i != id);
    }
}

/// Handle keeping one observer attached
///
/// Dropping it (or calling [`unsubscribe`](Self::unsubscribe)) detaches the
/// observer. Detaching twice is a no-op.
#[must_use = "dropping a Subscription detaches its observer"]
pub struct Subscription {
    source: Option<Arc<dyn Detach>>,
    id: u64,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            source: None,
            id: 0,
        }
    }

    pub fn unsubscribe(mut self) {
        self.detach();
    }

    /// False once detached or if the stream was already closed.
    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    fn detach(&mut self) {
        if let Some(source) = self.source.take() {
            source.detach(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Producing end of a stream
pub struct Subject<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
        }
    }

    /// Pushes `value` to every current observer.
    pub fn next(&self, value: T) {
        self.shared.emit(&value);
    }

    pub fn emit(&self, value: &T) {
        self.shared.emit(value);
    }

    /// Closes the stream. Idempotent.
    pub fn complete(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn observer_count(&self) -> usize {
        self.shared.observers.lock().len()
    }

    pub fn observable(&self) -> Observable<T> {
        Observable {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Consuming end of a stream; cheap to clone, multi-subscriber
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> Observable<T> {
    /// Attaches `observer` until the returned subscription is dropped.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.attach(Arc::new(observer))
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub(crate) fn close(&self) {
        self.shared.close();
    }

    fn attach(&self, observer: Observer<T>) -> Subscription {
        match self.shared.attach(observer) {
            Some(id) => Subscription {
                source: Some(self.shared.clone() as Arc<dyn Detach>),
                id,
            },
            None => Subscription::inert(),
        }
    }

    /// Builds a downstream stream fed by an observer on this one.
    fn derive<U, B>(&self, build: B) -> Observable<U>
    where
        U: Send + Sync + 'static,
        B: FnOnce(Weak<Shared<U>>) -> Observer<T>,
    {
        let downstream = Arc::new(Shared::new());
        let subscription = self.attach(build(Arc::downgrade(&downstream)));
        downstream.upstream.lock().push(subscription);
        Observable { shared: downstream }
    }

    pub fn map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.derive(move |out: Weak<Shared<U>>| -> Observer<T> {
            Arc::new(move |value: &T| {
                if let Some(out) = out.upgrade() {
                    out.emit(&f(value));
                }
            })
        })
    }

    /// Maps and drops `None` results.
    pub fn filter_map<U, F>(&self, f: F) -> Observable<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> Option<U> + Send + Sync + 'static,
    {
        self.derive(move |out: Weak<Shared<U>>| -> Observer<T> {
            Arc::new(move |value: &T| {
                if let (Some(mapped), Some(out)) = (f(value), out.upgrade()) {
                    out.emit(&mapped);
                }
            })
        })
    }

    pub fn filter<F>(&self, predicate: F) -> Observable<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.derive(move |out: Weak<Shared<T>>| -> Observer<T> {
            Arc::new(move |value: &T| {
                if predicate(value) {
                    if let Some(out) = out.upgrade() {
                        out.emit(value);
                    }
                }
            })
        })
    }

    /// Suppresses a value equal to the one forwarded just before it.
    pub fn distinct_until_changed(&self) -> Observable<T>
    where
        T: SameValue + Clone,
    {
        self.derive(move |out: Weak<Shared<T>>| -> Observer<T> {
            let gate = Mutex::new(Distinct::new());
            Arc::new(move |value: &T| {
                let admitted = gate.lock().admit(value);
                if admitted {
                    if let Some(out) = out.upgrade() {
                        out.emit(value);
                    }
                }
            })
        })
    }

    /// Forwards at most one value per `period`: the latest one seen during
    /// the period. Periods without a new value emit nothing.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn sample(&self, period: Duration) -> Observable<T>
    where
        T: Clone,
    {
        let period = period.max(Duration::from_millis(1));
        let slot = Arc::new(Mutex::new(SampleSlot::new()));

        let sink = slot.clone();
        let sampled = self.derive(move |_: Weak<Shared<T>>| -> Observer<T> {
            Arc::new(move |value: &T| sink.lock().offer(value.clone()))
        });

        let out = Arc::downgrade(&sampled.shared);
        tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticks.tick().await;

                let Some(out) = out.upgrade() else { break };
                if out.is_closed() {
                    break;
                }

                let pending = slot.lock().take();
                if let Some(value) = pending {
                    out.emit(&value);
                }
            }
        });

        sampled
    }

    /// Emits `f(latest self, latest other)` whenever either side emits, once
    /// both have emitted at least once.
    pub fn combine_latest<B, U, F>(&self, other: &Observable<B>, f: F) -> Observable<U>
    where
        T: Clone,
        B: Clone + Send + Sync + 'static,
        U: Send + Sync + 'static,
        F: Fn(&T, &B) -> U + Send + Sync + 'static,
    {
        let downstream: Arc<Shared<U>> = Arc::new(Shared::new());
        let state = Arc::new(Mutex::new(LatestPair::<T, B>::new()));
        let f = Arc::new(f);

        let left = {
            let (state, f, out) = (state.clone(), f.clone(), Arc::downgrade(&downstream));
            move |a: &T| {
                let pair = state.lock().set_left(a.clone());
                if let (Some((a, b)), Some(out)) = (pair, out.upgrade()) {
                    out.emit(&f(&a, &b));
                }
            }
        };

        let right = {
            let out = Arc::downgrade(&downstream);
            move |b: &B| {
                let pair = state.lock().set_right(b.clone());
                if let (Some((a, b)), Some(out)) = (pair, out.upgrade()) {
                    out.emit(&f(&a, &b));
                }
            }
        };

        let subscriptions = [self.subscribe(left), other.subscribe(right)];
        downstream.upstream.lock().extend(subscriptions);
        Observable { shared: downstream }
    }
}

impl<T: Send + Sync + 'static> From<&Subject<T>> for Observable<T> {
    fn from(subject: &Subject<T>) -> Self {
        subject.observable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: Clone + Send + Sync + 'static>(
        source: &Observable<T>,
    ) -> (Arc<Mutex<Vec<T>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = source.subscribe(move |v: &T| sink.lock().push(v.clone()));
        (seen, sub)
    }

    #[test]
    fn multiple_subscribers_and_unsubscribe() {
        let subject = Subject::new();
        let (a, sub_a) = collect(&subject.observable());
        let (b, _sub_b) = collect(&subject.observable());

        subject.next(1);
        sub_a.unsubscribe();
        subject.next(2);

        assert_eq!(*a.lock(), vec![1]);
        assert_eq!(*b.lock(), vec![1, 2]);
        assert_eq!(subject.observer_count(), 1);
    }

    #[test]
    fn dropping_subscription_detaches() {
        let subject = Subject::new();
        let (seen, sub) = collect(&subject.observable());
        drop(sub);
        subject.next(7);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn complete_discards_later_values() {
        let subject = Subject::new();
        let (seen, sub) = collect(&subject.observable());

        subject.next(1.0);
        subject.complete();
        subject.complete();
        subject.next(2.0);

        assert_eq!(*seen.lock(), vec![1.0]);
        assert!(subject.is_closed());

        let late = subject.observable().subscribe(|_: &f64| {});
        assert!(!late.is_active());
        drop(sub);
    }

    #[test]
    fn close_waits_for_delivery_on_another_thread() {
        let subject = Subject::new();
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let entered_tx = Mutex::new(entered_tx);
        let finished = Arc::new(AtomicBool::new(false));

        let done = finished.clone();
        let _sub = subject.observable().subscribe(move |_: &i32| {
            let _ = entered_tx.lock().send(());
            std::thread::sleep(Duration::from_millis(50));
            done.store(true, Ordering::Release);
        });

        let producer = {
            let subject = subject.clone();
            std::thread::spawn(move || subject.next(1))
        };
        entered_rx.recv().unwrap();
        subject.complete();

        assert!(finished.load(Ordering::Acquire));
        producer.join().unwrap();
    }

    #[test]
    fn observer_may_close_its_own_stream() {
        let subject = Subject::new();
        let handle = subject.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = subject.observable().subscribe(move |v: &i32| {
            sink.lock().push(*v);
            handle.complete();
        });

        subject.next(1);
        subject.next(2);

        assert_eq!(*seen.lock(), vec![1]);
        assert!(subject.is_closed());
    }

    #[test]
    fn map_and_filter_map_chain() {
        let subject = Subject::new();
        let doubled_evens = subject
            .observable()
            .filter_map(|v: &i32| if v % 2 == 0 { Some(*v) } else { None })
            .map(|v: &i32| v * 2);
        let (seen, _sub) = collect(&doubled_evens);

        for v in 1..=6 {
            subject.next(v);
        }
        assert_eq!(*seen.lock(), vec![4, 8, 12]);
    }

    #[test]
    fn chain_lives_while_tail_is_held() {
        let subject = Subject::new();
        let tail = subject.observable().map(|v: &i32| *v + 1).filter(|v: &i32| *v > 0);
        assert_eq!(subject.observer_count(), 1);

        drop(tail);
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn distinct_until_changed_drops_repeats() {
        let subject = Subject::new();
        let (seen, _sub) = collect(&subject.observable().distinct_until_changed());

        for v in [1.0, 1.0, 2.0, 2.0, 1.0] {
            subject.next(v);
        }
        assert_eq!(*seen.lock(), vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn combine_latest_waits_for_both() {
        let left = Subject::new();
        let right = Subject::new();
        let combined = left
            .observable()
            .combine_latest(&right.observable(), |a: &i32, b: &i32| a * 10 + b);
        let (seen, _sub) = collect(&combined);

        left.next(1);
        left.next(2);
        right.next(5);
        right.next(6);
        left.next(3);

        assert_eq!(*seen.lock(), vec![25, 26, 36]);
    }

    #[tokio::test(start_paused = true)]
    async fn sample_forwards_latest_per_period() {
        let subject = Subject::new();
        let (seen, _sub) = collect(&subject.observable().sample(Duration::from_millis(300)));

        subject.next(1);
        subject.next(2);
        subject.next(3);
        time::sleep(Duration::from_millis(350)).await;
        assert_eq!(*seen.lock(), vec![3]);

        // Nothing new: nothing emitted
        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*seen.lock(), vec![3]);

        subject.next(4);
        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*seen.lock(), vec![3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn sample_task_stops_when_closed() {
        let subject = Subject::new();
        let sampled = subject.observable().sample(Duration::from_millis(100));
        let (seen, _sub) = collect(&sampled);

        sampled.close();
        subject.next(1);
        time::sleep(Duration::from_millis(250)).await;
        assert!(seen.lock().is_empty());
        assert_eq!(subject.observer_count(), 0);
    }
}
