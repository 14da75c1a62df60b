//! Repeated-fetch loop exposing loading/error/value state to a view.
//!
//! A [`Poller`] issues one fetch at a time. After each cycle it asks the
//! continuation predicate whether the latest value is still worth watching
//! and, if so, sleeps for the configured interval before fetching again.
//!
//! Every loop carries a generation number. [`Poller::restart`] and
//! [`Poller::stop`] bump the generation and cancel the pending timer; a fetch
//! that was already in flight is allowed to finish, but its result is dropped
//! because its generation no longer matches.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Human-readable description of a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
}

impl From<&anyhow::Error> for ErrorInfo {
    fn from(error: &anyhow::Error) -> Self {
        Self {
            message: format!("{error:#}"),
        }
    }
}

/// Snapshot of a poller as seen by its view.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState<T> {
    pub loading: bool,
    pub error: Option<ErrorInfo>,
    pub value: Option<T>,
}

impl<T> Default for PollState<T> {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            value: None,
        }
    }
}

/// Source of values for a [`Poller`].
///
/// `Ok(None)` is a successful fetch that produced nothing, for example when
/// there is no identifier to look up yet.
#[async_trait]
pub trait PollFetch<T>: Send + Sync {
    async fn fetch(&self) -> Result<Option<T>>;
}

/// Adapter turning an async closure into a [`PollFetch`].
pub struct FnFetch<F, T> {
    fetch: F,
    _value: PhantomData<fn() -> T>,
}

/// Wraps `fetch` so it can drive a [`Poller`].
pub fn fetch_fn<F, Fut, T>(fetch: F) -> FnFetch<F, T>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<T>>> + Send,
{
    FnFetch {
        fetch,
        _value: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, T> PollFetch<T> for FnFetch<F, T>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<T>>> + Send,
    T: Send,
{
    async fn fetch(&self) -> Result<Option<T>> {
        (self.fetch)().await
    }
}

/// Decides after each cycle whether another fetch should be scheduled.
pub type ContinuePredicate<T> = Arc<dyn Fn(Option<&T>) -> bool + Send + Sync>;

#[derive(Default)]
struct PollControl {
    generation: u64,
    cancel: Option<CancellationToken>,
}

struct PollShared<T> {
    fetch: Arc<dyn PollFetch<T>>,
    interval: Duration,
    should_continue: ContinuePredicate<T>,
    state_tx: watch::Sender<PollState<T>>,
    control: Mutex<PollControl>,
}

impl<T> PollShared<T> {
    fn control(&self) -> MutexGuard<'_, PollControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn halt(&self) {
        let mut control = self.control();
        control.generation += 1;
        if let Some(cancel) = control.cancel.take() {
            cancel.cancel();
            debug!(generation = control.generation, "poller stopped");
        }
    }

    /// Applies a fetch outcome if `generation` is still current.
    ///
    /// Returns `None` for a superseded cycle, otherwise whether polling
    /// should continue.
    fn apply(&self, generation: u64, outcome: Result<Option<T>>) -> Option<bool> {
        let control = self.control();
        if control.generation != generation {
            debug!(generation, current = control.generation, "discarding superseded poll result");
            return None;
        }

        self.state_tx.send_modify(|state| {
            state.loading = false;
            match outcome {
                Ok(value) => {
                    state.value = value;
                    state.error = None;
                }
                Err(error) => {
                    warn!(error = %error, "poll cycle failed");
                    state.error = Some(ErrorInfo::from(&error));
                }
            }
        });

        let state = self.state_tx.borrow();
        Some((self.should_continue)(state.value.as_ref()))
    }
}

/// Polls a [`PollFetch`] until the continuation predicate says stop.
///
/// The poller must be started from within a Tokio runtime. Dropping it has the
/// same effect as [`Poller::stop`].
pub struct Poller<T> {
    shared: Arc<PollShared<T>>,
}

impl<T> Poller<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<P>(fetch: Arc<dyn PollFetch<T>>, interval: Duration, should_continue: P) -> Self
    where
        P: Fn(Option<&T>) -> bool + Send + Sync + 'static,
    {
        let (state_tx, _) = watch::channel(PollState::default());
        Self {
            shared: Arc::new(PollShared {
                fetch,
                interval,
                should_continue: Arc::new(should_continue),
                state_tx,
                control: Mutex::new(PollControl::default()),
            }),
        }
    }

    /// Begins polling. After the first call, only [`Poller::restart`] (or
    /// [`Poller::stop`] then `start`) issues new fetches.
    pub fn start(&self) {
        let mut control = self.shared.control();
        if control.cancel.is_some() {
            return;
        }
        self.spawn_loop(&mut control);
    }

    /// Cancels any pending cycle, marks the state as loading and fetches
    /// again immediately.
    pub fn restart(&self) {
        let mut control = self.shared.control();
        if let Some(cancel) = control.cancel.take() {
            cancel.cancel();
        }
        self.shared.state_tx.send_modify(|state| state.loading = true);
        self.spawn_loop(&mut control);
    }

    /// Stops polling; results still in flight are discarded.
    pub fn stop(&self) {
        self.shared.halt();
    }

    /// Current snapshot.
    pub fn state(&self) -> PollState<T> {
        self.shared.state_tx.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PollState<T>> {
        self.shared.state_tx.subscribe()
    }

    fn spawn_loop(&self, control: &mut PollControl) {
        control.generation += 1;
        let cancel = CancellationToken::new();
        control.cancel = Some(cancel.clone());
        let generation = control.generation;
        debug!(generation, interval_ms = self.shared.interval.as_millis() as u64, "poll loop started");
        tokio::spawn(run_cycles(Arc::clone(&self.shared), generation, cancel));
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.shared.halt();
    }
}

async fn run_cycles<T>(shared: Arc<PollShared<T>>, generation: u64, cancel: CancellationToken) {
    loop {
        let outcome = shared.fetch.fetch().await;
        match shared.apply(generation, outcome) {
            None => return,
            Some(false) => {
                debug!(generation, "poll loop reached a terminal value");
                return;
            }
            Some(true) => {}
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(shared.interval) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;

    const INTERVAL: Duration = Duration::from_millis(100);

    /// Fetch returning scripted outcomes after a fixed latency, tracking overlap.
    struct ScriptedFetch {
        latency: Duration,
        script: Mutex<VecDeque<Result<Option<u32>>>>,
        fallback: u32,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedFetch {
        fn new(latency: Duration, script: Vec<Result<Option<u32>>>, fallback: u32) -> Arc<Self> {
            Arc::new(Self {
                latency,
                script: Mutex::new(script.into()),
                fallback,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PollFetch<u32> for ScriptedFetch {
        async fn fetch(&self) -> Result<Option<u32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or(Ok(Some(self.fallback)))
        }
    }

    #[test]
    fn initial_state_is_loading() {
        let fetch = ScriptedFetch::new(Duration::ZERO, vec![], 1);
        let poller = Poller::<u32>::new(fetch, INTERVAL, |_| true);
        assert_eq!(poller.state(), PollState::default());
        assert!(poller.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_once_per_interval_while_continuing() {
        let fetch = ScriptedFetch::new(Duration::ZERO, vec![], 7);
        let poller = Poller::<u32>::new(fetch.clone(), INTERVAL, |_| true);
        poller.start();
        poller.start();

        tokio::time::sleep(INTERVAL * 10).await;

        assert!(fetch.calls() >= 10, "only {} fetches", fetch.calls());
        let state = poller.state();
        assert!(!state.loading);
        assert_eq!(state.value, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_never_overlap() {
        let fetch = ScriptedFetch::new(INTERVAL * 3, vec![], 7);
        let poller = Poller::<u32>::new(fetch.clone(), INTERVAL, |_| true);
        poller.start();

        tokio::time::sleep(INTERVAL * 20).await;

        assert!(fetch.calls() >= 4, "only {} fetches", fetch.calls());
        assert_eq!(fetch.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_value_stops_until_restart() {
        let fetch = ScriptedFetch::new(Duration::ZERO, vec![], 3);
        let poller = Poller::<u32>::new(fetch.clone(), INTERVAL, |value| value.is_none());
        poller.start();

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(fetch.calls(), 1);
        assert_eq!(poller.state().value, Some(3));

        poller.restart();
        assert!(poller.state().loading);
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(fetch.calls(), 2);
        assert!(!poller.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_value_and_keeps_polling() {
        let fetch = ScriptedFetch::new(
            Duration::ZERO,
            vec![Ok(Some(1)), Err(anyhow!("backend unavailable")), Ok(Some(2))],
            2,
        );
        let poller = Poller::<u32>::new(fetch.clone(), INTERVAL, |value| value != Some(&2));
        let mut updates = poller.subscribe();
        poller.start();

        updates.wait_for(|state| state.error.is_some()).await.unwrap();
        let failed = poller.state();
        assert!(!failed.loading);
        assert_eq!(failed.value, Some(1));
        assert_eq!(failed.error.unwrap().message, "backend unavailable");

        updates.wait_for(|state| state.value == Some(2)).await.unwrap();
        assert!(poller.state().error.is_none());

        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(fetch.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_discards_result_in_flight() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetch = fetch_fn(move || {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(Some("stale"))
                } else {
                    Ok(Some("fresh"))
                }
            }
        });
        let poller = Poller::<&str>::new(Arc::new(fetch), INTERVAL, |_| false);
        poller.start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.restart();
        tokio::time::sleep(Duration::from_millis(1_000)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let state = poller.state();
        assert_eq!(state.value, Some("fresh"));
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_poller_cancels_pending_timer() {
        let fetch = ScriptedFetch::new(Duration::ZERO, vec![], 4);
        let poller = Poller::<u32>::new(fetch.clone(), INTERVAL, |_| true);
        poller.start();

        tokio::time::sleep(INTERVAL / 2).await;
        assert_eq!(fetch.calls(), 1);
        drop(poller);
        tokio::time::sleep(INTERVAL * 10).await;

        assert_eq!(fetch.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_poller_discards_result_in_flight() {
        let fetch = ScriptedFetch::new(Duration::from_millis(50), vec![Ok(Some(1))], 2);
        let poller = Poller::<u32>::new(fetch.clone(), INTERVAL, |_| true);
        let updates = poller.subscribe();
        poller.start();

        // First cycle ends at 50ms; the second fetch starts at 150ms and is still running.
        tokio::time::sleep(Duration::from_millis(160)).await;
        assert_eq!(fetch.calls(), 2);
        drop(poller);
        tokio::time::sleep(INTERVAL * 10).await;

        assert_eq!(fetch.calls(), 2);
        assert_eq!(updates.borrow().value, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_timer_and_discards_late_result() {
        let fetch = ScriptedFetch::new(Duration::from_millis(50), vec![], 5);
        let poller = Poller::<u32>::new(fetch.clone(), INTERVAL, |_| true);
        poller.start();

        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.stop();
        tokio::time::sleep(INTERVAL * 10).await;

        assert_eq!(fetch.calls(), 1);
        assert_eq!(poller.state(), PollState::default());
    }
}
