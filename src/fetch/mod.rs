pub mod revalidation;
pub mod state;

use std::{
    fmt,
    future::Future,
    ops::ControlFlow,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use log::{debug, warn};
use tokio::{
    runtime::Handle,
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::PaddockError;

pub use revalidation::{RevalidationBus, RevalidationEvent, Subscription};
pub use state::{FailureKind, FetchFailure, FetchState};

pub type BoxedFetch<T> = Pin<Box<dyn Future<Output = Result<T, PaddockError>> + Send>>;
type Fetcher<T> = Arc<dyn Fn() -> BoxedFetch<T> + Send + Sync>;

fn boxed<T, F, Fut>(fetcher: F) -> Fetcher<T>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, PaddockError>> + Send + 'static,
{
    Arc::new(move || Box::pin(fetcher()) as BoxedFetch<T>)
}

/// What caused a fetch to be issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Trigger {
    Mount,
    Dependencies,
    Manual,
    Interval,
    Focus,
    Reconnect,
}

#[derive(Clone, Debug, Default)]
pub struct FetchOptions {
    /// Re-fetch on this cadence. `None` or zero disables the timer.
    pub refresh_interval: Option<Duration>,
    pub revalidate_on_focus: bool,
    pub revalidate_on_reconnect: bool,
    /// Where focus/reconnect notifications come from.
    pub bus: Option<RevalidationBus>,
}

struct Cycle<T> {
    fetcher: Fetcher<T>,
    /// Identifies the only fetch allowed to settle the state.
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    torn_down: bool,
}

struct Inner<T> {
    runtime: Handle,
    state: watch::Sender<FetchState<T>>,
    cycle: Mutex<Cycle<T>>,
}

impl<T> Inner<T> {
    fn lock_cycle(&self) -> MutexGuard<'_, Cycle<T>> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn teardown(&self) {
        let mut cycle = self.lock_cycle();
        cycle.torn_down = true;
        if let Some(task) = cycle.in_flight.take() {
            task.abort();
        }
    }
}

impl<T: Send + Sync + 'static> Inner<T> {
    /// Aborts whatever is in flight and starts a new fetch.
    fn revalidate(self: &Arc<Self>, trigger: Trigger) {
        let mut cycle = self.lock_cycle();
        if cycle.torn_down {
            return;
        }
        if let Some(task) = cycle.in_flight.take() {
            debug!("Fetch #{} superseded by {:?}", cycle.generation, trigger);
            task.abort();
        }
        cycle.generation += 1;
        let generation = cycle.generation;
        debug!("Starting fetch #{} ({:?})", generation, trigger);

        self.state.send_modify(|state| state.loading = true);

        let fetch = (cycle.fetcher)();
        let inner = Arc::downgrade(self);
        cycle.in_flight = Some(self.runtime.spawn(async move {
            let outcome = fetch.await;
            if let Some(inner) = inner.upgrade() {
                inner.settle(generation, outcome);
            }
        }));
    }

    /// Applies the outcome of fetch `generation`, unless a later fetch has
    /// been issued since or the controller is gone.
    fn settle(&self, generation: u64, outcome: Result<T, PaddockError>) {
        let mut cycle = self.lock_cycle();
        if cycle.torn_down || cycle.generation != generation {
            debug!(
                "Discarding outcome of fetch #{} (current is #{})",
                generation, cycle.generation
            );
            return;
        }
        cycle.in_flight = None;
        match outcome {
            Ok(data) => {
                self.state.send_replace(FetchState::success(data));
            }
            Err(error) if error.is_cancellation() => {
                debug!("Fetch #{} was cancelled", generation);
            }
            Err(error) => {
                warn!("Fetch #{} failed: {}", generation, error);
                self.state.send_replace(FetchState::failure(&error));
            }
        }
    }
}

/// Owns the request lifecycle of one query: fetches eagerly on creation,
/// re-fetches when the dependency value changes, on `refetch`, on a timer and
/// on focus/reconnect notifications. Only the most recently issued fetch may
/// change the state; everything it supersedes is aborted and its outcome
/// ignored. Dropping the controller stops everything.
pub struct FetchController<T, D> {
    inner: Arc<Inner<T>>,
    dependencies: D,
    refresh_interval: Option<Duration>,
    timer: Option<JoinHandle<()>>,
    revalidate_on_focus: bool,
    revalidate_on_reconnect: bool,
    bus: Option<RevalidationBus>,
    subscription: Option<Subscription>,
}

impl<T, D> FetchController<T, D>
where
    T: Send + Sync + 'static,
    D: PartialEq,
{
    /// Creates the controller on the current tokio runtime and issues the
    /// first fetch.
    pub fn new<F, Fut>(fetcher: F, dependencies: D, options: FetchOptions) -> Result<Self, PaddockError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, PaddockError>> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| PaddockError::NoRuntime)?;
        let (state, _) = watch::channel(FetchState::default());
        let inner = Arc::new(Inner {
            runtime,
            state,
            cycle: Mutex::new(Cycle {
                fetcher: boxed(fetcher),
                generation: 0,
                in_flight: None,
                torn_down: false,
            }),
        });
        inner.revalidate(Trigger::Mount);

        let mut controller = Self {
            inner,
            dependencies,
            refresh_interval: None,
            timer: None,
            revalidate_on_focus: options.revalidate_on_focus,
            revalidate_on_reconnect: options.revalidate_on_reconnect,
            bus: options.bus,
            subscription: None,
        };
        controller.set_refresh_interval(options.refresh_interval);
        controller.resubscribe();
        Ok(controller)
    }

    /// Swaps in the latest fetcher and re-fetches if `dependencies` differs
    /// from the current value. Returns whether a fetch was issued.
    pub fn update<F, Fut>(&mut self, fetcher: F, dependencies: D) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, PaddockError>> + Send + 'static,
    {
        self.inner.lock_cycle().fetcher = boxed(fetcher);
        if self.dependencies == dependencies {
            return false;
        }
        self.dependencies = dependencies;
        self.inner.revalidate(Trigger::Dependencies);
        true
    }

    pub fn refetch(&self) {
        self.inner.revalidate(Trigger::Manual);
    }

    pub fn dependencies(&self) -> &D {
        &self.dependencies
    }

    pub fn state(&self) -> FetchState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.inner.state.subscribe()
    }

    /// Waits until the current fetch has settled. A fetch that ends in
    /// cancellation leaves the state loading, so this keeps waiting for the
    /// next one.
    pub async fn settled(&self) -> FetchState<T> {
        let mut receiver = self.inner.state.subscribe();
        match receiver.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval
    }

    /// Replaces the refresh timer. At most one timer runs afterwards.
    pub fn set_refresh_interval(&mut self, interval: Option<Duration>) {
        let interval = interval.filter(|period| !period.is_zero());
        if interval == self.refresh_interval && (interval.is_none() || self.timer.is_some()) {
            return;
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.refresh_interval = interval;
        let Some(period) = interval else {
            return;
        };

        debug!("Refreshing every {:?}", period);
        let inner = Arc::downgrade(&self.inner);
        let start = Instant::now() + period;
        self.timer = Some(self.inner.runtime.spawn(async move {
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match inner.upgrade() {
                    Some(inner) => inner.revalidate(Trigger::Interval),
                    None => break,
                }
            }
        }));
    }

    pub fn set_revalidate_on_focus(&mut self, enabled: bool) {
        if self.revalidate_on_focus != enabled {
            self.revalidate_on_focus = enabled;
            self.resubscribe();
        }
    }

    pub fn set_revalidate_on_reconnect(&mut self, enabled: bool) {
        if self.revalidate_on_reconnect != enabled {
            self.revalidate_on_reconnect = enabled;
            self.resubscribe();
        }
    }

    fn resubscribe(&mut self) {
        self.subscription = None;
        let Some(bus) = self.bus.as_ref() else {
            return;
        };
        if !self.revalidate_on_focus && !self.revalidate_on_reconnect {
            return;
        }
        let (on_focus, on_reconnect) = (self.revalidate_on_focus, self.revalidate_on_reconnect);
        let inner: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        self.subscription = Some(bus.listen(&self.inner.runtime, move |event| {
            let trigger = match event {
                RevalidationEvent::Focus if on_focus => Trigger::Focus,
                RevalidationEvent::Reconnect if on_reconnect => Trigger::Reconnect,
                _ => return ControlFlow::Continue(()),
            };
            match inner.upgrade() {
                Some(inner) => {
                    inner.revalidate(trigger);
                    ControlFlow::Continue(())
                }
                None => ControlFlow::Break(()),
            }
        }));
    }
}

impl<T, D> Drop for FetchController<T, D> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.subscription = None;
        self.inner.teardown();
    }
}

impl<T, D: fmt::Debug> fmt::Debug for FetchController<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchController")
            .field("dependencies", &self.dependencies)
            .field("refresh_interval", &self.refresh_interval)
            .field("revalidate_on_focus", &self.revalidate_on_focus)
            .field("revalidate_on_reconnect", &self.revalidate_on_reconnect)
            .finish_non_exhaustive()
    }
}
