// Ambient revalidation notifications (window focus, network back online)

use std::ops::ControlFlow;

use log::debug;
use tokio::{
    runtime::Handle,
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

const BUS_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevalidationEvent {
    Focus,
    Reconnect,
}

/// Broadcast channel the host raises focus/reconnect notifications on.
/// Cloning shares the same channel.
#[derive(Clone, Debug)]
pub struct RevalidationBus {
    sender: broadcast::Sender<RevalidationEvent>,
}

impl Default for RevalidationBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(BUS_CAPACITY);
        Self { sender }
    }
}

impl RevalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self, event: RevalidationEvent) {
        // no listeners is fine
        let _ = self.sender.send(event);
    }

    pub fn notify_focus(&self) {
        self.notify(RevalidationEvent::Focus);
    }

    pub fn notify_reconnect(&self) {
        self.notify(RevalidationEvent::Reconnect);
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Runs `on_event` for every notification raised after this call, until it
    /// returns `ControlFlow::Break` or the returned handle is dropped.
    pub fn listen<F>(&self, runtime: &Handle, mut on_event: F) -> Subscription
    where
        F: FnMut(RevalidationEvent) -> ControlFlow<()> + Send + 'static,
    {
        let mut receiver = self.sender.subscribe();
        let task = runtime.spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if on_event(event).is_break() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        debug!("Revalidation listener skipped {} notifications", missed);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Subscription { task }
    }
}

/// Scoped listener registration; dropping it unregisters the listener.
#[derive(Debug)]
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
