// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed in-process event bus for the Sidekick adapter runtime.
//!
//! Delivery is synchronous: [`EventBus::emit`] runs every current subscriber of
//! the event type on the caller's stack, in subscription order. A panicking
//! listener is caught and logged; the remaining listeners still run and the
//! emitter never observes the failure.
//!
//! Subscriptions are drop guards. Dropping the [`Subscription`] returned by
//! [`EventBus::on`] or [`EventBus::once`] removes the listener.

pub mod events;

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tracing::{error, trace};

pub use events::{
    AdapterActivated, AdapterConfigUpdated, AdapterDeactivated, AutomationPhase,
    AutomationPhaseCompleted, Event, FileAttachment, PluginActivated, PluginActivationFailed,
    PluginDeactivated, PluginRegistered, PluginUnregistered, RemoteConfigUpdated, ToolExecution,
    ToolExecutionCompleted, ToolExecutionFailed, ToolExecutionStarted, EVENT_NAMES,
};

type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

struct Listener {
    id: u64,
    once: bool,
    fired: AtomicBool,
    callback: Callback,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    by_event: HashMap<TypeId, Vec<Arc<Listener>>>,
}

impl ListenerTable {
    fn remove(&mut self, type_id: TypeId, id: u64) -> bool {
        let Some(listeners) = self.by_event.get_mut(&type_id) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        let removed = listeners.len() != before;
        if listeners.is_empty() {
            self.by_event.remove(&type_id);
        }
        removed
    }
}

fn lock(table: &Mutex<ListenerTable>) -> MutexGuard<'_, ListenerTable> {
    // Listeners never run while the table is locked, so poisoning can only
    // come from a bug in this module. Keep serving rather than cascading.
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the event bus. Cloning is cheap and every clone shares the same
/// listener table.
#[derive(Clone, Default)]
pub struct EventBus {
    table: Arc<Mutex<ListenerTable>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = lock(&self.table);
        let count: usize = table.by_event.values().map(Vec::len).sum();
        f.debug_struct("EventBus").field("listeners", &count).finish()
    }
}

impl EventBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every future emission of `E`.
    pub fn on<E, F>(&self, listener: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe(listener, false)
    }

    /// Subscribe to the next emission of `E` only.
    pub fn once<E, F>(&self, listener: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe(listener, true)
    }

    fn subscribe<E, F>(&self, listener: F, once: bool) -> Subscription
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let callback: Callback = Arc::new(move |payload: &dyn Any| {
            if let Some(event) = payload.downcast_ref::<E>() {
                listener(event);
            }
        });

        let type_id = TypeId::of::<E>();
        let mut table = lock(&self.table);
        let id = table.next_id;
        table.next_id += 1;
        table.by_event.entry(type_id).or_default().push(Arc::new(Listener {
            id,
            once,
            fired: AtomicBool::new(false),
            callback,
        }));
        trace!(event = E::NAME, listener = id, once, "listener subscribed");

        Subscription {
            table: Arc::downgrade(&self.table),
            type_id,
            id,
            event: E::NAME,
        }
    }

    /// Deliver `event` to the current subscribers of its type.
    ///
    /// Returns the number of listeners that ran to completion.
    pub fn emit<E: Event>(&self, event: E) -> usize {
        let type_id = TypeId::of::<E>();
        let snapshot: Vec<Arc<Listener>> = lock(&self.table)
            .by_event
            .get(&type_id)
            .cloned()
            .unwrap_or_default();

        trace!(event = E::NAME, listeners = snapshot.len(), "emitting event");

        let mut delivered = 0;
        let mut spent = Vec::new();
        for listener in snapshot {
            if listener.once {
                if listener.fired.swap(true, Ordering::SeqCst) {
                    continue;
                }
                spent.push(listener.id);
            }

            let payload: &dyn Any = &event;
            match panic::catch_unwind(AssertUnwindSafe(|| (listener.callback)(payload))) {
                Ok(()) => delivered += 1,
                Err(cause) => {
                    error!(
                        event = E::NAME,
                        listener = listener.id,
                        panic = panic_message(cause.as_ref()),
                        "event listener panicked"
                    );
                }
            }
        }

        if !spent.is_empty() {
            let mut table = lock(&self.table);
            for id in spent {
                table.remove(type_id, id);
            }
        }

        delivered
    }

    /// Forward every emission of `E` into an unbounded channel.
    ///
    /// Lets async consumers await events without blocking the emitter. The
    /// forwarding stops when the returned subscription is dropped.
    pub fn channel<E: Event>(&self) -> (Subscription, mpsc::UnboundedReceiver<E>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.on::<E, _>(move |event| {
            if tx.send(event.clone()).is_err() {
                trace!(event = E::NAME, "channel receiver dropped");
            }
        });
        (subscription, rx)
    }

    /// Number of listeners currently subscribed to `E`.
    pub fn listener_count<E: Event>(&self) -> usize {
        lock(&self.table)
            .by_event
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Remove every listener. Outstanding subscriptions become inert.
    pub fn clear(&self) {
        lock(&self.table).by_event.clear();
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    if let Some(s) = cause.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Disposer for a bus listener. Unsubscribes on drop.
#[must_use = "dropping a Subscription immediately unsubscribes its listener"]
pub struct Subscription {
    table: Weak<Mutex<ListenerTable>>,
    type_id: TypeId,
    id: u64,
    event: &'static str,
}

impl Subscription {
    /// Wire name of the subscribed event.
    pub fn event_name(&self) -> &'static str {
        self.event
    }

    /// True while the listener is still registered on a live bus.
    pub fn is_active(&self) -> bool {
        self.table.upgrade().is_some_and(|table| {
            lock(&table)
                .by_event
                .get(&self.type_id)
                .is_some_and(|listeners| listeners.iter().any(|l| l.id == self.id))
        })
    }

    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade()
            && lock(&table).remove(self.type_id, self.id)
        {
            trace!(event = self.event, listener = self.id, "listener unsubscribed");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}
