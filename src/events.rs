//! Typed model events and an explicit subscription list.
//!
//! Subscribing and unsubscribing are queued and take effect at the start of
//! the next `publish`, so the active list is never mutated mid-delivery.

use std::fmt;

use crate::types::{Aabb, BodyId};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ModelEvent {
    Spawned { id: BodyId },
    Moved { id: BodyId, bounds: Aabb },
    Collided { id: BodyId, other: BodyId },
    Despawned { id: BodyId },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

type Callback<E> = Box<dyn FnMut(&E)>;

pub struct Subscriptions<E> {
    next_id: u64,
    active: Vec<(SubscriptionId, Callback<E>)>,
    pending_add: Vec<(SubscriptionId, Callback<E>)>,
    pending_remove: Vec<SubscriptionId>,
}

impl<E> Default for Subscriptions<E> {
    fn default() -> Self {
        Self { next_id: 0, active: Vec::new(), pending_add: Vec::new(), pending_remove: Vec::new() }
    }
}

impl<E> fmt::Debug for Subscriptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriptions")
            .field("active", &self.active.len())
            .field("pending_add", &self.pending_add.len())
            .field("pending_remove", &self.pending_remove.len())
            .finish()
    }
}

impl<E> Subscriptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, f: Callback<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.pending_add.push((id, f));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.pending_remove.push(id);
    }

    /// Number of subscribers that will receive the next event.
    pub fn len(&self) -> usize {
        self.active
            .iter()
            .chain(&self.pending_add)
            .filter(|(id, _)| !self.pending_remove.contains(id))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply_pending(&mut self) {
        self.active.append(&mut self.pending_add);
        if !self.pending_remove.is_empty() {
            let removed = std::mem::take(&mut self.pending_remove);
            self.active.retain(|(id, _)| !removed.contains(id));
        }
    }

    pub fn publish(&mut self, event: &E) {
        self.apply_pending();
        for (_, f) in &mut self.active {
            f(event);
        }
    }
}
