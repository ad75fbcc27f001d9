//! A small publish/subscribe bridge which carries filter results to whatever
//! renders them, so filtering never calls into rendering directly.

use crate::post::PostRecord;

/// Published whenever the filtered post list changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostsFiltered {
    /// The posts which passed the current filters, in store order.
    pub posts: Vec<PostRecord>,
}

/// Identifies a subscription so it can be removed again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&PostsFiltered)>;

/// Delivers [`PostsFiltered`] events to subscribers in registration order.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Handler)>,
}

impl EventBus {
    /// A bus with no subscribers.
    pub fn new() -> EventBus {
        EventBus::default()
    }

    /// Registers `handler` to receive every subsequent event.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&PostsFiltered) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Calls every subscriber with `event`.
    pub fn publish(&mut self, event: &PostsFiltered) {
        for (_, handler) in self.subscribers.iter_mut() {
            handler(event);
        }
    }

    /// The number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
