//! In-process change bus connecting the project store to the surfaces.
//!
//! Delivery is synchronous: `publish` runs every matching subscriber, in
//! subscription order, before it returns.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::project::{DocumentSnapshot, SharedProject};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    DocumentChanged,
    ProjectChanged,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::DocumentChanged => "document-changed",
            Topic::ProjectChanged => "project-changed",
        }
    }
}

#[derive(Clone, Debug)]
pub enum ChangeEvent {
    /// One of the source buffers was edited. Carries the new text.
    DocumentChanged(DocumentSnapshot),
    /// The current project pointer was replaced.
    ProjectChanged(SharedProject),
}

impl ChangeEvent {
    pub fn topic(&self) -> Topic {
        match self {
            ChangeEvent::DocumentChanged(_) => Topic::DocumentChanged,
            ChangeEvent::ProjectChanged(_) => Topic::ProjectChanged,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&ChangeEvent)>;

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    topic: Topic,
    active: Rc<Cell<bool>>,
    handler: Handler,
}

#[derive(Default)]
pub struct ChangeBus {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            id,
            topic,
            active: Rc::new(Cell::new(true)),
            handler: Rc::new(handler),
        });
        id
    }

    /// Returns false when the id was never registered or already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        match subscribers.iter().position(|s| s.id == id) {
            Some(pos) => {
                subscribers.remove(pos).active.set(false);
                true
            }
            None => false,
        }
    }

    /// Delivers `event` to every subscriber of its topic and returns how
    /// many were invoked.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let topic = event.topic();
        // Handlers may subscribe, unsubscribe or publish while we iterate,
        // so fan out over a copy of the list taken up front.
        let targets: Vec<Subscriber> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|s| s.topic == topic)
            .cloned()
            .collect();

        let mut delivered = 0;
        for subscriber in targets {
            if !subscriber.active.get() {
                continue;
            }
            (subscriber.handler)(event);
            delivered += 1;
        }
        tracing::debug!(topic = topic.as_str(), delivered, "published change event");
        delivered
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|s| s.topic == topic)
            .count()
    }
}
