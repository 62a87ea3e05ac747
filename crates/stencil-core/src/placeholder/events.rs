//! Placeholder event channel.
//!
//! Tooltips and suggestion prompts are side effects for the UI layer; the
//! subsystem only emits them and never waits on a consumer.

use crate::scene::NodeId;
use crate::template::PlaceholderKind;
use std::sync::mpsc::{self, Receiver, Sender};

/// Something the UI may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderEvent {
    Registered {
        node: NodeId,
        template_object_id: String,
    },
    Unregistered {
        node: NodeId,
    },
    Activated {
        node: NodeId,
    },
    Deactivated {
        node: NodeId,
    },
    TooltipShown {
        node: NodeId,
        message: String,
    },
    TooltipHidden {
        node: NodeId,
    },
    EditingStarted {
        node: NodeId,
    },
    EditingEnded {
        node: NodeId,
    },
    /// A media slot was double-activated; the UI should offer replacements.
    SuggestionsRequested {
        node: NodeId,
        kind: PlaceholderKind,
        suggestions: Vec<String>,
    },
    ContentChanged {
        node: NodeId,
        has_content: bool,
    },
    /// The slot's node was swapped for a new one.
    Replaced {
        old: NodeId,
        new: NodeId,
        template_object_id: String,
    },
}

/// Fan-out over std channels. Dropped receivers are pruned on send.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<PlaceholderEvent>>,
}

impl EventBus {
    pub fn subscribe(&mut self) -> Receiver<PlaceholderEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: PlaceholderEvent) {
        log::trace!("placeholder event: {:?}", event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut bus = EventBus::default();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        drop(dropped);

        let node = Uuid::new_v4();
        bus.emit(PlaceholderEvent::Activated { node });
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(kept.try_recv().unwrap(), PlaceholderEvent::Activated { node });
    }
}
