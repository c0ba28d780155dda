//! Crossbeam channel carrying engine events to whoever drives the UI.
//!
//! Senders live on the ingestion threads, the persistence lanes and the
//! review session; the receiving side is polled between key presses.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{Event, Notice, ReviewEvent};

/// Sending half, one clone per producing thread
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Fire and forget. Events sent after the receiver is gone are dropped.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }

    /// Emit a user-visible notice
    pub fn notice(&self, notice: Notice) {
        self.send(Event::Review(ReviewEvent::Notice(notice)));
    }
}

/// Receiving half; never blocks
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Everything queued so far
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }

    /// Drain queued events and keep only the notices
    pub fn notices(&self) -> Vec<Notice> {
        self.drain()
            .into_iter()
            .filter_map(|event| match event {
                Event::Review(ReviewEvent::Notice(notice)) => Some(notice),
                _ => None,
            })
            .collect()
    }
}

/// Constructor for a connected sender/receiver pair
pub struct EventChannel;

impl EventChannel {
    /// Unbounded, so producers never wait on the UI
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// Sender whose receiver is already dropped
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ReconcileEvent;
    use std::thread;

    #[test]
    fn ingestion_thread_events_reach_the_receiver() {
        let (sender, receiver) = EventChannel::new();

        thread::spawn(move || {
            sender.send(Event::Reconcile(ReconcileEvent::Started { max_items: 30 }));
        })
        .join()
        .unwrap();

        assert!(matches!(
            receiver.drain().as_slice(),
            [Event::Reconcile(ReconcileEvent::Started { max_items: 30 })]
        ));
    }

    #[test]
    fn notices_without_listener_are_dropped() {
        null_sender().notice(Notice::NothingToUndo);
    }

    #[test]
    fn notices_filters_other_events() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Reconcile(ReconcileEvent::Started { max_items: 2 }));
        sender.notice(Notice::NothingToDelete);

        assert_eq!(receiver.notices(), vec![Notice::NothingToDelete]);
        assert!(receiver.try_recv().is_none());
    }
}
