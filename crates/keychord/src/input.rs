//! Input source seam
//!
//! The controller never reads a device itself. It subscribes to an
//! [`InputSource`] that delivers press and release notifications.
//! [`LocalInput`] is an in-memory fan-out source the host pushes events into.

use std::cell::RefCell;
use std::rc::Rc;

use crate::key::KeyEvent;

/// Listener invoked for every press or release notification.
pub type KeyListener = Rc<dyn Fn(&KeyEvent)>;

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Source of raw key notifications.
pub trait InputSource {
    /// Subscribe to press notifications.
    fn on_press(&self, listener: KeyListener) -> ListenerId;

    /// Subscribe to release notifications.
    fn on_release(&self, listener: KeyListener) -> ListenerId;

    /// Drop a subscription made through either channel.
    fn unsubscribe(&self, id: ListenerId);
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    press: Vec<(ListenerId, KeyListener)>,
    release: Vec<(ListenerId, KeyListener)>,
}

impl Listeners {
    fn next_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// In-memory input source.
///
/// Listeners run synchronously, in subscription order. The listener list is
/// copied before delivery, so a listener may subscribe or unsubscribe while
/// an event is being delivered; the change applies to the next event.
#[derive(Default)]
pub struct LocalInput {
    listeners: RefCell<Listeners>,
}

impl LocalInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a press notification to every press listener.
    pub fn press(&self, event: &KeyEvent) {
        let listeners: Vec<KeyListener> = self
            .listeners
            .borrow()
            .press
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    /// Deliver a release notification to every release listener.
    pub fn release(&self, event: &KeyEvent) {
        let listeners: Vec<KeyListener> = self
            .listeners
            .borrow()
            .release
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(event);
        }
    }

    /// Number of active subscriptions across both channels.
    pub fn listener_count(&self) -> usize {
        let listeners = self.listeners.borrow();
        listeners.press.len() + listeners.release.len()
    }
}

impl InputSource for LocalInput {
    fn on_press(&self, listener: KeyListener) -> ListenerId {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id();
        listeners.press.push((id, listener));
        id
    }

    fn on_release(&self, listener: KeyListener) -> ListenerId {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id();
        listeners.release.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        let mut listeners = self.listeners.borrow_mut();
        listeners.press.retain(|(existing, _)| *existing != id);
        listeners.release.retain(|(existing, _)| *existing != id);
    }
}
