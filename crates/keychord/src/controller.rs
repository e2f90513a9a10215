//! Controller: lifecycle facade over the stack engine and the registry
//!
//! ```text
//!            enable()                 disable() / dispose()
//!  DISABLED ─────────► ENABLED ─────────────────────────► DISABLED
//!                        │
//!  press ─► KeyStack ─► snapshot ─► observers ─► registry matches ─► handlers
//!  release ─► KeyStack                                      │
//!  idle timer fire ─► clear if stale         clear_stack ◄──┘ (if requested)
//! ```
//!
//! All state lives behind a single `RefCell` and no borrow is held while
//! observers or handlers run, so they may call back into the controller.
//! Changes made from inside a handler apply to later notifications only.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::error::DispatchError;
use crate::idle::IdleTimer;
use crate::input::{InputSource, KeyListener, ListenerId};
use crate::key::{Combination, KeyEvent};
use crate::registry::{run_matches, Handler, ListenerOptions, Registry};
use crate::stack::{KeyStack, PressOutcome};
use crate::timer::Timer;

/// Controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Clear the stack when no press arrives for this long. Zero disables.
    pub idle_timeout: Duration,
    /// Log every stack transition at debug level.
    pub debug: bool,
}

impl Settings {
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(750);

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
            debug: false,
        }
    }
}

/// Observer of the combination channel.
pub type CombinationObserver = Rc<dyn Fn(&Combination)>;

/// Handle for an observer added with [`Controller::subscribe_combinations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Subscriptions {
    press: ListenerId,
    release: ListenerId,
}

struct State {
    stack: KeyStack,
    registry: Registry,
    idle: IdleTimer,
    observers: Vec<(ObserverId, CombinationObserver)>,
    next_observer: u64,
    /// Press and release subscriptions on the input source
    input: Option<Subscriptions>,
    /// Whether the registry listens to the combination channel
    dispatching: bool,
}

impl State {
    fn is_enabled(&self) -> bool {
        self.input.is_some()
    }
}

struct Inner {
    settings: Settings,
    source: Rc<dyn InputSource>,
    timer: Rc<dyn Timer>,
    state: RefCell<State>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let Some(subscriptions) = state.input.take() {
            self.source.unsubscribe(subscriptions.press);
            self.source.unsubscribe(subscriptions.release);
        }
        state.idle.cancel(self.timer.as_ref());
    }
}

/// Chord controller.
///
/// Cloning is cheap and yields another handle to the same controller, which
/// is how handlers reach back into it.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use keychord::{Controller, Handler, KeyEvent, ListenerOptions, LocalInput, ManualTimer, Settings};
///
/// let input = Rc::new(LocalInput::new());
/// let timer = Rc::new(ManualTimer::new());
/// let controller = Controller::new(Settings::default(), input.clone(), timer);
///
/// controller.add_event_listener(
///     ["g", "b"],
///     Handler::new(|combination| {
///         println!("matched {}", combination);
///         Ok(())
///     }),
///     ListenerOptions::clear_stack_after_match(),
/// );
/// controller.enable();
///
/// input.press(&KeyEvent::new("g"));
/// input.press(&KeyEvent::new("b"));
/// assert!(controller.stack().is_empty());
/// ```
#[derive(Clone)]
pub struct Controller {
    inner: Rc<Inner>,
}

impl Controller {
    /// Create a disabled controller.
    pub fn new(settings: Settings, source: Rc<dyn InputSource>, timer: Rc<dyn Timer>) -> Self {
        let inner = Inner {
            settings,
            source,
            timer,
            state: RefCell::new(State {
                stack: KeyStack::new(),
                registry: Registry::new(),
                idle: IdleTimer::new(settings.idle_timeout),
                observers: Vec::new(),
                next_observer: 0,
                input: None,
                dispatching: false,
            }),
        };

        Self {
            inner: Rc::new(inner),
        }
    }

    pub fn settings(&self) -> Settings {
        self.inner.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state.borrow().is_enabled()
    }

    /// Clear the stack and start listening to the input source.
    ///
    /// Enabling an already enabled controller only clears the stack.
    pub fn enable(&self) {
        self.clear_stack();

        if self.is_enabled() {
            return;
        }

        let press = self.inner.source.on_press(self.listener(|controller, event| {
            if let Err(e) = controller.press(event) {
                tracing::error!("{}", e);
                for failure in &e.failures {
                    tracing::error!("  {:#}", failure.source);
                }
            }
        }));
        let release = self
            .inner
            .source
            .on_release(self.listener(|controller, event| controller.release(event)));

        let mut state = self.inner.state.borrow_mut();
        state.input = Some(Subscriptions { press, release });
        state.dispatching = true;

        tracing::debug!("Key chord controller enabled");
    }

    /// Clear the stack and stop listening to the input source.
    pub fn disable(&self) {
        self.clear_stack();

        let subscriptions = {
            let mut state = self.inner.state.borrow_mut();
            state.dispatching = false;
            state.input.take()
        };

        if let Some(subscriptions) = subscriptions {
            self.inner.source.unsubscribe(subscriptions.press);
            self.inner.source.unsubscribe(subscriptions.release);
            tracing::debug!("Key chord controller disabled");
        }
    }

    /// Register `handler` for the exact key sequence `keys`.
    pub fn add_event_listener<I, S>(&self, keys: I, handler: Handler, options: ListenerOptions)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if self.inner.settings.debug {
            tracing::debug!("Registered listener for [{}]", keys.join(", "));
        }
        self.inner
            .state
            .borrow_mut()
            .registry
            .add(keys, handler, options);
    }

    /// Remove listeners registered for exactly `keys`; only those using
    /// `handler` when one is given. Returns how many were removed.
    pub fn remove_event_listener<S: AsRef<str>>(&self, keys: &[S], handler: Option<&Handler>) -> usize {
        self.inner
            .state
            .borrow_mut()
            .registry
            .remove(keys, handler)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.state.borrow().registry.len()
    }

    /// Observe every combination before handlers are matched.
    pub fn subscribe_combinations<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&Combination) + 'static,
    {
        let mut state = self.inner.state.borrow_mut();
        let id = ObserverId(state.next_observer);
        state.next_observer += 1;
        state.observers.push((id, Rc::new(observer)));
        id
    }

    pub fn unsubscribe_combinations(&self, id: ObserverId) {
        self.inner
            .state
            .borrow_mut()
            .observers
            .retain(|(existing, _)| *existing != id);
    }

    /// Snapshot of the keys currently held.
    pub fn stack(&self) -> Combination {
        self.inner.state.borrow().stack.snapshot()
    }

    /// Empty the stack and cancel the idle timer.
    pub fn clear_stack(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.stack.clear();
        state.idle.cancel(self.inner.timer.as_ref());
    }

    /// Clear the stack and drop every registration.
    pub fn reset(&self) {
        self.clear_stack();
        self.inner.state.borrow_mut().registry.clear();
    }

    /// Reset, then disable. The controller stays usable through `enable`.
    pub fn dispose(&self) {
        self.reset();
        self.disable();
    }

    /// Feed a press notification. Ignored while disabled.
    ///
    /// Every matching handler runs even if some of them fail; the failures
    /// are returned together.
    pub fn press(&self, event: &KeyEvent) -> Result<(), DispatchError> {
        let snapshot = {
            let mut state = self.inner.state.borrow_mut();
            if !state.is_enabled() {
                return Ok(());
            }

            match state.stack.press(event) {
                PressOutcome::Cleared => {
                    state.idle.cancel(self.inner.timer.as_ref());
                    if self.inner.settings.debug {
                        tracing::debug!("keydown {:?}: stack cleared", event.key);
                    }
                    return Ok(());
                }
                PressOutcome::Pushed(snapshot) => {
                    let weak = Rc::downgrade(&self.inner);
                    state.idle.restart(
                        self.inner.timer.as_ref(),
                        Box::new(move || {
                            if let Some(controller) = Controller::upgrade(&weak) {
                                controller.on_idle();
                            }
                        }),
                    );
                    snapshot
                }
            }
        };

        if self.inner.settings.debug {
            tracing::debug!("keydown [{}]", snapshot);
        }

        self.notify(&snapshot)
    }

    /// Feed a release notification. Ignored while disabled.
    pub fn release(&self, event: &KeyEvent) {
        let mut state = self.inner.state.borrow_mut();
        if !state.is_enabled() {
            return;
        }

        state.stack.release(event);
        if state.stack.is_empty() && state.idle.is_pending() {
            state.idle.cancel(self.inner.timer.as_ref());
        }

        if self.inner.settings.debug {
            tracing::debug!("keyup {:?}: {} key(s) held", event.key, state.stack.len());
        }
    }

    fn notify(&self, snapshot: &Combination) -> Result<(), DispatchError> {
        let (observers, matches) = {
            let state = self.inner.state.borrow();
            if !state.dispatching {
                return Ok(());
            }
            let observers: Vec<CombinationObserver> = state
                .observers
                .iter()
                .map(|(_, observer)| observer.clone())
                .collect();
            (observers, state.registry.matches(snapshot))
        };

        for observer in observers {
            observer(snapshot);
        }

        let outcome = run_matches(matches, snapshot);
        if outcome.clear_requested {
            self.clear_stack();
        }

        if outcome.failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError {
                combination: snapshot.to_string(),
                failures: outcome.failures,
            })
        }
    }

    fn on_idle(&self) {
        let mut state = self.inner.state.borrow_mut();
        state.idle.expire();

        if !state.stack.is_empty() && state.idle.is_stale(self.inner.timer.now()) {
            state.stack.clear();
            if self.inner.settings.debug {
                tracing::debug!("Idle timeout: stack cleared");
            }
        }
    }

    fn listener<F>(&self, f: F) -> KeyListener
    where
        F: Fn(&Controller, &KeyEvent) + 'static,
    {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move |event: &KeyEvent| {
            if let Some(controller) = Controller::upgrade(&weak) {
                f(&controller, event);
            }
        })
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Controller> {
        weak.upgrade().map(|inner| Controller { inner })
    }
}
