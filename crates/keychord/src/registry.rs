//! Handler registry
//!
//! Registrations are kept in insertion order. The same key sequence may be
//! registered any number of times; every registration whose sequence equals
//! the dispatched combination fires.

use std::fmt;
use std::rc::Rc;

use crate::error::HandlerFailure;
use crate::key::Combination;

type HandlerFn = dyn Fn(&Combination) -> anyhow::Result<()>;

/// Callback invoked with the matching combination.
///
/// Handlers are compared by identity: clones of one `Handler` are the same
/// handler, two `Handler::new` calls with identical closures are not.
#[derive(Clone)]
pub struct Handler(Rc<HandlerFn>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Combination) -> anyhow::Result<()> + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, combination: &Combination) -> anyhow::Result<()> {
        (self.0)(combination)
    }

    /// Check whether both values refer to the same handler.
    pub fn same(&self, other: &Handler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

/// Per-registration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Clear the key stack once the handler has run.
    pub clear_stack_after_match: bool,
}

impl ListenerOptions {
    pub fn clear_stack_after_match() -> Self {
        Self {
            clear_stack_after_match: true,
        }
    }
}

#[derive(Debug)]
struct Registration {
    keys: Vec<String>,
    handler: Handler,
    options: ListenerOptions,
}

impl Registration {
    fn keys_equal<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        self.keys.len() == keys.len()
            && self.keys.iter().zip(keys).all(|(a, b)| a == b.as_ref())
    }
}

/// A registration selected for one dispatch.
#[derive(Debug, Clone)]
pub struct Match {
    pub keys: Vec<String>,
    pub handler: Handler,
    pub clear_stack: bool,
}

/// Outcome of running the matched handlers of one combination.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Number of handlers invoked
    pub invoked: usize,
    /// Whether any invoked registration asked for the stack to be cleared
    pub clear_requested: bool,
    pub failures: Vec<HandlerFailure>,
}

/// Ordered list of registrations.
#[derive(Debug, Default)]
pub struct Registry {
    registrations: Vec<Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a registration.
    pub fn add(&mut self, keys: Vec<String>, handler: Handler, options: ListenerOptions) {
        self.registrations.push(Registration {
            keys,
            handler,
            options,
        });
    }

    /// Remove registrations keyed by exactly `keys`, narrowed to `handler`
    /// when one is given. Returns how many were removed.
    pub fn remove<S: AsRef<str>>(&mut self, keys: &[S], handler: Option<&Handler>) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|registration| {
            let selected = registration.keys_equal(keys)
                && handler.map_or(true, |h| registration.handler.same(h));
            !selected
        });
        before - self.registrations.len()
    }

    /// Registrations matching `combination`, in registration order.
    pub fn matches(&self, combination: &Combination) -> Vec<Match> {
        self.registrations
            .iter()
            .filter(|registration| combination.matches(&registration.keys))
            .map(|registration| Match {
                keys: registration.keys.clone(),
                handler: registration.handler.clone(),
                clear_stack: registration.options.clear_stack_after_match,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }
}

/// Run every match in order.
///
/// A failing handler does not stop the ones after it; its error is recorded
/// in the outcome.
pub fn run_matches(matches: Vec<Match>, combination: &Combination) -> DispatchOutcome {
    let mut outcome = DispatchOutcome::default();

    for matched in matches {
        outcome.invoked += 1;
        if let Err(source) = matched.handler.call(combination) {
            outcome.failures.push(HandlerFailure {
                keys: matched.keys,
                source,
            });
        }
        if matched.clear_stack {
            outcome.clear_requested = true;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyEvent, Modifiers};
    use crate::stack::{KeyStack, PressOutcome};
    use std::cell::RefCell;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn combination(names: &[&str]) -> Combination {
        let mut stack = KeyStack::new();
        let mut last = Combination::default();
        for name in names {
            if let PressOutcome::Pushed(snapshot) =
                stack.press(&KeyEvent::with_modifiers(*name, Modifiers::NONE))
            {
                last = snapshot;
            }
        }
        last
    }

    fn recording_handler(log: &Rc<RefCell<Vec<String>>>, label: &str) -> Handler {
        let log = log.clone();
        let label = label.to_string();
        Handler::new(move |_| {
            log.borrow_mut().push(label.clone());
            Ok(())
        })
    }

    #[test]
    fn test_exact_match_only() {
        let mut registry = Registry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.add(keys(&["g", "b"]), recording_handler(&log, "gb"), ListenerOptions::default());

        assert!(registry.matches(&combination(&["b", "g"])).is_empty(), "Order matters");
        assert!(registry.matches(&combination(&["g", "b", "c"])).is_empty(), "Length matters");
        assert!(registry.matches(&combination(&["g"])).is_empty());
        assert_eq!(registry.matches(&combination(&["g", "b"])).len(), 1);
    }

    #[test]
    fn test_duplicate_registrations_all_fire_in_order() {
        let mut registry = Registry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.add(keys(&["a"]), recording_handler(&log, "first"), ListenerOptions::default());
        registry.add(keys(&["a"]), recording_handler(&log, "second"), ListenerOptions::default());

        let snapshot = combination(&["a"]);
        let outcome = run_matches(registry.matches(&snapshot), &snapshot);

        assert_eq!(outcome.invoked, 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert!(!outcome.clear_requested);
    }

    #[test]
    fn test_remove_by_keys_removes_every_handler() {
        let mut registry = Registry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.add(keys(&["a", "b"]), recording_handler(&log, "x"), ListenerOptions::default());
        registry.add(keys(&["a", "b"]), recording_handler(&log, "y"), ListenerOptions::default());
        registry.add(keys(&["a"]), recording_handler(&log, "z"), ListenerOptions::default());

        let removed = registry.remove(&["a", "b"], None);

        assert_eq!(removed, 2);
        assert_eq!(registry.len(), 1, "Registration for [a] must survive");
    }

    #[test]
    fn test_remove_by_keys_and_handler() {
        let mut registry = Registry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let keep = recording_handler(&log, "keep");
        let dropped = recording_handler(&log, "drop");
        registry.add(keys(&["a", "b"]), keep.clone(), ListenerOptions::default());
        registry.add(keys(&["a", "b"]), dropped.clone(), ListenerOptions::default());
        registry.add(keys(&["a", "b"]), dropped.clone(), ListenerOptions::default());

        let removed = registry.remove(&["a", "b"], Some(&dropped));

        assert_eq!(removed, 2);
        let snapshot = combination(&["a", "b"]);
        run_matches(registry.matches(&snapshot), &snapshot);
        assert_eq!(*log.borrow(), vec!["keep"]);
    }

    #[test]
    fn test_remove_unknown_sequence_is_noop() {
        let mut registry = Registry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.add(keys(&["a"]), recording_handler(&log, "a"), ListenerOptions::default());

        assert_eq!(registry.remove(&["q"], None), 0);
        assert_eq!(registry.remove(&["a", "a"], None), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_handlers_are_compared_by_identity() {
        let a = Handler::new(|_| Ok(()));
        let b = Handler::new(|_| Ok(()));
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }

    #[test]
    fn test_failure_does_not_stop_later_handlers() {
        let mut registry = Registry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.add(
            keys(&["a"]),
            Handler::new(|_| Err(anyhow::anyhow!("boom"))),
            ListenerOptions::default(),
        );
        registry.add(keys(&["a"]), recording_handler(&log, "after"), ListenerOptions::default());

        let snapshot = combination(&["a"]);
        let outcome = run_matches(registry.matches(&snapshot), &snapshot);

        assert_eq!(outcome.invoked, 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].keys, vec!["a"]);
        assert_eq!(*log.borrow(), vec!["after"]);
    }

    #[test]
    fn test_clear_requested_by_any_match() {
        let mut registry = Registry::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        registry.add(keys(&["a"]), recording_handler(&log, "plain"), ListenerOptions::default());
        registry.add(
            keys(&["a"]),
            recording_handler(&log, "clearing"),
            ListenerOptions::clear_stack_after_match(),
        );

        let snapshot = combination(&["a"]);
        let outcome = run_matches(registry.matches(&snapshot), &snapshot);

        assert!(outcome.clear_requested);
        assert_eq!(*log.borrow(), vec!["plain", "clearing"]);
    }
}
