//! Key stack state machine
//!
//! The stack holds the keys currently considered held, in press order, with
//! at most one entry per key name.
//!
//! ```text
//!  press(k)                                release(k)
//!  ────────                                ──────────
//!  drop existing k                         k == Unidentified ─► clear
//!      │                                   drop k
//!      ├─ reserved key or Alt/Ctrl/Meta    k is a modifier ─► drop keys pressed
//!      │  flag set ─► clear                                   without it
//!      │                                   k is AltGraph/Compose ─► truncate at
//!      └─ push k ─► snapshot                                        earliest marker
//! ```
//!
//! ## Reserved keys
//!
//! `Alt`, `Meta`, `Control` and a handful of function keys are often consumed
//! by the operating system or the host's chrome and never deliver a release.
//! Pressing one, or pressing anything while Alt, Ctrl or Meta is held, drops
//! the whole stack instead of recording a combination.
//!
//! ## Release heuristics
//!
//! Releases can go missing in several ways. The engine compensates with:
//! - `Unidentified` releases, which cannot be attributed to a key, clear
//!   everything
//! - releasing `Alt`, `Control`, `Meta` or `Shift` drops every entry whose
//!   recorded flag for that modifier is unset
//! - releasing `AltGraph` or `Compose` truncates the stack at the earliest
//!   of the two still present (or from the start when neither is)

use crate::key::{Combination, KeyEvent, KeyState, Modifier};
use crate::normalize::normalize;

/// Keys whose press clears the stack.
pub const RESERVED_KEYS: [&str; 10] = [
    "Alt", "Meta", "Control", "F1", "F3", "F5", "F6", "F7", "F10", "F11",
];

/// Key name reported when a release cannot be attributed to a specific key.
pub const UNIDENTIFIED: &str = "Unidentified";

const ALT_GRAPH: &str = "AltGraph";
const COMPOSE: &str = "Compose";

/// Check whether a (normalized) key name is reserved.
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Result of feeding a press into the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    /// The key was pushed; carries a snapshot of the whole stack.
    Pushed(Combination),
    /// A reserved key or system modifier was seen; the stack is now empty.
    Cleared,
}

/// Ordered, de-duplicated set of held keys.
#[derive(Debug, Clone, Default)]
pub struct KeyStack {
    keys: Vec<KeyState>,
}

impl KeyStack {
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Apply a press transition.
    pub fn press(&mut self, event: &KeyEvent) -> PressOutcome {
        let key = normalize(&event.key);

        // Auto-repeat and duplicated notifications must not produce a second entry
        self.remove(key);

        let mods = event.modifiers;
        if is_reserved(key) || mods.alt || mods.meta || mods.ctrl {
            self.clear();
            return PressOutcome::Cleared;
        }

        self.keys.push(KeyState {
            key: key.to_string(),
            modifiers: mods,
        });

        PressOutcome::Pushed(self.snapshot())
    }

    /// Apply a release transition.
    pub fn release(&mut self, event: &KeyEvent) {
        if event.key == UNIDENTIFIED {
            self.clear();
            return;
        }

        let key = normalize(&event.key);
        self.remove(key);

        if let Some(modifier) = Modifier::from_key_name(key) {
            self.drop_pressed_without(modifier);
        }

        if key == ALT_GRAPH || key == COMPOSE {
            let start = [self.position(ALT_GRAPH), self.position(COMPOSE)]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(0);
            self.keys.truncate(start);
        }
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Copy the current stack into an immutable snapshot.
    pub fn snapshot(&self) -> Combination {
        Combination::new(self.keys.clone())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Key names in press order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|state| state.key.as_str())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|state| state.key == key)
    }

    fn remove(&mut self, key: &str) {
        self.keys.retain(|state| state.key != key);
    }

    fn drop_pressed_without(&mut self, modifier: Modifier) {
        self.keys.retain(|state| state.modifiers.has(modifier));
    }
}
