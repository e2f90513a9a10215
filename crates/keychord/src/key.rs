//! Key and modifier types shared by the stack engine and the registry

use std::fmt;

use serde::Serialize;

/// One of the four modifiers carried by every key notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Alt,
    Control,
    Meta,
    Shift,
}

impl Modifier {
    /// Return the modifier whose own key carries this name.
    ///
    /// Names are compared literally: `"Control"` is a modifier, `"Ctrl"` is not.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "Alt" => Some(Modifier::Alt),
            "Control" => Some(Modifier::Control),
            "Meta" => Some(Modifier::Meta),
            "Shift" => Some(Modifier::Shift),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Alt => write!(f, "Alt"),
            Modifier::Control => write!(f, "Control"),
            Modifier::Meta => write!(f, "Meta"),
            Modifier::Shift => write!(f, "Shift"),
        }
    }
}

/// Modifier flags as reported alongside a key notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        alt: false,
        ctrl: false,
        meta: false,
        shift: false,
    };

    /// Check whether the flag for `modifier` is set.
    pub fn has(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Alt => self.alt,
            Modifier::Control => self.ctrl,
            Modifier::Meta => self.meta,
            Modifier::Shift => self.shift,
        }
    }

    /// Set or unset the flag for `modifier`.
    pub fn set(&mut self, modifier: Modifier, value: bool) {
        match modifier {
            Modifier::Alt => self.alt = value,
            Modifier::Control => self.ctrl = value,
            Modifier::Meta => self.meta = value,
            Modifier::Shift => self.shift = value,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

/// A raw press or release notification from the host input source.
///
/// `key` uses the platform's naming and is normalized by the stack engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

/// A key currently held on the stack.
///
/// The modifier flags are the ones reported when the key was pressed, not the
/// live modifier state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyState {
    pub key: String,
    #[serde(flatten)]
    pub modifiers: Modifiers,
}

/// An ordered snapshot of the stack handed to observers and handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Combination(Vec<KeyState>);

impl Combination {
    pub(crate) fn new(keys: Vec<KeyState>) -> Self {
        Self(keys)
    }

    /// Key names in press order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|state| state.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[KeyState] {
        &self.0
    }

    /// Exact match against a key sequence: same length, same names in order.
    /// Modifier flags are ignored.
    pub fn matches<S: AsRef<str>>(&self, keys: &[S]) -> bool {
        self.0.len() == keys.len()
            && self
                .0
                .iter()
                .zip(keys)
                .all(|(state, key)| state.key == key.as_ref())
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            if key == " " {
                write!(f, "Space")?;
            } else {
                write!(f, "{}", key)?;
            }
        }
        Ok(())
    }
}
