//! Key-stack state machine for chord-style keyboard shortcuts
//!
//! This crate tracks which keys are held, matches the held sequence against
//! registered key combinations and invokes the matching handlers. The host
//! supplies raw key notifications through an [`InputSource`] and a one-shot
//! [`Timer`] used to drop stale keys when releases go missing.

mod controller;
mod error;
mod idle;
mod input;
mod key;
mod normalize;
mod registry;
mod stack;
mod timer;

pub use controller::{CombinationObserver, Controller, ObserverId, Settings};
pub use error::{DispatchError, HandlerFailure};
pub use input::{InputSource, KeyListener, ListenerId, LocalInput};
pub use key::{Combination, KeyEvent, KeyState, Modifier, Modifiers};
pub use normalize::normalize;
pub use registry::{Handler, ListenerOptions};
pub use stack::{is_reserved, KeyStack, PressOutcome, RESERVED_KEYS, UNIDENTIFIED};
pub use timer::{ManualTimer, Timer, TimerCallback, TimerId};
