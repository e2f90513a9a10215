//! Translation of evdev key events into keychord notifications
//!
//! evdev reports key codes (`KEY_A`, `KEY_LEFTSHIFT`, ...) with a value of
//! 0 (release), 1 (press) or 2 (autorepeat). The controller works on named
//! keys with modifier flags, so this module:
//!
//! - names each key the way a keyboard event's `key` field would
//!   (`KEY_A` -> `a`, `KEY_ESC` -> `Escape`, `KEY_RIGHTALT` -> `AltGraph`)
//! - tracks which modifiers are physically held, normalizing left and right
//!   variants, to fill in the four modifier flags
//! - drops autorepeat events
//!
//! Keys without a name are reported as `Unidentified`.

use std::collections::HashSet;

use evdev::Key;
use keychord::{KeyEvent, Modifier, Modifiers, UNIDENTIFIED};

/// Event value constants for key events.
pub mod event_value {
    pub const RELEASE: i32 = 0;
    pub const PRESS: i32 = 1;
    pub const REPEAT: i32 = 2;
}

/// A translated key transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Press(KeyEvent),
    Release(KeyEvent),
}

/// The modifier an evdev key contributes to the modifier flags.
///
/// Right Alt is reported as `AltGraph` and does not set the Alt flag.
fn modifier_for(key: Key) -> Option<Modifier> {
    match key {
        Key::KEY_LEFTCTRL | Key::KEY_RIGHTCTRL => Some(Modifier::Control),
        Key::KEY_LEFTSHIFT | Key::KEY_RIGHTSHIFT => Some(Modifier::Shift),
        Key::KEY_LEFTALT => Some(Modifier::Alt),
        Key::KEY_LEFTMETA | Key::KEY_RIGHTMETA => Some(Modifier::Meta),
        _ => None,
    }
}

/// Name an evdev key.
pub fn key_name(key: Key) -> &'static str {
    match key {
        Key::KEY_ESC => "Escape",
        Key::KEY_ENTER | Key::KEY_KPENTER => "Enter",
        Key::KEY_TAB => "Tab",
        Key::KEY_SPACE => " ",
        Key::KEY_BACKSPACE => "Backspace",
        Key::KEY_CAPSLOCK => "CapsLock",
        Key::KEY_NUMLOCK => "NumLock",
        Key::KEY_SCROLLLOCK => "ScrollLock",
        Key::KEY_SYSRQ => "PrintScreen",
        Key::KEY_PAUSE => "Pause",
        Key::KEY_MENU => "ContextMenu",

        // Modifiers
        Key::KEY_LEFTCTRL | Key::KEY_RIGHTCTRL => "Control",
        Key::KEY_LEFTSHIFT | Key::KEY_RIGHTSHIFT => "Shift",
        Key::KEY_LEFTALT => "Alt",
        Key::KEY_RIGHTALT => "AltGraph",
        Key::KEY_LEFTMETA | Key::KEY_RIGHTMETA => "Meta",
        Key::KEY_COMPOSE => "Compose",

        // Letters
        Key::KEY_A => "a",
        Key::KEY_B => "b",
        Key::KEY_C => "c",
        Key::KEY_D => "d",
        Key::KEY_E => "e",
        Key::KEY_F => "f",
        Key::KEY_G => "g",
        Key::KEY_H => "h",
        Key::KEY_I => "i",
        Key::KEY_J => "j",
        Key::KEY_K => "k",
        Key::KEY_L => "l",
        Key::KEY_M => "m",
        Key::KEY_N => "n",
        Key::KEY_O => "o",
        Key::KEY_P => "p",
        Key::KEY_Q => "q",
        Key::KEY_R => "r",
        Key::KEY_S => "s",
        Key::KEY_T => "t",
        Key::KEY_U => "u",
        Key::KEY_V => "v",
        Key::KEY_W => "w",
        Key::KEY_X => "x",
        Key::KEY_Y => "y",
        Key::KEY_Z => "z",

        // Number row and keypad digits
        Key::KEY_0 | Key::KEY_KP0 => "0",
        Key::KEY_1 | Key::KEY_KP1 => "1",
        Key::KEY_2 | Key::KEY_KP2 => "2",
        Key::KEY_3 | Key::KEY_KP3 => "3",
        Key::KEY_4 | Key::KEY_KP4 => "4",
        Key::KEY_5 | Key::KEY_KP5 => "5",
        Key::KEY_6 | Key::KEY_KP6 => "6",
        Key::KEY_7 | Key::KEY_KP7 => "7",
        Key::KEY_8 | Key::KEY_KP8 => "8",
        Key::KEY_9 | Key::KEY_KP9 => "9",

        // Symbols
        Key::KEY_MINUS | Key::KEY_KPMINUS => "-",
        Key::KEY_EQUAL => "=",
        Key::KEY_KPPLUS => "+",
        Key::KEY_KPASTERISK => "*",
        Key::KEY_LEFTBRACE => "[",
        Key::KEY_RIGHTBRACE => "]",
        Key::KEY_SEMICOLON => ";",
        Key::KEY_APOSTROPHE => "'",
        Key::KEY_GRAVE => "`",
        Key::KEY_BACKSLASH => "\\",
        Key::KEY_COMMA => ",",
        Key::KEY_DOT | Key::KEY_KPDOT => ".",
        Key::KEY_SLASH | Key::KEY_KPSLASH => "/",

        // Navigation
        Key::KEY_UP => "ArrowUp",
        Key::KEY_DOWN => "ArrowDown",
        Key::KEY_LEFT => "ArrowLeft",
        Key::KEY_RIGHT => "ArrowRight",
        Key::KEY_HOME => "Home",
        Key::KEY_END => "End",
        Key::KEY_PAGEUP => "PageUp",
        Key::KEY_PAGEDOWN => "PageDown",
        Key::KEY_INSERT => "Insert",
        Key::KEY_DELETE => "Delete",

        // Function keys
        Key::KEY_F1 => "F1",
        Key::KEY_F2 => "F2",
        Key::KEY_F3 => "F3",
        Key::KEY_F4 => "F4",
        Key::KEY_F5 => "F5",
        Key::KEY_F6 => "F6",
        Key::KEY_F7 => "F7",
        Key::KEY_F8 => "F8",
        Key::KEY_F9 => "F9",
        Key::KEY_F10 => "F10",
        Key::KEY_F11 => "F11",
        Key::KEY_F12 => "F12",
        Key::KEY_F13 => "F13",
        Key::KEY_F14 => "F14",
        Key::KEY_F15 => "F15",
        Key::KEY_F16 => "F16",
        Key::KEY_F17 => "F17",
        Key::KEY_F18 => "F18",
        Key::KEY_F19 => "F19",
        Key::KEY_F20 => "F20",
        Key::KEY_F21 => "F21",
        Key::KEY_F22 => "F22",
        Key::KEY_F23 => "F23",
        Key::KEY_F24 => "F24",

        _ => UNIDENTIFIED,
    }
}

/// Turns raw evdev key events into press/release notifications.
#[derive(Debug, Default)]
pub struct KeyTranslator {
    /// Physically held modifier keys (left and right tracked separately)
    held: HashSet<Key>,
}

impl KeyTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current modifier flags.
    ///
    /// A modifier counts as held while either of its keys is down.
    pub fn modifiers(&self) -> Modifiers {
        let mut modifiers = Modifiers::NONE;
        for key in &self.held {
            if let Some(modifier) = modifier_for(*key) {
                modifiers.set(modifier, true);
            }
        }
        modifiers
    }

    /// Translate one key event. Autorepeat and unknown values yield `None`.
    ///
    /// Modifier state is updated before the flags are read, so pressing Shift
    /// reports `shift: true` and releasing it reports `shift: false`.
    pub fn translate(&mut self, key: Key, value: i32) -> Option<Transition> {
        match value {
            event_value::PRESS => {
                if modifier_for(key).is_some() {
                    self.held.insert(key);
                }
                Some(Transition::Press(self.event(key)))
            }
            event_value::RELEASE => {
                self.held.remove(&key);
                Some(Transition::Release(self.event(key)))
            }
            event_value::REPEAT => None,
            _ => None,
        }
    }

    fn event(&self, key: Key) -> KeyEvent {
        KeyEvent::with_modifiers(key_name(key), self.modifiers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(translator: &mut KeyTranslator, key: Key) -> KeyEvent {
        match translator.translate(key, event_value::PRESS) {
            Some(Transition::Press(event)) => event,
            other => panic!("Expected press, got {:?}", other),
        }
    }

    fn release(translator: &mut KeyTranslator, key: Key) -> KeyEvent {
        match translator.translate(key, event_value::RELEASE) {
            Some(Transition::Release(event)) => event,
            other => panic!("Expected release, got {:?}", other),
        }
    }

    #[test]
    fn test_key_names() {
        assert_eq!(key_name(Key::KEY_A), "a");
        assert_eq!(key_name(Key::KEY_ESC), "Escape");
        assert_eq!(key_name(Key::KEY_SPACE), " ");
        assert_eq!(key_name(Key::KEY_KP7), "7");
        assert_eq!(key_name(Key::KEY_F6), "F6");
        assert_eq!(key_name(Key::KEY_UP), "ArrowUp");
    }

    #[test]
    fn test_modifier_key_names() {
        assert_eq!(key_name(Key::KEY_LEFTCTRL), "Control");
        assert_eq!(key_name(Key::KEY_RIGHTCTRL), "Control");
        assert_eq!(key_name(Key::KEY_RIGHTSHIFT), "Shift");
        assert_eq!(key_name(Key::KEY_LEFTALT), "Alt");
        assert_eq!(key_name(Key::KEY_RIGHTALT), "AltGraph");
        assert_eq!(key_name(Key::KEY_RIGHTMETA), "Meta");
        assert_eq!(key_name(Key::KEY_COMPOSE), "Compose");
    }

    #[test]
    fn test_unknown_key_is_unidentified() {
        assert_eq!(key_name(Key::KEY_BRIGHTNESSUP), UNIDENTIFIED);
    }

    #[test]
    fn test_plain_press_has_no_modifiers() {
        let mut translator = KeyTranslator::new();
        let event = press(&mut translator, Key::KEY_G);
        assert_eq!(event, KeyEvent::new("g"));
    }

    #[test]
    fn test_shift_flag_follows_shift_key() {
        let mut translator = KeyTranslator::new();

        let shift_down = press(&mut translator, Key::KEY_LEFTSHIFT);
        assert!(shift_down.modifiers.shift, "Shift press reports shift held");

        let a_down = press(&mut translator, Key::KEY_A);
        assert_eq!(a_down.modifiers, Modifiers::NONE.with_shift());

        let shift_up = release(&mut translator, Key::KEY_LEFTSHIFT);
        assert!(!shift_up.modifiers.shift, "Shift release reports shift up");

        let b_down = press(&mut translator, Key::KEY_B);
        assert_eq!(b_down.modifiers, Modifiers::NONE);
    }

    #[test]
    fn test_left_and_right_variants_normalize() {
        let mut translator = KeyTranslator::new();
        press(&mut translator, Key::KEY_LEFTCTRL);
        press(&mut translator, Key::KEY_RIGHTCTRL);

        release(&mut translator, Key::KEY_LEFTCTRL);
        assert!(
            translator.modifiers().ctrl,
            "Ctrl stays held while the right key is down"
        );

        release(&mut translator, Key::KEY_RIGHTCTRL);
        assert!(!translator.modifiers().ctrl);
    }

    #[test]
    fn test_right_alt_does_not_set_alt_flag() {
        let mut translator = KeyTranslator::new();
        let event = press(&mut translator, Key::KEY_RIGHTALT);
        assert_eq!(event.key, "AltGraph");
        assert!(!event.modifiers.alt);
    }

    #[test]
    fn test_repeat_is_dropped() {
        let mut translator = KeyTranslator::new();
        press(&mut translator, Key::KEY_A);
        assert_eq!(translator.translate(Key::KEY_A, event_value::REPEAT), None);
        assert_eq!(translator.translate(Key::KEY_A, 7), None);
    }
}
