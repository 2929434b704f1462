//! Global paste-shortcut listener, backed by `rdev`.
//!
//! # Design
//!
//! `rdev::listen()` is a blocking OS-level call that never returns while the
//! process is alive.  It must run on a **dedicated OS thread**; it cannot be
//! used inside a tokio task.
//!
//! [`HotkeyListener::start`] spawns that thread.  Raw key events are fed
//! through a [`ShortcutMatcher`], and every completed shortcut becomes a
//! [`PipelineCommand::Paste`](crate::pipeline::PipelineCommand::Paste) on the
//! pipeline's command channel.  The listener only observes events; the paste
//! itself still reaches the focused application.
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use paste_translator::hotkey::{HotkeyListener, PasteShortcut};
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let shortcut = PasteShortcut::parse("Ctrl", "V").expect("bad shortcut");
//! let _listener = HotkeyListener::start(shortcut, tx);
//! ```

pub mod listener;

pub use listener::HotkeyListener;

use rdev::{EventType, Key};

// ---------------------------------------------------------------------------
// Modifier
// ---------------------------------------------------------------------------

/// Modifier that must be held for the shortcut to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// ⌘ on macOS, the Windows key elsewhere.
    Meta,
    Ctrl,
    Alt,
    Shift,
}

impl Modifier {
    /// Whether `key` is the left or right variant of this modifier.
    pub fn matches(&self, key: Key) -> bool {
        match self {
            Modifier::Meta => matches!(key, Key::MetaLeft | Key::MetaRight),
            Modifier::Ctrl => matches!(key, Key::ControlLeft | Key::ControlRight),
            Modifier::Alt => matches!(key, Key::Alt | Key::AltGr),
            Modifier::Shift => matches!(key, Key::ShiftLeft | Key::ShiftRight),
        }
    }
}

/// Parse a modifier name from config (case-insensitive).
///
/// ```
/// use paste_translator::hotkey::{parse_modifier, Modifier};
///
/// assert_eq!(parse_modifier("Cmd"), Some(Modifier::Meta));
/// assert_eq!(parse_modifier("control"), Some(Modifier::Ctrl));
/// assert_eq!(parse_modifier("Hyper"), None);
/// ```
pub fn parse_modifier(name: &str) -> Option<Modifier> {
    match name.trim().to_ascii_lowercase().as_str() {
        "meta" | "cmd" | "command" | "super" | "win" => Some(Modifier::Meta),
        "ctrl" | "control" => Some(Modifier::Ctrl),
        "alt" | "option" | "opt" => Some(Modifier::Alt),
        "shift" => Some(Modifier::Shift),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// parse_key
// ---------------------------------------------------------------------------

/// Parse a key name from a config string into an [`rdev::Key`].
///
/// Supports F1–F12, common named keys, and single uppercase or lowercase ASCII
/// letters.  Returns `None` for unrecognised names.
///
/// ```
/// use paste_translator::hotkey::parse_key;
///
/// assert_eq!(parse_key("V"),  Some(rdev::Key::KeyV));
/// assert_eq!(parse_key("F9"), Some(rdev::Key::F9));
/// assert_eq!(parse_key("xyz"), None);
/// ```
pub fn parse_key(key_str: &str) -> Option<Key> {
    match key_str {
        "F1" => Some(Key::F1),
        "F2" => Some(Key::F2),
        "F3" => Some(Key::F3),
        "F4" => Some(Key::F4),
        "F5" => Some(Key::F5),
        "F6" => Some(Key::F6),
        "F7" => Some(Key::F7),
        "F8" => Some(Key::F8),
        "F9" => Some(Key::F9),
        "F10" => Some(Key::F10),
        "F11" => Some(Key::F11),
        "F12" => Some(Key::F12),

        "Space" => Some(Key::Space),
        "Return" | "Enter" => Some(Key::Return),
        "Insert" | "Ins" => Some(Key::Insert),

        "A" | "a" => Some(Key::KeyA),
        "B" | "b" => Some(Key::KeyB),
        "C" | "c" => Some(Key::KeyC),
        "D" | "d" => Some(Key::KeyD),
        "E" | "e" => Some(Key::KeyE),
        "F" | "f" => Some(Key::KeyF),
        "G" | "g" => Some(Key::KeyG),
        "H" | "h" => Some(Key::KeyH),
        "I" | "i" => Some(Key::KeyI),
        "J" | "j" => Some(Key::KeyJ),
        "K" | "k" => Some(Key::KeyK),
        "L" | "l" => Some(Key::KeyL),
        "M" | "m" => Some(Key::KeyM),
        "N" | "n" => Some(Key::KeyN),
        "O" | "o" => Some(Key::KeyO),
        "P" | "p" => Some(Key::KeyP),
        "Q" | "q" => Some(Key::KeyQ),
        "R" | "r" => Some(Key::KeyR),
        "S" | "s" => Some(Key::KeyS),
        "T" | "t" => Some(Key::KeyT),
        "U" | "u" => Some(Key::KeyU),
        "V" | "v" => Some(Key::KeyV),
        "W" | "w" => Some(Key::KeyW),
        "X" | "x" => Some(Key::KeyX),
        "Y" | "y" => Some(Key::KeyY),
        "Z" | "z" => Some(Key::KeyZ),

        _ => None,
    }
}

// ---------------------------------------------------------------------------
// PasteShortcut / ShortcutMatcher
// ---------------------------------------------------------------------------

/// A modifier + key chord, e.g. ⌘V.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PasteShortcut {
    pub modifier: Modifier,
    pub key: Key,
}

impl PasteShortcut {
    pub fn parse(modifier: &str, key: &str) -> Option<Self> {
        Some(Self {
            modifier: parse_modifier(modifier)?,
            key: parse_key(key)?,
        })
    }

    /// ⌘V on macOS, Ctrl+V elsewhere.
    pub fn platform_default() -> Self {
        let modifier = if cfg!(target_os = "macos") {
            Modifier::Meta
        } else {
            Modifier::Ctrl
        };
        Self {
            modifier,
            key: Key::KeyV,
        }
    }
}

/// Turns a raw key-event stream into shortcut hits.
///
/// Tracks which physical modifier keys (left/right) are down, so releasing one
/// of two held Ctrl keys keeps the chord alive and OS auto-repeat of a held
/// modifier is harmless.  Auto-repeat presses of the key itself each count as
/// a hit, the same as repeated pastes in the focused application.
#[derive(Debug)]
pub struct ShortcutMatcher {
    shortcut: PasteShortcut,
    held: Vec<Key>,
}

impl ShortcutMatcher {
    pub fn new(shortcut: PasteShortcut) -> Self {
        Self {
            shortcut,
            held: Vec::with_capacity(2),
        }
    }

    /// Feed one event; returns `true` when it completes the shortcut.
    pub fn on_event(&mut self, event: &EventType) -> bool {
        match event {
            EventType::KeyPress(k) if self.shortcut.modifier.matches(*k) => {
                if !self.held.contains(k) {
                    self.held.push(*k);
                }
                false
            }
            EventType::KeyRelease(k) if self.shortcut.modifier.matches(*k) => {
                self.held.retain(|held| held != k);
                false
            }
            EventType::KeyPress(k) if *k == self.shortcut.key => !self.held.is_empty(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
