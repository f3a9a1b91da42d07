//! Key input types.
//!
//! Platform-agnostic key representation plus the chord syntax used by keymap
//! layers (`Ctrl-d`, `Mod-Shift-z`, `Alt-ArrowUp`). Platform code converts
//! native key events into a [`KeyCombo`] and hands it to the editor control.

use std::fmt;
use std::str::FromStr;

use smol_str::{SmolStr, ToSmolStr};

use crate::error::EditorError;

/// Key values for keyboard input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key. Letters are stored lowercase.
    Character(SmolStr),

    // === Whitespace / editing ===
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Space,
    Insert,

    // === Navigation ===
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    /// Function key F1..F24.
    F(u8),
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl AsRef<str>) -> Self {
        Self::Character(s.as_ref().to_lowercase().to_smolstr())
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    fn from_name(name: &str) -> Option<Self> {
        let key = match name.to_ascii_lowercase().as_str() {
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "enter" | "return" => Self::Enter,
            "tab" => Self::Tab,
            "escape" | "esc" => Self::Escape,
            "space" => Self::Space,
            "insert" => Self::Insert,
            "arrowleft" | "left" => Self::ArrowLeft,
            "arrowright" | "right" => Self::ArrowRight,
            "arrowup" | "up" => Self::ArrowUp,
            "arrowdown" | "down" => Self::ArrowDown,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" => Self::PageUp,
            "pagedown" => Self::PageDown,
            lower => {
                let n = lower.strip_prefix('f')?.parse::<u8>().ok()?;
                if (1..=24).contains(&n) {
                    Self::F(n)
                } else {
                    return None;
                }
            }
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Character(c) => f.write_str(c),
            Self::F(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    pub fn with_shift(self) -> Self {
        Self {
            shift: true,
            ..self
        }
    }
}

/// A key combination for triggering a binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn ctrl(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::CTRL)
    }

    pub fn meta(key: Key) -> Self {
        Self::with_modifiers(key, Modifiers::META)
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self::with_modifiers(key, Modifiers::primary(is_mac))
    }

    pub fn primary_shift(key: Key, is_mac: bool) -> Self {
        Self::with_modifiers(key, Modifiers::primary(is_mac).with_shift())
    }

    /// Parse a chord such as `Mod-Shift-z` or `Ctrl--`.
    ///
    /// `Mod` resolves to Cmd when `is_mac`, Ctrl otherwise. Modifier names are
    /// case-insensitive; the final part names the key.
    pub fn parse(chord: &str, is_mac: bool) -> Result<Self, EditorError> {
        let invalid = |reason| EditorError::InvalidKeyChord {
            chord: chord.to_string(),
            reason,
        };
        if chord.is_empty() {
            return Err(invalid("empty chord"));
        }

        let mut parts: Vec<&str> = chord.split('-').collect();
        // "Ctrl--" splits into ["Ctrl", "", ""]: the key is '-'.
        let key_part = match parts.pop() {
            Some("") if parts.last() == Some(&"") => {
                parts.pop();
                "-"
            }
            Some("") => return Err(invalid("missing key")),
            Some(k) => k,
            None => return Err(invalid("missing key")),
        };

        let mut modifiers = Modifiers::NONE;
        for part in parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "c" => modifiers.ctrl = true,
                "alt" | "option" | "a" => modifiers.alt = true,
                "shift" | "s" => modifiers.shift = true,
                "meta" | "cmd" | "m" => modifiers.meta = true,
                "mod" => {
                    if is_mac {
                        modifiers.meta = true
                    } else {
                        modifiers.ctrl = true
                    }
                }
                _ => return Err(invalid("unknown modifier")),
            }
        }

        let key = if key_part.chars().count() == 1 {
            if key_part == " " {
                Key::Space
            } else {
                Key::character(key_part)
            }
        } else {
            Key::from_name(key_part).ok_or_else(|| invalid("unknown key name"))?
        };

        Ok(Self { key, modifiers })
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        if m.ctrl {
            f.write_str("Ctrl-")?;
        }
        if m.alt {
            f.write_str("Alt-")?;
        }
        if m.shift {
            f.write_str("Shift-")?;
        }
        if m.meta {
            f.write_str("Meta-")?;
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyCombo {
    type Err = EditorError;

    /// Parses with non-mac `Mod` resolution.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, false)
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mod_resolves_per_platform() {
        let combo = KeyCombo::parse("Mod-z", false).unwrap();
        assert_eq!(combo, KeyCombo::ctrl(Key::character("z")));

        let combo = KeyCombo::parse("Mod-z", true).unwrap();
        assert_eq!(combo, KeyCombo::meta(Key::character("z")));
    }

    #[test]
    fn test_parse_modifier_order_irrelevant() {
        let a = KeyCombo::parse("Shift-Ctrl-Z", false).unwrap();
        let b = KeyCombo::parse("ctrl-shift-z", false).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, KeyCombo::primary_shift(Key::character("z"), false));
    }

    #[test]
    fn test_parse_named_and_dash_keys() {
        assert_eq!(
            KeyCombo::parse("Alt-ArrowUp", false).unwrap(),
            KeyCombo::with_modifiers(Key::ArrowUp, Modifiers::ALT)
        );
        assert_eq!(
            KeyCombo::parse("Ctrl--", false).unwrap(),
            KeyCombo::ctrl(Key::character("-"))
        );
        assert_eq!(KeyCombo::parse("F5", false).unwrap().key, Key::F(5));
        assert_eq!(KeyCombo::parse("Mod-/", false).unwrap().key, Key::character("/"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            KeyCombo::parse("", false),
            Err(EditorError::InvalidKeyChord { .. })
        ));
        assert!(KeyCombo::parse("Hyper-x", false).is_err());
        assert!(KeyCombo::parse("Ctrl-", false).is_err());
        assert!(KeyCombo::parse("Ctrl-NoSuchKey", false).is_err());
        assert!(KeyCombo::parse("F99", false).is_err());
    }

    #[test]
    fn test_display() {
        let combo: KeyCombo = "Mod-Shift-k".parse().unwrap();
        assert_eq!(combo.to_string(), "Ctrl-Shift-k");
    }
}
