//! Backend-agnostic keyboard input events.
//!
//! A [`Key`] is one of:
//!
//! - [`Key::Text`]: characters typed as-is,
//! - [`Key::Control`]: a control chord (`Ctrl` + lowercase letter), encoded as
//!   ASCII 1-26,
//! - [`Key::Named`]: a symbolic key with an optional ASCII code. Keys without a
//!   code (arrows, paste) must be dispatched by name.
//!
//! The well-known keys are `const` items. Their control chords are validated
//! at compile time; runtime definitions go through [`ControlChord::parse`] or
//! [`Key::from_str`](std::str::FromStr) and fail with
//! [`HarnessError::InvalidKeyDefinition`].
//!
//! # Notation
//!
//! Keys have a textual form used by scenario files and logs: `<ctrl+c>`,
//! `<enter>`, `<esc>`, `<up>`, ... Anything not wrapped in angle brackets is
//! literal text.

use crate::error::{HarnessError, HarnessResult};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// `Ctrl` + a lowercase ASCII letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ControlChord {
    letter: u8,
}

impl ControlChord {
    /// Build a chord in a `const` item. Invalid letters fail compilation.
    // Lowercase ascii fits in one byte.
    #[allow(clippy::cast_possible_truncation)]
    const fn checked(letter: char) -> Self {
        assert!(
            letter.is_ascii_lowercase(),
            "control chords take a lowercase ascii letter"
        );
        Self {
            letter: letter as u8,
        }
    }

    /// Parse a chord from a one-letter definition such as `"c"`.
    pub fn parse(definition: &str) -> HarnessResult<Self> {
        let mut chars = definition.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) if letter.is_ascii_lowercase() => Ok(Self::checked(letter)),
            (Some(_), None) => Err(HarnessError::InvalidKeyDefinition {
                definition: definition.to_string(),
                reason: "not a lowercase ascii letter".to_string(),
            }),
            _ => Err(HarnessError::InvalidKeyDefinition {
                definition: definition.to_string(),
                reason: "expected exactly one character".to_string(),
            }),
        }
    }

    pub fn letter(self) -> char {
        char::from(self.letter)
    }

    /// Canonical code: `'a'` is 1, `'z'` is 26.
    pub const fn code(self) -> u8 {
        self.letter - b'a' + 1
    }
}

/// A symbolic key, optionally backed by an ASCII code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NamedKey {
    name: &'static str,
    code: Option<u8>,
}

impl NamedKey {
    const fn new(name: &'static str, code: Option<u8>) -> Self {
        Self { name, code }
    }

    pub fn name(self) -> &'static str {
        self.name
    }

    pub fn code(self) -> Option<u8> {
        self.code
    }
}

/// One abstract input event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Text(Cow<'static, str>),
    Control(ControlChord),
    Named(NamedKey),
}

impl Key {
    /// Literal text key from a static string.
    pub const fn text(text: &'static str) -> Self {
        Self::Text(Cow::Borrowed(text))
    }

    /// ASCII code sent as a single raw byte, if the key has one.
    pub fn ascii_code(&self) -> Option<u8> {
        match self {
            Self::Text(_) => None,
            Self::Control(chord) => Some(chord.code()),
            Self::Named(named) => named.code(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Text(Cow::Owned(value.to_string()))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Text(Cow::Owned(value))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Control(chord) => write!(f, "<ctrl+{}>", chord.letter()),
            Self::Named(named) => write!(f, "<{}>", named.name().to_ascii_lowercase()),
        }
    }
}

impl FromStr for Key {
    type Err = HarnessError;

    fn from_str(notation: &str) -> Result<Self, Self::Err> {
        let Some(inner) = notation
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
        else {
            return Ok(Self::from(notation));
        };
        let lowered = inner.to_ascii_lowercase();
        if let Some(letter) = lowered.strip_prefix("ctrl+") {
            // Case is checked on the original text so "<ctrl+C>" is rejected.
            let original = inner.get(5..).unwrap_or_default();
            if original != letter {
                return Err(HarnessError::InvalidKeyDefinition {
                    definition: notation.to_string(),
                    reason: "not a lowercase ascii letter".to_string(),
                });
            }
            return ControlChord::parse(letter).map(Self::Control);
        }
        NAMED_KEYS
            .iter()
            .find(|named| named.name().eq_ignore_ascii_case(&lowered))
            .map(|named| Self::Named(*named))
            .ok_or_else(|| HarnessError::InvalidKeyDefinition {
                definition: notation.to_string(),
                reason: "unknown key name".to_string(),
            })
    }
}

pub const KEY_BACKSPACE: NamedKey = NamedKey::new("Backspace", Some(8));
pub const KEY_ENTER: NamedKey = NamedKey::new("Enter", Some(13));
pub const KEY_ESC: NamedKey = NamedKey::new("Esc", Some(27));
pub const KEY_DELETE: NamedKey = NamedKey::new("Delete", Some(127));
pub const KEY_UP: NamedKey = NamedKey::new("Up", None);
pub const KEY_DOWN: NamedKey = NamedKey::new("Down", None);
pub const KEY_LEFT: NamedKey = NamedKey::new("Left", None);
pub const KEY_RIGHT: NamedKey = NamedKey::new("Right", None);
pub const KEY_PASTE: NamedKey = NamedKey::new("Paste", None);

/// Every named key, in notation lookup order.
pub const NAMED_KEYS: &[NamedKey] = &[
    KEY_BACKSPACE,
    KEY_ENTER,
    KEY_ESC,
    KEY_DELETE,
    KEY_UP,
    KEY_DOWN,
    KEY_LEFT,
    KEY_RIGHT,
    KEY_PASTE,
];

pub const BACKSPACE: Key = Key::Named(KEY_BACKSPACE);
pub const ENTER: Key = Key::Named(KEY_ENTER);
pub const ESC: Key = Key::Named(KEY_ESC);
pub const DELETE: Key = Key::Named(KEY_DELETE);
pub const UP: Key = Key::Named(KEY_UP);
pub const DOWN: Key = Key::Named(KEY_DOWN);
pub const LEFT: Key = Key::Named(KEY_LEFT);
pub const RIGHT: Key = Key::Named(KEY_RIGHT);
pub const PASTE: Key = Key::Named(KEY_PASTE);

pub const CTRL_A: Key = Key::Control(ControlChord::checked('a'));
pub const CTRL_C: Key = Key::Control(ControlChord::checked('c'));
pub const CTRL_D: Key = Key::Control(ControlChord::checked('d'));
pub const CTRL_E: Key = Key::Control(ControlChord::checked('e'));
pub const CTRL_M: Key = Key::Control(ControlChord::checked('m'));
pub const CTRL_P: Key = Key::Control(ControlChord::checked('p'));
pub const CTRL_R: Key = Key::Control(ControlChord::checked('r'));
pub const CTRL_V: Key = Key::Control(ControlChord::checked('v'));
pub const CTRL_W: Key = Key::Control(ControlChord::checked('w'));
pub const CTRL_X: Key = Key::Control(ControlChord::checked('x'));

/// Parse a sequence of key notations.
pub fn parse_keys<S: AsRef<str>>(notations: &[S]) -> HarnessResult<Vec<Key>> {
    notations.iter().map(|n| n.as_ref().parse()).collect()
}
