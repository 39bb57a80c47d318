//! Combinations the application may never claim.

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::keys::ShortcutKey;

/// Windows system and common application shortcuts. Fixed at build time;
/// there is deliberately no configuration surface for this list.
static RESERVED_SHORTCUTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "ctrl+c",
        "ctrl+v",
        "ctrl+x",
        "ctrl+z",
        "ctrl+y",
        "ctrl+a",
        "ctrl+s",
        "ctrl+n",
        "ctrl+o",
        "ctrl+p",
        "ctrl+w",
        "ctrl+q",
        "ctrl+f",
        "ctrl+h",
        "alt+f4",
        "alt+tab",
        "win+d",
        "win+e",
        "win+r",
        "win+l",
        "win+i",
        "win+s",
        "win+x",
        "win+tab",
        "ctrl+alt+del",
        "ctrl+shift+esc",
        "win+p",
        "win+k",
    ]
    .into_iter()
    .collect()
});

/// Membership test against the reserved set. Canonical keys are already
/// lowercase, so this is effectively case-insensitive for any input that
/// went through [`ShortcutKey::parse`].
pub fn is_reserved(key: &ShortcutKey) -> bool {
    RESERVED_SHORTCUTS.contains(key.as_str())
}
