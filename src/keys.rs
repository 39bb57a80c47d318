//! Canonical shortcut-key grammar.
//!
//! The OS reports modifier keys with left/right variants ("left ctrl",
//! "right shift"); this module folds them into single tokens and builds
//! deterministic `+`-joined shortcut strings: modifiers in a fixed order,
//! remaining keys sorted. Two equal strings always describe the same
//! physical combination.

use std::collections::BTreeSet;
use std::fmt;

/// Modifier tokens in their canonical output order.
pub const MODIFIER_ORDER: [&str; 4] = ["ctrl", "alt", "shift", "win"];

/// Fold left/right modifier variants into their canonical token; every
/// other key name is lowercased unchanged.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "left ctrl" | "right ctrl" => "ctrl".to_string(),
        "left shift" | "right shift" => "shift".to_string(),
        "left alt" | "right alt" => "alt".to_string(),
        "left windows" | "right windows" => "win".to_string(),
        _ => lowered,
    }
}

pub fn is_modifier(token: &str) -> bool {
    MODIFIER_ORDER.contains(&token)
}

/// Build the canonical shortcut string for a set of pressed key names:
/// modifiers first in [ctrl, alt, shift, win] order, then the remaining
/// tokens sorted ascending. The same set yields the same string whatever
/// the press order. An empty set yields an empty string, which callers
/// must treat as an incomplete combination.
pub fn build_shortcut_string<I, S>(pressed: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tokens: BTreeSet<String> = pressed
        .into_iter()
        .map(|raw| normalize(raw.as_ref()))
        .filter(|token| !token.is_empty())
        .collect();

    let mut ordered: Vec<&str> = MODIFIER_ORDER
        .iter()
        .copied()
        .filter(|modifier| tokens.contains(*modifier))
        .collect();
    // BTreeSet iteration keeps the non-modifier tail sorted
    ordered.extend(
        tokens
            .iter()
            .map(String::as_str)
            .filter(|token| !is_modifier(token)),
    );
    ordered.join("+")
}

/// A canonical modifier+key combination. Construction always goes through
/// [`ShortcutKey::parse`], so string equality is combination equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortcutKey(String);

impl ShortcutKey {
    /// Canonicalize user- or store-supplied input ("Alt + Ctrl+E" becomes
    /// "ctrl+alt+e"). Returns `None` when no tokens survive.
    pub fn parse(input: &str) -> Option<Self> {
        let canonical = build_shortcut_string(input.split('+'));
        if canonical.is_empty() {
            None
        } else {
            Some(ShortcutKey(canonical))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tokens in canonical order: modifiers first, then keys.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split('+')
    }
}

impl fmt::Display for ShortcutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_sided_modifiers() {
        assert_eq!(normalize("left ctrl"), "ctrl");
        assert_eq!(normalize("Right Ctrl"), "ctrl");
        assert_eq!(normalize("left shift"), "shift");
        assert_eq!(normalize("right alt"), "alt");
        assert_eq!(normalize("left windows"), "win");
        assert_eq!(normalize("right windows"), "win");
    }

    #[test]
    fn normalize_lowercases_everything_else() {
        assert_eq!(normalize("F4"), "f4");
        assert_eq!(normalize("Esc"), "esc");
        assert_eq!(normalize("  Space  "), "space");
    }

    #[test]
    fn build_is_order_independent() {
        let expected = "ctrl+alt+e";
        let presses = [
            vec!["e", "left ctrl", "alt"],
            vec!["alt", "e", "left ctrl"],
            vec!["left ctrl", "alt", "e"],
            vec!["e", "alt", "left ctrl"],
        ];
        for press in presses {
            assert_eq!(build_shortcut_string(press), expected);
        }
    }

    #[test]
    fn build_orders_modifiers_then_sorted_keys() {
        let result = build_shortcut_string(["b", "win", "shift", "a", "ctrl"]);
        assert_eq!(result, "ctrl+shift+win+a+b");
    }

    #[test]
    fn build_folds_duplicate_sides_into_one_token() {
        let result = build_shortcut_string(["left ctrl", "right ctrl", "c"]);
        assert_eq!(result, "ctrl+c");
    }

    #[test]
    fn build_empty_set_yields_empty_string() {
        assert_eq!(build_shortcut_string(Vec::<&str>::new()), "");
    }

    #[test]
    fn parse_canonicalizes_mixed_input() {
        let key = ShortcutKey::parse("E + Alt+Left Ctrl").unwrap();
        assert_eq!(key.as_str(), "ctrl+alt+e");
        assert_eq!(ShortcutKey::parse("CTRL+ALT+E").unwrap(), key);
    }

    #[test]
    fn parse_rejects_empty_input() {
        assert!(ShortcutKey::parse("").is_none());
        assert!(ShortcutKey::parse("  +  ").is_none());
    }

    #[test]
    fn tokens_iterate_in_canonical_order() {
        let key = ShortcutKey::parse("x+shift+ctrl").unwrap();
        let tokens: Vec<&str> = key.tokens().collect();
        assert_eq!(tokens, vec!["ctrl", "shift", "x"]);
    }
}
