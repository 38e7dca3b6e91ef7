//! Seed derivation from user text.
//!
//! Every editor accepts a free-form seed field. How the field becomes a
//! number depends on the editor (see [`SeedRule`]): some hash every input,
//! some read a leading integer, and the rest use numbers as-is and hash
//! anything else. The same text always produces the same poster.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Seed used when the seed field is empty.
pub const DEFAULT_SEED: u32 = 12345;

/// Fold text into a 32-bit seed.
///
/// Each UTF-16 code unit `c` is accumulated as `acc = (acc << 5) - acc + c`
/// in wrapping signed 32-bit arithmetic and the absolute value of the result
/// is returned. Empty text maps to [`DEFAULT_SEED`].
///
/// Distinct strings may collide; that is accepted.
#[must_use]
pub fn seed_from_text(text: &str) -> u32 {
    if text.is_empty() {
        return DEFAULT_SEED;
    }
    let hash = text.encode_utf16().fold(0_i32, |acc, unit| {
        acc.wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(i32::from(unit))
    });
    hash.unsigned_abs()
}

/// How an editor turns its seed field into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedRule {
    /// Plain unsigned decimals are used directly; other text is hashed.
    Auto,
    /// Every non-blank input is hashed, digits included.
    Hash,
    /// A leading integer is read; input without one uses the fallback.
    Integer {
        /// Seed for input without a leading integer.
        fallback: u32,
    },
    /// Like [`SeedRule::Integer`], but zero also uses the fallback.
    NonZeroInteger {
        /// Seed for input without a non-zero leading integer.
        fallback: u32,
    },
}

/// Read a leading integer the way a browser's `parseInt(text, 10)` does,
/// wrapped to 32 bits.
fn leading_integer(text: &str) -> Option<u32> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].bytes().fold(0_u32, |acc, b| {
        acc.wrapping_mul(10).wrapping_add(u32::from(b - b'0'))
    });
    Some(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

/// A poster seed together with the text the user typed to obtain it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed {
    /// Numeric value fed to the random stream.
    pub value: u32,
    /// Original seed text, if the seed came from user input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Seed {
    /// Create a seed from a bare numeric value.
    #[must_use]
    pub const fn from_value(value: u32) -> Self {
        Self { value, text: None }
    }

    /// Parse a seed field. Never fails.
    ///
    /// - blank input yields [`DEFAULT_SEED`];
    /// - an unsigned decimal that fits in 32 bits is used directly;
    /// - any other text is hashed with [`seed_from_text`].
    ///
    /// The trimmed text is kept so it can be shown on exported posters.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::from_value(DEFAULT_SEED);
        }
        let value = trimmed
            .parse::<u32>()
            .unwrap_or_else(|_| seed_from_text(trimmed));
        Self {
            value,
            text: Some(trimmed.to_string()),
        }
    }

    /// Parse a seed field with an editor's [`SeedRule`]. Never fails.
    ///
    /// Blank input yields [`DEFAULT_SEED`] except under the integer rules,
    /// which use their fallback. Integer seeds keep no text, so their label
    /// is the number itself.
    #[must_use]
    pub fn parse_with(input: &str, rule: SeedRule) -> Self {
        let trimmed = input.trim();
        match rule {
            SeedRule::Auto => Self::parse(trimmed),
            SeedRule::Hash if trimmed.is_empty() => Self::default(),
            SeedRule::Hash => Self {
                value: seed_from_text(trimmed),
                text: Some(trimmed.to_string()),
            },
            SeedRule::Integer { fallback } => {
                Self::from_value(leading_integer(trimmed).unwrap_or(fallback))
            }
            SeedRule::NonZeroInteger { fallback } => Self::from_value(
                leading_integer(trimmed)
                    .filter(|&v| v != 0)
                    .unwrap_or(fallback),
            ),
        }
    }

    /// The label printed on exported posters: the user text if present,
    /// otherwise the numeric value.
    #[must_use]
    pub fn label(&self) -> String {
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => self.value.to_string(),
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self::from_value(DEFAULT_SEED)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl From<u32> for Seed {
    fn from(value: u32) -> Self {
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_text_maps_to_default() {
        assert_eq!(seed_from_text(""), DEFAULT_SEED);
        assert_eq!(DEFAULT_SEED, 12345);
    }

    #[test]
    fn known_hashes() {
        assert_eq!(seed_from_text("a"), 97);
        assert_eq!(seed_from_text("alpha"), 92_909_918);
        assert_eq!(seed_from_text("hello"), 99_162_322);
        assert_eq!(seed_from_text("Program.A"), 1_035_186_999);
    }

    #[test]
    fn parse_numeric_uses_value() {
        let seed = Seed::parse("  4242 ");
        assert_eq!(seed.value, 4242);
        assert_eq!(seed.label(), "4242");
    }

    #[test]
    fn parse_text_hashes() {
        let seed = Seed::parse("alpha");
        assert_eq!(seed.value, 92_909_918);
        assert_eq!(seed.label(), "alpha");
    }

    #[test]
    fn parse_blank_is_default() {
        let seed = Seed::parse("   ");
        assert_eq!(seed.value, DEFAULT_SEED);
        assert!(seed.text.is_none());
        assert_eq!(seed.label(), "12345");
    }

    #[test]
    fn parse_negative_number_is_hashed() {
        let seed = Seed::parse("-7");
        assert_eq!(seed.value, seed_from_text("-7"));
    }

    #[test]
    fn oversized_number_is_hashed() {
        let seed = Seed::parse("99999999999");
        assert_eq!(seed.value, seed_from_text("99999999999"));
    }

    #[test]
    fn hash_rule_hashes_digits() {
        let seed = Seed::parse_with("42", SeedRule::Hash);
        assert_eq!(seed.value, 1662);
        assert_eq!(seed.label(), "42");
        assert_eq!(Seed::parse_with(" ", SeedRule::Hash).value, DEFAULT_SEED);
    }

    #[test]
    fn integer_rule_reads_a_leading_integer() {
        let rule = SeedRule::Integer {
            fallback: DEFAULT_SEED,
        };
        assert_eq!(Seed::parse_with("77", rule).value, 77);
        assert_eq!(Seed::parse_with("12abc", rule).value, 12);
        assert_eq!(Seed::parse_with("0", rule).value, 0);
        assert_eq!(Seed::parse_with("-1", rule).value, u32::MAX);
        assert_eq!(Seed::parse_with("dawn", rule).value, DEFAULT_SEED);
        assert_eq!(Seed::parse_with("", rule).value, DEFAULT_SEED);
        assert_eq!(Seed::parse_with("12abc", rule).label(), "12");
    }

    #[test]
    fn non_zero_rule_treats_zero_as_missing() {
        let rule = SeedRule::NonZeroInteger { fallback: 42 };
        assert_eq!(Seed::parse_with("0", rule).value, 42);
        assert_eq!(Seed::parse_with("x", rule).value, 42);
        assert_eq!(Seed::parse_with("9", rule).value, 9);
    }

    proptest! {
        #[test]
        fn hash_is_deterministic(text in ".*") {
            prop_assert_eq!(seed_from_text(&text), seed_from_text(&text));
        }

        #[test]
        fn parse_never_panics(text in ".*") {
            let seed = Seed::parse(&text);
            prop_assert_eq!(Seed::parse(&text), seed);
            let _ = Seed::parse_with(&text, SeedRule::Integer { fallback: 1 });
        }
    }
}
