//! Case- and accent-insensitive text keys.
//!
//! # Responsibility
//! - Produce the folded comparison key stored next to usernames and note
//!   titles.
//! - Keep the folding rule in one place so every uniqueness lookup agrees
//!   with the unique indexes in storage.
//!
//! # Invariants
//! - Two texts are "the same" under strength-2 collation iff their fold keys
//!   are byte-equal.
//! - Folding ignores letter case and diacritics but keeps base letters,
//!   digits and punctuation.
//! - `fold_key(fold_key(x)) == fold_key(x)`.
//! - Changing the rule requires a migration that recomputes stored keys.

use caseless::Caseless;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Returns the strength-2 comparison key for `value`.
///
/// Rules:
/// - compatibility decomposition (NFKD), so `é` becomes `e` + combining acute;
/// - combining marks dropped;
/// - full Unicode case folding, so `ß` matches `ss` and final `ς` matches `σ`;
/// - decomposition and mark stripping again, since folding can reintroduce
///   composed or marked characters;
/// - surrounding whitespace trimmed.
pub fn fold_key(value: &str) -> String {
    value
        .trim()
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .default_case_fold()
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect()
}
