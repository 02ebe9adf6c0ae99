//! Diacritic stripping for accent-insensitive matching

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Decompose to NFD, drop combining marks, recompose to NFC.
pub fn remove_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}

/// Fold a word for exact-lookup comparison under the two independent toggles.
///
/// Case folding uses Unicode default case mapping rather than locale
/// collation; behavior for non-Latin scripts is a known fidelity gap of the
/// format's reference implementations.
pub fn fold_for_match(word: &str, ignore_case: bool, ignore_diacritics: bool) -> String {
    let stripped;
    let word = if ignore_diacritics {
        stripped = remove_diacritics(word);
        stripped.as_str()
    } else {
        word
    };
    if ignore_case {
        word.to_lowercase()
    } else {
        word.to_string()
    }
}
