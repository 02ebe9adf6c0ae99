//! StarDict collation
//!
//! Compatible readers binary-search the `.idx` table under this exact byte
//! ordering, so the rule must be reproduced as-is rather than replaced by
//! locale collation.

use std::cmp::Ordering;

/// Compare two headwords in StarDict order.
///
/// ASCII letters fold to lowercase (byte value shifted by 32); all other
/// bytes pass through untouched. The folded byte sequences compare
/// lexicographically, so on a shared prefix the shorter string sorts first.
/// Equal folded sequences break the tie by ordinal comparison of the
/// original strings.
pub fn stardict_cmp(a: &str, b: &str) -> Ordering {
    let folded_a = a.bytes().map(fold_byte);
    let folded_b = b.bytes().map(fold_byte);
    folded_a.cmp(folded_b).then_with(|| a.cmp(b))
}

/// Non-ASCII UTF-8 bytes are all >= 0x80 and never fold, so a per-byte fold
/// matches folding per character.
fn fold_byte(b: u8) -> u8 {
    if b.is_ascii_uppercase() {
        b + 32
    } else {
        b
    }
}
