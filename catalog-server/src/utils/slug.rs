//! Slug derivation
//!
//! `"Billeteras con Tarjetero"` -> `"billeteras-con-tarjetero"`,
//! `"Relojes Clásicos"` -> `"relojes-clasicos"`.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Derive a URL-safe slug from a display name
///
/// Lowercases, decomposes (NFD) and drops combining marks, collapses every run
/// of characters outside `[a-z0-9]` into a single `-`, then trims hyphens at
/// both ends. May return an empty string for names made only of symbols.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.to_lowercase().nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
