//! Slug normalization
//!
//! Turns arbitrary human text into a canonical, URL-safe identifier that can
//! be compared across locales and repeated calls. Normalization is
//! deterministic and idempotent: feeding a slug back through [`slugify`]
//! returns it unchanged, so stored slugs and freshly normalized input can be
//! diffed directly.
//!
//! # Algorithm
//!
//! 1. Runs of the "other" separator (`-` vs `_`) collapse into the chosen one.
//! 2. Every `@` is verbalized as `at`, surrounded by separators, so email-like
//!    names stay readable (`a@b` becomes `a-at-b`).
//! 3. Text is Unicode-lowercased; anything that is not a letter, a number,
//!    the separator or whitespace marks a word boundary.
//! 4. Boundary runs collapse into a single separator; leading and trailing
//!    separators are trimmed.
//!
//! Non-ASCII letters and digits survive normalization untouched, so
//! `"日本語 タグ"` slugs to `"日本語-タグ"`.
//!
//! # Examples
//!
//! ```
//! use taggable::slug::slugify;
//!
//! assert_eq!(slugify("Hello World"), "hello-world");
//! assert_eq!(slugify("a@b.com"), "a-at-b-com");
//! assert_eq!(slugify("   "), "");
//! ```

/// Default separator used by [`slugify`].
pub const DEFAULT_SEPARATOR: char = '-';

/// Normalize `name` into a slug using the default `-` separator.
///
/// Returns an empty string when `name` contains no letters or numbers at
/// all. An empty slug never names a valid tag; callers are expected to
/// reject it before resolving (see `TagResolver`).
#[must_use]
pub fn slugify(name: &str) -> String {
    slugify_with(name, DEFAULT_SEPARATOR)
}

/// Normalize `name` into a slug using an explicit separator.
///
/// The "other" separator (`_` when `separator` is `-`, and vice versa) is
/// treated as the separator itself, so `snake_case` and `kebab-case` input
/// normalize identically.
#[must_use]
pub fn slugify_with(name: &str, separator: char) -> String {
    let flip = if separator == '-' { '_' } else { '-' };

    let mut out = String::with_capacity(name.len());
    // A pending separator is only emitted once the next keeper character
    // arrives, which collapses runs and trims both ends in a single pass.
    let mut pending = false;

    for ch in name.chars() {
        if ch == '@' {
            push_word(&mut out, &mut pending, separator, "at");
        } else if ch == separator || ch == flip || ch.is_whitespace() {
            pending = true;
        } else if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                if lower.is_alphanumeric() {
                    flush(&mut out, &mut pending, separator);
                    out.push(lower);
                } else {
                    // Lowercasing can expand into combining marks; those are
                    // boundaries, same as any other stripped character.
                    pending = true;
                }
            }
        } else {
            pending = true;
        }
    }

    out
}

/// Append a literal word, forcing a boundary on both sides.
fn push_word(out: &mut String, pending: &mut bool, separator: char, word: &str) {
    *pending = true;
    flush(out, pending, separator);
    out.push_str(word);
    *pending = true;
}

/// Emit the pending separator, unless it would lead the slug.
fn flush(out: &mut String, pending: &mut bool, separator: char) {
    if *pending && !out.is_empty() {
        out.push(separator);
    }
    *pending = false;
}
