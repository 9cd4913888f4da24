//! Anchor slugs for headings.
//!
//! Text is NFKD-normalized with combining marks removed, lowercased, and
//! reduced to alphanumeric words joined by `-`. Non-ASCII letters survive
//! (`Über Straße` → `uber-straße`). A [`Slugger`] keeps slugs unique within
//! one document by appending `-1`, `-2`, ...

use std::collections::HashSet;

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Slug used when the text has no alphanumeric content.
pub const EMPTY_SLUG: &str = "section";

/// Slug for `text` without uniqueness tracking.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        for lower in ch.to_lowercase() {
            if lower.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                slug.push(lower);
                pending_dash = false;
            } else {
                pending_dash = true;
            }
        }
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// Hands out document-unique slugs.
#[derive(Debug, Default)]
pub struct Slugger {
    used: HashSet<String>,
}

impl Slugger {
    /// Fresh slugger with no slugs taken.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique slug for `text`.
    pub fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut n = 1usize;
        loop {
            let candidate = format!("{base}-{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_basic_slugs() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("  API: v2 (beta)  "), "api-v2-beta");
        assert_eq!(slugify("Café déjà vu"), "cafe-deja-vu");
        assert_eq!(slugify("!!!"), EMPTY_SLUG);
    }

    #[test]
    fn test_duplicates_get_suffixes() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Intro"), "intro");
        assert_eq!(slugger.slug("Intro"), "intro-1");
        assert_eq!(slugger.slug("intro"), "intro-2");
    }

    #[test]
    fn test_suffix_skips_literal_collisions() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Step 1"), "step-1");
        assert_eq!(slugger.slug("Step"), "step");
        assert_eq!(slugger.slug("Step"), "step-2");
    }

    proptest! {
        #[test]
        fn slug_has_no_edge_or_double_dashes(text in "\\PC{0,40}") {
            let slug = slugify(&text);
            prop_assert!(!slug.is_empty());
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
        }

        #[test]
        fn slugger_never_repeats(words in proptest::collection::vec("[a-c ]{0,4}", 1..20)) {
            let mut slugger = Slugger::new();
            let mut seen = HashSet::new();
            for word in &words {
                prop_assert!(seen.insert(slugger.slug(word)));
            }
        }
    }
}
