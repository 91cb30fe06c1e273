//! Defines the [`Slug`] type and [`derive_slug`], which maps a post title onto
//! the identifier used in its route (`/blogs/{slug}`).
//!
//! The derivation is deliberately literal: the title is split on whitespace,
//! the pieces are joined with `-`, and the result is lowercased. Punctuation
//! and non-ASCII characters pass through untouched, so `"C++ & You"` becomes
//! `"c++-&-you"`. Enumeration and resolution both go through [`derive_slug`],
//! which is what keeps the route table and the resolver in agreement.

use std::fmt;

/// A URL identifier derived from a post title. Slugs are never stored; they
/// are recomputed from the title wherever they're needed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slug(String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Slug {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Slug {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Derives the [`Slug`] for `title`. Every whitespace character is a
/// separator, so consecutive spaces produce consecutive hyphens
/// (`"a  b"` becomes `"a--b"`).
pub fn derive_slug(title: &str) -> Slug {
    Slug(
        title
            .split(char::is_whitespace)
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase(),
    )
}
