//! URL-safe slugs derived from display names.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Separator placed between alphanumeric runs.
const SEPARATOR: char = '-';

/// Errors produced when validating a slug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("slug cannot be empty")]
    Empty,
    #[error("slug must be lowercase letters and digits separated by single hyphens")]
    NotCanonical,
}

/// Derive a slug from a name.
///
/// Lowercases the input, collapses every run of non-alphanumeric characters
/// into a single `-` and strips separators from both ends.
///
/// ```rust
/// # use catalog_core::slugify;
/// assert_eq!(slugify("  Summer Sale: 50% Off!  "), "summer-sale-50-off");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push(SEPARATOR);
            }
            pending_separator = false;
            // Some lowercase mappings emit combining marks ('İ' -> "i\u{307}").
            slug.extend(c.to_lowercase().filter(|l| l.is_alphanumeric()));
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// A validated slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display name.
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` if the name has no alphanumeric characters.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(SlugError::Empty);
        }
        Ok(Self(slug))
    }

    /// Validate an existing slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty or would change under
    /// re-derivation.
    pub fn parse(value: &str) -> Result<Self, SlugError> {
        if value.is_empty() {
            return Err(SlugError::Empty);
        }
        if slugify(value) != value {
            return Err(SlugError::NotCanonical);
        }
        Ok(Self(value.to_string()))
    }

    /// The slug text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Trim Me  "), "trim-me");
        assert_eq!(slugify("a -- b __ c"), "a-b-c");
        assert_eq!(slugify("Nike Air-Max 90"), "nike-air-max-90");
    }

    #[test]
    fn test_slugify_strips_edges() {
        assert_eq!(slugify("--Already--"), "already");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_is_idempotent() {
        let inputs = [
            "Hello World",
            "  Summer Sale: 50% Off!  ",
            "ÉCOLE Française",
            "already-a-slug",
            "MiXeD---case___input",
            "日本 語",
            "",
        ];
        for input in inputs {
            let once = slugify(input);
            assert_eq!(slugify(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_slug_parse_requires_canonical_form() {
        assert!(Slug::parse("hello-world").is_ok());
        assert_eq!(Slug::parse("Hello-World"), Err(SlugError::NotCanonical));
        assert_eq!(Slug::parse("a--b"), Err(SlugError::NotCanonical));
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
    }

    #[test]
    fn test_slug_from_name() {
        let slug = Slug::from_name("Running Shoes");
        assert_eq!(slug.map(|s| s.to_string()), Ok("running-shoes".to_string()));
        assert_eq!(Slug::from_name("???"), Err(SlugError::Empty));
    }
}
