//! Hex colors for brand theming.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing a color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("color must be a hex value like #1a2b3c")]
    InvalidHex,
}

/// A `#rrggbb` color, stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    /// Parse a color picker value.
    ///
    /// # Errors
    ///
    /// Returns `ColorError::InvalidHex` unless the input is `#` followed by
    /// exactly six hex digits.
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        let input = input.trim();
        let digits = input.strip_prefix('#').ok_or(ColorError::InvalidHex)?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidHex);
        }
        Ok(Self(input.to_ascii_lowercase()))
    }

    /// The color text, including the leading `#`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}
