//! Core types for the catalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod color;
pub mod id;
pub mod price;
pub mod slug;
pub mod status;

pub use color::{ColorError, HexColor};
pub use id::*;
pub use price::{Price, PriceError, line_total};
pub use slug::{Slug, SlugError, slugify};
pub use status::*;
