//! # Scripture Reference Module
//!
//! Turns free-form human references ("John 3:16", "1 Corinthians 13",
//! "Genesis") into canonical USFM identifiers.
//!
//! ## Overview
//!
//! - [`books`]: the static English book name → USFM code table
//! - [`reference`]: the reference parser and USFM formatting helpers
//!
//! Parsing never fails. Input without a chapter number is still parsed (with
//! chapter 1 / verse 1 defaults) but is flagged as incomplete so callers can
//! ask the user for a chapter before touching the network.

pub mod books;
pub mod reference;

pub use books::{usfm_book_code, BookEntry, BOOKS};
pub use reference::{verse_number_from_usfm, Reference};
