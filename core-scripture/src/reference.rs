//! Reference parsing.
//!
//! Accepted shapes, tried in order:
//!
//! | Input          | book | chapter | verse | incomplete |
//! |----------------|------|---------|-------|------------|
//! | `John 3:16`    | JHN  | 3       | 16    | no         |
//! | `John 3`       | JHN  | 3       | 1     | no         |
//! | `John`         | JHN  | 1       | 1     | **yes**    |
//!
//! The book part may start with a numeral (`1 John`), the space before the
//! chapter is optional (`John3`), and anything after the verse number
//! (`John 3:16-18`, `John 3:16a`, `John 3:16 (NIV)`) is ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::books::usfm_book_code;

/// A parsed book/chapter/verse locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    raw_text: String,
    /// Book part as the user typed it, trimmed.
    book_name: Option<String>,
    /// Canonical USFM book code.
    book: Option<String>,
    chapter: Option<u32>,
    verse: Option<u32>,
    chapter_explicit: bool,
    verse_explicit: bool,
}

impl Reference {
    /// Parse free-form reference text. Never fails.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let mut reference = Self {
            raw_text: text.to_string(),
            book_name: None,
            book: None,
            chapter: None,
            verse: None,
            chapter_explicit: false,
            verse_explicit: false,
        };

        if trimmed.is_empty() {
            return reference;
        }

        match split_locator(trimmed) {
            Some((book_name, chapter, verse)) => {
                reference.book_name = Some(book_name.to_string());
                reference.book = Some(usfm_book_code(book_name).into_owned());
                reference.chapter = Some(chapter);
                reference.chapter_explicit = true;
                reference.verse_explicit = verse.is_some();
                reference.verse = Some(verse.unwrap_or(1));
            }
            None => {
                // Book only: defaults are applied but the reference stays incomplete.
                reference.book_name = Some(trimmed.to_string());
                reference.book = Some(usfm_book_code(trimmed).into_owned());
                reference.chapter = Some(1);
                reference.verse = Some(1);
            }
        }

        reference
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn book_name(&self) -> Option<&str> {
        self.book_name.as_deref()
    }

    /// Canonical USFM book code.
    pub fn book(&self) -> Option<&str> {
        self.book.as_deref()
    }

    /// Chapter, defaulted to 1 for book-only input.
    pub fn chapter(&self) -> Option<u32> {
        self.chapter
    }

    /// Verse, defaulted to 1 when absent.
    pub fn verse(&self) -> Option<u32> {
        self.verse
    }

    pub fn has_explicit_verse(&self) -> bool {
        self.verse_explicit
    }

    /// `true` when no chapter number was present in the text.
    ///
    /// Incomplete references must not trigger any audio lookup.
    pub fn is_incomplete(&self) -> bool {
        self.book.is_none() || !self.chapter_explicit
    }

    /// `true` when book and chapter were both resolved from the text.
    pub fn is_valid_for_audio(&self) -> bool {
        !self.is_incomplete()
    }

    /// USFM chapter reference (`JHN.3`), only for complete references.
    pub fn chapter_usfm(&self) -> Option<String> {
        if self.is_incomplete() {
            return None;
        }
        let book = self.book.as_deref()?;
        let chapter = self.chapter?;
        Some(format!("{}.{}", book, chapter))
    }

    /// USFM verse identifier (`JHN.3.16`) using the defaulted chapter/verse.
    pub fn verse_usfm(&self) -> Option<String> {
        let book = self.book.as_deref()?;
        Some(format!(
            "{}.{}.{}",
            book,
            self.chapter.unwrap_or(1),
            self.verse.unwrap_or(1)
        ))
    }

    /// Human-readable label for a verse inside this reference's chapter,
    /// e.g. `"John 3:17"` for `JHN.3.17`.
    pub fn display_with_verse(&self, verse_usfm: &str) -> String {
        let book = self
            .book_name
            .as_deref()
            .unwrap_or_else(|| self.raw_text.trim());
        format!(
            "{} {}:{}",
            book,
            self.chapter.unwrap_or(1),
            verse_number_from_usfm(verse_usfm)
        )
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.book_name, self.chapter_explicit, self.verse_explicit) {
            (Some(book), true, true) => write!(
                f,
                "{} {}:{}",
                book,
                self.chapter.unwrap_or(1),
                self.verse.unwrap_or(1)
            ),
            (Some(book), true, false) => write!(f, "{} {}", book, self.chapter.unwrap_or(1)),
            (Some(book), false, _) => f.write_str(book),
            (None, _, _) => f.write_str(self.raw_text.trim()),
        }
    }
}

impl From<&str> for Reference {
    fn from(text: &str) -> Self {
        Reference::parse(text)
    }
}

/// Trailing verse number of a USFM verse id (`"JHN.3.16"` → `"16"`).
///
/// Ids without a numeric last segment are returned unchanged.
pub fn verse_number_from_usfm(usfm: &str) -> &str {
    match usfm.rsplit_once('.') {
        Some((_, last)) if !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit()) => last,
        _ => usfm,
    }
}

/// Split `"<book> <chapter>[:<verse>]..."` into its parts.
///
/// The book is the shortest leading run of text that contains a letter and is
/// followed by whitespace (or directly by a digit after a letter) and then the
/// chapter digits. Returns `None` when no chapter number follows the book name.
fn split_locator(text: &str) -> Option<(&str, u32, Option<u32>)> {
    let mut prev: Option<char> = None;
    let mut chapter_start = None;

    for (i, c) in text.char_indices() {
        let boundary = match prev {
            Some(p) => p.is_whitespace() || p.is_alphabetic(),
            None => false,
        };
        if c.is_ascii_digit() && boundary && text[..i].chars().any(char::is_alphabetic) {
            chapter_start = Some(i);
            break;
        }
        prev = Some(c);
    }

    let chapter_start = chapter_start?;
    let book = text[..chapter_start].trim_end();

    let tail = &text[chapter_start..];
    let chapter_digits = leading_digits(tail);
    let chapter: u32 = chapter_digits.parse().ok().filter(|&c| c > 0)?;

    let verse = tail[chapter_digits.len()..]
        .strip_prefix(':')
        .map(leading_digits)
        .and_then(|digits| digits.parse::<u32>().ok())
        .filter(|&v| v > 0);

    Some((book, chapter, verse))
}

fn leading_digits(s: &str) -> &str {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}
