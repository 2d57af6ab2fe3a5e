//! Canonical book codes.
//!
//! One authoritative mapping from English book names to three-character USFM
//! codes. Names are matched case-insensitively with internal whitespace
//! collapsed, so `"1  corinthians"` resolves like `"1 Corinthians"`.

use std::borrow::Cow;
use tracing::trace;

/// A single row of the book table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub name: &'static str,
    pub code: &'static str,
}

const fn book(name: &'static str, code: &'static str) -> BookEntry {
    BookEntry { name, code }
}

/// English book names (plus common aliases) in canonical order.
pub const BOOKS: &[BookEntry] = &[
    // Old Testament
    book("Genesis", "GEN"),
    book("Exodus", "EXO"),
    book("Leviticus", "LEV"),
    book("Numbers", "NUM"),
    book("Deuteronomy", "DEU"),
    book("Joshua", "JOS"),
    book("Judges", "JDG"),
    book("Ruth", "RUT"),
    book("1 Samuel", "1SA"),
    book("2 Samuel", "2SA"),
    book("1 Kings", "1KI"),
    book("2 Kings", "2KI"),
    book("1 Chronicles", "1CH"),
    book("2 Chronicles", "2CH"),
    book("Ezra", "EZR"),
    book("Nehemiah", "NEH"),
    book("Esther", "EST"),
    book("Job", "JOB"),
    book("Psalms", "PSA"),
    book("Psalm", "PSA"),
    book("Proverbs", "PRO"),
    book("Ecclesiastes", "ECC"),
    book("Song of Solomon", "SNG"),
    book("Song of Songs", "SNG"),
    book("Isaiah", "ISA"),
    book("Jeremiah", "JER"),
    book("Lamentations", "LAM"),
    book("Ezekiel", "EZK"),
    book("Daniel", "DAN"),
    book("Hosea", "HOS"),
    book("Joel", "JOL"),
    book("Amos", "AMO"),
    book("Obadiah", "OBA"),
    book("Jonah", "JON"),
    book("Micah", "MIC"),
    book("Nahum", "NAM"),
    book("Habakkuk", "HAB"),
    book("Zephaniah", "ZEP"),
    book("Haggai", "HAG"),
    book("Zechariah", "ZEC"),
    book("Malachi", "MAL"),
    // New Testament
    book("Matthew", "MAT"),
    book("Mark", "MRK"),
    book("Luke", "LUK"),
    book("John", "JHN"),
    book("Acts", "ACT"),
    book("Romans", "ROM"),
    book("1 Corinthians", "1CO"),
    book("2 Corinthians", "2CO"),
    book("Galatians", "GAL"),
    book("Ephesians", "EPH"),
    book("Philippians", "PHP"),
    book("Colossians", "COL"),
    book("1 Thessalonians", "1TH"),
    book("2 Thessalonians", "2TH"),
    book("1 Timothy", "1TI"),
    book("2 Timothy", "2TI"),
    book("Titus", "TIT"),
    book("Philemon", "PHM"),
    book("Hebrews", "HEB"),
    book("James", "JAS"),
    book("1 Peter", "1PE"),
    book("2 Peter", "2PE"),
    book("1 John", "1JN"),
    book("2 John", "2JN"),
    book("3 John", "3JN"),
    book("Jude", "JUD"),
    book("Revelation", "REV"),
    // Deuterocanon
    book("Tobit", "TOB"),
    book("Judith", "JDT"),
    book("Esther (Greek)", "ESG"),
    book("Wisdom of Solomon", "WIS"),
    book("Wisdom", "WIS"),
    book("Sirach", "SIR"),
    book("Ecclesiasticus", "SIR"),
    book("Baruch", "BAR"),
    book("Letter of Jeremiah", "LJE"),
    book("Song of the Three Young Men", "S3Y"),
    book("Susanna", "SUS"),
    book("Bel and the Dragon", "BEL"),
    book("1 Maccabees", "1MA"),
    book("2 Maccabees", "2MA"),
    book("3 Maccabees", "3MA"),
    book("4 Maccabees", "4MA"),
    book("1 Esdras", "1ES"),
    book("2 Esdras", "2ES"),
    book("Prayer of Manasseh", "MAN"),
];

fn names_match(candidate: &str, input: &str) -> bool {
    let mut a = candidate.split_whitespace();
    let mut b = input.split_whitespace();
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x.eq_ignore_ascii_case(y) => continue,
            _ => return false,
        }
    }
}

/// Resolve a book name to its USFM code.
///
/// Unknown names fall back to the upper-cased input with all whitespace
/// removed (`"Foo Bar"` → `"FOOBAR"`). The fallback is lossy but never fails.
pub fn usfm_book_code(name: &str) -> Cow<'static, str> {
    if let Some(entry) = BOOKS.iter().find(|entry| names_match(entry.name, name)) {
        return Cow::Borrowed(entry.code);
    }

    let transliterated: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect();
    trace!(book = name, code = %transliterated, "Book name not in table, transliterating");
    Cow::Owned(transliterated)
}
