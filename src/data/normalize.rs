use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::model::CellValue;

/// Comparison form of free text: lower-cased, accents stripped, trimmed.
///
/// `"  Água "`, `"agua"` and `"AGUA"` all normalize to `"agua"`. The function
/// is total and idempotent; the original string is kept elsewhere for display.
pub fn normalize(text: &str) -> String {
    // Lower-case first: some lower-case mappings introduce combining marks
    // (`İ` → `i\u{307}`) that the decomposition pass must still see.
    let decomposed: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    decomposed.trim().to_string()
}

/// [`normalize`] applied to the string form of a cell (`Null` → `""`).
pub fn normalize_value(value: &CellValue) -> String {
    match value {
        CellValue::Text(s) => normalize(s),
        CellValue::Null => String::new(),
        other => normalize(&other.to_string()),
    }
}
