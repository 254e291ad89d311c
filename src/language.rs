//! ISO 639 language code helpers.
//!
//! Mode files are named with two or three letter codes (`en-es.mode`,
//! `sme-nob.mode`), while lookups key on three letter codes. Both sides go
//! through [`pair_key`] so registration and lookup agree.

use isolang::Language;

/// Separator between the two codes of a pair key
pub const PAIR_ARROW: &str = " → ";

/// Normalize a language code to three letters.
///
/// ISO 639-1 codes map to their three letter equivalent. Three letter codes
/// and codes isolang does not know are returned lowercased and otherwise
/// unchanged, so applying this twice is the same as applying it once.
pub fn to_iso3(code: &str) -> String {
    let code = code.trim().to_lowercase();
    if code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&code) {
            return lang.to_639_3().to_string();
        }
    }
    code
}

/// Canonical registry key for a language pair: `"<src3> → <tgt3>"`
pub fn pair_key(source: &str, target: &str) -> String {
    format!("{}{}{}", to_iso3(source), PAIR_ARROW, to_iso3(target))
}

/// English name of a language, if known
pub fn language_name(code: &str) -> Option<&'static str> {
    Language::from_639_3(&to_iso3(code)).map(|lang| lang.to_name())
}
