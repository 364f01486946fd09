//! Text normalization helpers shared by the enrichers

/// Upper-case the first letter of every word
///
/// A word starts at the beginning of the string or after any character that
/// is not a letter, digit or underscore. Other characters are kept as-is.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;

    for ch in raw.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !(ch.is_alphanumeric() || ch == '_');
    }

    out
}

/// Lower-case a flavor text and turn newlines and form feeds into spaces
pub fn normalize_flavor_text(raw: &str) -> String {
    raw.to_lowercase().replace(['\n', '\x0c'], " ")
}

/// Numeric id at the end of a resource URL
///
/// `https://pokeapi.co/api/v2/pokemon-species/133/` → `Some(133)`
pub fn trailing_id(url: &str) -> Option<u32> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}
