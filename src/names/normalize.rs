//! Name normalization
//!
//! Applied identically to both sides of a comparison:
//!
//! 1. `"Last, First"` is reordered to `"First Last"`
//! 2. case is folded
//! 3. punctuation other than apostrophes and hyphens is dropped
//! 4. trailing generational suffixes (Jr, Sr, II, III, ...) are removed;
//!    a roman numeral counts only after at least two name tokens, so the
//!    "V" in "Mary V" is kept as an initial
//! 5. whitespace is collapsed
//!
//! Apostrophes and hyphens stay inside tokens. The [`compact`] form removes
//! them so that "O'Brien" and "OBrien" can still meet.

const SUFFIXES: &[&str] = &["jr", "sr", "2nd", "3rd"];
const NUMERAL_SUFFIXES: &[&str] = &["ii", "iii", "iv", "v"];

/// Whether a token is a generational suffix
pub fn is_suffix(token: &str) -> bool {
    let bare = token.trim_end_matches('.').to_lowercase();
    SUFFIXES.contains(&bare.as_str()) || NUMERAL_SUFFIXES.contains(&bare.as_str())
}

fn is_numeral_suffix(token: &str) -> bool {
    let bare = token.trim_end_matches('.').to_lowercase();
    NUMERAL_SUFFIXES.contains(&bare.as_str())
}

/// Whether a suffix token may be dropped given the name tokens around it
fn droppable(token: &str, name_tokens: usize) -> bool {
    if is_numeral_suffix(token) {
        name_tokens >= 2
    } else {
        is_suffix(token)
    }
}

/// Normalize a name for comparison
pub fn normalize_name(raw: &str) -> String {
    let folded = raw.replace(['\u{2019}', '\u{2018}', '`'], "'").to_lowercase();

    let raw_parts: Vec<&str> = folded
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let name_tokens: Vec<usize> = raw_parts
        .iter()
        .map(|p| p.split_whitespace().filter(|t| !is_suffix(t)).count())
        .collect();
    let total: usize = name_tokens.iter().sum();

    let mut parts: Vec<String> = raw_parts
        .iter()
        .zip(&name_tokens)
        .map(|(p, own)| strip_trailing_suffixes(p, total - own))
        .collect();
    if parts.len() > 1 {
        parts.retain(|p| !p.split_whitespace().all(|t| droppable(t, total)));
    }

    let ordered = match parts.as_slice() {
        [last, first] => format!("{first} {last}"),
        _ => parts.join(" "),
    };

    let cleaned: Vec<String> = ordered
        .split_whitespace()
        .map(clean_token)
        .filter(|t| !t.is_empty())
        .collect();

    strip_trailing_suffixes(&cleaned.join(" "), 0)
}

/// Normalized name with apostrophes and hyphens removed
pub fn compact(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .map(|t| t.replace(['\'', '-'], ""))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokens of a normalized name
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

/// Pop trailing suffixes, keeping at least one token
///
/// `elsewhere` is the number of name tokens in the other comma-separated
/// parts of the same name.
fn strip_trailing_suffixes(part: &str, elsewhere: usize) -> String {
    let mut tokens: Vec<&str> = part.split_whitespace().collect();
    while tokens.len() > 1 {
        let Some(last) = tokens.last() else { break };
        if !droppable(last, tokens.len() - 1 + elsewhere) {
            break;
        }
        tokens.pop();
    }
    tokens.join(" ")
}

fn clean_token(token: &str) -> String {
    let kept: String = token
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '\'' || *c == '-')
        .collect();
    kept.trim_matches(|c| c == '\'' || c == '-').to_string()
}
