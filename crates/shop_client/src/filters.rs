//! Display helpers shared by the shop views.

use std::{fmt::Display, sync::LazyLock};

use regex::Regex;

const DEFAULT_HIGHLIGHT_OPEN: &str = "<mark class='highlight'>";
const DEFAULT_HIGHLIGHT_CLOSE: &str = "</mark>";
pub const DEFAULT_SLUG_MAX_LEN: usize = 50;

fn currency_symbol(currency: &str) -> Option<&'static str> {
    match currency {
        "USD" => Some("$"),
        "GBP" => Some("£"),
        _ => None,
    }
}

pub fn format_money(amount: impl Display, currency: &str) -> String {
    match currency_symbol(currency) {
        Some(symbol) => format!("{symbol}{amount}"),
        None => format!("{amount} {currency}"),
    }
}

pub fn pluralize(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Descriptions are rendered verbatim for now.
pub fn linebreaks(text: &str) -> &str {
    text
}

/// Wraps every case-insensitive occurrence of `needle` in `haystack`.
/// Returns `None` for an empty needle.
pub fn highlight(
    needle: &str,
    haystack: &str,
    open_tag: Option<&str>,
    close_tag: Option<&str>,
) -> Option<String> {
    if needle.is_empty() {
        return None;
    }
    let open = open_tag.unwrap_or(DEFAULT_HIGHLIGHT_OPEN);
    let close = close_tag.unwrap_or(DEFAULT_HIGHLIGHT_CLOSE);

    let needle = needle.to_lowercase();
    // Lowercasing can change byte lengths outside ASCII, so every original
    // char boundary is mapped to its offset in the lowered text.
    let mut lowered = String::with_capacity(haystack.len());
    let mut boundaries = Vec::with_capacity(haystack.len() + 1);
    for (offset, c) in haystack.char_indices() {
        boundaries.push((lowered.len(), offset));
        lowered.extend(c.to_lowercase());
    }
    boundaries.push((lowered.len(), haystack.len()));
    let original_offset = |lowered_offset: usize| {
        boundaries
            .binary_search_by_key(&lowered_offset, |&(lowered, _)| lowered)
            .ok()
            .map(|idx| boundaries[idx].1)
    };

    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    for (pos, _) in lowered.match_indices(&needle) {
        // Matches that start or end inside a single char's lowercase
        // expansion are left unhighlighted.
        let (Some(start), Some(end)) = (original_offset(pos), original_offset(pos + needle.len()))
        else {
            continue;
        };
        out.push_str(&haystack[cursor..start]);
        out.push_str(open);
        out.push_str(&haystack[start..end]);
        out.push_str(close);
        cursor = end;
    }
    out.push_str(&haystack[cursor..]);
    Some(out)
}

static SLUG_STOP_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?-u:\b)(?:a|an|as|at|before|but|by|for|from|is|in|into|like|of|off|on|onto|per|since|than|the|this|that|to|up|via|with)(?-u:\b)",
    )
    .expect("invalid slug stop word regex")
});

static SLUG_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]+").expect("invalid slug separator regex"));

/// ASCII replacement for accented Latin letters. Anything without a
/// replacement is stripped later by [`slugify`].
fn downcode(c: char) -> Option<&'static str> {
    Some(match c {
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ą' => "A",
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ą' => "a",
        'Æ' => "AE",
        'æ' => "ae",
        'Ç' | 'Ć' | 'Č' => "C",
        'ç' | 'ć' | 'č' => "c",
        'Ð' | 'Ď' => "D",
        'ð' | 'ď' => "d",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ę' | 'Ě' => "E",
        'è' | 'é' | 'ê' | 'ë' | 'ę' | 'ě' => "e",
        'Ğ' => "G",
        'ğ' => "g",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'İ' => "I",
        'ì' | 'í' | 'î' | 'ï' | 'ı' => "i",
        'Ł' => "L",
        'ł' => "l",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ñ' | 'ń' | 'ň' => "n",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ő' | 'Ø' => "O",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ő' | 'ø' => "o",
        'Ř' => "R",
        'ř' => "r",
        'Ś' | 'Ş' | 'Š' => "S",
        'ś' | 'ş' | 'š' => "s",
        'ß' => "ss",
        'Ť' => "T",
        'ť' => "t",
        'Þ' => "TH",
        'þ' => "th",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ű' | 'Ů' => "U",
        'ù' | 'ú' | 'û' | 'ü' | 'ű' | 'ů' => "u",
        'Ý' | 'Ÿ' => "Y",
        'ý' | 'ÿ' => "y",
        'Ź' | 'Ż' | 'Ž' => "Z",
        'ź' | 'ż' | 'ž' => "z",
        '©' => "(c)",
        _ => return None,
    })
}

/// Slug prepopulated from an event name: accents are downcoded, English
/// stop words dropped, anything but `[-\w\s]` stripped, separator runs
/// collapsed to `-`, then the result is lowercased and cut to `max_len`
/// chars.
pub fn slugify(text: &str, max_len: usize) -> String {
    let mut downcoded = String::with_capacity(text.len());
    for c in text.chars() {
        match downcode(c) {
            Some(ascii) => downcoded.push_str(ascii),
            None => downcoded.push(c),
        }
    }

    let without_stop_words = SLUG_STOP_WORDS.replace_all(&downcoded, "");
    let kept: String = without_stop_words
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    let slug = SLUG_SEPARATORS
        .replace_all(kept.trim(), "-")
        .to_ascii_lowercase();
    slug.chars().take(max_len).collect()
}

#[cfg(test)]
#[path = "tests/filters_tests.rs"]
mod tests;
