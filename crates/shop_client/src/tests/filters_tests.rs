use super::*;

#[test]
fn formats_known_currencies_with_symbol() {
    assert_eq!(format_money("85.00", "USD"), "$85.00");
    assert_eq!(format_money(12, "GBP"), "£12");
    assert_eq!(format_money("40.00", "EUR"), "40.00 EUR");
}

#[test]
fn pluralizes_everything_but_one() {
    assert_eq!(pluralize(0), "s");
    assert_eq!(pluralize(1), "");
    assert_eq!(pluralize(7), "s");
}

#[test]
fn linebreaks_passes_text_through() {
    assert_eq!(linebreaks("one\ntwo"), "one\ntwo");
}

#[test]
fn highlights_every_occurrence_case_insensitively() {
    assert_eq!(
        highlight("ann", "Anna and Joanne", None, None).as_deref(),
        Some("<mark class='highlight'>Ann</mark>a and Jo<mark class='highlight'>ann</mark>e")
    );
    assert_eq!(
        highlight("x", "axbx", Some("["), Some("]")).as_deref(),
        Some("a[x]b[x]")
    );
    assert_eq!(
        highlight("zzz", "Anna", None, None).as_deref(),
        Some("Anna")
    );
}

#[test]
fn empty_needle_highlights_nothing() {
    assert_eq!(highlight("", "Anna", None, None), None);
}

#[test]
fn highlight_maps_matches_back_through_case_expansion() {
    // 'İ' lowercases to two chars and the Kelvin sign to plain 'k', so byte
    // offsets in the lowered text differ from the original.
    assert_eq!(
        highlight("k", "İİ\u{212A}", Some("["), Some("]")).as_deref(),
        Some("İİ[\u{212A}]")
    );
    assert_eq!(
        highlight("ada", "İADA", Some("["), Some("]")).as_deref(),
        Some("İ[ADA]")
    );
}

#[test]
fn highlight_skips_matches_inside_one_expanded_char() {
    assert_eq!(
        highlight("i", "İ", Some("["), Some("]")).as_deref(),
        Some("İ")
    );
}

#[test]
fn slugifies_event_names() {
    assert_eq!(slugify("Lindy Focus 2015!", DEFAULT_SLUG_MAX_LEN), "lindy-focus-2015");
    assert_eq!(slugify("  Swing -- Out  ", DEFAULT_SLUG_MAX_LEN), "swing-out");
    assert_eq!(slugify("abc def", 4), "abc-");
}

#[test]
fn slug_downcodes_accents_and_drops_stop_words() {
    assert_eq!(slugify("The Big Dance of Café", DEFAULT_SLUG_MAX_LEN), "big-dance-cafe");
    assert_eq!(slugify("Balboa at the Beach", DEFAULT_SLUG_MAX_LEN), "balboa-beach");
    assert_eq!(slugify("Rock-a-billy Weekend", DEFAULT_SLUG_MAX_LEN), "rock-billy-weekend");
    assert_eq!(slugify("Anatomy Of Łódź", DEFAULT_SLUG_MAX_LEN), "anatomy-lodz");
    assert_eq!(slugify("Straße Ball ♪", DEFAULT_SLUG_MAX_LEN), "strasse-ball");
}
