//! Slugs for article titles.
//!
//! Titles are mostly written in Russian, so Cyrillic letters are
//! transliterated to Latin before everything else is folded into
//! `[a-z0-9-]`.

/// Cyrillic to Latin substitution table. `ъ` and `ь` have no Latin
/// counterpart and are dropped.
const CYRILLIC_TO_LATIN: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "yo"),
    ('ж', "zh"),
    ('з', "z"),
    ('и', "i"),
    ('й', "y"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "sch"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ya"),
];

fn transliterate_char(ch: char) -> Option<&'static str> {
    CYRILLIC_TO_LATIN
        .iter()
        .find(|(from, _)| *from == ch)
        .map(|(_, to)| *to)
}

/// Build a URL-safe slug from arbitrary text.
///
/// Leading and trailing dashes are trimmed, so `"  Привет, мир! "` becomes
/// `"privet-mir"`. The result may be empty.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        match transliterate_char(ch) {
            Some(latin) => slug.push_str(latin),
            None => slug.push(ch),
        }
    }

    let mut out = String::with_capacity(slug.len());
    for ch in slug.chars() {
        let ch = if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            ch
        } else {
            '-'
        };
        if ch == '-' && out.ends_with('-') {
            continue;
        }
        out.push(ch);
    }

    out.trim_matches('-').to_string()
}
