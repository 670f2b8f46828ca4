//! Canonical slug derivation for catalogue items.
//!
//! A slug is the stable, URL-safe external identity of a product. It is
//! derived from the display name: Latin letters and digits pass through,
//! Cyrillic letters are transliterated with a fixed table, and everything
//! else becomes a word separator.
//!
//! The transliteration table is part of the persisted data format. Changing a
//! single entry changes the slug of every product whose name contains that
//! letter, so existing rows would no longer round-trip.

/// Slug returned when a name has no representable characters.
pub const SLUG_FALLBACK: &str = "item";

/// Transliterate one lower-case Cyrillic letter.
///
/// Hard and soft signs map to the empty string and vanish from the slug.
const fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' | 'э' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' | 'ы' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}

/// Simple one-to-one case mapping.
///
/// `İ` folds to a plain `i`; `str::to_lowercase` would expand it to `i` plus
/// a combining dot and split the word.
fn lower(c: char) -> char {
    if c == '\u{130}' {
        return 'i';
    }
    let mut lowered = c.to_lowercase();
    match (lowered.next(), lowered.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// Derive the canonical slug for a name.
///
/// Deterministic and total: the result only contains `a-z`, `0-9`, and single
/// interior hyphens, and is never empty.
///
/// ```
/// use trattoria_core::slugify;
///
/// assert_eq!(slugify("Маргарита"), "margarita");
/// assert_eq!(slugify("  Four Cheese!! "), "four-cheese");
/// assert_eq!(slugify("***"), "item");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered: String = name.chars().map(lower).collect();

    let mut spaced = String::with_capacity(lowered.len());
    for c in lowered.trim().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ' || c == '-' {
            spaced.push(c);
        } else if let Some(latin) = transliterate(c) {
            spaced.push_str(latin);
        } else {
            spaced.push(' ');
        }
    }

    let mut slug = String::with_capacity(spaced.len());
    for c in spaced.chars() {
        let c = if c == ' ' { '-' } else { c };
        if c == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        SLUG_FALLBACK.to_owned()
    } else {
        slug
    }
}

/// Append a disambiguating suffix to a base slug.
///
/// ```
/// use trattoria_core::with_suffix;
///
/// assert_eq!(with_suffix("margarita", "1f3a9c0e"), "margarita-1f3a9c0e");
/// ```
#[must_use]
pub fn with_suffix(base: &str, suffix: &str) -> String {
    format!("{base}-{suffix}")
}
