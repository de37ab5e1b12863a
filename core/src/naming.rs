//! Singular names for collection attributes.
//!
//! Item-level methods are named after the singular form of the collection
//! attribute (`items` -> `with_item`). When no distinct singular form can be
//! found, or it collides with another attribute, `<attr>_item` is used.

const IRREGULAR: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("criteria", "criterion"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("leaves", "leaf"),
    ("knives", "knife"),
    ("lives", "life"),
    ("wolves", "wolf"),
];

/// Best-effort English singular of a plural noun; `None` if `word` does not look plural.
pub fn singularize(word: &str) -> Option<String> {
    // Only the final segment of snake_case names is inflected.
    let (prefix, last) = match word.rfind('_') {
        Some(pos) => word.split_at(pos + 1),
        None => ("", word),
    };
    let singular = singularize_word(last)?;
    if singular.is_empty() || singular == last {
        return None;
    }
    Some(format!("{}{}", prefix, singular))
}

fn singularize_word(word: &str) -> Option<String> {
    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == word) {
        return Some((*singular).to_string());
    }
    let strip = |suffix: &str, replacement: &str| {
        word.strip_suffix(suffix)
            .filter(|stem| !stem.is_empty())
            .map(|stem| format!("{}{}", stem, replacement))
    };

    if word.ends_with("ies") && word.len() > 4 {
        return strip("ies", "y");
    }
    if word.ends_with("yses") {
        return strip("yses", "ysis");
    }
    for suffix in ["sses", "shes", "ches", "xes", "zzes", "uses"] {
        if word.ends_with(suffix) {
            return strip("es", "");
        }
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return None;
    }
    strip("s", "")
}

/// Item name for collection attribute `attr`, avoiding names already taken.
pub fn item_name(attr: &str, taken: &[&str]) -> String {
    match singularize(attr) {
        Some(singular) if !taken.contains(&singular.as_str()) => singular,
        _ => format!("{}_item", attr),
    }
}
