// Entity name handling: plural forms and case-insensitive matching
/// Placeholder entity for references whose table cannot be determined.
pub const UNKNOWN_ENTITY: &str = "Unknown/Contextual";

/// (suffix, plural suffix), first match wins.
const PLURALIZATION_RULES: &[(&str, &str)] = &[
    ("y", "ies"),
    ("s", "ses"),
    ("sh", "shes"),
    ("ch", "ches"),
    ("x", "xes"),
    ("z", "zes"),
];

fn ends_with_ci(name: &str, suffix: &str) -> bool {
    let Some(start) = name.len().checked_sub(suffix.len()) else {
        return false;
    };
    name.is_char_boundary(start) && name[start..].eq_ignore_ascii_case(suffix)
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Basic English pluralization of a singular logical name.
///
/// Flow definitions store the plural form on triggers and the singular
/// form on most actions, so matching has to try both.
pub fn pluralize(singular: &str) -> String {
    if singular.trim().is_empty() {
        return singular.to_string();
    }

    if ends_with_ci(singular, "y") {
        let stem = &singular[..singular.len() - 1];
        match stem.chars().last() {
            Some(c) if !is_vowel(c) => return format!("{}ies", stem),
            // "day" -> "days", not "dayies"
            Some(_) => return format!("{}s", singular),
            None => {}
        }
    }

    for (suffix, plural_suffix) in PLURALIZATION_RULES {
        if !ends_with_ci(singular, suffix) {
            continue;
        }
        if ends_with_ci(singular, plural_suffix) {
            return singular.to_string();
        }
        let tail = plural_suffix.strip_prefix(suffix).unwrap_or(plural_suffix);
        return format!("{}{}", singular, tail);
    }

    if ends_with_ci(singular, "s") {
        singular.to_string()
    } else {
        format!("{}s", singular)
    }
}

pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// A requested entity in both of its surface forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityName {
    singular: String,
    plural: String,
}

impl EntityName {
    pub fn new(singular: &str) -> Self {
        let singular = singular.trim().to_string();
        let plural = pluralize(&singular);
        Self { singular, plural }
    }

    pub fn singular(&self) -> &str {
        &self.singular
    }

    /// Case-insensitive match against either form.
    pub fn matches(&self, candidate: &str) -> bool {
        eq_ignore_case(candidate, &self.singular) || eq_ignore_case(candidate, &self.plural)
    }

    /// Guess the entity from a parameter key that embeds `_<entity>_`.
    ///
    /// Weak heuristic: keys rarely carry the table name, and an unrelated
    /// key can contain it by accident.
    pub fn infer_from_parameter(&self, parameter_key: &str) -> &str {
        let key = parameter_key.to_lowercase();
        let singular = format!("_{}_", self.singular.to_lowercase());
        let plural = format!("_{}_", self.plural.to_lowercase());
        if key.contains(&singular) || key.contains(&plural) {
            &self.singular
        } else {
            UNKNOWN_ENTITY
        }
    }
}
