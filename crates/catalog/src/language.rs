use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A repository's primary language. Catalog entries are the languages the
/// marketplace filters on; adapters may also surface languages outside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: Cow<'static, str>,
    pub color: Cow<'static, str>,
}

impl Language {
    const fn known(name: &'static str, color: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            color: Cow::Borrowed(color),
        }
    }

    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            color: Cow::Owned(color.into()),
        }
    }
}

pub const DEFAULT_LANGUAGE_COLOR: &str = "#fff";

pub const TYPESCRIPT: Language = Language::known("TypeScript", "#3178c6");
pub const JAVASCRIPT: Language = Language::known("JavaScript", "#f1e05a");
pub const RUST: Language = Language::known("Rust", "#ce422b");
pub const PYTHON: Language = Language::known("Python", "#3572A5");
pub const GO: Language = Language::known("Go", "#00ADD8");

pub const LANGUAGE_LIST: &[Language] = &[TYPESCRIPT, JAVASCRIPT, RUST, PYTHON, GO];

pub fn find_language(name: &str) -> Option<&'static Language> {
    LANGUAGE_LIST.iter().find(|language| language.name == name)
}

pub fn language_names() -> impl Iterator<Item = &'static str> {
    LANGUAGE_LIST.iter().map(|language| language.name.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact() {
        assert_eq!(find_language("Rust"), Some(&RUST));
        assert_eq!(find_language("rust"), None);
    }

    #[test]
    fn serializes_name_and_color() {
        let value = serde_json::to_value(&GO).unwrap();
        assert_eq!(value, serde_json::json!({"name": "Go", "color": "#00ADD8"}));
    }
}
