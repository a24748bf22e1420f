// Supported display languages for monster names.

use serde::{Deserialize, Serialize};

/// A language the catalog API can localize monster names into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English (the default for users with no stored preference).
    En,
    /// Traditional Chinese.
    ZhHant,
}

impl Language {
    /// All selectable languages, in menu order.
    pub const ALL: [Language; 2] = [Language::En, Language::ZhHant];

    /// The code stored in the database and used in catalog URLs.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::ZhHant => "zh-Hant",
        }
    }

    /// Human-readable name shown in the language menu.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::ZhHant => "正體中文",
        }
    }

    /// Parse a stored or submitted language code. Unknown codes are rejected;
    /// callers that read from storage fall back to the default instead.
    pub fn parse(code: &str) -> Option<Language> {
        match code {
            "en" => Some(Language::En),
            "zh-Hant" => Some(Language::ZhHant),
            _ => None,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
