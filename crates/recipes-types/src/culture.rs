use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Display language resolved for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Culture {
    #[default]
    En,
    Zh,
}

impl Culture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Culture::En => "en",
            Culture::Zh => "zh",
        }
    }

    /// Interprets explicit `lang` request parameter, anything unknown means English
    pub fn from_lang_param(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "zh" | "cn" | "chinese" => Culture::Zh,
            _ => Culture::En,
        }
    }

    /// Interprets value of stored `lang` cookie
    pub fn from_cookie(value: &str) -> Self {
        if value == "zh" {
            Culture::Zh
        } else {
            Culture::En
        }
    }

    /// Picks localized value, falling back to primary when mirror is missing or empty
    pub fn pick<'a>(&self, primary: &'a str, mirror: Option<&'a str>) -> &'a str {
        match (self, mirror) {
            (Culture::Zh, Some(m)) if !m.trim().is_empty() => m,
            _ => primary,
        }
    }
}

impl Display for Culture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Culture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Culture::En),
            "zh" => Ok(Culture::Zh),
            other => Err(format!("Unsupported culture: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lang_param() {
        assert_eq!(Culture::from_lang_param("zh"), Culture::Zh);
        assert_eq!(Culture::from_lang_param("CN"), Culture::Zh);
        assert_eq!(Culture::from_lang_param("chinese"), Culture::Zh);
        assert_eq!(Culture::from_lang_param("de"), Culture::En);
        assert_eq!(Culture::from_lang_param(""), Culture::En);
    }

    #[test]
    fn test_cookie() {
        assert_eq!(Culture::from_cookie("zh"), Culture::Zh);
        assert_eq!(Culture::from_cookie("cn"), Culture::En);
    }

    #[test]
    fn test_pick() {
        assert_eq!(Culture::Zh.pick("Soup", Some("汤")), "汤");
        assert_eq!(Culture::Zh.pick("Soup", Some("  ")), "Soup");
        assert_eq!(Culture::Zh.pick("Soup", None), "Soup");
        assert_eq!(Culture::En.pick("Soup", Some("汤")), "Soup");
    }
}
