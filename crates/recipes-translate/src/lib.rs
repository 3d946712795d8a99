#![allow(async_fn_in_trait)]
//! Machine translation of recipe texts
//!
//! Translation is best effort - when the provider is not configured or fails,
//! callers just get `None` and carry on.

pub mod azure;
pub mod config;
pub mod error;

use std::fmt::Display;

pub use azure::AzureTranslator;
pub use config::TranslatorConfig;
pub use error::{Error, Result};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    En,
    Zh,
}

impl Language {
    /// Code used by translation provider
    pub fn provider_code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh-Hans",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.provider_code())
    }
}

pub trait Translate {
    fn is_configured(&self) -> bool;
    /// Translated text or `None` if translation is not available
    async fn translate(&self, text: &str, from: Language, to: Language) -> Option<String>;
}

/// Translator chosen by configuration
#[derive(Clone)]
pub enum Translator {
    Disabled,
    Azure(AzureTranslator),
}

impl Translator {
    pub fn from_config(config: &TranslatorConfig) -> Self {
        match (config.key(), config.region()) {
            (Some(key), Some(region)) => {
                match AzureTranslator::new(key, region, config.endpoint.clone()) {
                    Ok(translator) => {
                        info!("Translator configured with endpoint {}", config.endpoint);
                        Translator::Azure(translator)
                    }
                    Err(e) => {
                        error!("Failed to configure translator: {e}");
                        Translator::Disabled
                    }
                }
            }
            _ => {
                warn!("Translator not configured - missing key or region");
                Translator::Disabled
            }
        }
    }
}

impl Translate for Translator {
    fn is_configured(&self) -> bool {
        matches!(self, Translator::Azure(_))
    }

    async fn translate(&self, text: &str, from: Language, to: Language) -> Option<String> {
        match self {
            Translator::Disabled => None,
            Translator::Azure(translator) => {
                if text.trim().is_empty() {
                    return None;
                }
                translator
                    .translate(text, from, to)
                    .await
                    .inspect_err(|e| error!("Translation from {from} to {to} failed: {e}"))
                    .ok()
                    .filter(|t| !t.trim().is_empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_codes() {
        assert_eq!(Language::Zh.provider_code(), "zh-Hans");
        assert_eq!(Language::En.to_string(), "en");
    }

    #[tokio::test]
    async fn test_disabled() {
        let config = TranslatorConfig::new(Some("key".into()), None);
        let translator = Translator::from_config(&config);
        assert!(!translator.is_configured());
        assert!(translator
            .translate("Soup", Language::En, Language::Zh)
            .await
            .is_none());
    }
}
