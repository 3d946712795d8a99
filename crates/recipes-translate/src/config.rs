use clap::Args;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";

#[derive(Debug, Clone, Args)]
pub struct TranslatorConfig {
    #[arg(
        long = "translator-key",
        env = "RECIPES_TRANSLATOR_KEY",
        help = "Subscription key of Azure Translator, translation is disabled without it"
    )]
    key: Option<String>,

    #[arg(
        long = "translator-region",
        env = "RECIPES_TRANSLATOR_REGION",
        help = "Azure region of translator resource, translation is disabled without it"
    )]
    region: Option<String>,

    #[arg(
        long = "translator-endpoint",
        env = "RECIPES_TRANSLATOR_ENDPOINT",
        default_value = DEFAULT_ENDPOINT,
        help = "Translator API endpoint"
    )]
    pub endpoint: Url,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TranslatorConfig {
    pub fn new(key: Option<String>, region: Option<String>) -> Self {
        TranslatorConfig {
            key,
            region,
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is valid URL"),
        }
    }

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn key(&self) -> Option<&str> {
        non_empty(&self.key)
    }

    pub fn region(&self) -> Option<&str> {
        non_empty(&self.region)
    }
}
