use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{
    error::{Error, Result},
    Language,
};

const API_VERSION: &str = "3.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const REGION_HEADER: &str = "Ocp-Apim-Subscription-Region";

#[derive(Debug, Serialize)]
struct TextItem<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslationItem {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// Client of Azure Translator text API v3
#[derive(Clone)]
pub struct AzureTranslator {
    client: reqwest::Client,
    key: String,
    region: String,
    translate_url: Url,
}

impl AzureTranslator {
    pub fn new(key: impl Into<String>, region: impl Into<String>, endpoint: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let mut endpoint = endpoint;
        if !endpoint.path().ends_with('/') {
            endpoint.set_path(&format!("{}/", endpoint.path()));
        }
        let translate_url = endpoint.join("translate")?;
        Ok(AzureTranslator {
            client,
            key: key.into(),
            region: region.into(),
            translate_url,
        })
    }

    pub async fn translate(&self, text: &str, from: Language, to: Language) -> Result<String> {
        let mut url = self.translate_url.clone();
        url.query_pairs_mut()
            .append_pair("api-version", API_VERSION)
            .append_pair("from", from.provider_code())
            .append_pair("to", to.provider_code());

        let response = self
            .client
            .post(url)
            .header(KEY_HEADER, &self.key)
            .header(REGION_HEADER, &self.region)
            .json(&[TextItem { text }])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProviderError { status, body });
        }

        let items: Vec<TranslationItem> = response.json().await?;
        debug!("Translated {} chars from {from} to {to}", text.len());
        items
            .into_iter()
            .next()
            .and_then(|item| item.translations.into_iter().next())
            .map(|t| t.text)
            .ok_or(Error::InvalidResponse("no translation in response"))
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::Query, http::HeaderMap, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tracing_test::traced_test;

    use super::*;

    async fn fake_translate(
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
        Json(body): Json<Value>,
    ) -> Result<Json<Value>, axum::http::StatusCode> {
        if headers.get(KEY_HEADER).and_then(|v| v.to_str().ok()) != Some("secret") {
            return Err(axum::http::StatusCode::UNAUTHORIZED);
        }
        assert_eq!(params.get("api-version").map(String::as_str), Some("3.0"));
        let to = params.get("to").cloned().unwrap_or_default();
        let text = body[0]["Text"].as_str().unwrap_or_default();
        Ok(Json(json!([{"translations": [{"text": format!("[{to}] {text}"), "to": to}]}])))
    }

    async fn start_server() -> Url {
        let app = Router::new().route("/translate", post(fake_translate));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_translate() {
        let endpoint = start_server().await;
        let translator = AzureTranslator::new("secret", "westeurope", endpoint.clone()).unwrap();
        let res = translator
            .translate("Tomato soup", Language::En, Language::Zh)
            .await
            .unwrap();
        assert_eq!(res, "[zh-Hans] Tomato soup");

        let translator = AzureTranslator::new("wrong", "westeurope", endpoint).unwrap();
        let res = translator
            .translate("Tomato soup", Language::En, Language::Zh)
            .await;
        assert!(matches!(res, Err(Error::ProviderError { status, .. }) if status == 401));
    }
}
