use anyhow::{Result, anyhow};
use recipes_dal::recipe::Recipe;
use reqwest::Url;
use serde_json::{Value, json};
use tracing::info;

/// 1x1 transparent PNG
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub fn recipe_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{title} description"),
        "ingredients": "flour\nwater",
        "instructions": "mix\nbake",
        "prepTimeMinutes": 10,
        "cookTimeMinutes": 20,
        "category": "Test",
    })
}

pub async fn create_recipe(
    client: &reqwest::Client,
    base_url: &Url,
    payload: &Value,
) -> Result<Recipe> {
    let api_url = base_url.join("api/recipes")?;
    let response = client.post(api_url).json(payload).send().await?;
    info!("Create response: {:#?}", response);
    if response.status().as_u16() != 201 {
        return Err(anyhow!("Unexpected status {}", response.status()));
    }
    let recipe: Recipe = response.json().await?;
    Ok(recipe)
}

pub async fn get_recipe(client: &reqwest::Client, base_url: &Url, id: i64) -> Result<Recipe> {
    let url = base_url.join(&format!("api/recipes/{id}"))?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(anyhow!("Unexpected status {}", response.status()));
    }
    Ok(response.json().await?)
}

pub async fn upload_png(
    client: &reqwest::Client,
    base_url: &Url,
    id: i64,
    file_name: &str,
) -> Result<reqwest::Response> {
    let url = base_url.join(&format!("api/recipes/{id}/image"))?;
    let part = reqwest::multipart::Part::bytes(TINY_PNG.to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")?;
    let form = reqwest::multipart::Form::new().part("file", part);
    Ok(client.post(url).multipart(form).send().await?)
}
