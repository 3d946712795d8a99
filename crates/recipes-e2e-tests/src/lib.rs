use std::{collections::HashMap, path::Path, time::Duration};

use anyhow::{Result, anyhow};
use axum::{Json, Router, extract::Query, routing::post};
use rand::Rng as _;
use recipes_server::config::{Parser, ServerConfig};
use reqwest::Url;
use serde_json::{Value, json};
use tempfile::TempDir;
use tracing::{debug, info};

pub mod rest;

pub const ADMIN_EMAIL: &str = "admin@recipes.local";
pub const ADMIN_PASSWORD: &str = "Admin123!";

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, std::time::Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    data_dir: TempDir,
}

impl ConfigGuard {
    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }
}

pub fn test_config(
    test_name: &str,
    base_dir: &Path,
    extra_args: &[&str],
) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let mut args: Vec<&str> = vec![
        "recipes-e2e-tests",
        "--data-dir",
        &data_dir,
        "--port",
        &port,
        "--seed-admin-email",
        ADMIN_EMAIL,
        "--seed-admin-password",
        ADMIN_PASSWORD,
        "--no-sample-recipes",
    ];
    args.extend_from_slice(extra_args);
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

pub async fn prepare_env(test_name: &str) -> Result<(ServerConfig, ConfigGuard)> {
    prepare_env_with_args(test_name, &[]).await
}

pub async fn prepare_env_with_args(
    test_name: &str,
    extra_args: &[&str],
) -> Result<(ServerConfig, ConfigGuard)> {
    let base_dir = std::env::temp_dir();
    test_config(test_name, &base_dir, extra_args)
}

pub fn base_url(args: &ServerConfig) -> Url {
    // base url is always valid, as it is built from parsed address and port
    Url::parse(&args.base_url()).unwrap()
}

pub fn extend_url(url: &Url, segment: impl ToString) -> Url {
    let mut url = url.clone();
    url.path_segments_mut()
        .unwrap()
        .pop_if_empty()
        .push(&segment.to_string());
    url
}

/// Starts server in background and waits until it responds
pub async fn spawn_server(args: ServerConfig) -> Result<()> {
    let health_url = base_url(&args).join("health")?;
    tokio::spawn(async move {
        if let Err(e) = recipes_server::run(args).await {
            tracing::error!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    for _ in 0..50 {
        match client.get(health_url.clone()).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Server is ready");
                return Ok(());
            }
            _ => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }
    Err(anyhow!("Server did not start"))
}

pub fn new_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

pub async fn login(
    client: &reqwest::Client,
    base_url: &Url,
    email: &str,
    password: &str,
) -> Result<String> {
    let url = base_url.join("auth/login")?;
    let response = client
        .post(url)
        .json(&json!({"email": email, "password": password}))
        .send()
        .await?;
    info!("Login response: {:#?}", response);
    if !response.status().is_success() {
        return Err(anyhow!("Login failed with status {}", response.status()));
    }
    Ok(response.text().await?)
}

/// Starts server and returns client logged in as administrator together with its token
pub async fn launch_env(args: ServerConfig) -> Result<(reqwest::Client, String)> {
    let base_url = base_url(&args);
    spawn_server(args).await?;
    let client = new_client();
    let token = login(&client, &base_url, ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    Ok((client, token))
}

async fn mock_translate(
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let to = params.get("to").cloned().unwrap_or_default();
    let text = body[0]["Text"].as_str().unwrap_or_default();
    Json(json!([{"translations": [{"text": format!("[{to}] {text}"), "to": to}]}]))
}

/// Translation provider answering `[<target language>] <text>`
pub async fn start_mock_translator() -> Result<Url> {
    let app = Router::new().route("/translate", post(mock_translate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app).await });
    Ok(Url::parse(&format!("http://{addr}"))?)
}
