use std::time::Duration;

use crate::error::Result;
pub use clap::Parser;
use recipes_app::state::AppConfig;
use recipes_translate::TranslatorConfig;
use recipes_types::config::BackendConfig;

/// Which cross origin requests are allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CorsPolicy {
    /// Any origin, method and header
    AllowAll,
    /// Only ChatGPT web clients
    Assistant,
    /// No CORS headers at all
    None,
}

#[derive(Debug, Clone, clap::Parser)]
pub struct ServerConfig {
    #[arg(
        short,
        long,
        default_value_t = 3000,
        env = "RECIPES_LISTEN_PORT",
        help = "Port to listen on"
    )]
    pub port: u16,
    #[arg(
        short,
        long,
        default_value = "127.0.0.1",
        env = "RECIPES_LISTEN_ADDRESS",
        help = "Address to listen on"
    )]
    pub listen_address: String,

    #[command(flatten)]
    pub backend: BackendConfig,

    #[arg(
        long,
        env = "RECIPES_TOKEN_VALIDITY",
        default_value = "1 day",
        help = "Default token validity in human friendly format (e.g. 1d, 1h, 1m, 1s - or combined)",
        value_parser = humantime::parse_duration
    )]
    pub token_validity: Duration,

    #[arg(
        long,
        env = "RECIPES_UPLOAD_LIMIT_MB",
        default_value = "10",
        help = "Maximum request body size for uploads in MB"
    )]
    pub upload_limit_mb: usize,

    #[arg(
        long,
        env = "RECIPES_SECURE_COOKIES",
        help = "Send auth cookie only over https"
    )]
    pub secure_cookies: bool,

    #[command(flatten)]
    pub translator: TranslatorConfig,

    #[arg(
        long,
        env = "RECIPES_ADMIN_EMAIL",
        help = "Email of administrator created on start, if there is no administrator yet"
    )]
    pub seed_admin_email: Option<String>,

    #[arg(
        long,
        env = "RECIPES_ADMIN_PASSWORD",
        help = "Password of administrator created on start",
        requires = "seed_admin_email"
    )]
    pub seed_admin_password: Option<String>,

    #[arg(
        long,
        env = "RECIPES_NO_SAMPLE_RECIPES",
        help = "Do not add sample recipes into empty database"
    )]
    pub no_sample_recipes: bool,

    #[arg(
        long,
        value_enum,
        env = "RECIPES_CORS",
        default_value = "allow-all",
        help = "CORS policy"
    )]
    pub cors: CorsPolicy,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        ServerConfig::try_parse().map_err(|e| e.into())
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.listen_address, self.port)
    }
}

impl From<&ServerConfig> for AppConfig {
    fn from(config: &ServerConfig) -> Self {
        AppConfig {
            upload_limit_mb: config.upload_limit_mb,
            secure_cookies: config.secure_cookies,
        }
    }
}
