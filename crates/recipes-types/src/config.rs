use clap::Parser;
use std::{fs, path::PathBuf};

pub const IMAGES_URL_PREFIX: &str = "/images/recipes";

#[derive(Debug, Clone, Parser)]
pub struct BackendConfig {
    #[arg(
        long,
        env = "RECIPES_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db, default is sqlite://[data-dir]/recipes.db, where data-dir is set by --data-dir"
    )]
    database_url: Option<String>,

    #[arg(
        long,
        env = "RECIPES_DATA_DIR",
        help = "Data directory (database, images, secret), default is system default like ~/.local/share/recipes",
        default_value_t = default_data_dir()
    )]
    data_dir: String,

    #[arg(
        long,
        env = "RECIPES_IMAGES_DIR",
        help = "Directory for recipe images, default data_dir/images/recipes"
    )]
    images_dir: Option<PathBuf>,
}

pub fn default_data_dir() -> String {
    let dir = dirs::data_dir()
        .map(|p| p.join("recipes"))
        .unwrap_or_else(|| PathBuf::from("recipes"));

    if !fs::exists(&dir).expect("Failed to check if data directory exists") {
        fs::create_dir_all(&dir).expect("Failed to create data directory");
    } else if !dir.is_dir() {
        panic!("Data directory is not a directory",)
    }

    dir.to_string_lossy().to_string()
}

impl BackendConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.images_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("images").join("recipes"))
    }

    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| format!("sqlite://{}/recipes.db", self.data_dir))
    }
}
