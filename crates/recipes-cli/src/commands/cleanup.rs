use std::{
    collections::HashSet,
    path::Path,
    time::{Duration, SystemTime},
};

use clap::{ArgGroup, Args, Parser};
use recipes_store::ImageStore;
use recipes_types::config::{BackendConfig, IMAGES_URL_PREFIX};
use tracing::{debug, warn};

use crate::commands::{create_recipe_repository, Executor};

#[derive(Parser, Debug)]
pub struct CleanupCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[command(flatten)]
    work: WorkSelection,
    #[arg(long, help = "Only print what would be deleted")]
    dry_run: bool,
    #[arg(
        long,
        value_parser = humantime::parse_duration,
        default_value = "10m",
        help = "Keep files younger than this, they can be uploads not yet attached to a recipe"
    )]
    min_age: Duration,
}

#[derive(Args, Debug)]
#[command(
    group(
        ArgGroup::new("work")
            .required(true)
            .args(["images", "all"])
    )
)]
pub struct WorkSelection {
    #[arg(long, help = "Delete image files not referenced by any recipe")]
    images: bool,
    #[arg(long, help = "Do all cleanup tasks")]
    all: bool,
}

/// Stored file names not referenced by any of urls
pub fn orphan_images(store: &ImageStore, files: Vec<String>, urls: &[String]) -> Vec<String> {
    let referenced: HashSet<String> = urls.iter().filter_map(|u| store.file_name(u)).collect();
    files
        .into_iter()
        .filter(|name| !referenced.contains(name))
        .collect()
}

/// Files last modified at least `min_age` before `now`, unreadable files are skipped
pub async fn settled_files(
    root: &Path,
    names: Vec<String>,
    min_age: Duration,
    now: SystemTime,
) -> Vec<String> {
    let mut settled = Vec::with_capacity(names.len());
    for name in names {
        let modified = match tokio::fs::metadata(root.join(&name)).await {
            Ok(meta) => meta.modified(),
            Err(e) => Err(e),
        };
        match modified {
            Ok(modified) => {
                let age = now.duration_since(modified).unwrap_or_default();
                if age >= min_age {
                    settled.push(name);
                } else {
                    debug!("Skipping recent file {name}");
                }
            }
            Err(e) => warn!("Cannot read modification time of {name}: {e}"),
        }
    }
    settled
}

impl CleanupCmd {
    async fn cleanup_images(&self) -> anyhow::Result<()> {
        let store = ImageStore::new(self.backend.images_dir(), IMAGES_URL_PREFIX);
        let repository = create_recipe_repository(&self.backend.database_url()).await?;
        let files = store.list_files().await?;
        let files = settled_files(store.root(), files, self.min_age, SystemTime::now()).await;
        let urls = repository.image_urls().await?;
        debug!("{} settled image files, {} referenced urls", files.len(), urls.len());

        let orphans = orphan_images(&store, files, &urls);
        let mut deleted = 0;
        for name in orphans {
            if self.dry_run {
                println!("Would delete {name}");
            } else if store.delete(&store.url_for(&name)).await {
                println!("Deleted {name}");
                deleted += 1;
            }
        }
        if !self.dry_run {
            println!("Deleted {deleted} unreferenced images");
        }
        Ok(())
    }
}

impl Executor for CleanupCmd {
    async fn run(self) -> anyhow::Result<()> {
        if self.work.images || self.work.all {
            self.cleanup_images().await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_images() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path(), IMAGES_URL_PREFIX);
        let files = vec![
            "recipe-1-20240101000000-abcdef12.png".to_string(),
            "my photo-20240101000000-abcdef12.jpg".to_string(),
            "stale-20240101000000-abcdef12.gif".to_string(),
        ];
        let urls = vec![
            "/images/recipes/recipe-1-20240101000000-abcdef12.png".to_string(),
            "/images/recipes/my%20photo-20240101000000-abcdef12.jpg".to_string(),
            "https://example.com/elsewhere.png".to_string(),
        ];
        let orphans = orphan_images(&store, files, &urls);
        assert_eq!(orphans, vec!["stale-20240101000000-abcdef12.gif".to_string()]);
    }

    #[tokio::test]
    async fn test_recent_files_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fresh.png"), b"png").unwrap();
        let names = vec!["fresh.png".to_string(), "missing.png".to_string()];
        let now = SystemTime::now();

        let settled = settled_files(dir.path(), names.clone(), Duration::from_secs(600), now).await;
        assert!(settled.is_empty());

        let later = now + Duration::from_secs(3600);
        let settled = settled_files(dir.path(), names, Duration::from_secs(600), later).await;
        assert_eq!(settled, vec!["fresh.png".to_string()]);
    }

    #[test]
    fn test_min_age_arg() {
        let cmd = CleanupCmd::try_parse_from(["cleanup", "--images", "--min-age", "1h"]).unwrap();
        assert_eq!(cmd.min_age, Duration::from_secs(3600));
        let cmd = CleanupCmd::try_parse_from(["cleanup", "--all"]).unwrap();
        assert_eq!(cmd.min_age, Duration::from_secs(600));
    }
}
