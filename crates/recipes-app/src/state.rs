use std::sync::Arc;

use recipes_auth::token::TokenManager;
use recipes_dal::Pool;
use recipes_store::ImageStore;
use recipes_translate::Translator;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(
        app_config: AppConfig,
        pool: Pool,
        images: ImageStore,
        translator: Translator,
        tokens: TokenManager,
    ) -> Self {
        AppState {
            state: Arc::new(AppStateInner {
                pool,
                app_config,
                images,
                translator,
                tokens,
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }

    pub fn images(&self) -> &ImageStore {
        &self.state.images
    }

    pub fn translator(&self) -> &Translator {
        &self.state.translator
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.state.tokens
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
    images: ImageStore,
    translator: Translator,
    tokens: TokenManager,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub upload_limit_mb: usize,
    /// Send auth cookie only over https
    pub secure_cookies: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            upload_limit_mb: 10,
            secure_cookies: false,
        }
    }
}
