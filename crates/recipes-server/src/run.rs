use std::{net::SocketAddr, path::Path};

use crate::{
    config::{CorsPolicy, ServerConfig},
    error::Result,
    seed::seed,
};
use axum::{
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::FutureExt;
use recipes_app::{
    admin,
    auth::auth_router,
    locale::resolve_locale,
    pages,
    rest_api,
    state::{AppConfig, AppState},
};
use recipes_auth::token::TokenManager;
use recipes_store::ImageStore;
use recipes_translate::Translator;
use recipes_types::config::IMAGES_URL_PREFIX;
use tokio::{fs, io::AsyncWriteExt as _};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::{debug, info};

const SECRET_LEN: usize = 32;
const ASSISTANT_ORIGINS: [&str; 2] = ["https://chat.openai.com", "https://chatgpt.com"];

pub async fn run(args: ServerConfig) -> Result<()> {
    let state = build_state(&args).await?;
    run_with_state(args, state).await
}

pub async fn run_with_state(args: ServerConfig, state: AppState) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c().map(|_| ());
    run_graceful_with_state(args, state, shutdown).await
}

pub async fn run_graceful_with_state<S>(
    args: ServerConfig,
    state: AppState,
    shutdown_signal: S,
) -> Result<()>
where
    S: std::future::Future<Output = ()> + Send + 'static,
{
    let mut app = main_router(state);
    if let Some(cors) = cors_layer(args.cors) {
        app = app.layer(cors);
    }

    let ip: std::net::IpAddr = args.listen_address.parse()?;
    let addr = SocketAddr::from((ip, args.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    info!("Server stopped");
    Ok(())
}

fn cors_layer(policy: CorsPolicy) -> Option<CorsLayer> {
    match policy {
        CorsPolicy::AllowAll => Some(CorsLayer::permissive()),
        CorsPolicy::Assistant => Some(
            CorsLayer::new()
                .allow_origin(ASSISTANT_ORIGINS.map(HeaderValue::from_static))
                .allow_methods(Any)
                .allow_headers(Any),
        ),
        CorsPolicy::None => None,
    }
}

#[cfg(feature = "openapi")]
fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::openapi::Components;

    #[derive(utoipa::OpenApi)]
    #[openapi(
        info(title = "Recipe Book API", description = "Bilingual recipe catalog"),
        modifiers(&SecurityAddon)
    )]
    struct OpenApi;

    struct SecurityAddon;

    impl utoipa::Modify for SecurityAddon {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

            openapi
                .components
                .get_or_insert_with(Components::new)
                .add_security_scheme(
                    "bearer",
                    SecurityScheme::Http(
                        HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build(),
                    ),
                );
        }
    }

    use utoipa::OpenApi as _;
    OpenApi::openapi().nest("/api/recipes", rest_api::api_docs())
}

pub fn main_router(state: AppState) -> Router<()> {
    let upload_limit_mb = state.config().upload_limit_mb;
    let images_dir = state.images().root().to_path_buf();

    #[allow(unused_mut)]
    let mut router = Router::new()
        .nest("/api/recipes", rest_api::recipe::router(upload_limit_mb))
        // admin router carries its own token and role layers
        .nest("/admin", admin::router(state.clone()))
        .nest("/auth", auth_router())
        .merge(pages::router())
        .layer(axum::middleware::from_fn(resolve_locale))
        .layer(tower_cookies::CookieManagerLayer::new())
        .with_state(state)
        // static and public resources
        .nest_service(IMAGES_URL_PREFIX, ServeDir::new(images_dir))
        .route("/health", get(health));

    #[cfg(feature = "openapi")]
    {
        let docs = api_docs();
        router = router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", docs),
        );
    }
    router
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn build_state(config: &ServerConfig) -> Result<AppState> {
    let data_dir = config.backend.data_dir();
    let images_dir = config.backend.images_dir();
    for dir in [&data_dir, &images_dir] {
        if !dir.is_dir() {
            fs::create_dir_all(dir).await?;
            info!("Created directory {dir:?}");
        }
    }

    let database_url = config.backend.database_url();
    let pool = recipes_dal::new_pool(&database_url).await?;
    recipes_dal::migrate(&pool).await?;
    debug!("Database {database_url} ready");

    let secret = read_secret(&data_dir).await?;
    let tokens = TokenManager::new(&secret, config.token_validity)?;
    seed(&pool, config).await?;

    let app_config: AppConfig = config.into();
    let images = ImageStore::new(images_dir, IMAGES_URL_PREFIX);
    let translator = Translator::from_config(&config.translator);
    Ok(AppState::new(app_config, pool, images, translator, tokens))
}

async fn read_secret(data_dir: &Path) -> Result<Vec<u8>, std::io::Error> {
    let secret_file = data_dir.join("secret");

    let secret = if fs::try_exists(&secret_file).await? {
        fs::read(&secret_file).await?
    } else {
        let random_bytes = rand::random::<[u8; SECRET_LEN]>();
        #[cfg(unix)]
        let mut file = {
            use std::fs::OpenOptions;
            use std::os::unix::fs::OpenOptionsExt;
            {
                // only current user can read the secret
                let _f = OpenOptions::new()
                    .mode(0o600)
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(&secret_file)?;
            }
            fs::File::options().write(true).open(&secret_file).await?
        };
        #[cfg(not(unix))]
        let mut file = fs::File::create(&secret_file).await?;

        file.write_all(&random_bytes).await?;
        random_bytes.to_vec()
    };
    Ok(secret)
}
