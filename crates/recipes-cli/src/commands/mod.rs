use recipes_dal::{recipe::RecipeRepository, user::UserRepository, Pool};

pub mod change_password;
pub mod cleanup;
pub mod create_user;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

/// Opens database, schema is brought up to date, so commands work also before first server start
pub async fn open_pool(database_url: &str) -> anyhow::Result<Pool> {
    let pool = recipes_dal::new_pool(database_url).await?;
    recipes_dal::migrate(&pool).await?;
    Ok(pool)
}

pub async fn create_user_repository(database_url: &str) -> anyhow::Result<UserRepository> {
    Ok(UserRepository::new(open_pool(database_url).await?))
}

pub async fn create_recipe_repository(database_url: &str) -> anyhow::Result<RecipeRepository> {
    Ok(RecipeRepository::new(open_pool(database_url).await?))
}
