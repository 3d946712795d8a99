use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use garde::Validate;
use http::StatusCode;
use recipes_dal::{
    recipe::{CreateRecipe, Recipe, RecipeContent, RecipeFilter, RecipeRepository, UpdateRecipe},
    ListingParams,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::ApiResult, state::AppState, translation::translate_recipe, validate::Garde};

use super::image;

pub const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct RecipeQuery {
    /// Case insensitive substring of title, description or ingredients
    #[garde(length(max = 200))]
    pub search: Option<String>,
    #[garde(length(max = 100))]
    pub category: Option<String>,
    #[garde(inner(range(min = 1, max = 100)))]
    pub limit: Option<i64>,
    #[garde(inner(range(min = 0)))]
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecipeList {
    pub recipes: Vec<Recipe>,
    pub total_count: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CategoryList {
    pub categories: Vec<String>,
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Recipes", operation_id = "listRecipes",
    params(RecipeQuery), responses((status = StatusCode::OK, description = "Page of recipes ordered by title", body = RecipeList))))]
pub async fn list(
    repository: RecipeRepository,
    Garde(Query(query)): Garde<Query<RecipeQuery>>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let filter = RecipeFilter {
        search: query.search,
        category: query.category,
        search_ingredients: true,
    };
    let batch = repository
        .list(&filter, ListingParams::new(offset, limit))
        .await?;
    Ok(Json(RecipeList {
        recipes: batch.rows,
        total_count: batch.total,
        limit,
        offset,
    }))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/{id}", tag = "Recipes", operation_id = "getRecipe",
    responses((status = StatusCode::OK, description = "Recipe", body = Recipe),
    (status = StatusCode::NOT_FOUND, description = "No such recipe", body = crate::error::ErrorBody))))]
pub async fn get_recipe(
    Path(id): Path<i64>,
    repository: RecipeRepository,
) -> ApiResult<impl IntoResponse> {
    let recipe = repository.get(id).await?;
    Ok(Json(recipe))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/categories", tag = "Recipes", operation_id = "listCategories",
    responses((status = StatusCode::OK, description = "Distinct categories, alphabetical", body = CategoryList))))]
pub async fn categories(repository: RecipeRepository) -> ApiResult<impl IntoResponse> {
    let categories = repository.categories().await?;
    Ok(Json(CategoryList { categories }))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = "Recipes", operation_id = "createRecipe",
    request_body = CreateRecipe,
    responses((status = StatusCode::CREATED, description = "Created recipe", body = Recipe),
    (status = StatusCode::BAD_REQUEST, description = "Validation failed", body = crate::error::ErrorBody))))]
pub async fn create(
    State(state): State<AppState>,
    repository: RecipeRepository,
    Garde(Json(payload)): Garde<Json<CreateRecipe>>,
) -> ApiResult<impl IntoResponse> {
    let mut content = RecipeContent::from(payload);
    translate_recipe(state.translator(), &mut content).await;
    let recipe = repository.create(content).await?;
    debug!("Created recipe {}", recipe.id);
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[cfg_attr(feature = "openapi", utoipa::path(put, path = "/{id}", tag = "Recipes", operation_id = "updateRecipe",
    request_body = UpdateRecipe,
    responses((status = StatusCode::OK, description = "Updated recipe", body = Recipe),
    (status = StatusCode::NOT_FOUND, description = "No such recipe", body = crate::error::ErrorBody),
    (status = StatusCode::CONFLICT, description = "Recipe was changed concurrently", body = crate::error::ErrorBody))))]
pub async fn update(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    repository: RecipeRepository,
    Garde(Json(payload)): Garde<Json<UpdateRecipe>>,
) -> ApiResult<impl IntoResponse> {
    let existing = repository.get(id).await?;
    let version = payload.version.unwrap_or(existing.version);
    let mut content = existing.content();
    payload.apply_to(&mut content);
    translate_recipe(state.translator(), &mut content).await;
    let recipe = repository.update(id, version, content).await?;
    Ok(Json(recipe))
}

pub fn router(upload_limit_mb: usize) -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route("/categories", get(categories))
        .route("/{id}", get(get_recipe).put(update))
        .route(
            "/{id}/image",
            post(image::upload_form)
                .put(image::upload_base64)
                .delete(image::remove),
        )
        .layer(DefaultBodyLimit::max(1024 * 1024 * upload_limit_mb))
}

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    #[derive(utoipa::OpenApi)]
    #[openapi(paths(list, get_recipe, categories, create, update))]
    struct ApiDocs;
    ApiDocs::openapi()
}
