//! Recipe management for administrators, forms are multipart so image can be sent together with recipe

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use garde::Validate as _;
use http::StatusCode;
use recipes_dal::{
    recipe::{CreateRecipe, RecipeContent, RecipeFilter, RecipeRepository, DEFAULT_SERVINGS},
    ListingParams, Order,
};
use recipes_store::ImageFile;
use recipes_types::{claim::Role, config::IMAGES_URL_PREFIX};
use tracing::{debug, info, warn};

use crate::{
    auth::token::{RequiredRolesLayer, TokenLayer},
    error::{ApiError, ApiResult},
    rest_api::image::store_recipe_image,
    state::AppState,
    translation::translate_recipe,
    validate::report_message,
};

#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageUpload {
    pub fn as_file(&self) -> ImageFile<'_> {
        ImageFile {
            file_name: &self.file_name,
            content_type: &self.content_type,
            data: &self.data,
        }
    }
}

#[derive(Debug)]
pub struct RecipeForm {
    pub recipe: CreateRecipe,
    pub image: Option<ImageUpload>,
}

fn parse_number(field: &str, value: &str) -> ApiResult<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("{field}: must be a whole number")))
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Reads recipe fields and optional `image` file, then validates recipe
pub async fn read_form(mut multipart: Multipart) -> ApiResult<RecipeForm> {
    let mut recipe = CreateRecipe {
        title: String::new(),
        description: None,
        ingredients: String::new(),
        instructions: String::new(),
        prep_time_minutes: 0,
        cook_time_minutes: 0,
        servings: DEFAULT_SERVINGS,
        category: None,
    };
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            if !data.is_empty() {
                image = Some(ImageUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            continue;
        }
        let value = field.text().await?;
        match name.as_str() {
            "title" => recipe.title = value,
            "description" => recipe.description = non_empty(value),
            "ingredients" => recipe.ingredients = value,
            "instructions" => recipe.instructions = value,
            "category" => recipe.category = non_empty(value),
            "prepTimeMinutes" => recipe.prep_time_minutes = parse_number(&name, &value)?,
            "cookTimeMinutes" => recipe.cook_time_minutes = parse_number(&name, &value)?,
            "servings" => recipe.servings = parse_number(&name, &value)?,
            other => debug!("Ignoring unknown form field {other}"),
        }
    }

    recipe
        .validate()
        .map_err(|report| ApiError::Validation(report_message(&report)))?;
    if let Some(image) = &image {
        image.as_file().validate()?;
    }
    Ok(RecipeForm { recipe, image })
}

fn is_own_upload(url: &str) -> bool {
    url.starts_with(&format!("{IMAGES_URL_PREFIX}/recipe-"))
}

pub async fn list(repository: RecipeRepository) -> ApiResult<impl IntoResponse> {
    let params = ListingParams::default().with_order(vec![Order::Desc("created_at".into())]);
    let batch = repository.list(&RecipeFilter::default(), params).await?;
    Ok(Json(batch.rows))
}

pub async fn create(
    State(state): State<AppState>,
    repository: RecipeRepository,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_form(multipart).await?;
    let mut content = RecipeContent::from(form.recipe);
    translate_recipe(state.translator(), &mut content).await;
    let mut recipe = repository.create(content).await?;
    info!("Admin created recipe {} ({})", recipe.id, recipe.title);

    if let Some(image) = &form.image {
        recipe = store_recipe_image(&state, &repository, &recipe, &image.as_file()).await?;
    }
    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn update(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    repository: RecipeRepository,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let form = read_form(multipart).await?;
    let existing = repository.get(id).await?;
    let mut content = RecipeContent::from(form.recipe);
    translate_recipe(state.translator(), &mut content).await;
    let mut recipe = repository.update(id, existing.version, content).await?;

    if let Some(image) = &form.image {
        recipe = store_recipe_image(&state, &repository, &recipe, &image.as_file()).await?;
        if let Some(old_url) = existing.image_url.as_deref() {
            if is_own_upload(old_url) && recipe.image_url.as_deref() != Some(old_url) {
                state.images().delete(old_url).await;
            }
        }
    }
    Ok(Json(recipe))
}

pub async fn delete(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    repository: RecipeRepository,
) -> ApiResult<impl IntoResponse> {
    let recipe = repository.get(id).await?;
    if let Some(url) = recipe.image_url.as_deref() {
        if state.images().is_managed(url) && !state.images().delete(url).await {
            warn!("Image {url} of recipe {id} was not deleted");
        }
    }
    repository.delete(id).await?;
    info!("Admin deleted recipe {id}");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn verify(
    Path(id): Path<i64>,
    repository: RecipeRepository,
) -> ApiResult<impl IntoResponse> {
    let recipe = repository.verify(id).await?;
    Ok(Json(recipe))
}

pub fn router(state: AppState) -> Router<AppState> {
    let upload_limit = 1024 * 1024 * state.config().upload_limit_mb;
    Router::new()
        .route("/recipes", get(list).post(create))
        .route("/recipes/{id}", put(update).delete(delete))
        .route("/recipes/{id}/verify", post(verify))
        .layer(axum::extract::DefaultBodyLimit::max(upload_limit))
        .layer(RequiredRolesLayer::new([Role::admin()]))
        .layer(TokenLayer::new(state))
}
