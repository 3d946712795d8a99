use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use garde::Validate;
#[cfg(feature = "openapi")]
use http::StatusCode;
use recipes_dal::recipe::{Recipe, RecipeRepository};
use recipes_store::{image::DecodedImage, ImageFile};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    validate::Garde,
};

#[cfg(feature = "openapi")]
#[derive(serde::Deserialize, utoipa::ToSchema)]
#[allow(unused)]
struct UploadForm {
    #[schema(value_type = String, format = Binary, content_media_type = "application/octet-stream")]
    file: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Base64Image {
    /// Raw base64 or data URL
    #[serde(default)]
    #[garde(skip)]
    pub image_base64: String,
    #[garde(inner(length(max = 255)))]
    pub file_name: Option<String>,
}

/// Stores new image for recipe and points recipe to it
///
/// Previous image is left in place, it's up to caller what to do with it.
/// If recipe cannot be updated, newly stored image is removed.
pub async fn store_recipe_image(
    state: &AppState,
    repository: &RecipeRepository,
    recipe: &Recipe,
    file: &ImageFile<'_>,
) -> ApiResult<Recipe> {
    file.validate()?;
    let url = state
        .images()
        .upload(file, Some(recipe.id))
        .await
        .ok_or(ApiError::UploadFailed)?;
    match repository
        .set_image(recipe.id, recipe.version, Some(&url))
        .await
    {
        Ok(updated) => Ok(updated),
        Err(e) => {
            warn!("Cannot attach image {url} to recipe {}: {e}", recipe.id);
            state.images().delete(&url).await;
            Err(e.into())
        }
    }
}

async fn replace_image(
    state: &AppState,
    repository: &RecipeRepository,
    id: i64,
    file: &ImageFile<'_>,
) -> ApiResult<Recipe> {
    let recipe = repository.get(id).await?;
    let updated = store_recipe_image(state, repository, &recipe, file).await?;
    if let Some(old_url) = recipe.image_url.as_deref() {
        if state.images().is_managed(old_url) && updated.image_url.as_deref() != Some(old_url) {
            debug!("Removing replaced image {old_url}");
            state.images().delete(old_url).await;
        }
    }
    Ok(updated)
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(post, path = "/{id}/image", tag = "Recipe Images", operation_id = "uploadRecipeImage",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = StatusCode::OK, description = "Recipe with new image", body = Recipe),
        (status = StatusCode::BAD_REQUEST, description = "Missing or invalid image", body = crate::error::ErrorBody),
        (status = StatusCode::NOT_FOUND, description = "No such recipe", body = crate::error::ErrorBody),
    )
    )
)]
pub async fn upload_form(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    repository: RecipeRepository,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        if data.is_empty() {
            return Err(ApiError::NoFile);
        }
        debug!("Uploading image {file_name} ({content_type}) for recipe {id}");
        let file = ImageFile {
            file_name: &file_name,
            content_type: &content_type,
            data: &data,
        };
        let recipe = replace_image(&state, &repository, id, &file).await?;
        return Ok(Json(recipe));
    }
    Err(ApiError::NoFile)
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(put, path = "/{id}/image", tag = "Recipe Images", operation_id = "uploadRecipeImageBase64",
    request_body = Base64Image,
    responses(
        (status = StatusCode::OK, description = "Recipe with new image", body = Recipe),
        (status = StatusCode::BAD_REQUEST, description = "Missing or invalid image", body = crate::error::ErrorBody),
        (status = StatusCode::NOT_FOUND, description = "No such recipe", body = crate::error::ErrorBody),
    )
    )
)]
pub async fn upload_base64(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    repository: RecipeRepository,
    Garde(Json(payload)): Garde<Json<Base64Image>>,
) -> ApiResult<impl IntoResponse> {
    if payload.image_base64.trim().is_empty() {
        return Err(ApiError::NoFile);
    }
    let image = DecodedImage::decode(&payload.image_base64, payload.file_name.as_deref())?;
    let recipe = replace_image(&state, &repository, id, &image.as_file()).await?;
    Ok(Json(recipe))
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(delete, path = "/{id}/image", tag = "Recipe Images", operation_id = "deleteRecipeImage",
    responses(
        (status = StatusCode::OK, description = "Recipe without image", body = Recipe),
        (status = StatusCode::NOT_FOUND, description = "No such recipe", body = crate::error::ErrorBody),
    )
    )
)]
pub async fn remove(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    repository: RecipeRepository,
) -> ApiResult<impl IntoResponse> {
    let recipe = repository.get(id).await?;
    let updated = repository.set_image(id, recipe.version, None).await?;
    if let Some(url) = recipe.image_url.as_deref() {
        if state.images().is_managed(url) {
            state.images().delete(url).await;
        }
    }
    Ok(Json(updated))
}

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    #[derive(utoipa::OpenApi)]
    #[openapi(paths(upload_form, upload_base64, remove))]
    struct ApiDocs;
    ApiDocs::openapi()
}
