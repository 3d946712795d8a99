use recipes_dal::recipe::RecipeRepository;

use crate::repository_from_request;

pub mod image;
pub mod recipe;

repository_from_request!(RecipeRepository);

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    recipe::api_docs().merge_from(image::api_docs())
}
