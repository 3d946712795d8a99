//! Public pages as localized view models
//!
//! Every page carries resolved culture and full UI string table, so it can be rendered by any client.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use garde::Validate;
use recipes_dal::{
    recipe::{Recipe, RecipeFilter, RecipeRepository},
    ListingParams, Order,
};
use recipes_types::Culture;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{error::ApiResult, localization::strings, state::AppState, validate::Garde};

pub const HOME_RECENT_COUNT: i64 = 4;

/// Recipe with fields in display language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeView {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub ingredients: String,
    pub instructions: String,
    pub category: Option<String>,
    pub prep_time_minutes: i64,
    pub cook_time_minutes: i64,
    pub total_time_minutes: i64,
    pub servings: i64,
    pub image_url: Option<String>,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub verified_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

fn pick_opt(culture: Culture, primary: Option<&str>, mirror: Option<&str>) -> Option<String> {
    match primary {
        Some(primary) => Some(culture.pick(primary, mirror).to_string()),
        None => match culture {
            Culture::Zh => mirror.filter(|m| !m.trim().is_empty()).map(str::to_string),
            Culture::En => None,
        },
    }
}

impl RecipeView {
    pub fn localized(recipe: &Recipe, culture: Culture) -> Self {
        RecipeView {
            id: recipe.id,
            title: culture
                .pick(&recipe.title, recipe.title_zh.as_deref())
                .to_string(),
            description: pick_opt(
                culture,
                recipe.description.as_deref(),
                recipe.description_zh.as_deref(),
            ),
            ingredients: culture
                .pick(&recipe.ingredients, recipe.ingredients_zh.as_deref())
                .to_string(),
            instructions: culture
                .pick(&recipe.instructions, recipe.instructions_zh.as_deref())
                .to_string(),
            category: pick_opt(
                culture,
                recipe.category.as_deref(),
                recipe.category_zh.as_deref(),
            ),
            prep_time_minutes: recipe.prep_time_minutes,
            cook_time_minutes: recipe.cook_time_minutes,
            total_time_minutes: recipe.prep_time_minutes + recipe.cook_time_minutes,
            servings: recipe.servings,
            image_url: recipe.image_url.clone(),
            is_verified: recipe.is_verified,
            verified_at: recipe.verified_at,
            created_at: recipe.created_at,
        }
    }
}

fn localize_all(recipes: &[Recipe], culture: Culture) -> Vec<RecipeView> {
    recipes
        .iter()
        .map(|r| RecipeView::localized(r, culture))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub culture: Culture,
    pub strings: BTreeMap<&'static str, &'static str>,
    #[serde(flatten)]
    pub content: T,
}

impl<T: Serialize> Page<T> {
    pub fn new(culture: Culture, content: T) -> Self {
        Page {
            culture,
            strings: strings(culture),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipesContent {
    pub recipes: Vec<RecipeView>,
}

#[derive(Debug, Serialize)]
pub struct IndexContent {
    pub recipes: Vec<RecipeView>,
    pub categories: Vec<String>,
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetailContent {
    pub recipe: RecipeView,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct IndexQuery {
    #[garde(length(max = 200))]
    pub search: Option<String>,
    #[garde(length(max = 100))]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PrintQuery {
    /// Comma separated recipe ids
    #[garde(length(max = 4096))]
    pub ids: Option<String>,
    #[serde(default)]
    #[garde(skip)]
    pub all: bool,
}

/// Positive ids from comma separated list, anything else is ignored
pub fn parse_ids(ids: &str) -> Vec<i64> {
    ids.split(',')
        .filter_map(|id| id.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .collect()
}

pub async fn home(culture: Culture, repository: RecipeRepository) -> ApiResult<impl IntoResponse> {
    let recipes = repository.recent(HOME_RECENT_COUNT).await?;
    Ok(Json(Page::new(
        culture,
        RecipesContent {
            recipes: localize_all(&recipes, culture),
        },
    )))
}

pub async fn index(
    culture: Culture,
    repository: RecipeRepository,
    Garde(Query(query)): Garde<Query<IndexQuery>>,
) -> ApiResult<impl IntoResponse> {
    let filter = RecipeFilter {
        search: query.search.clone(),
        category: query.category.clone(),
        search_ingredients: false,
    };
    let params = ListingParams::default().with_order(vec![Order::Desc("created_at".into())]);
    let batch = repository.list(&filter, params).await?;
    let categories = repository.categories().await?;
    Ok(Json(Page::new(
        culture,
        IndexContent {
            recipes: localize_all(&batch.rows, culture),
            categories,
            search: query.search,
            category: query.category,
        },
    )))
}

pub async fn detail(
    Path(id): Path<i64>,
    culture: Culture,
    repository: RecipeRepository,
) -> ApiResult<impl IntoResponse> {
    let recipe = repository.get(id).await?;
    Ok(Json(Page::new(
        culture,
        DetailContent {
            recipe: RecipeView::localized(&recipe, culture),
        },
    )))
}

pub async fn print(
    culture: Culture,
    repository: RecipeRepository,
    Garde(Query(query)): Garde<Query<PrintQuery>>,
) -> ApiResult<impl IntoResponse> {
    let recipes = if query.all {
        repository
            .list(&RecipeFilter::default(), ListingParams::default())
            .await?
            .rows
    } else {
        let ids = query.ids.as_deref().map(parse_ids).unwrap_or_default();
        repository.list_by_ids(&ids).await?
    };
    Ok(Json(Page::new(
        culture,
        RecipesContent {
            recipes: localize_all(&recipes, culture),
        },
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/recipes", get(index))
        .route("/recipes/print", get(print))
        .route("/recipes/{id}", get(detail))
}
