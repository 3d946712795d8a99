use crate::{Batch, Error, ListingParams, Order, error::Result};
use futures::TryStreamExt as _;
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, QueryBuilder};
use time::OffsetDateTime;
use tracing::debug;

pub const DEFAULT_SERVINGS: i64 = 4;
const VALID_ORDER_FIELDS: &[&str] = &["title", "created_at", "updated_at", "id"];

/// Unicode aware lowercase used for search columns and search terms
///
/// sqlite `lower()` folds only ASCII, so folding is done here
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

fn default_servings() -> i64 {
    DEFAULT_SERVINGS
}

fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        Err(garde::Error::new("must not be empty"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Recipe {
    pub id: i64,
    pub version: i64,
    pub title: String,
    pub description: Option<String>,
    pub ingredients: String,
    pub instructions: String,
    pub category: Option<String>,
    pub title_zh: Option<String>,
    pub description_zh: Option<String>,
    pub ingredients_zh: Option<String>,
    pub instructions_zh: Option<String>,
    pub category_zh: Option<String>,
    pub prep_time_minutes: i64,
    pub cook_time_minutes: i64,
    pub servings: i64,
    pub image_url: Option<String>,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub verified_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Recipe {
    pub fn content(&self) -> RecipeContent {
        RecipeContent {
            title: self.title.clone(),
            description: self.description.clone(),
            ingredients: self.ingredients.clone(),
            instructions: self.instructions.clone(),
            category: self.category.clone(),
            title_zh: self.title_zh.clone(),
            description_zh: self.description_zh.clone(),
            ingredients_zh: self.ingredients_zh.clone(),
            instructions_zh: self.instructions_zh.clone(),
            category_zh: self.category_zh.clone(),
            prep_time_minutes: self.prep_time_minutes,
            cook_time_minutes: self.cook_time_minutes,
            servings: self.servings,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateRecipe {
    #[garde(length(chars, min = 1, max = 200), custom(not_blank))]
    pub title: String,
    #[garde(length(chars, max = 500))]
    pub description: Option<String>,
    #[garde(length(min = 1), custom(not_blank))]
    pub ingredients: String,
    #[garde(length(min = 1), custom(not_blank))]
    pub instructions: String,
    #[serde(default)]
    #[garde(range(min = 0, max = 1440))]
    pub prep_time_minutes: i64,
    #[serde(default)]
    #[garde(range(min = 0, max = 1440))]
    pub cook_time_minutes: i64,
    #[serde(default = "default_servings")]
    #[garde(range(min = 1, max = 1000))]
    pub servings: i64,
    #[garde(length(chars, max = 100))]
    pub category: Option<String>,
}

/// Partial update, only present fields are applied
#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateRecipe {
    #[garde(inner(length(chars, min = 1, max = 200), custom(not_blank)))]
    pub title: Option<String>,
    #[garde(inner(length(chars, max = 500)))]
    pub description: Option<String>,
    #[garde(inner(length(min = 1), custom(not_blank)))]
    pub ingredients: Option<String>,
    #[garde(inner(length(min = 1), custom(not_blank)))]
    pub instructions: Option<String>,
    #[garde(inner(range(min = 0, max = 1440)))]
    pub prep_time_minutes: Option<i64>,
    #[garde(inner(range(min = 0, max = 1440)))]
    pub cook_time_minutes: Option<i64>,
    #[garde(inner(range(min = 1, max = 1000)))]
    pub servings: Option<i64>,
    #[garde(inner(length(chars, max = 100)))]
    pub category: Option<String>,
    /// Expected version of the record, if given update fails when record was changed meanwhile
    #[garde(inner(range(min = 1)))]
    pub version: Option<i64>,
}

impl UpdateRecipe {
    pub fn apply_to(self, content: &mut RecipeContent) {
        if let Some(title) = self.title {
            content.title = title;
        }
        if let Some(description) = self.description {
            content.description = Some(description);
        }
        if let Some(ingredients) = self.ingredients {
            content.ingredients = ingredients;
        }
        if let Some(instructions) = self.instructions {
            content.instructions = instructions;
        }
        if let Some(prep_time) = self.prep_time_minutes {
            content.prep_time_minutes = prep_time;
        }
        if let Some(cook_time) = self.cook_time_minutes {
            content.cook_time_minutes = cook_time;
        }
        if let Some(servings) = self.servings {
            content.servings = servings;
        }
        if let Some(category) = self.category {
            content.category = Some(category);
        }
    }
}

/// Everything stored about recipe text and timing, in both languages
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecipeContent {
    pub title: String,
    pub description: Option<String>,
    pub ingredients: String,
    pub instructions: String,
    pub category: Option<String>,
    pub title_zh: Option<String>,
    pub description_zh: Option<String>,
    pub ingredients_zh: Option<String>,
    pub instructions_zh: Option<String>,
    pub category_zh: Option<String>,
    pub prep_time_minutes: i64,
    pub cook_time_minutes: i64,
    pub servings: i64,
}

impl From<CreateRecipe> for RecipeContent {
    fn from(value: CreateRecipe) -> Self {
        RecipeContent {
            title: value.title,
            description: value.description,
            ingredients: value.ingredients,
            instructions: value.instructions,
            category: value.category,
            prep_time_minutes: value.prep_time_minutes,
            cook_time_minutes: value.cook_time_minutes,
            servings: value.servings,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    /// search also in ingredients, not only title and description
    pub search_ingredients: bool,
}

impl RecipeFilter {
    fn push_conditions<'a>(&'a self, query: &mut QueryBuilder<'a, crate::ChosenDB>) {
        let mut has_where = false;
        let mut next_condition = |query: &mut QueryBuilder<'a, crate::ChosenDB>| {
            query.push(if has_where { " AND " } else { " WHERE " });
            has_where = true;
        };
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let search = fold_case(search);
            next_condition(query);
            query
                .push("(instr(title_folded, ")
                .push_bind(search.clone())
                .push(") > 0 OR instr(coalesce(description_folded, ''), ")
                .push_bind(search.clone())
                .push(") > 0");
            if self.search_ingredients {
                query
                    .push(" OR instr(ingredients_folded, ")
                    .push_bind(search)
                    .push(") > 0");
            }
            query.push(")");
        }
        if let Some(category) = self.category.as_deref().filter(|s| !s.trim().is_empty()) {
            next_condition(query);
            query
                .push("category_folded = ")
                .push_bind(fold_case(category));
        }
    }
}

pub type RecipeRepository = RecipeRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct RecipeRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> RecipeRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, content: RecipeContent) -> Result<Recipe> {
        let now = OffsetDateTime::now_utc();
        let result = sqlx::query(
            r#"INSERT INTO recipe
            (version, title, description, ingredients, instructions, category,
            title_zh, description_zh, ingredients_zh, instructions_zh, category_zh,
            prep_time_minutes, cook_time_minutes, servings, is_verified, created_at,
            title_folded, description_folded, ingredients_folded, category_folded)
            VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, FALSE, ?, ?, ?, ?, ?)"#,
        )
        .bind(&content.title)
        .bind(&content.description)
        .bind(&content.ingredients)
        .bind(&content.instructions)
        .bind(&content.category)
        .bind(&content.title_zh)
        .bind(&content.description_zh)
        .bind(&content.ingredients_zh)
        .bind(&content.instructions_zh)
        .bind(&content.category_zh)
        .bind(content.prep_time_minutes)
        .bind(content.cook_time_minutes)
        .bind(content.servings)
        .bind(now)
        .bind(fold_case(&content.title))
        .bind(content.description.as_deref().map(fold_case))
        .bind(fold_case(&content.ingredients))
        .bind(content.category.as_deref().map(fold_case))
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created recipe {id}");
        self.get(id).await
    }

    /// Overwrites recipe content, fails with [Error::FailedUpdate] if record version differs
    pub async fn update(&self, id: i64, version: i64, content: RecipeContent) -> Result<Recipe> {
        let now = OffsetDateTime::now_utc();
        let result = sqlx::query(
            r#"UPDATE recipe SET title = ?, description = ?, ingredients = ?, instructions = ?,
            category = ?, title_zh = ?, description_zh = ?, ingredients_zh = ?, instructions_zh = ?,
            category_zh = ?, prep_time_minutes = ?, cook_time_minutes = ?, servings = ?,
            updated_at = ?, version = ?, title_folded = ?, description_folded = ?,
            ingredients_folded = ?, category_folded = ?
            WHERE id = ? AND version = ?"#,
        )
        .bind(&content.title)
        .bind(&content.description)
        .bind(&content.ingredients)
        .bind(&content.instructions)
        .bind(&content.category)
        .bind(&content.title_zh)
        .bind(&content.description_zh)
        .bind(&content.ingredients_zh)
        .bind(&content.instructions_zh)
        .bind(&content.category_zh)
        .bind(content.prep_time_minutes)
        .bind(content.cook_time_minutes)
        .bind(content.servings)
        .bind(now)
        .bind(version + 1)
        .bind(fold_case(&content.title))
        .bind(content.description.as_deref().map(fold_case))
        .bind(fold_case(&content.ingredients))
        .bind(content.category.as_deref().map(fold_case))
        .bind(id)
        .bind(version)
        .execute(&self.executor)
        .await?;

        self.check_updated(id, version, result.rows_affected())
            .await?;
        self.get(id).await
    }

    pub async fn set_image(&self, id: i64, version: i64, image_url: Option<&str>) -> Result<Recipe> {
        let result = sqlx::query(
            "UPDATE recipe SET image_url = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(image_url)
        .bind(OffsetDateTime::now_utc())
        .bind(version + 1)
        .bind(id)
        .bind(version)
        .execute(&self.executor)
        .await?;

        self.check_updated(id, version, result.rows_affected())
            .await?;
        self.get(id).await
    }

    pub async fn verify(&self, id: i64) -> Result<Recipe> {
        let now = OffsetDateTime::now_utc();
        let result = sqlx::query(
            "UPDATE recipe SET is_verified = TRUE, verified_at = ?, updated_at = ?, version = version + 1 WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.executor)
        .await?;

        if result.rows_affected() == 0 {
            Err(Error::RecipeNotFound(id))
        } else {
            self.get(id).await
        }
    }

    async fn check_updated(&self, id: i64, version: i64, rows_affected: u64) -> Result<()> {
        if rows_affected > 0 {
            return Ok(());
        }
        // distinguish missing record from version clash
        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM recipe WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?;
        match exists {
            Some(_) => Err(Error::FailedUpdate { id, version }),
            None => Err(Error::RecipeNotFound(id)),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM recipe WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecipeNotFound(id))
        } else {
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<Recipe> {
        sqlx::query_as::<_, Recipe>("SELECT * FROM recipe WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or(Error::RecipeNotFound(id))
    }

    pub async fn list(&self, filter: &RecipeFilter, params: ListingParams) -> Result<Batch<Recipe>> {
        let ordering = params.ordering(VALID_ORDER_FIELDS)?;
        let ordering = if ordering.is_empty() {
            "title".to_string()
        } else {
            ordering
        };

        let mut count_query = QueryBuilder::new("SELECT count(*) FROM recipe");
        filter.push_conditions(&mut count_query);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.executor)
            .await?;

        let mut query = QueryBuilder::new("SELECT * FROM recipe");
        filter.push_conditions(&mut query);
        query
            .push(format!(" ORDER BY {ordering}, id LIMIT "))
            .push_bind(params.limit)
            .push(" OFFSET ")
            .push_bind(params.offset);
        let rows = query
            .build_query_as::<Recipe>()
            .fetch(&self.executor)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(Batch {
            offset: params.offset,
            limit: params.limit,
            total,
            rows,
        })
    }

    /// Most recently created recipes
    pub async fn recent(&self, limit: i64) -> Result<Vec<Recipe>> {
        let params =
            ListingParams::new(0, limit).with_order(vec![Order::Desc("created_at".into())]);
        let batch = self.list(&RecipeFilter::default(), params).await?;
        Ok(batch.rows)
    }

    /// Recipes with given ids ordered by title, unknown ids are skipped
    pub async fn list_by_ids(&self, ids: &[i64]) -> Result<Vec<Recipe>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = QueryBuilder::new("SELECT * FROM recipe WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY title, id");
        let rows = query
            .build_query_as::<Recipe>()
            .fetch(&self.executor)
            .try_collect::<Vec<_>>()
            .await?;
        Ok(rows)
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM recipe WHERE category IS NOT NULL AND category <> '' ORDER BY category",
        )
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(categories)
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM recipe")
            .fetch_one(&self.executor)
            .await?;
        Ok(count)
    }

    /// All image urls referenced by recipes
    pub async fn image_urls(&self) -> Result<Vec<String>> {
        let urls = sqlx::query_scalar::<_, String>(
            "SELECT image_url FROM recipe WHERE image_url IS NOT NULL",
        )
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(urls)
    }
}
