use futures::TryStreamExt as _;
use recipes_dal::{
    Error, ListingParams, Order,
    recipe::{RecipeContent, RecipeFilter, RecipeRepositoryImpl, UpdateRecipe},
    user::{CreateUser, UserRepositoryImpl},
};
use sqlx::Executor;

const TEST_DATA: &str = r#"
INSERT INTO recipe (id, version, title, description, ingredients, instructions, category, prep_time_minutes, cook_time_minutes, servings, is_verified, created_at, title_folded, description_folded, ingredients_folded, category_folded)
VALUES (1, 1, 'Pancakes', 'Fluffy breakfast', 'flour, milk, eggs', 'Mix and fry', 'Breakfast', 10, 15, 4, FALSE, '2025-01-01T10:00:00Z', 'pancakes', 'fluffy breakfast', 'flour, milk, eggs', 'breakfast');
INSERT INTO recipe (id, version, title, description, ingredients, instructions, category, prep_time_minutes, cook_time_minutes, servings, is_verified, created_at, title_folded, description_folded, ingredients_folded, category_folded)
VALUES (2, 1, 'Apple Pie', NULL, 'apples, flour, butter', 'Bake it', 'Dessert', 30, 45, 8, FALSE, '2025-01-02T10:00:00Z', 'apple pie', NULL, 'apples, flour, butter', 'dessert');
INSERT INTO recipe (id, version, title, description, ingredients, instructions, category, prep_time_minutes, cook_time_minutes, servings, is_verified, created_at, title_folded, description_folded, ingredients_folded, category_folded)
VALUES (3, 1, 'Omelette', 'Quick eggs', 'eggs, salt', 'Whisk and cook', 'breakfast', 5, 5, 1, FALSE, '2025-01-03T10:00:00Z', 'omelette', 'quick eggs', 'eggs, salt', 'breakfast');
INSERT INTO recipe (id, version, title, description, ingredients, instructions, category, prep_time_minutes, cook_time_minutes, servings, is_verified, created_at, title_folded, description_folded, ingredients_folded, category_folded)
VALUES (4, 1, 'Borscht', 'Beet soup', 'beets, cabbage', 'Boil', NULL, 20, 60, 6, FALSE, '2025-01-04T10:00:00Z', 'borscht', 'beet soup', 'beets, cabbage', NULL);
"#;

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    recipes_dal::migrate(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}

fn content(title: &str) -> RecipeContent {
    RecipeContent {
        title: title.to_string(),
        ingredients: "water".to_string(),
        instructions: "boil".to_string(),
        servings: 4,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_list_ordered_by_title() {
    let conn = init_db().await;
    let repo = RecipeRepositoryImpl::new(conn);

    let batch = repo
        .list(&RecipeFilter::default(), ListingParams::new(0, 50))
        .await
        .unwrap();
    assert_eq!(batch.total, 4);
    let titles: Vec<_> = batch.rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Apple Pie", "Borscht", "Omelette", "Pancakes"]);

    let batch = repo
        .list(&RecipeFilter::default(), ListingParams::new(1, 2))
        .await
        .unwrap();
    assert_eq!(batch.total, 4);
    assert_eq!(batch.rows.len(), 2);
    assert_eq!(batch.rows[0].title, "Borscht");
    assert_eq!(batch.offset, 1);
    assert_eq!(batch.limit, 2);
}

#[tokio::test]
async fn test_search_and_category() {
    let conn = init_db().await;
    let repo = RecipeRepositoryImpl::new(conn);

    let filter = RecipeFilter {
        search: Some("EGGS".into()),
        search_ingredients: true,
        ..Default::default()
    };
    let batch = repo.list(&filter, ListingParams::new(0, 50)).await.unwrap();
    assert_eq!(batch.total, 2);
    assert_eq!(batch.rows[0].title, "Omelette");
    assert_eq!(batch.rows[1].title, "Pancakes");

    let filter = RecipeFilter {
        search: Some("EGGS".into()),
        search_ingredients: false,
        ..Default::default()
    };
    let batch = repo.list(&filter, ListingParams::new(0, 50)).await.unwrap();
    assert_eq!(batch.total, 1);
    assert_eq!(batch.rows[0].title, "Omelette");

    let filter = RecipeFilter {
        category: Some("BREAKFAST".into()),
        ..Default::default()
    };
    let batch = repo.list(&filter, ListingParams::new(0, 50)).await.unwrap();
    assert_eq!(batch.total, 2);

    let filter = RecipeFilter {
        search: Some("nonexistent-xyz".into()),
        search_ingredients: true,
        ..Default::default()
    };
    let batch = repo.list(&filter, ListingParams::new(0, 50)).await.unwrap();
    assert_eq!(batch.total, 0);
    assert!(batch.rows.is_empty());
}

#[tokio::test]
async fn test_search_non_ascii_case() {
    let conn = init_db().await;
    let repo = RecipeRepositoryImpl::new(conn);

    let mut brulee = content("CRÈME BRÛLÉE");
    brulee.category = Some("Ÿule".into());
    brulee.ingredients = "ÉCLAIR CREAM, sugar".into();
    let created = repo.create(brulee).await.unwrap();

    let filter = RecipeFilter {
        search: Some("crème".into()),
        ..Default::default()
    };
    let batch = repo.list(&filter, ListingParams::new(0, 50)).await.unwrap();
    assert_eq!(batch.total, 1);
    assert_eq!(batch.rows[0].id, created.id);

    let filter = RecipeFilter {
        category: Some("ÿule".into()),
        ..Default::default()
    };
    let batch = repo.list(&filter, ListingParams::new(0, 50)).await.unwrap();
    assert_eq!(batch.total, 1);

    let filter = RecipeFilter {
        search: Some("éclair".into()),
        search_ingredients: true,
        ..Default::default()
    };
    let batch = repo.list(&filter, ListingParams::new(0, 50)).await.unwrap();
    assert_eq!(batch.total, 1);

    // folded columns follow updates
    let mut changed = created.content();
    changed.title = "ÅLAND PANCAKE".into();
    repo.update(created.id, created.version, changed)
        .await
        .unwrap();
    let filter = RecipeFilter {
        search: Some("åland".into()),
        ..Default::default()
    };
    let batch = repo.list(&filter, ListingParams::new(0, 50)).await.unwrap();
    assert_eq!(batch.total, 1);
    let filter = RecipeFilter {
        search: Some("brûlée".into()),
        ..Default::default()
    };
    let batch = repo.list(&filter, ListingParams::new(0, 50)).await.unwrap();
    assert_eq!(batch.total, 0);
}

#[tokio::test]
async fn test_categories_and_recent() {
    let conn = init_db().await;
    let repo = RecipeRepositoryImpl::new(conn);

    let categories = repo.categories().await.unwrap();
    assert_eq!(categories, vec!["Breakfast", "Dessert", "breakfast"]);

    let recent = repo.recent(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].title, "Borscht");
    assert_eq!(recent[1].title, "Omelette");

    let selected = repo.list_by_ids(&[3, 1, 99]).await.unwrap();
    let titles: Vec<_> = selected.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Omelette", "Pancakes"]);
    assert!(repo.list_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_and_partial_update() {
    let conn = init_db().await;
    let repo = RecipeRepositoryImpl::new(conn);

    let created = repo.create(content("Tea")).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.version, 1);
    assert!(created.updated_at.is_none());
    assert!(!created.is_verified);

    let mut merged = created.content();
    UpdateRecipe {
        servings: Some(2),
        description: Some("Hot drink".into()),
        ..Default::default()
    }
    .apply_to(&mut merged);
    assert_eq!(merged.title, "Tea");
    assert_eq!(merged.ingredients, "water");

    let updated = repo.update(created.id, created.version, merged).await.unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.servings, 2);
    assert_eq!(updated.description.as_deref(), Some("Hot drink"));
    assert_eq!(updated.title, "Tea");
    assert_eq!(updated.created_at, created.created_at);
    let updated_at = updated.updated_at.unwrap();
    assert!(updated_at >= created.created_at);
}

#[tokio::test]
async fn test_update_conflict() {
    let conn = init_db().await;
    let repo = RecipeRepositoryImpl::new(conn);

    let recipe = repo.get(1).await.unwrap();
    repo.update(1, recipe.version, recipe.content())
        .await
        .unwrap();

    let res = repo.update(1, recipe.version, recipe.content()).await;
    assert!(matches!(res, Err(Error::FailedUpdate { id: 1, version: 1 })));

    let res = repo.update(99, 1, recipe.content()).await;
    assert!(matches!(res, Err(Error::RecipeNotFound(99))));
}

#[tokio::test]
async fn test_image_verify_delete() {
    let conn = init_db().await;
    let repo = RecipeRepositoryImpl::new(conn);

    let recipe = repo
        .set_image(2, 1, Some("/images/recipes/recipe-2-x.png"))
        .await
        .unwrap();
    assert_eq!(
        recipe.image_url.as_deref(),
        Some("/images/recipes/recipe-2-x.png")
    );
    assert!(recipe.updated_at.is_some());
    assert_eq!(repo.image_urls().await.unwrap().len(), 1);

    let recipe = repo.set_image(2, recipe.version, None).await.unwrap();
    assert!(recipe.image_url.is_none());

    let verified = repo.verify(2).await.unwrap();
    assert!(verified.is_verified);
    assert!(verified.verified_at.is_some());

    repo.delete(2).await.unwrap();
    assert!(matches!(repo.get(2).await, Err(Error::RecipeNotFound(2))));
    assert!(matches!(repo.delete(2).await, Err(Error::RecipeNotFound(2))));
    assert_eq!(repo.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_invalid_order() {
    let conn = init_db().await;
    let repo = RecipeRepositoryImpl::new(conn);
    let params = ListingParams::new(0, 10).with_order(vec![Order::Asc("1; DROP TABLE".into())]);
    let res = repo.list(&RecipeFilter::default(), params).await;
    assert!(matches!(res, Err(Error::InvalidOrderByField(_))));
}

#[tokio::test]
async fn test_users() {
    let conn = init_db().await;
    let repo = UserRepositoryImpl::new(conn);

    let user = repo
        .create(CreateUser {
            email: "admin@recipes.local".parse().unwrap(),
            name: Some("Admin".into()),
            password: Some("Admin123!".into()),
            roles: Some(vec!["admin".into()]),
        })
        .await
        .unwrap();
    assert!(user.is_admin());

    let checked = repo
        .check_password("admin@recipes.local", "Admin123!")
        .await
        .unwrap();
    assert_eq!(checked.id, user.id);
    assert!(matches!(
        repo.check_password("admin@recipes.local", "wrong").await,
        Err(Error::InvalidCredentials)
    ));

    repo.change_password("admin@recipes.local", "Better456!")
        .await
        .unwrap();
    assert!(
        repo.check_password("admin@recipes.local", "Better456!")
            .await
            .is_ok()
    );
    assert_eq!(repo.list_admins().await.unwrap().len(), 1);
}
