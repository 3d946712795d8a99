use recipes_dal::recipe::Recipe;
use recipes_e2e_tests::{
    base_url, extend_url, launch_env, prepare_env,
    rest::{create_recipe, get_recipe, recipe_payload},
};
use serde_json::{Value, json};
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_recipe_crud() {
    let (args, _config_guard) = prepare_env("test_recipe_crud").await.unwrap();
    let base_url = base_url(&args);
    let (client, _) = launch_env(args).await.unwrap();
    let api_url = base_url.join("api/recipes").unwrap();

    let recipe = create_recipe(&client, &base_url, &recipe_payload("Bread"))
        .await
        .unwrap();
    assert!(recipe.id > 0);
    assert_eq!(recipe.title, "Bread");
    assert_eq!(recipe.servings, 4);
    assert_eq!(recipe.prep_time_minutes, 10);
    assert!(recipe.updated_at.is_none());
    assert!(!recipe.is_verified);
    // translator is not configured
    assert!(recipe.title_zh.is_none());

    let record_url = extend_url(&api_url, recipe.id);
    let fetched = get_recipe(&client, &base_url, recipe.id).await.unwrap();
    assert_eq!(fetched.title, "Bread");

    let response = client
        .put(record_url.clone())
        .json(&json!({"servings": 8, "description": "Crusty"}))
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert!(response.status().is_success());
    let updated: Recipe = response.json().await.unwrap();
    assert_eq!(updated.servings, 8);
    assert_eq!(updated.description.as_deref(), Some("Crusty"));
    assert_eq!(updated.title, "Bread");
    assert_eq!(updated.ingredients, recipe.ingredients);
    assert_eq!(updated.version, recipe.version + 1);
    let updated_at = updated.updated_at.unwrap();
    assert!(updated_at >= recipe.created_at);

    // stale version
    let response = client
        .put(record_url.clone())
        .json(&json!({"title": "Old bread", "version": recipe.version}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Conflict");

    // full delete is not part of REST API
    let response = client.delete(record_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 405);
}

#[tokio::test]
#[traced_test]
async fn test_not_found() {
    let (args, _config_guard) = prepare_env("test_not_found").await.unwrap();
    let base_url = base_url(&args);
    let (client, _) = launch_env(args).await.unwrap();

    let url = base_url.join("api/recipes/9999").unwrap();
    let response = client.get(url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Recipe not found");
    assert_eq!(body["message"], "No recipe exists with ID 9999");

    let response = client
        .put(url)
        .json(&json!({"title": "Nothing"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_validation() {
    let (args, _config_guard) = prepare_env("test_validation").await.unwrap();
    let base_url = base_url(&args);
    let (client, _) = launch_env(args).await.unwrap();
    let api_url = base_url.join("api/recipes").unwrap();

    let mut payload = recipe_payload("Bad");
    payload["title"] = json!("   ");
    payload["servings"] = json!(0);
    let response = client.post(api_url.clone()).json(&payload).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Validation failed");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("title"));
    assert!(message.contains("servings"));

    let mut payload = recipe_payload("Too long");
    payload["prepTimeMinutes"] = json!(1441);
    let response = client.post(api_url.clone()).json(&payload).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let mut url = api_url.clone();
    url.set_query(Some("limit=500"));
    let response = client.get(url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[traced_test]
async fn test_listing() {
    let (args, _config_guard) = prepare_env("test_listing").await.unwrap();
    let base_url = base_url(&args);
    let (client, _) = launch_env(args).await.unwrap();
    let api_url = base_url.join("api/recipes").unwrap();

    let titles = ["Waffles", "Apple pie", "Meatballs", "Dumplings", "Cheesecake"];
    for title in titles {
        let mut payload = recipe_payload(title);
        if title == "Meatballs" {
            payload["ingredients"] = json!("beef, onion, nutmeg");
            payload["category"] = json!("Main");
        }
        create_recipe(&client, &base_url, &payload).await.unwrap();
    }

    let list = |query: &str| {
        let mut url = api_url.clone();
        url.set_query(Some(query));
        let client = client.clone();
        async move {
            let response = client.get(url).send().await.unwrap();
            info!("Response: {:#?}", response);
            assert!(response.status().is_success());
            response.json::<Value>().await.unwrap()
        }
    };

    let all = list("limit=50&offset=0").await;
    assert_eq!(all["totalCount"], 5);
    assert_eq!(all["limit"], 50);
    let names: Vec<&str> = all["recipes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["Apple pie", "Cheesecake", "Dumplings", "Meatballs", "Waffles"]
    );

    let page = list("limit=2&offset=2").await;
    assert_eq!(page["totalCount"], 5);
    assert_eq!(page["offset"], 2);
    let recipes = page["recipes"].as_array().unwrap();
    assert_eq!(recipes.len(), 2);
    assert_eq!(recipes[0]["title"], "Dumplings");

    let found = list("search=NUTMEG").await;
    assert_eq!(found["totalCount"], 1);
    assert_eq!(found["recipes"][0]["title"], "Meatballs");

    let found = list("search=nonexistent-xyz").await;
    assert_eq!(found["totalCount"], 0);
    assert!(found["recipes"].as_array().unwrap().is_empty());

    let found = list("category=main").await;
    assert_eq!(found["totalCount"], 1);

    let url = base_url.join("api/recipes/categories").unwrap();
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success());
    let categories: Value = response.json().await.unwrap();
    assert_eq!(categories, json!({"categories": ["Main", "Test"]}));
}
