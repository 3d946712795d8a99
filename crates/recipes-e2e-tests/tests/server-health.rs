use recipes_e2e_tests::{base_url, prepare_env, spawn_server};
use serde_json::Value;
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_health() {
    let (args, _config_guard) = prepare_env("test_health").await.unwrap();
    let base_url = base_url(&args);

    spawn_server(args).await.unwrap();

    let client = reqwest::Client::new();

    let url = base_url.join("health").unwrap();
    let response = client.get(url).send().await.unwrap();
    info! {"Response: {:#?}", response};
    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
#[traced_test]
async fn test_openapi_docs() {
    let (args, _config_guard) = prepare_env("test_openapi_docs").await.unwrap();
    let base_url = base_url(&args);

    spawn_server(args).await.unwrap();
    let client = reqwest::Client::new();

    let url = base_url.join("api/docs/openapi.json").unwrap();
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success());
    let docs: Value = response.json().await.unwrap();
    let paths = docs["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/recipes"));
    assert!(paths.contains_key("/api/recipes/{id}"));
    assert!(paths.contains_key("/api/recipes/{id}/image"));
}

#[tokio::test]
#[traced_test]
async fn test_sample_recipes() {
    let (mut args, _config_guard) = prepare_env("test_sample_recipes").await.unwrap();
    args.no_sample_recipes = false;
    let base_url = base_url(&args);

    spawn_server(args).await.unwrap();
    let client = reqwest::Client::new();

    let url = base_url.join("api/recipes").unwrap();
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success());
    let list: Value = response.json().await.unwrap();
    assert_eq!(list["totalCount"], 3);

    let url = base_url.join("?lang=zh").unwrap();
    let response = client.get(url).send().await.unwrap();
    assert!(response.status().is_success());
    let page: Value = response.json().await.unwrap();
    assert_eq!(page["culture"], "zh");
    assert_eq!(page["recipes"].as_array().unwrap().len(), 3);
    let titles: Vec<&str> = page["recipes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert!(titles.contains(&"番茄炒蛋"));
}
