use base64::Engine as _;
use recipes_dal::recipe::Recipe;
use recipes_e2e_tests::{
    base_url, launch_env, prepare_env,
    rest::{TINY_PNG, create_recipe, recipe_payload, upload_png},
};
use serde_json::{Value, json};
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_image_upload_and_delete() {
    let (args, config_guard) = prepare_env("test_image_upload").await.unwrap();
    let base_url = base_url(&args);
    let images_dir = config_guard.data_dir().join("images").join("recipes");
    let (client, _) = launch_env(args).await.unwrap();

    let recipe = create_recipe(&client, &base_url, &recipe_payload("Cake"))
        .await
        .unwrap();

    let response = upload_png(&client, &base_url, recipe.id, "cake photo.png")
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert!(response.status().is_success());
    let with_image: Recipe = response.json().await.unwrap();
    let first_url = with_image.image_url.clone().unwrap();
    assert!(first_url.starts_with(&format!("/images/recipes/recipe-{}-", recipe.id)));
    assert!(first_url.ends_with(".png"));

    // served as static file
    let response = client
        .get(base_url.join(&first_url).unwrap())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(response.bytes().await.unwrap().as_ref(), TINY_PNG);

    // replacement removes previous file
    let data_url = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(TINY_PNG)
    );
    let image_url = base_url.join(&format!("api/recipes/{}/image", recipe.id)).unwrap();
    let response = client
        .put(image_url.clone())
        .json(&json!({"imageBase64": data_url, "fileName": "other.png"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let replaced: Recipe = response.json().await.unwrap();
    let second_url = replaced.image_url.clone().unwrap();
    assert_ne!(first_url, second_url);
    let files = std::fs::read_dir(&images_dir).unwrap().count();
    assert_eq!(files, 1);
    let response = client
        .get(base_url.join(&first_url).unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // image/jpg is common alias of image/jpeg
    let data_url = format!(
        "data:image/jpg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(b"jpeg bytes")
    );
    let response = client
        .put(image_url.clone())
        .json(&json!({"imageBase64": data_url}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let jpg: Recipe = response.json().await.unwrap();
    assert!(jpg.image_url.unwrap().ends_with(".jpg"));
    assert_eq!(std::fs::read_dir(&images_dir).unwrap().count(), 1);

    let response = client.delete(image_url).send().await.unwrap();
    assert!(response.status().is_success());
    let detached: Recipe = response.json().await.unwrap();
    assert!(detached.image_url.is_none());
    let files = std::fs::read_dir(&images_dir).unwrap().count();
    assert_eq!(files, 0);
}

#[tokio::test]
#[traced_test]
async fn test_invalid_images() {
    let (args, _config_guard) = prepare_env("test_invalid_images").await.unwrap();
    let base_url = base_url(&args);
    let (client, _) = launch_env(args).await.unwrap();

    let recipe = create_recipe(&client, &base_url, &recipe_payload("Soup"))
        .await
        .unwrap();
    let image_url = base_url.join(&format!("api/recipes/{}/image", recipe.id)).unwrap();

    // unsupported extension
    let part = reqwest::multipart::Part::bytes(TINY_PNG.to_vec())
        .file_name("soup.bmp")
        .mime_str("image/bmp")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);
    let response = client.post(image_url.clone()).multipart(form).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid image");
    assert_eq!(
        body["message"],
        "Invalid image file. Allowed types: .jpg, .jpeg, .png, .gif, .webp. Max size: 5MB"
    );

    // content type does not match extension
    let part = reqwest::multipart::Part::bytes(TINY_PNG.to_vec())
        .file_name("soup.png")
        .mime_str("image/jpeg")
        .unwrap();
    let form = reqwest::multipart::Form::new().part("file", part);
    let response = client.post(image_url.clone()).multipart(form).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // missing file field
    let form = reqwest::multipart::Form::new().text("other", "value");
    let response = client.post(image_url.clone()).multipart(form).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No file provided");

    let response = client
        .put(image_url.clone())
        .json(&json!({"imageBase64": "not base64 at all!"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid image");

    let response = upload_png(&client, &base_url, 9999, "x.png").await.unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let recipe: Recipe = client
        .get(base_url.join(&format!("api/recipes/{}", recipe.id)).unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(recipe.image_url.is_none());
}
