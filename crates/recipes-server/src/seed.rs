//! Initial data for fresh installation

use recipes_dal::{
    recipe::{RecipeContent, RecipeRepository},
    user::{CreateUser, UserRepository},
    Pool,
};
use recipes_types::{claim::Role, general::ValidEmail};
use tracing::{debug, info};

use crate::{
    config::ServerConfig,
    error::{Error, Result},
};

pub async fn seed(pool: &Pool, config: &ServerConfig) -> Result<()> {
    if let (Some(email), Some(password)) = (&config.seed_admin_email, &config.seed_admin_password) {
        seed_admin(pool, email, password).await?;
    }
    if !config.no_sample_recipes {
        seed_recipes(pool).await?;
    }
    Ok(())
}

async fn seed_admin(pool: &Pool, email: &str, password: &str) -> Result<()> {
    let users = UserRepository::new(pool.clone());
    if !users.list_admins().await?.is_empty() {
        debug!("Administrator already exists");
        return Ok(());
    }
    let email: ValidEmail = email
        .parse()
        .map_err(|e| Error::Seed(format!("invalid admin email {email}: {e}")))?;
    let user = users
        .create(CreateUser {
            email,
            name: Some("Administrator".to_string()),
            password: Some(password.to_string()),
            roles: Some(vec![Role::ADMIN.to_string()]),
        })
        .await?;
    info!("Created administrator {}", user.email);
    Ok(())
}

fn sample_recipes() -> Vec<RecipeContent> {
    vec![
        RecipeContent {
            title: "Tomato Egg Stir-Fry".into(),
            description: Some("Quick home style dish, ready in fifteen minutes.".into()),
            ingredients: "4 eggs\n3 ripe tomatoes\n1 spring onion\n1 tsp sugar\nSalt\n2 tbsp oil".into(),
            instructions: "Beat eggs with a pinch of salt and scramble them softly, set aside.\nFry tomato wedges until juicy, add sugar and salt.\nReturn eggs, toss briefly and finish with spring onion.".into(),
            category: Some("Main Course".into()),
            title_zh: Some("番茄炒蛋".into()),
            description_zh: Some("快手家常菜，十五分钟上桌。".into()),
            ingredients_zh: Some("鸡蛋4个\n熟番茄3个\n葱1根\n糖1茶匙\n盐\n油2汤匙".into()),
            instructions_zh: Some("鸡蛋加少许盐打散，炒至嫩滑盛出。\n番茄块炒出汁，加糖和盐。\n倒回鸡蛋，翻炒均匀，撒葱花出锅。".into()),
            category_zh: Some("主菜".into()),
            prep_time_minutes: 5,
            cook_time_minutes: 10,
            servings: 2,
        },
        RecipeContent {
            title: "Classic Pancakes".into(),
            description: Some("Fluffy breakfast pancakes.".into()),
            ingredients: "200 g flour\n2 eggs\n300 ml milk\n1 tbsp sugar\n2 tsp baking powder\nPinch of salt".into(),
            instructions: "Whisk dry ingredients.\nAdd eggs and milk, mix until just combined.\nCook ladlefuls on a hot buttered pan until golden on both sides.".into(),
            category: Some("Breakfast".into()),
            title_zh: Some("经典松饼".into()),
            description_zh: Some("松软的早餐松饼。".into()),
            ingredients_zh: Some("面粉200克\n鸡蛋2个\n牛奶300毫升\n糖1汤匙\n泡打粉2茶匙\n盐少许".into()),
            instructions_zh: Some("混合干性材料。\n加入鸡蛋和牛奶，拌匀即可。\n热锅抹黄油，舀入面糊煎至两面金黄。".into()),
            category_zh: Some("早餐".into()),
            prep_time_minutes: 10,
            cook_time_minutes: 15,
            servings: 4,
        },
        RecipeContent {
            title: "Chocolate Chip Cookies".into(),
            description: Some("Crisp edges and chewy centers.".into()),
            ingredients: "225 g butter\n200 g brown sugar\n2 eggs\n280 g flour\n1 tsp baking soda\n300 g chocolate chips".into(),
            instructions: "Cream butter and sugar, beat in eggs.\nStir in flour and baking soda, fold in chocolate chips.\nBake spoonfuls at 190 C for 10 minutes.".into(),
            category: Some("Dessert".into()),
            title_zh: Some("巧克力曲奇".into()),
            description_zh: Some("边缘酥脆，中心耐嚼。".into()),
            ingredients_zh: Some("黄油225克\n红糖200克\n鸡蛋2个\n面粉280克\n小苏打1茶匙\n巧克力豆300克".into()),
            instructions_zh: Some("黄油和糖打发，加入鸡蛋搅匀。\n拌入面粉和小苏打，再拌入巧克力豆。\n用勺舀成小团，190度烤10分钟。".into()),
            category_zh: Some("甜点".into()),
            prep_time_minutes: 15,
            cook_time_minutes: 10,
            servings: 24,
        },
    ]
}

async fn seed_recipes(pool: &Pool) -> Result<()> {
    let recipes = RecipeRepository::new(pool.clone());
    if recipes.count().await? > 0 {
        return Ok(());
    }
    let samples = sample_recipes();
    let count = samples.len();
    for content in samples {
        recipes.create(content).await?;
    }
    info!("Added {count} sample recipes");
    Ok(())
}
