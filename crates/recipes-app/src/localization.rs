use std::collections::BTreeMap;

use phf::phf_map;
use recipes_types::Culture;

static EN: phf::Map<&'static str, &'static str> = phf_map! {
    "RecipeBook" => "Recipe Book",
    "Home" => "Home",
    "Recipes" => "Recipes",
    "WelcomeTitle" => "Welcome to Recipe Book",
    "WelcomeDescription" => "Discover, save, and share delicious recipes. From quick weeknight dinners to impressive party dishes, find your next culinary adventure here.",
    "BrowseRecipes" => "Browse Recipes",
    "RecentlyAdded" => "Recently Added",
    "RecipeCollection" => "Recipe Collection",
    "Search" => "Search",
    "SearchPlaceholder" => "Search by title or description...",
    "Category" => "Category",
    "AllCategories" => "All Categories",
    "Filter" => "Filter",
    "SelectAll" => "Select All",
    "PrintSelected" => "Print Selected",
    "PrintAll" => "Print All",
    "View" => "View",
    "Edit" => "Edit",
    "Delete" => "Delete",
    "NoRecipes" => "No recipes found.",
    "Minutes" => "Minutes",
    "Servings" => "Servings",
    "PrepTime" => "Prep Time",
    "CookTime" => "Cook Time",
    "TotalTime" => "Total Time",
    "Ingredients" => "Ingredients",
    "Instructions" => "Instructions",
    "Print" => "Print",
    "BackToRecipes" => "Back to Recipes",
    "RecipeNotFound" => "Recipe not found.",
    "Verified" => "Verified Recipe",
    "CreateRecipe" => "Create Recipe",
    "EditRecipe" => "Edit Recipe",
    "Title" => "Title",
    "Description" => "Description",
    "UploadImage" => "Upload Image",
    "ConfirmDelete" => "Are you sure you want to delete this recipe?",
};

static ZH: phf::Map<&'static str, &'static str> = phf_map! {
    "RecipeBook" => "食谱本",
    "Home" => "首页",
    "Recipes" => "食谱",
    "WelcomeTitle" => "欢迎来到食谱本",
    "WelcomeDescription" => "发现、保存和分享美味食谱。从快速的工作日晚餐到令人印象深刻的派对菜肴，在这里找到您的下一次烹饪冒险。",
    "BrowseRecipes" => "浏览食谱",
    "RecentlyAdded" => "最近添加",
    "RecipeCollection" => "食谱收藏",
    "Search" => "搜索",
    "SearchPlaceholder" => "按标题或描述搜索...",
    "Category" => "类别",
    "AllCategories" => "所有类别",
    "Filter" => "筛选",
    "SelectAll" => "全选",
    "PrintSelected" => "打印所选",
    "PrintAll" => "打印全部",
    "View" => "查看",
    "Edit" => "编辑",
    "Delete" => "删除",
    "NoRecipes" => "未找到食谱。",
    "Minutes" => "分钟",
    "Servings" => "份",
    "PrepTime" => "准备时间",
    "CookTime" => "烹饪时间",
    "TotalTime" => "总时间",
    "Ingredients" => "食材",
    "Instructions" => "步骤",
    "Print" => "打印",
    "BackToRecipes" => "返回食谱",
    "RecipeNotFound" => "未找到食谱。",
    "Verified" => "已验证食谱",
    "CreateRecipe" => "创建食谱",
    "EditRecipe" => "编辑食谱",
    "Title" => "标题",
    "Description" => "描述",
    "UploadImage" => "上传图片",
    "ConfirmDelete" => "确定要删除此食谱吗？",
};

fn table(culture: Culture) -> &'static phf::Map<&'static str, &'static str> {
    match culture {
        Culture::En => &EN,
        Culture::Zh => &ZH,
    }
}

/// UI text for key, unknown key is returned as is
pub fn text(culture: Culture, key: &str) -> &str {
    table(culture).get(key).copied().unwrap_or(key)
}

/// Whole string table for culture
pub fn strings(culture: Culture) -> BTreeMap<&'static str, &'static str> {
    let localized = table(culture);
    EN.entries()
        .map(|(key, en)| (*key, localized.get(*key).copied().unwrap_or(*en)))
        .collect()
}
