//! Fills the other language fields of a recipe by machine translation
//!
//! Language of a recipe is decided by its title: any CJK ideograph means Chinese.
//! Chinese input is kept in the `*_zh` fields and English translation replaces primary fields,
//! English input is kept and Chinese translation goes into `*_zh` fields.
//! Each field is translated separately, a failed field does not affect others.

use recipes_dal::recipe::RecipeContent;
use recipes_translate::{Language, Translate};
use recipes_types::utils::contains_cjk;
use tracing::debug;

async fn translate_field<T: Translate>(
    translator: &T,
    text: Option<&str>,
    from: Language,
    to: Language,
) -> Option<String> {
    match text {
        Some(text) if !text.trim().is_empty() => translator.translate(text, from, to).await,
        _ => None,
    }
}

/// Replaces value with translation if there is one
async fn translate_in_place<T: Translate>(translator: &T, value: &mut String) {
    if let Some(translated) =
        translate_field(translator, Some(value.as_str()), Language::Zh, Language::En).await
    {
        *value = translated;
    }
}

async fn translate_opt_in_place<T: Translate>(translator: &T, value: &mut Option<String>) {
    if let Some(translated) =
        translate_field(translator, value.as_deref(), Language::Zh, Language::En).await
    {
        *value = Some(translated);
    }
}

pub async fn translate_recipe<T: Translate>(translator: &T, content: &mut RecipeContent) {
    if !translator.is_configured() {
        debug!("Translator is not configured, skipping recipe translation");
        return;
    }

    if contains_cjk(&content.title) {
        debug!("Recipe {:?} is Chinese, translating to English", content.title);
        content.title_zh = Some(content.title.clone());
        content.description_zh = content.description.clone();
        content.ingredients_zh = Some(content.ingredients.clone());
        content.instructions_zh = Some(content.instructions.clone());
        content.category_zh = content.category.clone();

        translate_in_place(translator, &mut content.title).await;
        translate_opt_in_place(translator, &mut content.description).await;
        translate_in_place(translator, &mut content.ingredients).await;
        translate_in_place(translator, &mut content.instructions).await;
        translate_opt_in_place(translator, &mut content.category).await;
    } else {
        debug!("Recipe {:?} is English, translating to Chinese", content.title);
        let (from, to) = (Language::En, Language::Zh);
        content.title_zh = translate_field(translator, Some(content.title.as_str()), from, to).await;
        content.description_zh =
            translate_field(translator, content.description.as_deref(), from, to).await;
        content.ingredients_zh =
            translate_field(translator, Some(content.ingredients.as_str()), from, to).await;
        content.instructions_zh =
            translate_field(translator, Some(content.instructions.as_str()), from, to).await;
        content.category_zh =
            translate_field(translator, content.category.as_deref(), from, to).await;
    }
}
