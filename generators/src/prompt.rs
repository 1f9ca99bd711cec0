//! Prompt construction for ad copy, mascot action and image prompts

use regex::Regex;
use std::sync::OnceLock;

use shared::Product;

/// Audience and setting for one advertisement
#[derive(Debug, Clone, Copy)]
pub struct AdBrief<'a> {
    pub product: &'a Product,
    pub weather: &'a str,
    pub region: &'a str,
    pub gender: &'a str,
    /// Descriptive age range such as "25-40", resolved from the age bracket
    pub age_range: &'a str,
    pub job: &'a str,
}

/// Prompt asking for a single humorous sentence of ad copy, translated to Thai
pub fn ad_copy_prompt(brief: &AdBrief<'_>) -> String {
    let product = brief.product;
    format!(
        "Write a funny, upbeat and interesting line of advertising for {name}, \
         which is a kind of {sub_class} (or more broadly {class}), that makes customers want to buy it. \
         It should feel like a {weather} day. \
         Keep it to a single sentence with a sense of humour. \
         It must not be rude or contain anything negative. \
         Then translate the sentence into Thai.",
        name = product.product_name,
        sub_class = product.sub_class,
        class = product.class,
        weather = brief.weather.to_lowercase(),
    )
}

/// Prompt asking what the mascot is doing in the advertisement
pub fn character_action_prompt(brief: &AdBrief<'_>) -> String {
    let product = brief.product;
    format!(
        "In one sentence, describe the action of the main character of an advertisement for \
         {sub_class} or {class} that would make a {gender} customer aged {age_range} years want to buy it. \
         Reply with the description of the action only.",
        sub_class = product.sub_class,
        class = product.class,
        gender = brief.gender.to_lowercase(),
        age_range = brief.age_range,
    )
}

/// Prompt asking the text model to rewrite the mascot scene into an image prompt
pub fn image_prompt_request(brief: &AdBrief<'_>, character_action: &str) -> String {
    let product = brief.product;
    let scene = format!(
        "a cartoon photo of a fluffy yellow chick using a {sub_class} {action} in a style similar to a Pixar cartoon character",
        sub_class = product.sub_class,
        action = character_action.trim(),
    );

    format!(
        "Rewrite \"{scene}\" into an image generation prompt.\n\
         Example: A sketch of a modern apartment building surrounded by skyscrapers.\n\
         \"A sketch\" is a style. \"A modern apartment building\" is a subject. \
         \"Surrounded by skyscrapers\" is a context and background.\n\
         \n\
         Styles to draw inspiration from:\n\
         - Art Deco\n\
         - Realistic or photorealistic\n\
         \n\
         Context and background to draw inspiration from:\n\
         - the picture should catch the attention of a {gender} viewer aged {age_range} years, \
         working as a {job}, on a {weather} day in the {region} of Thailand.\n\
         - focus on humour\n\
         \n\
         Branding:\n\
         - subtly incorporate the {brand} logo or brand colours into the image.\n\
         - the {brand} logo may be displayed prominently or as part of the background design.\n\
         \n\
         There must be no humans and no harassing message in the image. \
         Remove any person, face or text from the prompt.\n\
         Rewritten prompt:",
        scene = scene,
        gender = brief.gender.to_lowercase(),
        age_range = brief.age_range,
        job = brief.job.to_lowercase(),
        weather = brief.weather.to_lowercase(),
        region = brief.region.to_lowercase(),
        brand = product.brand,
    )
}

fn thai_run_regex() -> &'static Regex {
    static THAI_RUN: OnceLock<Regex> = OnceLock::new();
    THAI_RUN.get_or_init(|| Regex::new("[ก-๙]+").expect("Thai character class is a valid pattern"))
}

/// Keep only runs of Thai characters, joined by single spaces
pub fn extract_thai_text(text: &str) -> String {
    thai_run_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
