use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{GenerationConfig, PlatformStyle};

pub const REVIEW_DELIMITER: &str = "|||";

const TOPICS: &[&str] = &[
    "service quality",
    "staff behavior",
    "value for money",
    "ambiance and cleanliness",
    "quick response time",
    "professionalism",
    "overall experience",
    "ease of finding the place",
    "personal recommendation",
    "comparison with similar businesses",
];

fn sample_topics() -> Vec<&'static str> {
    let mut rng = rand::thread_rng();
    TOPICS
        .choose_multiple(&mut rng, 3)
        .copied()
        .collect()
}

fn language_block(language: &str) -> String {
    match language.trim().to_lowercase().as_str() {
        "hindi" => "LANGUAGE: Write every review in Hindi (Devanagari script). \
                    Natural, conversational Hindi as an everyday customer would write."
            .to_string(),
        "hinglish" => "LANGUAGE: Write every review in Hinglish (Hindi words in \
                       Latin script, mixed casually with English). Keep it natural, \
                       like a WhatsApp message."
            .to_string(),
        _ => "LANGUAGE: Write every review in English.".to_string(),
    }
}

fn style_block(style: PlatformStyle) -> String {
    let d = style.directives();
    format!(
        "PLATFORM STYLE ({}):\n\
         - Tone: {}\n\
         - Sound like: {}\n\
         - Natural vocabulary: {}\n\
         - Emojis: {}\n\
         - Avoid: {}",
        d.label,
        d.style,
        d.tone_examples,
        d.keywords,
        d.emoji.instruction(),
        d.avoid
    )
}

// Single-platform prompt. Output contract: reviews separated by the literal
// delimiter, nothing else.
pub fn build_prompt(config: &GenerationConfig, style: PlatformStyle) -> String {
    let topics = sample_topics();
    let seed: u32 = rand::thread_rng().gen_range(1000..10000);

    let mut prompt = format!(
        "Write {} different 5-star customer reviews for this business:\n\n\
         Business: {}\n\
         Type: {}\n\
         Location: {}\n",
        config.review_count, config.business_name, config.business_type, config.location
    );
    if let Some(owner) = &config.owner_name {
        prompt.push_str(&format!("Owner: {}\n", owner));
    }
    if let Some(description) = &config.description {
        prompt.push_str(&format!("About: {}\n", description));
    }
    if let Some(keywords) = &config.keywords {
        prompt.push_str(&format!("Highlights to weave in naturally: {}\n", keywords));
    }

    prompt.push_str(&format!("\n{}\n", style_block(style)));
    prompt.push_str(&format!("\n{}\n", language_block(&config.language)));
    prompt.push_str(&format!(
        "\nVary the angle across reviews; touch on topics like {}.\n\
         Each review is 1-3 sentences from a distinct customer voice. \
         Variation seed: {}.\n",
        topics.join(", "),
        seed
    ));
    prompt.push_str(&format!(
        "\nOUTPUT FORMAT: Return ONLY the review texts separated by {} \
         with no numbering, no quotes, no extra commentary.",
        REVIEW_DELIMITER
    ));
    prompt
}

// Multi-platform batch prompt. Output contract: one JSON object keyed by
// platform name, each value an array of review strings.
pub fn build_batch_prompt(config: &GenerationConfig, platforms: &[String]) -> String {
    let mut prompt = format!(
        "Write 5-star customer reviews for this business, styled per platform:\n\n\
         Business: {}\n\
         Type: {}\n\
         Location: {}\n",
        config.business_name, config.business_type, config.location
    );
    if let Some(description) = &config.description {
        prompt.push_str(&format!("About: {}\n", description));
    }
    if let Some(keywords) = &config.keywords {
        prompt.push_str(&format!("Highlights to weave in naturally: {}\n", keywords));
    }
    prompt.push_str(&format!("\n{}\n", language_block(&config.language)));

    prompt.push_str("\nPlatforms and their styles:\n");
    for name in platforms {
        let d = PlatformStyle::from_name(name).directives();
        prompt.push_str(&format!(
            "- {}: {} Emojis: {} Avoid: {}\n",
            name,
            d.style,
            d.emoji.instruction(),
            d.avoid
        ));
    }

    let keys = platforms
        .iter()
        .map(|p| format!("\"{}\": [\"...\"]", p))
        .collect::<Vec<_>>()
        .join(", ");
    prompt.push_str(&format!(
        "\nWrite {} reviews per platform, each 1-3 sentences, distinct voices.\n\
         OUTPUT FORMAT: Return ONLY a JSON object shaped like {{{}}} with no \
         commentary and no markdown fences.",
        config.review_count, keys
    ));
    prompt
}
