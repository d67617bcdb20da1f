use serde::{Deserialize, Serialize};

// Closed set of platform styles; unknown platform names map to Generic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformStyle {
    Google,
    Facebook,
    Instagram,
    Trustpilot,
    JustDial,
    AmbitionBox,
    TripAdvisor,
    Zomato,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiPolicy {
    None,
    RareMaxOne,
    Optional,
    Encouraged,
}

pub struct StyleDirectives {
    pub label: &'static str,
    pub style: &'static str,
    pub emoji: EmojiPolicy,
    pub tone_examples: &'static str,
    pub keywords: &'static str,
    pub avoid: &'static str,
}

impl PlatformStyle {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "google" => PlatformStyle::Google,
            "facebook" => PlatformStyle::Facebook,
            "instagram" => PlatformStyle::Instagram,
            "trustpilot" => PlatformStyle::Trustpilot,
            "justdial" => PlatformStyle::JustDial,
            "ambitionbox" => PlatformStyle::AmbitionBox,
            "tripadvisor" => PlatformStyle::TripAdvisor,
            "zomato" => PlatformStyle::Zomato,
            _ => PlatformStyle::Generic,
        }
    }

    pub fn directives(&self) -> StyleDirectives {
        match self {
            PlatformStyle::Google => StyleDirectives {
                label: "GOOGLE REVIEWS",
                style: "Balanced, helpful, local guide style.",
                emoji: EmojiPolicy::Optional,
                tone_examples: "\"I visited...\", \"Good service...\", \"Professional team...\"",
                keywords: "professional, quality, responsive, good value",
                avoid: "marketing superlatives, repeated phrasing",
            },
            PlatformStyle::Facebook => StyleDirectives {
                label: "FACEBOOK",
                style: "Personal, community-focused, casual and friendly.",
                emoji: EmojiPolicy::Encouraged,
                tone_examples: "\"Just wanted to recommend...\", \"Had a great experience...\", \"Highly recommended!\"",
                keywords: "service, friendly, helpful, recommended, thanks",
                avoid: "formal language, strict corporate tone",
            },
            PlatformStyle::Instagram => StyleDirectives {
                label: "INSTAGRAM",
                style: "Short, expressive, trend-aware caption voice.",
                emoji: EmojiPolicy::Encouraged,
                tone_examples: "\"Loved the vibe here\", \"Totally worth it\", \"Obsessed with the experience\"",
                keywords: "vibe, love, experience, amazing",
                avoid: "long paragraphs, stiff phrasing",
            },
            PlatformStyle::Trustpilot => StyleDirectives {
                label: "TRUSTPILOT",
                style: "Formal, verified, objective and service-oriented.",
                emoji: EmojiPolicy::None,
                tone_examples: "\"Excellent service provided...\", \"Transparent process...\", \"Trustworthy business...\"",
                keywords: "transparency, trust, professional, efficiently, process",
                avoid: "slang, emojis, overly casual language",
            },
            PlatformStyle::JustDial => StyleDirectives {
                label: "JUSTDIAL",
                style: "Practical, value-for-money focused, direct.",
                emoji: EmojiPolicy::RareMaxOne,
                tone_examples: "\"Got a quick response...\", \"Reasonable pricing...\", \"Genuine service provider...\"",
                keywords: "price, response, genuine, local, value",
                avoid: "flowery language",
            },
            PlatformStyle::AmbitionBox => StyleDirectives {
                label: "AMBITIONBOX",
                style: "Workplace-review tone, measured and specific.",
                emoji: EmojiPolicy::None,
                tone_examples: "\"Good work culture...\", \"Supportive management...\", \"Learned a lot here...\"",
                keywords: "work culture, management, growth, supportive",
                avoid: "customer-review phrasing, emojis",
            },
            PlatformStyle::TripAdvisor => StyleDirectives {
                label: "TRIPADVISOR",
                style: "Traveler/visitor perspective, descriptive.",
                emoji: EmojiPolicy::RareMaxOne,
                tone_examples: "\"Visited recently...\", \"Great atmosphere...\", \"Must visit place...\"",
                keywords: "experience, atmosphere, visit, location, view",
                avoid: "corporate tone",
            },
            PlatformStyle::Zomato => StyleDirectives {
                label: "ZOMATO",
                style: "Foodie, taste-focused, enthusiastic.",
                emoji: EmojiPolicy::Encouraged,
                tone_examples: "\"The taste was amazing...\", \"Service was quick...\", \"Best place for...\"",
                keywords: "taste, ambiance, service, menu, flavor, delicious",
                avoid: "generic non-food phrasing",
            },
            PlatformStyle::Generic => StyleDirectives {
                label: "REVIEWS",
                style: "Balanced and professional.",
                emoji: EmojiPolicy::RareMaxOne,
                tone_examples: "\"Great experience overall...\", \"Would recommend...\"",
                keywords: "service, quality, recommended",
                avoid: "repeated phrasing",
            },
        }
    }
}

impl EmojiPolicy {
    pub fn instruction(&self) -> &'static str {
        match self {
            EmojiPolicy::None => "NO. Absolutely none.",
            EmojiPolicy::RareMaxOne => "Minimal (at most 1 per review).",
            EmojiPolicy::Optional => "Optional (0-1 per review).",
            EmojiPolicy::Encouraged => "Yes (1-2 per review).",
        }
    }
}

impl std::fmt::Display for PlatformStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformStyle::Google => write!(f, "Google"),
            PlatformStyle::Facebook => write!(f, "Facebook"),
            PlatformStyle::Instagram => write!(f, "Instagram"),
            PlatformStyle::Trustpilot => write!(f, "Trustpilot"),
            PlatformStyle::JustDial => write!(f, "JustDial"),
            PlatformStyle::AmbitionBox => write!(f, "AmbitionBox"),
            PlatformStyle::TripAdvisor => write!(f, "TripAdvisor"),
            PlatformStyle::Zomato => write!(f, "Zomato"),
            PlatformStyle::Generic => write!(f, "Generic"),
        }
    }
}

// Per-tenant platform metadata as stored in the profile's platforms column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_map_to_their_style() {
        assert_eq!(PlatformStyle::from_name("Google"), PlatformStyle::Google);
        assert_eq!(PlatformStyle::from_name("  trustpilot "), PlatformStyle::Trustpilot);
        assert_eq!(PlatformStyle::from_name("ZOMATO"), PlatformStyle::Zomato);
    }

    #[test]
    fn unknown_names_fall_back_to_generic() {
        assert_eq!(PlatformStyle::from_name("yelp"), PlatformStyle::Generic);
        assert_eq!(PlatformStyle::from_name(""), PlatformStyle::Generic);
    }

    #[test]
    fn trustpilot_forbids_emojis() {
        let directives = PlatformStyle::Trustpilot.directives();
        assert_eq!(directives.emoji, EmojiPolicy::None);
    }
}
