use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_REVIEW_LEN: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub business_name: String,
    pub business_type: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    pub review_count: usize,
    pub language: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            business_name: "a local business".to_string(),
            business_type: "service".to_string(),
            owner_name: None,
            location: "India".to_string(),
            description: None,
            keywords: None,
            review_count: 5,
            language: "English".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub text: String,
    pub rating: u8,
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub language: String,
}

// Turns raw model output segments into Review objects. Segments below the
// minimum length are discarded unless that would discard everything non-empty.
pub fn format_reviews(texts: &[String], source: &str, language: &str) -> Vec<Review> {
    let trimmed: Vec<&str> = texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    let long_enough: Vec<&str> = trimmed
        .iter()
        .copied()
        .filter(|t| t.len() >= MIN_REVIEW_LEN)
        .collect();

    let kept = if long_enough.is_empty() { trimmed } else { long_enough };

    kept.into_iter()
        .map(|text| Review {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            rating: 5,
            source: source.to_string(),
            generated_at: Utc::now(),
            language: language.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatter_fixes_rating_and_assigns_unique_ids() {
        let texts = vec![
            "Great service, highly recommended to everyone.".to_string(),
            "The team was professional and quick to respond.".to_string(),
        ];
        let reviews = format_reviews(&texts, "groq", "English");
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().all(|r| r.rating == 5));
        assert!(reviews.iter().all(|r| r.source == "groq"));
        assert_ne!(reviews[0].id, reviews[1].id);
    }

    #[test]
    fn formatter_drops_near_empty_fragments() {
        let texts = vec![
            "ok".to_string(),
            "A genuinely solid experience from start to finish.".to_string(),
            "   ".to_string(),
        ];
        let reviews = format_reviews(&texts, "gemini", "English");
        assert_eq!(reviews.len(), 1);
        assert!(reviews[0].text.starts_with("A genuinely"));
    }

    #[test]
    fn formatter_keeps_terse_segments_when_nothing_else_survives() {
        let texts = vec!["Nice!".to_string(), "Good".to_string(), "".to_string()];
        let reviews = format_reviews(&texts, "groq", "English");
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].text, "Nice!");
    }

    #[test]
    fn formatter_is_stable_on_repeated_input() {
        let texts = vec!["Wonderful staff and a very clean space overall.".to_string()];
        let a = format_reviews(&texts, "groq", "Hindi");
        let b = format_reviews(&texts, "groq", "Hindi");
        assert_eq!(a.len(), b.len());
        assert_eq!(a[0].text, b[0].text);
        assert_ne!(a[0].id, b[0].id);
    }
}
