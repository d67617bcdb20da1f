use serde::{Deserialize, Serialize};

use crate::models::PlatformInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    pub slug: String,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub qr_token: Option<String>,
    pub business_name: String,
    pub business_type: String,
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub platforms: Vec<PlatformInfo>,
    #[serde(default)]
    pub language_pref: Vec<String>,
    pub is_active: bool,
}

impl BusinessProfile {
    pub fn preferred_language(&self) -> &str {
        self.language_pref
            .first()
            .map(|s| s.as_str())
            .unwrap_or("English")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_language_defaults_to_english() {
        let profile = BusinessProfile {
            slug: "demo".to_string(),
            subdomain: None,
            qr_token: None,
            business_name: "Demo Cafe".to_string(),
            business_type: "cafe".to_string(),
            location: "Pune".to_string(),
            description: None,
            keywords: None,
            owner_name: None,
            phone: None,
            email: None,
            website: None,
            platforms: vec![],
            language_pref: vec![],
            is_active: true,
        };
        assert_eq!(profile.preferred_language(), "English");
    }
}
