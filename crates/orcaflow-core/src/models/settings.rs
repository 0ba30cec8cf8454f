use serde::{Deserialize, Serialize};

use super::Id;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Language {
    #[default]
    English,
    Vietnamese,
    #[serde(rename = "Bilingual (EN + VI)")]
    Bilingual,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Vietnamese, Language::Bilingual];

    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Vietnamese => "Vietnamese",
            Language::Bilingual => "Bilingual (EN + VI)",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum DateFormat {
    #[default]
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
    #[serde(rename = "DD/MM/YYYY")]
    DayFirst,
    #[serde(rename = "MM/DD/YYYY")]
    MonthFirst,
}

impl DateFormat {
    pub const ALL: [DateFormat; 3] = [DateFormat::Iso, DateFormat::DayFirst, DateFormat::MonthFirst];

    pub fn label(&self) -> &'static str {
        match self {
            DateFormat::Iso => "YYYY-MM-DD",
            DateFormat::DayFirst => "DD/MM/YYYY",
            DateFormat::MonthFirst => "MM/DD/YYYY",
        }
    }

    /// Equivalent chrono format string.
    pub fn chrono_format(&self) -> &'static str {
        match self {
            DateFormat::Iso => "%Y-%m-%d",
            DateFormat::DayFirst => "%d/%m/%Y",
            DateFormat::MonthFirst => "%m/%d/%Y",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == label)
    }
}

// ============================================================================
// Tenant settings
// ============================================================================

/// Brand voice the content tools write in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BrandSettings {
    #[serde(default)]
    pub industry: String,
    #[serde(rename = "targetAudience", default)]
    pub target_audience: String,
    #[serde(default)]
    pub offerings: String,
    #[serde(default)]
    pub archetype: String,
    #[serde(default)]
    pub tone: String,
    #[serde(rename = "defaultLanguage", default)]
    pub default_language: Language,
    #[serde(default)]
    pub exemplar: String,
    #[serde(rename = "forbiddenKeywords", default)]
    pub forbidden_keywords: Vec<String>,
}

impl Default for BrandSettings {
    fn default() -> Self {
        Self {
            industry: "B2B SaaS / Automation".to_string(),
            target_audience: "SME Founders & Tech Managers".to_string(),
            offerings: "OrcaFlow CRM, AI Content Planner, Workflow Automation".to_string(),
            archetype: "The Magician (Transformative, Dynamic)".to_string(),
            tone: "Expert, encouraging, and clear".to_string(),
            default_language: Language::English,
            exemplar: "Automation isn\u{2019}t about replacing talent; it\u{2019}s about giving talent the space to lead."
                .to_string(),
            forbidden_keywords: vec![
                "clunky".to_string(),
                "difficult".to_string(),
                "expensive".to_string(),
            ],
        }
    }
}

impl BrandSettings {
    /// Forbidden keywords as the comma-separated text shown in forms.
    pub fn keywords_csv(&self) -> String {
        self.forbidden_keywords.join(", ")
    }

    pub fn set_keywords_csv(&mut self, csv: &str) {
        self.forbidden_keywords = parse_keywords(csv);
    }
}

/// Split a comma-separated keyword list, trimming and dropping empty entries.
pub fn parse_keywords(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SystemSettings {
    #[serde(rename = "businessName", default)]
    pub business_name: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(rename = "dateFormat", default)]
    pub date_format: DateFormat,
    #[serde(default)]
    pub currency: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            business_name: String::new(),
            timezone: "ICT (Bangkok, Hanoi, Jakarta)".to_string(),
            date_format: DateFormat::Iso,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Settings {
    #[serde(default)]
    pub id: Id,
    #[serde(rename = "tenantId", default)]
    pub tenant_id: String,
    #[serde(rename = "brandSettings", default)]
    pub brand_settings: BrandSettings,
    #[serde(rename = "systemSettings", default)]
    pub system_settings: SystemSettings,
}

/// `GET /tenant/settings` envelope. The list holds at most one record per tenant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetSettingsResponse {
    #[serde(rename = "statusCode", default)]
    pub status_code: u16,
    #[serde(rename = "brandSettings", default)]
    pub brand_settings: Vec<Settings>,
}

impl GetSettingsResponse {
    pub fn into_first(self) -> Option<Settings> {
        self.brand_settings.into_iter().next()
    }
}

/// Body of `PUT /tenant/settings`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateSettingsRequest<'a> {
    #[serde(rename = "brandSettings")]
    pub brand_settings: &'a BrandSettings,
    #[serde(rename = "systemSettings")]
    pub system_settings: &'a SystemSettings,
}

// ============================================================================
// Local-only agent settings
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFeatures {
    #[serde(default)]
    pub planner: bool,
    #[serde(default)]
    pub chat: bool,
}

/// Bring-your-own AI provider settings. Never sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAgentSettings {
    #[serde(default)]
    pub platform: String,
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
    #[serde(default)]
    pub features: AgentFeatures,
}

impl Default for CustomAgentSettings {
    fn default() -> Self {
        Self {
            platform: "Google Gemini".to_string(),
            api_key: String::new(),
            features: AgentFeatures::default(),
        }
    }
}

impl CustomAgentSettings {
    /// API key with everything but the last four characters hidden.
    pub fn masked_key(&self) -> String {
        let count = self.api_key.chars().count();
        if count == 0 {
            return String::new();
        }
        let visible: String = self.api_key.chars().skip(count.saturating_sub(4)).collect();
        format!("{}{}", "*".repeat(count.saturating_sub(4)), visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_settings_response() {
        let json = r#"{
            "statusCode": 200,
            "brandSettings": [{
                "id": 1,
                "tenantId": "tenant-42",
                "brandSettings": {
                    "industry": "Retail",
                    "targetAudience": "Shoppers",
                    "offerings": "Shoes",
                    "archetype": "The Hero",
                    "tone": "Bold",
                    "defaultLanguage": "Bilingual (EN + VI)",
                    "exemplar": "Run further.",
                    "forbiddenKeywords": ["cheap"]
                },
                "systemSettings": {
                    "businessName": "Acme",
                    "timezone": "UTC",
                    "dateFormat": "DD/MM/YYYY",
                    "currency": "VND"
                }
            }]
        }"#;

        let response: GetSettingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status_code, 200);
        let settings = response.into_first().unwrap();
        assert_eq!(settings.tenant_id, "tenant-42");
        assert_eq!(settings.brand_settings.default_language, Language::Bilingual);
        assert_eq!(settings.system_settings.date_format, DateFormat::DayFirst);
        assert_eq!(settings.brand_settings.forbidden_keywords, vec!["cheap"]);
    }

    #[test]
    fn test_empty_settings_response_has_no_record() {
        let response: GetSettingsResponse = serde_json::from_str(r#"{"statusCode": 200}"#).unwrap();
        assert!(response.into_first().is_none());
    }

    #[test]
    fn test_brand_defaults() {
        let brand = BrandSettings::default();
        assert_eq!(brand.industry, "B2B SaaS / Automation");
        assert_eq!(brand.keywords_csv(), "clunky, difficult, expensive");
        assert_eq!(brand.default_language, Language::English);
    }

    #[test]
    fn test_parse_keywords_trims_and_drops_empty() {
        assert_eq!(parse_keywords(" fast, ,cheap ,, easy"), vec!["fast", "cheap", "easy"]);
        assert!(parse_keywords("  ,  ").is_empty());
    }

    #[test]
    fn test_update_request_shape() {
        let brand = BrandSettings::default();
        let system = SystemSettings::default();
        let body = serde_json::to_value(UpdateSettingsRequest {
            brand_settings: &brand,
            system_settings: &system,
        })
        .unwrap();
        assert_eq!(body["brandSettings"]["targetAudience"], "SME Founders & Tech Managers");
        assert_eq!(body["systemSettings"]["dateFormat"], json!("YYYY-MM-DD"));
    }

    #[test]
    fn test_custom_agent_partial_json_fills_defaults() {
        let agent: CustomAgentSettings =
            serde_json::from_str(r#"{"platform": "OpenAI", "apiKey": "sk-123456"}"#).unwrap();
        assert_eq!(agent.features, AgentFeatures::default());
        assert_eq!(agent.masked_key(), "*****3456");
        assert_eq!(CustomAgentSettings::default().masked_key(), "");
    }

    #[test]
    fn test_labels_round_trip_to_variants() {
        for format in DateFormat::ALL {
            assert_eq!(DateFormat::from_label(format.label()), Some(format));
        }
        assert_eq!(Language::from_label("Bilingual (EN + VI)"), Some(Language::Bilingual));
        assert_eq!(Language::from_label("French"), None);
        assert_eq!(DateFormat::MonthFirst.chrono_format(), "%m/%d/%Y");
    }
}
