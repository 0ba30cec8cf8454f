use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ContactStatus {
    #[default]
    Lead,
    Customer,
    Partner,
    Archived,
}

impl ContactStatus {
    pub const ALL: [ContactStatus; 4] = [
        ContactStatus::Lead,
        ContactStatus::Customer,
        ContactStatus::Partner,
        ContactStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Lead => "Lead",
            ContactStatus::Customer => "Customer",
            ContactStatus::Partner => "Partner",
            ContactStatus::Archived => "Archived",
        }
    }
}

impl std::fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum HistoryEventType {
    Creation,
    Email,
    Social,
    Note,
    Call,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CustomField {
    pub id: i64,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct HistoryEvent {
    pub id: i64,
    #[serde(rename = "type")]
    pub event_type: HistoryEventType,
    pub date: DateTime<Utc>,
    pub details: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Contact {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: ContactStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "customFields", default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(default)]
    pub history: Vec<HistoryEvent>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Case-insensitive match against name, company, email, phone and custom fields.
    /// `query` is expected to be lowercase already.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let custom = self
            .custom_fields
            .iter()
            .map(|f| format!("{} {}", f.key, f.value))
            .collect::<Vec<_>>()
            .join(" ");

        [
            self.full_name(),
            self.company.clone(),
            self.email.clone(),
            self.phone.clone(),
            custom,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(query))
    }

    /// History, newest first.
    pub fn history_newest_first(&self) -> Vec<&HistoryEvent> {
        let mut events: Vec<&HistoryEvent> = self.history.iter().collect();
        events.sort_by(|a, b| b.date.cmp(&a.date));
        events
    }
}
