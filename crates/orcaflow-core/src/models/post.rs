use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Id;

/// Wire format for planner dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Filter value meaning "no filter" in the planner dropdowns.
pub const FILTER_ALL: &str = "All";

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Facebook,
    Instagram,
    LinkedIn,
    Generic,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::LinkedIn => "LinkedIn",
            Platform::Generic => "Generic",
        }
    }

    /// Parse any casing ("facebook", "FACEBOOK"); unknown platforms are `Generic`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "facebook" => Platform::Facebook,
            "instagram" => Platform::Instagram,
            "linkedin" => Platform::LinkedIn,
            _ => Platform::Generic,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Platform::parse(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostStatus {
    #[serde(alias = "scheduled", alias = "SCHEDULED")]
    Scheduled,
    #[serde(alias = "posted", alias = "POSTED")]
    Posted,
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostStatus::Scheduled => write!(f, "Scheduled"),
            PostStatus::Posted => write!(f, "Posted"),
        }
    }
}

/// Status filter for `GET /posts`; `All` is never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Scheduled,
    Posted,
}

impl StatusFilter {
    fn query_value(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Scheduled => Some("Scheduled"),
            StatusFilter::Posted => Some("Posted"),
        }
    }
}

// ============================================================================
// Posts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ScheduledPost {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub title: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub platform: Platform,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub status: PostStatus,
    #[serde(rename = "socialPageId", default, skip_serializing_if = "Option::is_none")]
    pub social_page_id: Option<Id>,
    #[serde(rename = "mediaUrls", default)]
    pub media_urls: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(rename = "fullPicture", default)]
    pub full_picture: Option<String>,
    #[serde(rename = "postedAt", default)]
    pub posted_at: Option<String>,
}

impl ScheduledPost {
    pub fn is_posted(&self) -> bool {
        self.status == PostStatus::Posted
    }

    /// Published posts cannot be deleted from the planner.
    pub fn can_delete(&self) -> bool {
        !self.is_posted()
    }

    /// Short content preview for calendar cells and list rows.
    pub fn preview(&self, max_chars: usize) -> String {
        let source = if self.content.trim().is_empty() {
            &self.title
        } else {
            &self.content
        };
        crate::utils::truncate(source.trim(), max_chars)
    }

    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

/// Payload for `POST /planner/posts` (a post without its id).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPost {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    pub title: String,
    pub platform: Platform,
    pub content: String,
    pub attachments: Option<Vec<String>>,
    pub status: PostStatus,
    #[serde(rename = "socialPageId", skip_serializing_if = "Option::is_none")]
    pub social_page_id: Option<Id>,
}

impl NewPost {
    pub fn scheduled(date: NaiveDate, platform: Platform, title: &str, content: &str) -> Self {
        Self {
            date,
            title: title.to_string(),
            platform,
            content: content.to_string(),
            attachments: None,
            status: PostStatus::Scheduled,
            social_page_id: None,
        }
    }
}

/// Partial update for `PUT /planner/posts/:id`; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_opt_date")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
    #[serde(rename = "socialPageId", skip_serializing_if = "Option::is_none")]
    pub social_page_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetPostsResponse {
    #[serde(default)]
    pub posts: Vec<ScheduledPost>,
}

/// Filters for `GET /posts`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetPostsParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Platform name as the backend filters it (e.g. "facebook"); `All` means none.
    pub platform: Option<String>,
    pub social_page_id: Option<Id>,
    pub status: StatusFilter,
}

impl GetPostsParams {
    pub fn for_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Default::default()
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Query pairs in wire order. `All`/empty filters are omitted entirely.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(start) = self.start_date {
            pairs.push(("startDate", start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = self.end_date {
            pairs.push(("endDate", end.format(DATE_FORMAT).to_string()));
        }
        if let Some(ref platform) = self.platform {
            let platform = platform.trim();
            if !platform.is_empty() && !platform.eq_ignore_ascii_case(FILTER_ALL) {
                pairs.push(("platform", platform.to_string()));
            }
        }
        if let Some(ref page) = self.social_page_id {
            pairs.push(("socialPageId", page.to_string()));
        }
        if let Some(status) = self.status.query_value() {
            pairs.push(("status", status.to_string()));
        }

        pairs
    }
}

// ============================================================================
// Date helpers
// ============================================================================

/// Accepts "2024-01-05" as well as timestamps like "2024-01-05T00:00:00.000Z".
fn deserialize_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let day: String = raw.chars().take(10).collect();
    NaiveDate::parse_from_str(&day, DATE_FORMAT).map_err(serde::de::Error::custom)
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
}

fn serialize_opt_date<S: Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serialize_date(date, serializer),
        None => serializer.serialize_none(),
    }
}
