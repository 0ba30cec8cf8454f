use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{BrandSettings, ConnectedPage, Contact, CustomAgentSettings, ScheduledPost};

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

const BRAND_SETTINGS: &str = "orca_brand_settings";
const CUSTOM_AGENT_SETTINGS: &str = "orca_custom_agent_settings";
const CONTACTS: &str = "contacts";
const POSTS: &str = "posts";
const SOCIAL_PAGES: &str = "social_pages";

const ALL_ENTRIES: [&str; 5] = [BRAND_SETTINGS, CUSTOM_AGENT_SETTINGS, CONTACTS, POSTS, SOCIAL_PAGES];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

/// The planner window a post list was fetched for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPosts {
    pub start: String,
    pub end: String,
    pub posts: Vec<ScheduledPost>,
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.cache_path(name), contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        Ok(())
    }

    // ===== Brand settings =====

    pub fn load_brand_settings(&self) -> Result<Option<CachedData<BrandSettings>>> {
        self.load(BRAND_SETTINGS)
    }

    pub fn save_brand_settings(&self, brand: &BrandSettings) -> Result<()> {
        self.save(BRAND_SETTINGS, brand)
    }

    // ===== Custom agent =====

    pub fn load_custom_agent(&self) -> Result<Option<CachedData<CustomAgentSettings>>> {
        self.load(CUSTOM_AGENT_SETTINGS)
    }

    pub fn save_custom_agent(&self, agent: &CustomAgentSettings) -> Result<()> {
        self.save(CUSTOM_AGENT_SETTINGS, agent)
    }

    // ===== Contacts =====

    pub fn load_contacts(&self) -> Result<Option<CachedData<Vec<Contact>>>> {
        self.load(CONTACTS)
    }

    pub fn save_contacts(&self, contacts: &[Contact]) -> Result<()> {
        self.save(CONTACTS, &contacts)
    }

    // ===== Posts =====

    pub fn load_posts(&self) -> Result<Option<CachedData<CachedPosts>>> {
        self.load(POSTS)
    }

    pub fn save_posts(&self, start: &str, end: &str, posts: &[ScheduledPost]) -> Result<()> {
        let window = CachedPosts {
            start: start.to_string(),
            end: end.to_string(),
            posts: posts.to_vec(),
        };
        self.save(POSTS, &window)
    }

    // ===== Social pages =====

    pub fn load_social_pages(&self) -> Result<Option<CachedData<Vec<ConnectedPage>>>> {
        self.load(SOCIAL_PAGES)
    }

    pub fn save_social_pages(&self, pages: &[ConnectedPage]) -> Result<()> {
        self.save(SOCIAL_PAGES, &pages)
    }

    /// Delete every cached file. Missing files are not an error.
    pub fn clear_all(&self) -> Result<()> {
        for name in ALL_ENTRIES {
            let path = self.cache_path(name);
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to delete cache file: {}", name))?;
            }
        }
        Ok(())
    }

    // ===== Cache Age Information =====

    /// Helper to load cache and log errors without failing
    fn load_age<T>(&self, name: &str, loader: impl FnOnce() -> Result<Option<CachedData<T>>>) -> Option<String> {
        match loader() {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            posts: self.load_age(POSTS, || self.load_posts()),
            social_pages: self.load_age(SOCIAL_PAGES, || self.load_social_pages()),
            brand_settings: self.load_age(BRAND_SETTINGS, || self.load_brand_settings()),
        }
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub posts: Option<String>,
    pub social_pages: Option<String>,
    pub brand_settings: Option<String>,
}

impl CacheAges {
    pub fn posts_age(&self) -> String {
        self.posts.clone().unwrap_or_else(|| "never".to_string())
    }

    pub fn pages_age(&self) -> String {
        self.social_pages.clone().unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn manager() -> (tempfile::TempDir, CacheManager) {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().join("cache")).unwrap();
        (dir, cache)
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(15);
        assert_eq!(cached.age_display(), "15m ago");

        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - Duration::hours(26);
        assert_eq!(cached.age_display(), "1d ago");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_brand_settings_round_trip_under_fixed_key() {
        let (dir, cache) = manager();
        assert!(cache.load_brand_settings().unwrap().is_none());

        let mut brand = BrandSettings::default();
        brand.tone = "Playful".to_string();
        cache.save_brand_settings(&brand).unwrap();

        assert!(dir.path().join("cache").join("orca_brand_settings.json").exists());
        assert_eq!(cache.load_brand_settings().unwrap().unwrap().data.tone, "Playful");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (dir, cache) = manager();
        std::fs::write(dir.path().join("cache").join("contacts.json"), "{oops").unwrap();
        assert!(cache.load_contacts().is_err());
    }

    #[test]
    fn test_clear_all() {
        let (_dir, cache) = manager();
        cache.save_custom_agent(&CustomAgentSettings::default()).unwrap();
        cache.save_contacts(&[]).unwrap();

        cache.clear_all().unwrap();
        assert!(cache.load_custom_agent().unwrap().is_none());
        assert!(cache.load_contacts().unwrap().is_none());
        // Nothing left to delete
        cache.clear_all().unwrap();
    }

    #[test]
    fn test_cache_ages() {
        let (_dir, cache) = manager();
        assert_eq!(cache.get_cache_ages().posts_age(), "never");
        cache.save_posts("2024-01-01", "2024-01-31", &[]).unwrap();
        assert_eq!(cache.get_cache_ages().posts_age(), "just now");
    }
}
