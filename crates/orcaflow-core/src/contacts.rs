//! Local CRM contact book.
//!
//! The backend has no contacts API yet, so the book lives in the local cache.

use std::sync::OnceLock;

use anyhow::Result;
use chrono::Utc;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::cache::CacheManager;
use crate::models::{Contact, ContactStatus, CustomField, HistoryEvent, HistoryEventType};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("First name, last name, and email are required")]
    MissingRequired,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Contact {0} not found")]
    NotFound(i64),
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex()
        .map(|re| re.is_match(email.trim()))
        .unwrap_or(false)
}

pub fn validate(contact: &Contact) -> Result<(), ContactError> {
    if contact.first_name.trim().is_empty()
        || contact.last_name.trim().is_empty()
        || contact.email.trim().is_empty()
    {
        return Err(ContactError::MissingRequired);
    }
    if !is_valid_email(&contact.email) {
        return Err(ContactError::InvalidEmail);
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ContactBook {
    contacts: Vec<Contact>,
}

impl ContactBook {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }

    /// Cached book, or the starter contacts when nothing is cached or the file is unreadable.
    pub fn load(cache: &CacheManager) -> Self {
        match cache.load_contacts() {
            Ok(Some(cached)) => Self::new(cached.data),
            Ok(None) => Self::starter(),
            Err(e) => {
                warn!(error = %e, "Failed to load contacts cache");
                Self::starter()
            }
        }
    }

    pub fn save(&self, cache: &CacheManager) -> Result<()> {
        cache.save_contacts(&self.contacts)
    }

    pub fn all(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    /// Validate and insert. The new contact gets the next id and a creation event.
    pub fn add(&mut self, mut contact: Contact) -> Result<i64, ContactError> {
        validate(&contact)?;
        let id = self.next_id();
        contact.id = id;
        contact.email = contact.email.trim().to_string();
        contact.history = vec![HistoryEvent {
            id: 1,
            event_type: HistoryEventType::Creation,
            date: Utc::now(),
            details: "Contact created manually.".to_string(),
        }];
        self.contacts.push(contact);
        Ok(id)
    }

    /// Replace an existing contact, keeping its history.
    pub fn update(&mut self, contact: Contact) -> Result<(), ContactError> {
        validate(&contact)?;
        let existing = self
            .contacts
            .iter_mut()
            .find(|c| c.id == contact.id)
            .ok_or(ContactError::NotFound(contact.id))?;
        let history = std::mem::take(&mut existing.history);
        *existing = Contact { history, ..contact };
        Ok(())
    }

    pub fn remove(&mut self, id: i64) -> Result<Contact, ContactError> {
        let idx = self
            .contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or(ContactError::NotFound(id))?;
        Ok(self.contacts.remove(idx))
    }

    /// Contacts matching both the status filter (`None` = all) and the search text.
    pub fn filtered(&self, status: Option<ContactStatus>, query: &str) -> Vec<&Contact> {
        let query = query.trim().to_lowercase();
        self.contacts
            .iter()
            .filter(|c| status.map(|s| c.status == s).unwrap_or(true))
            .filter(|c| c.matches(&query))
            .collect()
    }

    pub fn search(&self, query: &str) -> Vec<&Contact> {
        self.filtered(None, query)
    }

    pub fn filter(&self, status: ContactStatus) -> Vec<&Contact> {
        self.filtered(Some(status), "")
    }

    fn next_id(&self) -> i64 {
        self.contacts.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    fn starter() -> Self {
        let person = |id: i64, first: &str, last: &str, email: &str, company: &str, role: &str, status| Contact {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone: format!("555-010{}", id),
            company: company.to_string(),
            role: role.to_string(),
            status,
            ..Default::default()
        };

        let mut alice = person(1, "Alice", "Johnson", "alice.j@techcorp.com", "TechCorp", "Project Manager", ContactStatus::Customer);
        alice.custom_fields = vec![CustomField {
            id: 1,
            key: "Source".to_string(),
            value: "LinkedIn".to_string(),
        }];

        Self::new(vec![
            alice,
            person(2, "Bob", "Williams", "bob.w@innovatech.io", "Innovatech", "Lead Developer", ContactStatus::Partner),
            person(3, "Charlie", "Brown", "charlie@startupz.com", "StartupZ", "CEO", ContactStatus::Lead),
        ])
    }
}

/// Custom fields as one editable line: `Source: LinkedIn; Tier: Gold`.
pub fn custom_fields_text(fields: &[CustomField]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.key, f.value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse the `key: value; key: value` line back into fields numbered from 1.
/// Entries without a key are dropped; a missing `:` leaves the value empty.
pub fn parse_custom_fields(text: &str) -> Vec<CustomField> {
    text.split(';')
        .filter_map(|entry| {
            let (key, value) = entry.split_once(':').unwrap_or((entry, ""));
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), value.trim().to_string()))
        })
        .enumerate()
        .map(|(i, (key, value))| CustomField {
            id: i as i64 + 1,
            key,
            value,
        })
        .collect()
}

/// Next status in the filter cycle: All, then each status, then All again.
pub fn next_status_filter(current: Option<ContactStatus>) -> Option<ContactStatus> {
    match current {
        None => Some(ContactStatus::ALL[0]),
        Some(status) => {
            let idx = ContactStatus::ALL.iter().position(|s| *s == status).unwrap_or(0);
            ContactStatus::ALL.get(idx + 1).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(first: &str, last: &str, email: &str) -> Contact {
        Contact {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validation() {
        assert_eq!(validate(&draft("", "Le", "a@b.co")), Err(ContactError::MissingRequired));
        assert_eq!(validate(&draft("An", "Le", "  ")), Err(ContactError::MissingRequired));
        assert_eq!(validate(&draft("An", "Le", "not-an-email")), Err(ContactError::InvalidEmail));
        assert_eq!(validate(&draft("An", "Le", "a b@c.d")), Err(ContactError::InvalidEmail));
        assert_eq!(validate(&draft("An", "Le", "an@orca.vn")), Ok(()));
    }

    #[test]
    fn test_add_assigns_next_id_and_creation_event() {
        let mut book = ContactBook::starter();
        let id = book.add(draft("Diana", "Miller", "diana.m@solutions.co")).unwrap();
        assert_eq!(id, 4);

        let contact = book.get(id).unwrap();
        assert_eq!(contact.history.len(), 1);
        assert_eq!(contact.history[0].event_type, HistoryEventType::Creation);

        let mut empty = ContactBook::default();
        assert_eq!(empty.add(draft("A", "B", "a@b.co")).unwrap(), 1);
    }

    #[test]
    fn test_update_keeps_history() {
        let mut book = ContactBook::default();
        let id = book.add(draft("Ethan", "Davis", "ethan.d@globalnet.com")).unwrap();

        let mut edited = book.get(id).unwrap().clone();
        edited.history.clear();
        edited.status = ContactStatus::Archived;
        book.update(edited).unwrap();

        let contact = book.get(id).unwrap();
        assert_eq!(contact.status, ContactStatus::Archived);
        assert_eq!(contact.history.len(), 1);

        let mut ghost = draft("No", "One", "no@one.co");
        ghost.id = 99;
        assert_eq!(book.update(ghost), Err(ContactError::NotFound(99)));
    }

    #[test]
    fn test_remove() {
        let mut book = ContactBook::starter();
        assert_eq!(book.remove(2).unwrap().first_name, "Bob");
        assert_eq!(book.len(), 2);
        assert_eq!(book.remove(2), Err(ContactError::NotFound(2)));
    }

    #[test]
    fn test_search_and_filter() {
        let book = ContactBook::starter();
        assert_eq!(book.search("TECHCORP").len(), 1);
        assert_eq!(book.search("").len(), 3);
        assert_eq!(book.filter(ContactStatus::Lead)[0].first_name, "Charlie");
        assert!(book.filtered(Some(ContactStatus::Archived), "").is_empty());
        assert_eq!(book.filtered(Some(ContactStatus::Customer), "linkedin").len(), 1);
    }

    #[test]
    fn test_custom_fields_text() {
        let fields = parse_custom_fields(" Source: LinkedIn ;Tier:Gold;; : orphan; Referral ");
        let pairs: Vec<(&str, &str)> = fields.iter().map(|f| (f.key.as_str(), f.value.as_str())).collect();
        assert_eq!(pairs, vec![("Source", "LinkedIn"), ("Tier", "Gold"), ("Referral", "")]);
        assert_eq!(fields[2].id, 3);

        assert_eq!(custom_fields_text(&fields), "Source: LinkedIn; Tier: Gold; Referral: ");
        assert!(parse_custom_fields("").is_empty());

        // Values may contain colons
        assert_eq!(parse_custom_fields("Site: https://orca.vn")[0].value, "https://orca.vn");
    }

    #[test]
    fn test_status_filter_cycle() {
        let mut filter = None;
        let mut seen = Vec::new();
        for _ in 0..5 {
            filter = next_status_filter(filter);
            seen.push(filter);
        }
        assert_eq!(
            seen,
            vec![
                Some(ContactStatus::Lead),
                Some(ContactStatus::Customer),
                Some(ContactStatus::Partner),
                Some(ContactStatus::Archived),
                None
            ]
        );
    }

    #[test]
    fn test_persisted_through_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().to_path_buf()).unwrap();

        let mut book = ContactBook::load(&cache);
        assert_eq!(book.len(), 3);
        book.remove(1).unwrap();
        book.save(&cache).unwrap();

        let reloaded = ContactBook::load(&cache);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.get(1).is_none());
    }
}
