//! Date math for the content planner's month, week and list views.
//!
//! Weeks run Sunday through Saturday. All functions are pure; callers pass in
//! "today" so the results are deterministic.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{Platform, ScheduledPost};

/// How far ahead the list view looks.
const LIST_VIEW_MONTHS: u32 = 3;

pub const LIST_VIEW_TITLE: &str = "All Scheduled Posts";

/// Platform filter values in cycling order. The backend filters on lowercase names.
pub const PLATFORM_FILTERS: [&str; 3] = ["All", "facebook", "instagram"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Month,
    Week,
    List,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Month => "Month",
            ViewMode::Week => "Week",
            ViewMode::List => "List",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Inclusive date window fetched for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// The Sunday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// The Saturday on or after `date`.
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    start_of_week(date) + Duration::days(6)
}

pub fn date_range(mode: ViewMode, current: NaiveDate, today: NaiveDate) -> DateRange {
    match mode {
        ViewMode::Month => DateRange {
            start: first_of_month(current),
            end: last_of_month(current),
        },
        ViewMode::Week => DateRange {
            start: start_of_week(current),
            end: end_of_week(current),
        },
        ViewMode::List => DateRange {
            start: today,
            end: today
                .checked_add_months(Months::new(LIST_VIEW_MONTHS))
                .unwrap_or(today),
        },
    }
}

/// Every day shown in the month grid: whole weeks covering the month.
pub fn month_grid(current: NaiveDate) -> Vec<NaiveDate> {
    let start = start_of_week(first_of_month(current));
    let end = end_of_week(last_of_month(current));
    start.iter_days().take_while(|d| *d <= end).collect()
}

pub fn week_days(current: NaiveDate) -> Vec<NaiveDate> {
    start_of_week(current).iter_days().take(7).collect()
}

pub fn navigate(mode: ViewMode, current: NaiveDate, direction: Direction) -> NaiveDate {
    match (mode, direction) {
        (ViewMode::Month, Direction::Prev) => first_of_month(current)
            .checked_sub_months(Months::new(1))
            .unwrap_or(current),
        (ViewMode::Month, Direction::Next) => first_of_month(current)
            .checked_add_months(Months::new(1))
            .unwrap_or(current),
        (ViewMode::Week, Direction::Prev) => current - Duration::days(7),
        (ViewMode::Week, Direction::Next) => current + Duration::days(7),
        (ViewMode::List, _) => current,
    }
}

pub fn header_title(mode: ViewMode, current: NaiveDate) -> String {
    match mode {
        ViewMode::Month => current.format("%B %Y").to_string(),
        ViewMode::Week => {
            let start = start_of_week(current);
            let end = end_of_week(current);
            format!("{} - {}", start.format("%b %-d"), end.format("%b %-d, %Y"))
        }
        ViewMode::List => LIST_VIEW_TITLE.to_string(),
    }
}

pub fn posts_for_day(posts: &[ScheduledPost], day: NaiveDate) -> Vec<&ScheduledPost> {
    posts.iter().filter(|p| p.date == day).collect()
}

/// Posts bucketed by date, dates ascending, each bucket in input order.
pub fn group_by_date(posts: &[ScheduledPost]) -> BTreeMap<NaiveDate, Vec<&ScheduledPost>> {
    let mut groups: BTreeMap<NaiveDate, Vec<&ScheduledPost>> = BTreeMap::new();
    for post in posts {
        groups.entry(post.date).or_default().push(post);
    }
    groups
}

/// Next value in `PLATFORM_FILTERS` after `current`.
pub fn next_platform_filter(current: &str) -> &'static str {
    let idx = PLATFORM_FILTERS
        .iter()
        .position(|f| f.eq_ignore_ascii_case(current))
        .unwrap_or(0);
    PLATFORM_FILTERS[(idx + 1) % PLATFORM_FILTERS.len()]
}

/// Whether `post` passes the platform filter (applied locally to cached posts).
pub fn matches_platform_filter(post: &ScheduledPost, filter: &str) -> bool {
    filter.eq_ignore_ascii_case(PLATFORM_FILTERS[0]) || post.platform == Platform::parse(filter)
}
