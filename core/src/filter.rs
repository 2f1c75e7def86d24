//! Event filter model.
//!
//! A filter is a conjunction of optional predicates. The PostgreSQL backend
//! translates it into a `WHERE` clause; [`EventFilter::matches`] is the
//! reference semantics used by the in-memory backend.

use crate::types::{Event, EventSummary, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filter over stored events.
///
/// Empty lists mean "no predicate". All present predicates must hold.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Allowed categories
    pub categories: Vec<String>,
    /// Allowed locations
    pub locations: Vec<String>,
    /// Inclusive lower bound on the start time
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the start time
    pub end: Option<DateTime<Utc>>,
    /// Substring matched against title or description
    pub search: Option<String>,
    /// Restrict to events created by this user
    pub created_by: Option<UserId>,
    /// Maximum number of results
    pub limit: Option<u32>,
}

impl EventFilter {
    /// Parse a comma-separated list, trimming entries and dropping blank ones.
    ///
    /// ```
    /// use eventbook_core::filter::EventFilter;
    ///
    /// assert_eq!(EventFilter::split_list("Music, ,Art"), vec!["Music", "Art"]);
    /// ```
    #[must_use]
    pub fn split_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Restrict to the given categories.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to the given locations.
    #[must_use]
    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    /// Free-text search term; blank terms are ignored.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search)
        };
        self
    }

    /// Whether the filter has no predicates and no limit.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Evaluate the predicates against one event.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if !self.categories.is_empty() && !self.categories.contains(&event.category) {
            return false;
        }
        if !self.locations.is_empty() && !self.locations.contains(&event.location) {
            return false;
        }
        if self.start.is_some_and(|start| event.date < start) {
            return false;
        }
        if self.end.is_some_and(|end| event.date > end) {
            return false;
        }
        if self.created_by.is_some_and(|creator| event.created_by != creator) {
            return false;
        }
        if let Some(term) = &self.search {
            if !event.title.contains(term.as_str()) && !event.description.contains(term.as_str()) {
                return false;
            }
        }
        true
    }

    /// Filter, order by start time and truncate an in-memory listing.
    #[must_use]
    pub fn apply(&self, events: impl IntoIterator<Item = EventSummary>) -> Vec<EventSummary> {
        let mut selected: Vec<EventSummary> = events
            .into_iter()
            .filter(|summary| self.matches(&summary.event))
            .collect();
        selected.sort_by_key(|summary| summary.event.date);
        if let Some(limit) = self.limit {
            selected.truncate(limit as usize);
        }
        selected
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::EventId;
    use chrono::TimeZone;

    fn event(title: &str, category: &str, location: &str, day: u32) -> EventSummary {
        let date = Utc.with_ymd_and_hms(2025, 3, day, 19, 0, 0).unwrap();
        EventSummary {
            event: Event {
                id: EventId::new(),
                title: title.to_string(),
                description: format!("{title} description"),
                date,
                end_date: None,
                category: category.to_string(),
                location: location.to_string(),
                max_attendees: 10,
                created_by: UserId::new(),
                created_at: date,
                updated_at: date,
            },
            current_attendees: 0,
        }
    }

    fn catalog() -> Vec<EventSummary> {
        vec![
            event("Rock Night", "Music", "Berlin", 12),
            event("Gallery Walk", "Art", "Paris", 3),
            event("Jazz Brunch", "Music", "Paris", 7),
            event("Code Retreat", "Tech", "Berlin", 20),
        ]
    }

    fn titles(events: &[EventSummary]) -> Vec<&str> {
        events.iter().map(|e| e.event.title.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_returns_everything_by_date() {
        let result = EventFilter::default().apply(catalog());
        assert_eq!(
            titles(&result),
            vec!["Gallery Walk", "Jazz Brunch", "Rock Night", "Code Retreat"]
        );
    }

    #[test]
    fn test_category_filter_only_returns_matching_events() {
        let result = EventFilter::default()
            .with_categories(["Music"])
            .apply(catalog());
        assert!(result.iter().all(|e| e.event.category == "Music"));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_combined_filters_intersect() {
        let result = EventFilter::default()
            .with_categories(["Music", "Art"])
            .with_locations(["Paris"])
            .apply(catalog());
        assert_eq!(titles(&result), vec!["Gallery Walk", "Jazz Brunch"]);

        let result = EventFilter::default()
            .with_categories(["Tech"])
            .with_locations(["Paris"])
            .apply(catalog());
        assert!(result.is_empty());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filter = EventFilter {
            start: Some(Utc.with_ymd_and_hms(2025, 3, 7, 19, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2025, 3, 12, 19, 0, 0).unwrap()),
            ..EventFilter::default()
        };
        assert_eq!(titles(&filter.apply(catalog())), vec!["Jazz Brunch", "Rock Night"]);
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let result = EventFilter::default().with_search("Jazz").apply(catalog());
        assert_eq!(titles(&result), vec!["Jazz Brunch"]);

        let result = EventFilter::default()
            .with_search("Walk description")
            .apply(catalog());
        assert_eq!(titles(&result), vec!["Gallery Walk"]);

        assert!(EventFilter::default().with_search("  ").is_empty());
    }

    #[test]
    fn test_created_by_and_limit() {
        let mut events = catalog();
        let creator = UserId::new();
        events[0].event.created_by = creator;
        events[3].event.created_by = creator;

        let filter = EventFilter {
            created_by: Some(creator),
            limit: Some(1),
            ..EventFilter::default()
        };
        assert_eq!(titles(&filter.apply(events)), vec!["Rock Night"]);
    }

    #[test]
    fn test_split_list() {
        assert!(EventFilter::split_list("").is_empty());
        assert_eq!(EventFilter::split_list("a,b"), vec!["a", "b"]);
        assert_eq!(EventFilter::split_list(" Music ,Art ,"), vec!["Music", "Art"]);
        assert!(EventFilter::split_list(" , ").is_empty());
    }
}
