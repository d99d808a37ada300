//! Provenance tracing from dated evidence.
//!
//! Accumulates dated sightings while evidence is gathered, then sorts
//! them into a timeline and picks the earliest as the likely origin.

use uuid::Uuid;

use super::dates::parse_published_date;
use crate::domain::{OriginTrace, TimelineEntry};

/// Timeline entries stored per report
pub const MAX_TIMELINE_ENTRIES: usize = 30;

/// Context snippet cap per timeline entry
const MAX_CONTEXT_CHARS: usize = 240;

/// Accumulates timeline candidates across a report's claims
#[derive(Debug, Default)]
pub struct OriginTracer {
    entries: Vec<TimelineEntry>,
}

impl OriginTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting. Entries without a url or a parsable date are
    /// silently dropped; that is expected, not an error.
    pub fn record(
        &mut self,
        url: Option<&str>,
        publisher: Option<&str>,
        published_date: Option<&str>,
        context: Option<&str>,
    ) {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return;
        };
        let Some(date) = published_date.and_then(parse_published_date) else {
            return;
        };

        let context: String = context.unwrap_or("").chars().take(MAX_CONTEXT_CHARS).collect();

        self.entries.push(TimelineEntry {
            date,
            source: publisher.map(str::to_string),
            url: url.to_string(),
            context,
        });
    }

    /// Number of candidates recorded so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sort, truncate, and pick the earliest sighting.
    pub fn finalize(mut self, report_id: Uuid) -> OriginTrace {
        self.entries.sort_by(|a, b| {
            (a.date, a.source.as_deref().unwrap_or(""))
                .cmp(&(b.date, b.source.as_deref().unwrap_or("")))
        });
        self.entries.truncate(MAX_TIMELINE_ENTRIES);

        let earliest = self.entries.first();
        OriginTrace {
            report_id,
            likely_origin_url: earliest.map(|e| e.url.clone()),
            earliest_appearance: earliest.map(|e| e.date.format("%Y-%m-%d").to_string()),
            timeline: self.entries,
        }
    }
}
