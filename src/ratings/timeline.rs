//! Point-in-time rating history for a single player

use chrono::{NaiveDate, NaiveDateTime};

use crate::DEFAULT_RATING;

/// Ratings for one entity, sorted ascending by timestamp
///
/// Observations sharing a timestamp keep their original relative order, and
/// a lookup resolves to the last of them. Lookups are made at the start of
/// the query day, so anything recorded later that day is not yet visible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingTimeline {
    entries: Vec<(NaiveDateTime, f32)>,
}

impl RatingTimeline {
    /// Build a timeline from unsorted observations (stable sort by timestamp)
    pub fn from_unsorted<T, I>(entries: I) -> Self
    where
        T: Into<NaiveDateTime>,
        I: IntoIterator<Item = (T, f32)>,
    {
        let mut entries: Vec<(NaiveDateTime, f32)> = entries
            .into_iter()
            .map(|(at, rating)| (at.into(), rating))
            .collect();
        entries.sort_by_key(|(at, _)| *at);
        RatingTimeline { entries }
    }

    /// Empty timeline (unseen player)
    pub const fn empty() -> Self {
        RatingTimeline {
            entries: Vec::new(),
        }
    }

    /// Rating of the latest observation recorded no later than midnight of `date`
    ///
    /// Returns [`DEFAULT_RATING`] when there is no such observation.
    pub fn latest_rating_at(&self, date: NaiveDate) -> f32 {
        self.latest_at(date)
            .map(|(_, rating)| rating)
            .unwrap_or(DEFAULT_RATING)
    }

    /// Latest observation recorded no later than midnight of `date`, if any
    pub fn latest_at(&self, date: NaiveDate) -> Option<(NaiveDateTime, f32)> {
        let cutoff = NaiveDateTime::from(date);
        // upper bound: first index recorded strictly after the cutoff
        let idx = self.entries.partition_point(|(at, _)| *at <= cutoff);
        idx.checked_sub(1).map(|i| self.entries[i])
    }

    /// Day of the earliest observation
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.entries.first().map(|(at, _)| at.date())
    }

    /// Day of the most recent observation
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|(at, _)| at.date())
    }

    pub fn entries(&self) -> &[(NaiveDateTime, f32)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
