use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, ListingId, ReviewRecord};

/// Selector value meaning "no constraint".
pub const ALL: &str = "All";

/// Topic or listing selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some(ALL) => Selection::All,
            Some(value) => Selection::Only(value.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => ALL,
            Selection::Only(value) => value,
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value)
        }
    }
}

impl From<Selection> for String {
    fn from(selection: Selection) -> Self {
        match selection {
            Selection::All => ALL.to_owned(),
            Selection::Only(value) => value,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let day = timestamp.date();
        self.start <= day && day <= self.end
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Current analyst selection. Every active constraint must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub date_range: Option<DateRange>,
    pub topic: Selection,
    pub listing: Selection,
}

impl FilterState {
    /// Unconstrained state spanning the whole dataset.
    pub fn for_dataset(dataset: &Dataset) -> Self {
        Self {
            date_range: dataset
                .date_bounds()
                .and_then(|(start, end)| DateRange::new(start, end)),
            ..Self::default()
        }
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = Some(date_range);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Selection::from(topic.into());
        self
    }

    pub fn with_listing(mut self, listing: impl Into<String>) -> Self {
        self.listing = Selection::from(listing.into());
        self
    }

    pub fn matches_date(&self, record: &ReviewRecord) -> bool {
        self.date_range
            .map_or(true, |range| range.contains(&record.date))
    }

    /// Unlabeled rows never match a specific theme.
    pub fn matches_topic(&self, record: &ReviewRecord) -> bool {
        match &self.topic {
            Selection::All => true,
            Selection::Only(topic) => record.topic_label.as_deref() == Some(topic.as_str()),
        }
    }

    pub fn matches_listing(&self, record: &ReviewRecord) -> bool {
        match &self.listing {
            Selection::All => true,
            Selection::Only(listing) => record.listing_id.as_str() == listing,
        }
    }

    pub fn matches(&self, record: &ReviewRecord) -> bool {
        self.matches_date(record) && self.matches_topic(record) && self.matches_listing(record)
    }

    /// Rows that satisfy the selection, in input order.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<&'a ReviewRecord>
    where
        I: IntoIterator<Item = &'a ReviewRecord>,
    {
        rows.into_iter().filter(|record| self.matches(record)).collect()
    }
}

/// Filter selection as sent by the host UI.
///
/// A missing date bound falls back to the dataset's own bound, widened so it
/// never crosses the bound that was given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub topic: Option<String>,
    pub listing: Option<String>,
}

impl FilterRequest {
    pub fn resolve(&self, dataset: &Dataset) -> Result<FilterState, FilterError> {
        let bounds = dataset.date_bounds();
        let date_range = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some(
                DateRange::new(start, end).ok_or(FilterError::InvertedRange { start, end })?,
            ),
            // A defaulted bound never crosses the one the caller chose.
            (Some(start), None) => {
                let end = bounds.map_or(NaiveDate::MAX, |(_, end)| end.max(start));
                DateRange::new(start, end)
            }
            (None, Some(end)) => {
                let start = bounds.map_or(NaiveDate::MIN, |(start, _)| start.min(end));
                DateRange::new(start, end)
            }
            (None, None) => bounds.and_then(|(start, end)| DateRange::new(start, end)),
        };

        Ok(FilterState {
            date_range,
            topic: Selection::parse(self.topic.as_deref()),
            listing: Selection::parse(self.listing.as_deref()),
        })
    }
}

/// Values the host UI offers in its selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub date_bounds: Option<DateRange>,
    pub topics: Vec<String>,
    pub listings: Vec<String>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let topics: BTreeSet<&str> = dataset
            .iter()
            .filter_map(|record| record.topic_label.as_deref())
            .collect();
        let listings: BTreeSet<&ListingId> =
            dataset.iter().map(|record| &record.listing_id).collect();

        Self {
            date_bounds: dataset
                .date_bounds()
                .and_then(|(start, end)| DateRange::new(start, end)),
            topics: std::iter::once(ALL)
                .chain(topics)
                .map(str::to_owned)
                .collect(),
            listings: std::iter::once(ALL.to_owned())
                .chain(listings.into_iter().map(ToString::to_string))
                .collect(),
        }
    }
}
