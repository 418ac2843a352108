use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::topics::{label_topics, Theme, TopicLabels};

pub const DEFAULT_DATASET_PATH: &str = "data/reviews_en_processed.csv";

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "listing_id",
    "date",
    "topic",
    "sentiment_binary",
    "sentiment_ml",
    "comments",
];

/// `sentiment_ml` value marking a severe complaint.
pub const NEGATIVE_SENTIMENT: &str = "Negative";

const TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("could not read dataset '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("line {line}: unparseable date '{value}'")]
    InvalidDate { line: u64, value: String },
    #[error("line {line}: topic '{value}' is not an integer")]
    InvalidTopic { line: u64, value: String },
    #[error("line {line}: unknown sentiment '{value}'")]
    InvalidSentiment { line: u64, value: String },
}

/// Coarse two-class sentiment of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SentimentBinary {
    Positive,
    #[serde(rename = "Non-Positive")]
    NonPositive,
}

impl SentimentBinary {
    /// Display order used by every distribution.
    pub const ALL: [SentimentBinary; 2] = [SentimentBinary::Positive, SentimentBinary::NonPositive];

    pub fn as_str(self) -> &'static str {
        match self {
            SentimentBinary::Positive => "Positive",
            SentimentBinary::NonPositive => "Non-Positive",
        }
    }
}

impl fmt::Display for SentimentBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SentimentBinary {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "Positive" => Ok(SentimentBinary::Positive),
            "Non-Positive" => Ok(SentimentBinary::NonPositive),
            _ => Err(()),
        }
    }
}

/// Listing identifier, kept as the text found in the source file.
///
/// Integer ids order numerically and sort before any non-integer id, which
/// order lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn sort_key(&self) -> (bool, Option<i64>, &str) {
        let numeric = self.0.parse::<i64>().ok();
        (numeric.is_none(), numeric, &self.0)
    }
}

impl Ord for ListingId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ListingId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// One guest review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRecord {
    pub listing_id: ListingId,
    pub date: NaiveDateTime,
    pub topic: Option<i64>,
    pub topic_label: Option<String>,
    pub sentiment_binary: SentimentBinary,
    pub sentiment_ml: String,
    pub comments: String,
}

impl ReviewRecord {
    pub fn is_non_positive(&self) -> bool {
        self.sentiment_binary == SentimentBinary::NonPositive
    }

    pub fn is_negative(&self) -> bool {
        self.sentiment_ml == NEGATIVE_SENTIMENT
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    listing_id: String,
    date: String,
    topic: String,
    sentiment_binary: String,
    sentiment_ml: String,
    comments: String,
}

impl RawRecord {
    fn parse(self, line: u64) -> Result<ReviewRecord, LoadError> {
        let date = parse_timestamp(&self.date).ok_or_else(|| LoadError::InvalidDate {
            line,
            value: self.date.clone(),
        })?;

        let topic = match self.topic.trim() {
            "" => None,
            value => Some(parse_topic(value).ok_or_else(|| LoadError::InvalidTopic {
                line,
                value: self.topic.clone(),
            })?),
        };

        let sentiment_binary =
            self.sentiment_binary
                .parse()
                .map_err(|_| LoadError::InvalidSentiment {
                    line,
                    value: self.sentiment_binary.clone(),
                })?;

        Ok(ReviewRecord {
            listing_id: ListingId(self.listing_id.trim().to_owned()),
            date,
            topic,
            topic_label: None,
            sentiment_binary,
            sentiment_ml: self.sentiment_ml.trim().to_owned(),
            comments: self.comments,
        })
    }
}

/// Topics written by a float-typed column come out as `3.0`.
fn parse_topic(value: &str) -> Option<i64> {
    if let Ok(topic) = value.parse::<i64>() {
        return Some(topic);
    }
    let float = value.parse::<f64>().ok()?;
    (float.fract() == 0.0 && float.is_finite()).then_some(float as i64)
}

/// Parse a review timestamp. Date-only values land on midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(timestamp);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|timestamp| timestamp.naive_local())
}

/// In-memory review table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<ReviewRecord>,
    themes: Vec<Theme>,
}

impl Dataset {
    pub fn new(records: Vec<ReviewRecord>) -> Self {
        Self {
            records,
            themes: Vec::new(),
        }
    }

    pub fn records(&self) -> &[ReviewRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReviewRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Theme table of the labels attached by [`label_topics`].
    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub(crate) fn into_parts(self) -> (Vec<ReviewRecord>, Vec<Theme>) {
        (self.records, self.themes)
    }

    pub(crate) fn from_parts(records: Vec<ReviewRecord>, themes: Vec<Theme>) -> Self {
        Self { records, themes }
    }

    /// Earliest and latest review day.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut days = self.records.iter().map(|record| record.date.date());
        let first = days.next()?;
        Some(days.fold((first, first), |(min, max), day| (min.min(day), max.max(day))))
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a ReviewRecord;
    type IntoIter = std::slice::Iter<'a, ReviewRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<ReviewRecord> for Dataset {
    fn from_iter<T: IntoIterator<Item = ReviewRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Read the review CSV at `path`.
///
/// Every row must carry a parseable date; the first bad row aborts the load.
pub fn load(path: impl AsRef<Path>) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_owned(),
        source,
    })?;
    let reader = io::BufReader::new(file);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header.trim() == column) {
            return Err(LoadError::MissingColumn(column));
        }
    }
    let headers = csv::StringRecord::from(headers.iter().map(str::trim).collect::<Vec<_>>());

    let mut records = Vec::new();
    let mut row = csv::StringRecord::new();
    while reader.read_record(&mut row)? {
        let line = row.position().map(|position| position.line()).unwrap_or_default();
        let raw: RawRecord = row.deserialize(Some(&headers))?;
        records.push(raw.parse(line)?);
    }

    tracing::info!(path = %path.display(), rows = records.len(), "loaded review dataset");
    Ok(Dataset::new(records))
}

/// Memoized, labeled dataset owned by the caller.
///
/// The first [`get`](DatasetCache::get) reads storage; later calls share the
/// same copy until [`invalidate`](DatasetCache::invalidate).
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    labels: TopicLabels,
    dataset: Option<Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>, labels: TopicLabels) -> Self {
        Self {
            path: path.into(),
            labels,
            dataset: None,
        }
    }

    pub fn get(&mut self) -> Result<Arc<Dataset>, LoadError> {
        if let Some(dataset) = &self.dataset {
            return Ok(Arc::clone(dataset));
        }

        tracing::debug!(path = %self.path.display(), "dataset cache miss");
        let dataset = Arc::new(label_topics(load(&self.path)?, &self.labels));
        self.dataset = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn invalidate(&mut self) {
        if self.dataset.take().is_some() {
            tracing::info!(path = %self.path.display(), "dataset cache invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn labels(&self) -> &TopicLabels {
        &self.labels
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(DEFAULT_DATASET_PATH, TopicLabels::default())
    }
}
