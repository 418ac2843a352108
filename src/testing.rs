use chrono::NaiveDate;

use crate::dataset::{parse_timestamp, Dataset, ListingId, ReviewRecord};
use crate::topics::{label_topics, TopicLabels};

pub(crate) fn record(
    listing_id: &str,
    date: &str,
    topic: i64,
    sentiment_binary: &str,
    sentiment_ml: &str,
) -> ReviewRecord {
    ReviewRecord {
        listing_id: ListingId::new(listing_id),
        date: parse_timestamp(date).unwrap(),
        topic: Some(topic),
        topic_label: None,
        sentiment_binary: sentiment_binary.parse().unwrap(),
        sentiment_ml: sentiment_ml.to_string(),
        comments: format!("review of {listing_id} on {date}"),
    }
}

pub(crate) fn labeled(records: Vec<ReviewRecord>) -> Dataset {
    label_topics(Dataset::new(records), &TopicLabels::default())
}

pub(crate) fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Three listings over three months, topics 0, 1, 3 and an unmapped 7.
pub(crate) fn sample_dataset() -> Dataset {
    labeled(vec![
        record("101", "2023-01-03", 0, "Positive", "Positive"),
        record("101", "2023-01-15 09:30:00", 1, "Non-Positive", "Negative"),
        record("202", "2023-01-31 23:00:00", 1, "Non-Positive", "Neutral"),
        record("202", "2023-02-10", 3, "Positive", "Positive"),
        record("202", "2023-02-11", 3, "Non-Positive", "Negative"),
        record("303", "2023-03-01", 7, "Non-Positive", "Negative"),
        record("101", "2023-03-20", 0, "Positive", "Positive"),
        record("303", "2023-03-21", 1, "Positive", "Negative"),
    ])
}
