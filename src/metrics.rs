use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::Serialize;

use crate::dataset::{ListingId, ReviewRecord, SentimentBinary};

pub const DEFAULT_SAMPLE_SIZE: usize = 5;
pub const DEFAULT_TOP_LISTINGS: usize = 10;
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Running Positive / Non-Positive tally.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: usize,
    non_positive: usize,
}

impl Tally {
    fn from_rows(rows: &[&ReviewRecord]) -> Self {
        let mut tally = Self::default();
        for record in rows {
            tally.add(record);
        }
        tally
    }

    fn add(&mut self, record: &ReviewRecord) {
        self.total += 1;
        if record.is_non_positive() {
            self.non_positive += 1;
        }
    }

    fn count(&self, sentiment: SentimentBinary) -> usize {
        match sentiment {
            SentimentBinary::Positive => self.total - self.non_positive,
            SentimentBinary::NonPositive => self.non_positive,
        }
    }

    /// Share of `sentiment` in [0, 1]; `None` for an empty tally.
    fn fraction(&self, sentiment: SentimentBinary) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.count(sentiment) as f64 / self.total as f64)
    }
}

/// Headline numbers. Rates are percentages and absent when no row matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub count: usize,
    pub non_positive_rate: Option<f64>,
    pub positive_rate: Option<f64>,
    pub unique_listings: usize,
}

impl Kpis {
    pub fn compute(rows: &[&ReviewRecord]) -> Self {
        let tally = Tally::from_rows(rows);
        let non_positive_rate = tally
            .fraction(SentimentBinary::NonPositive)
            .map(|fraction| fraction * 100.0);

        Self {
            count: tally.total,
            non_positive_rate,
            positive_rate: non_positive_rate.map(|rate| 100.0 - rate),
            unique_listings: rows
                .iter()
                .map(|record| &record.listing_id)
                .collect::<HashSet<_>>()
                .len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentShare {
    pub sentiment: SentimentBinary,
    pub percent: f64,
}

/// Percentage per sentiment, always both categories in display order.
pub fn sentiment_distribution(rows: &[&ReviewRecord]) -> Vec<SentimentShare> {
    let tally = Tally::from_rows(rows);
    SentimentBinary::ALL
        .into_iter()
        .map(|sentiment| SentimentShare {
            sentiment,
            percent: tally.fraction(sentiment).unwrap_or_default() * 100.0,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// First day of the month.
    pub month: NaiveDate,
    pub reviews: usize,
    pub non_positive_fraction: f64,
}

/// Non-Positive share per calendar month, oldest first. Months without reviews
/// are skipped.
pub fn monthly_trend(rows: &[&ReviewRecord]) -> Vec<TrendPoint> {
    let mut months: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    for record in rows {
        let date = record.date.date();
        let Some(month) = date.with_day(1) else {
            continue;
        };
        months.entry(month).or_default().add(record);
    }

    months
        .into_iter()
        .map(|(month, tally)| TrendPoint {
            month,
            reviews: tally.total,
            non_positive_fraction: tally
                .fraction(SentimentBinary::NonPositive)
                .unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicRisk {
    /// `None` groups reviews without a theme.
    pub topic_label: Option<String>,
    pub reviews: usize,
    pub positive: f64,
    pub non_positive: f64,
}

/// Sentiment split per theme. Named themes ascend; unlabeled reviews come last.
pub fn topic_risk(rows: &[&ReviewRecord]) -> Vec<TopicRisk> {
    let mut topics: BTreeMap<(bool, Option<&str>), Tally> = BTreeMap::new();
    for record in rows {
        let label = record.topic_label.as_deref();
        topics.entry((label.is_none(), label)).or_default().add(record);
    }

    topics
        .into_iter()
        .map(|((_, label), tally)| TopicRisk {
            topic_label: label.map(str::to_owned),
            reviews: tally.total,
            positive: tally.fraction(SentimentBinary::Positive).unwrap_or_default(),
            non_positive: tally
                .fraction(SentimentBinary::NonPositive)
                .unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRisk {
    pub listing_id: ListingId,
    pub non_positive_reviews: usize,
}

/// Listings with the most Non-Positive reviews. Equal counts keep listing order.
pub fn high_risk_listings(rows: &[&ReviewRecord], limit: usize) -> Vec<ListingRisk> {
    let mut listings: BTreeMap<&ListingId, usize> = BTreeMap::new();
    for record in rows.iter().filter(|record| record.is_non_positive()) {
        *listings.entry(&record.listing_id).or_default() += 1;
    }

    let mut ranked: Vec<ListingRisk> = listings
        .into_iter()
        .map(|(listing_id, count)| ListingRisk {
            listing_id: listing_id.clone(),
            non_positive_reviews: count,
        })
        .collect();
    ranked.sort_by(|left, right| right.non_positive_reviews.cmp(&left.non_positive_reviews));
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegativeReview {
    pub listing_id: ListingId,
    pub comments: String,
    pub topic_label: Option<String>,
}

/// Draw up to `size` distinct severely negative reviews using `rng`.
pub fn negative_sample<R>(rows: &[&ReviewRecord], size: usize, rng: &mut R) -> Vec<NegativeReview>
where
    R: Rng + ?Sized,
{
    let negatives: Vec<&ReviewRecord> = rows
        .iter()
        .copied()
        .filter(|record| record.is_negative())
        .collect();
    let amount = size.min(negatives.len());

    rand::seq::index::sample(rng, negatives.len(), amount)
        .into_iter()
        .map(|index| {
            let record = negatives[index];
            NegativeReview {
                listing_id: record.listing_id.clone(),
                comments: record.comments.clone(),
                topic_label: record.topic_label.clone(),
            }
        })
        .collect()
}
