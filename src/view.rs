use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::dataset::Dataset;
use crate::filter::{FilterOptions, FilterState};
use crate::metrics::{self, Kpis, ListingRisk, NegativeReview, SentimentShare, TopicRisk, TrendPoint};
use crate::topics::Theme;

pub const NO_DATA_NOTICE: &str = "No data available for selected filters.";
pub const NO_NEGATIVE_REVIEWS_NOTICE: &str = "No negative reviews found for the selected filters.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderOptions {
    pub sample_size: usize,
    pub top_listings: usize,
    pub sample_seed: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sample_size: metrics::DEFAULT_SAMPLE_SIZE,
            top_listings: metrics::DEFAULT_TOP_LISTINGS,
            sample_seed: metrics::DEFAULT_SAMPLE_SEED,
        }
    }
}

/// A dashboard panel that either has content or explains why not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Data { items: T },
    Empty { notice: String },
}

impl<T> Section<T> {
    fn empty(notice: &str) -> Self {
        Section::Empty {
            notice: notice.to_owned(),
        }
    }

    pub fn items(&self) -> Option<&T> {
        match self {
            Section::Data { items } => Some(items),
            Section::Empty { .. } => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            Section::Data { .. } => None,
            Section::Empty { notice } => Some(notice),
        }
    }
}

/// Everything the presentation layer draws for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub themes: Vec<Theme>,
    pub filter_options: FilterOptions,
    pub applied_filter: FilterState,
    pub kpis: Kpis,
    pub sentiment_distribution: Vec<SentimentShare>,
    pub trend: Section<Vec<TrendPoint>>,
    pub topic_risk: Section<Vec<TopicRisk>>,
    pub high_risk_listings: Vec<ListingRisk>,
    pub negative_feedback: Section<Vec<NegativeReview>>,
}

/// Recompute the whole dashboard for `filter`. Holds no state between calls.
pub fn render<R>(
    dataset: &Dataset,
    filter: &FilterState,
    options: &RenderOptions,
    rng: &mut R,
) -> ViewModel
where
    R: Rng + ?Sized,
{
    let rows = filter.apply(dataset);
    tracing::debug!(rows = rows.len(), total = dataset.len(), "filter applied");

    let (trend, topic_risk) = if rows.is_empty() {
        (Section::empty(NO_DATA_NOTICE), Section::empty(NO_DATA_NOTICE))
    } else {
        (
            Section::Data {
                items: metrics::monthly_trend(&rows),
            },
            Section::Data {
                items: metrics::topic_risk(&rows),
            },
        )
    };

    let sample = metrics::negative_sample(&rows, options.sample_size, rng);
    let negative_feedback = if sample.is_empty() {
        Section::empty(NO_NEGATIVE_REVIEWS_NOTICE)
    } else {
        Section::Data { items: sample }
    };

    ViewModel {
        themes: dataset.themes().to_vec(),
        filter_options: FilterOptions::from_dataset(dataset),
        applied_filter: filter.clone(),
        kpis: Kpis::compute(&rows),
        sentiment_distribution: metrics::sentiment_distribution(&rows),
        trend,
        topic_risk,
        high_risk_listings: metrics::high_risk_listings(&rows, options.top_listings),
        negative_feedback,
    }
}

/// [`render`] with a generator seeded from `options.sample_seed`.
pub fn render_seeded(dataset: &Dataset, filter: &FilterState, options: &RenderOptions) -> ViewModel {
    let mut rng = StdRng::seed_from_u64(options.sample_seed);
    render(dataset, filter, options, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::DateRange;
    use crate::testing::{day, sample_dataset};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_full_dataset() {
        let dataset = sample_dataset();
        let filter = FilterState::for_dataset(&dataset);

        let view = render_seeded(&dataset, &filter, &RenderOptions::default());
        assert_eq!(view.kpis.count, dataset.len());
        assert_eq!(view.kpis.unique_listings, 3);
        assert_eq!(view.themes.len(), 5);
        assert_eq!(view.trend.items().map(Vec::len), Some(3));
        assert_eq!(view.topic_risk.items().map(Vec::len), Some(4));
        assert_eq!(view.negative_feedback.items().map(Vec::len), Some(4));
        assert_eq!(view.high_risk_listings[0].listing_id.as_str(), "202");
        assert_eq!(view.applied_filter, filter);
    }

    #[test]
    fn test_render_unknown_listing_reports_no_data() {
        let dataset = sample_dataset();
        let filter = FilterState::for_dataset(&dataset).with_listing("42");

        let view = render_seeded(&dataset, &filter, &RenderOptions::default());
        assert_eq!(view.kpis.count, 0);
        assert_eq!(view.kpis.non_positive_rate, None);
        assert_eq!(view.trend.notice(), Some(NO_DATA_NOTICE));
        assert_eq!(view.topic_risk.notice(), Some(NO_DATA_NOTICE));
        assert_eq!(view.negative_feedback.notice(), Some(NO_NEGATIVE_REVIEWS_NOTICE));
        assert!(view.high_risk_listings.is_empty());
        assert_eq!(view.filter_options.listings.len(), 4);
    }

    #[test]
    fn test_render_without_negative_reviews() {
        let dataset = sample_dataset();
        let filter = FilterState::default()
            .with_date_range(DateRange::new(day(2023, 1, 1), day(2023, 1, 10)).unwrap());

        let view = render_seeded(&dataset, &filter, &RenderOptions::default());
        assert_eq!(view.kpis.count, 1);
        assert!(view.trend.items().is_some());
        assert_eq!(view.negative_feedback.notice(), Some(NO_NEGATIVE_REVIEWS_NOTICE));
    }

    #[test]
    fn test_render_is_repeatable() {
        let dataset = sample_dataset();
        let filter = FilterState::for_dataset(&dataset);
        let options = RenderOptions {
            sample_size: 2,
            ..Default::default()
        };

        let first = render_seeded(&dataset, &filter, &options);
        let second = render_seeded(&dataset, &filter, &options);
        assert_eq!(first, second);
        assert_eq!(first.negative_feedback.items().map(Vec::len), Some(2));
    }

    #[test]
    fn test_section_serialization() {
        let section: Section<Vec<u32>> = Section::empty(NO_DATA_NOTICE);
        assert_eq!(
            serde_json::to_value(&section).unwrap(),
            serde_json::json!({ "status": "empty", "notice": NO_DATA_NOTICE })
        );

        let section = Section::Data { items: vec![1, 2] };
        assert_eq!(
            serde_json::to_value(&section).unwrap(),
            serde_json::json!({ "status": "data", "items": [1, 2] })
        );
    }
}
