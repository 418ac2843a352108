use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::Dataset;

/// Human-curated interpretation of the upstream topic model's output.
const DEFAULT_TOPIC_LABELS: [(i64, &str); 5] = [
    (0, "Overall Positive Stay Experience"),
    (1, "City-Center Accommodation"),
    (2, "Memorable Airbnb Experience"),
    (3, "Location & Walkability"),
    (4, "Room Size & Amenities"),
];

/// Topic id to theme label mapping, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicLabels(BTreeMap<i64, String>);

impl TopicLabels {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self(
            labels
                .into_iter()
                .map(|(topic, label)| (topic, label.into()))
                .collect(),
        )
    }

    pub fn get(&self, topic: i64) -> Option<&str> {
        self.0.get(&topic).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Definition table, ordered by topic id.
    pub fn themes(&self) -> Vec<Theme> {
        self.0
            .iter()
            .map(|(topic, label)| Theme {
                topic: *topic,
                label: label.clone(),
            })
            .collect()
    }
}

impl Default for TopicLabels {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_LABELS)
    }
}

/// One row of the experience-theme definition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    pub topic: i64,
    pub label: String,
}

/// Attach `topic_label` to every record.
///
/// Missing or unmapped topics get no label rather than an error.
pub fn label_topics(dataset: Dataset, labels: &TopicLabels) -> Dataset {
    let (mut records, _) = dataset.into_parts();
    let mut unlabeled = 0usize;

    for record in &mut records {
        record.topic_label = record
            .topic
            .and_then(|topic| labels.get(topic))
            .map(str::to_owned);
        if record.topic_label.is_none() {
            unlabeled += 1;
        }
    }

    if unlabeled > 0 {
        tracing::warn!(unlabeled, "reviews with a topic outside the label mapping");
    }

    Dataset::from_parts(records, labels.themes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_labels() {
        let labels = TopicLabels::default();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels.get(0), Some("Overall Positive Stay Experience"));
        assert_eq!(labels.get(3), Some("Location & Walkability"));
        assert_eq!(labels.get(7), None);
    }

    #[test]
    fn test_themes_are_ordered_by_topic() {
        let labels = TopicLabels::new([(2, "b"), (0, "a"), (5, "c")]);
        let topics: Vec<_> = labels.themes().iter().map(|theme| theme.topic).collect();
        assert_eq!(topics, vec![0, 2, 5]);
    }

    #[test]
    fn test_label_topics() {
        let mut missing = record("3", "2023-01-03", 0, "Positive", "Positive");
        missing.topic = None;
        let dataset = Dataset::new(vec![
            record("1", "2023-01-01", 4, "Positive", "Positive"),
            record("2", "2023-01-02", 7, "Non-Positive", "Negative"),
            missing,
        ]);

        let labeled = label_topics(dataset, &TopicLabels::default());
        let labels: Vec<_> = labeled
            .iter()
            .map(|record| record.topic_label.as_deref())
            .collect();

        assert_eq!(labels, vec![Some("Room Size & Amenities"), None, None]);
        assert_eq!(labeled.themes(), TopicLabels::default().themes().as_slice());
    }

    #[test]
    fn test_relabel_replaces_previous_labels() {
        let dataset = Dataset::new(vec![record("1", "2023-01-01", 1, "Positive", "Positive")]);
        let labeled = label_topics(dataset, &TopicLabels::default());
        let relabeled = label_topics(labeled, &TopicLabels::new([(1, "Central")]));

        assert_eq!(relabeled.records()[0].topic_label.as_deref(), Some("Central"));
        assert_eq!(relabeled.themes().len(), 1);
    }
}
