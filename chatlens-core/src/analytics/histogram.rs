//! Length distributions of text messages.

use super::numeric::{fixed_width_histogram, HistogramBin};
use crate::config::AnalyticsConfig;
use crate::store::RecordStore;
use serde::Serialize;

/// Content length and token count histograms over text messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthHistograms {
    pub content_length: Vec<HistogramBin>,
    /// Only text messages that carry a token count
    pub token_count: Vec<HistogramBin>,
}

impl LengthHistograms {
    pub fn compute(store: &RecordStore, config: &AnalyticsConfig) -> Self {
        let width = config.histogram_bin_width;
        let cap = config.histogram_cap;
        let text = || store.records().iter().filter(|r| r.is_text);

        Self {
            content_length: fixed_width_histogram(text().map(|r| r.content_length), width, cap),
            token_count: fixed_width_histogram(text().filter_map(|r| r.token_count), width, cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::record;

    #[test]
    fn test_histograms_only_count_text() {
        let mut records = Vec::new();
        for (i, len) in [3u64, 15, 15, 450].iter().enumerate() {
            let mut r = record(&i.to_string(), "u1", "2024-01-01T10:00:00");
            r.is_text = true;
            r.content_length = *len;
            r.token_count = (i % 2 == 0).then_some(*len / 2);
            records.push(r);
        }
        let mut image = record("img", "u1", "2024-01-01T10:00:00");
        image.is_image = true;
        image.content_length = 12;
        records.push(image);

        let hist = LengthHistograms::compute(
            &RecordStore::from_records(records),
            &AnalyticsConfig::default(),
        );

        assert_eq!(hist.content_length.len(), 31);
        assert_eq!(hist.content_length[0].count, 1);
        assert_eq!(hist.content_length[1].count, 2);
        assert_eq!(hist.content_length[30].count, 1);
        assert_eq!(hist.content_length.iter().map(|b| b.count).sum::<u64>(), 4);

        // tokens 1 (from 3) and 7 (from 15)
        assert_eq!(hist.token_count[0].count, 2);
        assert_eq!(hist.token_count.iter().map(|b| b.count).sum::<u64>(), 2);
    }

    #[test]
    fn test_histograms_follow_config() {
        let config = AnalyticsConfig {
            histogram_bin_width: 50,
            histogram_cap: 100,
            ..Default::default()
        };
        let hist = LengthHistograms::compute(&RecordStore::empty(), &config);
        assert_eq!(hist.content_length.len(), 3);
        assert_eq!(hist.token_count.len(), 3);
        assert!(hist.content_length[2].is_overflow());
    }
}
