//! Dashboard header statistics.
//!
//! Provides the overall summary card and the message type breakdown.

use super::numeric::{counted_amount, longest_streak, mean, percentage, round_half_up};
use crate::config::AnalyticsConfig;
use crate::store::RecordStore;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Overall statistics for the active selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    // Totals
    /// Number of messages
    pub total_messages: u64,
    /// Number of distinct sender ids
    pub total_users: u64,
    /// Sum of red packet amounts that pass the outlier policy
    pub total_redpacket_amount: f64,

    // Text averages, two decimals
    /// Mean content length over text messages
    pub avg_content_length: f64,
    /// Mean token count over text messages that carry one
    pub avg_token_length: f64,

    // Activity span
    /// Number of dates with at least one message
    pub active_days: u64,
    /// Longest run of consecutive active dates
    pub longest_streak_days: i64,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

impl Summary {
    pub fn compute(store: &RecordStore, config: &AnalyticsConfig) -> Self {
        let records = store.records();

        let users: HashSet<&str> = records.iter().map(|r| r.sender_id.as_str()).collect();
        let dates: BTreeSet<NaiveDate> = records.iter().map(|r| r.date()).collect();
        let dates: Vec<NaiveDate> = dates.into_iter().collect();

        let total_redpacket_amount = records
            .iter()
            .filter_map(|r| counted_amount(r, config))
            .sum();

        let text = || records.iter().filter(|r| r.is_text);
        let avg_content_length = mean(text().map(|r| r.content_length));
        let avg_token_length = mean(text().filter_map(|r| r.token_count));

        Self {
            total_messages: records.len() as u64,
            total_users: users.len() as u64,
            total_redpacket_amount,
            avg_content_length: round_half_up(avg_content_length, 2),
            avg_token_length: round_half_up(avg_token_length, 2),
            active_days: dates.len() as u64,
            longest_streak_days: longest_streak(&dates),
            first_date: dates.first().copied(),
            last_date: dates.last().copied(),
        }
    }
}

/// Counts per content category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub text: u64,
    pub image: u64,
    pub redpacket: u64,
}

impl TypeCounts {
    pub fn total(&self) -> u64 {
        self.text + self.image + self.redpacket
    }
}

/// Percentages per content category, one decimal, rounded half-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TypePercentages {
    pub text: f64,
    pub image: f64,
    pub redpacket: f64,
}

impl TypePercentages {
    pub fn sum(&self) -> f64 {
        self.text + self.image + self.redpacket
    }
}

/// Message type distribution.
///
/// Flags are counted independently, so the counts need not add up to the
/// message total. Percentages are relative to the sum of the three counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageTypeDistribution {
    pub counts: TypeCounts,
    pub percentages: TypePercentages,
}

impl MessageTypeDistribution {
    pub fn compute(store: &RecordStore) -> Self {
        let counts = store
            .records()
            .iter()
            .fold(TypeCounts::default(), |mut acc, r| {
                acc.text += r.is_text as u64;
                acc.image += r.is_image as u64;
                acc.redpacket += r.is_redpacket as u64;
                acc
            });

        let total = counts.total();
        let pct = |part| round_half_up(percentage(part, total), 1);

        Self {
            counts,
            percentages: TypePercentages {
                text: pct(counts.text),
                image: pct(counts.image),
                redpacket: pct(counts.redpacket),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{record, scenario_store};

    #[test]
    fn test_summary_scenario() {
        let summary = Summary::compute(&scenario_store(), &AnalyticsConfig::default());

        assert_eq!(summary.total_messages, 3);
        assert_eq!(summary.total_users, 2);
        assert_eq!(summary.total_redpacket_amount, 30.0);
        assert_eq!(summary.avg_content_length, 5.0);
        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.longest_streak_days, 2);
        assert_eq!(
            summary.first_date,
            Some(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        );
    }

    #[test]
    fn test_summary_empty_store() {
        let summary = Summary::compute(&RecordStore::empty(), &AnalyticsConfig::default());
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn test_summary_excludes_outlier_amounts() {
        let mut big = record("3", "u3", "2024-01-03T12:00:00");
        big.is_redpacket = true;
        big.redpacket_amount = Some(75.0);
        let mut edge = record("4", "u3", "2024-01-03T12:01:00");
        edge.is_redpacket = true;
        edge.redpacket_amount = Some(50.0);

        let store = RecordStore::from_records(vec![big, edge]);
        let summary = Summary::compute(&store, &AnalyticsConfig::default());
        assert_eq!(summary.total_messages, 2);
        assert_eq!(summary.total_redpacket_amount, 50.0);
    }

    #[test]
    fn test_summary_averages_round_to_two_decimals() {
        let texts = [1u64, 1, 2].iter().enumerate().map(|(i, len)| {
            let mut r = record(&i.to_string(), "u1", "2024-01-01T10:00:00");
            r.is_text = true;
            r.content_length = *len;
            r.token_count = Some(*len);
            r
        });
        let store = RecordStore::from_records(texts.collect());
        let summary = Summary::compute(&store, &AnalyticsConfig::default());
        assert_eq!(summary.avg_content_length, 1.33);
        assert_eq!(summary.avg_token_length, 1.33);
    }

    #[test]
    fn test_summary_handles_huge_lengths() {
        let half = u64::MAX / 2 + 1;
        let texts = (0..2).map(|i| {
            let mut r = record(&i.to_string(), "u1", "2024-01-01T10:00:00");
            r.is_text = true;
            r.content_length = half;
            r.token_count = Some(half);
            r
        });
        let store = RecordStore::from_records(texts.collect());
        let summary = Summary::compute(&store, &AnalyticsConfig::default());
        assert_eq!(summary.total_messages, 2);
        assert!(summary.avg_content_length.is_finite());
        assert!(summary.avg_content_length > 9.2e18);
        assert_eq!(summary.avg_content_length, summary.avg_token_length);
    }

    #[test]
    fn test_message_types_percentages() {
        let mut records = Vec::new();
        for i in 0..3 {
            let mut r = record(&format!("t{}", i), "u1", "2024-01-01T10:00:00");
            r.is_text = true;
            records.push(r);
        }
        let mut image = record("i", "u1", "2024-01-01T10:00:00");
        image.is_image = true;
        records.push(image);
        let mut packet = record("p", "u1", "2024-01-01T10:00:00");
        packet.is_redpacket = true;
        records.push(packet);
        records.push(record("none", "u1", "2024-01-01T10:00:00"));

        let dist = MessageTypeDistribution::compute(&RecordStore::from_records(records));
        assert_eq!(dist.counts.total(), 5);
        assert_eq!(dist.percentages.text, 60.0);
        assert_eq!(dist.percentages.image, 20.0);
        assert_eq!(dist.percentages.redpacket, 20.0);
    }

    #[test]
    fn test_message_types_sum_close_to_hundred() {
        for (text, image, packet) in [(1, 1, 1), (2, 1, 0), (7, 5, 3), (1, 0, 0), (10, 3, 4)] {
            let mut records = Vec::new();
            for i in 0..text {
                let mut r = record(&format!("t{}", i), "u", "2024-01-01T00:00:00");
                r.is_text = true;
                records.push(r);
            }
            for i in 0..image {
                let mut r = record(&format!("i{}", i), "u", "2024-01-01T00:00:00");
                r.is_image = true;
                records.push(r);
            }
            for i in 0..packet {
                let mut r = record(&format!("p{}", i), "u", "2024-01-01T00:00:00");
                r.is_redpacket = true;
                records.push(r);
            }
            let dist = MessageTypeDistribution::compute(&RecordStore::from_records(records));
            let sum = dist.percentages.sum();
            assert!((sum - 100.0).abs() <= 0.2, "sum {} for {:?}", sum, dist.counts);
        }
    }

    #[test]
    fn test_message_types_empty() {
        let dist = MessageTypeDistribution::compute(&RecordStore::empty());
        assert_eq!(dist, MessageTypeDistribution::default());
    }
}
