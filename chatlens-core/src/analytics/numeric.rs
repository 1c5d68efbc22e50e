//! Shared numeric helpers for the aggregation views.

use crate::config::AnalyticsConfig;
use crate::types::MessageRecord;
use chrono::NaiveDate;
use serde::Serialize;

/// Round half-up to `decimals` places.
///
/// Only used on non-negative values, where half-up and half-away-from-zero agree.
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor + 0.5).floor() / factor
}

/// Mean of the values, 0.0 when there are none.
///
/// Accumulates in `u128` so large lengths cannot overflow.
pub fn mean<I>(values: I) -> f64
where
    I: IntoIterator<Item = u64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0u128, 0u64), |(sum, count), v| {
            (sum + u128::from(v), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// `part / whole * 100`, 0.0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// The red packet amount of a record if it passes the outlier policy.
pub fn counted_amount(record: &MessageRecord, config: &AnalyticsConfig) -> Option<f64> {
    if !record.is_redpacket {
        return None;
    }
    record
        .redpacket_amount
        .filter(|amount| config.is_counted_amount(*amount))
}

/// Length of the longest run of consecutive dates.
///
/// `dates` must be sorted ascending and free of duplicates.
pub fn longest_streak(dates: &[NaiveDate]) -> i64 {
    let mut longest = 0i64;
    let mut streak = 0i64;
    let mut previous: Option<NaiveDate> = None;

    for &date in dates {
        streak = match previous {
            Some(prev) if prev.succ_opt() == Some(date) => streak + 1,
            _ => 1,
        };
        longest = longest.max(streak);
        previous = Some(date);
    }

    longest
}

/// One histogram bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    /// Inclusive lower bound
    pub min: u64,
    /// Exclusive upper bound; `None` on the overflow bin
    pub max: Option<u64>,
    pub count: u64,
    pub label: String,
}

impl HistogramBin {
    pub fn is_overflow(&self) -> bool {
        self.max.is_none()
    }
}

/// Fixed-width histogram from 0 to `cap` plus one overflow bin.
///
/// Every bin is emitted, including empty ones. A width that does not divide
/// the cap truncates the last bounded bin at the cap.
pub fn fixed_width_histogram<I>(values: I, width: u64, cap: u64) -> Vec<HistogramBin>
where
    I: IntoIterator<Item = u64>,
{
    let width = width.max(1);
    let bounded = cap.div_ceil(width) as usize;
    let mut counts = vec![0u64; bounded + 1];

    for value in values {
        let index = if value >= cap {
            bounded
        } else {
            (value / width) as usize
        };
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| {
            if index == bounded {
                HistogramBin {
                    min: cap,
                    max: None,
                    count,
                    label: format!("{}+", cap),
                }
            } else {
                let min = index as u64 * width;
                let max = (min + width).min(cap);
                HistogramBin {
                    min,
                    max: Some(max),
                    count,
                    label: format!("[{}, {})", min, max),
                }
            }
        })
        .collect()
}
