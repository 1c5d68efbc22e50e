//! Red packet payment statistics.
//!
//! Only counted amounts (at or below the outlier threshold) take part. The
//! scatter, daily and cumulative series are all derived from the same
//! filtered subset so their totals agree.

use crate::config::AnalyticsConfig;
use crate::store::RecordStore;
use crate::types::MessageRecord;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// One counted red packet event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPoint {
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub amount: f64,
}

/// Counted amount per date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPayment {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Running total over the daily series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePayment {
    pub date: NaiveDate,
    pub cumulative_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaymentStats {
    /// Events in chronological order
    pub scatter: Vec<PaymentPoint>,
    /// Totals per date, ascending
    pub daily: Vec<DailyPayment>,
    /// `cumulative[i] = cumulative[i - 1] + daily[i].amount`
    pub cumulative: Vec<CumulativePayment>,
    pub total_amount: f64,
    pub event_count: u64,
    /// Red packet events left out for exceeding the threshold
    pub excluded_count: u64,
}

impl PaymentStats {
    pub fn compute(store: &RecordStore, config: &AnalyticsConfig) -> Self {
        let mut counted: Vec<(&MessageRecord, f64)> = Vec::new();
        let mut excluded_count = 0u64;

        for record in store.records().iter().filter(|r| r.is_redpacket) {
            match record.redpacket_amount {
                Some(amount) if config.is_counted_amount(amount) => counted.push((record, amount)),
                Some(_) => excluded_count += 1,
                None => {}
            }
        }

        // Stable sort keeps load order for identical timestamps.
        counted.sort_by_key(|(record, _)| record.timestamp);

        let scatter: Vec<PaymentPoint> = counted
            .iter()
            .map(|(record, amount)| PaymentPoint {
                timestamp: record.timestamp,
                date: record.date(),
                amount: *amount,
            })
            .collect();

        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for point in &scatter {
            *by_date.entry(point.date).or_insert(0.0) += point.amount;
        }
        let daily: Vec<DailyPayment> = by_date
            .into_iter()
            .map(|(date, amount)| DailyPayment { date, amount })
            .collect();

        let mut running = 0.0;
        let cumulative = daily
            .iter()
            .map(|day| {
                running += day.amount;
                CumulativePayment {
                    date: day.date,
                    cumulative_amount: running,
                }
            })
            .collect();

        if excluded_count > 0 {
            tracing::debug!(
                excluded = excluded_count,
                threshold = config.outlier_threshold,
                "Red packet outliers left out of payment totals"
            );
        }

        Self {
            event_count: scatter.len() as u64,
            scatter,
            daily,
            cumulative,
            total_amount: running,
            excluded_count,
        }
    }
}
