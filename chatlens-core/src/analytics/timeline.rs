//! Time-based views: daily trend, per-user trend, weekly heatmap and
//! web/mobile source ratio.
//!
//! Input order does not matter; every view groups through ordered maps so
//! output comes out sorted by date.

use super::numeric::counted_amount;
use crate::config::AnalyticsConfig;
use crate::error::Error;
use crate::store::RecordStore;
use crate::types::MessageRecord;
use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;

/// Activity on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub message_count: u64,
    /// Counted red packet amount sent that day
    pub redpacket_amount: f64,
}

/// Messages and counted amounts per date, ascending. Dates without messages
/// are not filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyTrend {
    pub days: Vec<DailyPoint>,
}

impl DailyTrend {
    pub fn compute(store: &RecordStore, config: &AnalyticsConfig) -> Self {
        Self::from_records(store.records().iter(), config)
    }

    fn from_records<'a, I>(records: I, config: &AnalyticsConfig) -> Self
    where
        I: Iterator<Item = &'a MessageRecord>,
    {
        let mut by_date: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
        for record in records {
            let entry = by_date.entry(record.date()).or_insert((0, 0.0));
            entry.0 += 1;
            if let Some(amount) = counted_amount(record, config) {
                entry.1 += amount;
            }
        }

        let days = by_date
            .into_iter()
            .map(|(date, (message_count, redpacket_amount))| DailyPoint {
                date,
                message_count,
                redpacket_amount,
            })
            .collect();

        Self { days }
    }
}

/// Daily trend of one sender.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserTrend {
    pub sender_id: String,
    pub days: Vec<DailyPoint>,
}

impl UserTrend {
    /// Daily trend restricted to `sender_id`; an unknown sender yields an
    /// empty series.
    pub fn compute(store: &RecordStore, config: &AnalyticsConfig, sender_id: &str) -> Self {
        match Self::try_compute(store, config, sender_id) {
            Ok(trend) => trend,
            Err(err) => {
                tracing::debug!(error = %err, "Per-user trend requested for unknown sender");
                Self {
                    sender_id: sender_id.to_string(),
                    days: Vec::new(),
                }
            }
        }
    }

    fn try_compute(
        store: &RecordStore,
        config: &AnalyticsConfig,
        sender_id: &str,
    ) -> crate::Result<Self> {
        let mut records = store
            .records()
            .iter()
            .filter(|r| r.sender_id == sender_id)
            .peekable();
        if records.peek().is_none() {
            return Err(Error::SenderNotFound(sender_id.to_string()));
        }

        Ok(Self {
            sender_id: sender_id.to_string(),
            days: DailyTrend::from_records(records, config).days,
        })
    }
}

/// One cell of the weekday × hour grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    /// 0-23
    pub hour: u8,
    /// 0=Monday, 6=Sunday
    pub weekday: u8,
    pub count: u64,
}

/// Message counts on a 7 × 24 grid.
///
/// All 168 cells are present, weekday-major then hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub cells: Vec<HeatmapCell>,
    /// Hour with the most messages across all weekdays
    pub peak_hour: Option<u8>,
    /// Weekday with the most messages (0=Monday)
    pub busiest_weekday: Option<u8>,
}

impl Heatmap {
    pub const WEEKDAYS: usize = 7;
    pub const HOURS: usize = 24;

    pub fn compute(store: &RecordStore) -> Self {
        let mut grid = [[0u64; Self::HOURS]; Self::WEEKDAYS];
        for record in store.records() {
            let weekday = record.timestamp.weekday().num_days_from_monday() as usize;
            let hour = record.timestamp.hour() as usize;
            grid[weekday][hour] += 1;
        }

        let mut hourly = [0u64; Self::HOURS];
        let mut daily = [0u64; Self::WEEKDAYS];
        let mut cells = Vec::with_capacity(Self::WEEKDAYS * Self::HOURS);
        for (weekday, hours) in grid.iter().enumerate() {
            for (hour, &count) in hours.iter().enumerate() {
                hourly[hour] += count;
                daily[weekday] += count;
                cells.push(HeatmapCell {
                    hour: hour as u8,
                    weekday: weekday as u8,
                    count,
                });
            }
        }

        Self {
            cells,
            peak_hour: busiest_index(&hourly),
            busiest_weekday: busiest_index(&daily),
        }
    }

    /// Count at a grid position.
    pub fn count(&self, weekday: u8, hour: u8) -> u64 {
        self.cells
            .get(weekday as usize * Self::HOURS + hour as usize)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Weekday name from index (0=Monday).
    pub fn weekday_name(weekday: u8) -> &'static str {
        match weekday {
            0 => "Monday",
            1 => "Tuesday",
            2 => "Wednesday",
            3 => "Thursday",
            4 => "Friday",
            5 => "Saturday",
            6 => "Sunday",
            _ => "Unknown",
        }
    }
}

/// Index of the largest non-zero bucket, lowest index on ties.
fn busiest_index(buckets: &[u64]) -> Option<u8> {
    buckets
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .fold(None, |best: Option<(usize, u64)>, (index, &count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((index, count)),
        })
        .map(|(index, _)| index as u8)
}

/// Web versus mobile share on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRatioPoint {
    pub date: NaiveDate,
    pub web_count: u64,
    pub mobile_count: u64,
    pub total: u64,
    pub web_ratio: f64,
    /// Always `1.0 - web_ratio`, so the pair sums to exactly 1.0
    pub mobile_ratio: f64,
}

/// Per-date web/mobile split, ascending by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceRatio {
    pub days: Vec<SourceRatioPoint>,
}

impl SourceRatio {
    pub fn compute(store: &RecordStore) -> Self {
        let mut by_date: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
        for record in store.records() {
            let entry = by_date.entry(record.date()).or_insert((0, 0));
            if record.is_web {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }

        let days = by_date
            .into_iter()
            .map(|(date, (web_count, mobile_count))| {
                let total = web_count + mobile_count;
                let web_ratio = web_count as f64 / total as f64;
                SourceRatioPoint {
                    date,
                    web_count,
                    mobile_count,
                    total,
                    web_ratio,
                    mobile_ratio: 1.0 - web_ratio,
                }
            })
            .collect();

        Self { days }
    }
}
