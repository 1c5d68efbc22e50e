//! Aggregation views for chatlens
//!
//! Every view is a pure function of a [`RecordStore`] and the
//! [`AnalyticsConfig`]:
//! - Summary and message type distribution ([`dashboard`])
//! - Daily trend, per-user trend, weekly heatmap, source ratio ([`timeline`])
//! - Top users and payment ranking ([`rankings`])
//! - Red packet payment statistics ([`payments`])
//! - Content and token length histograms ([`histogram`])
//!
//! Views never fail: an empty store produces empty or zero-filled results.
//!
//! ## Addressing views
//!
//! A [`ViewKey`] names a view together with its parameters. [`compute`] runs
//! the matching function and wraps the output in an [`AggregateResult`], which
//! is what the cache stores.
//!
//! ```rust
//! use chatlens_core::analytics::{compute, ViewKey};
//! use chatlens_core::{AnalyticsConfig, RecordStore};
//!
//! let store = RecordStore::empty();
//! let result = compute(&ViewKey::Summary, &store, &AnalyticsConfig::default());
//! assert_eq!(result.summary().map(|s| s.total_messages), Some(0));
//! ```

pub mod dashboard;
pub mod histogram;
pub mod numeric;
pub mod payments;
pub mod rankings;
pub mod timeline;

pub use dashboard::{MessageTypeDistribution, Summary, TypeCounts, TypePercentages};
pub use histogram::LengthHistograms;
pub use numeric::HistogramBin;
pub use payments::{CumulativePayment, DailyPayment, PaymentPoint, PaymentStats};
pub use rankings::{TopUsers, UserActivity, UserPayment, UserPaymentRanking};
pub use timeline::{
    DailyPoint, DailyTrend, Heatmap, HeatmapCell, SourceRatio, SourceRatioPoint, UserTrend,
};

use crate::config::AnalyticsConfig;
use crate::store::RecordStore;
use serde::Serialize;
use std::fmt;

/// A view plus the parameters that change its output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKey {
    Summary,
    DailyTrend,
    Heatmap,
    /// `None` ranks every sender
    TopUsers { limit: Option<usize> },
    MessageTypes,
    LengthHistograms,
    Payments,
    UserPaymentRanking { limit: Option<usize> },
    SourceRatio,
    UserTrend { sender_id: String },
}

impl ViewKey {
    /// Names accepted by [`ViewKey::from_name`].
    pub const NAMES: &'static [&'static str] = &[
        "summary",
        "daily",
        "heatmap",
        "top-users",
        "message-types",
        "histograms",
        "payments",
        "payment-ranking",
        "source-ratio",
        "user-trend",
    ];

    /// Stable name used in logs and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ViewKey::Summary => "summary",
            ViewKey::DailyTrend => "daily",
            ViewKey::Heatmap => "heatmap",
            ViewKey::TopUsers { .. } => "top-users",
            ViewKey::MessageTypes => "message-types",
            ViewKey::LengthHistograms => "histograms",
            ViewKey::Payments => "payments",
            ViewKey::UserPaymentRanking { .. } => "payment-ranking",
            ViewKey::SourceRatio => "source-ratio",
            ViewKey::UserTrend { .. } => "user-trend",
        }
    }

    /// Build a key from its name and optional parameters.
    ///
    /// `user-trend` needs a sender id; the other views ignore it.
    pub fn from_name(
        name: &str,
        limit: Option<usize>,
        sender_id: Option<&str>,
    ) -> crate::Result<Self> {
        let key = match name {
            "summary" => ViewKey::Summary,
            "daily" => ViewKey::DailyTrend,
            "heatmap" => ViewKey::Heatmap,
            "top-users" => ViewKey::TopUsers { limit },
            "message-types" => ViewKey::MessageTypes,
            "histograms" => ViewKey::LengthHistograms,
            "payments" => ViewKey::Payments,
            "payment-ranking" => ViewKey::UserPaymentRanking { limit },
            "source-ratio" => ViewKey::SourceRatio,
            "user-trend" => {
                let sender_id = sender_id.ok_or_else(|| {
                    crate::Error::Input("user-trend needs a sender id".to_string())
                })?;
                ViewKey::UserTrend {
                    sender_id: sender_id.to_string(),
                }
            }
            other => {
                return Err(crate::Error::Input(format!(
                    "unknown view: {} (expected one of: {})",
                    other,
                    Self::NAMES.join(", ")
                )))
            }
        };
        Ok(key)
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKey::TopUsers { limit: Some(n) } | ViewKey::UserPaymentRanking { limit: Some(n) } => {
                write!(f, "{}[{}]", self.name(), n)
            }
            ViewKey::UserTrend { sender_id } => write!(f, "{}[{}]", self.name(), sender_id),
            _ => f.write_str(self.name()),
        }
    }
}

/// Output of one view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregateResult {
    Summary(Summary),
    DailyTrend(DailyTrend),
    Heatmap(Heatmap),
    TopUsers(TopUsers),
    MessageTypes(MessageTypeDistribution),
    LengthHistograms(LengthHistograms),
    Payments(PaymentStats),
    UserPaymentRanking(UserPaymentRanking),
    SourceRatio(SourceRatio),
    UserTrend(UserTrend),
}

impl AggregateResult {
    /// Name of the view that produced this result, as in [`ViewKey::name`].
    pub fn view_name(&self) -> &'static str {
        match self {
            AggregateResult::Summary(_) => "summary",
            AggregateResult::DailyTrend(_) => "daily",
            AggregateResult::Heatmap(_) => "heatmap",
            AggregateResult::TopUsers(_) => "top-users",
            AggregateResult::MessageTypes(_) => "message-types",
            AggregateResult::LengthHistograms(_) => "histograms",
            AggregateResult::Payments(_) => "payments",
            AggregateResult::UserPaymentRanking(_) => "payment-ranking",
            AggregateResult::SourceRatio(_) => "source-ratio",
            AggregateResult::UserTrend(_) => "user-trend",
        }
    }

    pub fn summary(&self) -> Option<&Summary> {
        match self {
            AggregateResult::Summary(v) => Some(v),
            _ => None,
        }
    }

    pub fn daily_trend(&self) -> Option<&DailyTrend> {
        match self {
            AggregateResult::DailyTrend(v) => Some(v),
            _ => None,
        }
    }

    pub fn heatmap(&self) -> Option<&Heatmap> {
        match self {
            AggregateResult::Heatmap(v) => Some(v),
            _ => None,
        }
    }

    pub fn top_users(&self) -> Option<&TopUsers> {
        match self {
            AggregateResult::TopUsers(v) => Some(v),
            _ => None,
        }
    }

    pub fn message_types(&self) -> Option<&MessageTypeDistribution> {
        match self {
            AggregateResult::MessageTypes(v) => Some(v),
            _ => None,
        }
    }

    pub fn length_histograms(&self) -> Option<&LengthHistograms> {
        match self {
            AggregateResult::LengthHistograms(v) => Some(v),
            _ => None,
        }
    }

    pub fn payments(&self) -> Option<&PaymentStats> {
        match self {
            AggregateResult::Payments(v) => Some(v),
            _ => None,
        }
    }

    pub fn user_payment_ranking(&self) -> Option<&UserPaymentRanking> {
        match self {
            AggregateResult::UserPaymentRanking(v) => Some(v),
            _ => None,
        }
    }

    pub fn source_ratio(&self) -> Option<&SourceRatio> {
        match self {
            AggregateResult::SourceRatio(v) => Some(v),
            _ => None,
        }
    }

    pub fn user_trend(&self) -> Option<&UserTrend> {
        match self {
            AggregateResult::UserTrend(v) => Some(v),
            _ => None,
        }
    }
}

/// Run the view named by `key` against `store`.
pub fn compute(key: &ViewKey, store: &RecordStore, config: &AnalyticsConfig) -> AggregateResult {
    match key {
        ViewKey::Summary => AggregateResult::Summary(Summary::compute(store, config)),
        ViewKey::DailyTrend => AggregateResult::DailyTrend(DailyTrend::compute(store, config)),
        ViewKey::Heatmap => AggregateResult::Heatmap(Heatmap::compute(store)),
        ViewKey::TopUsers { limit } => {
            AggregateResult::TopUsers(TopUsers::compute(store, *limit))
        }
        ViewKey::MessageTypes => {
            AggregateResult::MessageTypes(MessageTypeDistribution::compute(store))
        }
        ViewKey::LengthHistograms => {
            AggregateResult::LengthHistograms(LengthHistograms::compute(store, config))
        }
        ViewKey::Payments => AggregateResult::Payments(PaymentStats::compute(store, config)),
        ViewKey::UserPaymentRanking { limit } => AggregateResult::UserPaymentRanking(
            UserPaymentRanking::compute(store, config, *limit),
        ),
        ViewKey::SourceRatio => AggregateResult::SourceRatio(SourceRatio::compute(store)),
        ViewKey::UserTrend { sender_id } => {
            AggregateResult::UserTrend(UserTrend::compute(store, config, sender_id))
        }
    }
}

/// Every dashboard view of one snapshot, for a single JSON export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub generation: u64,
    pub files: Vec<String>,
    pub summary: Summary,
    pub daily_trend: DailyTrend,
    pub heatmap: Heatmap,
    pub top_users: TopUsers,
    pub message_types: MessageTypeDistribution,
    pub length_histograms: LengthHistograms,
    pub payments: PaymentStats,
    pub user_payment_ranking: UserPaymentRanking,
    pub source_ratio: SourceRatio,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_names_round_trip() {
        for name in ViewKey::NAMES {
            let key = ViewKey::from_name(name, None, Some("u1")).unwrap();
            assert_eq!(key.name(), *name);
        }
        assert!(ViewKey::from_name("nope", None, None).is_err());
        assert!(ViewKey::from_name("user-trend", None, None).is_err());
    }

    #[test]
    fn test_view_key_display() {
        assert_eq!(ViewKey::TopUsers { limit: Some(20) }.to_string(), "top-users[20]");
        assert_eq!(ViewKey::TopUsers { limit: None }.to_string(), "top-users");
        assert_eq!(
            ViewKey::UserTrend {
                sender_id: "u1".to_string()
            }
            .to_string(),
            "user-trend[u1]"
        );
    }

    #[test]
    fn test_compute_dispatches_to_matching_variant() {
        let store = test_support::scenario_store();
        let config = AnalyticsConfig::default();

        let result = compute(&ViewKey::TopUsers { limit: Some(1) }, &store, &config);
        let top = result.top_users().unwrap();
        assert_eq!(top.users.len(), 1);
        assert!(result.summary().is_none());

        let result = compute(&ViewKey::Payments, &store, &config);
        assert_eq!(result.payments().unwrap().total_amount, 30.0);
    }

    #[test]
    fn test_compute_returns_variant_named_by_key() {
        let store = test_support::scenario_store();
        let config = AnalyticsConfig::default();
        for name in ViewKey::NAMES {
            let key = ViewKey::from_name(name, Some(5), Some("u1")).unwrap();
            assert_eq!(compute(&key, &store, &config).view_name(), key.name());
        }
    }

    #[test]
    fn test_empty_store_views_serialize() {
        let store = RecordStore::empty();
        let config = AnalyticsConfig::default();
        for name in ViewKey::NAMES {
            let key = ViewKey::from_name(name, None, Some("u1")).unwrap();
            let value = serde_json::to_value(compute(&key, &store, &config)).unwrap();
            assert!(value.is_object(), "{} should serialize to an object", name);
        }
    }

    #[test]
    fn test_summary_serializes_stable_names() {
        let store = test_support::scenario_store();
        let result = compute(&ViewKey::Summary, &store, &AnalyticsConfig::default());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["total_messages"], 3);
        assert_eq!(value["total_users"], 2);
        assert_eq!(value["total_redpacket_amount"], 30.0);
        assert_eq!(value["first_date"], "2024-01-01");
    }
}
