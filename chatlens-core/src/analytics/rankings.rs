//! Sender rankings by message volume and by counted red packet amount.

use super::numeric::counted_amount;
use crate::config::AnalyticsConfig;
use crate::store::RecordStore;
use serde::Serialize;
use std::collections::HashMap;

/// Message count of one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    pub sender_id: String,
    /// Latest non-empty display name, or the id
    pub sender_name: String,
    pub message_count: u64,
}

/// Senders by message count, descending; ties by sender id ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopUsers {
    pub users: Vec<UserActivity>,
}

impl TopUsers {
    /// Rank senders. `limit` of `None` keeps every sender.
    pub fn compute(store: &RecordStore, limit: Option<usize>) -> Self {
        let mut by_sender: HashMap<&str, (u64, Option<&str>, chrono::NaiveDateTime)> =
            HashMap::new();

        for record in store.records() {
            let named = (!record.sender_name.trim().is_empty())
                .then_some(record.sender_name.as_str());
            let entry = by_sender
                .entry(record.sender_id.as_str())
                .or_insert((0, None, record.timestamp));
            entry.0 += 1;
            // Keep the name seen most recently; ties go to the later record.
            if let Some(name) = named {
                if entry.1.is_none() || record.timestamp >= entry.2 {
                    entry.1 = Some(name);
                    entry.2 = record.timestamp;
                }
            }
        }

        let mut users: Vec<UserActivity> = by_sender
            .into_iter()
            .map(|(sender_id, (message_count, name, _))| UserActivity {
                sender_id: sender_id.to_string(),
                sender_name: name.unwrap_or(sender_id).to_string(),
                message_count,
            })
            .collect();

        users.sort_by(|a, b| {
            b.message_count
                .cmp(&a.message_count)
                .then_with(|| a.sender_id.cmp(&b.sender_id))
        });
        if let Some(limit) = limit {
            users.truncate(limit);
        }

        Self { users }
    }
}

/// Counted red packet activity of one sender.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPayment {
    pub sender_id: String,
    pub total_amount: f64,
    pub event_count: u64,
}

/// Senders by counted red packet total, descending; ties by sender id
/// ascending. Senders without counted events are left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPaymentRanking {
    pub users: Vec<UserPayment>,
}

impl UserPaymentRanking {
    pub fn compute(store: &RecordStore, config: &AnalyticsConfig, limit: Option<usize>) -> Self {
        let mut by_sender: HashMap<&str, (f64, u64)> = HashMap::new();
        for record in store.records() {
            if let Some(amount) = counted_amount(record, config) {
                let entry = by_sender.entry(record.sender_id.as_str()).or_insert((0.0, 0));
                entry.0 += amount;
                entry.1 += 1;
            }
        }

        let mut users: Vec<UserPayment> = by_sender
            .into_iter()
            .map(|(sender_id, (total_amount, event_count))| UserPayment {
                sender_id: sender_id.to_string(),
                total_amount,
                event_count,
            })
            .collect();

        users.sort_by(|a, b| {
            b.total_amount
                .total_cmp(&a.total_amount)
                .then_with(|| a.sender_id.cmp(&b.sender_id))
        });
        if let Some(limit) = limit {
            users.truncate(limit);
        }

        Self { users }
    }
}
