//! Core domain types for chatlens
//!
//! A [`MessageRecord`] is one chat message after the external preprocessor has
//! classified it. Records arrive as newline-delimited JSON; [`RawRecord`] is the
//! wire shape and [`RawRecord::normalize`] turns it into the canonical record.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Sender** | The account that posted a message, identified by `sender_id` |
//! | **Red packet** | A thank-you message announcing a gifted amount |
//! | **Web / mobile** | Whether the message was sent from the web client or not |
//! | **Counted amount** | A red packet amount at or below the outlier threshold |

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ============================================
// Message Record
// ============================================

/// A normalized chat message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRecord {
    /// Identifier from the source archive
    pub id: String,
    /// Local wall-clock time the message was sent
    pub timestamp: NaiveDateTime,
    /// Stable account identifier
    pub sender_id: String,
    /// Display name at the time of sending (may be empty)
    pub sender_name: String,
    /// Sent from the web client
    pub is_web: bool,
    /// Image message
    pub is_image: bool,
    /// Text message
    pub is_text: bool,
    /// Red packet thank-you message
    pub is_redpacket: bool,
    /// Length of the text content in characters
    pub content_length: u64,
    /// Tokenizer length; only present on text records
    pub token_count: Option<u64>,
    /// Gifted amount; only present on red packet records
    pub redpacket_amount: Option<f64>,
}

impl MessageRecord {
    /// Calendar date of the message.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Name to show for the sender, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.sender_name.trim().is_empty() {
            &self.sender_id
        } else {
            &self.sender_name
        }
    }
}

// ============================================
// Wire format
// ============================================

/// Identifier as written by the preprocessor: numeric or string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Int(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Timestamp as written by the preprocessor.
///
/// Epoch seconds are converted using the configured offset; naive strings are
/// taken as local time already.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(i64),
    EpochFloat(f64),
    Text(String),
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

impl RawTimestamp {
    /// Resolve to local wall-clock time.
    pub fn to_local(&self, offset: FixedOffset) -> Result<NaiveDateTime, String> {
        match self {
            RawTimestamp::Epoch(secs) => epoch_to_local(*secs, offset),
            RawTimestamp::EpochFloat(secs) => {
                if !secs.is_finite() {
                    return Err(format!("invalid epoch timestamp: {}", secs));
                }
                epoch_to_local(secs.trunc() as i64, offset)
            }
            RawTimestamp::Text(text) => {
                let text = text.trim();
                NAIVE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                    .ok_or_else(|| format!("unrecognized timestamp: {:?}", text))
            }
        }
    }
}

fn epoch_to_local(secs: i64, offset: FixedOffset) -> Result<NaiveDateTime, String> {
    DateTime::from_timestamp(secs, 0)
        .map(|utc| utc.with_timezone(&offset).naive_local())
        .ok_or_else(|| format!("epoch timestamp out of range: {}", secs))
}

/// One NDJSON line as produced by the preprocessor.
///
/// Field names follow the preprocessor output; the aliases accept the
/// canonical names too. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct RawRecord {
    pub id: RawId,
    #[serde(alias = "timestamp", alias = "ts")]
    pub time: RawTimestamp,
    #[serde(alias = "sender_id", alias = "sender")]
    pub from_uid: RawId,
    #[serde(default, alias = "sender_name")]
    pub screen_name: Option<String>,
    #[serde(default)]
    pub is_web: bool,
    #[serde(default)]
    pub is_image: bool,
    #[serde(default)]
    pub is_text: bool,
    #[serde(default)]
    pub is_redpacket: bool,
    #[serde(default, alias = "content_length", alias = "len")]
    pub content_len: Option<u64>,
    #[serde(default)]
    pub token_count: Option<u64>,
    #[serde(default, alias = "amount")]
    pub redpacket_amount: Option<f64>,
}

impl RawRecord {
    /// Apply the record invariants and produce the canonical record.
    ///
    /// `token_count` is dropped on non-text records and `redpacket_amount` on
    /// non-red-packet records.
    pub fn normalize(self, offset: FixedOffset) -> Result<MessageRecord, String> {
        let timestamp = self.time.to_local(offset)?;

        let redpacket_amount = match self.redpacket_amount {
            Some(amount) if !amount.is_finite() || amount < 0.0 => {
                return Err(format!("invalid red packet amount: {}", amount));
            }
            amount if self.is_redpacket => amount,
            _ => None,
        };

        let sender_id = self.from_uid.into_string();
        if sender_id.is_empty() {
            return Err("empty sender id".to_string());
        }

        Ok(MessageRecord {
            id: self.id.into_string(),
            timestamp,
            sender_id,
            sender_name: self.screen_name.unwrap_or_default(),
            is_web: self.is_web,
            is_image: self.is_image,
            is_text: self.is_text,
            is_redpacket: self.is_redpacket,
            content_length: self.content_len.unwrap_or(0),
            token_count: if self.is_text { self.token_count } else { None },
            redpacket_amount,
        })
    }
}
