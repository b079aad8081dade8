use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The last message a user has acknowledged in a channel.
///
/// At most one exists per `(user_id, channel_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadState {
    pub id: String,
    pub user_id: String,
    pub channel_id: String,
    pub last_message_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A single channel acknowledgment inside a bulk request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckEntry {
    pub channel_id: String,
    pub message_id: String,
}

impl AckEntry {
    pub fn new(channel_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            message_id: message_id.into(),
        }
    }
}

/// Body of `POST /api/read-states/ack-bulk`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AckBulk {
    pub read_states: Vec<AckEntry>,
}
