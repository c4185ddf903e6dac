// Pick ledger records and the result returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One committed selection in a draft instance.
///
/// Created only by the pick applier; never updated or deleted afterward
/// (a full reset deletes the whole ledger for the instance). `pick_number`
/// is 1-indexed and globally monotonic within the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    /// Sequential pick number (1-indexed, no gaps).
    pub pick_number: u32,
    /// Draft instance this pick belongs to.
    pub draft_id: String,
    /// Database id of the picking team.
    pub team_id: i64,
    /// Display name of the picking team.
    pub team_name: String,
    /// Database id of the drafted player.
    pub player_id: i64,
    /// Display name of the drafted player.
    pub player_name: String,
    /// The round the pick was made in (pre-increment round).
    pub round: u32,
    /// Commit timestamp, generated by the storage layer.
    pub timestamp: DateTime<Utc>,
}

/// What `apply_pick` reports back on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickOutcome {
    pub pick_number: u32,
    pub round: u32,
    pub team_name: String,
    pub player_name: String,
    /// True when this pick was the last of the draft.
    pub is_complete: bool,
}
