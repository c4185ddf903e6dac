// Draft lifecycle state: status, order, and turn counters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a draft instance.
///
/// Forward-only: `not_started -> in_progress -> completed`, with
/// `in_progress -> cancelled` as an alternate terminal reached only through
/// explicit cancellation. Reset is an administrative operation handled
/// outside the state machine and is the only way back to `NotStarted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    NotStarted,
    InProgress,
    Completed,
    Cancelled,
}

impl DraftStatus {
    /// Database discriminator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::NotStarted => "not_started",
            DraftStatus::InProgress => "in_progress",
            DraftStatus::Completed => "completed",
            DraftStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str_status(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(DraftStatus::NotStarted),
            "in_progress" => Some(DraftStatus::InProgress),
            "completed" => Some(DraftStatus::Completed),
            "cancelled" => Some(DraftStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal states accept no further picks or transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftStatus::Completed | DraftStatus::Cancelled)
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The single mutable record for one draft instance.
///
/// Owned exclusively by the engine; callers read snapshots and never mutate
/// it directly. `current_pick` counts committed picks overall (0-indexed,
/// not reset per round); `current_round` is stored redundantly and must
/// agree with `current_pick / capacity + 1` after every commit, except at
/// completion where it may exceed `total_rounds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftState {
    /// Draft instance identifier.
    pub draft_id: String,
    pub status: DraftStatus,
    /// Team names in base rotation order. Empty until the draft starts;
    /// set exactly once and never mutated afterward (cleared only by reset).
    pub draft_order: Vec<String>,
    /// 1-indexed round currently being picked.
    pub current_round: u32,
    /// Total committed picks so far (0-indexed counter).
    pub current_pick: u32,
    /// Number of rounds configured at creation.
    pub total_rounds: u32,
    /// Required number of teams, fixed at creation.
    pub capacity: usize,
}

/// The counter changes produced by committing one pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// 1-indexed number of the pick just committed.
    pub pick_number: u32,
    /// The round the pick was made in (pre-increment).
    pub round: u32,
    /// Round after the commit.
    pub new_round: u32,
    /// Whether this pick completed the draft.
    pub is_complete: bool,
}

impl DraftState {
    /// Fresh state for a newly created instance.
    pub fn new(draft_id: &str, total_rounds: u32, capacity: usize) -> Self {
        DraftState {
            draft_id: draft_id.to_string(),
            status: DraftStatus::NotStarted,
            draft_order: Vec::new(),
            current_round: 1,
            current_pick: 0,
            total_rounds,
            capacity,
        }
    }

    /// Number of teams in the rotation once started.
    pub fn team_count(&self) -> usize {
        self.draft_order.len()
    }

    /// Compute the counter advance for the next pick without applying it.
    ///
    /// The round recorded on the pick is the pre-increment `current_round`;
    /// the round only rolls over when the new pick count is an exact
    /// multiple of the team count. Completion happens exactly when the
    /// rolled-over round exceeds `total_rounds`, i.e. at pick `R * N`.
    pub fn next_advance(&self) -> Advance {
        let team_count = self.team_count() as u32;
        let pick_number = self.current_pick + 1;
        let new_round = if team_count > 0 && pick_number % team_count == 0 {
            self.current_round + 1
        } else {
            self.current_round
        };
        Advance {
            pick_number,
            round: self.current_round,
            new_round,
            is_complete: new_round > self.total_rounds,
        }
    }

    /// Apply a previously computed advance to the counters.
    pub fn apply_advance(&mut self, adv: Advance) {
        self.current_pick = adv.pick_number;
        self.current_round = adv.new_round;
        if adv.is_complete {
            self.status = DraftStatus::Completed;
        }
    }

    /// The round implied by the pick counter. Meaningful only while in
    /// progress; at terminal states the stored round is authoritative.
    pub fn derived_round(&self) -> u32 {
        let team_count = self.team_count() as u32;
        if team_count == 0 {
            1
        } else {
            self.current_pick / team_count + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(names: &[&str], total_rounds: u32) -> DraftState {
        let mut state = DraftState::new("d1", total_rounds, names.len());
        state.status = DraftStatus::InProgress;
        state.draft_order = names.iter().map(|s| s.to_string()).collect();
        state
    }

    #[test]
    fn status_db_round_trip() {
        for status in [
            DraftStatus::NotStarted,
            DraftStatus::InProgress,
            DraftStatus::Completed,
            DraftStatus::Cancelled,
        ] {
            assert_eq!(DraftStatus::from_str_status(status.as_str()), Some(status));
        }
        assert_eq!(DraftStatus::from_str_status("paused"), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(DraftStatus::Completed.is_terminal());
        assert!(DraftStatus::Cancelled.is_terminal());
        assert!(!DraftStatus::NotStarted.is_terminal());
        assert!(!DraftStatus::InProgress.is_terminal());
    }

    #[test]
    fn new_state_starts_at_round_one_pick_zero() {
        let state = DraftState::new("d1", 3, 4);
        assert_eq!(state.status, DraftStatus::NotStarted);
        assert!(state.draft_order.is_empty());
        assert_eq!(state.current_round, 1);
        assert_eq!(state.current_pick, 0);
        assert_eq!(state.total_rounds, 3);
    }

    #[test]
    fn advance_within_round_keeps_round() {
        let state = started(&["A", "B", "C", "D"], 2);
        let adv = state.next_advance();
        assert_eq!(adv.pick_number, 1);
        assert_eq!(adv.round, 1);
        assert_eq!(adv.new_round, 1);
        assert!(!adv.is_complete);
    }

    #[test]
    fn advance_rolls_round_at_team_count_boundary() {
        let mut state = started(&["A", "B", "C", "D"], 2);
        state.current_pick = 3; // three picks committed, fourth closes round 1
        let adv = state.next_advance();
        assert_eq!(adv.pick_number, 4);
        assert_eq!(adv.round, 1);
        assert_eq!(adv.new_round, 2);
        assert!(!adv.is_complete);
    }

    #[test]
    fn advance_completes_at_total_rounds_times_teams() {
        let mut state = started(&["A", "B", "C", "D"], 2);
        state.current_pick = 7;
        state.current_round = 2;
        let adv = state.next_advance();
        assert_eq!(adv.pick_number, 8);
        assert_eq!(adv.round, 2);
        assert_eq!(adv.new_round, 3);
        assert!(adv.is_complete);
    }

    #[test]
    fn apply_advance_updates_counters_and_status() {
        let mut state = started(&["A", "B"], 1);
        state.current_pick = 1;
        let adv = state.next_advance();
        assert!(adv.is_complete);
        state.apply_advance(adv);
        assert_eq!(state.current_pick, 2);
        assert_eq!(state.current_round, 2);
        assert_eq!(state.status, DraftStatus::Completed);
    }

    #[test]
    fn round_invariant_holds_through_full_draft() {
        let mut state = started(&["A", "B", "C"], 4);
        while state.status == DraftStatus::InProgress {
            let adv = state.next_advance();
            state.apply_advance(adv);
            if state.status == DraftStatus::InProgress {
                assert_eq!(state.current_round, state.derived_round());
            }
        }
        // 4 rounds * 3 teams
        assert_eq!(state.current_pick, 12);
        assert_eq!(state.current_round, 5);
    }

    #[test]
    fn state_serde_round_trip() {
        let state = started(&["A", "B"], 3);
        let json = serde_json::to_string(&state).unwrap();
        let back: DraftState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert!(json.contains("\"in_progress\""));
    }
}
